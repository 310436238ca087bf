// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "calls/mod.rs"]
pub mod calls;

#[path = "prompts/prompt_service.rs"]
pub mod prompts;
