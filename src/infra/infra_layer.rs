// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "calls/discord_webhooks.rs"]
pub mod calls;

#[path = "prompts/json_prompt_store.rs"]
pub mod prompts;
