// Discord commands module.
// Each feature gets its own command file.

pub mod calls;

pub mod prompts;

pub mod help;

// Bot presence management
pub mod presence;
