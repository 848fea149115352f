// Library surface for headless/integration tests and reuse.
// Rendering and terminal handling stay in the binary.
pub mod app_dirs;
pub mod config;
pub mod layout;
pub mod logging;
pub mod presenter;
pub mod results;
pub mod runtime;
pub mod scores;
pub mod session;
pub mod timer;

/// Event loop tick; bounds how late a reaction deadline can fire
pub const TICK_RATE_MS: u64 = 20;
