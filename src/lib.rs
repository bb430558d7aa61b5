// Library surface for the binary, headless integration tests and reuse.
// Rendering lives in the binary; everything here is terminal-agnostic
// except the crossterm event types carried by `runtime` and `app`.
pub mod analytics;
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod passages;
pub mod runtime;
pub mod scorer;
pub mod session;
pub mod storage;

pub use error::{Error, Result};
