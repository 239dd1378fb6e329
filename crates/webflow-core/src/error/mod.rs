//! Error types for capture and replay.

mod capture;
mod engine;
mod replay;
mod session;

pub use capture::*;
pub use engine::*;
pub use replay::*;
pub use session::*;
