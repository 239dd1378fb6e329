//! The CDP-backed automation engine replay drives.

mod engine;
mod lifecycle;

pub use engine::CdpEngine;
