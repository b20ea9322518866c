//! Shared data models for the scan core

mod format;
mod raw;
mod result;

pub use format::*;
pub use raw::*;
pub use result::*;
