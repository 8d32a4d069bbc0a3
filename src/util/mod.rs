//! Utility types and functions for KF export.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and the [`Mat4x3`] row layout

mod error;
mod math;

pub use error::*;
pub use math::*;

/// Reject strings the KF format cannot carry.
pub fn require_ascii(s: &str) -> Result<()> {
    if s.is_ascii() {
        Ok(())
    } else {
        Err(Error::NonAscii(s.to_string()))
    }
}
