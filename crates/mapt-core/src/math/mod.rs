//! # Mathematical Functions
//!
//! Checked integer arithmetic and decimal-aware value conversions. All
//! division floors (or truncates toward zero for signed values).

pub mod mul_div;
pub mod safe_math;
pub mod valuation;

// Re-export commonly used functions
pub use mul_div::*;
pub use safe_math::*;
pub use valuation::*;
