//! Pure wire-to-view-model transforms
//!
//! Everything in here is side-effect free and total: malformed numeric input
//! maps to a defined fallback (`None` / "no data"), never a panic or an
//! error, so nothing in a render path can blow up on bad upstream data.

pub mod chart;
pub mod crypto;
pub mod format;
pub mod indicators;
pub mod quotes;
