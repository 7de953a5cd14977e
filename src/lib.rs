//! Canonical corner ordering for quadrilaterals and stride-aligned rescale
//! computation for detection pipelines.
//!
//! Pure geometry with no pixel operations. `no_std` compatible.
//!
//! # Modules
//!
//! - [`quad`]: Points, quads, and the canonical corner ordering
//! - [`rescale`]: Scale policies (fixed square, short side capped) and stride-aligned output sizes
//! - `sampling`: Random target-size selection for multi-scale training (feature `rand`)

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod quad;
pub mod rescale;
#[cfg(feature = "rand")]
pub mod sampling;

// Re-exports: core types
pub use quad::{BatchError, Degeneracy, Point, Quad, QuadError, VERTICAL_SLOPE, canonicalize};
#[cfg(feature = "alloc")]
pub use quad::{canonicalize_batch, canonicalize_flat};
pub use rescale::{
    Axis, DEFAULT_STRIDE, ImageDims, ScaleError, ScaleMode, ScalePolicy, ScaleResult,
    compute_scale, short_side_scale,
};
