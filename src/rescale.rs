//! Stride-aligned rescale computation.
//!
//! Computes per-axis scale factors and output dimensions from source raster
//! dimensions and a [`ScalePolicy`]. Pure arithmetic, no pixel operations:
//! the caller hands the dimensions to its resampler and multiplies box
//! coordinates by the matching per-axis factor.
//!
//! # Example
//!
//! ```
//! use zenquad::{ImageDims, ScalePolicy};
//!
//! let result = ScalePolicy::short_side_capped(600, 1000)
//!     .stride(32)
//!     .compute(ImageDims::new(600, 800))
//!     .unwrap();
//!
//! // Short side already at target; both sides rounded down to multiples of 32.
//! assert_eq!((result.height, result.width), (576, 800));
//! assert_eq!(result.scale_x, 1.0);
//! assert_eq!(result.scale_y, 0.96);
//! ```

use num_traits::Float;

use crate::quad::{Point, Quad};

/// Output stride used when none is given.
pub const DEFAULT_STRIDE: u32 = 32;

/// Height × width of a raster, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDims {
    /// Rows.
    pub height: u32,
    /// Columns.
    pub width: u32,
}

impl ImageDims {
    /// Create new dimensions. Height first, matching row-major raster shapes.
    pub const fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }

    /// The shorter side.
    pub fn min_side(&self) -> u32 {
        self.height.min(self.width)
    }

    /// The longer side.
    pub fn max_side(&self) -> u32 {
        self.height.max(self.width)
    }

    fn check(&self) -> Result<(), ScaleError> {
        if self.height == 0 || self.width == 0 {
            return Err(ScaleError::ZeroImageDimension);
        }
        Ok(())
    }
}

/// How the output size is derived from the source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "mode", rename_all = "snake_case")
)]
pub enum ScaleMode {
    /// Square `target × target` output, `target` rounded down to the stride.
    /// Distorts aspect ratio.
    FixedSquare { target: u32 },

    /// Scale the shorter side to `target`, unless that pushes the longer side
    /// past `max`, in which case the longer side is scaled to `max` instead.
    /// Each side is then rounded down to the stride, so the two axes may end
    /// up with slightly different factors.
    ShortSideCapped { target: u32, max: u32 },
}

impl ScaleMode {
    /// The requested target size.
    pub fn target(&self) -> u32 {
        match *self {
            Self::FixedSquare { target } | Self::ShortSideCapped { target, .. } => target,
        }
    }

    /// Whether this mode preserves aspect ratio (up to stride rounding).
    pub fn keeps_ratio(&self) -> bool {
        matches!(self, Self::ShortSideCapped { .. })
    }
}

/// Rescale specification: a [`ScaleMode`] plus the output stride.
///
/// # Example
///
/// ```
/// use zenquad::{ImageDims, ScalePolicy};
///
/// let result = ScalePolicy::fixed_square(416)
///     .compute(ImageDims::new(500, 500))
///     .unwrap();
///
/// assert_eq!((result.height, result.width), (416, 416));
/// assert_eq!(result.scale_x, 416.0 / 500.0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalePolicy {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub mode: ScaleMode,
    #[cfg_attr(feature = "serde", serde(default = "default_stride"))]
    pub stride: u32,
}

#[cfg(feature = "serde")]
const fn default_stride() -> u32 {
    DEFAULT_STRIDE
}

impl Default for ScalePolicy {
    /// Shortest side to 600, longest side capped at 2000, stride 32.
    fn default() -> Self {
        Self::short_side_capped(600, 2000)
    }
}

impl ScalePolicy {
    /// Square output of side `target` (rounded down to the stride).
    pub fn fixed_square(target: u32) -> Self {
        Self {
            mode: ScaleMode::FixedSquare { target },
            stride: DEFAULT_STRIDE,
        }
    }

    /// Shortest side to `target`, longest side at most `max`.
    pub fn short_side_capped(target: u32, max: u32) -> Self {
        Self {
            mode: ScaleMode::ShortSideCapped { target, max },
            stride: DEFAULT_STRIDE,
        }
    }

    /// Build from a `(target, max, keep_ratio)` triple as found in training
    /// configs. `max` is ignored when `keep_ratio` is false.
    pub fn from_parts(target: u32, max: u32, keep_ratio: bool) -> Self {
        if keep_ratio {
            Self::short_side_capped(target, max)
        } else {
            Self::fixed_square(target)
        }
    }

    /// Set the output stride.
    pub fn stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Check the policy on its own, without source dimensions.
    pub fn validate(&self) -> Result<(), ScaleError> {
        if self.stride == 0 {
            return Err(ScaleError::ZeroStride);
        }
        match self.mode {
            ScaleMode::FixedSquare { target: 0 } | ScaleMode::ShortSideCapped { target: 0, .. } => {
                Err(ScaleError::ZeroTarget)
            }
            ScaleMode::FixedSquare { target } if target < self.stride => {
                Err(ScaleError::TargetBelowStride {
                    target,
                    stride: self.stride,
                })
            }
            ScaleMode::ShortSideCapped { target, max } if max < target => {
                Err(ScaleError::MaxBelowTarget { target, max })
            }
            _ => Ok(()),
        }
    }

    /// Compute scale factors and output dimensions for a source raster.
    pub fn compute(&self, dims: ImageDims) -> Result<ScaleResult, ScaleError> {
        self.validate()?;
        dims.check()?;

        let result = match self.mode {
            ScaleMode::FixedSquare { target } => {
                let side = target / self.stride * self.stride;
                ScaleResult {
                    scale_x: ratio(side, dims.width),
                    scale_y: ratio(side, dims.height),
                    height: side,
                    width: side,
                }
            }
            ScaleMode::ShortSideCapped { target, max } => {
                let scale = short_side_scale(dims, target, max)?;
                let width = aligned_side(dims.width, scale, self.stride, Axis::Width)?;
                let height = aligned_side(dims.height, scale, self.stride, Axis::Height)?;
                ScaleResult {
                    scale_x: ratio(width, dims.width),
                    scale_y: ratio(height, dims.height),
                    height,
                    width,
                }
            }
        };

        log::trace!(
            "rescale {}x{} -> {}x{} ({:?}, stride {})",
            dims.width,
            dims.height,
            result.width,
            result.height,
            self.mode,
            self.stride
        );
        Ok(result)
    }
}

/// Compute the rescale for `dims` under `policy`. Same as
/// [`ScalePolicy::compute`].
pub fn compute_scale(dims: ImageDims, policy: &ScalePolicy) -> Result<ScaleResult, ScaleError> {
    policy.compute(dims)
}

/// The single keep-ratio scale factor, before stride alignment.
///
/// `target / min_side`, replaced by `max / max_side` when the longer side
/// would round past `max`. Rounding is half-to-even.
pub fn short_side_scale(dims: ImageDims, target: u32, max: u32) -> Result<f64, ScaleError> {
    dims.check()?;
    let min_side = dims.min_side() as f64;
    let max_side = dims.max_side() as f64;

    let scale = target as f64 / min_side;
    if round_half_even(scale * max_side) > max as f64 {
        log::debug!(
            "long side {} would exceed cap {max} at short-side target {target}; capping",
            dims.max_side()
        );
        return Ok(max as f64 / max_side);
    }
    Ok(scale)
}

/// Computed rescale.
///
/// `width` and `height` are multiples of the policy's stride.
/// `scale_x = width / source_width` and `scale_y = height / source_height`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScaleResult {
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Output rows.
    pub height: u32,
    /// Output columns.
    pub width: u32,
}

impl ScaleResult {
    /// Output dimensions.
    pub fn dims(&self) -> ImageDims {
        ImageDims::new(self.height, self.width)
    }

    /// Factors for an `[x1, y1, x2, y2]` box: `[sx, sy, sx, sy]`.
    pub fn box_factors(&self) -> [f64; 4] {
        [self.scale_x, self.scale_y, self.scale_x, self.scale_y]
    }

    /// Map a source point into the resized raster.
    pub fn apply(&self, p: Point<f64>) -> Point<f64> {
        Point::new(p.x * self.scale_x, p.y * self.scale_y)
    }

    /// Map a source quad into the resized raster.
    pub fn scale_quad(&self, quad: &Quad<f64>) -> Quad<f64> {
        quad.scaled(self.scale_x, self.scale_y)
    }

    /// Whether the output equals the source (no resampling needed).
    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }
}

/// Image axis, for error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Width,
    Height,
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Width => "width",
            Self::Height => "height",
        })
    }
}

/// Rescale computation error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ScaleError {
    /// Source image has zero width or height.
    #[error("source image has zero width or height")]
    ZeroImageDimension,
    /// Target size is zero.
    #[error("target size is zero")]
    ZeroTarget,
    /// Stride is zero.
    #[error("stride is zero")]
    ZeroStride,
    /// Long-side cap below the short-side target.
    #[error("max size {max} is below target size {target}")]
    MaxBelowTarget { target: u32, max: u32 },
    /// Fixed-square target rounds down to zero at this stride.
    #[error("target size {target} is smaller than stride {stride}")]
    TargetBelowStride { target: u32, stride: u32 },
    /// A scaled side is shorter than one stride.
    #[error("scaled {axis} is shorter than stride {stride}")]
    CollapsedAxis { axis: Axis, stride: u32 },
    /// A scaled side does not fit in `u32`.
    #[error("scaled {axis} overflows u32")]
    OutputTooLarge { axis: Axis },
    /// A target-size candidate list with no entries.
    #[error("target size candidate list is empty")]
    NoTargetCandidates,
}

// ============================================================================
// Internal arithmetic
// ============================================================================

fn ratio(num: u32, den: u32) -> f64 {
    num as f64 / den as f64
}

/// `floor(side * scale / stride) * stride`, checked to be a positive `u32`.
fn aligned_side(side: u32, scale: f64, stride: u32, axis: Axis) -> Result<u32, ScaleError> {
    let stride_f = stride as f64;
    let aligned = Float::floor(side as f64 * scale / stride_f) * stride_f;
    if aligned < 1.0 {
        return Err(ScaleError::CollapsedAxis { axis, stride });
    }
    if aligned > u32::MAX as f64 {
        return Err(ScaleError::OutputTooLarge { axis });
    }
    Ok(aligned as u32)
}

/// Round to nearest, ties to even.
fn round_half_even(v: f64) -> f64 {
    if Float::abs(v - Float::trunc(v)) == 0.5 {
        2.0 * Float::round(v / 2.0)
    } else {
        Float::round(v)
    }
}
