//! Canonical corner ordering for quadrilaterals.
//!
//! Annotations store a quadrilateral as four corners in whatever order the
//! annotator, the label converter, or an earlier transform left them.
//! [`Quad::canonicalize`] reorders them into one fixed cyclic walk, so that
//! corner 0 names the same physical corner however the points were listed.
//!
//! ```text
//!     image frame, y grows downward
//!
//!        0 ─────────── 1
//!        │             │     corners are walked clockwise on screen
//!        │      c      │     around the centroid `c`; the start corner
//!        │             │     comes from the diagonal tie-break
//!        3 ─────────── 2
//! ```
//!
//! # Example
//!
//! ```
//! use zenquad::{Point, Quad};
//!
//! let quad = Quad::new([
//!     Point::new(1.0, 1.0),
//!     Point::new(1.0, -1.0),
//!     Point::new(-1.0, -1.0),
//!     Point::new(-1.0, 1.0),
//! ]);
//!
//! let canonical = quad.canonicalize().unwrap();
//! assert_eq!(canonical.corners[0], Point::new(-1.0, -1.0));
//! assert_eq!(canonical.corners[2], Point::new(1.0, 1.0));
//! ```

use core::cmp::Ordering;
use core::ops::Sub;

use num_traits::Float;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Slope assigned to a vertical diagonal (`Δx == 0`).
///
/// This is `i32::MAX` as a float: steeper than any slope a real annotation
/// produces, and finite so that two vertical diagonals compare equal.
pub const VERTICAL_SLOPE: f64 = i32::MAX as f64;

/// Tolerance for the zero-area test, in units of machine epsilon relative to
/// the squared largest centroid radius.
const ZERO_AREA_ULPS: f64 = 16.0;

/// A point in image coordinates (x to the right, y downward).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point<T = f64> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    /// Create a new point.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Float> Point<T> {
    /// Whether both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean length, free of intermediate overflow.
    fn norm(self) -> T {
        self.x.hypot(self.y)
    }

    fn half(self) -> Self {
        let half = lit::<T>(0.5);
        Self::new(self.x * half, self.y * half)
    }

    fn cross(self, other: Self) -> T {
        self.x * other.y - self.y * other.x
    }
}

impl<T: Float> Sub for Point<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Four corners of a quadrilateral.
///
/// Before [`canonicalize`](Self::canonicalize) the storage order carries no
/// meaning. After it, the corners form a clockwise (on screen) walk with a
/// deterministic starting corner.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quad<T = f64> {
    pub corners: [Point<T>; 4],
}

impl<T> Quad<T> {
    /// Create a quad from four corners.
    pub const fn new(corners: [Point<T>; 4]) -> Self {
        Self { corners }
    }
}

impl<T: Float> Quad<T> {
    /// Build a quad from the flat `[x0, y0, x1, y1, x2, y2, x3, y3]` layout.
    pub fn from_flat(coords: [T; 8]) -> Self {
        Self::new(core::array::from_fn(|i| {
            Point::new(coords[2 * i], coords[2 * i + 1])
        }))
    }

    /// Flatten to `[x0, y0, x1, y1, x2, y2, x3, y3]`.
    pub fn to_flat(&self) -> [T; 8] {
        core::array::from_fn(|i| {
            let p = self.corners[i / 2];
            if i % 2 == 0 { p.x } else { p.y }
        })
    }

    /// Arithmetic mean of the four corners.
    ///
    /// Corners are summed in `(x, y)` order, so the result does not depend
    /// on how they are listed. Each term is pre-scaled by 1/4, which keeps
    /// the sum finite for any finite corners.
    pub fn centroid(&self) -> Point<T> {
        let quarter = lit::<T>(0.25);
        let mut corners = self.corners;
        corners.sort_unstable_by(|&a, &b| coord_order(a, b));
        let (sx, sy) = corners.iter().fold((T::zero(), T::zero()), |(sx, sy), p| {
            (sx + p.x * quarter, sy + p.y * quarter)
        });
        Point::new(sx, sy)
    }

    /// Apply `f` to every corner, keeping the storage order.
    pub fn map(&self, f: impl FnMut(Point<T>) -> Point<T>) -> Self {
        Self::new(self.corners.map(f))
    }

    /// Scale x and y coordinates independently.
    ///
    /// Pair with [`ScaleResult`](crate::ScaleResult) factors to move a quad
    /// into a resized raster.
    pub fn scaled(&self, sx: T, sy: T) -> Self {
        self.map(|p| Point::new(p.x * sx, p.y * sy))
    }

    /// Reorder the corners into the canonical cyclic walk.
    ///
    /// Corners are sorted by their clockwise angle around the centroid,
    /// largest first. The walk starts at one end of whichever diagonal has
    /// the larger `Δy/Δx`, taking the end with the smaller x (then smaller y).
    /// The returned corners are the input points themselves, so any listing
    /// of the same four corners yields bit-identical output.
    ///
    /// Fails on non-finite coordinates, repeated corners, a corner sitting
    /// exactly on the centroid, and quads with no area.
    pub fn canonicalize(&self) -> Result<Self, QuadError> {
        self.check_corners()?;

        // Half-scale offsets cannot overflow for finite corners.
        let center = self.centroid().half();
        let offsets = self.corners.map(|p| p.half() - center);
        if let Some(index) = offsets
            .iter()
            .position(|d| d.x == T::zero() && d.y == T::zero())
        {
            return Err(QuadError::Degenerate(Degeneracy::CornerAtCentroid {
                index,
            }));
        }

        let keys = offsets.map(|d| (clockwise_angle(d), d.norm()));
        let mut order = [0usize, 1, 2, 3];
        order.sort_unstable_by(|&a, &b| {
            angular_order(keys[a], keys[b])
                .then_with(|| coord_order(self.corners[a], self.corners[b]))
        });

        let sorted = order.map(|i| self.corners[i]);
        if is_flat(&order.map(|i| offsets[i])) {
            return Err(QuadError::Degenerate(Degeneracy::ZeroArea));
        }

        let start = start_slot(&sorted);
        Ok(Self::new(core::array::from_fn(|k| sorted[(start + k) % 4])))
    }

    fn check_corners(&self) -> Result<(), QuadError> {
        if let Some(index) = self.corners.iter().position(|p| !p.is_finite()) {
            return Err(QuadError::NonFinite { index });
        }
        for first in 0..4 {
            for second in first + 1..4 {
                if self.corners[first] == self.corners[second] {
                    return Err(QuadError::Degenerate(Degeneracy::DuplicateCorner {
                        first,
                        second,
                    }));
                }
            }
        }
        Ok(())
    }
}

/// Canonicalize a single quad. Same as [`Quad::canonicalize`].
pub fn canonicalize<T: Float>(quad: &Quad<T>) -> Result<Quad<T>, QuadError> {
    quad.canonicalize()
}

/// Canonicalize every quad of a batch, preserving order.
///
/// `output[i]` is the canonical form of `quads[i]`. The first failing quad
/// aborts the batch and its position is reported.
#[cfg(feature = "alloc")]
pub fn canonicalize_batch<T: Float>(quads: &[Quad<T>]) -> Result<Vec<Quad<T>>, BatchError> {
    quads
        .iter()
        .enumerate()
        .map(|(index, quad)| quad.canonicalize().map_err(|e| batch_error(index, e)))
        .collect()
}

/// Canonicalize a flat buffer of `8 * n` coordinates, one quad per row of 8.
#[cfg(feature = "alloc")]
pub fn canonicalize_flat<T: Float>(coords: &[T]) -> Result<Vec<T>, BatchError> {
    if coords.len() % 8 != 0 {
        return Err(BatchError::RaggedBuffer { len: coords.len() });
    }
    let mut out = Vec::with_capacity(coords.len());
    for (index, row) in coords.chunks_exact(8).enumerate() {
        let mut flat = [T::zero(); 8];
        flat.copy_from_slice(row);
        let quad = Quad::from_flat(flat)
            .canonicalize()
            .map_err(|e| batch_error(index, e))?;
        out.extend_from_slice(&quad.to_flat());
    }
    Ok(out)
}

#[cfg(feature = "alloc")]
fn batch_error(index: usize, source: QuadError) -> BatchError {
    log::debug!("rejecting quad {index}: {source}");
    BatchError::Quad { index, source }
}

/// Why a quad has no canonical ordering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Degeneracy {
    /// Two corners are the same point.
    #[error("corners {first} and {second} coincide")]
    DuplicateCorner { first: usize, second: usize },
    /// A corner coincides with the centroid, so its angle is undefined.
    #[error("corner {index} lies on the centroid")]
    CornerAtCentroid { index: usize },
    /// All corners lie on one line.
    #[error("corners enclose no area")]
    ZeroArea,
}

/// Canonicalization error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum QuadError {
    /// A corner has a NaN or infinite coordinate.
    #[error("corner {index} has a non-finite coordinate")]
    NonFinite { index: usize },
    /// The corners do not describe a proper quadrilateral.
    #[error("degenerate quad: {0}")]
    Degenerate(Degeneracy),
}

/// Batch canonicalization error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum BatchError {
    /// The quad at `index` failed.
    #[error("quad {index}: {source}")]
    Quad { index: usize, source: QuadError },
    /// A flat buffer whose length is not a multiple of 8.
    #[error("flat buffer of {len} values is not a whole number of quads")]
    RaggedBuffer { len: usize },
}

// ============================================================================
// Ordering internals
// ============================================================================

/// Small decimal constant as `T`; every such literal fits any `Float`.
fn lit<T: Float>(v: f64) -> T {
    T::from(v).unwrap_or_else(T::nan)
}

/// Angle of a centroid offset in degrees, `[0, 360]`.
///
/// Measured from +x; corners above the centroid on screen (`y < 0`) get
/// `[0, 180]`, corners below it get `(180, 360]`.
fn clockwise_angle<T: Float>(d: Point<T>) -> T {
    let cosine = (d.x / d.norm()).max(-T::one()).min(T::one());
    let theta = cosine.acos().to_degrees();
    if d.y > T::zero() {
        lit::<T>(360.0) - theta
    } else {
        theta
    }
}

/// Sort key order: larger angle first, then the corner farther from the
/// centroid.
fn angular_order<T: Float>(a: (T, T), b: (T, T)) -> Ordering {
    float_order(b.0, a.0).then_with(|| float_order(b.1, a.1))
}

/// Total order on coordinates, x then y. Fixes summation and sort order
/// independently of the input listing.
fn coord_order<T: Float>(a: Point<T>, b: Point<T>) -> Ordering {
    float_order(a.x, b.x).then_with(|| float_order(a.y, b.y))
}

/// `partial_cmp` with NaN ordered after every number.
fn float_order<T: Float>(a: T, b: T) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Whether the sorted centroid offsets enclose (numerically) no area.
///
/// Offsets are divided by the largest radius first, so the cross products
/// stay finite for any finite quad.
fn is_flat<T: Float>(offsets: &[Point<T>; 4]) -> bool {
    let radius = offsets.iter().fold(T::zero(), |r, d| r.max(d.norm()));
    let unit = offsets.map(|d| Point::new(d.x / radius, d.y / radius));
    let mut twice_area = T::zero();
    for (i, &d) in unit.iter().enumerate() {
        twice_area = twice_area + d.cross(unit[(i + 1) % 4]);
    }
    twice_area.abs() <= lit::<T>(ZERO_AREA_ULPS) * T::epsilon()
}

/// Slope `Δy/Δx` from `from` to `to`; vertical maps to [`VERTICAL_SLOPE`].
///
/// Differences are taken at half scale so they stay finite; the ratio is
/// unchanged.
fn diagonal_slope<T: Float>(from: Point<T>, to: Point<T>) -> T {
    let d = to.half() - from.half();
    if d.x == T::zero() {
        lit(VERTICAL_SLOPE)
    } else {
        d.y / d.x
    }
}

/// Which of two candidate start corners leads: smaller x, then smaller y.
///
/// `Less` picks `a`; `Equal` and `Greater` pick `b`.
fn lead_order<T: Float>(a: Point<T>, b: Point<T>) -> Ordering {
    a.x.partial_cmp(&b.x)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
}

/// Slot of the angularly sorted corners the canonical walk starts from.
///
/// Whichever of the diagonals (0,2) and (1,3) has the larger slope supplies
/// the two candidates; a tie goes to (1,3).
fn start_slot<T: Float>(sorted: &[Point<T>; 4]) -> usize {
    let even = diagonal_slope(sorted[0], sorted[2]);
    let odd = diagonal_slope(sorted[1], sorted[3]);
    let (a, b) = if even > odd { (0, 2) } else { (1, 3) };
    match lead_order(sorted[a], sorted[b]) {
        Ordering::Less => a,
        Ordering::Equal | Ordering::Greater => b,
    }
}
