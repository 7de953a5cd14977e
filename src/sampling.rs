//! Random target-size selection for multi-scale training.
//!
//! Training configs often give the short-side target as a list of candidate
//! sizes, one of which is drawn per image. [`Rescaler`] holds that
//! configuration, resolves it to a concrete [`ScalePolicy`] with a caller
//! supplied RNG, and computes the rescale.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use zenquad::ImageDims;
//! use zenquad::sampling::{Rescaler, TargetSize};
//!
//! let rescaler = Rescaler::new(TargetSize::Choices(vec![512, 576, 640]), 1000, true);
//! let mut rng = StdRng::seed_from_u64(7);
//!
//! let result = rescaler.compute(ImageDims::new(480, 640), &mut rng).unwrap();
//! assert_eq!(result.height % 32, 0);
//! assert!([512, 576, 640].contains(&result.height));
//! ```

use alloc::vec::Vec;

use rand::Rng;

use crate::rescale::{DEFAULT_STRIDE, ImageDims, ScaleError, ScalePolicy, ScaleResult};

/// A fixed target size, or candidates to draw from uniformly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum TargetSize {
    Fixed(u32),
    Choices(Vec<u32>),
}

impl TargetSize {
    /// Resolve to a single target. `Fixed` never touches the RNG.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<u32, ScaleError> {
        match self {
            Self::Fixed(target) => Ok(*target),
            Self::Choices(choices) if choices.is_empty() => Err(ScaleError::NoTargetCandidates),
            Self::Choices(choices) => Ok(choices[rng.gen_range(0..choices.len())]),
        }
    }
}

impl From<u32> for TargetSize {
    fn from(target: u32) -> Self {
        Self::Fixed(target)
    }
}

impl From<Vec<u32>> for TargetSize {
    fn from(choices: Vec<u32>) -> Self {
        Self::Choices(choices)
    }
}

/// Rescale configuration with a possibly randomized target size.
///
/// Mirrors the `(target, max, keep_ratio)` triple of training configs;
/// see [`ScalePolicy::from_parts`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Rescaler {
    pub targets: TargetSize,
    pub max: u32,
    pub keep_ratio: bool,
    pub stride: u32,
}

impl Default for Rescaler {
    /// Target 600, cap 2000, keep ratio, stride 32.
    fn default() -> Self {
        Self::new(TargetSize::Fixed(600), 2000, true)
    }
}

impl Rescaler {
    /// Create a rescaler with the default stride.
    pub fn new(targets: impl Into<TargetSize>, max: u32, keep_ratio: bool) -> Self {
        Self {
            targets: targets.into(),
            max,
            keep_ratio,
            stride: DEFAULT_STRIDE,
        }
    }

    /// Set the output stride.
    pub fn stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Draw a target and build the concrete policy.
    pub fn policy<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ScalePolicy, ScaleError> {
        let target = self.targets.resolve(rng)?;
        Ok(ScalePolicy::from_parts(target, self.max, self.keep_ratio).stride(self.stride))
    }

    /// Draw a target and compute the rescale for `dims`.
    pub fn compute<R: Rng + ?Sized>(
        &self,
        dims: ImageDims,
        rng: &mut R,
    ) -> Result<ScaleResult, ScaleError> {
        self.policy(rng)?.compute(dims)
    }
}
