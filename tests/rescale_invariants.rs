//! Parametric invariants for rescale computation.
//!
//! Sweeps source sizes around each target, runs every policy, and collects
//! all violations before failing so one run shows the whole picture.
//!
//! Checked for every successful computation:
//! - output sides are positive multiples of the stride
//! - `scale_x * source_width == width` (and likewise for height)
//! - keep-ratio: the long side, pre-alignment, never rounds past the cap
//! - keep-ratio: output never exceeds the unaligned target box
//! - fixed square: output is square and equals the stride-truncated target

use zenquad::*;

const STRIDES: [u32; 4] = [1, 8, 32, 64];

const TARGETS: [(u32, u32); 8] = [
    (32, 32),
    (320, 640),
    (416, 416),
    (512, 1024),
    (600, 1000),
    (600, 2000),
    (608, 608),
    (800, 1333),
];

fn gen_source_sizes(target: u32) -> Vec<(u32, u32)> {
    fn vary(v: u32) -> Vec<u32> {
        let mut vals = vec![v, v.saturating_add(1), v.saturating_sub(1).max(1)];
        vals.extend([v * 2, v * 3, (v / 2).max(1), (v / 3).max(1)]);
        vals.extend([1, 2, 31, 32, 33, 100, 480, 640, 1080, 1920, 4000]);
        vals.sort_unstable();
        vals.dedup();
        vals
    }

    let vals = vary(target);
    let mut sizes = Vec::new();
    for &h in &vals {
        for &w in &vals {
            sizes.push((h, w));
        }
    }
    sizes
}

fn round_half_even(v: f64) -> f64 {
    let r = v.round();
    if (v - v.trunc()).abs() == 0.5 {
        2.0 * (v / 2.0).round()
    } else {
        r
    }
}

#[test]
fn parametric_invariants() {
    let mut failures = Vec::new();
    let mut checked = 0u64;

    for &(target, max) in &TARGETS {
        for &(sh, sw) in &gen_source_sizes(target) {
            let dims = ImageDims::new(sh, sw);
            for stride in STRIDES {
                let policies = [
                    ScalePolicy::short_side_capped(target, max).stride(stride),
                    ScalePolicy::fixed_square(target).stride(stride),
                ];
                for policy in policies {
                    let tag = format!("{:?} stride {stride} ({sw}x{sh})", policy.mode);
                    let r = match policy.compute(dims) {
                        Ok(r) => r,
                        Err(ScaleError::CollapsedAxis { .. }) => continue,
                        Err(ScaleError::TargetBelowStride { .. }) if target < stride => continue,
                        Err(e) => {
                            failures.push(format!("{tag}: error {e:?}"));
                            continue;
                        }
                    };
                    checked += 1;

                    if r.width == 0 || r.height == 0 {
                        failures.push(format!("{tag}: empty output {}x{}", r.width, r.height));
                    }
                    if r.width % stride != 0 || r.height % stride != 0 {
                        failures.push(format!(
                            "{tag}: {}x{} not aligned to {stride}",
                            r.width, r.height
                        ));
                    }
                    if (r.scale_x * sw as f64 - r.width as f64).abs() > 1e-6
                        || (r.scale_y * sh as f64 - r.height as f64).abs() > 1e-6
                    {
                        failures.push(format!(
                            "{tag}: factors ({}, {}) do not reproduce {}x{}",
                            r.scale_x, r.scale_y, r.width, r.height
                        ));
                    }

                    match policy.mode {
                        ScaleMode::ShortSideCapped { target, max } => {
                            let s = short_side_scale(dims, target, max).unwrap();
                            let long = dims.max_side() as f64;
                            let short = dims.min_side() as f64;
                            if round_half_even(s * long) > max as f64 {
                                failures.push(format!("{tag}: long side over cap at scale {s}"));
                            }
                            if r.width.max(r.height) as f64 > (s * long).floor() + 1e-9
                                || r.width.min(r.height) as f64 > (s * short).floor() + 1e-9
                            {
                                failures.push(format!(
                                    "{tag}: {}x{} exceeds unaligned box at scale {s}",
                                    r.width, r.height
                                ));
                            }
                        }
                        ScaleMode::FixedSquare { target } => {
                            let side = target / stride * stride;
                            if (r.width, r.height) != (side, side) {
                                failures.push(format!(
                                    "{tag}: {}x{} != {side}x{side}",
                                    r.width, r.height
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    assert!(checked > 1000, "too few cases checked: {checked}");
    assert!(
        failures.is_empty(),
        "Invariant failures ({} of {checked}):\n{}",
        failures.len(),
        failures.join("\n")
    );
}

#[test]
fn compute_scale_matches_method() {
    let policy = ScalePolicy::short_side_capped(600, 1000);
    let dims = ImageDims::new(720, 1280);
    assert_eq!(compute_scale(dims, &policy), policy.compute(dims));
}

#[test]
fn boxes_follow_output_frame() {
    // A box spanning the full source maps onto the full output.
    let dims = ImageDims::new(600, 800);
    let r = ScalePolicy::short_side_capped(600, 1000).compute(dims).unwrap();
    let [fx1, fy1, fx2, fy2] = r.box_factors();
    let b = [0.0, 0.0, dims.width as f64, dims.height as f64];
    let scaled = [b[0] * fx1, b[1] * fy1, b[2] * fx2, b[3] * fy2];
    assert_eq!(scaled, [0.0, 0.0, r.width as f64, r.height as f64]);
}

#[test]
fn canonical_quad_survives_rescale() {
    // Per-axis positive scaling keeps the canonical order.
    let q = Quad::from_flat([10.0, 0.0, 20.0, 5.0, 15.0, 20.0, 0.0, 12.0]);
    let canonical = q.canonicalize().unwrap();
    let r = ScalePolicy::fixed_square(416)
        .compute(ImageDims::new(300, 700))
        .unwrap();
    let moved = r.scale_quad(&canonical);
    assert_eq!(moved.canonicalize().unwrap(), moved);
}
