use statrs::distribution::{DiscreteCDF, Poisson};
use statrs::function::erf::erfc;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

// Below this baseline the Poisson tail is summed exactly.
const EXACT_BASELINE: f64 = 20.0;
// Distance from the baseline, in standard deviations, still served by the
// normal approximation.
const NORMAL_SPAN: f64 = 2.0;
const MIN_PROB: f64 = 1e-308;

/// How surprising `count` comments in a window are against a Poisson
/// `baseline` rate, as `-ln P(X >= count)`.
///
/// An empty window is never surprising. A non-positive baseline puts all
/// mass on zero, so any comment at all is infinitely surprising.
pub fn surprise(count: usize, baseline: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    if !(baseline > 0.0) {
        return f64::INFINITY;
    }
    let c = count as f64;
    if baseline < EXACT_BASELINE {
        exact_tail(count, baseline)
    } else if c <= baseline + NORMAL_SPAN * baseline.sqrt() {
        normal_tail(c, baseline)
    } else {
        saddle_point_tail(c, baseline)
    }
}

fn exact_tail(count: usize, baseline: f64) -> f64 {
    let p = Poisson::new(baseline)
        .map(|d| d.sf(count as u64 - 1))
        .unwrap_or(0.0);
    -p.max(MIN_PROB).ln()
}

// Continuity-corrected normal tail.
fn normal_tail(c: f64, baseline: f64) -> f64 {
    let z = (c - 0.5 - baseline) / baseline.sqrt();
    let p = 0.5 * erfc(z * FRAC_1_SQRT_2);
    -p.max(MIN_PROB).ln()
}

// Lugannani-Rice with the lattice correction, kept in log space so far tails
// do not underflow. Only used for `c` well above `baseline`.
fn saddle_point_tail(c: f64, baseline: f64) -> f64 {
    let r = (2.0 * (c * (c / baseline).ln() - c + baseline)).sqrt();
    let u = (1.0 - baseline / c) * c.sqrt();
    let ln_phi = -0.5 * r * r - 0.5 * (2.0 * PI).ln();
    -(ln_phi + (mills_ratio(r) - 1.0 / r + 1.0 / u).ln())
}

/// `(1 - Φ(r)) / φ(r)`.
fn mills_ratio(r: f64) -> f64 {
    if r > 5.0 {
        let r2 = r * r;
        (1.0 - (1.0 - (3.0 - 15.0 / r2) / r2) / r2) / r
    } else {
        0.5 * erfc(r * FRAC_1_SQRT_2) * (2.0 * PI).sqrt() * (0.5 * r * r).exp()
    }
}
