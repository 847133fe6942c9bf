//! Slope arithmetic on a cusp torus and the short-slope search.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::SlopeError;
use crate::precision::{Attempt, Climb, PrecisionLadder, BASE_BITS};
use crate::traits::Manifold;
use crate::types::{CuspInvariants, Holonomy, Slope};

/// Lower bound on the area of a maximal cusp (Cao-Meyerhoff). The sharper
/// 2·sqrt(3) of Gabai-Haraway-Meyerhoff-Thurston-Yarmola also applies.
pub const CUSP_AREA_LOWER_BOUND: f64 = 3.35;

/// Default Euclidean cutoff when none is requested.
pub const DEFAULT_LENGTH_CUTOFF: f64 = 6.0;

/// Precision used for cusp holonomies.
pub const CUSP_TRANSLATION_BITS: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShortSlopeSettings {
    /// Length cutoff; `None` means Euclidean length 6 and ignores `normalized`.
    pub len_cutoff: Option<f64>,
    /// Read the cutoff as a Hodgson-Kerckhoff normalized length.
    pub normalized: bool,
    pub tries: usize,
}

impl Default for ShortSlopeSettings {
    fn default() -> Self {
        Self {
            len_cutoff: None,
            normalized: false,
            tries: 10,
        }
    }
}

impl ShortSlopeSettings {
    pub fn geometric(len_cutoff: f64) -> Self {
        Self {
            len_cutoff: Some(len_cutoff),
            ..Self::default()
        }
    }
}

/// Result of [`find_short_slopes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortSlopes {
    /// Canonical representatives, without duplicates.
    pub slopes: BTreeSet<Slope>,
    /// Agol bound on how many slopes there can be.
    pub expected: usize,
    /// Geometric cutoff actually passed to the oracle.
    pub cutoff: f64,
    /// Precision of the returned list, if any list was produced.
    pub bits: Option<u32>,
    /// False when every precision returned more slopes than `expected`.
    pub settled: bool,
}

/// Algebraic intersection number of two slopes.
pub fn alg_int(u: Slope, v: Slope) -> i64 {
    u.p * v.q - u.q * v.p
}

pub fn preferred_rep(t: Slope) -> Slope {
    t.preferred()
}

/// Extended Euclid: returns `(g, x, y)` with `a·x + b·y = g` and `g >= 0`.
pub fn xgcd(a: i64, b: i64) -> (i64, i64, i64) {
    let (mut old_r, mut r) = (a, b);
    let (mut old_s, mut s) = (1i64, 0i64);
    let (mut old_t, mut t) = (0i64, 1i64);
    while r != 0 {
        let quotient = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
        (old_t, t) = (t, old_t - quotient * t);
    }
    if old_r < 0 {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}

/// Lattice point on the line `point + k·direction` closest to the origin,
/// measured with the cusp metric.
///
/// Dividing by the holonomy of `direction` makes the line horizontal with
/// lattice points spaced one apart, so the best `k` rounds the real part.
/// Ties go to the even integer.
pub fn shortest_lattice_point_on_line(
    point: Slope,
    direction: Slope,
    holonomy: &Holonomy,
) -> Result<Slope, SlopeError> {
    let step = direction.holonomy(holonomy);
    let offset = (point.holonomy(holonomy) / step).re;
    if step.norm() == 0.0 || !offset.is_finite() {
        return Err(SlopeError::DegenerateHolonomy(direction));
    }
    let k = offset.round_ties_even();
    if k.abs() >= i64::MAX as f64 {
        return Err(SlopeError::DegenerateHolonomy(direction));
    }
    let k = k as i64;
    let shifted = |x: i64, dx: i64| k.checked_mul(dx).and_then(|kdx| x.checked_sub(kdx));
    match (shifted(point.p, direction.p), shifted(point.q, direction.q)) {
        (Some(p), Some(q)) if p != i64::MIN && q != i64::MIN => Ok(Slope::new(p, q).preferred()),
        _ => Err(SlopeError::DegenerateHolonomy(direction)),
    }
}

/// Shortest slope `s` with `alg_int(s, t) = ±1`; before canonicalization
/// the intersection is `+1`.
pub fn shortest_complement(t: Slope, holonomy: &Holonomy) -> Result<Slope, SlopeError> {
    let (g, a, b) = xgcd(t.q, t.p);
    if g != 1 {
        return Err(SlopeError::NotPrimitive(t));
    }
    let partner = Slope::new(a, -b);
    debug_assert_eq!(alg_int(partner, t), 1);
    shortest_lattice_point_on_line(partner, t, holonomy)
}

/// Holonomies of the current framing of cusp 0 and `sqrt(cusp area)`.
pub fn cusp_invariants<M: Manifold>(manifold: &M) -> Result<CuspInvariants> {
    let holonomy = manifold.cusp_translations(CUSP_TRANSLATION_BITS)?;
    Ok(CuspInvariants {
        holonomy,
        norm_factor: holonomy.area().sqrt(),
    })
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Least prime strictly greater than `n`.
pub fn next_prime(n: u64) -> u64 {
    let mut candidate = n + 1;
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// Agol's bound on the number of slopes shorter than `len_cutoff`.
///
/// Two such slopes meet at most `floor(L²/A)` times, where `A` is the cusp
/// area (1 for normalized lengths). With `p` the next prime after that,
/// there are at most `p + 1` slopes.
pub fn expected_slope_count(len_cutoff: f64, normalized: bool) -> usize {
    let squared = len_cutoff * len_cutoff;
    let max_intersection = if normalized {
        squared.floor()
    } else {
        (squared / CUSP_AREA_LOWER_BOUND).floor()
    };
    let p = next_prime(max_intersection.max(0.0) as u64);
    usize::try_from(p).unwrap_or(usize::MAX).saturating_add(1)
}

/// All slopes on cusp 0 shorter than the requested cutoff.
///
/// Precision is raised until the oracle returns no more slopes than Agol's
/// bound allows. If it never does, the last list is returned with
/// `settled = false`. Errors only come from computing the cusp area for a
/// normalized cutoff.
pub fn find_short_slopes<M: Manifold>(
    manifold: &M,
    settings: ShortSlopeSettings,
) -> Result<ShortSlopes> {
    let name = manifold.name();
    let (len_cutoff, normalized) = match settings.len_cutoff {
        Some(len) => (len, settings.normalized),
        None => (DEFAULT_LENGTH_CUTOFF, false),
    };
    let expected = expected_slope_count(len_cutoff, normalized);
    let cutoff = if normalized {
        len_cutoff * cusp_invariants(manifold)?.norm_factor
    } else {
        len_cutoff
    };
    debug!(manifold = %name, expected, cutoff, normalized, "searching for short slopes");

    let ladder = PrecisionLadder::new(BASE_BITS, settings.tries);
    let climb = ladder.climb(|bits| match manifold.short_slopes(cutoff, bits) {
        Ok(slopes) if slopes.len() > expected => Attempt::Insufficient(slopes),
        Ok(slopes) => Attempt::Success(slopes),
        Err(err) => Attempt::Failed(err),
    });

    let settled = climb.is_settled();
    let (raw, bits) = match climb {
        Climb::Settled { value, bits } => {
            debug!(manifold = %name, count = value.len(), bits, "found short slopes");
            (value, Some(bits))
        }
        Climb::BestEffort { value, bits } => {
            warn!(manifold = %name, count = value.len(), expected, bits, "short slope count never met the bound");
            (value, Some(bits))
        }
        Climb::Exhausted => {
            warn!(manifold = %name, "short slope search failed at every precision");
            (Vec::new(), None)
        }
    };

    Ok(ShortSlopes {
        slopes: raw.into_iter().map(Slope::preferred).collect(),
        expected,
        cutoff,
        bits,
        settled,
    })
}
