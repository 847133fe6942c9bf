//! Geometry of single fillings and tests telling two fillings apart.

use nalgebra::DVector;
use num_complex::Complex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::precision::{Attempt, Climb, PrecisionLadder, BASE_BITS};
use crate::topology::{is_reducible, is_toroidal};
use crate::traits::{DirichletDomain, Geometrization, Manifold, Oracles, VerifiedNumber};
use crate::types::{ExceptionalKind, Holonomy, Slope, SlopeClass, Trilean};

/// Slopes longer than this always give hyperbolic fillings (6-theorem).
pub const SIX_THEOREM_BOUND: f64 = 6.0;

/// Group classification budget inside each filling round.
pub const FILLING_GROUP_TRIES: usize = 3;

/// Verified invariants `a`, `b` separate when `|a - b| > 4 · 2^-bits`.
pub const SEPARATION_MULTIPLE: f64 = 4.0;

/// Spectra whose difference vector is longer than this are different.
pub const SPECTRUM_NORM_THRESHOLD: f64 = 0.1;
pub const SPECTRUM_LENGTH_STEP: f64 = 0.2;
pub const SPECTRUM_START_LENGTH: f64 = 1.0;

/// Spectrum cutoff used when verified invariants fail to separate.
pub const INVARIANT_FALLBACK_CUTOFF: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthSpectrumSettings {
    /// Also rule out orientation-reversing isometries.
    pub check_chiral: bool,
    pub cutoff: f64,
}

impl Default for LengthSpectrumSettings {
    fn default() -> Self {
        Self {
            check_chiral: false,
            cutoff: 3.1,
        }
    }
}

/// How confidently two fillings were told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distinction {
    /// Verified volume or complex volume differ.
    Rigorous,
    /// Only the floating-point length spectra differ.
    Heuristic,
    NotDistinguished,
    /// No positive triangulation, or the spectra could not be computed.
    Unknown,
}

impl Distinction {
    pub fn distinguished(self) -> Trilean {
        match self {
            Distinction::Rigorous | Distinction::Heuristic => Trilean::True,
            Distinction::NotDistinguished => Trilean::False,
            Distinction::Unknown => Trilean::Unknown,
        }
    }

    /// `Some(true)` for verified invariants, `Some(false)` for the spectrum
    /// fallback, `None` when nothing was distinguished.
    pub fn rigor(self) -> Option<bool> {
        match self {
            Distinction::Rigorous => Some(true),
            Distinction::Heuristic => Some(false),
            Distinction::NotDistinguished | Distinction::Unknown => None,
        }
    }
}

/// Decides whether the filling `M(s)` is hyperbolic or exceptional.
///
/// Each round `i` randomizes the filled triangulation `i + 1` times (none in
/// the first round), checking the group after each, and then looks for a
/// verified structure. From the second round on, toroidality,
/// reducibility and a census name starting with "SFS" also count. The
/// census shortcut trusts the name and is not rigorous.
pub fn classify_filling<M, O, R>(
    manifold: &M,
    s: Slope,
    holonomy: &Holonomy,
    tries: usize,
    oracles: &O,
    rng: &mut R,
) -> SlopeClass
where
    M: Manifold,
    O: Oracles<M>,
    R: Rng,
{
    let name = manifold.name();
    if s.length(holonomy) > SIX_THEOREM_BOUND {
        return SlopeClass::Hyperbolic;
    }

    let mut filled = manifold.clone();
    filled.dehn_fill(s);

    for round in 0..tries {
        for _ in 0..=round {
            if round > 0 {
                filled.randomize(rng.gen());
            }
            let group = oracles.classify(&filled, FILLING_GROUP_TRIES);
            if let Some(kind) = group.exceptional_kind() {
                debug!(manifold = %name, slope = %s, kind = ?kind, "exceptional by fundamental group");
                return SlopeClass::Exceptional(kind);
            }
        }
        if oracles.is_hyperbolic(&filled, round + 1) {
            return SlopeClass::Hyperbolic;
        }
        if round > 0 {
            if is_toroidal(&filled, oracles).0.is_true() {
                return SlopeClass::Exceptional(ExceptionalKind::Toroidal);
            }
            if is_reducible(&filled, oracles).is_reducible().is_true() {
                return SlopeClass::Exceptional(ExceptionalKind::Reducible);
            }
            if oracles
                .census_name(&filled)
                .is_some_and(|census| census.starts_with("SFS"))
            {
                debug!(manifold = %name, slope = %s, "census name says Seifert fibered");
                return SlopeClass::Exceptional(ExceptionalKind::Sfs);
            }
        }
    }
    debug!(manifold = %name, slope = %s, tries, "filling not classified");
    SlopeClass::Unknown
}

/// `True` for a hyperbolic filling, `False` for an exceptional one.
pub fn is_hyperbolic_filling<M, O, R>(
    manifold: &M,
    s: Slope,
    holonomy: &Holonomy,
    tries: usize,
    oracles: &O,
    rng: &mut R,
) -> Trilean
where
    M: Manifold,
    O: Oracles<M>,
    R: Rng,
{
    classify_filling(manifold, s, holonomy, tries, oracles, rng).is_hyperbolic()
}

fn difference_norm(a: &[Complex<f64>], b: &[Complex<f64>], conjugate: bool) -> f64 {
    let len = a.len().min(b.len());
    let diff = DVector::from_iterator(
        len,
        a.iter().zip(b).map(|(x, y)| if conjugate { x - y.conj() } else { x - y }),
    );
    diff.norm()
}

/// Compares the complex length spectra of `M(s)` and `M(t)`, growing the
/// cutoff from 1 in steps of 0.2.
///
/// `True` means the spectra differ somewhere, which is only as rigorous as
/// the floating-point spectra themselves. With `check_chiral` the spectrum
/// of `M(s)` must also differ from the conjugate spectrum of `M(t)`.
pub fn are_distinguished_by_length_spectrum<M: Manifold>(
    manifold: &M,
    s: Slope,
    t: Slope,
    settings: LengthSpectrumSettings,
) -> Trilean {
    let name = manifold.name();
    if !settings.cutoff.is_finite() {
        return Trilean::Unknown;
    }
    let mut ms = manifold.high_precision();
    let mut mt = manifold.high_precision();
    ms.dehn_fill(s);
    mt.dehn_fill(t);
    let (ds, dt) = match (ms.dirichlet_domain(), mt.dirichlet_domain()) {
        (Ok(ds), Ok(dt)) => (ds, dt),
        (Err(err), _) | (_, Err(err)) => {
            warn!(manifold = %name, s = %s, t = %t, error = %err, "Dirichlet domain failed");
            return Trilean::Unknown;
        }
    };

    let start = SPECTRUM_START_LENGTH.min(settings.cutoff);
    let mut step = 0u32;
    loop {
        let current = start + f64::from(step) * SPECTRUM_LENGTH_STEP;
        if current > settings.cutoff {
            break;
        }
        let spectra = ds
            .length_spectrum(current)
            .and_then(|a| Ok((a, dt.length_spectrum(current)?)));
        let (spec_s, spec_t) = match spectra {
            Ok(spectra) => spectra,
            Err(err) => {
                warn!(manifold = %name, s = %s, t = %t, current, error = %err, "length spectrum failed");
                return Trilean::Unknown;
            }
        };

        let norm = difference_norm(&spec_s, &spec_t, false);
        let separated = if settings.check_chiral {
            norm > SPECTRUM_NORM_THRESHOLD
                && difference_norm(&spec_s, &spec_t, true) > SPECTRUM_NORM_THRESHOLD
        } else {
            norm > SPECTRUM_NORM_THRESHOLD
        };
        if separated {
            debug!(manifold = %name, s = %s, t = %t, current, chiral = settings.check_chiral, "length spectrum distinguishes");
            return Trilean::True;
        }
        debug!(manifold = %name, s = %s, t = %t, current, "length spectrum fails to distinguish");
        step += 1;
    }
    Trilean::False
}

/// Which verified invariant was compared last at a given precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Invariant {
    Volume,
    ComplexVolume,
}

fn compare_invariants<M: Manifold>(ms: &M, mt: &M, bits: u32) -> Attempt<Invariant> {
    let mut failure = None;

    match ms.volume(bits).and_then(|a| Ok((a, mt.volume(bits)?))) {
        Ok((a, b)) if a.exceeds_separation(&b, SEPARATION_MULTIPLE, bits) => {
            return Attempt::Success(Invariant::Volume)
        }
        Ok(_) => debug!(bits, "volumes very close"),
        Err(err) => failure = Some(err),
    }

    match ms
        .complex_volume(bits)
        .and_then(|a| Ok((a, mt.complex_volume(bits)?)))
    {
        Ok((a, b)) if a.exceeds_separation(&b, SEPARATION_MULTIPLE, bits) => {
            Attempt::Success(Invariant::ComplexVolume)
        }
        Ok(_) => {
            debug!(bits, "complex volumes very close");
            Attempt::Insufficient(Invariant::ComplexVolume)
        }
        Err(err) => match failure {
            Some(first) => Attempt::Failed(first.context(err.to_string())),
            None => Attempt::Failed(err),
        },
    }
}

/// Tries to prove that `M(s)` and `M(t)` are not orientation-preservingly
/// homeomorphic.
///
/// Verified volume and then complex volume are compared at 80, 160, ...
/// bits, `tries` times. If no precision separates them the non-rigorous
/// length spectrum comparison up to length 1.1 decides.
pub fn are_distinguished_by_hyp_invars<M, G>(
    manifold: &M,
    s: Slope,
    t: Slope,
    tries: usize,
    oracle: &G,
) -> Distinction
where
    M: Manifold,
    G: Geometrization<M>,
{
    let name = manifold.name();
    let mut ms = manifold.clone();
    let mut mt = manifold.clone();
    ms.dehn_fill(s);
    mt.dehn_fill(t);
    let positive = oracle
        .find_positive_triangulation(&ms, tries)
        .zip(oracle.find_positive_triangulation(&mt, tries));
    let Some((ms, mt)) = positive else {
        info!(manifold = %name, s = %s, t = %t, "positive triangulation fail");
        return Distinction::Unknown;
    };

    let ladder = PrecisionLadder::new(BASE_BITS, tries);
    if let Climb::Settled { value, bits } = ladder.climb(|bits| compare_invariants(&ms, &mt, bits)) {
        info!(manifold = %name, s = %s, t = %t, invariant = ?value, bits, "verified invariant distinguishes");
        return Distinction::Rigorous;
    }

    let fallback = LengthSpectrumSettings {
        check_chiral: false,
        cutoff: INVARIANT_FALLBACK_CUTOFF,
    };
    match are_distinguished_by_length_spectrum(manifold, s, t, fallback) {
        Trilean::True => Distinction::Heuristic,
        Trilean::False => Distinction::NotDistinguished,
        Trilean::Unknown => Distinction::Unknown,
    }
}
