//! Searching the short slopes of a knot manifold for the filling that gives
//! the 3-sphere.
//!
//! Candidates go through three passes, cheapest first:
//!
//! 1. homology: the slope must meet the homological longitude once;
//! 2. fundamental group, verified hyperbolicity, finite covers and census
//!    lookup, each of which can rule a slope in or out;
//! 3. rigorous sphere recognition on a closed triangulation, for whatever
//!    pass 2 left undecided.
//!
//! Every slope finishes pass 2 before any slope enters pass 3.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::slopes::{alg_int, find_short_slopes, ShortSlopeSettings};
use crate::topology::is_knot_manifold;
use crate::traits::{Manifold, Oracles};
use crate::types::{GroupSignature, Slope, SolutionType};

/// Every exceptional slope is shorter than this (6-theorem, with slack).
pub const SIX_THEOREM_LENGTH: f64 = 6.01;

/// Largest cover degree searched when ruling out the sphere.
pub const MAX_SPHERE_COVER_DEGREE: u32 = 6;

/// Closed triangulation budget for sphere recognition.
pub const SPHERE_SIGNATURE_TRIES: usize = 25;
pub const SPHERE_MAX_TETS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3SearchSettings {
    /// Rule out slopes by verifying a hyperbolic structure.
    pub verify: bool,
    /// Rule out slopes with a nontrivial finite cover.
    pub covers: bool,
    /// Run sphere recognition on slopes left after pass 2.
    pub recognition: bool,
    pub tries: usize,
}

impl Default for S3SearchSettings {
    fn default() -> Self {
        Self {
            verify: true,
            covers: true,
            recognition: true,
            tries: 10,
        }
    }
}

/// Outcome of [`find_s3_slope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Search {
    /// The slope whose filling is `S^3`, if one was found.
    pub slope: Option<Slope>,
    /// Set once a sphere filling has been found.
    pub is_knot: bool,
    /// False when no all-positive triangulation was available.
    pub geometrically_easy: bool,
    /// False once pass 2 ends without finding the sphere.
    pub recognition_easy: bool,
}

impl S3Search {
    fn found(mut self, slope: Slope) -> Self {
        self.slope = Some(slope);
        self.is_knot = true;
        self
    }
}

/// What pass 2 concluded about one slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screening {
    Sphere,
    RuledOut,
    Deferred,
}

/// Finds the slope of a hyperbolic knot manifold whose filling is `S^3`.
///
/// Returns with `slope = None` when the manifold is not a knot manifold or
/// when no short slope survives as a sphere.
pub fn find_s3_slope<M: Manifold, O: Oracles<M>>(
    manifold: &M,
    oracles: &O,
    settings: S3SearchSettings,
) -> S3Search {
    let name = manifold.name();
    let tries = settings.tries;
    let mut search = S3Search {
        slope: None,
        is_knot: false,
        geometrically_easy: true,
        recognition_easy: true,
    };

    if !is_knot_manifold(manifold) {
        debug!(manifold = %name, "not a knot manifold");
        return search;
    }

    let mut guess = manifold.clone();
    guess.dehn_fill(Slope::MERIDIAN);
    if oracles.classify(&guess, tries) == GroupSignature::Trivial {
        info!(manifold = %name, slope = %Slope::MERIDIAN, "lucky guess: trivial fundamental group");
        return search.found(Slope::MERIDIAN);
    }

    let geometric = oracles
        .find_positive_triangulation(manifold, tries)
        .unwrap_or_else(|| manifold.clone());
    let solution = geometric.solution_type();
    if solution != SolutionType::AllPositive {
        debug!(manifold = %name, solution = ?solution, "bad triangulation");
        search.geometrically_easy = false;
    }

    let short = match find_short_slopes(
        &geometric,
        ShortSlopeSettings {
            len_cutoff: Some(SIX_THEOREM_LENGTH),
            normalized: false,
            tries,
        },
    ) {
        Ok(short) => short,
        Err(err) => {
            warn!(manifold = %name, error = %err, "short slopes unavailable");
            return search;
        }
    };

    let longitude = geometric.homological_longitude();
    let candidates: Vec<Slope> = short
        .slopes
        .into_iter()
        .filter(|&r| {
            let meets_once = alg_int(longitude, r).abs() == 1;
            if !meets_once {
                debug!(manifold = %name, slope = %r, "ruled out by homology");
            }
            meets_once
        })
        .collect();

    let mut deferred = Vec::new();
    for r in candidates {
        match screen_candidate(&geometric, r, oracles, settings) {
            Screening::Sphere => return search.found(r),
            Screening::RuledOut => {}
            Screening::Deferred => deferred.push(r),
        }
    }

    search.recognition_easy = false;
    if deferred.is_empty() || !settings.recognition {
        return search;
    }
    for r in deferred {
        let mut filled = geometric.clone();
        filled.dehn_fill(r);
        debug!(manifold = %name, slope = %r, "using sphere recognition");
        let signatures = oracles.closed_signatures(&filled, SPHERE_SIGNATURE_TRIES, SPHERE_MAX_TETS);
        let Some(first) = signatures.first() else {
            continue;
        };
        match oracles.is_three_sphere(first) {
            Ok(true) => {
                info!(manifold = %name, slope = %r, "sphere recognition succeeded");
                return search.found(r);
            }
            Ok(false) => {}
            Err(err) => debug!(manifold = %name, slope = %r, error = %err, "sphere recognition failed"),
        }
    }
    search
}

fn screen_candidate<M: Manifold, O: Oracles<M>>(
    manifold: &M,
    r: Slope,
    oracles: &O,
    settings: S3SearchSettings,
) -> Screening {
    let name = manifold.name();
    let mut filled = manifold.clone();
    filled.dehn_fill(r);

    let group = oracles.classify(&filled, settings.tries);
    if group == GroupSignature::Trivial {
        info!(manifold = %name, slope = %r, "trivial fundamental group");
        return Screening::Sphere;
    }
    if group.rules_out_sphere() {
        debug!(manifold = %name, slope = %r, group = ?group, "nontrivial fundamental group");
        return Screening::RuledOut;
    }

    if settings.verify
        && !group.is_exceptional()
        && oracles.is_hyperbolic(&filled, 2 * settings.tries)
    {
        debug!(manifold = %name, slope = %r, "hyperbolic structure found");
        return Screening::RuledOut;
    }

    if settings.covers {
        for degree in 2..=MAX_SPHERE_COVER_DEGREE {
            match filled.covers(degree) {
                Ok(covers) if !covers.is_empty() => {
                    debug!(manifold = %name, slope = %r, degree, "has a cover");
                    return Screening::RuledOut;
                }
                Ok(_) => {}
                Err(err) => debug!(manifold = %name, slope = %r, degree, error = %err, "cover search failed"),
            }
        }
    }

    match oracles.census_name(&filled) {
        Some(census) if census == "S3" => {
            debug!(manifold = %name, slope = %r, "recognized as S3");
            Screening::Sphere
        }
        Some(census) => {
            debug!(manifold = %name, slope = %r, census = %census, "recognized");
            Screening::RuledOut
        }
        None => Screening::Deferred,
    }
}
