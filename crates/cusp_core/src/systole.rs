//! Systole estimates. Only systoles below [`SYSTOLE_CUTOFF`] matter; anything
//! longer is reported as the cutoff itself.

use anyhow::Result;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::traits::Manifold;

pub const SYSTOLE_CUTOFF: f64 = 0.15;

/// Randomized retriangulations per unit of `tries`.
pub const RETRIANGULATIONS_PER_TRY: usize = 10;

pub const MAX_COVER_DEGREE: u32 = 5;

/// Non-rigorous systole from the length spectrum at the highest available
/// precision. The spectrum computation is unstable on some triangulations,
/// so failures are expected.
pub fn systole<M: Manifold>(manifold: &M) -> Result<f64> {
    let precise = manifold.high_precision();
    let spectrum = precise.length_spectrum(SYSTOLE_CUTOFF, true)?;
    debug!(manifold = %manifold.name(), count = spectrum.len(), "computed length spectrum");
    Ok(spectrum
        .iter()
        .map(|length| length.re)
        .reduce(f64::min)
        .unwrap_or(SYSTOLE_CUTOFF))
}

/// Retries [`systole`] on distinct random retriangulations until one works.
pub fn systole_with_tries<M: Manifold, R: Rng>(
    manifold: &M,
    tries: usize,
    rng: &mut R,
) -> Option<f64> {
    let name = manifold.name();
    match systole(manifold) {
        Ok(sys) => {
            debug!(manifold = %name, systole = sys, "systole computed on first attempt");
            return Some(sys);
        }
        Err(err) => debug!(manifold = %name, error = %err, "systole failed on first attempt"),
    }

    let mut walker = manifold.clone();
    let mut seen = HashSet::new();
    let mut signatures = Vec::new();
    for _ in 0..RETRIANGULATIONS_PER_TRY * tries {
        walker.randomize(rng.gen());
        let signature = walker.triangulation_signature();
        if seen.insert(signature.clone()) {
            signatures.push(signature);
        }
    }
    debug!(manifold = %name, count = signatures.len(), "retriangulations found");

    for signature in &signatures {
        let attempt = manifold
            .from_signature(signature)
            .and_then(|rebuilt| systole(&rebuilt));
        match attempt {
            Ok(sys) => {
                debug!(manifold = %name, systole = sys, signature = %signature, "systole computed");
                return Some(sys);
            }
            Err(err) => debug!(manifold = %name, signature = %signature, error = %err, "systole failed"),
        }
    }

    warn!(manifold = %name, "systole fail");
    None
}

/// Lower bound for the systole from finite covers: the systole of a degree
/// `d` cover, divided by `d`, bounds the systole downstairs.
///
/// Attempt `i` on a cover first randomizes it `i` more times.
pub fn systole_with_covers<M: Manifold, R: Rng>(
    manifold: &M,
    tries: usize,
    rng: &mut R,
) -> Option<f64> {
    let name = manifold.name();
    let attempts = 2 * tries;
    for degree in 1..=MAX_COVER_DEGREE {
        let covers = match manifold.covers(degree) {
            Ok(covers) => covers,
            Err(err) => {
                debug!(manifold = %name, degree, error = %err, "cover enumeration failed");
                continue;
            }
        };
        for mut cover in covers {
            for attempt in 0..attempts {
                for _ in 0..attempt {
                    cover.randomize(rng.gen());
                }
                match systole(&cover) {
                    Ok(sys) => {
                        debug!(manifold = %name, degree, systole = sys, "systole of cover");
                        return Some(sys / f64::from(degree));
                    }
                    Err(err) => debug!(cover = %cover.name(), attempt, error = %err, "systole failed"),
                }
            }
        }
    }
    warn!(manifold = %name, "systole fail");
    None
}
