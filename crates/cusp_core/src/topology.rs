//! Topological checks built on the recognition oracle, plus the shape
//! checks run before any geometric work.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Rejection;
use crate::traits::{Manifold, Oracles, Recognition};
use crate::types::{SolutionType, Trilean};

/// Retry budget for closed triangulation signatures.
pub const CLOSED_SIGNATURE_TRIES: usize = 25;

/// Tetrahedron cap for the normal surface tests.
pub const NORMAL_SURFACE_MAX_TETS: usize = 50;

/// Volume of the figure-eight knot complement and its sister, the smallest
/// volume of an orientable cusped hyperbolic manifold.
pub const MIN_CUSPED_VOLUME: f64 = 2.029_883_212_819_307;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reducibility {
    Irreducible,
    /// Reducible; `summands` is the census name when one is known.
    Reducible { summands: Option<String> },
    Unknown,
}

impl Reducibility {
    pub fn is_reducible(&self) -> Trilean {
        match self {
            Reducibility::Irreducible => Trilean::False,
            Reducibility::Reducible { .. } => Trilean::True,
            Reducibility::Unknown => Trilean::Unknown,
        }
    }
}

/// One unfilled cusp, orientable, and `H_1 = Z`.
pub fn is_knot_manifold<M: Manifold>(manifold: &M) -> bool {
    manifold.num_cusps() == 1
        && !manifold.is_cusp_filled(0)
        && manifold.is_orientable()
        && manifold.homology().is_integers()
}

/// Decides reducibility of a closed manifold from its first closed
/// triangulation.
pub fn is_reducible<M: Manifold, R: Recognition<M>>(manifold: &M, oracle: &R) -> Reducibility {
    let name = manifold.name();
    let signatures =
        oracle.closed_signatures(manifold, CLOSED_SIGNATURE_TRIES, NORMAL_SURFACE_MAX_TETS);
    let Some(first) = signatures.first() else {
        debug!(manifold = %name, "no closed triangulation for reducibility test");
        return Reducibility::Unknown;
    };
    match oracle.is_irreducible(first) {
        Ok(true) => Reducibility::Irreducible,
        Ok(false) => {
            let summands = oracle.census_name(manifold);
            if !summands.as_deref().is_some_and(|s| s.contains('#')) {
                warn!(manifold = %name, summands = ?summands, "reducible manifold without a connected sum name");
            }
            debug!(manifold = %name, summands = ?summands, "reducible");
            Reducibility::Reducible { summands }
        }
        Err(err) => {
            debug!(manifold = %name, error = %err, "irreducibility test failed");
            Reducibility::Unknown
        }
    }
}

/// Toroidality of a cusped or closed manifold, with decomposition pieces
/// when toroidal.
pub fn is_toroidal<M: Manifold, R: Recognition<M>>(
    manifold: &M,
    oracle: &R,
) -> (Trilean, Vec<String>) {
    match oracle.is_toroidal(manifold) {
        Ok((toroidal, pieces)) => {
            debug!(manifold = %manifold.name(), toroidal, "toroidality decided");
            (Trilean::from(toroidal), pieces)
        }
        Err(err) => {
            debug!(manifold = %manifold.name(), error = %err, "toroidality test failed");
            (Trilean::Unknown, Vec::new())
        }
    }
}

/// Decomposes a closed manifold along tori, trying up to `tries` closed
/// triangulations until one gives a definite answer. The pieces need not be
/// the JSJ pieces.
pub fn torus_decomposition<M: Manifold, R: Recognition<M>>(
    manifold: &M,
    oracle: &R,
    tries: usize,
) -> (Trilean, Vec<String>) {
    let name = manifold.name();
    let signatures =
        oracle.closed_signatures(manifold, CLOSED_SIGNATURE_TRIES, NORMAL_SURFACE_MAX_TETS);
    if signatures.is_empty() {
        debug!(manifold = %name, "no closed triangulation for torus decomposition");
        return (Trilean::Unknown, Vec::new());
    }
    for signature in signatures.iter().take(tries) {
        match oracle.decompose_along_tori(signature) {
            Ok((Trilean::Unknown, _)) => {}
            Ok(definite) => {
                debug!(manifold = %name, toroidal = ?definite.0, "torus decomposition");
                return definite;
            }
            Err(err) => debug!(manifold = %name, signature = %signature, error = %err, "torus decomposition failed"),
        }
    }
    (Trilean::Unknown, Vec::new())
}

/// Checks that a manifold is one-cusped and hyperbolic, returning it with an
/// all-positive triangulation.
///
/// A manifold without a good solution is probed for a reason: torus link
/// filling, exceptional group, toroidality, then a non-rigorous volume test.
pub fn sanity_check_cusped<M: Manifold, O: Oracles<M>>(
    manifold: &M,
    oracles: &O,
    tries: usize,
) -> Result<M, Rejection> {
    let name = manifold.name();
    let cusps = manifold.num_cusps();
    if cusps != 1 {
        return Err(Rejection::WrongCuspCount(cusps));
    }

    match manifold.solution_type() {
        SolutionType::AllPositive => {
            debug!(manifold = %name, "already positively oriented");
            return Ok(manifold.clone());
        }
        SolutionType::ContainsNegative => {
            return match oracles.find_positive_triangulation(manifold, tries) {
                Some(positive) => {
                    debug!(manifold = %name, "found positive triangulation");
                    Ok(positive)
                }
                None => {
                    info!(manifold = %name, "positive triangulation fail");
                    Err(Rejection::PositiveTriangulationFailed)
                }
            };
        }
        _ => {}
    }

    if oracles.is_torus_link_filling(manifold) {
        info!(manifold = %name, "is a torus link filling");
        return Err(Rejection::TorusLinkFilling);
    }
    let group = oracles.classify(manifold, tries);
    if group.is_exceptional() {
        info!(manifold = %name, group = ?group, "exceptional due to fundamental group");
        return Err(Rejection::ExceptionalGroup(group));
    }
    let (toroidal, pieces) = is_toroidal(manifold, oracles);
    if toroidal.is_true() {
        info!(manifold = %name, pieces = ?pieces, "is toroidal");
        return Err(Rejection::Toroidal(pieces));
    }
    match manifold.approximate_volume() {
        Ok(volume) if volume < MIN_CUSPED_VOLUME => {
            warn!(manifold = %name, volume, "non-rigorous test says volume is too small");
            return Err(Rejection::SmallVolume(volume));
        }
        Ok(_) => {}
        Err(err) => debug!(manifold = %name, error = %err, "volume unavailable"),
    }
    let solution = manifold.solution_type();
    warn!(manifold = %name, solution = ?solution, "bad solution type for unclear reasons");
    Err(Rejection::UnexplainedSolution(solution))
}
