use thiserror::Error;

use crate::types::{GroupSignature, Slope, SolutionType};

/// Failures of the pure slope primitives. Oracle failures are reported as
/// `anyhow::Error` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlopeError {
    #[error("slope {0} is not primitive")]
    NotPrimitive(Slope),
    #[error("cusp holonomy is degenerate along slope {0}")]
    DegenerateHolonomy(Slope),
}

/// Why a cusped manifold was not accepted as hyperbolic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("expected one cusp, found {0}")]
    WrongCuspCount(usize),
    #[error("positive triangulation not found")]
    PositiveTriangulationFailed,
    #[error("torus link filling")]
    TorusLinkFilling,
    #[error("exceptional due to fundamental group ({0:?})")]
    ExceptionalGroup(GroupSignature),
    #[error("toroidal manifold: {0:?}")]
    Toroidal(Vec<String>),
    #[error("volume {0} is below the smallest cusped hyperbolic volume")]
    SmallVolume(f64),
    #[error("solution type {0:?} not explained by any test")]
    UnexplainedSolution(SolutionType),
}
