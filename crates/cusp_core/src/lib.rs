pub mod error;
pub mod fillings;
pub mod precision;
pub mod s3;
pub mod slopes;
pub mod systole;
pub mod topology;
pub mod types;
/// The `cusp_core` crate decides geometric and topological properties of Dehn
/// fillings of a one-cusped 3-manifold.
///
/// The hyperbolic structure solver, normal surface theory, group theory and
/// census lookup are outside this crate; they are reached through the
/// traits in [`traits`]. What lives here is the escalation logic: try cheap
/// tests first, raise precision or switch strategy on failure, and answer
/// "unknown" rather than guess.
///
/// Key components:
/// - **Traits**: `Manifold` (the handle), `Recognition`, `FundamentalGroup`, `Geometrization`.
/// - **Slopes**: intersection numbers, shortest complements and the short-slope search.
/// - **S3**: the three-pass search for the slope whose filling is the 3-sphere.
/// - **Systole**: length-spectrum systole estimates with retriangulation and covers.
/// - **Fillings**: single-filling classification and distinguishing two fillings.
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Rejection, SlopeError};
pub use fillings::{
    are_distinguished_by_hyp_invars, are_distinguished_by_length_spectrum, classify_filling,
    is_hyperbolic_filling, Distinction, LengthSpectrumSettings,
};
pub use s3::{find_s3_slope, S3Search, S3SearchSettings};
pub use slopes::{
    alg_int, cusp_invariants, find_short_slopes, preferred_rep, shortest_complement,
    ShortSlopeSettings, ShortSlopes,
};
pub use systole::{systole, systole_with_covers, systole_with_tries};
pub use topology::{is_knot_manifold, sanity_check_cusped};
pub use types::{
    ComplexBall, ExceptionalKind, GroupSignature, Holonomy, Homology, RealBall, Slope,
    SlopeClass, SolutionType, Trilean,
};
