use anyhow::Result;
use num_complex::Complex;
use std::fmt::Debug;

use crate::types::{
    ComplexBall, GroupSignature, Homology, Holonomy, RealBall, Slope, SolutionType, Trilean,
};

/// A verified number reported by the geometry oracle at some precision.
///
/// The only question asked of it is whether two values are provably more
/// than `multiple * 2^-bits` apart.
///
/// The [`RealBall`] and [`ComplexBall`] impls keep `f64` centers and cannot
/// separate values closer than about `2^-52` times their size. Oracles
/// working above 53 bits must supply their own multiprecision type.
pub trait VerifiedNumber: Clone + Debug {
    fn exceeds_separation(&self, other: &Self, multiple: f64, bits: u32) -> bool;
}

/// `multiple * 2^-bits` as a float.
pub fn separation_bound(multiple: f64, bits: u32) -> f64 {
    multiple * (-f64::from(bits)).exp2()
}

impl VerifiedNumber for RealBall {
    fn exceeds_separation(&self, other: &Self, multiple: f64, bits: u32) -> bool {
        let gap = (self.center - other.center).abs() - self.radius - other.radius;
        gap > separation_bound(multiple, bits)
    }
}

impl VerifiedNumber for ComplexBall {
    fn exceeds_separation(&self, other: &Self, multiple: f64, bits: u32) -> bool {
        let gap = (self.center - other.center).norm() - self.radius - other.radius;
        gap > separation_bound(multiple, bits)
    }
}

/// A Dirichlet domain of a closed hyperbolic manifold.
pub trait DirichletDomain {
    /// Complex lengths of closed geodesics up to `cutoff`, listed without
    /// grouping by multiplicity, ascending by real part.
    fn length_spectrum(&self, cutoff: f64) -> Result<Vec<Complex<f64>>>;
}

/// Handle on a triangulated 3-manifold with zero or more unfilled cusps.
///
/// `clone` is an independent copy sharing no mutable state. Procedures in
/// this crate never mutate a handle they were given; they clone first.
pub trait Manifold: Clone {
    type Volume: VerifiedNumber;
    type ComplexVolume: VerifiedNumber;
    type Domain: DirichletDomain;

    fn name(&self) -> String;

    /// Number of cusps, filled or not.
    fn num_cusps(&self) -> usize;

    fn is_cusp_filled(&self, cusp: usize) -> bool;

    fn is_orientable(&self) -> bool;

    fn homology(&self) -> Homology;

    /// Slope on cusp 0 that is trivial in rational homology.
    fn homological_longitude(&self) -> Slope;

    /// Fills cusp 0 in place.
    fn dehn_fill(&mut self, slope: Slope);

    /// Replaces the triangulation by a random one of the same manifold.
    /// The same seed on the same triangulation gives the same result.
    fn randomize(&mut self, seed: u64);

    /// Holonomies of the current meridian and longitude of cusp 0.
    fn cusp_translations(&self, bits: u32) -> Result<Holonomy>;

    /// Copy of the handle working at the highest available precision.
    fn high_precision(&self) -> Self;

    /// Floating-point volume of the current solution. Not verified.
    fn approximate_volume(&self) -> Result<f64>;

    fn volume(&self, bits: u32) -> Result<Self::Volume>;

    /// Volume plus `i` times Chern-Simons, verified modulo 2-torsion.
    fn complex_volume(&self, bits: u32) -> Result<Self::ComplexVolume>;

    fn length_spectrum(&self, cutoff: f64, full_rigor: bool) -> Result<Vec<Complex<f64>>>;

    fn dirichlet_domain(&self) -> Result<Self::Domain>;

    /// Connected covers of the given degree.
    fn covers(&self, degree: u32) -> Result<Vec<Self>>;

    /// Slopes on cusp 0 of length below `cutoff`, verified at `bits`.
    fn short_slopes(&self, cutoff: f64, bits: u32) -> Result<Vec<Slope>>;

    fn solution_type(&self) -> SolutionType;

    fn triangulation_signature(&self) -> String;

    /// Builds a fresh handle from a triangulation signature.
    fn from_signature(&self, signature: &str) -> Result<Self>;
}

/// Combinatorial recognition of closed and cusped triangulations.
pub trait Recognition<M: Manifold> {
    /// Signatures of closed triangulations of the filled manifold. An
    /// empty list means none were found within the budget.
    fn closed_signatures(&self, manifold: &M, tries: usize, max_tets: usize) -> Vec<String>;

    fn is_irreducible(&self, signature: &str) -> Result<bool>;

    /// Decides toroidality of the filled triangulation, returning the
    /// pieces of a decomposition along tori when toroidal.
    fn is_toroidal(&self, manifold: &M) -> Result<(bool, Vec<String>)>;

    /// Decomposes along tori; the pieces need not form the JSJ decomposition.
    fn decompose_along_tori(&self, signature: &str) -> Result<(Trilean, Vec<String>)>;

    fn is_three_sphere(&self, signature: &str) -> Result<bool>;

    /// Census name, if the manifold is recognized.
    fn census_name(&self, manifold: &M) -> Option<String>;
}

pub trait FundamentalGroup<M: Manifold> {
    fn classify(&self, manifold: &M, tries: usize) -> GroupSignature;

    fn is_torus_link_filling(&self, manifold: &M) -> bool;
}

pub trait Geometrization<M: Manifold> {
    /// Searches for a triangulation with all tetrahedra positively oriented.
    fn find_positive_triangulation(&self, manifold: &M, tries: usize) -> Option<M>;

    /// True once a verified hyperbolic structure has been found.
    fn is_hyperbolic(&self, manifold: &M, tries: usize) -> bool;
}

/// Everything the decision procedures consult besides the manifold itself.
pub trait Oracles<M: Manifold>: Recognition<M> + FundamentalGroup<M> + Geometrization<M> {}

impl<M: Manifold, T> Oracles<M> for T where
    T: Recognition<M> + FundamentalGroup<M> + Geometrization<M>
{
}
