//! Value types shared by the slope, systole and filling routines.
//!
//! Everything here is a plain value: created per call, copied freely and
//! never tied to a manifold handle.

use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;

/// A slope on a cusp torus, written as `(p, q)` in the current
/// meridian/longitude framing.
///
/// `(p, q)` and `(-p, -q)` describe the same unoriented curve; use
/// [`Slope::preferred`] to pick the canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slope {
    pub p: i64,
    pub q: i64,
}

impl Slope {
    pub const MERIDIAN: Slope = Slope { p: 1, q: 0 };
    pub const LONGITUDE: Slope = Slope { p: 0, q: 1 };

    pub const fn new(p: i64, q: i64) -> Self {
        Self { p, q }
    }

    /// Canonical representative: first nonzero coordinate positive.
    pub fn preferred(self) -> Self {
        if self.p < 0 || (self.p == 0 && self.q < 0) {
            -self
        } else {
            self
        }
    }

    pub fn is_primitive(self) -> bool {
        gcd(self.p, self.q) == 1
    }

    /// Holonomy `p·m + q·l` of the slope under the given cusp shape.
    pub fn holonomy(self, holonomy: &Holonomy) -> Complex<f64> {
        holonomy.meridian * self.p as f64 + holonomy.longitude * self.q as f64
    }

    /// Geometric length of the slope on the cusp torus.
    pub fn length(self, holonomy: &Holonomy) -> f64 {
        self.holonomy(holonomy).norm()
    }
}

impl Neg for Slope {
    type Output = Slope;

    fn neg(self) -> Slope {
        Slope::new(-self.p, -self.q)
    }
}

impl From<(i64, i64)> for Slope {
    fn from((p, q): (i64, i64)) -> Self {
        Slope::new(p, q)
    }
}

impl fmt::Display for Slope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.p, self.q)
    }
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Translations of the meridian and longitude on the cusp torus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Holonomy {
    pub meridian: Complex<f64>,
    pub longitude: Complex<f64>,
}

impl Holonomy {
    pub fn new(meridian: Complex<f64>, longitude: Complex<f64>) -> Self {
        Self {
            meridian,
            longitude,
        }
    }

    /// Area of the cusp torus spanned by the two translations.
    pub fn area(&self) -> f64 {
        (self.meridian.conj() * self.longitude).im.abs()
    }
}

/// Holonomies together with the Hodgson-Kerckhoff normalization factor
/// `sqrt(area)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuspInvariants {
    pub holonomy: Holonomy,
    pub norm_factor: f64,
}

/// First homology as `Z^betti ⊕ Z/t_1 ⊕ ... ⊕ Z/t_k`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Homology {
    pub betti: u32,
    pub torsion: Vec<u64>,
}

impl Homology {
    pub fn integers() -> Self {
        Self {
            betti: 1,
            torsion: Vec::new(),
        }
    }

    /// True when the group is exactly `Z`.
    pub fn is_integers(&self) -> bool {
        self.betti == 1 && self.torsion.iter().all(|&t| t == 1)
    }
}

/// State of the hyperbolic structure solver on the current triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionType {
    AllPositive,
    ContainsNegative,
    ContainsFlat,
    ContainsDegenerate,
    NotAttempted,
    NoSolution,
}

/// Classification of a fundamental group by the group oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupSignature {
    /// Trivial group, so the filling is S3.
    Trivial,
    S2xS1,
    Free,
    Lens,
    LensSummand,
    OtherExceptional,
    NotExceptional,
    Unknown,
}

impl GroupSignature {
    /// Whether the group alone proves the manifold is not hyperbolic.
    pub fn is_exceptional(self) -> bool {
        !matches!(self, GroupSignature::NotExceptional | GroupSignature::Unknown)
    }

    /// Signatures that can never come from the 3-sphere.
    pub fn rules_out_sphere(self) -> bool {
        matches!(
            self,
            GroupSignature::S2xS1
                | GroupSignature::Free
                | GroupSignature::Lens
                | GroupSignature::LensSummand
        )
    }

    pub fn exceptional_kind(self) -> Option<ExceptionalKind> {
        match self {
            GroupSignature::Trivial => Some(ExceptionalKind::S3),
            GroupSignature::S2xS1 => Some(ExceptionalKind::S2xS1),
            GroupSignature::Free => Some(ExceptionalKind::FreeGroup),
            GroupSignature::Lens => Some(ExceptionalKind::Lens),
            GroupSignature::LensSummand => Some(ExceptionalKind::LensSummand),
            GroupSignature::OtherExceptional => Some(ExceptionalKind::Other),
            GroupSignature::NotExceptional | GroupSignature::Unknown => None,
        }
    }
}

/// Why a filling is known to be non-hyperbolic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExceptionalKind {
    S3,
    S2xS1,
    FreeGroup,
    Lens,
    LensSummand,
    Sfs,
    Toroidal,
    Reducible,
    Other,
}

/// Three-valued answer. `Unknown` is a real outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trilean {
    True,
    False,
    Unknown,
}

impl Trilean {
    pub fn is_true(self) -> bool {
        self == Trilean::True
    }

    pub fn is_false(self) -> bool {
        self == Trilean::False
    }

    pub fn to_option(self) -> Option<bool> {
        match self {
            Trilean::True => Some(true),
            Trilean::False => Some(false),
            Trilean::Unknown => None,
        }
    }
}

impl From<bool> for Trilean {
    fn from(value: bool) -> Self {
        if value {
            Trilean::True
        } else {
            Trilean::False
        }
    }
}

impl From<Option<bool>> for Trilean {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Trilean::Unknown, Trilean::from)
    }
}

/// Classification of a single Dehn filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlopeClass {
    Hyperbolic,
    Exceptional(ExceptionalKind),
    Unknown,
}

impl SlopeClass {
    pub fn is_hyperbolic(self) -> Trilean {
        match self {
            SlopeClass::Hyperbolic => Trilean::True,
            SlopeClass::Exceptional(_) => Trilean::False,
            SlopeClass::Unknown => Trilean::Unknown,
        }
    }
}

/// A real number known to lie within `radius` of `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealBall {
    pub center: f64,
    pub radius: f64,
}

/// A complex number known to lie within `radius` of `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexBall {
    pub center: Complex<f64>,
    pub radius: f64,
}
