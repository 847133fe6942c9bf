//! Scripted stand-ins for a manifold handle and the oracles.
//!
//! Behavior lives in closures on a shared [`Script`]; each handle only
//! carries its own filling and triangulation state, so clones stay
//! independent the way real handles are.

use anyhow::{anyhow, Result};
use num_complex::Complex;
use std::cell::RefCell;
use std::rc::Rc;

use crate::traits::{
    DirichletDomain, FundamentalGroup, Geometrization, Manifold, Recognition, VerifiedNumber,
};
use crate::types::{
    ComplexBall, GroupSignature, Holonomy, Homology, Slope, SolutionType, Trilean,
};

/// Exact dyadic number `mantissa · 2^exponent`, for volumes closer than an
/// `f64` can resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Dyadic {
    pub mantissa: i128,
    pub exponent: i32,
}

impl Dyadic {
    pub fn new(mantissa: i128, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }
}

impl VerifiedNumber for Dyadic {
    fn exceeds_separation(&self, other: &Self, multiple: f64, bits: u32) -> bool {
        let exponent = self.exponent.min(other.exponent);
        let a = self.mantissa << (self.exponent - exponent);
        let b = other.mantissa << (other.exponent - exponent);
        let diff = (a - b).abs() as f64;
        let scale = -(bits as i32) - exponent;
        diff > multiple * f64::from(scale).exp2()
    }
}

type SlopeHook = Box<dyn Fn(f64, u32) -> Result<Vec<Slope>>>;
type SpectrumHook = Box<dyn Fn(&StubManifold, f64) -> Result<Vec<Complex<f64>>>>;
type VolumeHook = Box<dyn Fn(&StubManifold, u32) -> Result<Dyadic>>;
type ComplexVolumeHook = Box<dyn Fn(&StubManifold, u32) -> Result<ComplexBall>>;
type CoverHook = Box<dyn Fn(&StubManifold, u32) -> Result<Vec<StubManifold>>>;

pub(crate) struct Script {
    pub name: String,
    pub num_cusps: usize,
    pub orientable: bool,
    pub homology: Homology,
    pub longitude: Slope,
    pub holonomy: Holonomy,
    pub solution: SolutionType,
    pub approximate_volume: f64,
    /// Randomizing cycles through this many distinct signatures.
    pub signature_cycle: u32,
    pub short_slopes: SlopeHook,
    pub spectrum: SpectrumHook,
    pub domain_spectrum: SpectrumHook,
    pub volume: VolumeHook,
    pub complex_volume: ComplexVolumeHook,
    pub covers: CoverHook,
    /// Degrees passed to `covers`, by any handle sharing this script.
    pub cover_degrees: RefCell<Vec<u32>>,
}

pub(crate) struct ScriptBuilder {
    script: Script,
    exact_slopes: bool,
}

impl ScriptBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            script: Script {
                name: name.to_string(),
                num_cusps: 1,
                orientable: true,
                homology: Homology::integers(),
                longitude: Slope::LONGITUDE,
                holonomy: Holonomy::new(Complex::new(0.0, 1.0), Complex::new(4.0, 0.0)),
                solution: SolutionType::AllPositive,
                approximate_volume: 2.029_883_212_819_307,
                signature_cycle: 5,
                short_slopes: Box::new(|_, _| Ok(Vec::new())),
                spectrum: Box::new(|_, _| Ok(Vec::new())),
                domain_spectrum: Box::new(|_, _| Ok(Vec::new())),
                volume: Box::new(|_, _| Err(anyhow!("volume not scripted"))),
                complex_volume: Box::new(|_, _| Err(anyhow!("complex volume not scripted"))),
                covers: Box::new(|_, _| Ok(Vec::new())),
                cover_degrees: RefCell::new(Vec::new()),
            },
            exact_slopes: false,
        }
    }

    pub fn cusps(mut self, num_cusps: usize) -> Self {
        self.script.num_cusps = num_cusps;
        self
    }

    pub fn homology(mut self, homology: Homology) -> Self {
        self.script.homology = homology;
        self
    }

    pub fn longitude(mut self, longitude: Slope) -> Self {
        self.script.longitude = longitude;
        self
    }

    pub fn holonomy(mut self, holonomy: Holonomy) -> Self {
        self.script.holonomy = holonomy;
        self
    }

    pub fn solution(mut self, solution: SolutionType) -> Self {
        self.script.solution = solution;
        self
    }

    pub fn approximate_volume(mut self, volume: f64) -> Self {
        self.script.approximate_volume = volume;
        self
    }

    pub fn short_slopes(mut self, hook: impl Fn(f64, u32) -> Result<Vec<Slope>> + 'static) -> Self {
        self.script.short_slopes = Box::new(hook);
        self
    }

    /// Answers short-slope queries by enumerating the lattice exactly.
    pub fn exact_short_slopes(mut self) -> Self {
        self.exact_slopes = true;
        self
    }

    pub fn spectrum(
        mut self,
        hook: impl Fn(&StubManifold, f64) -> Result<Vec<Complex<f64>>> + 'static,
    ) -> Self {
        self.script.spectrum = Box::new(hook);
        self
    }

    pub fn domain_spectrum(
        mut self,
        hook: impl Fn(&StubManifold, f64) -> Result<Vec<Complex<f64>>> + 'static,
    ) -> Self {
        self.script.domain_spectrum = Box::new(hook);
        self
    }

    pub fn volume(mut self, hook: impl Fn(&StubManifold, u32) -> Result<Dyadic> + 'static) -> Self {
        self.script.volume = Box::new(hook);
        self
    }

    pub fn complex_volume(
        mut self,
        hook: impl Fn(&StubManifold, u32) -> Result<ComplexBall> + 'static,
    ) -> Self {
        self.script.complex_volume = Box::new(hook);
        self
    }

    pub fn covers(
        mut self,
        hook: impl Fn(&StubManifold, u32) -> Result<Vec<StubManifold>> + 'static,
    ) -> Self {
        self.script.covers = Box::new(hook);
        self
    }

    pub fn build(mut self) -> Rc<Script> {
        if self.exact_slopes {
            let holonomy = self.script.holonomy;
            self.script.short_slopes =
                Box::new(move |cutoff, _| Ok(lattice_slopes_below(&holonomy, cutoff)));
        }
        Rc::new(self.script)
    }
}

/// Every primitive slope shorter than `cutoff`, in both orientations.
pub(crate) fn lattice_slopes_below(holonomy: &Holonomy, cutoff: f64) -> Vec<Slope> {
    let area = holonomy.area();
    let p_max = (cutoff * holonomy.longitude.norm() / area).ceil() as i64;
    let q_max = (cutoff * holonomy.meridian.norm() / area).ceil() as i64;
    let mut slopes = Vec::new();
    for p in -p_max..=p_max {
        for q in -q_max..=q_max {
            let s = Slope::new(p, q);
            if s.is_primitive() && s.length(holonomy) < cutoff {
                slopes.push(s);
            }
        }
    }
    slopes
}

#[derive(Clone)]
pub(crate) struct StubManifold {
    pub script: Rc<Script>,
    pub filling: Option<Slope>,
    pub signature: String,
    pub randomizations: u32,
}

impl StubManifold {
    pub fn new(script: Rc<Script>) -> Self {
        let signature = script.name.clone();
        Self {
            script,
            filling: None,
            signature,
            randomizations: 0,
        }
    }

    pub fn filled(script: Rc<Script>, slope: Slope) -> Self {
        let mut manifold = Self::new(script);
        manifold.dehn_fill(slope);
        manifold
    }
}

pub(crate) struct StubDomain {
    manifold: StubManifold,
}

impl DirichletDomain for StubDomain {
    fn length_spectrum(&self, cutoff: f64) -> Result<Vec<Complex<f64>>> {
        (self.manifold.script.domain_spectrum)(&self.manifold, cutoff)
    }
}

impl Manifold for StubManifold {
    type Volume = Dyadic;
    type ComplexVolume = ComplexBall;
    type Domain = StubDomain;

    fn name(&self) -> String {
        match self.filling {
            Some(s) => format!("{}({},{})", self.script.name, s.p, s.q),
            None => self.script.name.clone(),
        }
    }

    fn num_cusps(&self) -> usize {
        self.script.num_cusps
    }

    fn is_cusp_filled(&self, cusp: usize) -> bool {
        cusp == 0 && self.filling.is_some()
    }

    fn is_orientable(&self) -> bool {
        self.script.orientable
    }

    fn homology(&self) -> Homology {
        self.script.homology.clone()
    }

    fn homological_longitude(&self) -> Slope {
        self.script.longitude
    }

    fn dehn_fill(&mut self, slope: Slope) {
        self.filling = Some(slope);
    }

    fn randomize(&mut self, _seed: u64) {
        self.randomizations += 1;
        self.signature = format!(
            "{}#{}",
            self.script.name,
            self.randomizations % self.script.signature_cycle
        );
    }

    fn cusp_translations(&self, _bits: u32) -> Result<Holonomy> {
        Ok(self.script.holonomy)
    }

    fn high_precision(&self) -> Self {
        self.clone()
    }

    fn approximate_volume(&self) -> Result<f64> {
        Ok(self.script.approximate_volume)
    }

    fn volume(&self, bits: u32) -> Result<Dyadic> {
        (self.script.volume)(self, bits)
    }

    fn complex_volume(&self, bits: u32) -> Result<ComplexBall> {
        (self.script.complex_volume)(self, bits)
    }

    fn length_spectrum(&self, cutoff: f64, _full_rigor: bool) -> Result<Vec<Complex<f64>>> {
        (self.script.spectrum)(self, cutoff)
    }

    fn dirichlet_domain(&self) -> Result<StubDomain> {
        Ok(StubDomain {
            manifold: self.clone(),
        })
    }

    fn covers(&self, degree: u32) -> Result<Vec<Self>> {
        self.script.cover_degrees.borrow_mut().push(degree);
        (self.script.covers)(self, degree)
    }

    fn short_slopes(&self, cutoff: f64, bits: u32) -> Result<Vec<Slope>> {
        (self.script.short_slopes)(cutoff, bits)
    }

    fn solution_type(&self) -> SolutionType {
        self.script.solution
    }

    fn triangulation_signature(&self) -> String {
        self.signature.clone()
    }

    fn from_signature(&self, signature: &str) -> Result<Self> {
        Ok(Self {
            signature: signature.to_string(),
            randomizations: 0,
            ..self.clone()
        })
    }
}

type Judge<T> = Box<dyn Fn(&StubManifold) -> T>;
type SignatureJudge<T> = Box<dyn Fn(&str) -> Result<T>>;

/// All three oracles in one scripted object. Every call is recorded in
/// `calls` as `"<oracle> <manifold name or signature>"`; closed signature
/// requests append their `tries/max_tets` budget.
pub(crate) struct StubOracles {
    pub group: Judge<GroupSignature>,
    pub torus_link: Judge<bool>,
    pub positive: Judge<Option<StubManifold>>,
    pub hyperbolic: Box<dyn Fn(&StubManifold, usize) -> bool>,
    pub census: Judge<Option<String>>,
    pub closed: Judge<Vec<String>>,
    pub irreducible: SignatureJudge<bool>,
    pub toroidal: Judge<Result<(bool, Vec<String>)>>,
    pub decompose: SignatureJudge<(Trilean, Vec<String>)>,
    pub sphere: SignatureJudge<bool>,
    pub calls: RefCell<Vec<String>>,
}

impl Default for StubOracles {
    fn default() -> Self {
        Self {
            group: Box::new(|_| GroupSignature::Unknown),
            torus_link: Box::new(|_| false),
            positive: Box::new(|m| Some(m.clone())),
            hyperbolic: Box::new(|_, _| false),
            census: Box::new(|_| None),
            closed: Box::new(|_| Vec::new()),
            irreducible: Box::new(|_| Ok(true)),
            toroidal: Box::new(|_| Ok((false, Vec::new()))),
            decompose: Box::new(|_| Ok((Trilean::False, Vec::new()))),
            sphere: Box::new(|_| Ok(false)),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl StubOracles {
    fn record(&self, oracle: &str, subject: &str) {
        self.calls.borrow_mut().push(format!("{oracle} {subject}"));
    }

    pub fn calls_to(&self, oracle: &str) -> Vec<String> {
        let prefix = format!("{oracle} ");
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| call.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

impl Recognition<StubManifold> for StubOracles {
    fn closed_signatures(&self, manifold: &StubManifold, tries: usize, max_tets: usize) -> Vec<String> {
        self.record("closed", &format!("{} {tries}/{max_tets}", manifold.name()));
        (self.closed)(manifold)
    }

    fn is_irreducible(&self, signature: &str) -> Result<bool> {
        self.record("irreducible", signature);
        (self.irreducible)(signature)
    }

    fn is_toroidal(&self, manifold: &StubManifold) -> Result<(bool, Vec<String>)> {
        self.record("toroidal", &manifold.name());
        (self.toroidal)(manifold)
    }

    fn decompose_along_tori(&self, signature: &str) -> Result<(Trilean, Vec<String>)> {
        self.record("decompose", signature);
        (self.decompose)(signature)
    }

    fn is_three_sphere(&self, signature: &str) -> Result<bool> {
        self.record("sphere", signature);
        (self.sphere)(signature)
    }

    fn census_name(&self, manifold: &StubManifold) -> Option<String> {
        self.record("census", &manifold.name());
        (self.census)(manifold)
    }
}

impl FundamentalGroup<StubManifold> for StubOracles {
    fn classify(&self, manifold: &StubManifold, _tries: usize) -> GroupSignature {
        self.record("group", &manifold.name());
        (self.group)(manifold)
    }

    fn is_torus_link_filling(&self, manifold: &StubManifold) -> bool {
        self.record("torus_link", &manifold.name());
        (self.torus_link)(manifold)
    }
}

impl Geometrization<StubManifold> for StubOracles {
    fn find_positive_triangulation(&self, manifold: &StubManifold, _tries: usize) -> Option<StubManifold> {
        self.record("positive", &manifold.name());
        (self.positive)(manifold)
    }

    fn is_hyperbolic(&self, manifold: &StubManifold, tries: usize) -> bool {
        self.record("hyperbolic", &manifold.name());
        (self.hyperbolic)(manifold, tries)
    }
}
