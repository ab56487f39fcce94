//! The boundary to the external force engine.
//!
//! A force engine stores restraints per kind and addresses them two ways: creation
//! returns a *global* restraint index used for group membership, while modification
//! takes the restraint's position among restraints of the same kind. Groups and
//! collections have their own index spaces.

use crate::core::restraints::kinds::RestraintKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceError {
    #[error("{what} index {index} is out of range (have {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Update for {kind} restraint {index} changes its parameter layout from {expected:?} to {found:?}")]
    LayoutMismatch {
        kind: RestraintKind,
        index: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("num_active = {num_active} exceeds the {len} members of {what} {index}")]
    NumActiveTooLarge {
        what: &'static str,
        index: usize,
        num_active: usize,
        len: usize,
    },

    #[error("Force engine rejected the call: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceParams {
    pub atom_1: usize,
    pub atom_2: usize,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub force_constant: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HyperbolicDistanceParams {
    pub atom_1: usize,
    pub atom_2: usize,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub force_constant: f64,
    pub asymptote: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TorsionParams {
    pub atoms: [usize; 4],
    pub phi: f64,
    pub delta_phi: f64,
    pub force_constant: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistProfileParams {
    pub atom_1: usize,
    pub atom_2: usize,
    pub r_min: f64,
    pub r_max: f64,
    pub n_bins: usize,
    pub coefficients: [Vec<f64>; 4],
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TorsProfileParams {
    pub atoms: [usize; 8],
    pub n_bins: usize,
    pub coefficients: [Vec<f64>; 16],
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GmmParams {
    pub n_distances: usize,
    pub n_components: usize,
    pub scale: f64,
    pub atoms: Vec<usize>,
    pub weights: Vec<f64>,
    pub means: Vec<f64>,
    pub precision_diagonals: Vec<f64>,
    pub precision_off_diagonals: Vec<f64>,
}

/// The flat parameter list for one restraint, as passed to create and update calls.
#[derive(Debug, Clone, PartialEq)]
pub enum RestraintParams {
    Distance(DistanceParams),
    HyperbolicDistance(HyperbolicDistanceParams),
    Torsion(TorsionParams),
    DistProfile(DistProfileParams),
    TorsProfile(TorsProfileParams),
    Gmm(GmmParams),
}

impl RestraintParams {
    pub fn kind(&self) -> RestraintKind {
        match self {
            Self::Distance(_) => RestraintKind::Distance,
            Self::HyperbolicDistance(_) => RestraintKind::HyperbolicDistance,
            Self::Torsion(_) => RestraintKind::Torsion,
            Self::DistProfile(_) => RestraintKind::DistProfile,
            Self::TorsProfile(_) => RestraintKind::TorsProfile,
            Self::Gmm(_) => RestraintKind::GmmDistance,
        }
    }

    /// Lengths of the variable-sized parts of the list.
    ///
    /// An engine sizes its buffers on creation, so an update must keep the same layout.
    pub fn layout(&self) -> Vec<usize> {
        match self {
            Self::Distance(_) | Self::HyperbolicDistance(_) | Self::Torsion(_) => Vec::new(),
            Self::DistProfile(p) => std::iter::once(p.n_bins)
                .chain(p.coefficients.iter().map(Vec::len))
                .collect(),
            Self::TorsProfile(p) => std::iter::once(p.n_bins)
                .chain(p.coefficients.iter().map(Vec::len))
                .collect(),
            Self::Gmm(p) => vec![
                p.n_distances,
                p.n_components,
                p.atoms.len(),
                p.weights.len(),
                p.means.len(),
                p.precision_diagonals.len(),
                p.precision_off_diagonals.len(),
            ],
        }
    }

    /// The strength term the engine multiplies the potential by.
    pub fn force_term(&self) -> f64 {
        match self {
            Self::Distance(p) => p.force_constant,
            Self::HyperbolicDistance(p) => p.force_constant,
            Self::Torsion(p) => p.force_constant,
            Self::DistProfile(p) => p.scale_factor,
            Self::TorsProfile(p) => p.scale_factor,
            Self::Gmm(p) => p.scale,
        }
    }
}

/// A force object that evaluates MELD restraints, groups and collections.
pub trait RestraintForce {
    /// The live simulation state the force pushes updated parameters into.
    type Context;

    /// Creates a restraint and returns its global restraint index.
    fn add_restraint(&mut self, params: RestraintParams) -> Result<usize, ForceError>;

    /// Replaces the parameters of the `index`-th restraint of `params.kind()`.
    fn modify_restraint(&mut self, index: usize, params: RestraintParams)
    -> Result<(), ForceError>;

    fn add_group(&mut self, restraint_indices: &[usize], num_active: usize)
    -> Result<usize, ForceError>;

    fn modify_group_num_active(&mut self, index: usize, num_active: usize)
    -> Result<(), ForceError>;

    fn add_collection(&mut self, group_indices: &[usize], num_active: usize)
    -> Result<usize, ForceError>;

    fn modify_collection_num_active(&mut self, index: usize, num_active: usize)
    -> Result<(), ForceError>;

    /// Copies the current parameters into `context` and rebuilds any derived state.
    fn update_parameters_in_context(&mut self, context: &mut Self::Context)
    -> Result<(), ForceError>;
}

/// A system that forces can be attached to.
pub trait ForceSystem<F> {
    /// Registers `force` and returns its index within the system.
    fn add_force(&mut self, force: &F) -> Result<usize, ForceError>;
}

/// Bundles the engine types a transformer works against.
pub trait Backend {
    type Context;
    type Force: RestraintForce<Context = Self::Context> + Default;
    type System: ForceSystem<Self::Force>;
    type Topology;
}
