use super::error::RestraintError;
use super::gmm::GmmDistanceRestraint;
use super::schedule::{Positioner, Ramp, Scaler};
use super::spline::{DistProfileCoefficients, TorsProfileCoefficients};
use std::fmt;

/// Flat-bottom harmonic distance restraint with alpha-dependent bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceRestraint {
    pub atom_index_1: usize,
    pub atom_index_2: usize,
    pub r1: Positioner,
    pub r2: Positioner,
    pub r3: Positioner,
    pub r4: Positioner,
    pub k: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl DistanceRestraint {
    pub fn new(
        atom_index_1: usize,
        atom_index_2: usize,
        bounds: [Positioner; 4],
        k: f64,
    ) -> Result<Self, RestraintError> {
        let [r1, r2, r3, r4] = bounds;
        let restraint = Self {
            atom_index_1,
            atom_index_2,
            r1,
            r2,
            r3,
            r4,
            k,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        restraint.validate()?;
        Ok(restraint)
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        check_distinct(&[self.atom_index_1, self.atom_index_2])?;
        check_non_negative("k", self.k)?;
        for positioner in [&self.r1, &self.r2, &self.r3, &self.r4] {
            positioner.validate()?;
        }
        // Bounds are only checked at the ends of the schedule.
        for alpha in [0.0, 1.0] {
            check_bounds([
                self.r1.position(alpha),
                self.r2.position(alpha),
                self.r3.position(alpha),
                self.r4.position(alpha),
            ])?;
        }
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Distance restraint whose outer wall flattens towards an asymptotic energy.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperbolicDistanceRestraint {
    pub atom_index_1: usize,
    pub atom_index_2: usize,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub r4: f64,
    pub k: f64,
    pub asymptote: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl HyperbolicDistanceRestraint {
    pub fn new(
        atom_index_1: usize,
        atom_index_2: usize,
        bounds: [f64; 4],
        k: f64,
        asymptote: f64,
    ) -> Result<Self, RestraintError> {
        let [r1, r2, r3, r4] = bounds;
        let restraint = Self {
            atom_index_1,
            atom_index_2,
            r1,
            r2,
            r3,
            r4,
            k,
            asymptote,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        restraint.validate()?;
        Ok(restraint)
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        check_distinct(&[self.atom_index_1, self.atom_index_2])?;
        check_non_negative("k", self.k)?;
        check_non_negative("asymptote", self.asymptote)?;
        check_bounds([self.r1, self.r2, self.r3, self.r4])?;
        if self.r4 <= self.r3 {
            return Err(RestraintError::InvalidParameter {
                field: "r4",
                reason: "the hyperbolic wall needs r4 > r3".to_string(),
            });
        }
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Flat-bottom harmonic restraint on a dihedral angle, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionRestraint {
    pub atom_index_1: usize,
    pub atom_index_2: usize,
    pub atom_index_3: usize,
    pub atom_index_4: usize,
    pub phi: f64,
    pub delta_phi: f64,
    pub k: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl TorsionRestraint {
    pub fn new(
        atoms: [usize; 4],
        phi: f64,
        delta_phi: f64,
        k: f64,
    ) -> Result<Self, RestraintError> {
        let [atom_index_1, atom_index_2, atom_index_3, atom_index_4] = atoms;
        let restraint = Self {
            atom_index_1,
            atom_index_2,
            atom_index_3,
            atom_index_4,
            phi,
            delta_phi,
            k,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        restraint.validate()?;
        Ok(restraint)
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        check_distinct(&[
            self.atom_index_1,
            self.atom_index_2,
            self.atom_index_3,
            self.atom_index_4,
        ])?;
        if !(-180.0..=180.0).contains(&self.phi) {
            return Err(RestraintError::InvalidParameter {
                field: "phi",
                reason: format!("{} is outside [-180, 180]", self.phi),
            });
        }
        if !(0.0..=180.0).contains(&self.delta_phi) {
            return Err(RestraintError::InvalidParameter {
                field: "delta_phi",
                reason: format!("{} is outside [0, 180]", self.delta_phi),
            });
        }
        check_non_negative("k", self.k)?;
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Spline-interpolated potential of mean force over one distance.
#[derive(Debug, Clone, PartialEq)]
pub struct DistProfileRestraint {
    pub atom_index_1: usize,
    pub atom_index_2: usize,
    pub r_min: f64,
    pub r_max: f64,
    pub coefficients: DistProfileCoefficients,
    pub scale_factor: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl DistProfileRestraint {
    pub fn new(
        atom_index_1: usize,
        atom_index_2: usize,
        r_min: f64,
        r_max: f64,
        coefficients: DistProfileCoefficients,
        scale_factor: f64,
    ) -> Result<Self, RestraintError> {
        let restraint = Self {
            atom_index_1,
            atom_index_2,
            r_min,
            r_max,
            coefficients,
            scale_factor,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        restraint.validate()?;
        Ok(restraint)
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn n_bins(&self) -> usize {
        self.coefficients.n_bins()
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        check_distinct(&[self.atom_index_1, self.atom_index_2])?;
        check_non_negative("r_min", self.r_min)?;
        if self.r_max <= self.r_min {
            return Err(RestraintError::InvalidParameter {
                field: "r_max",
                reason: format!("r_max ({}) must exceed r_min ({})", self.r_max, self.r_min),
            });
        }
        check_non_negative("scale_factor", self.scale_factor)?;
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Bicubic-spline potential over a pair of dihedral angles.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsProfileRestraint {
    /// The first four atoms define phi, the last four define psi.
    pub atoms: [usize; 8],
    pub coefficients: TorsProfileCoefficients,
    pub scale_factor: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl TorsProfileRestraint {
    pub fn new(
        atoms: [usize; 8],
        coefficients: TorsProfileCoefficients,
        scale_factor: f64,
    ) -> Result<Self, RestraintError> {
        let restraint = Self {
            atoms,
            coefficients,
            scale_factor,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        restraint.validate()?;
        Ok(restraint)
    }

    pub fn with_scaler(mut self, scaler: Scaler) -> Self {
        self.scaler = scaler;
        self
    }

    pub fn with_ramp(mut self, ramp: Ramp) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn n_bins(&self) -> usize {
        self.coefficients.n_bins()
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        check_distinct(&self.atoms[..4])?;
        check_distinct(&self.atoms[4..])?;
        check_non_negative("scale_factor", self.scale_factor)?;
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Keeps an atom inside a sphere around the origin. Handled by a separate transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfinementRestraint {
    pub atom_index: usize,
    pub radius: f64,
    pub force_const: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl ConfinementRestraint {
    pub fn validate(&self) -> Result<(), RestraintError> {
        check_non_negative("radius", self.radius)?;
        check_non_negative("force_const", self.force_const)?;
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// Holds an atom near a fixed position. Handled by a separate transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianRestraint {
    pub atom_index: usize,
    pub position: [f64; 3],
    pub delta: f64,
    pub force_const: f64,
    pub scaler: Scaler,
    pub ramp: Ramp,
}

impl CartesianRestraint {
    pub fn validate(&self) -> Result<(), RestraintError> {
        check_non_negative("delta", self.delta)?;
        check_non_negative("force_const", self.force_const)?;
        self.scaler.validate()?;
        self.ramp.validate()
    }
}

/// The restraint kinds that can be selected by group and collection logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestraintKind {
    Distance,
    HyperbolicDistance,
    Torsion,
    DistProfile,
    TorsProfile,
    GmmDistance,
}

impl RestraintKind {
    pub const ALL: [RestraintKind; 6] = [
        Self::Distance,
        Self::HyperbolicDistance,
        Self::Torsion,
        Self::DistProfile,
        Self::TorsProfile,
        Self::GmmDistance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::HyperbolicDistance => "hyperbolic-distance",
            Self::Torsion => "torsion",
            Self::DistProfile => "dist-profile",
            Self::TorsProfile => "tors-profile",
            Self::GmmDistance => "gmm-distance",
        }
    }

    /// Position of this kind in [`RestraintKind::ALL`].
    pub fn ordinal(&self) -> usize {
        match self {
            Self::Distance => 0,
            Self::HyperbolicDistance => 1,
            Self::Torsion => 2,
            Self::DistProfile => 3,
            Self::TorsProfile => 4,
            Self::GmmDistance => 5,
        }
    }
}

impl fmt::Display for RestraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A restraint that can live inside a group.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectableRestraint {
    Distance(DistanceRestraint),
    HyperbolicDistance(HyperbolicDistanceRestraint),
    Torsion(TorsionRestraint),
    DistProfile(DistProfileRestraint),
    TorsProfile(TorsProfileRestraint),
    GmmDistance(GmmDistanceRestraint),
}

impl SelectableRestraint {
    pub fn kind(&self) -> RestraintKind {
        match self {
            Self::Distance(_) => RestraintKind::Distance,
            Self::HyperbolicDistance(_) => RestraintKind::HyperbolicDistance,
            Self::Torsion(_) => RestraintKind::Torsion,
            Self::DistProfile(_) => RestraintKind::DistProfile,
            Self::TorsProfile(_) => RestraintKind::TorsProfile,
            Self::GmmDistance(_) => RestraintKind::GmmDistance,
        }
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        match self {
            Self::Distance(r) => r.validate(),
            Self::HyperbolicDistance(r) => r.validate(),
            Self::Torsion(r) => r.validate(),
            Self::DistProfile(r) => r.validate(),
            Self::TorsProfile(r) => r.validate(),
            Self::GmmDistance(r) => r.validate(),
        }
    }
}

/// Any restraint in a restraint set, selectable or not.
#[derive(Debug, Clone, PartialEq)]
pub enum Restraint {
    Distance(DistanceRestraint),
    HyperbolicDistance(HyperbolicDistanceRestraint),
    Torsion(TorsionRestraint),
    DistProfile(DistProfileRestraint),
    TorsProfile(TorsProfileRestraint),
    GmmDistance(GmmDistanceRestraint),
    Confinement(ConfinementRestraint),
    Cartesian(CartesianRestraint),
}

impl Restraint {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Distance(_) => RestraintKind::Distance.as_str(),
            Self::HyperbolicDistance(_) => RestraintKind::HyperbolicDistance.as_str(),
            Self::Torsion(_) => RestraintKind::Torsion.as_str(),
            Self::DistProfile(_) => RestraintKind::DistProfile.as_str(),
            Self::TorsProfile(_) => RestraintKind::TorsProfile.as_str(),
            Self::GmmDistance(_) => RestraintKind::GmmDistance.as_str(),
            Self::Confinement(_) => "confinement",
            Self::Cartesian(_) => "cartesian",
        }
    }

    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::Confinement(_) | Self::Cartesian(_))
    }

    pub fn validate(&self) -> Result<(), RestraintError> {
        match self {
            Self::Distance(r) => r.validate(),
            Self::HyperbolicDistance(r) => r.validate(),
            Self::Torsion(r) => r.validate(),
            Self::DistProfile(r) => r.validate(),
            Self::TorsProfile(r) => r.validate(),
            Self::GmmDistance(r) => r.validate(),
            Self::Confinement(r) => r.validate(),
            Self::Cartesian(r) => r.validate(),
        }
    }
}

impl TryFrom<Restraint> for SelectableRestraint {
    /// Non-selectable restraints are handed back unchanged.
    type Error = Restraint;

    fn try_from(restraint: Restraint) -> Result<Self, Self::Error> {
        match restraint {
            Restraint::Distance(r) => Ok(Self::Distance(r)),
            Restraint::HyperbolicDistance(r) => Ok(Self::HyperbolicDistance(r)),
            Restraint::Torsion(r) => Ok(Self::Torsion(r)),
            Restraint::DistProfile(r) => Ok(Self::DistProfile(r)),
            Restraint::TorsProfile(r) => Ok(Self::TorsProfile(r)),
            Restraint::GmmDistance(r) => Ok(Self::GmmDistance(r)),
            other @ (Restraint::Confinement(_) | Restraint::Cartesian(_)) => Err(other),
        }
    }
}

impl From<SelectableRestraint> for Restraint {
    fn from(restraint: SelectableRestraint) -> Self {
        match restraint {
            SelectableRestraint::Distance(r) => Self::Distance(r),
            SelectableRestraint::HyperbolicDistance(r) => Self::HyperbolicDistance(r),
            SelectableRestraint::Torsion(r) => Self::Torsion(r),
            SelectableRestraint::DistProfile(r) => Self::DistProfile(r),
            SelectableRestraint::TorsProfile(r) => Self::TorsProfile(r),
            SelectableRestraint::GmmDistance(r) => Self::GmmDistance(r),
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SelectableRestraint {
                fn from(r: $ty) -> Self {
                    Self::$variant(r)
                }
            }

            impl From<$ty> for Restraint {
                fn from(r: $ty) -> Self {
                    Self::$variant(r)
                }
            }
        )*
    };
}

impl_from_variant! {
    Distance => DistanceRestraint,
    HyperbolicDistance => HyperbolicDistanceRestraint,
    Torsion => TorsionRestraint,
    DistProfile => DistProfileRestraint,
    TorsProfile => TorsProfileRestraint,
    GmmDistance => GmmDistanceRestraint,
}

impl From<ConfinementRestraint> for Restraint {
    fn from(r: ConfinementRestraint) -> Self {
        Self::Confinement(r)
    }
}

impl From<CartesianRestraint> for Restraint {
    fn from(r: CartesianRestraint) -> Self {
        Self::Cartesian(r)
    }
}

fn check_distinct(atoms: &[usize]) -> Result<(), RestraintError> {
    let duplicated = atoms
        .iter()
        .enumerate()
        .any(|(i, a)| atoms[i + 1..].contains(a));
    if duplicated {
        Err(RestraintError::DuplicateAtoms(atoms.to_vec()))
    } else {
        Ok(())
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), RestraintError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(RestraintError::InvalidParameter {
            field,
            reason: format!("must be non-negative, got {value}"),
        })
    }
}

fn check_bounds(bounds: [f64; 4]) -> Result<(), RestraintError> {
    if bounds[0] < 0.0 || bounds.windows(2).any(|w| w[0] > w[1]) {
        Err(RestraintError::InvalidParameter {
            field: "r1..r4",
            reason: format!("bounds {bounds:?} must be non-negative and ordered r1 <= r2 <= r3 <= r4"),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_bounds(values: [f64; 4]) -> [Positioner; 4] {
        values.map(Positioner::Constant)
    }

    #[test]
    fn distance_restraint_accepts_ordered_bounds() {
        let restraint =
            DistanceRestraint::new(0, 1, constant_bounds([0.0, 0.1, 0.4, 0.5]), 250.0).unwrap();
        assert_eq!(restraint.scaler, Scaler::Constant);
        assert_eq!(restraint.ramp, Ramp::Constant);
    }

    #[test]
    fn distance_restraint_rejects_unordered_bounds() {
        let result = DistanceRestraint::new(0, 1, constant_bounds([0.0, 0.5, 0.4, 0.6]), 250.0);
        assert!(matches!(
            result,
            Err(RestraintError::InvalidParameter { field: "r1..r4", .. })
        ));
    }

    #[test]
    fn distance_restraint_checks_bounds_at_both_ends_of_schedule() {
        let moving_r3 = Positioner::Linear {
            alpha_min: 0.0,
            alpha_max: 1.0,
            pos_min: 0.4,
            pos_max: 0.9,
        };
        let result = DistanceRestraint::new(
            0,
            1,
            [
                Positioner::Constant(0.0),
                Positioner::Constant(0.1),
                moving_r3,
                Positioner::Constant(0.6),
            ],
            1.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn distance_restraint_rejects_same_atom_twice() {
        let result = DistanceRestraint::new(3, 3, constant_bounds([0.0, 0.0, 0.3, 0.4]), 1.0);
        assert_eq!(result, Err(RestraintError::DuplicateAtoms(vec![3, 3])));
    }

    #[test]
    fn hyperbolic_restraint_requires_outer_wall() {
        let result = HyperbolicDistanceRestraint::new(0, 1, [0.0, 0.1, 0.5, 0.5], 10.0, 2.0);
        assert!(matches!(
            result,
            Err(RestraintError::InvalidParameter { field: "r4", .. })
        ));
    }

    #[test]
    fn torsion_restraint_validates_angle_ranges() {
        assert!(TorsionRestraint::new([0, 1, 2, 3], -60.0, 10.0, 5.0).is_ok());
        assert!(matches!(
            TorsionRestraint::new([0, 1, 2, 3], 200.0, 10.0, 5.0),
            Err(RestraintError::InvalidParameter { field: "phi", .. })
        ));
        assert!(matches!(
            TorsionRestraint::new([0, 1, 2, 3], 0.0, -1.0, 5.0),
            Err(RestraintError::InvalidParameter {
                field: "delta_phi",
                ..
            })
        ));
    }

    #[test]
    fn dist_profile_requires_positive_range() {
        let coeffs = DistProfileCoefficients::from_rows(&[[0.0; 4]; 3]).unwrap();
        let result = DistProfileRestraint::new(0, 1, 0.5, 0.5, coeffs, 1.0);
        assert!(matches!(
            result,
            Err(RestraintError::InvalidParameter { field: "r_max", .. })
        ));
    }

    #[test]
    fn tors_profile_allows_shared_atoms_between_dihedrals() {
        let coeffs = TorsProfileCoefficients::from_rows(&[[0.0; 16]; 4]).unwrap();
        let restraint =
            TorsProfileRestraint::new([0, 1, 2, 3, 1, 2, 3, 4], coeffs, 1.0).unwrap();
        assert_eq!(restraint.n_bins(), 4);
    }

    #[test]
    fn try_from_returns_non_selectable_restraint_unchanged() {
        let confinement = Restraint::from(ConfinementRestraint {
            atom_index: 7,
            radius: 3.0,
            force_const: 100.0,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        });
        assert!(!confinement.is_selectable());

        let returned = SelectableRestraint::try_from(confinement.clone()).unwrap_err();
        assert_eq!(returned, confinement);
    }

    #[test]
    fn try_from_converts_selectable_restraint() {
        let torsion = TorsionRestraint::new([0, 1, 2, 3], 0.0, 20.0, 1.0).unwrap();
        let selectable = SelectableRestraint::try_from(Restraint::from(torsion)).unwrap();
        assert_eq!(selectable.kind(), RestraintKind::Torsion);
    }

    #[test]
    fn kind_ordinals_match_all_order() {
        for (i, kind) in RestraintKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal(), i);
        }
    }
}
