use super::force::{
    DistProfileParams, DistanceParams, ForceError, GmmParams, HyperbolicDistanceParams,
    RestraintForce, RestraintParams, TorsProfileParams, TorsionParams,
};
use super::precision::decompose_precisions;
use super::tracker::{RestraintTracker, TrackedSequence};
use crate::core::restraints::gmm::GmmDistanceRestraint;
use crate::core::restraints::kinds::{
    DistProfileRestraint, DistanceRestraint, HyperbolicDistanceRestraint, SelectableRestraint,
    TorsProfileRestraint, TorsionRestraint,
};
use crate::core::restraints::schedule::{Ramp, Scaler};
use tracing::trace;

/// Builds the flat engine parameter list of a restraint at a point of the schedule.
///
/// Creation and update both go through this one builder, so the two calls always agree
/// on arity and order.
pub trait ForceParameters {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams;
}

fn schedule_scale(scaler: &Scaler, ramp: &Ramp, alpha: f64, timestep: u64) -> f64 {
    scaler.scale(alpha) * ramp.weight(timestep)
}

impl ForceParameters for DistanceRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        RestraintParams::Distance(DistanceParams {
            atom_1: self.atom_index_1,
            atom_2: self.atom_index_2,
            r1: self.r1.position(alpha),
            r2: self.r2.position(alpha),
            r3: self.r3.position(alpha),
            r4: self.r4.position(alpha),
            force_constant: self.k * scale,
        })
    }
}

impl ForceParameters for HyperbolicDistanceRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        RestraintParams::HyperbolicDistance(HyperbolicDistanceParams {
            atom_1: self.atom_index_1,
            atom_2: self.atom_index_2,
            r1: self.r1,
            r2: self.r2,
            r3: self.r3,
            r4: self.r4,
            force_constant: self.k * scale,
            asymptote: self.asymptote * scale,
        })
    }
}

impl ForceParameters for TorsionRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        RestraintParams::Torsion(TorsionParams {
            atoms: [
                self.atom_index_1,
                self.atom_index_2,
                self.atom_index_3,
                self.atom_index_4,
            ],
            phi: self.phi,
            delta_phi: self.delta_phi,
            force_constant: self.k * scale,
        })
    }
}

impl ForceParameters for DistProfileRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        RestraintParams::DistProfile(DistProfileParams {
            atom_1: self.atom_index_1,
            atom_2: self.atom_index_2,
            r_min: self.r_min,
            r_max: self.r_max,
            n_bins: self.n_bins(),
            coefficients: self.coefficients.columns().clone(),
            scale_factor: self.scale_factor * scale,
        })
    }
}

impl ForceParameters for TorsProfileRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        RestraintParams::TorsProfile(TorsProfileParams {
            atoms: self.atoms,
            n_bins: self.n_bins(),
            coefficients: self.coefficients.columns().clone(),
            scale_factor: self.scale_factor * scale,
        })
    }
}

impl ForceParameters for GmmDistanceRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        let scale = schedule_scale(&self.scaler, &self.ramp, alpha, timestep);
        let precision = decompose_precisions(self.precisions());
        RestraintParams::Gmm(GmmParams {
            n_distances: self.n_distances(),
            n_components: self.n_components(),
            scale,
            atoms: self.atoms().to_vec(),
            weights: self.weights().to_vec(),
            means: self.flat_means(),
            precision_diagonals: precision.diagonals,
            precision_off_diagonals: precision.off_diagonals,
        })
    }
}

impl ForceParameters for SelectableRestraint {
    fn force_parameters(&self, alpha: f64, timestep: u64) -> RestraintParams {
        match self {
            Self::Distance(r) => r.force_parameters(alpha, timestep),
            Self::HyperbolicDistance(r) => r.force_parameters(alpha, timestep),
            Self::Torsion(r) => r.force_parameters(alpha, timestep),
            Self::DistProfile(r) => r.force_parameters(alpha, timestep),
            Self::TorsProfile(r) => r.force_parameters(alpha, timestep),
            Self::GmmDistance(r) => r.force_parameters(alpha, timestep),
        }
    }
}

/// Creates `restraint` in the engine, tracks it, and returns its global restraint index.
pub fn register<F: RestraintForce>(
    tracker: &mut RestraintTracker,
    force: &mut F,
    restraint: SelectableRestraint,
    alpha: f64,
    timestep: u64,
) -> Result<usize, ForceError> {
    let params = restraint.force_parameters(alpha, timestep);
    let kind = params.kind();
    let global_index = force.add_restraint(params)?;
    let position = tracker.push_restraint(restraint);
    trace!(%kind, position, global_index, "Registered restraint");
    Ok(global_index)
}

fn refresh_sequence<T, F>(
    sequence: &TrackedSequence<T>,
    force: &mut F,
    alpha: f64,
    timestep: u64,
) -> Result<usize, ForceError>
where
    T: ForceParameters,
    F: RestraintForce,
{
    let mut refreshed = 0;
    for (index, restraint) in sequence.tracked() {
        force.modify_restraint(index, restraint.force_parameters(alpha, timestep))?;
        refreshed += 1;
    }
    Ok(refreshed)
}

/// Pushes fresh parameters for every tracked restraint and returns how many were sent.
pub fn refresh_restraints<F: RestraintForce>(
    tracker: &RestraintTracker,
    force: &mut F,
    alpha: f64,
    timestep: u64,
) -> Result<usize, ForceError> {
    Ok(refresh_sequence(&tracker.distance, force, alpha, timestep)?
        + refresh_sequence(&tracker.hyperbolic_distance, force, alpha, timestep)?
        + refresh_sequence(&tracker.torsion, force, alpha, timestep)?
        + refresh_sequence(&tracker.dist_profile, force, alpha, timestep)?
        + refresh_sequence(&tracker.tors_profile, force, alpha, timestep)?
        + refresh_sequence(&tracker.gmm_distance, force, alpha, timestep)?)
}
