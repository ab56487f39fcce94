use crate::core::io::restraint_file::RestraintSet;
use crate::core::sampling::parameters::ParameterManager;
use crate::engine::config::DryRunConfig;
use crate::engine::error::TransformError;
use crate::engine::memory::{CallCounts, InMemoryBackend, InMemoryContext, InMemorySystem};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SystemState;
use crate::engine::tracker::TrackerSummary;
use crate::engine::transformer::{MeldRestraintTransformer, Transformer};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq)]
pub struct DryRunReport {
    /// What the transformer registered. All zero if it had nothing to manage.
    pub summary: TrackerSummary,
    /// Restraints left for other transformers.
    pub unclaimed: usize,
    pub steps: u64,
    pub counts: CallCounts,
    /// Group `num_active` values after the last step, in engine order.
    pub group_num_active: Vec<usize>,
    /// Collection `num_active` values after the last step, in engine order.
    pub collection_num_active: Vec<usize>,
}

#[instrument(skip_all, name = "dry_run_workflow")]
pub fn run(
    set: RestraintSet,
    config: &DryRunConfig,
    reporter: &ProgressReporter,
) -> Result<DryRunReport, TransformError> {
    // === Phase 1: Registration ===
    reporter.report(Progress::PhaseStart {
        name: "Registration",
    });
    let mut state = SystemState::new(config.alpha_start, set.parameters.initial_state());
    let (mut transformer, unclaimed) =
        MeldRestraintTransformer::<InMemoryBackend, ParameterManager>::new(
            set.parameters,
            set.always_active,
            set.collections,
        )?;
    let system = transformer.add_interactions(&state, InMemorySystem::new(), &())?;
    transformer.finalize(&state, &system, &())?;
    if !unclaimed.is_empty() {
        reporter.report(Progress::Message(format!(
            "{} restraint(s) are not handled by the MELD transformer and were skipped.",
            unclaimed.len()
        )));
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Replay the schedule ===
    reporter.report(Progress::PhaseStart { name: "Updates" });
    reporter.report(Progress::StepsStart {
        total_steps: config.steps,
    });
    let mut context = InMemoryContext::default();
    for (alpha, timestep) in config.schedule() {
        state.alpha = alpha;
        transformer.update(&state, &mut context, alpha, timestep)?;
        reporter.report(Progress::StepComplete { alpha, timestep });
    }
    reporter.report(Progress::StepsFinish);
    reporter.report(Progress::PhaseFinish);

    let report = DryRunReport {
        summary: transformer
            .tracker()
            .map(|t| t.summary())
            .unwrap_or_default(),
        unclaimed: unclaimed.len(),
        steps: config.steps,
        counts: transformer
            .force()
            .map(|f| *f.counts())
            .unwrap_or_default(),
        group_num_active: context.group_num_active,
        collection_num_active: context.collection_num_active,
    };
    info!(
        restraints = report.summary.total_restraints(),
        steps = report.steps,
        restraint_updates = report.counts.total_restraint_updates(),
        "Dry run complete."
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::restraints::groups::{NumActive, RestraintGroup, SelectivelyActiveCollection};
    use crate::core::restraints::kinds::{
        ConfinementRestraint, DistanceRestraint, Restraint, RestraintKind, TorsionRestraint,
    };
    use crate::core::restraints::schedule::{Positioner, Ramp, Scaler};
    use crate::engine::config::DryRunConfigBuilder;
    use std::sync::Mutex;

    fn restraint_set() -> RestraintSet {
        let mut parameters = ParameterManager::new();
        let n = parameters.add_discrete_parameter("n", 1, 0, 2).unwrap();
        let torsion = || -> Restraint {
            TorsionRestraint::new([0, 1, 2, 3], 0.0, 20.0, 5.0).unwrap().into()
        };
        let group = RestraintGroup::new(vec![torsion(), torsion()], NumActive::Sampled(n)).unwrap();
        let collection =
            SelectivelyActiveCollection::new(vec![group], NumActive::Literal(1)).unwrap();
        let distance =
            DistanceRestraint::new(0, 1, [0.0, 0.1, 0.3, 0.4].map(Positioner::Constant), 10.0)
                .unwrap();
        let confinement = ConfinementRestraint {
            atom_index: 0,
            radius: 4.0,
            force_const: 1.0,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        };
        RestraintSet {
            parameters,
            always_active: vec![distance.into(), confinement.into()],
            collections: vec![collection],
        }
    }

    fn config(steps: u64) -> DryRunConfig {
        DryRunConfigBuilder::new()
            .steps(steps)
            .alpha_start(0.0)
            .alpha_end(1.0)
            .timestep_stride(5)
            .build()
            .unwrap()
    }

    #[test]
    fn run_reports_registration_and_update_counts() {
        let report = run(restraint_set(), &config(4), &ProgressReporter::new()).unwrap();

        assert_eq!(report.summary.restraints_of(RestraintKind::Distance), 1);
        assert_eq!(report.summary.restraints_of(RestraintKind::Torsion), 2);
        assert_eq!(report.unclaimed, 1);
        assert_eq!(report.counts.total_restraint_updates(), 12);
        assert_eq!(report.counts.group_updates, 4);
        assert_eq!(report.counts.collection_updates, 4);
        assert_eq!(report.counts.context_updates, 4);
        assert_eq!(report.group_num_active, vec![1, 1]);
        assert_eq!(report.collection_num_active, vec![1, 1]);
    }

    #[test]
    fn run_reports_progress_for_every_step() {
        let steps = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StepComplete { timestep, .. } = event {
                steps.lock().unwrap().push(timestep);
            }
        }));
        run(restraint_set(), &config(3), &reporter).unwrap();
        drop(reporter);
        assert_eq!(steps.into_inner().unwrap(), vec![0, 5, 10]);
    }

    #[test]
    fn run_with_empty_set_makes_no_engine_calls() {
        let report = run(RestraintSet::default(), &config(2), &ProgressReporter::new()).unwrap();
        assert_eq!(report.summary, TrackerSummary::default());
        assert_eq!(report.counts, CallCounts::default());
        assert!(report.group_num_active.is_empty());
    }
}
