use super::active::resolve_num_active;
use super::error::TransformError;
use super::force::{Backend, ForceSystem, RestraintForce};
use super::serializer::{refresh_restraints, register};
use super::tracker::{RestraintTracker, TrackedCollection, TrackedGroup};
use crate::core::restraints::groups::SelectivelyActiveCollection;
use crate::core::restraints::kinds::{Restraint, RestraintKind, SelectableRestraint};
use crate::core::sampling::parameters::{ParameterSampler, ProvidesParameters};
use std::marker::PhantomData;
use tracing::{debug, info, instrument, trace};

/// Alpha and timestep used when restraints are first created.
const REGISTRATION_ALPHA: f64 = 0.0;
const REGISTRATION_TIMESTEP: u64 = 0;

/// A component that adds forces to a system and keeps them current during a run.
///
/// The simulation driver calls [`Transformer::add_interactions`] once while building the
/// system, [`Transformer::finalize`] once the system is complete, and
/// [`Transformer::update`] once per step.
pub trait Transformer<B: Backend> {
    fn add_interactions(
        &mut self,
        state: &dyn ProvidesParameters,
        system: B::System,
        topology: &B::Topology,
    ) -> Result<B::System, TransformError>;

    fn finalize(
        &mut self,
        _state: &dyn ProvidesParameters,
        _system: &B::System,
        _topology: &B::Topology,
    ) -> Result<(), TransformError> {
        Ok(())
    }

    fn update(
        &mut self,
        state: &dyn ProvidesParameters,
        context: &mut B::Context,
        alpha: f64,
        timestep: u64,
    ) -> Result<(), TransformError>;
}

enum Phase<F> {
    /// Nothing was claimed; every operation is a no-op.
    Inactive,
    Configured {
        always_active: Vec<SelectableRestraint>,
        collections: Vec<SelectivelyActiveCollection>,
    },
    Registered {
        force: F,
        tracker: RestraintTracker,
    },
}

/// Registers MELD restraints, groups and collections with the force engine and pushes
/// schedule-dependent parameters every step.
pub struct MeldRestraintTransformer<B: Backend, P> {
    sampler: P,
    phase: Phase<B::Force>,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend, P: ParameterSampler> MeldRestraintTransformer<B, P> {
    /// Claims the selectable restraints and every collection.
    ///
    /// Restraints this transformer cannot handle are returned so the next transformer in
    /// the pipeline can claim them.
    pub fn new(
        sampler: P,
        restraints: Vec<Restraint>,
        collections: Vec<SelectivelyActiveCollection>,
    ) -> Result<(Self, Vec<Restraint>), TransformError> {
        let mut always_active = Vec::new();
        let mut unclaimed = Vec::new();
        for restraint in restraints {
            match SelectableRestraint::try_from(restraint) {
                Ok(selectable) => {
                    selectable.validate()?;
                    always_active.push(selectable);
                }
                Err(other) => unclaimed.push(other),
            }
        }

        let phase = if always_active.is_empty() && collections.is_empty() {
            debug!("No MELD restraints to manage; transformer is inactive.");
            Phase::Inactive
        } else {
            debug!(
                always_active = always_active.len(),
                collections = collections.len(),
                unclaimed = unclaimed.len(),
                "Claimed MELD restraints."
            );
            Phase::Configured {
                always_active,
                collections,
            }
        };

        Ok((
            Self {
                sampler,
                phase,
                _backend: PhantomData,
            },
            unclaimed,
        ))
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Inactive)
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.phase, Phase::Registered { .. })
    }

    /// The force object, once registered.
    pub fn force(&self) -> Option<&B::Force> {
        match &self.phase {
            Phase::Registered { force, .. } => Some(force),
            _ => None,
        }
    }

    pub fn tracker(&self) -> Option<&RestraintTracker> {
        match &self.phase {
            Phase::Registered { tracker, .. } => Some(tracker),
            _ => None,
        }
    }
}

fn register_always_active<F: RestraintForce>(
    force: &mut F,
    tracker: &mut RestraintTracker,
    restraints: &[SelectableRestraint],
) -> Result<(), TransformError> {
    if restraints.is_empty() {
        return Ok(());
    }
    let mut groups = Vec::with_capacity(restraints.len());
    for restraint in restraints {
        let index = register(
            tracker,
            force,
            restraint.clone(),
            REGISTRATION_ALPHA,
            REGISTRATION_TIMESTEP,
        )?;
        groups.push(force.add_group(&[index], 1)?);
        tracker.groups.push_fixed();
    }
    force.add_collection(&groups, groups.len())?;
    tracker.collections.push_fixed();
    Ok(())
}

fn register_collection<F: RestraintForce>(
    force: &mut F,
    tracker: &mut RestraintTracker,
    collection: &SelectivelyActiveCollection,
    sampler: &dyn ParameterSampler,
    state: &dyn ProvidesParameters,
) -> Result<(), TransformError> {
    let mut groups = Vec::with_capacity(collection.groups().len());
    for group in collection.groups() {
        let members = group
            .restraints()
            .iter()
            .map(|r| {
                register(
                    tracker,
                    force,
                    r.clone(),
                    REGISTRATION_ALPHA,
                    REGISTRATION_TIMESTEP,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Each group resolves its own selector, independent of the enclosing collection.
        let num_active = resolve_num_active(group.num_active(), sampler, state)?;
        groups.push(force.add_group(&members, num_active)?);
        tracker.groups.push_tracked(TrackedGroup {
            num_active: group.num_active().clone(),
            members,
        });
    }
    let num_active = resolve_num_active(collection.num_active(), sampler, state)?;
    force.add_collection(&groups, num_active)?;
    tracker.collections.push_tracked(TrackedCollection {
        num_active: collection.num_active().clone(),
        groups,
    });
    Ok(())
}

fn push_num_active<F: RestraintForce>(
    force: &mut F,
    tracker: &RestraintTracker,
    sampler: &dyn ParameterSampler,
    state: &dyn ProvidesParameters,
) -> Result<(), TransformError> {
    for (index, collection) in tracker.collections().tracked() {
        let num_active = resolve_num_active(&collection.num_active, sampler, state)?;
        force.modify_collection_num_active(index, num_active)?;
    }
    for (index, group) in tracker.groups().tracked() {
        let num_active = resolve_num_active(&group.num_active, sampler, state)?;
        force.modify_group_num_active(index, num_active)?;
    }
    Ok(())
}

impl<B: Backend, P: ParameterSampler> Transformer<B> for MeldRestraintTransformer<B, P> {
    #[instrument(skip_all, name = "meld_add_interactions")]
    fn add_interactions(
        &mut self,
        state: &dyn ProvidesParameters,
        mut system: B::System,
        _topology: &B::Topology,
    ) -> Result<B::System, TransformError> {
        let (always_active, collections) = match &self.phase {
            Phase::Inactive => return Ok(system),
            Phase::Registered { .. } => return Err(TransformError::AlreadyRegistered),
            Phase::Configured {
                always_active,
                collections,
            } => (always_active, collections),
        };

        let mut force = B::Force::default();
        let mut tracker = RestraintTracker::new();
        register_always_active(&mut force, &mut tracker, always_active)?;
        for collection in collections {
            register_collection(&mut force, &mut tracker, collection, &self.sampler, state)?;
        }
        let force_index = system.add_force(&force)?;

        let summary = tracker.summary();
        info!(
            force_index,
            distance = summary.restraints_of(RestraintKind::Distance),
            hyperbolic_distance = summary.restraints_of(RestraintKind::HyperbolicDistance),
            torsion = summary.restraints_of(RestraintKind::Torsion),
            dist_profile = summary.restraints_of(RestraintKind::DistProfile),
            tors_profile = summary.restraints_of(RestraintKind::TorsProfile),
            gmm_distance = summary.restraints_of(RestraintKind::GmmDistance),
            groups = summary.tracked_groups + summary.fixed_groups,
            collections = summary.tracked_collections + summary.fixed_collections,
            "Registered MELD restraints."
        );

        self.phase = Phase::Registered { force, tracker };
        Ok(system)
    }

    fn update(
        &mut self,
        state: &dyn ProvidesParameters,
        context: &mut B::Context,
        alpha: f64,
        timestep: u64,
    ) -> Result<(), TransformError> {
        let (force, tracker) = match &mut self.phase {
            Phase::Inactive => return Ok(()),
            Phase::Configured { .. } => return Err(TransformError::NotRegistered("update")),
            Phase::Registered { force, tracker } => (force, &*tracker),
        };

        let refreshed = refresh_restraints(tracker, force, alpha, timestep)?;
        push_num_active(force, tracker, &self.sampler, state)?;
        force.update_parameters_in_context(context)?;

        trace!(alpha, timestep, refreshed, "Updated MELD restraints.");
        Ok(())
    }
}

impl<B: Backend, P> std::fmt::Debug for MeldRestraintTransformer<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match &self.phase {
            Phase::Inactive => "inactive",
            Phase::Configured { .. } => "configured",
            Phase::Registered { .. } => "registered",
        };
        f.debug_struct("MeldRestraintTransformer")
            .field("phase", &phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::restraints::groups::{NumActive, RestraintGroup};
    use crate::core::restraints::kinds::{
        CartesianRestraint, DistanceRestraint, TorsionRestraint,
    };
    use crate::core::restraints::schedule::{Positioner, Ramp, Scaler};
    use crate::core::sampling::parameters::{ParameterManager, ParameterState};
    use crate::engine::force::{ForceError, RestraintParams};
    use crate::engine::memory::{ForceCall, InMemoryContext, InMemoryForce, InMemorySystem};

    #[derive(Debug)]
    struct RecordingForce(InMemoryForce);

    impl Default for RecordingForce {
        fn default() -> Self {
            Self(InMemoryForce::recording())
        }
    }

    impl RestraintForce for RecordingForce {
        type Context = InMemoryContext;

        fn add_restraint(&mut self, params: RestraintParams) -> Result<usize, ForceError> {
            self.0.add_restraint(params)
        }
        fn modify_restraint(
            &mut self,
            index: usize,
            params: RestraintParams,
        ) -> Result<(), ForceError> {
            self.0.modify_restraint(index, params)
        }
        fn add_group(&mut self, members: &[usize], num_active: usize) -> Result<usize, ForceError> {
            self.0.add_group(members, num_active)
        }
        fn modify_group_num_active(&mut self, index: usize, n: usize) -> Result<(), ForceError> {
            self.0.modify_group_num_active(index, n)
        }
        fn add_collection(&mut self, groups: &[usize], n: usize) -> Result<usize, ForceError> {
            self.0.add_collection(groups, n)
        }
        fn modify_collection_num_active(&mut self, index: usize, n: usize) -> Result<(), ForceError> {
            self.0.modify_collection_num_active(index, n)
        }
        fn update_parameters_in_context(
            &mut self,
            context: &mut InMemoryContext,
        ) -> Result<(), ForceError> {
            self.0.update_parameters_in_context(context)
        }
    }

    impl ForceSystem<RecordingForce> for InMemorySystem {
        fn add_force(&mut self, force: &RecordingForce) -> Result<usize, ForceError> {
            <Self as ForceSystem<InMemoryForce>>::add_force(self, &force.0)
        }
    }

    struct RecordingBackend;

    impl Backend for RecordingBackend {
        type Context = InMemoryContext;
        type Force = RecordingForce;
        type System = InMemorySystem;
        type Topology = ();
    }

    type TestTransformer = MeldRestraintTransformer<RecordingBackend, ParameterManager>;

    fn distance(k: f64) -> DistanceRestraint {
        DistanceRestraint::new(0, 1, [0.0, 0.1, 0.4, 0.5].map(Positioner::Constant), k).unwrap()
    }

    fn torsion(k: f64) -> TorsionRestraint {
        TorsionRestraint::new([0, 1, 2, 3], 60.0, 20.0, k).unwrap()
    }

    fn torsion_collection(groups: usize, num_active: NumActive) -> SelectivelyActiveCollection {
        let groups = (0..groups)
            .map(|_| RestraintGroup::new(vec![torsion(5.0).into()], NumActive::Literal(1)).unwrap())
            .collect();
        SelectivelyActiveCollection::new(groups, num_active).unwrap()
    }

    fn journal(transformer: &TestTransformer) -> Vec<ForceCall> {
        transformer
            .force()
            .and_then(|f| f.0.journal())
            .map(<[ForceCall]>::to_vec)
            .unwrap_or_default()
    }

    fn clear_journal(transformer: &mut TestTransformer) {
        if let Phase::Registered { force, .. } = &mut transformer.phase {
            force.0.clear_journal();
        }
    }

    fn registered(
        restraints: Vec<Restraint>,
        collections: Vec<SelectivelyActiveCollection>,
        manager: ParameterManager,
        state: &ParameterState,
    ) -> TestTransformer {
        let (mut transformer, _) = TestTransformer::new(manager, restraints, collections).unwrap();
        transformer
            .add_interactions(state, InMemorySystem::new(), &())
            .unwrap();
        transformer
    }

    #[test]
    fn end_to_end_registration_and_single_update() {
        let state = ParameterState::default();
        let mut transformer = registered(
            vec![distance(10.0).into()],
            vec![torsion_collection(2, NumActive::Literal(1))],
            ParameterManager::new(),
            &state,
        );

        let summary = transformer.tracker().unwrap().summary();
        assert_eq!(summary.restraints_of(RestraintKind::Distance), 1);
        assert_eq!(summary.restraints_of(RestraintKind::Torsion), 2);
        assert_eq!((summary.tracked_groups, summary.fixed_groups), (2, 1));
        assert_eq!((summary.tracked_collections, summary.fixed_collections), (1, 1));

        clear_journal(&mut transformer);
        let mut context = InMemoryContext::default();
        transformer.update(&state, &mut context, 0.5, 10).unwrap();

        let calls = journal(&transformer);
        let torsion_updates = calls
            .iter()
            .filter(|c| matches!(c, ForceCall::ModifyRestraint(RestraintKind::Torsion, _)))
            .count();
        assert_eq!(torsion_updates, 2);
        assert!(!calls.contains(&ForceCall::ModifyGroup { index: 0, num_active: 1 }));
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, ForceCall::ModifyCollection { index: 0, .. }))
        );
        assert_eq!(
            calls,
            vec![
                ForceCall::ModifyRestraint(RestraintKind::Distance, 0),
                ForceCall::ModifyRestraint(RestraintKind::Torsion, 0),
                ForceCall::ModifyRestraint(RestraintKind::Torsion, 1),
                ForceCall::ModifyCollection { index: 1, num_active: 1 },
                ForceCall::ModifyGroup { index: 1, num_active: 1 },
                ForceCall::ModifyGroup { index: 2, num_active: 1 },
                ForceCall::UpdateContext,
            ]
        );
        assert_eq!(context.syncs, 1);
    }

    #[test]
    fn registration_issues_creates_in_tracker_order() {
        let state = ParameterState::default();
        let transformer = registered(
            vec![distance(10.0).into()],
            vec![torsion_collection(2, NumActive::Literal(1))],
            ParameterManager::new(),
            &state,
        );

        assert_eq!(
            journal(&transformer),
            vec![
                ForceCall::AddRestraint(RestraintKind::Distance),
                ForceCall::AddGroup,
                ForceCall::AddCollection,
                ForceCall::AddRestraint(RestraintKind::Torsion),
                ForceCall::AddGroup,
                ForceCall::AddRestraint(RestraintKind::Torsion),
                ForceCall::AddGroup,
                ForceCall::AddCollection,
            ]
        );
        let force = &transformer.force().unwrap().0;
        assert_eq!(force.group(1).map(|g| g.members.clone()), Some(vec![1]));
        assert_eq!(force.group(2).map(|g| g.members.clone()), Some(vec![2]));
        assert_eq!(force.collection(1).map(|c| c.members.clone()), Some(vec![1, 2]));
    }

    #[test]
    fn fixed_groups_and_collections_are_never_updated() {
        let state = ParameterState::default();
        let mut transformer = registered(
            vec![distance(10.0).into(), torsion(3.0).into()],
            vec![],
            ParameterManager::new(),
            &state,
        );
        let before = transformer.force().unwrap().0.groups().to_vec();

        let mut context = InMemoryContext::default();
        for step in 0..25 {
            transformer
                .update(&state, &mut context, step as f64 / 24.0, step)
                .unwrap();
        }

        let force = &transformer.force().unwrap().0;
        assert_eq!(force.groups(), &before[..]);
        assert_eq!(force.collection(0).map(|c| c.num_active), Some(2));
        assert_eq!(force.counts().group_updates, 0);
        assert_eq!(force.counts().collection_updates, 0);
        assert_eq!(force.counts().total_restraint_updates(), 50);
        assert_eq!(context.syncs, 25);
    }

    #[test]
    fn empty_inputs_make_an_inactive_transformer() {
        let (mut transformer, unclaimed) =
            TestTransformer::new(ParameterManager::new(), vec![], vec![]).unwrap();
        assert!(!transformer.is_active());
        assert!(unclaimed.is_empty());

        let state = ParameterState::default();
        let system = transformer
            .add_interactions(&state, InMemorySystem::new(), &())
            .unwrap();
        assert_eq!(system.force_count(), 0);

        let mut context = InMemoryContext::default();
        transformer.update(&state, &mut context, 0.5, 10).unwrap();
        assert_eq!(context, InMemoryContext::default());
        assert!(transformer.force().is_none());
    }

    #[test]
    fn non_selectable_restraints_are_returned_unclaimed() {
        let cartesian = Restraint::from(CartesianRestraint {
            atom_index: 4,
            position: [1.0, 2.0, 3.0],
            delta: 0.2,
            force_const: 50.0,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        });
        let (transformer, unclaimed) = TestTransformer::new(
            ParameterManager::new(),
            vec![cartesian.clone(), distance(1.0).into()],
            vec![],
        )
        .unwrap();

        assert!(transformer.is_active());
        assert_eq!(unclaimed, vec![cartesian]);
    }

    #[test]
    fn only_non_selectable_input_is_inactive() {
        let confinement = Restraint::from(
            crate::core::restraints::kinds::ConfinementRestraint {
                atom_index: 0,
                radius: 5.0,
                force_const: 10.0,
                scaler: Scaler::Constant,
                ramp: Ramp::Constant,
            },
        );
        let (transformer, unclaimed) =
            TestTransformer::new(ParameterManager::new(), vec![confinement], vec![]).unwrap();
        assert!(!transformer.is_active());
        assert_eq!(unclaimed.len(), 1);
    }

    #[test]
    fn refreshed_parameters_address_the_same_restraints() {
        let ks = [1.0, 2.0, 3.0, 4.0, 5.0];
        let restraints = ks.iter().map(|&k| distance(k).into()).collect();
        let state = ParameterState::default();
        let mut transformer = registered(restraints, vec![], ParameterManager::new(), &state);

        let mut context = InMemoryContext::default();
        transformer.update(&state, &mut context, 0.7, 3).unwrap();

        let force = &transformer.force().unwrap().0;
        for (position, k) in ks.iter().enumerate() {
            match force.restraint_params_of(RestraintKind::Distance, position) {
                Some(RestraintParams::Distance(p)) => assert_eq!(p.force_constant, *k),
                other => panic!("unexpected params {other:?}"),
            }
        }
    }

    #[test]
    fn update_pushes_scaled_force_constants() {
        let restraint = distance(10.0).with_scaler(Scaler::linear(0.0, 1.0).unwrap());
        let state = ParameterState::default();
        let mut transformer =
            registered(vec![restraint.into()], vec![], ParameterManager::new(), &state);

        let mut context = InMemoryContext::default();
        transformer.update(&state, &mut context, 0.25, 0).unwrap();

        match &context.restraints[0] {
            RestraintParams::Distance(p) => assert_eq!(p.force_constant, 7.5),
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn sampled_num_active_follows_the_parameter_state() {
        let mut manager = ParameterManager::new();
        let n = manager.add_discrete_parameter("n_active", 2, 0, 2).unwrap();
        let group = RestraintGroup::new(
            vec![torsion(1.0).into(), torsion(2.0).into()],
            NumActive::Sampled(n),
        )
        .unwrap();
        let collection = SelectivelyActiveCollection::new(vec![group], NumActive::Literal(1)).unwrap();

        let initial = manager.initial_state();
        let mut transformer = registered(vec![], vec![collection], manager, &initial);
        assert_eq!(
            transformer.force().unwrap().0.group(0).map(|g| g.num_active),
            Some(2)
        );

        let mut context = InMemoryContext::default();
        let later = ParameterState::new(vec![1], vec![]);
        transformer.update(&later, &mut context, 0.0, 1).unwrap();
        assert_eq!(context.group_num_active, vec![1]);
    }

    #[test]
    fn collection_uses_its_own_num_active() {
        let state = ParameterState::default();
        let transformer = registered(
            vec![],
            vec![torsion_collection(3, NumActive::Literal(2))],
            ParameterManager::new(),
            &state,
        );
        let force = &transformer.force().unwrap().0;
        assert_eq!(force.collection(0).map(|c| c.num_active), Some(2));
        assert!(force.groups().iter().all(|g| g.num_active == 1));
    }

    #[test]
    fn update_before_registration_is_an_error() {
        let (mut transformer, _) =
            TestTransformer::new(ParameterManager::new(), vec![distance(1.0).into()], vec![])
                .unwrap();
        assert!(transformer.is_active());
        assert!(!transformer.is_registered());
        let mut context = InMemoryContext::default();
        let result = transformer.update(&ParameterState::default(), &mut context, 0.0, 0);
        assert!(matches!(result, Err(TransformError::NotRegistered("update"))));
    }

    #[test]
    fn second_registration_is_rejected() {
        let state = ParameterState::default();
        let mut transformer = registered(
            vec![distance(1.0).into()],
            vec![],
            ParameterManager::new(),
            &state,
        );
        assert!(transformer.is_registered());
        let result = transformer.add_interactions(&state, InMemorySystem::new(), &());
        assert!(matches!(result, Err(TransformError::AlreadyRegistered)));
        assert!(transformer.is_registered());
    }

    #[test]
    fn invalid_always_active_restraint_is_rejected_at_construction() {
        let mut bad = distance(1.0);
        bad.k = -1.0;
        let result = TestTransformer::new(ParameterManager::new(), vec![bad.into()], vec![]);
        assert!(matches!(result, Err(TransformError::Restraint { .. })));
    }
}
