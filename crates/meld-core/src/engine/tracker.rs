use crate::core::restraints::gmm::GmmDistanceRestraint;
use crate::core::restraints::groups::NumActive;
use crate::core::restraints::kinds::{
    DistProfileRestraint, DistanceRestraint, HyperbolicDistanceRestraint, RestraintKind,
    SelectableRestraint, TorsProfileRestraint, TorsionRestraint,
};

/// One entry of a tracked sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Refreshed on every update.
    Tracked(T),
    /// Registered once and never touched again.
    Fixed,
}

impl<T> Slot<T> {
    pub fn as_tracked(&self) -> Option<&T> {
        match self {
            Self::Tracked(item) => Some(item),
            Self::Fixed => None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed)
    }
}

/// An append-only sequence whose positions mirror the engine's creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSequence<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for TrackedSequence<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> TrackedSequence<T> {
    /// Appends an entry that will be refreshed and returns its position.
    pub fn push_tracked(&mut self, item: T) -> usize {
        self.slots.push(Slot::Tracked(item));
        self.slots.len() - 1
    }

    /// Appends an entry that will never be refreshed and returns its position.
    pub fn push_fixed(&mut self) -> usize {
        self.slots.push(Slot::Fixed);
        self.slots.len() - 1
    }

    /// Every slot with its position, fixed ones included.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Slot<T>)> {
        self.slots.iter().enumerate()
    }

    /// Only the slots that take part in updates.
    pub fn tracked(&self) -> impl Iterator<Item = (usize, &T)> {
        self.iter()
            .filter_map(|(index, slot)| slot.as_tracked().map(|item| (index, item)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn fixed_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_fixed()).count()
    }
}

/// A group registered with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedGroup {
    pub num_active: NumActive,
    /// Global restraint indices of the members.
    pub members: Vec<usize>,
}

/// A collection registered with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedCollection {
    pub num_active: NumActive,
    /// Engine group indices of the members.
    pub groups: Vec<usize>,
}

/// Everything the transformer has registered, in engine order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestraintTracker {
    pub(crate) distance: TrackedSequence<DistanceRestraint>,
    pub(crate) hyperbolic_distance: TrackedSequence<HyperbolicDistanceRestraint>,
    pub(crate) torsion: TrackedSequence<TorsionRestraint>,
    pub(crate) dist_profile: TrackedSequence<DistProfileRestraint>,
    pub(crate) tors_profile: TrackedSequence<TorsProfileRestraint>,
    pub(crate) gmm_distance: TrackedSequence<GmmDistanceRestraint>,
    pub(crate) groups: TrackedSequence<TrackedGroup>,
    pub(crate) collections: TrackedSequence<TrackedCollection>,
}

impl RestraintTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a restraint to its kind's sequence and returns its position there.
    pub fn push_restraint(&mut self, restraint: SelectableRestraint) -> usize {
        match restraint {
            SelectableRestraint::Distance(r) => self.distance.push_tracked(r),
            SelectableRestraint::HyperbolicDistance(r) => self.hyperbolic_distance.push_tracked(r),
            SelectableRestraint::Torsion(r) => self.torsion.push_tracked(r),
            SelectableRestraint::DistProfile(r) => self.dist_profile.push_tracked(r),
            SelectableRestraint::TorsProfile(r) => self.tors_profile.push_tracked(r),
            SelectableRestraint::GmmDistance(r) => self.gmm_distance.push_tracked(r),
        }
    }

    pub fn distance(&self) -> &TrackedSequence<DistanceRestraint> {
        &self.distance
    }

    pub fn hyperbolic_distance(&self) -> &TrackedSequence<HyperbolicDistanceRestraint> {
        &self.hyperbolic_distance
    }

    pub fn torsion(&self) -> &TrackedSequence<TorsionRestraint> {
        &self.torsion
    }

    pub fn dist_profile(&self) -> &TrackedSequence<DistProfileRestraint> {
        &self.dist_profile
    }

    pub fn tors_profile(&self) -> &TrackedSequence<TorsProfileRestraint> {
        &self.tors_profile
    }

    pub fn gmm_distance(&self) -> &TrackedSequence<GmmDistanceRestraint> {
        &self.gmm_distance
    }

    pub fn groups(&self) -> &TrackedSequence<TrackedGroup> {
        &self.groups
    }

    pub fn collections(&self) -> &TrackedSequence<TrackedCollection> {
        &self.collections
    }

    pub fn restraint_count(&self, kind: RestraintKind) -> usize {
        match kind {
            RestraintKind::Distance => self.distance.len(),
            RestraintKind::HyperbolicDistance => self.hyperbolic_distance.len(),
            RestraintKind::Torsion => self.torsion.len(),
            RestraintKind::DistProfile => self.dist_profile.len(),
            RestraintKind::TorsProfile => self.tors_profile.len(),
            RestraintKind::GmmDistance => self.gmm_distance.len(),
        }
    }

    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            restraints: RestraintKind::ALL.map(|kind| self.restraint_count(kind)),
            tracked_groups: self.groups.len() - self.groups.fixed_count(),
            fixed_groups: self.groups.fixed_count(),
            tracked_collections: self.collections.len() - self.collections.fixed_count(),
            fixed_collections: self.collections.fixed_count(),
        }
    }
}

/// Entity counts of a [`RestraintTracker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSummary {
    /// Restraint counts indexed by [`RestraintKind::ordinal`].
    pub restraints: [usize; 6],
    pub tracked_groups: usize,
    pub fixed_groups: usize,
    pub tracked_collections: usize,
    pub fixed_collections: usize,
}

impl TrackerSummary {
    pub fn restraints_of(&self, kind: RestraintKind) -> usize {
        self.restraints[kind.ordinal()]
    }

    pub fn total_restraints(&self) -> usize {
        self.restraints.iter().sum()
    }
}
