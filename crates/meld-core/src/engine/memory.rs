//! A reference force engine that keeps everything in memory.
//!
//! It enforces the same addressing rules as a real engine (global indices on creation,
//! per-kind positions on modification, fixed parameter layout per restraint) and counts
//! every call, which makes it suitable for dry runs and tests.

use super::force::{Backend, ForceError, ForceSystem, RestraintForce, RestraintParams};
use crate::core::restraints::kinds::RestraintKind;

/// A group or collection as the engine stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineGroup {
    pub members: Vec<usize>,
    pub num_active: usize,
}

/// One call made against an [`InMemoryForce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceCall {
    AddRestraint(RestraintKind),
    ModifyRestraint(RestraintKind, usize),
    AddGroup,
    ModifyGroup { index: usize, num_active: usize },
    AddCollection,
    ModifyCollection { index: usize, num_active: usize },
    UpdateContext,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Indexed by [`RestraintKind::ordinal`].
    pub restraint_creates: [usize; 6],
    /// Indexed by [`RestraintKind::ordinal`].
    pub restraint_updates: [usize; 6],
    pub group_creates: usize,
    pub group_updates: usize,
    pub collection_creates: usize,
    pub collection_updates: usize,
    pub context_updates: usize,
}

impl CallCounts {
    pub fn total_restraint_updates(&self) -> usize {
        self.restraint_updates.iter().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryForce {
    restraints: Vec<RestraintParams>,
    by_kind: [Vec<usize>; 6],
    groups: Vec<EngineGroup>,
    collections: Vec<EngineGroup>,
    counts: CallCounts,
    journal: Option<Vec<ForceCall>>,
}

impl InMemoryForce {
    /// A force that also keeps an ordered journal of every call.
    pub fn recording() -> Self {
        Self {
            journal: Some(Vec::new()),
            ..Self::default()
        }
    }

    fn record(&mut self, call: ForceCall) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(call);
        }
    }

    /// Parameters of the restraint with global index `index`.
    pub fn restraint_params(&self, index: usize) -> Option<&RestraintParams> {
        self.restraints.get(index)
    }

    /// Parameters of the `position`-th restraint of `kind`.
    pub fn restraint_params_of(&self, kind: RestraintKind, position: usize) -> Option<&RestraintParams> {
        self.by_kind[kind.ordinal()]
            .get(position)
            .and_then(|&global| self.restraints.get(global))
    }

    pub fn restraint_count(&self) -> usize {
        self.restraints.len()
    }

    pub fn restraint_count_of(&self, kind: RestraintKind) -> usize {
        self.by_kind[kind.ordinal()].len()
    }

    pub fn group(&self, index: usize) -> Option<&EngineGroup> {
        self.groups.get(index)
    }

    pub fn groups(&self) -> &[EngineGroup] {
        &self.groups
    }

    pub fn collection(&self, index: usize) -> Option<&EngineGroup> {
        self.collections.get(index)
    }

    pub fn collections(&self) -> &[EngineGroup] {
        &self.collections
    }

    pub fn counts(&self) -> &CallCounts {
        &self.counts
    }

    /// The recorded calls, if this force was created with [`InMemoryForce::recording`].
    pub fn journal(&self) -> Option<&[ForceCall]> {
        self.journal.as_deref()
    }

    pub fn clear_journal(&mut self) {
        if let Some(journal) = self.journal.as_mut() {
            journal.clear();
        }
    }
}

fn check_members(
    what: &'static str,
    index: usize,
    members: &[usize],
    available: usize,
    num_active: usize,
) -> Result<(), ForceError> {
    if let Some(&bad) = members.iter().find(|&&m| m >= available) {
        return Err(ForceError::IndexOutOfRange {
            what,
            index: bad,
            len: available,
        });
    }
    if num_active > members.len() {
        return Err(ForceError::NumActiveTooLarge {
            what,
            index,
            num_active,
            len: members.len(),
        });
    }
    Ok(())
}

fn modify_num_active(
    what: &'static str,
    entries: &mut [EngineGroup],
    index: usize,
    num_active: usize,
) -> Result<(), ForceError> {
    let len = entries.len();
    let entry = entries
        .get_mut(index)
        .ok_or(ForceError::IndexOutOfRange { what, index, len })?;
    if num_active > entry.members.len() {
        return Err(ForceError::NumActiveTooLarge {
            what,
            index,
            num_active,
            len: entry.members.len(),
        });
    }
    entry.num_active = num_active;
    Ok(())
}

impl RestraintForce for InMemoryForce {
    type Context = InMemoryContext;

    fn add_restraint(&mut self, params: RestraintParams) -> Result<usize, ForceError> {
        let kind = params.kind();
        let global = self.restraints.len();
        self.restraints.push(params);
        self.by_kind[kind.ordinal()].push(global);
        self.counts.restraint_creates[kind.ordinal()] += 1;
        self.record(ForceCall::AddRestraint(kind));
        Ok(global)
    }

    fn modify_restraint(
        &mut self,
        index: usize,
        params: RestraintParams,
    ) -> Result<(), ForceError> {
        let kind = params.kind();
        let positions = &self.by_kind[kind.ordinal()];
        let global = *positions.get(index).ok_or(ForceError::IndexOutOfRange {
            what: kind.as_str(),
            index,
            len: positions.len(),
        })?;
        let expected = self.restraints[global].layout();
        let found = params.layout();
        if expected != found {
            return Err(ForceError::LayoutMismatch {
                kind,
                index,
                expected,
                found,
            });
        }
        self.restraints[global] = params;
        self.counts.restraint_updates[kind.ordinal()] += 1;
        self.record(ForceCall::ModifyRestraint(kind, index));
        Ok(())
    }

    fn add_group(
        &mut self,
        restraint_indices: &[usize],
        num_active: usize,
    ) -> Result<usize, ForceError> {
        let index = self.groups.len();
        check_members("group", index, restraint_indices, self.restraints.len(), num_active)?;
        self.groups.push(EngineGroup {
            members: restraint_indices.to_vec(),
            num_active,
        });
        self.counts.group_creates += 1;
        self.record(ForceCall::AddGroup);
        Ok(index)
    }

    fn modify_group_num_active(
        &mut self,
        index: usize,
        num_active: usize,
    ) -> Result<(), ForceError> {
        modify_num_active("group", &mut self.groups, index, num_active)?;
        self.counts.group_updates += 1;
        self.record(ForceCall::ModifyGroup { index, num_active });
        Ok(())
    }

    fn add_collection(
        &mut self,
        group_indices: &[usize],
        num_active: usize,
    ) -> Result<usize, ForceError> {
        let index = self.collections.len();
        check_members("collection", index, group_indices, self.groups.len(), num_active)?;
        self.collections.push(EngineGroup {
            members: group_indices.to_vec(),
            num_active,
        });
        self.counts.collection_creates += 1;
        self.record(ForceCall::AddCollection);
        Ok(index)
    }

    fn modify_collection_num_active(
        &mut self,
        index: usize,
        num_active: usize,
    ) -> Result<(), ForceError> {
        modify_num_active("collection", &mut self.collections, index, num_active)?;
        self.counts.collection_updates += 1;
        self.record(ForceCall::ModifyCollection { index, num_active });
        Ok(())
    }

    fn update_parameters_in_context(
        &mut self,
        context: &mut InMemoryContext,
    ) -> Result<(), ForceError> {
        context.restraints.clone_from(&self.restraints);
        context.group_num_active = self.groups.iter().map(|g| g.num_active).collect();
        context.collection_num_active = self.collections.iter().map(|c| c.num_active).collect();
        context.syncs += 1;
        self.counts.context_updates += 1;
        self.record(ForceCall::UpdateContext);
        Ok(())
    }
}

/// The parameters a simulation would evaluate, as of the last context update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryContext {
    pub restraints: Vec<RestraintParams>,
    pub group_num_active: Vec<usize>,
    pub collection_num_active: Vec<usize>,
    pub syncs: usize,
}

/// A system that keeps a snapshot of every force added to it.
#[derive(Debug, Clone, Default)]
pub struct InMemorySystem {
    forces: Vec<InMemoryForce>,
}

impl InMemorySystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_count(&self) -> usize {
        self.forces.len()
    }

    pub fn forces(&self) -> &[InMemoryForce] {
        &self.forces
    }
}

impl ForceSystem<InMemoryForce> for InMemorySystem {
    fn add_force(&mut self, force: &InMemoryForce) -> Result<usize, ForceError> {
        self.forces.push(force.clone());
        Ok(self.forces.len() - 1)
    }
}

/// Engine types for running transformers without a simulation package.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

impl Backend for InMemoryBackend {
    type Context = InMemoryContext;
    type Force = InMemoryForce;
    type System = InMemorySystem;
    type Topology = ();
}
