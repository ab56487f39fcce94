use super::error::RestraintError;
use super::kinds::{Restraint, SelectableRestraint};
use crate::core::sampling::parameters::Parameter;

/// How many members of a group or collection are enforced.
#[derive(Debug, Clone, PartialEq)]
pub enum NumActive {
    Literal(usize),
    /// Drawn from the sampled-parameter state each time it is resolved.
    Sampled(Parameter),
}

impl From<usize> for NumActive {
    fn from(value: usize) -> Self {
        Self::Literal(value)
    }
}

impl From<Parameter> for NumActive {
    fn from(parameter: Parameter) -> Self {
        Self::Sampled(parameter)
    }
}

/// An ordered set of restraints of which at most `num_active` are enforced.
///
/// Which members count is decided by the force engine, which ranks them by energy.
#[derive(Debug, Clone, PartialEq)]
pub struct RestraintGroup {
    restraints: Vec<SelectableRestraint>,
    num_active: NumActive,
}

impl RestraintGroup {
    /// Builds a group, rejecting restraint kinds that cannot be selected.
    pub fn new(
        restraints: Vec<Restraint>,
        num_active: NumActive,
    ) -> Result<Self, RestraintError> {
        let restraints = restraints
            .into_iter()
            .map(|r| {
                SelectableRestraint::try_from(r).map_err(|rejected| RestraintError::NotSelectable {
                    kind: rejected.kind_name(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_selectable(restraints, num_active)
    }

    pub fn from_selectable(
        restraints: Vec<SelectableRestraint>,
        num_active: NumActive,
    ) -> Result<Self, RestraintError> {
        check_members("group", restraints.len(), &num_active)?;
        for restraint in &restraints {
            restraint.validate()?;
        }
        Ok(Self {
            restraints,
            num_active,
        })
    }

    pub fn restraints(&self) -> &[SelectableRestraint] {
        &self.restraints
    }

    pub fn num_active(&self) -> &NumActive {
        &self.num_active
    }

    pub fn len(&self) -> usize {
        self.restraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restraints.is_empty()
    }
}

/// An ordered set of groups of which at most `num_active` are enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectivelyActiveCollection {
    groups: Vec<RestraintGroup>,
    num_active: NumActive,
}

impl SelectivelyActiveCollection {
    pub fn new(
        groups: Vec<RestraintGroup>,
        num_active: NumActive,
    ) -> Result<Self, RestraintError> {
        check_members("collection", groups.len(), &num_active)?;
        Ok(Self { groups, num_active })
    }

    pub fn groups(&self) -> &[RestraintGroup] {
        &self.groups
    }

    pub fn num_active(&self) -> &NumActive {
        &self.num_active
    }

    pub fn restraint_count(&self) -> usize {
        self.groups.iter().map(RestraintGroup::len).sum()
    }
}

fn check_members(
    container: &'static str,
    len: usize,
    num_active: &NumActive,
) -> Result<(), RestraintError> {
    if len == 0 {
        return Err(RestraintError::Empty(container));
    }
    // Sampled counts are only known at resolution time.
    if let NumActive::Literal(n) = *num_active {
        if n > len {
            return Err(RestraintError::NumActiveOutOfRange {
                container,
                num_active: n,
                len,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::restraints::kinds::{CartesianRestraint, TorsionRestraint};
    use crate::core::restraints::schedule::{Ramp, Scaler};
    use crate::core::sampling::parameters::ParameterManager;

    fn torsion() -> Restraint {
        TorsionRestraint::new([0, 1, 2, 3], 60.0, 15.0, 5.0)
            .unwrap()
            .into()
    }

    #[test]
    fn group_accepts_selectable_restraints() {
        let group = RestraintGroup::new(vec![torsion(), torsion()], NumActive::Literal(1)).unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group.num_active(), &NumActive::Literal(1));
    }

    #[test]
    fn group_rejects_non_selectable_restraint() {
        let cartesian = Restraint::from(CartesianRestraint {
            atom_index: 0,
            position: [0.0, 0.0, 0.0],
            delta: 0.1,
            force_const: 10.0,
            scaler: Scaler::Constant,
            ramp: Ramp::Constant,
        });
        let result = RestraintGroup::new(vec![torsion(), cartesian], NumActive::Literal(1));
        assert_eq!(
            result,
            Err(RestraintError::NotSelectable { kind: "cartesian" })
        );
    }

    #[test]
    fn group_rejects_num_active_above_member_count() {
        let result = RestraintGroup::new(vec![torsion()], NumActive::Literal(2));
        assert_eq!(
            result,
            Err(RestraintError::NumActiveOutOfRange {
                container: "group",
                num_active: 2,
                len: 1
            })
        );
    }

    #[test]
    fn group_rejects_empty_member_list() {
        assert_eq!(
            RestraintGroup::new(vec![], NumActive::Literal(0)),
            Err(RestraintError::Empty("group"))
        );
    }

    #[test]
    fn sampled_num_active_is_not_range_checked_at_construction() {
        let mut manager = ParameterManager::new();
        let p = manager.add_discrete_parameter("n", 5, 0, 10).unwrap();
        let group = RestraintGroup::new(vec![torsion()], NumActive::Sampled(p.clone())).unwrap();
        assert_eq!(group.num_active(), &NumActive::Sampled(p));
    }

    #[test]
    fn collection_counts_restraints_across_groups() {
        let g1 = RestraintGroup::new(vec![torsion()], NumActive::Literal(1)).unwrap();
        let g2 = RestraintGroup::new(vec![torsion(), torsion()], NumActive::Literal(1)).unwrap();
        let collection = SelectivelyActiveCollection::new(vec![g1, g2], NumActive::Literal(1)).unwrap();
        assert_eq!(collection.restraint_count(), 3);
    }

    #[test]
    fn collection_rejects_num_active_above_group_count() {
        let g1 = RestraintGroup::new(vec![torsion()], NumActive::Literal(1)).unwrap();
        assert!(matches!(
            SelectivelyActiveCollection::new(vec![g1], NumActive::Literal(3)),
            Err(RestraintError::NumActiveOutOfRange {
                container: "collection",
                ..
            })
        ));
    }
}
