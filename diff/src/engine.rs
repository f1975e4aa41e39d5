//! The diff engine.

use crate::{DiffError, DiffResult, DiffType, ElementDiff, ElementType};
use dictum_compiler::{AssociationDef, ClassDef, CompiledModel, ConstraintDef, PropertyDef};
use dictum_core::QName;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Compare two versions of one model.
///
/// `None` stands for "no such model": a missing `previous` classifies
/// everything as created, a missing `candidate` everything as deleted.
/// A class present in both versions is followed by the diffs of its own
/// properties and associations; a created or deleted class yields a single
/// entry. Named constraints come last.
pub fn diff(
    previous: Option<&CompiledModel>,
    candidate: Option<&CompiledModel>,
) -> DiffResult<Vec<ElementDiff>> {
    if let (Some(previous), Some(candidate)) = (previous, candidate) {
        if previous.name() != candidate.name() {
            return Err(DiffError::model_mismatch(
                previous.name().clone(),
                candidate.name().clone(),
            ));
        }
    }
    let name = match (previous, candidate) {
        (None, None) => return Err(DiffError::NothingToCompare),
        (Some(model), _) | (None, Some(model)) => model.name().clone(),
    };

    let empty = BTreeMap::new();
    let mut diffs = Vec::new();
    diff_classes(
        previous.map_or(&empty, |m| &m.types),
        candidate.map_or(&empty, |m| &m.types),
        ElementType::Type,
        &mut diffs,
    );
    diff_classes(
        previous.map_or(&empty, |m| &m.aspects),
        candidate.map_or(&empty, |m| &m.aspects),
        ElementType::Aspect,
        &mut diffs,
    );
    diff_constraints(previous, candidate, &mut diffs);

    debug!(
        model = %name,
        diffs = diffs.len(),
        changed = diffs.iter().filter(|d| d.diff_type != DiffType::Unchanged).count(),
        "Model diff computed"
    );
    Ok(diffs)
}

/// The diffs that may not be applied to a model in use.
pub fn non_incremental(diffs: &[ElementDiff]) -> Vec<ElementDiff> {
    diffs
        .iter()
        .filter(|d| !d.diff_type.is_incremental())
        .cloned()
        .collect()
}

/// Accept the change only if every element diff is incremental.
///
/// On rejection the error carries every offending diff.
pub fn validate_incremental(
    previous: Option<&CompiledModel>,
    candidate: Option<&CompiledModel>,
) -> DiffResult<()> {
    let offending = non_incremental(&diff(previous, candidate)?);
    if offending.is_empty() {
        Ok(())
    } else {
        Err(DiffError::NotIncremental { diffs: offending })
    }
}

/// Pairs up the keys of two maps: (name, before, after).
fn pair<'a, V>(
    before: &'a BTreeMap<QName, V>,
    after: &'a BTreeMap<QName, V>,
) -> impl Iterator<Item = (&'a QName, Option<&'a V>, Option<&'a V>)> {
    let names: BTreeSet<&QName> = before.keys().chain(after.keys()).collect();
    names
        .into_iter()
        .map(move |name| (name, before.get(name), after.get(name)))
}

fn presence<V>(before: Option<V>, after: Option<V>) -> Option<DiffType> {
    match (before, after) {
        (None, Some(_)) => Some(DiffType::Created),
        (Some(_), None) => Some(DiffType::Deleted),
        _ => None,
    }
}

/// Declared properties plus overrides, keyed by property name.
fn class_properties(class: &ClassDef) -> BTreeMap<QName, Arc<PropertyDef>> {
    class
        .properties
        .iter()
        .chain(class.property_overrides.iter())
        .map(|(name, def)| (name.clone(), def.clone()))
        .collect()
}

fn diff_classes(
    before: &BTreeMap<QName, Arc<ClassDef>>,
    after: &BTreeMap<QName, Arc<ClassDef>>,
    element_type: ElementType,
    diffs: &mut Vec<ElementDiff>,
) {
    for (name, old, new) in pair(before, after) {
        let (old, new) = match (old, new) {
            (Some(old), Some(new)) => (old, new),
            // A created or deleted class stands for its members
            _ => {
                let class_diff = presence(old, new).unwrap_or(DiffType::Unchanged);
                diffs.push(ElementDiff::new(name.clone(), element_type, class_diff));
                continue;
            }
        };

        let mut members = Vec::new();
        for (prop_name, old_prop, new_prop) in
            pair(&class_properties(old), &class_properties(new))
        {
            let diff_type = presence(old_prop, new_prop)
                .or_else(|| old_prop.zip(new_prop).map(|(o, n)| diff_property(o, n)))
                .unwrap_or(DiffType::Unchanged);
            members.push(
                ElementDiff::new(prop_name.clone(), ElementType::Property, diff_type)
                    .with_owner(name.clone()),
            );
        }
        for (assoc_name, old_assoc, new_assoc) in pair(&old.associations, &new.associations) {
            let diff_type = presence(old_assoc, new_assoc)
                .or_else(|| old_assoc.zip(new_assoc).map(|(o, n)| diff_association(o, n)))
                .unwrap_or(DiffType::Unchanged);
            members.push(
                ElementDiff::new(assoc_name.clone(), ElementType::Association, diff_type)
                    .with_owner(name.clone()),
            );
        }

        let class_diff = aggregate(diff_class(old, new), &members);
        diffs.push(ElementDiff::new(name.clone(), element_type, class_diff));
        diffs.extend(members);
    }
}

/// Fold member changes into a class's own classification.
fn aggregate(own: DiffType, members: &[ElementDiff]) -> DiffType {
    members.iter().fold(own, |acc, member| {
        let implied = match member.diff_type {
            DiffType::Unchanged => DiffType::Unchanged,
            DiffType::Created | DiffType::UpdatedIncrementally => DiffType::UpdatedIncrementally,
            DiffType::Updated | DiffType::Deleted => DiffType::Updated,
        };
        acc.max(implied)
    })
}

fn diff_class(old: &ClassDef, new: &ClassDef) -> DiffType {
    let old_aspects: BTreeSet<_> = old.mandatory_aspects.iter().collect();
    let new_aspects: BTreeSet<_> = new.mandatory_aspects.iter().collect();
    if old.parent != new.parent || old_aspects != new_aspects {
        return DiffType::Updated;
    }
    if old.title != new.title || old.description != new.description || old.archive != new.archive
    {
        return DiffType::UpdatedIncrementally;
    }
    DiffType::Unchanged
}

/// Anonymous constraints are matched by implementation, named ones by name too.
fn same_constraint(old: &ConstraintDef, new: &ConstraintDef) -> bool {
    let same_identity = (old.anonymous && new.anonymous) || old.name == new.name;
    same_identity && old.reference == new.reference && old.implementation == new.implementation
}

fn same_constraints(old: &[Arc<ConstraintDef>], new: &[Arc<ConstraintDef>]) -> bool {
    old.len() == new.len() && old.iter().zip(new).all(|(o, n)| same_constraint(o, n))
}

fn diff_property(old: &PropertyDef, new: &PropertyDef) -> DiffType {
    if old.data_type != new.data_type
        || old.multi_valued != new.multi_valued
        || old.mandatory != new.mandatory
        || old.mandatory_enforced != new.mandatory_enforced
        || old.protected != new.protected
        || old.is_override != new.is_override
    {
        return DiffType::Updated;
    }

    let mut diff_type = DiffType::Unchanged;
    if !same_constraints(&old.constraints, &new.constraints) {
        // Appending constraints is incremental; changing or removing one is not
        let appended = new.constraints.len() > old.constraints.len()
            && same_constraints(&old.constraints, &new.constraints[..old.constraints.len()]);
        if !appended {
            return DiffType::Updated;
        }
        diff_type = DiffType::UpdatedIncrementally;
    }
    if old.title != new.title
        || old.description != new.description
        || old.default_value != new.default_value
        || old.index != new.index
    {
        diff_type = DiffType::UpdatedIncrementally;
    }
    diff_type
}

fn diff_association(old: &AssociationDef, new: &AssociationDef) -> DiffType {
    if old.target_class != new.target_class
        || old.source != new.source
        || old.target != new.target
        || old.child != new.child
        || old.protected != new.protected
    {
        return DiffType::Updated;
    }
    if old.title != new.title || old.description != new.description {
        return DiffType::UpdatedIncrementally;
    }
    DiffType::Unchanged
}

fn diff_constraint(old: &ConstraintDef, new: &ConstraintDef) -> DiffType {
    if old.reference != new.reference || old.implementation != new.implementation {
        return DiffType::Updated;
    }
    if old.title != new.title || old.description != new.description {
        return DiffType::UpdatedIncrementally;
    }
    DiffType::Unchanged
}

fn diff_constraints(
    previous: Option<&CompiledModel>,
    candidate: Option<&CompiledModel>,
    diffs: &mut Vec<ElementDiff>,
) {
    let named = |model: Option<&CompiledModel>| -> BTreeMap<QName, Arc<ConstraintDef>> {
        model
            .map(|m| {
                m.named_constraints()
                    .map(|c| (c.name.clone(), c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    };
    let before = named(previous);
    let after = named(candidate);
    for (name, old, new) in pair(&before, &after) {
        let diff_type = presence(old, new)
            .or_else(|| old.zip(new).map(|(o, n)| diff_constraint(o, n)))
            .unwrap_or(DiffType::Unchanged);
        diffs.push(ElementDiff::new(name.clone(), ElementType::Constraint, diff_type));
    }
}
