//! Constraint resolution.
//!
//! A constraint is either built from a type keyword or reuses the
//! implementation of the constraint it references. `ref` chains are
//! followed iteratively; meeting a constraint that is still in progress on
//! the current chain is a cycle.

use crate::model::ConstraintDef;
use crate::query::ModelQuery;
use crate::{CompileError, CompileResult};
use dictum_constraint::ConstraintFactories;
use dictum_core::{NamespaceScope, QName, RawConstraint};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A constraint declaration with its final name.
#[derive(Debug)]
pub(crate) struct ConstraintDraft<'r> {
    pub name: QName,
    pub raw: &'r RawConstraint,
    pub anonymous: bool,
}

enum Source<'r> {
    Typed(&'r str),
    Reference(QName),
}

pub(crate) struct ConstraintResolver<'a, 'r> {
    model: &'a QName,
    drafts: &'a BTreeMap<QName, ConstraintDraft<'r>>,
    scope: &'a NamespaceScope,
    query: &'a dyn ModelQuery,
    factories: &'a ConstraintFactories,
    resolved: BTreeMap<QName, Arc<ConstraintDef>>,
}

impl<'a, 'r> ConstraintResolver<'a, 'r> {
    pub(crate) fn new(
        model: &'a QName,
        drafts: &'a BTreeMap<QName, ConstraintDraft<'r>>,
        scope: &'a NamespaceScope,
        query: &'a dyn ModelQuery,
        factories: &'a ConstraintFactories,
    ) -> Self {
        Self {
            model,
            drafts,
            scope,
            query,
            factories,
            resolved: BTreeMap::new(),
        }
    }

    /// Resolve every draft.
    pub(crate) fn resolve_all(mut self) -> CompileResult<BTreeMap<QName, Arc<ConstraintDef>>> {
        for name in self.drafts.keys() {
            self.resolve(name)?;
        }
        Ok(self.resolved)
    }

    fn source(&self, draft: &ConstraintDraft<'r>) -> CompileResult<Source<'r>> {
        let raw: &'r RawConstraint = draft.raw;
        match (&raw.type_name, &raw.reference) {
            (Some(_), Some(_)) => Err(CompileError::AmbiguousConstraint {
                name: draft.name.clone(),
            }),
            (None, None) => Err(CompileError::IncompleteConstraint {
                name: draft.name.clone(),
            }),
            (Some(type_name), None) => Ok(Source::Typed(type_name.as_str())),
            (None, Some(reference)) => QName::resolve(reference, self.scope)
                .map(Source::Reference)
                .map_err(|e| CompileError::name(reference.as_str(), e)),
        }
    }

    fn build(&self, draft: &ConstraintDraft<'r>, type_name: &str) -> CompileResult<ConstraintDef> {
        let implementation = self
            .factories
            .build(type_name.trim(), &draft.raw.parameters)
            .map_err(|e| CompileError::constraint_construction(draft.name.clone(), e))?;
        Ok(ConstraintDef {
            name: draft.name.clone(),
            title: draft.raw.title.clone(),
            description: draft.raw.description.clone(),
            reference: None,
            implementation: Arc::new(implementation),
            model: self.model.clone(),
            anonymous: draft.anonymous,
        })
    }

    fn resolve(&mut self, start: &QName) -> CompileResult<Arc<ConstraintDef>> {
        let drafts = self.drafts;
        let mut pending: Vec<&'a ConstraintDraft<'r>> = Vec::new();
        let mut in_progress: BTreeSet<QName> = BTreeSet::new();
        let mut cursor = start.clone();

        let mut target = loop {
            if let Some(done) = self.resolved.get(&cursor) {
                break done.clone();
            }
            if !in_progress.insert(cursor.clone()) {
                return Err(CompileError::constraint_cycle(cursor));
            }
            let Some(draft) = drafts.get(&cursor) else {
                let from = pending
                    .last()
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| start.clone());
                break self
                    .query
                    .get_constraint(&cursor)
                    .ok_or_else(|| CompileError::unresolved("constraint", cursor.clone(), from))?;
            };
            match self.source(draft)? {
                Source::Typed(type_name) => {
                    let def = Arc::new(self.build(draft, type_name)?);
                    self.resolved.insert(cursor.clone(), def.clone());
                    break def;
                }
                Source::Reference(next) => {
                    pending.push(draft);
                    cursor = next;
                }
            }
        };

        // Unwind the chain: each referencing constraint shares its target's implementation
        while let Some(draft) = pending.pop() {
            let def = Arc::new(ConstraintDef {
                name: draft.name.clone(),
                title: draft.raw.title.clone().or_else(|| target.title.clone()),
                description: draft
                    .raw
                    .description
                    .clone()
                    .or_else(|| target.description.clone()),
                reference: Some(target.name.clone()),
                implementation: target.implementation.clone(),
                model: self.model.clone(),
                anonymous: draft.anonymous,
            });
            self.resolved.insert(draft.name.clone(), def.clone());
            target = def;
        }

        Ok(target)
    }
}
