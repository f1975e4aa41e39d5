//! Load ordering for stored models.

use crate::{RegistryError, RegistryResult};
use dictum_core::RawModel;
use std::collections::{BTreeSet, HashMap};

/// Order `models` so that every model comes after the models declaring the
/// namespaces it imports.
///
/// Imports of a URI no model in the set declares are left to the compiler
/// to resolve. Ties keep the input order.
pub fn bootstrap_order(models: Vec<RawModel>) -> RegistryResult<Vec<RawModel>> {
    let mut declared_by: HashMap<&str, usize> = HashMap::new();
    for (index, model) in models.iter().enumerate() {
        for ns in &model.namespaces {
            declared_by.entry(ns.uri.as_str()).or_insert(index);
        }
    }

    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); models.len()];
    let mut in_degree = vec![0usize; models.len()];
    for (index, model) in models.iter().enumerate() {
        for import in &model.imports {
            if let Some(&provider) = declared_by.get(import.uri.as_str()) {
                if provider != index && dependents[provider].insert(index) {
                    in_degree[index] += 1;
                }
            }
        }
    }

    // Kahn's algorithm, always taking the lowest ready index
    let mut ready: BTreeSet<usize> = (0..models.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(models.len());
    while let Some(index) = ready.pop_first() {
        order.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < models.len() {
        let stuck = (0..models.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| models[i].name.clone())
            .collect();
        return Err(RegistryError::ImportCycle { models: stuck });
    }

    let mut slots: Vec<Option<RawModel>> = models.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}
