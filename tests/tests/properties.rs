//! Property tests for compiler, registry and diff invariants.

use dictum_compiler::builtin::{dictionary_model, DICTIONARY_URI};
use dictum_compiler::{CompiledModel, Compiler, EmptyQuery, ErrorKind};
use dictum_core::{NamespaceScope, QName, RawConstraint, RawModel};
use dictum_diff::{diff, DiffType};
use dictum_tests::registry_with_dictionary;
use proptest::prelude::*;

const DATA_TYPES: [&str; 4] = ["d:text", "d:int", "d:boolean", "d:date"];

fn dictionary() -> CompiledModel {
    Compiler::new()
        .compile(&dictionary_model(), &EmptyQuery, &NamespaceScope::new())
        .unwrap()
}

fn dictionary_scope() -> NamespaceScope {
    let mut scope = NamespaceScope::new();
    scope.bind("d", DICTIONARY_URI).unwrap();
    scope
}

/// `parents[i]` picks an earlier class as parent, so the hierarchy is acyclic.
fn hierarchy_model(parents: &[Option<usize>]) -> RawModel {
    let mut model = RawModel::new("h:model");
    model.create_namespace("urn:hierarchy", "h");
    for (i, parent) in parents.iter().enumerate() {
        let class = model.create_type(format!("h:c{}", i));
        if let Some(p) = parent {
            if i > 0 {
                class.set_parent(format!("h:c{}", p % i));
            }
        }
    }
    model
}

#[derive(Debug, Clone)]
struct PropertyShape {
    data_type: usize,
    mandatory: bool,
    multi_valued: bool,
    constrained: bool,
}

fn arb_property() -> impl Strategy<Value = PropertyShape> {
    (0..DATA_TYPES.len(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(data_type, mandatory, multi_valued, constrained)| PropertyShape {
            data_type,
            mandatory,
            multi_valued,
            constrained,
        },
    )
}

fn content_model(classes: &[Vec<PropertyShape>]) -> RawModel {
    let mut model = RawModel::new("p:model");
    model.create_namespace("urn:props", "p");
    model.create_import(DICTIONARY_URI, "d");
    for (i, properties) in classes.iter().enumerate() {
        let class = model.create_type(format!("p:c{}", i));
        if i > 0 {
            class.set_parent("p:c0");
        }
        for (j, shape) in properties.iter().enumerate() {
            let property = class.create_property(format!("p:c{}_p{}", i, j), DATA_TYPES[shape.data_type]);
            property
                .set_mandatory(shape.mandatory)
                .set_multi_valued(shape.multi_valued);
            if shape.constrained {
                property.add_constraint(
                    RawConstraint::typed("LENGTH").with_parameter("maxLength", "10"),
                );
            }
        }
    }
    model
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// A constraint `ref` loop of any length is a cycle error, never a stack overflow.
    #[test]
    fn prop_constraint_cycle_is_rejected(length in 1usize..400) {
        let mut model = RawModel::new("cyc:model");
        model.create_namespace("urn:cycle", "cyc");
        for i in 0..length {
            model.constraints.push(
                RawConstraint::reference(format!("cyc:c{}", (i + 1) % length))
                    .with_name(format!("cyc:c{}", i)),
            );
        }

        let result = Compiler::new().compile(&model, &EmptyQuery, &NamespaceScope::new());

        prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::CyclicReference);
    }

    /// Sub-classing is reflexive, transitive and follows declared parents.
    #[test]
    fn prop_sub_class_is_reflexive_and_transitive(
        parents in prop::collection::vec(prop::option::of(0usize..64), 1..10)
    ) {
        let (registry, _store) = registry_with_dictionary();
        registry.put(&hierarchy_model(&parents)).unwrap();
        let names: Vec<QName> = (0..parents.len())
            .map(|i| QName::new("urn:hierarchy", format!("c{}", i)))
            .collect();
        let sub = |a: &QName, b: &QName| registry.is_sub_class(a, b).unwrap();

        for (i, parent) in parents.iter().enumerate() {
            prop_assert!(sub(&names[i], &names[i]));
            if let (Some(p), true) = (parent, i > 0) {
                prop_assert!(sub(&names[i], &names[p % i]));
            }
        }
        for a in &names {
            for b in &names {
                for c in &names {
                    if sub(a, b) && sub(b, c) {
                        prop_assert!(sub(a, c));
                    }
                }
            }
        }
    }

    /// Compiling the same descriptor twice yields equal models whose diff is all unchanged.
    #[test]
    fn prop_recompile_is_identical_and_unchanged(
        classes in prop::collection::vec(prop::collection::vec(arb_property(), 0..4), 1..4)
    ) {
        let dictionary = dictionary();
        let scope = dictionary_scope();
        let raw = content_model(&classes);

        let first = Compiler::new().compile(&raw, &dictionary, &scope).unwrap();
        let second = Compiler::new().compile(&raw, &dictionary, &scope).unwrap();

        prop_assert_eq!(&first, &second);
        let diffs = diff(Some(&first), Some(&second)).unwrap();
        prop_assert!(!diffs.is_empty());
        for element in &diffs {
            prop_assert_eq!(element.diff_type, DiffType::Unchanged, "{}", element);
        }
    }
}
