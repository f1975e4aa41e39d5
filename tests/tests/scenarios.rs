//! End-to-end scenarios over the content fixture.

use dictum_core::QName;
use dictum_tests::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

const TEST_URI: &str = "http://www.dictum.dev/model/test/1.0";

fn test(local: &str) -> QName {
    QName::new(TEST_URI, local)
}

mod compile {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_properties_of_a_single_class() {
        // GIVEN
        let registry = Scenario::new("properties").put("content/v1.json").run().unwrap();

        // WHEN
        let properties: Vec<QName> = registry
            .get_properties(&test("base"))
            .unwrap()
            .iter()
            .map(|p| p.name.clone())
            .collect();

        // THEN
        assert_eq!(properties, vec![test("prop1")]);
    }

    #[test]
    fn test_anonymous_constraint_is_named_after_its_property() {
        let registry = Scenario::new("anonymous").put("content/v1.json").run().unwrap();

        let constraints = registry.get_constraints(&test("prop1")).unwrap();

        assert_eq!(constraints.len(), 1);
        let name = &constraints[0].name;
        assert_eq!(name.namespace_uri(), TEST_URI);
        let counter = name.local_name().strip_prefix("prop1_anon_").unwrap();
        assert!(counter.parse::<usize>().is_ok());
        assert!(constraints[0].anonymous);
        assert_eq!(constraints[0].type_name(), "REGEX");
    }

    #[test]
    fn test_sub_class_relationships() {
        let registry = Scenario::new("sub_class").put("content/v1.json").run().unwrap();

        assert!(registry.is_sub_class(&test("folder"), &test("base")).unwrap());
        assert!(!registry.is_sub_class(&test("base"), &test("folder")).unwrap());
        assert!(registry.is_sub_class(&test("folder"), &test("folder")).unwrap());
        assert!(registry.is_sub_class(&test("lockableSub"), &test("base")).unwrap());
        // a type is never a sub class of an aspect
        assert!(!registry.is_sub_class(&test("lockableDoc"), &test("lockable")).unwrap());
        assert!(!registry.is_sub_class(&test("nothing"), &test("nothing")).unwrap());
    }

    #[test]
    fn test_default_aspects_are_inherited() {
        // GIVEN
        let registry = Scenario::new("default_aspects").put("content/v1.json").run().unwrap();

        // WHEN
        let doc = registry.get_type(&test("lockableDoc")).unwrap();
        let sub = registry.get_type(&test("lockableSub")).unwrap();

        // THEN
        assert_eq!(doc.default_aspects, vec![test("lockable")]);
        assert_eq!(sub.default_aspects, vec![test("lockable")]);
        assert!(sub.mandatory_aspects.is_empty());
    }

    #[test]
    fn test_child_association_is_inherited_view() {
        let registry = Scenario::new("associations").put("content/v1.json").run().unwrap();

        let folder = registry.get_type(&test("folder")).unwrap();
        let children: Vec<&QName> = folder.child_associations().map(|a| &a.name).collect();

        assert_eq!(children, vec![&test("contains")]);
        let contains = registry.get_association(&test("contains")).unwrap();
        assert!(contains.target.many);
        assert_eq!(
            contains.child.as_ref().map(|c| c.duplicate_child_names_allowed),
            Some(false)
        );
    }

    #[test]
    fn test_sub_types() {
        let registry = Scenario::new("sub_types").put("content/v1.json").run().unwrap();

        let direct = registry.get_sub_types(&test("base"), false).unwrap();
        let all = registry.get_sub_types(&test("base"), true).unwrap();

        assert_eq!(
            direct,
            BTreeSet::from([test("folder"), test("lockableDoc")])
        );
        assert_eq!(
            all,
            BTreeSet::from([
                test("base"),
                test("folder"),
                test("lockableDoc"),
                test("lockableSub")
            ])
        );
    }
}

mod updates {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_adding_a_property_is_incremental() {
        let registry = Scenario::new("add_property")
            .put("content/v1.json")
            .step("content/v2_add_property.json", |a| {
                a.accepted()
                    .diff("test:base", DiffType::UpdatedIncrementally)
                    .diff("test:prop2", DiffType::Created)
                    .diff("test:prop1", DiffType::Unchanged)
                    .diff("test:folder", DiffType::Unchanged)
            })
            .run()
            .unwrap();

        assert!(registry.get_property(&test("prop2")).is_ok());
        assert_eq!(registry.get_properties(&test("folder")).unwrap().len(), 2);
    }

    #[test]
    fn test_removing_a_property_is_rejected() {
        let registry = Scenario::new("remove_property")
            .put("content/v1.json")
            .step("content/v2_remove_property.json", |a| {
                a.rejected()
                    .diff("test:base", DiffType::Updated)
                    .diff("test:prop1", DiffType::Deleted)
            })
            .run()
            .unwrap();

        // the rejected version was not published
        assert!(registry.get_property(&test("prop1")).is_ok());
    }

    #[test]
    fn test_retitling_a_class_is_incremental() {
        Scenario::new("retitle")
            .put("content/v1.json")
            .step("content/v2_retitle.json", |a| {
                a.accepted()
                    .diff("test:base", DiffType::UpdatedIncrementally)
                    .diff("test:prop1", DiffType::Unchanged)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_same_model_twice_is_unchanged() {
        Scenario::new("no_op")
            .put("content/v1.json")
            .step("content/v1.json", |a| {
                a.accepted()
                    .diff("test:base", DiffType::Unchanged)
                    .diff("test:prop1", DiffType::Unchanged)
                    .diff("test:lockable", DiffType::Unchanged)
                    .diff("test:contains", DiffType::Unchanged)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_rejection_lists_every_offending_element() {
        // GIVEN
        let (registry, _store) = registry_with_dictionary();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();
        let candidate = load_fixture("content/v2_remove_property.json").unwrap();

        // WHEN
        let err = registry.validate_update(&candidate).unwrap_err();

        // THEN
        match err {
            dictum_registry::RegistryError::ValidationRejected { diffs, .. } => {
                let names: BTreeSet<QName> = diffs.into_iter().map(|d| d.name).collect();
                assert_eq!(names, BTreeSet::from([test("base"), test("prop1")]));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_parent() {
        Scenario::new("unknown_parent")
            .step("broken/unknown_parent.json", |a| {
                a.fails_with(ErrorKind::UnresolvedReference)
                    .error_contains("}missing")
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_constraint_cycle() {
        Scenario::new("constraint_cycle")
            .step("broken/constraint_cycle.json", |a| {
                a.fails_with(ErrorKind::CyclicReference)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_relaxed_override() {
        Scenario::new("relaxed_override")
            .step("broken/relaxed_override.json", |a| {
                a.fails_with(ErrorKind::IncompatibleOverride)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_property_declared_twice() {
        Scenario::new("duplicate_property")
            .step("broken/duplicate_property.json", |a| {
                a.fails_with(ErrorKind::Structural)
            })
            .run()
            .unwrap();
    }

    #[test]
    fn test_failed_step_is_not_published() {
        let registry = Scenario::new("broken_then_valid")
            .step("broken/unknown_parent.json", |a| {
                a.fails_with(ErrorKind::UnresolvedReference)
            })
            .put("content/v1.json")
            .run()
            .unwrap();

        assert_eq!(registry.get_all_models().unwrap().len(), 2);
    }
}
