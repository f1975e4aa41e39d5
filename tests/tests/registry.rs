//! Registry behaviour across tenants, resets and threads.

use dictum_compiler::builtin::{dictionary_model, DICTIONARY_URI};
use dictum_core::{QName, RawModel};
use dictum_registry::{
    InMemoryModelStore, ModelRegistry, RegistryConfig, RegistryError, ThreadTenant,
};
use dictum_tests::prelude::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

const TEST_URI: &str = "http://www.dictum.dev/model/test/1.0";
const EXT_URI: &str = "http://www.dictum.dev/model/extension/1.0";
const CONS_URI: &str = "http://www.dictum.dev/model/constraints/1.0";

fn test(local: &str) -> QName {
    QName::new(TEST_URI, local)
}

fn ext(local: &str) -> QName {
    QName::new(EXT_URI, local)
}

fn cons(local: &str) -> QName {
    QName::new(CONS_URI, local)
}

fn tenant_registry() -> (ModelRegistry, Arc<InMemoryModelStore>) {
    let (registry, store) = registry_with_dictionary();
    (
        registry.with_tenant_provider(Arc::new(ThreadTenant)),
        store,
    )
}

mod tenants {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tenant_model_extends_shared_model() {
        // GIVEN
        let (registry, _store) = tenant_registry();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();

        // WHEN
        {
            let _acme = ThreadTenant::enter("acme");
            registry
                .put(&load_fixture("tenant/extension.json").unwrap())
                .unwrap();

            // THEN the tenant sees both layers
            let invoice = registry.get_type(&ext("invoice")).unwrap();
            assert!(invoice.inherited_properties.contains_key(&test("prop1")));
            assert!(invoice.inherited_properties.contains_key(&ext("amount")));
            assert!(registry.is_sub_class(&ext("invoice"), &test("base")).unwrap());
            assert_eq!(registry.get_all_models().unwrap().len(), 3);
        }

        // THEN the shared domain and other tenants do not
        assert!(matches!(
            registry.get_type(&ext("invoice")),
            Err(RegistryError::NotFound { .. })
        ));
        let _globex = ThreadTenant::enter("globex");
        assert!(registry.get_type(&ext("invoice")).is_err());
        assert_eq!(registry.get_all_models().unwrap().len(), 2);
    }

    #[test]
    fn test_tenant_version_overrides_shared_version() {
        // GIVEN
        let (registry, _store) = tenant_registry();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();

        // WHEN
        let _acme = ThreadTenant::enter("acme");
        registry
            .put(&load_fixture("content/v2_add_property.json").unwrap())
            .unwrap();

        // THEN
        assert!(registry.get_property(&test("prop2")).is_ok());
        assert_eq!(registry.get_properties(&test("base")).unwrap().len(), 2);
        assert_eq!(registry.get_all_models().unwrap().len(), 2);
        assert_eq!(registry.namespace_uri("test").unwrap(), TEST_URI);
    }

    #[test]
    fn test_tenant_cannot_take_a_shared_prefix() {
        // GIVEN
        let (registry, _store) = tenant_registry();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();
        let mut squatter = RawModel::new("test:squatter");
        squatter.create_namespace("urn:squatter", "test");

        // WHEN
        let _acme = ThreadTenant::enter("acme");
        let result = registry.put(&squatter);

        // THEN
        assert!(matches!(result, Err(RegistryError::Namespace { .. })));
    }

    #[test]
    fn test_tenant_remove_reveals_shared_version() {
        let (registry, _store) = tenant_registry();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();
        let _acme = ThreadTenant::enter("acme");
        registry
            .put(&load_fixture("content/v2_add_property.json").unwrap())
            .unwrap();

        registry.remove(&test("content")).unwrap();

        assert!(registry.get_property(&test("prop2")).is_err());
        assert!(registry.get_property(&test("prop1")).is_ok());
    }
}

mod lifecycle {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lazy_reinit_orders_stored_models() {
        // GIVEN a shared and a tenant domain in the store, dependents first
        let store = InMemoryModelStore::new();
        store.save("", load_fixture("content/v1.json").unwrap());
        store.save("", dictionary_model());
        store.save("acme", load_fixture("tenant/extension.json").unwrap());
        let registry =
            ModelRegistry::new(Arc::new(store)).with_tenant_provider(Arc::new(ThreadTenant));

        // WHEN
        let _acme = ThreadTenant::enter("acme");
        let invoice = registry.get_type(&ext("invoice"));

        // THEN
        assert!(invoice.is_ok());
        assert_eq!(registry.get_all_models().unwrap().len(), 3);
    }

    #[test]
    fn test_stored_import_cycle_fails_initialisation() {
        // GIVEN
        let store = InMemoryModelStore::new();
        let mut a = RawModel::new("a:model");
        a.create_namespace("urn:a", "a");
        a.create_import("urn:b", "b");
        let mut b = RawModel::new("b:model");
        b.create_namespace("urn:b", "b");
        b.create_import("urn:a", "a");
        store.save("", a);
        store.save("", b);
        let registry = ModelRegistry::new(Arc::new(store));

        // WHEN
        let result = registry.get_all_models();

        // THEN
        match result {
            Err(RegistryError::ImportCycle { models }) => {
                assert_eq!(models, vec!["a:model".to_string(), "b:model".to_string()]);
            }
            other => panic!("expected import cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_reset_drops_unstored_models() {
        // GIVEN
        let (registry, store) = registry_with_dictionary();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();
        store.save("", load_fixture("constraints.json").unwrap());

        // WHEN
        registry.reset().unwrap();

        // THEN
        let models = registry.get_all_models().unwrap();
        assert!(models.contains(&cons("model")));
        assert!(!models.contains(&test("content")));
    }

    #[test]
    fn test_destroy_without_lazy_reinit_leaves_empty_cache() {
        let (registry, _store) = registry_with_dictionary();
        let registry = registry.with_config(RegistryConfig::new().with_lazy_reinit(false));
        registry.put(&dictionary_model()).unwrap();

        registry.destroy();

        assert!(registry.get_all_models().unwrap().is_empty());
    }

    #[test]
    fn test_namespace_lookups() {
        let (registry, _store) = registry_with_dictionary();
        registry.put(&load_fixture("content/v1.json").unwrap()).unwrap();

        assert_eq!(registry.namespace_uri("d").unwrap(), DICTIONARY_URI);
        assert_eq!(registry.prefixes(TEST_URI).unwrap(), vec!["test".to_string()]);
        assert!(registry.namespace_uri("nope").is_err());
    }
}

mod constraints {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_constraints_evaluate_through_the_registry() {
        // GIVEN
        let (registry, _store) = registry_with_dictionary();
        registry.put(&load_fixture("constraints.json").unwrap()).unwrap();

        // WHEN
        let status = registry.get_property(&cons("status")).unwrap();
        let rating = registry.get_property(&cons("rating")).unwrap();

        // THEN
        assert!(status.evaluate("Draft").is_empty());
        let rejected = status.evaluate("deleted");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected.all()[0].constraint_type, "LIST");
        assert!(rating.evaluate("3").is_empty());
        assert_eq!(rating.evaluate("7").len(), 1);
    }

    #[test]
    fn test_referenced_constraint_shares_definition() {
        let (registry, _store) = registry_with_dictionary();
        registry.put(&load_fixture("constraints.json").unwrap()).unwrap();

        let alias = registry.get_constraint(&cons("statusAlias")).unwrap();
        let status = registry.get_constraint(&cons("status")).unwrap();

        assert_eq!(alias.reference, Some(cons("status")));
        assert_eq!(alias.title.as_deref(), Some("Status values"));
        assert!(Arc::ptr_eq(&alias.implementation, &status.implementation));
    }

    #[test]
    fn test_model_selector_lists_named_constraints() {
        let (registry, _store) = registry_with_dictionary();
        registry.put(&load_fixture("constraints.json").unwrap()).unwrap();

        let names: Vec<QName> = registry
            .get_constraints(&cons("model"))
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect();

        assert_eq!(names, vec![cons("code"), cons("status"), cons("statusAlias")]);
    }
}

mod concurrency {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered_model(i: usize) -> RawModel {
        let prefix = format!("m{}", i);
        let mut model = RawModel::new(format!("{}:model", prefix));
        model.create_namespace(format!("urn:model:{}", i), prefix.as_str());
        model.create_import(DICTIONARY_URI, "d");
        model
            .create_type(format!("{}:doc", prefix))
            .create_property(format!("{}:title", prefix), "d:text");
        model
    }

    fn put_with_retry(registry: &ModelRegistry, model: &RawModel) -> QName {
        loop {
            match registry.put(model) {
                Ok(name) => return name,
                Err(e) if e.is_retryable() => continue,
                Err(e) => panic!("put failed: {}", e),
            }
        }
    }

    #[test]
    fn test_concurrent_puts_all_land() {
        // GIVEN
        let (registry, _store) = registry_with_dictionary();
        let registry = Arc::new(registry);

        // WHEN
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let name = put_with_retry(&registry, &numbered_model(i));
                    // a thread always sees its own publication
                    assert!(registry.get_model(&name).is_ok());
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // THEN
        assert_eq!(registry.get_all_models().unwrap().len(), 5);
        for i in 0..4 {
            let doc = QName::new(format!("urn:model:{}", i), "doc");
            assert!(registry.get_type(&doc).is_ok());
        }
    }
}
