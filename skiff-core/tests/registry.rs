#[cfg(test)]
mod tests {
    use skiff_core::{ModelError, Registry};
    use skiff_tests::record;
    use std::{sync::Arc, thread};

    record!(
        User,
        "user",
        [("id", i64, "ai"), ("name", String, "unique(un_name);len(50)")]
    );
    record!(Impostor, "user", [("code", i32, "pk")]);
    record!(Broken, "broken", [("id", String, "ai")]);
    record!(Renamed, "renamed", [("id", i64, "pk")], meta = "name(user)");

    #[test]
    fn cached_instance() {
        let registry = Registry::new();
        let first = registry.compile::<User>("").unwrap();
        let second = registry.compile::<User>("").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &registry.get("user").unwrap()));
        assert_eq!(registry.len(), 1);

        let prefixed = registry.compile::<User>("test_").unwrap();
        assert_eq!(prefixed.name, "test_user");
        assert!(!Arc::ptr_eq(&first, &prefixed));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn clear() {
        let registry = Registry::new();
        let first = registry.compile::<User>("").unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.get("user").is_none());
        let second = registry.compile::<User>("").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn duplicate_model() {
        let registry = Registry::new();
        registry.compile::<User>("").unwrap();
        let error = registry.compile::<Impostor>("").unwrap_err();
        assert_eq!(
            error.downcast_ref::<ModelError>(),
            Some(&ModelError::DuplicateModel {
                name: "user".into()
            })
        );
        let error = registry.compile::<Renamed>("").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ModelError>(),
            Some(ModelError::DuplicateModel { .. })
        ));
        assert!(registry.compile::<Impostor>("other_").is_ok());
        assert!(registry.compile::<User>("").is_ok());
    }

    #[test]
    fn failure_is_not_cached() {
        let registry = Registry::new();
        assert!(registry.compile::<Broken>("").is_err());
        assert!(registry.is_empty());
        assert!(registry.compile::<Broken>("").is_err());
    }

    #[test]
    fn concurrent_compilation() {
        let registry = Registry::new();
        let tables = thread::scope(|s| {
            let handles = (0..8)
                .map(|_| s.spawn(|| registry.compile::<User>("").unwrap()))
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|v| v.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert!(tables.windows(2).all(|v| Arc::ptr_eq(&v[0], &v[1])));
        assert_eq!(registry.len(), 1);
    }
}
