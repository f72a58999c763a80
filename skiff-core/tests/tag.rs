#[cfg(test)]
mod tests {
    use skiff_core::{ModelError, Property, Tag};

    fn args(tag: &Tag, name: &str) -> Vec<String> {
        tag.get(name).expect("Property should be present").to_vec()
    }

    #[test]
    fn parse_clauses() {
        let tag = Tag::parse("name(id);ai;len(20)").expect("Tag should parse");
        assert_eq!(tag.len(), 3);
        assert_eq!(args(&tag, "name"), ["id"]);
        assert!(args(&tag, "ai").is_empty());
        assert_eq!(args(&tag, "len"), ["20"]);
        assert!(!tag.contains("pk"));
        assert_eq!(
            tag.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
            ["name", "ai", "len"]
        );
    }

    #[test]
    fn parse_empty() {
        assert!(Tag::parse("").unwrap().is_empty());
        assert!(Tag::parse("  ;  ").unwrap().is_empty());
    }

    #[test]
    fn parse_arguments() {
        let tag = Tag::parse("fk( fk_user , user, id ,cascade, set null ); len(10, 2)").unwrap();
        assert_eq!(
            args(&tag, "fk"),
            ["fk_user", "user", "id", "cascade", "set null"]
        );
        assert_eq!(args(&tag, "len"), ["10", "2"]);
        let tag = Tag::parse("default('a;b,c')").unwrap();
        assert_eq!(args(&tag, "default"), ["'a;b,c'"]);
        let tag = Tag::parse("len()").unwrap();
        assert!(args(&tag, "len").is_empty());
    }

    #[test]
    fn parse_is_deterministic() {
        for tag in [
            "",
            "ai",
            "name(id);ai;len(20)",
            "unique(un_name);len(50);nullable",
            "fk(fk_a,a,id,cascade,restrict);default(5)",
        ] {
            assert_eq!(Tag::parse(tag).unwrap(), Tag::parse(tag).unwrap());
        }
    }

    /// A repeated property replaces the arguments of the first one, in its position.
    #[test]
    fn duplicate_property_overwrites() {
        let tag = Tag::parse("len(10);name(a);len(20)").unwrap();
        assert_eq!(tag.len(), 2);
        assert_eq!(
            tag.into_iter().collect::<Vec<_>>(),
            [
                Property {
                    name: "len".into(),
                    args: vec!["20".into()],
                },
                Property {
                    name: "name".into(),
                    args: vec!["a".into()],
                },
            ]
        );
    }

    #[test]
    fn parse_malformed() {
        for (tag, clause) in [
            ("name(id;ai", "name(id;ai"),
            ("ai;len(20", "len(20"),
            ("ai;len)20;pk", "len)20"),
            ("len(20)x", "len(20)x"),
            ("two words", "two words"),
            ("(id)", "(id)"),
        ] {
            let error = Tag::parse(tag).expect_err("Tag should be malformed");
            assert_eq!(
                error.downcast_ref::<ModelError>(),
                Some(&ModelError::MalformedTag {
                    clause: clause.into()
                }),
                "{tag}"
            );
        }
    }
}
