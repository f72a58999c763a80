#[cfg(test)]
mod tests {
    use skiff_core::{
        Action, ConstraintKind, ModelError, PrimitiveKind, Record, TableKind, Value, compile,
    };
    use skiff_tests::{init_logs, record};

    fn model_error<T: Record>() -> ModelError {
        let error = compile::<T>("").expect_err("Compilation should fail");
        error
            .downcast_ref::<ModelError>()
            .cloned()
            .unwrap_or_else(|| panic!("Expected a ModelError, got {error:#}"))
    }

    #[test]
    fn auto_increment_and_unique() {
        init_logs();
        record!(
            User,
            "user",
            [("id", i32, "ai"), ("name", String, "unique(un_name);len(50)")]
        );
        let table = compile::<User>("").expect("User should compile");
        assert_eq!(table.name, "user");
        assert_eq!(table.auto_increment, Some(0));
        assert_eq!(table.primary_key, [0]);
        assert_eq!(table.uniques["un_name"], [1]);
        let id = table.auto_increment_column().unwrap();
        assert_eq!(id.name, "id");
        assert!(id.auto_increment);
        assert!(!id.nullable);
        assert_eq!(id.kind(), PrimitiveKind::Int);
        let name = table.column("name").unwrap();
        assert_eq!(name.length, [50]);
        assert_eq!(name.value, Value::Varchar(None));
        assert_eq!(name.table, "user");
        assert_eq!(
            table
                .primary_key_columns()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>(),
            ["id"]
        );
    }

    #[test]
    fn auto_increment_nullable() {
        record!(First, "first", [("id", i32, "ai;nullable")]);
        record!(Second, "second", [("id", i32, "nullable;ai")]);
        record!(Third, "third", [("id", Option<i32>, "ai")]);
        record!(Fourth, "fourth", [("id", i32, "ai;nullable(false)")]);
        assert_eq!(
            model_error::<First>(),
            ModelError::NullableConflict { field: "id".into() }
        );
        assert!(matches!(
            model_error::<Second>(),
            ModelError::AutoIncrementConflict { .. }
        ));
        assert!(matches!(
            model_error::<Third>(),
            ModelError::AutoIncrementConflict { .. }
        ));
        assert!(compile::<Fourth>("").is_ok());
    }

    #[test]
    fn auto_increment_type() {
        record!(Name, "name", [("id", String, "ai")]);
        record!(Real, "real", [("id", f64, "ai")]);
        record!(Unsigned, "unsigned", [("id", u64, "ai")]);
        assert_eq!(
            model_error::<Name>(),
            ModelError::InvalidAutoIncrementType { field: "id".into() }
        );
        assert!(matches!(
            model_error::<Real>(),
            ModelError::InvalidAutoIncrementType { .. }
        ));
        assert!(compile::<Unsigned>("").is_ok());
    }

    #[test]
    fn auto_increment_overrides_primary_key() {
        record!(Before, "before", [("code", i32, "pk"), ("id", i64, "ai")]);
        record!(After, "after", [("id", i64, "ai"), ("code", i32, "pk")]);
        record!(Twice, "twice", [("id", i64, "ai"), ("other", i64, "ai")]);
        let table = compile::<Before>("").unwrap();
        assert_eq!(table.primary_key, [1]);
        assert_eq!(table.auto_increment, Some(1));
        assert!(matches!(
            model_error::<After>(),
            ModelError::PrimaryKeyConflict { .. }
        ));
        assert!(matches!(
            model_error::<Twice>(),
            ModelError::AutoIncrementConflict { .. }
        ));
    }

    #[test]
    fn default_values() {
        record!(
            Defaults,
            "defaults",
            [
                ("count", i32, "default(5)"),
                ("label", String, "default('it''s')"),
                ("ratio", Option<f64>, "default(0.5)"),
                ("missing", Option<i16>, "default(null)"),
                ("enabled", bool, "default(true)"),
            ]
        );
        let table = compile::<Defaults>("").unwrap();
        let default = |name: &str| table.column(name).unwrap().default.clone();
        assert_eq!(default("count"), Some(Value::Int32(Some(5))));
        assert_eq!(default("label"), Some(Value::Varchar(Some("it's".into()))));
        assert_eq!(default("ratio"), Some(Value::Float64(Some(0.5))));
        assert_eq!(default("missing"), Some(Value::Int16(None)));
        assert_eq!(default("enabled"), Some(Value::Boolean(Some(true))));
        assert!(table.column("ratio").unwrap().nullable);

        record!(Invalid, "invalid", [("count", i32, "default(abc)")]);
        assert_eq!(
            model_error::<Invalid>(),
            ModelError::InvalidArgument {
                field: "count".into(),
                property: "default".into(),
                value: "abc".into(),
            }
        );
    }

    #[test]
    fn default_and_primary_key() {
        record!(DefaultFirst, "default_first", [("id", i32, "default(1);pk")]);
        record!(KeyFirst, "key_first", [("id", i32, "pk;default(1)")]);
        record!(AutoFirst, "auto_first", [("id", i32, "ai;default(1)")]);
        record!(DefaultAuto, "default_auto", [("id", i32, "default(1);ai")]);
        assert!(matches!(
            model_error::<DefaultFirst>(),
            ModelError::PrimaryKeyConflict { .. }
        ));
        assert!(matches!(
            model_error::<KeyFirst>(),
            ModelError::DefaultConflict { .. }
        ));
        assert!(matches!(
            model_error::<AutoFirst>(),
            ModelError::DefaultConflict { .. }
        ));
        assert!(matches!(
            model_error::<DefaultAuto>(),
            ModelError::AutoIncrementConflict { .. }
        ));
    }

    #[test]
    fn composite_primary_key() {
        record!(
            Membership,
            "membership",
            [("group_id", i64, "pk"), ("user_id", i64, "pk"), ("role", String, "")]
        );
        let table = compile::<Membership>("").unwrap();
        assert_eq!(table.primary_key, [0, 1]);
        assert_eq!(table.auto_increment, None);
    }

    #[test]
    fn constraint_name_collision() {
        record!(UniqueIndex, "a", [("a", i32, "unique(Dup)"), ("b", i32, "index(dup)")]);
        record!(IndexUnique, "b", [("a", i32, "index(dup)"), ("b", i32, "unique(DUP)")]);
        record!(
            ForeignUnique,
            "c",
            [("a", i32, "fk(x,other,id)"), ("b", i32, "unique(X)")]
        );
        record!(
            ForeignForeign,
            "d",
            [("a", i32, "fk(x,other,id)"), ("b", i32, "fk(x,other,id)")]
        );
        record!(UniqueCheck, "e", [("a", i32, "unique(c)")], meta = "check(C, a > 0)");
        assert_eq!(
            model_error::<UniqueIndex>(),
            ModelError::ConstraintNameCollision {
                name: "dup".into(),
                existing: ConstraintKind::Unique,
            }
        );
        assert_eq!(
            model_error::<IndexUnique>(),
            ModelError::ConstraintNameCollision {
                name: "DUP".into(),
                existing: ConstraintKind::Index,
            }
        );
        assert_eq!(
            model_error::<ForeignUnique>(),
            ModelError::ConstraintNameCollision {
                name: "X".into(),
                existing: ConstraintKind::ForeignKey,
            }
        );
        assert!(matches!(
            model_error::<ForeignForeign>(),
            ModelError::ConstraintNameCollision {
                existing: ConstraintKind::ForeignKey,
                ..
            }
        ));
        assert!(matches!(
            model_error::<UniqueCheck>(),
            ModelError::ConstraintNameCollision {
                existing: ConstraintKind::Unique,
                ..
            }
        ));
    }

    #[test]
    fn composite_unique_and_index() {
        record!(
            Pair,
            "pair",
            [
                ("a", i32, "unique(u_ab);index(i_b)"),
                ("b", i32, "unique(U_AB);index(I_B)"),
            ]
        );
        let table = compile::<Pair>("").unwrap();
        assert_eq!(table.uniques["u_ab"], [0, 1]);
        assert_eq!(table.indexes["i_b"], [0, 1]);
        assert_eq!(table.constraint_kind("U_Ab"), Some(ConstraintKind::Unique));
    }

    #[test]
    fn foreign_keys() {
        record!(
            Order,
            "order",
            [
                ("id", i64, "ai"),
                ("user_id", i64, "fk(FK_User, user, id, cascade, set_null)"),
                ("shop_id", i64, "fk(fk_shop,shop,id)"),
            ]
        );
        let table = compile::<Order>("").unwrap();
        let user = &table.foreign_keys["fk_user"];
        assert_eq!(user.name, "fk_user");
        assert_eq!(user.column, 1);
        assert_eq!(user.table, "user");
        assert_eq!(user.references, "id");
        assert_eq!(user.on_update, Some(Action::Cascade));
        assert_eq!(user.on_delete, Some(Action::SetNull));
        let shop = &table.foreign_keys["fk_shop"];
        assert_eq!(shop.column, 2);
        assert_eq!(shop.on_update, None);
        assert_eq!(shop.on_delete, None);

        record!(Explode, "explode", [("a", i64, "fk(fk_a,a,id,explode)")]);
        assert_eq!(
            model_error::<Explode>(),
            ModelError::InvalidArgument {
                field: "a".into(),
                property: "fk".into(),
                value: "explode".into(),
            }
        );
    }

    #[test]
    fn property_arity() {
        record!(Length, "length", [("a", String, "len(1,2,3)")]);
        record!(Flag, "flag", [("a", i32, "ai(1)")]);
        record!(Foreign, "foreign", [("a", i32, "fk(fk_a,other)")]);
        record!(Unique, "unique", [("a", i32, "unique")]);
        assert_eq!(
            model_error::<Length>(),
            ModelError::PropertyArity {
                field: "a".into(),
                property: "len".into(),
                expected: "0 to 2",
                found: 3,
            }
        );
        assert!(matches!(
            model_error::<Flag>(),
            ModelError::PropertyArity { found: 1, .. }
        ));
        assert!(matches!(
            model_error::<Foreign>(),
            ModelError::PropertyArity { found: 2, .. }
        ));
        assert!(matches!(
            model_error::<Unique>(),
            ModelError::PropertyArity { found: 0, .. }
        ));
    }

    #[test]
    fn unknown_property() {
        record!(Unknown, "unknown", [("a", i32, "primary")]);
        assert_eq!(
            model_error::<Unknown>(),
            ModelError::UnknownProperty {
                field: "a".into(),
                property: "primary".into(),
            }
        );
    }

    #[test]
    fn malformed_tag() {
        record!(Malformed, "malformed", [("a", i32, "len(5")]);
        assert_eq!(
            model_error::<Malformed>(),
            ModelError::MalformedTag {
                clause: "len(5".into()
            }
        );
    }

    #[test]
    fn not_a_struct() {
        record!(Nothing, "nothing", []);
        record!(Hidden, "hidden", [("_a", i32, ""), ("b", i32, "-")]);
        assert!(matches!(
            model_error::<Nothing>(),
            ModelError::NotAStruct { .. }
        ));
        assert!(matches!(
            model_error::<Hidden>(),
            ModelError::NotAStruct { .. }
        ));
    }

    #[test]
    fn skipped_and_renamed_fields() {
        record!(
            Account,
            "account",
            [
                ("_cache", i32, ""),
                ("login_name", String, "name(login)"),
                ("ignored", i32, "-"),
                ("note", Option<String>, "len(200)"),
            ]
        );
        let table = compile::<Account>("").unwrap();
        assert_eq!(table.column_names(&[0, 1]), ["login", "note"]);
        let login = &table.columns[0];
        assert_eq!(login.field_name, "login_name");
        assert!(!login.nullable);
        assert!(table.columns[1].nullable);

        record!(Twice, "twice", [("a", i32, ""), ("b", i32, "name(a)")]);
        assert_eq!(
            model_error::<Twice>(),
            ModelError::DuplicateColumn {
                table: "twice".into(),
                column: "a".into(),
            }
        );
    }

    #[test]
    fn optimistic_concurrency() {
        record!(
            Document,
            "document",
            [("id", i64, "pk"), ("version", i32, "occ")]
        );
        let table = compile::<Document>("").unwrap();
        assert_eq!(table.occ, Some(1));
        assert!(table.occ_column().unwrap().occ);

        record!(Text, "text", [("version", String, "occ")]);
        record!(
            Versions,
            "versions",
            [("a", i32, "occ"), ("b", i32, "occ")]
        );
        assert_eq!(
            model_error::<Text>(),
            ModelError::InvalidOccType {
                field: "version".into()
            }
        );
        assert_eq!(
            model_error::<Versions>(),
            ModelError::MultipleOcc {
                table: "versions".into()
            }
        );
    }

    #[test]
    fn table_meta() {
        record!(
            Account,
            "account",
            [("id", i64, "pk"), ("balance", i64, "")],
            meta = "name(accounts);check(Positive, balance >= 0);engine(InnoDB);charset(utf8mb4)"
        );
        let table = compile::<Account>("app_").unwrap();
        assert_eq!(table.name, "app_accounts");
        assert!(table.columns.iter().all(|v| v.table == "app_accounts"));
        assert_eq!(table.checks["positive"], "balance >= 0");
        assert_eq!(table.meta["engine"], ["InnoDB"]);
        assert_eq!(table.meta["charset"], ["utf8mb4"]);
        assert_eq!(table.kind, TableKind::Table);

        record!(Broken, "broken", [("id", i64, "")], meta = "check(only_name)");
        assert!(matches!(
            model_error::<Broken>(),
            ModelError::PropertyArity {
                property,
                found: 1,
                ..
            } if property == "check"
        ));
    }

    #[test]
    fn view() {
        record!(
            Totals,
            "totals",
            [("user_id", i64, ""), ("total", i64, "")],
            view = "SELECT {user_id}, count(*) AS {total} FROM {#order} GROUP BY {user_id}"
        );
        record!(Bare, "bare", [], view = "SELECT 1");
        let table = compile::<Totals>("").unwrap();
        assert!(table.is_view());
        assert_eq!(table.kind, TableKind::View);
        assert_eq!(table.columns.len(), 2);
        assert!(table.view.as_deref().unwrap().starts_with("SELECT"));
        let table = compile::<Bare>("").unwrap();
        assert!(table.is_view());
        assert!(table.columns.is_empty());
    }
}
