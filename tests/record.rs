#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use skiff::{Fields, ModelError, Record, Registry, RowLabeled, TableKind, Value, compile};
    use std::{borrow::Cow, sync::Arc};
    use time::{PrimitiveDateTime, macros::datetime};
    use uuid::Uuid;

    #[derive(Fields, Debug, Clone, PartialEq)]
    struct Audit {
        #[skiff(tag = "default('system');len(30)")]
        created_by: String,
        created_at: PrimitiveDateTime,
    }

    #[derive(Record, Debug, Clone, PartialEq)]
    #[skiff(name = "users", meta = "check(adult, {age} >= 18)")]
    struct User {
        #[skiff(tag = "ai")]
        id: i64,
        #[skiff(tag = "unique(un_name);len(50)")]
        name: String,
        #[skiff(tag = "name(mail);len(120)")]
        email: Option<String>,
        age: i32,
        #[skiff(flatten)]
        audit: Audit,
        #[skiff(skip)]
        tags: Vec<String>,
        _scratch: i32,
    }

    #[derive(Fields, Debug, Clone, PartialEq)]
    struct Origin {
        #[skiff(tag = "unique(un_region)")]
        region: String,
    }

    #[derive(Fields, Debug, Clone, PartialEq)]
    struct Shipping {
        #[skiff(tag = "index(ix_carrier)")]
        carrier: String,
        #[skiff(flatten)]
        origin: Origin,
        weight: f64,
    }

    #[derive(Record, Debug, Clone, PartialEq)]
    struct Parcel {
        #[skiff(tag = "ai")]
        id: i64,
        #[skiff(flatten)]
        shipping: Shipping,
        #[skiff(tag = "index(ix_carrier)")]
        label: String,
    }

    #[derive(Record, Debug, Clone, PartialEq)]
    struct ProductLine {
        #[skiff(tag = "pk")]
        code: Uuid,
        #[skiff(tag = "len(10,2)")]
        price: Decimal,
        #[skiff(tag = "-")]
        ignored: Option<i32>,
    }

    #[derive(Record)]
    #[skiff(view = "SELECT {id}, {name} FROM {#users} WHERE {age} > 60")]
    struct Senior {
        id: i64,
        name: String,
    }

    fn user() -> User {
        User {
            id: 7,
            name: "Alice".into(),
            email: None,
            age: 31,
            audit: Audit {
                created_by: "admin".into(),
                created_at: datetime!(2024-05-01 10:30),
            },
            tags: vec!["ignored".into()],
            _scratch: 3,
        }
    }

    #[test]
    fn derived_description() {
        assert_eq!(User::table_name(), "users");
        assert_eq!(ProductLine::table_name(), Cow::Borrowed("product_line"));
        assert_eq!(User::meta(), Some("check(adult, {age} >= 18)"));
        assert_eq!(User::view(), None);
        assert!(Senior::view().is_some());
        let names = |fields: Vec<skiff::FieldDef>| {
            fields
                .into_iter()
                .map(|v| match v {
                    skiff::FieldDef::Column { name, .. } => name.to_string(),
                    skiff::FieldDef::Embedded(..) => "<embedded>".to_string(),
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(User::fields()),
            ["id", "name", "email", "age", "<embedded>"]
        );
        assert_eq!(names(Audit::fields()), ["created_by", "created_at"]);
    }

    #[test]
    fn compiled_table() {
        let table = compile::<User>("").unwrap();
        assert_eq!(table.name, "users");
        assert_eq!(
            table.column_names(&(0..table.columns.len()).collect::<Vec<_>>()),
            ["id", "name", "mail", "age", "created_by", "created_at"]
        );
        assert_eq!(table.primary_key, [0]);
        assert_eq!(table.auto_increment, Some(0));
        assert_eq!(table.uniques["un_name"], [1]);
        assert!(table.column("mail").unwrap().nullable);
        assert_eq!(table.column("mail").unwrap().field_name, "email");
        assert_eq!(
            table.column("created_by").unwrap().default,
            Some(Value::Varchar(Some("system".into())))
        );
        assert_eq!(table.checks["adult"], "{age} >= 18");

        let table = compile::<ProductLine>("shop_").unwrap();
        assert_eq!(table.name, "shop_product_line");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.column("price").unwrap().length, [10, 2]);
        assert_eq!(table.column("code").unwrap().value, Value::Uuid(None));

        let table = compile::<Senior>("").unwrap();
        assert_eq!(table.kind, TableKind::View);
    }

    #[test]
    fn values_follow_columns() {
        let values = user().values();
        assert_eq!(
            values,
            [
                Value::Int64(Some(7)),
                Value::Varchar(Some("Alice".into())),
                Value::Varchar(None),
                Value::Int32(Some(31)),
                Value::Varchar(Some("admin".into())),
                Value::Timestamp(Some(datetime!(2024-05-01 10:30))),
            ]
        );
        assert_eq!(values.len(), compile::<User>("").unwrap().columns.len());
    }

    #[test]
    fn from_row() {
        let labels: Arc<[String]> = ["id", "name", "mail", "age", "created_by", "created_at"]
            .into_iter()
            .map(String::from)
            .collect();
        let row = RowLabeled::new(labels.clone(), user().values().into());
        let decoded = User::from_row(&row).unwrap();
        assert_eq!(
            decoded,
            User {
                tags: Vec::new(),
                _scratch: 0,
                ..user()
            }
        );

        let row = RowLabeled::new(labels[..2].into(), vec![Value::Int64(Some(1)), "x".into()].into());
        assert!(User::from_row(&row).is_err());
    }

    #[test]
    fn pointer_records() {
        let registry = Registry::new();
        let table = registry.compile::<User>("").unwrap();
        let boxed = registry.compile::<Box<User>>("").unwrap();
        let shared = registry.compile::<Arc<User>>("").unwrap();
        assert!(Arc::ptr_eq(&table, &boxed));
        assert!(Arc::ptr_eq(&table, &shared));
        assert_eq!(<Box<User>>::base_type_name(), std::any::type_name::<User>());
    }

    #[test]
    fn duplicate_model() {
        #[derive(Record)]
        #[skiff(name = "users")]
        struct Impostor {
            #[skiff(tag = "pk")]
            id: i32,
        }
        let registry = Registry::new();
        registry.compile::<User>("").unwrap();
        let error = registry.compile::<Impostor>("").unwrap_err();
        assert_eq!(
            error.downcast_ref::<ModelError>(),
            Some(&ModelError::DuplicateModel {
                name: "users".into()
            })
        );
    }

    #[test]
    fn nested_flatten() {
        let table = compile::<Parcel>("").unwrap();
        assert_eq!(
            table.column_names(&(0..table.columns.len()).collect::<Vec<_>>()),
            ["id", "carrier", "region", "weight", "label"]
        );
        assert_eq!(table.primary_key, [0]);
        assert_eq!(table.uniques["un_region"], [2]);
        assert_eq!(table.indexes["ix_carrier"], [1, 4]);

        let parcel = Parcel {
            id: 3,
            shipping: Shipping {
                carrier: "post".into(),
                origin: Origin {
                    region: "north".into(),
                },
                weight: 1.5,
            },
            label: "fragile".into(),
        };
        let values = parcel.values();
        assert_eq!(values.len(), table.columns.len());
        assert_eq!(values[2], Value::Varchar(Some("north".into())));
        let labels: Arc<[String]> = table.columns.iter().map(|c| c.name.clone()).collect();
        let row = RowLabeled::new(labels, values.into());
        assert_eq!(Parcel::from_row(&row).unwrap(), parcel);
    }
}
