#[cfg(test)]
mod tests {
    use skiff_core::{
        Dialect, Engine, EngineOptions, GenericDialect, Param, PlaceholderStyle, QueryError, Registry,
        SqlBuilder, Value, stream::TryStreamExt, substitute_markers,
    };
    use skiff_tests::{MockConnection, init_logs, row, silent_logs};
    use std::sync::Arc;

    fn engine() -> Engine<MockConnection> {
        init_logs();
        Engine::new(
            MockConnection::new(),
            Arc::new(GenericDialect::new().with_placeholder(PlaceholderStyle::Dollar)),
            Arc::new(Registry::new()),
            EngineOptions {
                prefix: "app_".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn markers() {
        assert_eq!(
            substitute_markers("SELECT {a} FROM {#t} WHERE b = '{#}'", "p_", ('`', '`')),
            "SELECT `a` FROM `p_t` WHERE b = '{#}'"
        );
        assert_eq!(
            substitute_markers("{#t}", "", ('[', ']')),
            "[t]"
        );
    }

    #[tokio::test]
    async fn placeholders_then_markers() {
        let mut engine = engine();
        engine
            .execute(
                "SELECT {name} FROM {#user} WHERE {id} = ? AND {name} = '{x} ? #y' AND {id} <> @id",
                vec![Param::from(5), Param::named("id", 6)],
            )
            .await
            .expect("Statement should run");
        let statements = engine.executor().statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].0,
            r#"SELECT "name" FROM "app_user" WHERE "id" = $1 AND "name" = '{x} ? #y' AND "id" <> $2"#
        );
        assert_eq!(statements[0].1, [Value::Int32(Some(5)), Value::Int32(Some(6))]);
    }

    #[tokio::test]
    async fn query_rows() {
        let mut engine = engine();
        engine.executor_mut().respond_rows(vec![
            row(&["id", "name"], vec![Value::Int64(Some(1)), "first".into()]),
            row(&["id", "name"], vec![Value::Int64(Some(2)), Value::Varchar(None)]),
        ]);
        let rows = engine
            .query("SELECT {id}, {name} FROM {#user} ORDER BY {id}", ())
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get::<i64>("id").unwrap(), 1);
        assert_eq!(rows[0].get::<String>("name").unwrap(), "first");
        assert_eq!(rows[1].get::<Option<String>>("name").unwrap(), None);
        assert!(rows[1].get::<i64>("missing").is_err());
        assert_eq!(
            engine.executor().sql(),
            [r#"SELECT "id", "name" FROM "app_user" ORDER BY "id""#]
        );
    }

    #[tokio::test]
    async fn query_row() {
        let mut engine = engine();
        let row = engine
            .query_row("SELECT 1 WHERE ?", (false,))
            .await
            .unwrap();
        assert!(row.is_none());
        engine
            .executor_mut()
            .respond_rows(vec![skiff_tests::row(&["a"], vec![Value::Int32(Some(1))])]);
        let row = engine.query_row("SELECT 1 AS a", ()).await.unwrap();
        assert_eq!(row.unwrap().get::<i32>("a").unwrap(), 1);
    }

    #[tokio::test]
    async fn executor_error_context() {
        let mut engine = engine();
        engine.executor_mut().respond_error("connection reset");
        let error;
        silent_logs! {
            error = engine
                .execute("DELETE FROM {#user} WHERE {id} = ?", (1,))
                .await
                .unwrap_err();
        }
        let message = format!("{error:#}");
        assert!(message.contains("connection reset"), "{message}");
        assert!(message.contains("DELETE FROM {#user}"), "{message}");

        engine.executor_mut().respond_error("syntax error");
        let error;
        silent_logs! {
            error = engine
                .query("SELEC 1", ())
                .try_collect::<Vec<_>>()
                .await
                .unwrap_err();
        }
        assert!(format!("{error:#}").contains("SELEC 1"));
    }

    #[tokio::test]
    async fn placeholder_error() {
        let mut engine = engine();
        let error;
        silent_logs! {
            error = engine.execute("SELECT ?, ?", (1,)).await.unwrap_err();
        }
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::Placeholder { .. })
        ));
        assert!(engine.executor().statements().is_empty());
    }

    #[tokio::test]
    async fn prepared_statement() {
        let mut engine = engine();
        let statement = engine
            .prepare("UPDATE {#t} SET {a} = @a WHERE {id} = ?")
            .await
            .unwrap();
        assert_eq!(
            engine.executor().prepared(),
            [r#"UPDATE "app_t" SET "a" = $1 WHERE "id" = $2"#]
        );
        assert_eq!(statement.query(), "UPDATE {#t} SET {a} = @a WHERE {id} = ?");
        engine.executor_mut().respond_affected(1);
        let result = engine
            .execute_statement(&statement, vec![Param::from(3), Param::named("a", "x")])
            .await
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(
            engine.executor().statements()[0].1,
            [Value::Varchar(Some("x".into())), Value::Int32(Some(3))]
        );

        engine
            .executor_mut()
            .respond_rows(vec![row(&["a"], vec!["x".into()])]);
        let rows = engine
            .query_statement(&statement, vec![Param::from(4), Param::named("a", "y")])
            .try_collect::<Vec<_>>()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let error;
        silent_logs! {
            error = engine
                .execute_statement(&statement, vec![Param::from(3)])
                .await
                .unwrap_err();
        }
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::Placeholder { .. })
        ));
    }

    #[tokio::test]
    async fn builder_statements() {
        let mut engine = engine();
        let mut builder: SqlBuilder = engine.builder();
        builder
            .update("{#user}")
            .set("{name}", "a")
            .where_("{id}=?", (1i64,));
        engine.executor_mut().respond_affected(1);
        let result = engine.execute_builder(&builder).await.unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(
            engine.executor().sql(),
            [r#"UPDATE "app_user" SET "name"=$1 WHERE "id"=$2"#]
        );

        let mut broken = engine.builder();
        broken.select(Vec::<String>::new()).from("{#user}");
        let error = engine
            .query_builder(&broken)
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<QueryError>(),
            Some(QueryError::HasErrors(..))
        ));
    }

    #[tokio::test]
    async fn transaction() {
        let mut engine = engine();
        {
            let mut transaction = engine.begin().await.unwrap();
            assert_eq!(transaction.options().prefix, "app_");
            transaction
                .execute("INSERT INTO {#log} ({message}) VALUES (?)", ("hello",))
                .await
                .unwrap();
            transaction.commit().await.unwrap();
        }
        {
            let transaction = engine.begin().await.unwrap();
            transaction.rollback().await.unwrap();
        }
        assert_eq!(
            engine.executor().sql(),
            [
                "BEGIN",
                r#"INSERT INTO "app_log" ("message") VALUES ($1)"#,
                "COMMIT",
                "BEGIN",
                "ROLLBACK",
            ]
        );
    }

    #[test]
    fn unknown_dialect() {
        let error = Engine::with_dialect_name(
            MockConnection::new(),
            "unknown",
            Arc::new(Registry::new()),
            EngineOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            error.downcast_ref::<QueryError>(),
            Some(&QueryError::UnknownDialect("unknown".into()))
        );
        let engine = Engine::with_dialect_name(
            MockConnection::new(),
            "generic",
            Arc::new(Registry::new()),
            EngineOptions::default(),
        )
        .unwrap();
        assert_eq!(engine.dialect().name(), "generic");
    }
}
