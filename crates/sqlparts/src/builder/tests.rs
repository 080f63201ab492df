use super::*;
use crate::composite::CompositeBuilder;
use crate::parts::JoinType;
use crate::pg::{HandleConfig, InstrumentedHandle};
use std::sync::Mutex;
use std::time::Duration;

/// Quotes strings in single quotes and passes integers through; records
/// every statement it is asked to run.
#[derive(Debug, Default)]
struct MockDb {
    executed: Mutex<Vec<(String, usize)>>,
    fail: bool,
}

impl MockDb {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn executed(&self) -> Vec<(String, usize)> {
        self.executed.lock().unwrap().clone()
    }
}

impl DbHandle for MockDb {
    type Rows = usize;

    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Int(i) => i.to_string(),
            Value::Null => "NULL".to_string(),
            other => format!("'{other}'"),
        }
    }

    async fn query(
        &self,
        sql: &str,
        params: &ParameterSet,
        _types: &ParameterTypeSet,
    ) -> QbResult<usize> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.len()));
        if self.fail {
            return Err(QbError::Other("relation \"x\" does not exist".to_string()));
        }
        Ok(params.len())
    }
}

/// Never answers within any reasonable timeout.
struct SlowDb;

impl DbHandle for SlowDb {
    type Rows = ();

    fn quote(&self, value: &Value) -> String {
        value.to_string()
    }

    async fn query(&self, _: &str, _: &ParameterSet, _: &ParameterTypeSet) -> QbResult<()> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }
}

// ==================== Parts table ====================

#[test]
fn test_select_append_concatenates() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    qb.add_query_part("select", "a", true).unwrap();
    qb.add_query_part("select", vec!["b", "a"], true).unwrap();
    qb.add_query_part("select", "c", true).unwrap();

    let part = qb.get_query_part("select").unwrap();
    assert_eq!(part.as_flat(), ["a", "b", "a", "c"]);
}

#[test]
fn test_where_replace_ignores_previous_appends() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    qb.add_query_part("where", "a = 1", true).unwrap();
    qb.add_query_part("where", "b = 2", true).unwrap();
    qb.add_query_part("where", "c = 3", false).unwrap();

    let part = qb.get_query_part("where").unwrap();
    assert_eq!(part.as_scalar(), Some(&Condition::from("c = 3")));
}

#[test]
fn test_reset_query_part() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t")
        .where_("a = 1")
        .order_by("a", Order::Asc);

    qb.reset_query_part("orderBy").unwrap();
    qb.reset_query_part("where").unwrap();

    assert!(qb.get_query_part("orderBy").unwrap().as_flat().is_empty());
    assert!(qb.get_query_part("where").unwrap().as_scalar().is_none());
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t");
}

#[test]
fn test_unknown_part_is_rejected_everywhere() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);

    assert!(qb.add_query_part("limit", "1", true).unwrap_err().is_invalid_part());
    assert!(qb.get_query_part("limit").unwrap_err().is_invalid_part());
    assert!(qb.reset_query_part("limit").unwrap_err().is_invalid_part());
}

#[test]
fn test_part_shape_is_checked() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    let err = qb
        .add_query_part("where", vec!["a", "b"], false)
        .unwrap_err();
    assert!(err.is_invalid_part());
    assert!(qb.get_query_part("where").unwrap().is_empty());
}

#[test]
fn test_alias_registry_follows_from_and_join() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from("users", "u").left_join("u", "roles", "r", "r.id = u.role_id");

    let aliases = qb.base().aliases();
    assert_eq!(aliases.get("u"), Some("users"));
    assert_eq!(aliases.get("r"), Some("roles"));

    qb.reset_query_part("join").unwrap();
    assert!(!qb.base().aliases().contains("r"));
    assert_eq!(qb.base().aliases().len(), 1);
}

// ==================== Parameters ====================

#[test]
fn test_set_parameter_auto_keys_skip_null() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    qb.set_parameter(None, 10, ParamType::Int)
        .set_parameter(None, Value::Null, ParamType::Null)
        .set_parameter(None, "x", ParamType::Str)
        .set_parameter(None, None::<i64>, ParamType::Int)
        .set_parameter(None, true, ParamType::Bool);

    let keys: Vec<_> = qb.get_parameters().keys().cloned().collect();
    assert_eq!(keys, vec![ParamKey::from(0), ParamKey::from(1), ParamKey::from(2)]);
    assert_eq!(qb.get_parameter(1), Some(&Value::from("x")));
    assert_eq!(qb.get_parameter(2), Some(&Value::Bool(true)));
}

#[test]
fn test_set_parameter_named_and_overwrite() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    qb.set_parameter(Some(ParamKey::named(":id")), 1, ParamType::Int)
        .set_parameter(Some(ParamKey::named("id")), 2, ParamType::Int);

    assert_eq!(qb.get_parameters().len(), 1);
    assert_eq!(qb.get_parameter("id"), Some(&Value::Int(2)));
    assert_eq!(qb.get_parameter(":id"), Some(&Value::Int(2)));

    // the next auto key is the parameter count, whatever the existing keys are
    qb.set_parameter(None, 3, ParamType::Int);
    assert_eq!(qb.get_parameter(1), Some(&Value::Int(3)));
}

#[test]
fn test_set_parameters_discards_previous() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    qb.set_parameter(None, 1, ParamType::Int)
        .set_parameter(Some(ParamKey::named("old")), "x", ParamType::Str);

    let params: ParameterSet = [("new", "y")].into_iter().collect();
    let types: ParameterTypeSet = [("new", ParamType::Str)].into_iter().collect();
    qb.set_parameters(params, types);

    assert_eq!(qb.get_parameter(0), None);
    assert_eq!(qb.get_parameter("old"), None);
    assert_eq!(qb.get_parameter("new"), Some(&Value::from("y")));
    assert!(!qb.base().get_parameter_types().is_declared(&ParamKey::from(0)));
}

// ==================== Debug query ====================

#[test]
fn test_get_query_substitutes_values() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("id = ?");
    qb.set_parameter(None, 42, ParamType::Int);

    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t WHERE id = ?");
    assert_eq!(qb.get_query().unwrap(), r#"SELECT * FROM t WHERE id = "42""#);
}

#[test]
fn test_get_query_keeps_percent_signs() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("name LIKE 'a%' AND id = ?");
    qb.set_parameter(None, "50%", ParamType::Str);

    assert_eq!(
        qb.get_query().unwrap(),
        r#"SELECT * FROM t WHERE name LIKE 'a%' AND id = "50%""#
    );
}

#[test]
fn test_get_query_count_mismatch() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("a = ? AND b = ?");
    qb.set_parameter(None, 1, ParamType::Int);

    let err = qb.get_query().unwrap_err();
    assert!(matches!(
        err,
        QbError::ParameterCountMismatch {
            placeholders: 2,
            params: 1
        }
    ));
}

#[test]
fn test_get_sql_is_idempotent() {
    let db = MockDb::default();
    let mut qb = select(&db, "u.id");
    qb.from("users", "u")
        .join("u", "roles", "r", "r.id = u.role_id")
        .and_where("u.active")
        .and_where("r.name = 'admin'");

    assert_eq!(qb.get_sql().unwrap(), qb.get_sql().unwrap());
}

#[test]
fn test_get_query_after_spliced_marker() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t")
        .where_with("name = ?", &[CondArg::one("why?")])
        .unwrap()
        .and_where("id = ?");
    qb.set_parameter(None, 3, ParamType::Int);

    assert_eq!(
        qb.get_query().unwrap(),
        r#"SELECT * FROM t WHERE (name = 'why?') AND (id = "3")"#
    );

    let mut qb = select(&db, "*");
    qb.from_table("t")
        .where_with("name = ?", &[CondArg::one("why?")])
        .unwrap();
    assert_eq!(qb.get_query().unwrap(), "SELECT * FROM t WHERE name = 'why?'");
}

#[test]
fn test_display_renders_sql() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("id = ?");
    assert_eq!(qb.to_string(), "SELECT * FROM t WHERE id = ?");
    assert_eq!(format!("{}", delete(&db, "t")), "DELETE FROM t");

    let qb = InsertBuilder::new(&db);
    assert_eq!(qb.to_string(), "Incomplete query: INSERT requires a table");
}

// ==================== prepare_condition ====================

#[test]
fn test_prepare_condition_quotes_values() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    let cond = qb
        .prepare_condition("id = ? AND name = ?", &[CondArg::one(5), CondArg::one("bob")])
        .unwrap();
    assert_eq!(cond, "id = 5 AND name = 'bob'");
}

#[test]
fn test_prepare_condition_expands_lists() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    let cond = qb
        .prepare_condition("id IN (?)", &[CondArg::many([1, 2, 3])])
        .unwrap();
    assert_eq!(cond, "id IN (1,2,3)");
}

#[test]
fn test_prepare_condition_skips_spliced_markers() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    let cond = qb
        .prepare_condition("a = ? AND b = ?", &[CondArg::one("why?"), CondArg::one(2)])
        .unwrap();
    assert_eq!(cond, "a = 'why?' AND b = 2");
}

#[test]
fn test_prepare_condition_leaves_extra_markers() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    let cond = qb.prepare_condition("a = ? AND b = ?", &[CondArg::one(1)]).unwrap();
    assert_eq!(cond, "a = 1 AND b = ?");
    assert_eq!(qb.prepare_condition("a = 1", &[]).unwrap(), "a = 1");
}

#[test]
fn test_prepare_condition_too_many_args() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    let err = qb
        .prepare_condition("a = ?", &[CondArg::one(1), CondArg::one(2)])
        .unwrap_err();
    assert!(err.is_count_mismatch());
}

#[test]
fn test_where_with_uses_prepared_condition() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t")
        .where_with("status = ?", &[CondArg::one("active")])
        .unwrap()
        .and_where_with("id IN (?)", &[CondArg::many([1, 2])])
        .unwrap();

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT * FROM t WHERE (status = 'active') AND (id IN (1,2))"
    );
}

// ==================== Conditions ====================

#[test]
fn test_and_or_where_grouping() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t")
        .where_("a = 1")
        .and_where("b = 2")
        .and_where("c = 3")
        .or_where("d = 4");

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT * FROM t WHERE ((a = 1) AND (b = 2) AND (c = 3)) OR (d = 4)"
    );
}

#[test]
fn test_and_where_on_empty_renders_bare() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").and_where("a = 1");

    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t WHERE a = 1");
}

#[test]
fn test_where_accepts_composite() {
    let db = MockDb::default();
    let mut group = CompositeBuilder::or();
    group.add("a = 1").add("a = 2");

    let mut qb = select(&db, "*");
    qb.from_table("t").where_(group).and_where("b = 3");

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT * FROM t WHERE ((a = 1) OR (a = 2)) AND (b = 3)"
    );
}

#[test]
fn test_empty_conditions_render_no_clause() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").and_where("").or_where("  ").having("");
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t");
    assert!(qb.get_query_part("where").unwrap().as_scalar().is_none());

    qb.where_(CompositeBuilder::and());
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t");

    qb.add_query_part("where", "", false).unwrap();
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t");
}

#[test]
fn test_empty_condition_keeps_existing() {
    let db = MockDb::default();
    let mut qb = update(&db, "t");
    qb.set("a", 1).where_("id = 1").and_where("").or_where("");
    assert_eq!(qb.get_sql().unwrap(), "UPDATE t SET a = ? WHERE id = 1");

    // replacing with an empty condition clears the slot
    qb.where_("");
    assert_eq!(qb.get_sql().unwrap(), "UPDATE t SET a = ?");

    let mut qb = delete(&db, "t");
    qb.where_(CompositeBuilder::or());
    assert_eq!(qb.get_sql().unwrap(), "DELETE FROM t");
}

// ==================== SELECT ====================

#[test]
fn test_select_full_statement() {
    let db = MockDb::default();
    let mut qb = select(&db, "u.id");
    qb.add_select("count(*) AS n")
        .from("users", "u")
        .left_join("u", "orders", "o", "o.user_id = u.id")
        .where_("u.active = ?")
        .group_by("u.id")
        .having("count(*) > 1")
        .order_by("n", Order::Desc)
        .add_order_by("u.id", Order::Asc)
        .set_limit(10)
        .set_page(3);

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT u.id, count(*) AS n FROM users u \
         LEFT JOIN orders o ON o.user_id = u.id \
         WHERE u.active = ? GROUP BY u.id HAVING count(*) > 1 \
         ORDER BY n DESC, u.id ASC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_select_joins_follow_aliases() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from("users", "u")
        .from("groups", "g")
        .join("u", "roles", "r", "r.id = u.role_id")
        .right_join("r", "perms", "p", "p.role_id = r.id")
        .join_with(JoinType::Left, "g", "owners", "w", "w.id = g.owner_id")
        .left_join("u", "profiles", "pr", "pr.user_id = u.id");

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT * FROM users u \
         INNER JOIN roles r ON r.id = u.role_id \
         RIGHT JOIN perms p ON p.role_id = r.id \
         LEFT JOIN profiles pr ON pr.user_id = u.id, \
         groups g LEFT JOIN owners w ON w.id = g.owner_id"
    );
}

#[test]
fn test_select_join_cycle_terminates() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from("a", "a")
        .join("a", "b", "b", "b.a = a.id")
        .join("b", "a", "a", "a.b = b.id");

    assert_eq!(
        qb.get_sql().unwrap(),
        "SELECT * FROM a a INNER JOIN b b ON b.a = a.id INNER JOIN a a ON a.b = b.id"
    );
}

#[test]
fn test_select_orphan_join() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from("users", "u").join("x", "roles", "r", "r.id = x.role_id");

    let err = qb.get_sql().unwrap_err();
    assert!(err.is_incomplete());
    assert!(err.to_string().contains("`x`"));
}

#[test]
fn test_select_requires_columns_and_from() {
    let db = MockDb::default();
    let mut qb = SelectBuilder::new(&db);
    assert!(qb.get_sql().unwrap_err().is_incomplete());

    qb.select_cols(&["a", "b"]);
    assert!(qb.get_sql().unwrap_err().is_incomplete());

    qb.from_table("t");
    assert_eq!(qb.get_sql().unwrap(), "SELECT a, b FROM t");
}

#[test]
fn test_select_replace_and_append_columns() {
    let db = MockDb::default();
    let mut qb = select(&db, "a");
    qb.add_select_cols(&["b", "c"]).from_table("t");
    assert_eq!(qb.get_sql().unwrap(), "SELECT a, b, c FROM t");

    qb.select("x");
    assert_eq!(qb.get_sql().unwrap(), "SELECT x FROM t");
}

#[test]
fn test_set_page() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t");

    qb.set_page(4);
    assert_eq!(qb.offset(), 0);

    qb.set_limit(25).set_page(0);
    assert_eq!(qb.offset(), 0);

    qb.set_page(2);
    assert_eq!(qb.offset(), 25);
    assert_eq!(qb.limit(), Some(25));

    qb.set_offset(7);
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t LIMIT 25 OFFSET 7");
}

#[test]
fn test_group_by_replace_and_append() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").group_by("a").add_group_by("b");
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t GROUP BY a, b");

    qb.group_by("c");
    assert_eq!(qb.get_sql().unwrap(), "SELECT * FROM t GROUP BY c");
}

// ==================== INSERT / UPDATE / DELETE ====================

#[test]
fn test_insert_render() {
    let db = MockDb::default();
    let mut qb = insert(&db, "users");
    qb.set("name", "bob").set("age", 30).set_expr("created_at", "now()");

    assert_eq!(
        qb.get_sql().unwrap(),
        "INSERT INTO users (name, age, created_at) VALUES (?, ?, now())"
    );
    assert_eq!(qb.get_parameter(0), Some(&Value::from("bob")));
    assert_eq!(qb.get_parameter(1), Some(&Value::Int(30)));
    assert_eq!(
        qb.get_query().unwrap(),
        r#"INSERT INTO users (name, age, created_at) VALUES ("bob", "30", now())"#
    );
}

#[test]
fn test_insert_requires_values() {
    let db = MockDb::default();
    let qb = insert(&db, "users");
    assert!(qb.get_sql().unwrap_err().is_incomplete());

    let qb = InsertBuilder::new(&db);
    assert!(qb.get_sql().unwrap_err().is_incomplete());
}

#[test]
fn test_insert_rejects_malformed_fragment() {
    let db = MockDb::default();
    let mut qb = insert(&db, "users");
    qb.add_query_part("set", "name", true).unwrap();
    assert!(qb.get_sql().unwrap_err().is_invalid_part());
}

#[test]
fn test_update_render() {
    let db = MockDb::default();
    let mut qb = update(&db, "users");
    qb.set("name", "bob")
        .set_expr("updated_at", "now()")
        .where_("id = ?");
    qb.set_parameter(None, 7, ParamType::Int);

    assert_eq!(
        qb.get_sql().unwrap(),
        "UPDATE users SET name = ?, updated_at = now() WHERE id = ?"
    );
    assert_eq!(
        qb.get_query().unwrap(),
        r#"UPDATE users SET name = "bob", updated_at = now() WHERE id = "7""#
    );
}

#[test]
fn test_update_null_value_binds_nothing() {
    let db = MockDb::default();
    let mut qb = update(&db, "users");
    qb.set("nickname", Value::Null);

    assert_eq!(qb.get_sql().unwrap(), "UPDATE users SET nickname = ?");
    assert!(qb.get_parameters().is_empty());
    assert!(qb.get_query().unwrap_err().is_count_mismatch());
}

#[test]
fn test_update_requires_set() {
    let db = MockDb::default();
    let qb = update(&db, "users");
    assert!(qb.get_sql().unwrap_err().is_incomplete());
}

#[test]
fn test_delete_render() {
    let db = MockDb::default();
    let mut qb = delete(&db, "sessions");
    assert_eq!(qb.get_sql().unwrap(), "DELETE FROM sessions");

    qb.where_("expires_at < now()").or_where("revoked");
    assert_eq!(
        qb.get_sql().unwrap(),
        "DELETE FROM sessions WHERE (expires_at < now()) OR (revoked)"
    );

    let qb = DeleteBuilder::new(&db);
    assert!(qb.get_sql().unwrap_err().is_incomplete());
}

// ==================== Execution ====================

#[tokio::test]
async fn test_execute_passes_sql_and_params() {
    let db = MockDb::default();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("a = ? AND b = :b");
    qb.set_parameter(None, 1, ParamType::Int)
        .set_parameter(Some(ParamKey::named("b")), "x", ParamType::Str);

    let rows = qb.execute().await.unwrap();
    assert_eq!(rows, 2);
    assert_eq!(
        db.executed(),
        vec![("SELECT * FROM t WHERE a = ? AND b = :b".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_execute_wraps_handle_error() {
    let db = MockDb::failing();
    let mut qb = select(&db, "*");
    qb.from_table("t").where_("x.id = ?");
    qb.set_parameter(None, 5, ParamType::Int);

    let err = qb.execute().await.unwrap_err();
    // the builder does not validate table references; the handle is still called
    assert_eq!(db.executed().len(), 1);
    match err {
        QbError::QueryExecution {
            sql,
            params,
            source,
        } => {
            assert_eq!(sql, "SELECT * FROM t WHERE x.id = ?");
            assert_eq!(params.get(&ParamKey::from(0)), Some(&Value::Int(5)));
            assert!(matches!(*source, QbError::Other(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_execute_incomplete_never_reaches_handle() {
    let db = MockDb::default();
    let qb = SelectBuilder::new(&db);

    assert!(qb.execute().await.unwrap_err().is_incomplete());
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_execute_through_arc_handle() {
    let db = std::sync::Arc::new(MockDb::default());
    let mut qb = delete(db.clone(), "t");
    qb.where_("id = ?").set_parameter(None, 1, ParamType::Int);

    assert_eq!(qb.execute().await.unwrap(), 1);
    assert_eq!(db.executed()[0].0, "DELETE FROM t WHERE id = ?");
}

#[tokio::test]
async fn test_instrumented_handle_times_out() {
    let db = InstrumentedHandle::new(SlowDb)
        .with_config(HandleConfig::new().with_query_timeout(Duration::from_millis(20)));
    let mut qb = select(&db, "*");
    qb.from_table("t");

    let err = qb.execute().await.unwrap_err();
    assert!(err.is_execution());
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_instrumented_handle_delegates() {
    let db = InstrumentedHandle::new(MockDb::default());
    let mut qb = insert(&db, "t");
    assert_eq!(qb.prepare_condition("a = ?", &[CondArg::one("q")]).unwrap(), "a = 'q'");

    qb.set("a", 1);
    assert_eq!(qb.execute().await.unwrap(), 1);
    assert_eq!(db.inner().executed().len(), 1);
}
