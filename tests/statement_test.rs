//! Structural checks of generated SQL.
//!
//! Statements are parsed back with sqlparser's MySQL dialect rather than
//! compared only as strings.

use fluent_orm::sql::{
    build_count, build_create_index, build_create_table, build_delete, build_insert, build_join,
    build_select, build_select_by_id, build_update,
};
use fluent_orm::{
    ConditionMap, EntityFields, FieldDefinition, FindOptions, JoinSpec, JoinType, SortOrder,
    SqlType, SqlValue, Values,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use sqlparser::ast::{SetExpr, Statement as Ast};
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

fn parse_one(sql: &str) -> Ast {
    let mut statements = Parser::parse_sql(&MySqlDialect {}, sql)
        .unwrap_or_else(|e| panic!("failed to parse {sql}: {e}"));
    assert_eq!(statements.len(), 1, "expected one statement in {sql}");
    statements.remove(0)
}

fn random_column() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("c_{}", suffix.to_lowercase())
}

fn random_value(rng: &mut impl Rng) -> SqlValue {
    match rng.gen_range(0..5) {
        0 => SqlValue::Null,
        1 => SqlValue::Bool(rng.r#gen()),
        2 => SqlValue::Int(rng.r#gen()),
        3 => SqlValue::Float(rng.gen_range(-1e6..1e6)),
        _ => SqlValue::String("it's a \"value\"?".to_string()),
    }
}

fn random_values(len: usize) -> Values {
    let mut rng = rand::thread_rng();
    let mut values = Values::new();
    while values.len() < len {
        values.insert(random_column(), random_value(&mut rng));
    }
    values
}

#[test]
fn test_insert_placeholders_match_values() {
    for len in 1..=12 {
        let values = random_values(len);
        let stmt = build_insert("t", &values).unwrap();

        assert_eq!(stmt.placeholder_count(), len);
        assert_eq!(stmt.params, values.values().cloned().collect::<Vec<_>>());
        assert!(matches!(parse_one(&stmt.sql), Ast::Insert(_)));
    }
}

#[test]
fn test_update_id_is_last_param() {
    for len in 1..=12 {
        let values = random_values(len);
        let stmt = build_update("t", 42, &values).unwrap();

        assert_eq!(stmt.placeholder_count(), len + 1);
        assert_eq!(stmt.params.len(), len + 1);
        assert_eq!(stmt.params.last(), Some(&SqlValue::Int(42)));
        assert!(stmt.sql.ends_with("WHERE id = ?"));
        assert!(matches!(parse_one(&stmt.sql), Ast::Update { .. }));
    }
}

#[test]
fn test_empty_values_rejected() {
    assert!(build_insert("t", &Values::new()).is_err());
    assert!(build_update("t", 1, &Values::new()).is_err());
}

#[test]
fn test_delete_and_select_by_id_parse() {
    let delete = build_delete("users", 3);
    assert_eq!(delete.params, vec![SqlValue::Int(3)]);
    assert!(matches!(parse_one(&delete.sql), Ast::Delete(_)));

    let select = build_select_by_id("users", 3, &[]);
    assert_eq!(select.sql, "SELECT * FROM users WHERE id = ?");
    assert!(matches!(parse_one(&select.sql), Ast::Query(_)));
}

#[test]
fn test_select_without_options_has_no_clauses() {
    let stmt = build_select("users", &FindOptions::new());
    assert!(stmt.params.is_empty());

    let Ast::Query(query) = parse_one(&stmt.sql) else {
        panic!("expected a query");
    };
    assert!(query.order_by.is_none());
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("expected a plain SELECT");
    };
    assert!(select.selection.is_none());
    assert!(!query.to_string().contains("LIMIT"));
}

#[test]
fn test_select_with_all_options_parses() {
    let options = FindOptions::new()
        .filter("name", "O'Brien")
        .filter("deleted_at", SqlValue::Null)
        .fields(["id", "name"])
        .sort("name", SortOrder::Asc)
        .paginate(3, 25);
    let stmt = build_select("users", &options);

    assert!(stmt.sql.ends_with("ORDER BY name ASC LIMIT 25 OFFSET 50"));
    let Ast::Query(query) = parse_one(&stmt.sql) else {
        panic!("expected a query");
    };
    assert!(query.order_by.is_some());
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("expected a plain SELECT");
    };
    assert!(select.selection.is_some());
}

#[test]
fn test_pagination_offsets() {
    let first = build_select("t", &FindOptions::new().paginate(1, 10));
    assert!(first.sql.ends_with("LIMIT 10 OFFSET 0"));

    let second = build_select("t", &FindOptions::new().paginate(2, 10));
    assert!(second.sql.ends_with("LIMIT 10 OFFSET 10"));

    // Zero page or size disables paging
    let zero = build_select("t", &FindOptions::new().paginate(0, 10));
    assert_eq!(zero.sql, "SELECT * FROM t");
}

#[test]
fn test_count_conditions() {
    let stmt = build_count("t", &ConditionMap::new().with("a", 1).with("b", SqlValue::Null));
    assert_eq!(stmt.sql, "SELECT COUNT(*) AS count FROM t WHERE a = 1 AND b IS NULL");
}

#[test]
fn test_join_parses() {
    let spec = JoinSpec::new(JoinType::Right, "users", "orders")
        .on("users.id = orders.user_id")
        .on("orders.total > 10");
    let stmt = build_join(&spec).unwrap();

    assert_eq!(
        stmt.sql,
        "SELECT * FROM users RIGHT JOIN orders ON users.id = orders.user_id AND orders.total > 10"
    );
    assert!(matches!(parse_one(&stmt.sql), Ast::Query(_)));
}

#[test]
fn test_create_table_round_trip_column_names() {
    let mut fields = EntityFields::new();
    let mut expected = vec!["id".to_string()];
    for _ in 0..6 {
        let name = random_column();
        if fields.get(&name).is_none() {
            expected.push(name.clone());
        }
        fields.insert(name, FieldDefinition::new(SqlType::Varchar).size(50));
    }
    fields.insert(
        "score",
        FieldDefinition::new(SqlType::Int)
            .nullable()
            .default_value(0)
            .comment("points, 'raw'"),
    );
    expected.push("score".to_string());

    let sql = build_create_table("players", &fields).unwrap();
    let Ast::CreateTable(table) = parse_one(&sql) else {
        panic!("expected CREATE TABLE");
    };
    let columns: Vec<String> = table.columns.iter().map(|c| c.name.value.clone()).collect();
    assert_eq!(columns, expected);
}

#[test]
fn test_create_index_parses() {
    let fields = ["last_name".to_string(), "first_name".to_string()];
    let sql = build_create_index("users", &fields, true).unwrap();
    assert_eq!(
        sql,
        "CREATE UNIQUE INDEX idx_users_last_name_first_name ON users (last_name, first_name)"
    );
    assert!(matches!(parse_one(&sql), Ast::CreateIndex(_)));
}
