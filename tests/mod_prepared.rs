use bson::doc;
use nexus_column::{ColumnEntity, ColumnTemplate, DbError, InMemoryManager};
use std::sync::Arc;

fn template() -> ColumnTemplate<InMemoryManager> {
    let m = InMemoryManager::new();
    m.insert_many(
        [("Ada", 36, "London"), ("Lucas", 30, "Assis"), ("Otavio", 30, "Salvador"), ("Grace", 85, "New York")]
            .into_iter()
            .map(|(name, age, city)| {
                ColumnEntity::from_document("Person", doc! {"name": name, "age": age, "city": city}).unwrap()
            }),
    );
    ColumnTemplate::new(Arc::new(m))
}

#[test]
fn bind_and_run_range_query() {
    let t = template();
    let mut ps = t
        .prepare(
            r#"{"select":["name"],"from":"Person",
                "where":{"field":"age","$between":["@low","@high"]},
                "sort":[{"field":"name","order":"Asc"}]}"#,
        )
        .unwrap();
    assert_eq!(ps.params(), vec!["high", "low"]);
    ps.bind("low", 30).unwrap().bind("high", 40).unwrap();
    let names: Vec<String> =
        ps.result().unwrap().map(|e| e.find("name").unwrap().get_as::<String>().unwrap()).collect();
    assert_eq!(names, vec!["Ada", "Lucas", "Otavio"]);
}

#[test]
fn rebinding_changes_the_result() {
    let t = template();
    let mut ps = t.prepare(r#"{"from":"Person","where":{"field":"city","$eq":"@city"}}"#).unwrap();
    ps.bind("city", "Assis").unwrap();
    let lucas = ps.single_result().unwrap().unwrap();
    assert_eq!(lucas.find("name").unwrap().get_as::<String>().unwrap(), "Lucas");
    ps.bind("city", "Nowhere").unwrap();
    assert!(ps.single_result().unwrap().is_none());
}

#[test]
fn single_result_reports_duplicates() {
    let t = template();
    let mut ps = t.prepare(r#"{"from":"Person","where":{"field":"age","$eq":"@age"}}"#).unwrap();
    ps.bind("age", 30).unwrap();
    assert!(matches!(ps.single_result(), Err(DbError::NonUniqueResult(2))));
}

#[test]
fn unbound_parameter_fails_at_execution() {
    let t = template();
    let ps = t.prepare(r#"{"from":"Person","where":{"$not":{"field":"name","$in":["@a","@b"]}}}"#).unwrap();
    assert!(matches!(ps.result(), Err(DbError::UnboundParameter(_))));
}

#[test]
fn malformed_statement_is_a_json_error() {
    let t = template();
    assert!(matches!(t.prepare(r#"{"from":"Person","where":"#), Err(DbError::Json(_))));
}
