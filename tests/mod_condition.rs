use bson::oid::ObjectId;
use bson::{Bson, DateTime, doc};
use nexus_column::condition::{compare_bson, eval_condition};
use nexus_column::{Column, ColumnCondition, ColumnEntity, ColumnValue, ConditionKind, DbError};
use std::cmp::Ordering;
use std::collections::HashSet;

fn person() -> ColumnEntity {
    ColumnEntity::from_document("Person", doc! {"name": "Lucas", "city": "Assis", "age": 32, "score": 7.5})
        .unwrap()
}

#[test]
fn and_with_negated_child_is_an_unordered_set() {
    let city = ColumnCondition::equals("city", "Assis").unwrap();
    let not_lucas = ColumnCondition::equals("name", "Lucas").unwrap().negate();
    let and = ColumnCondition::and([city.clone(), not_lucas.clone()]).unwrap();
    assert_eq!(and.kind(), ConditionKind::And);

    let got: HashSet<&ColumnCondition> = and.children().iter().collect();
    let want: HashSet<&ColumnCondition> = [&not_lucas, &city].into_iter().collect();
    assert_eq!(got, want);

    let swapped = ColumnCondition::and([not_lucas, city]).unwrap();
    assert_eq!(and, swapped);
}

#[test]
fn negating_a_conjunction_wraps_then_restores() {
    let a = ColumnCondition::equals("a", 1).unwrap();
    let b = ColumnCondition::greater_than("b", 2).unwrap();
    let and = ColumnCondition::and([a, b]).unwrap();
    let not = and.clone().negate();
    assert_eq!(not.kind(), ConditionKind::Not);
    assert_eq!(not.column().name(), "_NOT");
    assert_eq!(not.children(), std::slice::from_ref(&and));
    assert_eq!(not.negate(), and);
}

#[test]
fn composites_need_two_operands() {
    let a = ColumnCondition::equals("a", 1).unwrap();
    assert!(matches!(ColumnCondition::and([a.clone()]), Err(DbError::InvalidArgument(_))));
    assert!(matches!(ColumnCondition::or(Vec::new()), Err(DbError::InvalidArgument(_))));
}

#[test]
fn or_does_not_flatten_nested_or() {
    let a = ColumnCondition::equals("a", 1).unwrap();
    let b = ColumnCondition::equals("b", 2).unwrap();
    let c = ColumnCondition::equals("c", 3).unwrap();
    let inner = ColumnCondition::or([a, b]).unwrap();
    let outer = ColumnCondition::or([inner.clone(), c]).unwrap();
    assert_eq!(outer.children().len(), 2);
    assert_eq!(outer.children()[0], inner);
    assert_eq!(outer.depth(), 3);
    assert_eq!(outer.column_names(), vec!["a", "b", "c"]);
}

#[test]
fn factory_argument_checks() {
    assert!(matches!(ColumnCondition::equals("a", Bson::Null), Err(DbError::NullArgument(_))));
    assert!(matches!(ColumnCondition::equals("", 1), Err(DbError::InvalidArgument(_))));
    assert!(matches!(ColumnCondition::between("a", [1]), Err(DbError::InvalidArgument(_))));
    assert!(matches!(ColumnCondition::is_in("a", Vec::<i32>::new()), Err(DbError::InvalidArgument(_))));
    let bad = Column::of("x", Bson::Int32(1)).unwrap();
    assert!(matches!(ColumnCondition::of(ConditionKind::And, bad), Err(DbError::InvalidArgument(_))));
}

#[test]
fn column_value_access_checks_type() {
    let c = Column::of("age", Bson::Int32(32)).unwrap();
    assert_eq!(c.get_as::<i64>().unwrap(), 32);
    assert!(matches!(c.get_as::<String>(), Err(DbError::TypeMismatch { .. })));
    let list = Column::of("xs", vec![Bson::Int32(1), Bson::Int32(2)]).unwrap();
    assert!(matches!(list.value(), ColumnValue::List(v) if v.len() == 2));
    assert!(matches!(list.get(), Err(DbError::TypeMismatch { .. })));
}

#[test]
fn evaluates_leaves_and_composites() {
    let p = person();
    let yes = |c: ColumnCondition| assert!(eval_condition(&p, &c), "{c}");
    let no = |c: ColumnCondition| assert!(!eval_condition(&p, &c), "{c}");

    yes(ColumnCondition::equals("age", 32.0).unwrap());
    yes(ColumnCondition::greater_equals("age", 32).unwrap());
    no(ColumnCondition::greater_than("age", 32).unwrap());
    yes(ColumnCondition::between("score", [7, 8]).unwrap());
    yes(ColumnCondition::between("age", [32, 40]).unwrap());
    yes(ColumnCondition::is_in("city", ["Salvador", "Assis"]).unwrap());
    yes(ColumnCondition::like("name", "Lu%").unwrap());
    yes(ColumnCondition::like("name", "_ucas").unwrap());
    no(ColumnCondition::like("name", "lu%").unwrap());
    no(ColumnCondition::equals("missing", 1).unwrap());
    yes(ColumnCondition::equals("missing", 1).unwrap().negate());
    yes(ColumnCondition::or([
        ColumnCondition::equals("city", "Rome").unwrap(),
        ColumnCondition::lesser_than("age", 40).unwrap(),
    ])
    .unwrap());
    no(ColumnCondition::and([
        ColumnCondition::equals("city", "Assis").unwrap(),
        ColumnCondition::equals("name", "Lucas").unwrap().negate(),
    ])
    .unwrap());
}

#[test]
fn like_treats_regex_metacharacters_literally() {
    let e = ColumnEntity::from_document("T", doc! {"v": "a.c"}).unwrap();
    assert!(eval_condition(&e, &ColumnCondition::like("v", "a.c").unwrap()));
    let e = ColumnEntity::from_document("T", doc! {"v": "abc"}).unwrap();
    assert!(!eval_condition(&e, &ColumnCondition::like("v", "a.c").unwrap()));
}

#[test]
fn numbers_compare_across_widths() {
    assert_eq!(compare_bson(&Bson::Int32(3), &Bson::Double(3.0)), Ordering::Equal);
    assert_eq!(compare_bson(&Bson::Int64(2), &Bson::Int32(3)), Ordering::Less);
    assert_eq!(compare_bson(&Bson::String("b".into()), &Bson::String("a".into())), Ordering::Greater);
}

#[test]
fn display_and_kind_names() {
    let c = ColumnCondition::and([
        ColumnCondition::greater_than("age", 10).unwrap(),
        ColumnCondition::equals("name", "Ada").unwrap().negate(),
    ])
    .unwrap();
    let text = c.to_string();
    assert!(text.starts_with('(') && text.contains("NOT"), "{text}");
    assert_eq!("greater_equals_than".parse::<ConditionKind>().unwrap(), ConditionKind::GreaterEqualsThan);
    assert!("nope".parse::<ConditionKind>().is_err());
}

#[test]
fn sub_documents_match_structurally() {
    let e = ColumnEntity::from_document("P", doc! {"addr": {"city": "London", "zip": 1}}).unwrap();
    let london = doc! {"zip": 1, "city": "London"};
    let paris = doc! {"city": "Paris", "zip": 1};
    assert!(eval_condition(&e, &ColumnCondition::equals("addr", london.clone()).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::equals("addr", paris.clone()).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::is_in("addr", [paris.clone()]).unwrap()));
    assert!(eval_condition(&e, &ColumnCondition::is_in("addr", [paris.clone(), london]).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::between("addr", [paris.clone(), paris]).unwrap()));
}

#[test]
fn object_ids_compare_by_value() {
    let a = ObjectId::from_bytes([1; 12]);
    let b = ObjectId::from_bytes([2; 12]);
    let e = ColumnEntity::from_document("P", doc! {"id": a}).unwrap();
    assert!(eval_condition(&e, &ColumnCondition::equals("id", a).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::equals("id", b).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::greater_equals("id", b).unwrap()));
    assert!(eval_condition(&e, &ColumnCondition::lesser_than("id", b).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::is_in("id", [b]).unwrap()));
}

#[test]
fn datetimes_compare_chronologically() {
    let t = DateTime::from_millis(1_700_000_000_000);
    let e = ColumnEntity::from_document("P", doc! {"at": t}).unwrap();
    let before = DateTime::from_millis(1_600_000_000_000);
    let after = DateTime::from_millis(1_800_000_000_000);
    assert!(eval_condition(&e, &ColumnCondition::greater_than("at", before).unwrap()));
    assert!(eval_condition(&e, &ColumnCondition::between("at", [before, after]).unwrap()));
    assert!(!eval_condition(&e, &ColumnCondition::equals("at", after).unwrap()));
    assert_eq!(compare_bson(&Bson::DateTime(before), &Bson::DateTime(t)), Ordering::Less);
}

#[test]
fn document_operands_keep_eq_and_hash_consistent() {
    let a = ColumnCondition::equals("d", doc! {"x": 1, "y": 2}).unwrap();
    let b = ColumnCondition::equals("d", doc! {"y": 2, "x": 1}).unwrap();
    assert_eq!(a, b);
    let set: HashSet<ColumnCondition> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
    let c = ColumnCondition::equals("d", doc! {"x": 1, "y": 3}).unwrap();
    assert!(!set.contains(&c));
}
