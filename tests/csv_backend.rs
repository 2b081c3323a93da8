// Flat-file backend end to end, on temporary directories

use std::fs;
use std::path::Path;

use fluentdb::{col, CsvStore, DatabaseError, Executable, QueryBuilder, Row, Value};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn write_table(dir: &Path, table: &str, content: &str) {
    fs::write(dir.join(format!("{table}.csv")), content).unwrap();
}

fn read_table(dir: &Path, table: &str) -> String {
    fs::read_to_string(dir.join(format!("{table}.csv"))).unwrap()
}

fn names(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter()
        .map(|r| r.get(column).map(ToString::to_string).unwrap_or_default())
        .collect()
}

/// `name,job,age` with an empty job and an empty age.
fn people_store() -> (TempDir, CsvStore) {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "people",
        "name,job,age\nGustavo,chemist,\nMicah,rat,32\nJack,,29\n",
    );
    let store = CsvStore::open(dir.path());
    (dir, store)
}

fn salary_store() -> (TempDir, CsvStore) {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "staff",
        "first_name,last_name,age,salary\n\
         Ada,Lovelace,36,5200\n\
         Alan,Turing,41,4800\n\
         Grace,Hopper,52,6100\n\
         Edsger,Dijkstra,38,4300\n",
    );
    let store = CsvStore::open(dir.path());
    (dir, store)
}

#[tokio::test]
async fn test_filters_in_and_null() {
    let (_dir, store) = people_store();

    let rows = store
        .table("people")
        .select(["name"])
        .filter("job", ["chemist", "rat"])
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Gustavo", "Micah"]);
    assert_eq!(rows[0].len(), 1);

    let rows = store
        .table("people")
        .filter("job", Value::Null)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Jack"]);

    let rows = store
        .table("people")
        .filter_op("age", "!=", None::<&str>)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Micah", "Jack"]);
}

#[tokio::test]
async fn test_and_binds_tighter_than_or() {
    let (_dir, store) = people_store();

    // job = rat OR (job = chemist AND age IS NOT NULL)
    let rows = store
        .table("people")
        .filter("job", "rat")
        .or("job", "chemist")
        .and_op("age", "<>", Value::Null)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Micah"]);
}

#[tokio::test]
async fn test_comparisons_with_null_are_false() {
    let (_dir, store) = people_store();

    let rows = store
        .table("people")
        .filter_op("age", ">", 0)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Micah", "Jack"]);

    let rows = store
        .table("people")
        .filter_op("age", "<", 30)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Jack"]);
}

#[tokio::test]
async fn test_aggregates() {
    let (_dir, store) = people_store();

    assert_eq!(store.table("people").count(None).await.unwrap(), 3);
    assert_eq!(store.table("people").count(Some("age")).await.unwrap(), 2);
    assert_eq!(
        store
            .table("people")
            .filter("job", ["chemist", "rat"])
            .count(None)
            .await
            .unwrap(),
        2
    );
    assert_eq!(store.table("people").sum("age").await.unwrap(), Value::Integer(61));
    assert_eq!(
        store.table("people").avg("age", Some(1)).await.unwrap(),
        Some(Decimal::new(305, 1))
    );
    assert_eq!(store.table("people").min("name").await.unwrap(), Value::from("Gustavo"));
    assert_eq!(store.table("people").max("name").await.unwrap(), Value::from("Micah"));
    assert_eq!(store.table("people").max("age").await.unwrap(), Value::Integer(32));

    assert!(matches!(
        store.table("people").sum("name").await,
        Err(DatabaseError::TypeMismatch(_))
    ));
    assert!(matches!(
        store.table("people").sum("salary").await,
        Err(DatabaseError::UnknownColumn(_))
    ));
    assert!(matches!(
        store.table("people").avg("age", Some(101)).await,
        Err(DatabaseError::PrecisionOutOfRange(101))
    ));
}

#[tokio::test]
async fn test_aggregates_on_empty_match() {
    let (_dir, store) = people_store();

    let mut table = store.table("people");
    assert_eq!(table.filter("job", "teacher").count(None).await.unwrap(), 0);
    assert_eq!(table.filter("job", "teacher").sum("age").await.unwrap(), Value::Null);
    assert_eq!(table.filter("job", "teacher").avg("age", None).await.unwrap(), None);
}

#[tokio::test]
async fn test_order_desc_and_last() {
    let (_dir, store) = salary_store();

    let lowest = store
        .table("staff")
        .order_by(["salary"])
        .desc()
        .last()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lowest.get("last_name"), Some(&Value::from("Dijkstra")));

    let highest = store
        .table("staff")
        .order_by(["salary"])
        .desc()
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(highest.get("last_name"), Some(&Value::from("Hopper")));

    let ascending = store
        .table("staff")
        .select(["first_name"])
        .order_by(["salary"])
        .get()
        .await
        .unwrap();
    let mut descending = store
        .table("staff")
        .select(["first_name"])
        .order_by(["salary"])
        .desc()
        .get()
        .await
        .unwrap();
    descending.reverse();
    assert_eq!(ascending, descending);
    assert_eq!(names(&ascending, "first_name"), vec!["Edsger", "Alan", "Ada", "Grace"]);
}

#[tokio::test]
async fn test_limit_applies_after_sort() {
    let (_dir, store) = salary_store();

    let rows = store
        .table("staff")
        .select(["last_name"])
        .order_by(["age"])
        .desc()
        .limit(2)
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "last_name"), vec!["Hopper", "Turing"]);

    // Without order, desc reverses file order.
    let rows = store.table("staff").desc().limit(1).get().await.unwrap();
    assert_eq!(names(&rows, "last_name"), vec!["Dijkstra"]);
}

#[tokio::test]
async fn test_unknown_columns_fail_before_evaluation() {
    let (_dir, store) = people_store();

    for result in [
        store.table("people").select(["salary"]).get().await,
        store.table("people").filter("salary", 1).get().await,
        store.table("people").order_by(["salary"]).get().await,
    ] {
        assert!(matches!(result, Err(DatabaseError::UnknownColumn(c)) if c == "salary"));
    }
}

#[tokio::test]
async fn test_builder_errors_surface_on_terminal_call() {
    let (_dir, store) = people_store();
    let mut people = store.table("people");

    let err = people.or("job", "rat").get().await.unwrap_err();
    assert!(matches!(err, DatabaseError::CallOrderViolation(_)));

    let err = people.filter_op("age", "~", 1).get().await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidPredicateShape(_)));

    let err = people.filter("job", Vec::<String>::new()).get().await.unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidPredicateShape(_)));

    // Intent is neutral again.
    assert_eq!(people.get().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_table_names_cannot_escape_directory() {
    let (_dir, store) = people_store();

    for name in ["../people", "people.csv", "a/b", ""] {
        let err = store.table(name).get().await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidIdentifier(_)), "{name}");
    }
}

#[tokio::test]
async fn test_missing_table() {
    let (_dir, store) = people_store();
    let err = store.table("ghosts").get().await.unwrap_err();
    assert!(matches!(err, DatabaseError::TableNotFound(t) if t == "ghosts"));
}

#[tokio::test]
async fn test_insert_round_trip() {
    let (dir, store) = people_store();
    let mut people = store.table("people");

    let returned = people
        .returning(["name", "age"])
        .insert(vec![
            Row::new().with("name", "Lydia, Rodarte-Quayle").with("age", 40),
            Row::new().with("name", "Todd").with("job", ""),
        ])
        .await
        .unwrap();
    assert_eq!(returned.len(), 2);
    assert_eq!(returned[1].get("age"), Some(&Value::Null));

    let rows = people.get().await.unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[3].get("name"), Some(&Value::from("Lydia, Rodarte-Quayle")));
    assert_eq!(rows[3].get("age"), Some(&Value::from("40")));
    assert_eq!(rows[3].get("job"), Some(&Value::Null));
    assert_eq!(rows[4].get("job"), Some(&Value::from("")));

    assert!(read_table(dir.path(), "people").ends_with("\"Lydia, Rodarte-Quayle\",,40\nTodd,\"\",\n"));

    let err = people
        .insert_one(Row::new().with("salary", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(_)));
    assert!(matches!(
        people.insert(Vec::new()).await,
        Err(DatabaseError::NoValues(_))
    ));
}

#[tokio::test]
async fn test_insert_repairs_missing_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "notes", "id,text\n1,first");
    let store = CsvStore::open(dir.path());

    store
        .table("notes")
        .insert_one(Row::new().with("id", 2).with("text", "second"))
        .await
        .unwrap();
    assert_eq!(read_table(dir.path(), "notes"), "id,text\n1,first\n2,second\n");
}

#[tokio::test]
async fn test_update_and_delete_with_returning() {
    let (dir, store) = people_store();
    let mut people = store.table("people");

    let updated = people
        .filter("name", "Jack")
        .returning(["name", "job"])
        .update(Row::new().with("job", "mechanic"))
        .await
        .unwrap();
    assert_eq!(
        updated,
        vec![Row::new().with("name", "Jack").with("job", "mechanic")]
    );

    // No returning: nothing back, but the rows still change.
    let updated = people
        .filter_op("age", ">", 30)
        .update(Row::new().with("age", 33))
        .await
        .unwrap();
    assert!(updated.is_empty());

    let deleted = people
        .filter("job", "chemist")
        .returning(["name"])
        .delete()
        .await
        .unwrap();
    assert_eq!(names(&deleted, "name"), vec!["Gustavo"]);

    assert_eq!(
        read_table(dir.path(), "people"),
        "name,job,age\nMicah,rat,33\nJack,mechanic,29\n"
    );

    let err = people
        .filter("salary", 1)
        .delete()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(_)));
}

#[tokio::test]
async fn test_delete_without_filter_keeps_header() {
    let (dir, store) = people_store();
    store.table("people").delete().await.unwrap();

    assert_eq!(read_table(dir.path(), "people"), "name,job,age\n");
    assert_eq!(store.table("people").count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_add_and_remove_columns() {
    let (dir, store) = people_store();
    let mut people = store.table("people");

    people
        .alter(["nickname"])
        .alter_with_default("city", "Albuquerque")
        .add_columns()
        .await
        .unwrap();
    assert_eq!(
        read_table(dir.path(), "people").lines().next(),
        Some("name,job,age,nickname,city")
    );

    // New rows pick up the tracked default.
    people
        .insert_one(Row::new().with("name", "Hector"))
        .await
        .unwrap();
    let hector = people.filter("name", "Hector").first().await.unwrap().unwrap();
    assert_eq!(hector.get("city"), Some(&Value::from("Albuquerque")));
    assert_eq!(hector.get("nickname"), Some(&Value::Null));

    let columns = people.columns().await.unwrap();
    let city = columns.iter().find(|c| c.name == "city").unwrap();
    assert_eq!(city.default_value, Some(Value::from("Albuquerque")));

    let err = people.alter(["age"]).add_columns().await.unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateColumn(c) if c == "age"));
    let err = people.add_columns().await.unwrap_err();
    assert!(matches!(err, DatabaseError::NoValues(_)));

    people.alter(["nickname", "city"]).remove_columns().await.unwrap();
    assert_eq!(
        read_table(dir.path(), "people").lines().next(),
        Some("name,job,age")
    );
    let err = people.alter(["city"]).remove_columns().await.unwrap_err();
    assert!(matches!(err, DatabaseError::ColumnNotFound(_)));
}

#[tokio::test]
async fn test_create_exists_drop() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path());
    let mut orders = store.table("orders");

    assert!(!orders.exists().await.unwrap());
    orders.create(["id", "item"]).await.unwrap();
    assert!(orders.exists().await.unwrap());
    assert_eq!(read_table(dir.path(), "orders"), "id,item\n");
    assert!(orders.get().await.unwrap().is_empty());

    assert!(matches!(
        orders.create(["id"]).await,
        Err(DatabaseError::TableAlreadyExists(_))
    ));
    assert!(matches!(
        store.table("other").create(["id", "id"]).await,
        Err(DatabaseError::DuplicateColumn(_))
    ));
    assert!(matches!(
        store.table("other").create(["id", "unit price"]).await,
        Err(DatabaseError::InvalidIdentifier(c)) if c == "unit price"
    ));
    assert!(!store.table("other").exists().await.unwrap());

    orders.drop().await.unwrap();
    assert!(!orders.exists().await.unwrap());
    assert!(matches!(
        orders.drop().await,
        Err(DatabaseError::TableNotFound(_))
    ));
}

#[tokio::test]
async fn test_joins() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "people", "name,job_id\nWalter,1\nJesse,2\nSaul,9\n");
    write_table(dir.path(), "jobs", "id,name\n1,chemist\n2,cook\n3,lawyer\n");
    let store = CsvStore::open(dir.path());

    let rows = store
        .table("people")
        .select(["people.name", "jobs.name"])
        .inner_join_on("jobs", "jobs.id", col("people.job_id"))
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("jobs.name"), Some(&Value::from("chemist")));
    assert_eq!(rows[1].get("people.name"), Some(&Value::from("Jesse")));

    let rows = store
        .table("people")
        .left_join("jobs", |on| on.on("jobs.id", col("people.job_id")))
        .filter("name", "Saul")
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("jobs.name"), Some(&Value::Null));

    let rows = store
        .table("people")
        .right_join("jobs", |on| on.on("jobs.id", col("people.job_id")))
        .filter("jobs.name", "lawyer")
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::Null));

    let err = store
        .table("people")
        .inner_join_on("people", "people.name", col("people.name"))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::CallOrderViolation(_)));
}

#[tokio::test]
async fn test_custom_delimiter_and_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cities.tsv"), "city\tcountry\nOslo\tNorway\n").unwrap();
    let store = CsvStore::with_format(dir.path(), "tsv", '\t');

    let rows = store.table("cities").get().await.unwrap();
    assert_eq!(rows, vec![Row::new().with("city", "Oslo").with("country", "Norway")]);
}

#[tokio::test]
async fn test_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "broken", "a,b\n1,2,3\n");
    let store = CsvStore::open(dir.path());

    assert!(matches!(
        store.table("broken").get().await,
        Err(DatabaseError::MalformedFile { .. })
    ));
}

/// Micah has every field; the two Gustavo rows are missing job, and one
/// of them age as well.
fn gustavo_store() -> (TempDir, CsvStore) {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        dir.path(),
        "people",
        "name,job,age\nMicah,rat,29\nGustavo,,32\nGustavo,,\n",
    );
    let store = CsvStore::open(dir.path());
    (dir, store)
}

#[tokio::test]
async fn test_null_filters_and_aggregates_over_sparse_rows() {
    let (_dir, store) = gustavo_store();

    let rows = store
        .table("people")
        .filter("job", Value::Null)
        .and("age", Value::Null)
        .get()
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![Row::new()
            .with("name", "Gustavo")
            .with("job", Value::Null)
            .with("age", Value::Null)]
    );

    let rows = store
        .table("people")
        .filter("job", ["chemist", "rat"])
        .get()
        .await
        .unwrap();
    assert_eq!(names(&rows, "name"), vec!["Micah"]);

    assert_eq!(store.table("people").count(Some("age")).await.unwrap(), 2);
    assert_eq!(store.table("people").sum("age").await.unwrap(), Value::Integer(61));
    assert_eq!(store.table("people").min("name").await.unwrap(), Value::from("Gustavo"));
    assert_eq!(store.table("people").max("name").await.unwrap(), Value::from("Micah"));
}

#[tokio::test]
async fn test_qualified_write_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "people", "name,age\nMicah,29\n");
    let store = CsvStore::open(dir.path());
    let mut people = store.table("people");

    let err = people
        .filter("name", "Micah")
        .returning(["age"])
        .update(Row::new().with("people.age", 99))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "people.age"));

    let err = people
        .insert_one(Row::new().with("name", "Jesse").with("people.age", 25))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "people.age"));
    assert_eq!(read_table(dir.path(), "people"), "name,age\nMicah,29\n");

    // Qualified names still work where rows are only read.
    let updated = people
        .filter("people.name", "Micah")
        .returning(["people.age"])
        .update(Row::new().with("age", 30))
        .await
        .unwrap();
    assert_eq!(updated, vec![Row::new().with("people.age", 30)]);
    assert_eq!(read_table(dir.path(), "people"), "name,age\nMicah,30\n");
}

#[tokio::test]
async fn test_qualifier_must_name_a_queried_table() {
    let dir = tempfile::tempdir().unwrap();
    write_table(dir.path(), "people", "name,job_id\nWalter,1\n");
    write_table(dir.path(), "jobs", "id,title\n1,chemist\n");
    let store = CsvStore::open(dir.path());

    let err = store
        .table("people")
        .filter("nosuchtable.name", "Walter")
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "nosuchtable.name"));

    let rows = store
        .table("people")
        .filter("people.name", "Walter")
        .get()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    // `jobs` has no `name`; it must not fall through to people.name.
    let err = store
        .table("people")
        .inner_join_on("jobs", "jobs.id", col("people.job_id"))
        .filter("jobs.name", "Walter")
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "jobs.name"));

    let err = store
        .table("people")
        .inner_join_on("jobs", "jobs.id", col("people.id"))
        .get()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "people.id"));

    let err = store
        .table("people")
        .count(Some("jobs.title"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::UnknownColumn(c) if c == "jobs.title"));
}
