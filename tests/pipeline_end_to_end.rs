use std::fs;

use csv_transform::{ColumnSelection, PipelineError, Predicate, RowError, RowPipeline, Value};

fn upper(v: &Value) -> Value {
    Value::from(v.to_string().to_uppercase())
}

fn not_empty(v: &Value) -> bool {
    !v.to_string().is_empty()
}

#[test]
fn transforms_people_fixture_into_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");

    let mut p = RowPipeline::open("tests/fixtures/people.csv").unwrap();
    p.add("k", "x").unwrap();
    p.mutate(upper, "name").unwrap();
    p.constraint(Predicate::new(not_empty), "name").unwrap();
    p.select(["name", "k"]).unwrap();

    let written = p.write_to_path(&out).unwrap();
    assert_eq!(written, 2);
    assert_eq!(fs::read_to_string(&out).unwrap(), "name,k\nADA,x\nGRACE,x\n");

    // Drained: further pulls report end of input.
    assert!(p.next_row().unwrap().is_none());
}

#[test]
fn every_row_matches_schema_width() {
    let mut p = RowPipeline::open("tests/fixtures/people.csv").unwrap();
    p.add("k", "x").unwrap();
    p.add_column("label", |v| Value::from(format!("{}#{}", v[0], v[1])), ["id", "name"])
        .unwrap();
    let width = p.schema().len();
    assert_eq!(width, 5);
    for row in p {
        let row = row.unwrap();
        assert_eq!(row.len(), width);
        assert_eq!(row[3], Value::from("x"));
    }
}

#[test]
fn skip_rows_then_constraint_reports_file_row_number() {
    let mut p = RowPipeline::open_skip("tests/fixtures/report_with_preamble.csv", 2).unwrap();
    assert_eq!(p.schema().names(), ["id", "name", "score"]);
    assert_eq!(p.row_number(), 3);
    p.constraint(Predicate::new(not_empty), ColumnSelection::All).unwrap();

    let first = p.next().unwrap().unwrap();
    assert_eq!(first[1], Value::from("Ada"));

    let err = p.next().unwrap().unwrap_err();
    let violation = err.constraint_violation().unwrap();
    assert_eq!(violation.column, "name");
    assert_eq!(violation.predicate, "not_empty");
    assert_eq!(violation.row, 5);
    assert_eq!(err.row(), Some(5));
}

#[test]
fn write_failure_keeps_rows_already_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("partial.csv");

    let mut p = RowPipeline::open_skip("tests/fixtures/report_with_preamble.csv", 2).unwrap();
    p.constraint(Predicate::new(not_empty), "name").unwrap();
    let err = p.write_to_path(&out).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Transform {
            row: 5,
            source: RowError::Constraint(_)
        }
    ));
    assert_eq!(fs::read_to_string(&out).unwrap(), "id,name,score\n1,Ada,98.5\n");
}

#[test]
fn open_missing_file_is_io_error() {
    let err = RowPipeline::open("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn registration_errors_surface_before_any_row_is_read() {
    let mut p = RowPipeline::open("tests/fixtures/people.csv").unwrap();
    let err = p.mutate(upper, "nonexistent").unwrap_err();
    assert_eq!(err.to_string(), "The column 'nonexistent' does not exist");
    assert!(p.constraint(Predicate::new(not_empty), ["id", "missing"]).is_err());
    assert!(p.select(["id", "missing"]).is_err());
    assert!(p.transforms().is_empty());
    assert!(p.constraints().is_empty());
    assert!(p.projection().is_none());
    assert_eq!(p.row_number(), 1);
}

#[test]
fn close_releases_the_source() {
    let p = RowPipeline::open("tests/fixtures/people.csv").unwrap();
    let file = p.close();
    drop(file);
}

#[test]
fn blank_lines_are_skipped_as_preamble_and_counted_in_row_numbers() {
    let mut p = RowPipeline::open_skip("tests/fixtures/blank_lines.csv", 2).unwrap();
    assert_eq!(p.schema().names(), ["id", "name"]);
    assert_eq!(p.row_number(), 3);
    p.constraint(Predicate::named("not_bob", |v| v.to_string() != "bob"), "name")
        .unwrap();

    let first = p.next().unwrap().unwrap();
    assert_eq!(first, vec![Value::from("1"), Value::from("ada")]);
    assert_eq!(p.row_number(), 4);

    let err = p.next().unwrap().unwrap_err();
    assert_eq!(err.row(), Some(6));
    assert_eq!(err.constraint_violation().unwrap().value, Value::from("bob"));
}

#[test]
fn blank_body_lines_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.csv");

    let mut p = RowPipeline::open_skip("tests/fixtures/blank_lines.csv", 2).unwrap();
    assert_eq!(p.write_to_path(&out).unwrap(), 2);
    assert_eq!(fs::read_to_string(&out).unwrap(), "id,name\n1,ada\n2,bob\n");
}
