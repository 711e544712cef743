use std::fs;

use csv_transform::{PipelineError, PipelineOptions, Recipe, RowPipeline};

#[test]
fn recipe_file_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");

    let recipe = Recipe::from_path("tests/fixtures/recipe.json").unwrap();
    assert_eq!(recipe.skip_rows, 2);
    let written = recipe
        .run("tests/fixtures/report_with_preamble.csv", &out, &PipelineOptions::default())
        .unwrap();

    assert_eq!(written, 3);
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "id,name,points,source\n1,ADA,98.5,q1\n2,,91,q1\n3,LINUS,77,q1\n"
    );
}

#[test]
fn recipe_registration_error_stops_before_reading() {
    let recipe = Recipe::from_json(
        r#"{"steps": [
            {"op": "add", "name": "k", "value": "x"},
            {"op": "mutate", "function": "upper", "col": "nope"}
        ]}"#,
    )
    .unwrap();
    let mut p = RowPipeline::open("tests/fixtures/people.csv").unwrap();
    let err = recipe.apply(&mut p).unwrap_err();
    assert!(matches!(err, PipelineError::UnknownColumn { column } if column == "nope"));
    // Steps before the failing one stay registered.
    assert_eq!(p.transforms().len(), 1);
    assert_eq!(p.row_number(), 1);
}

#[test]
fn recipe_with_semicolon_dialect() {
    let recipe = Recipe::from_json(
        r#"{"format": {"delimiter": ";"}, "steps": [{"op": "select", "columns": ["b"]}]}"#,
    )
    .unwrap();
    let options = recipe.options().unwrap();
    let mut p = RowPipeline::from_reader("a;b\n1;2\n".as_bytes(), &options).unwrap();
    recipe.apply(&mut p).unwrap();
    let out = p.write_to_writer(Vec::new()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "b\n2\n");
}
