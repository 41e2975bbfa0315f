//! Row Processing Tests
//!
//! Tests for row processor invariants:
//! - Filters gate rows with AND semantics; projection keeps requested order
//! - Aggregates emit one synthetic row per batch with the aggregate row-id
//! - Deleted rows are neither evaluated nor projected
//! - Output batches are well-formed even when empty

use std::collections::BTreeSet;

use aerotab::executor::{RowFilter, RowProcessor, AGGREGATE_ROW_ID};
use aerotab::predicate::parse_predicates;
use aerotab::schema::{Schema, Value};
use aerotab::storage::{null_bits_for, RowBatchBuilder, RowBatchView};

const DATA: &str = "0 3 1 0 ORDERKEY\n1 4 0 0 QUANTITY\n2 14 0 0 SHIPDATE\n3 15 0 1 COMMENT\n";

// =============================================================================
// Helper Functions
// =============================================================================

fn make_schema() -> Schema {
    Schema::parse(DATA).unwrap()
}

/// Three rows: quantities 10, 20, 30; row 1 has a null comment
fn make_batch(deleted: &[usize]) -> Vec<u8> {
    let schema = make_schema();
    let mut b = RowBatchBuilder::new("tpch", "lineitem", DATA);
    let rows = [
        (500, 1, 10, "1995-01-01", Some("first")),
        (501, 2, 20, "1995-02-01", None),
        (502, 3, 30, "1995-03-01", Some("third")),
    ];
    for (rid, key, qty, date, comment) in rows {
        let cells = vec![
            Value::Int32(key),
            Value::Int64(qty),
            Value::Date(date.to_string()),
            comment.map_or(Value::Null, |c| Value::String(c.to_string())),
        ];
        b.push_row(rid, &null_bits_for(&schema, &cells), &cells);
    }
    for d in deleted {
        b.mark_deleted(*d);
    }
    b.finish()
}

fn make_filter(preds: &str) -> RowFilter {
    let schema = make_schema();
    RowFilter::new(&schema, parse_predicates(&schema, preds).unwrap(), Vec::new()).unwrap()
}

fn run(projection: &str, preds: &str, deleted: &[usize]) -> (Vec<(i64, Vec<Value>)>, usize) {
    let data = make_schema();
    let query = data.project(projection).unwrap();
    let bytes = make_batch(deleted);
    let view = RowBatchView::decode(&bytes).unwrap();
    let processor = RowProcessor::new(&data, &query).unwrap();
    let (out, scanned) = processor.process(&view, &mut make_filter(preds), None).unwrap();
    let rows = out.rows().unwrap().into_iter().map(|r| (r.rid, r.cells)).collect();
    (rows, scanned)
}

// =============================================================================
// Filter and Projection
// =============================================================================

/// 3 rows, 2 of 4 columns, one filter matching row 2 only.
#[test]
fn test_single_match_projected() {
    let data = make_schema();
    let query = data.project("COMMENT,QUANTITY").unwrap();
    let bytes = make_batch(&[]);
    let view = RowBatchView::decode(&bytes).unwrap();
    let processor = RowProcessor::new(&data, &query).unwrap();

    let (out, _) = processor
        .process(&view, &mut make_filter("|QUANTITY,eq,30|"), None)
        .unwrap();
    assert_eq!(out.nrows(), 1);

    let out_view = out.view().unwrap();
    assert_eq!(out_view.deleted(), &[false]);
    assert_eq!(Schema::parse(out_view.schema_string()).unwrap().len(), 2);

    let rows = out.rows().unwrap();
    assert_eq!(rows[0].rid, 502);
    assert_eq!(
        rows[0].cells,
        vec![Value::String("third".into()), Value::Int64(30)]
    );
}

/// Filters combine with AND in list order.
#[test]
fn test_filters_are_conjunctive() {
    let (rows, scanned) = run("ORDERKEY", "|QUANTITY,geq,20|SHIPDATE,lt,1995-03-01|", &[]);
    assert_eq!(scanned, 3);
    assert_eq!(rows, vec![(501, vec![Value::Int32(2)])]);
}

/// Null cells fail every filter and project as null.
#[test]
fn test_null_cells() {
    let (rows, _) = run("COMMENT", "|COMMENT,like,.*|", &[]);
    let rids: Vec<i64> = rows.iter().map(|(rid, _)| *rid).collect();
    assert_eq!(rids, vec![500, 502]);

    let (rows, _) = run("COMMENT", "|ORDERKEY,eq,2|", &[]);
    assert_eq!(rows, vec![(501, vec![Value::Null])]);
}

#[test]
fn test_no_match_yields_empty_batch() {
    let (rows, scanned) = run("*", "|ORDERKEY,gt,3|", &[]);
    assert!(rows.is_empty());
    assert_eq!(scanned, 3);
}

// =============================================================================
// Aggregates
// =============================================================================

/// sum over {10,20,30} is one row of 60 under the aggregate row-id.
#[test]
fn test_sum_emits_single_row() {
    let (rows, _) = run("*", "|QUANTITY,sum,0|", &[]);
    assert_eq!(rows, vec![(AGGREGATE_ROW_ID, vec![Value::Int64(60)])]);
}

/// cnt over 3 rows with 2 passing is 2.
#[test]
fn test_count_over_passing_rows() {
    let (rows, _) = run("*", "|QUANTITY,gt,10|QUANTITY,cnt,0|", &[]);
    assert_eq!(rows, vec![(AGGREGATE_ROW_ID, vec![Value::UInt64(2)])]);
}

/// min and max start from their literals and move independently.
#[test]
fn test_min_and_max_together() {
    let (rows, _) = run("*", "|QUANTITY,min,1000|QUANTITY,max,0|", &[]);
    assert_eq!(
        rows,
        vec![(AGGREGATE_ROW_ID, vec![Value::Int64(10), Value::Int64(30)])]
    );
}

/// Aggregate output names each column after its operator.
#[test]
fn test_aggregate_schema_names() {
    let data = make_schema();
    let bytes = make_batch(&[]);
    let view = RowBatchView::decode(&bytes).unwrap();
    let processor = RowProcessor::new(&data, &data).unwrap();
    let (out, _) = processor
        .process(&view, &mut make_filter("|QUANTITY,sum,0|ORDERKEY,cnt,0|"), None)
        .unwrap();

    let schema = Schema::parse(out.schema_string()).unwrap();
    assert_eq!(schema.names(), vec!["sum_QUANTITY", "cnt_ORDERKEY"]);
}

// =============================================================================
// Deleted Rows
// =============================================================================

/// A deleted row is excluded from evaluation and projection.
#[test]
fn test_deleted_row_excluded() {
    let (rows, scanned) = run("ORDERKEY", "*", &[1]);
    assert_eq!(scanned, 2);
    let rids: Vec<i64> = rows.iter().map(|(rid, _)| *rid).collect();
    assert_eq!(rids, vec![500, 502]);

    let (rows, _) = run("*", "|QUANTITY,sum,0|", &[1]);
    assert_eq!(rows, vec![(AGGREGATE_ROW_ID, vec![Value::Int64(40)])]);
}

/// A deleted row named by a read plan is still skipped.
#[test]
fn test_deleted_row_in_subset() {
    let data = make_schema();
    let bytes = make_batch(&[0]);
    let view = RowBatchView::decode(&bytes).unwrap();
    let processor = RowProcessor::new(&data, &data).unwrap();

    let subset: BTreeSet<u32> = [0, 2].into_iter().collect();
    let (out, scanned) = processor
        .process(&view, &mut make_filter("*"), Some(&subset))
        .unwrap();
    assert_eq!(scanned, 1);
    assert_eq!(out.rows().unwrap()[0].rid, 502);
}

/// A plan position past the batch is fatal.
#[test]
fn test_position_out_of_bounds() {
    let data = make_schema();
    let bytes = make_batch(&[]);
    let view = RowBatchView::decode(&bytes).unwrap();
    let processor = RowProcessor::new(&data, &data).unwrap();

    let subset: BTreeSet<u32> = [3].into_iter().collect();
    let err = processor
        .process(&view, &mut make_filter("*"), Some(&subset))
        .unwrap_err();
    assert_eq!(err.code(), "TAB_ROW_INDEX_OOB");
    assert!(err.is_fatal());
}
