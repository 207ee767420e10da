//! End-to-end tests for the reader pipeline.

use std::sync::Arc;

use super::{reader, rows};
use crate::error::ParseError;
use crate::options::{
    ColumnRef, Converter, DateGroup, DateSpec, HeaderSpec, IndexSpec, NaValues, Options,
};
use crate::reader::TextReader;
use crate::value::{Column, ColumnKey, RowIndex};

fn keys(names: &[&str]) -> Vec<ColumnKey> {
    names.iter().map(|s| ColumnKey::from(*s)).collect()
}

#[test]
fn test_basic_typed_parse() {
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a,b,c\n1,2,x\n4,5,y\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["a", "b", "c"]));
    assert_eq!(result.index, RowIndex::Range(2));
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 4])));
    assert_eq!(result.column("b"), Some(&Column::Int(vec![2, 5])));
    assert_eq!(
        result.column("c"),
        Some(&Column::Text(vec![Some("x".to_string()), Some("y".to_string())]))
    );
}

#[test]
fn test_sniffed_semicolon_delimiter() {
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a;b\n1;2\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1])));
}

#[test]
fn test_from_rows_constructor() {
    let opts = Options::builder().build().unwrap();
    let mut r =
        TextReader::from_rows(rows(&[&["a", "b"], &["1", "2"]]), opts).unwrap();
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1])));
}

#[test]
fn test_headerless_with_names() {
    let opts = Options::builder()
        .header(HeaderSpec::None)
        .names(["a", "b"])
        .build()
        .unwrap();
    let mut r = reader("1,2\n3,4\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 3])));
}

#[test]
fn test_mangle_disabled_duplicates_survive() {
    let opts = Options::builder()
        .mangle_dupe_cols(false)
        .build()
        .unwrap();
    let mut r = reader("a,a,b\n1,2,3\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["a", "a", "b"]));
    // The later duplicate wins in the data mapping.
    assert_eq!(result.column("a"), Some(&Column::Int(vec![2])));
    assert_eq!(result.column("b"), Some(&Column::Int(vec![3])));
}

#[test]
fn test_implicit_leading_index() {
    // Data rows are one field wider than the header: the surplus leading
    // column becomes an unnamed index.
    let opts = Options::builder().build().unwrap();
    let mut r = reader("b,c\nx,1,2\ny,3,4\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["b", "c"]));
    assert_eq!(
        result.index,
        RowIndex::Single {
            name: None,
            values: Column::Text(vec![Some("x".to_string()), Some("y".to_string())]),
        }
    );
    assert_eq!(result.column("b"), Some(&Column::Int(vec![1, 3])));
}

#[test]
fn test_explicit_index_by_name() {
    let opts = Options::builder()
        .index_col(IndexSpec::Columns(vec!["id".into()]))
        .build()
        .unwrap();
    let mut r = reader("id,a\nx,1\ny,2\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["a"]));
    assert!(result.column("id").is_none());
    assert_eq!(
        result.index,
        RowIndex::Single {
            name: Some("id".to_string()),
            values: Column::Text(vec![Some("x".to_string()), Some("y".to_string())]),
        }
    );
}

#[test]
fn test_index_names_on_own_row() {
    // The row after the header carries only the index name; the data rows
    // are wider by exactly the header width.
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a,b\nidx\nr1,1,2\nr2,3,4\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(
        result.index,
        RowIndex::Single {
            name: Some("idx".to_string()),
            values: Column::Text(vec![Some("r1".to_string()), Some("r2".to_string())]),
        }
    );
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 3])));
}

#[test]
fn test_index_names_from_first_data_row() {
    // With date fusion the index is extracted after conversion, so the
    // dedicated index-name row reaches the materializer: a row whose empty
    // fields match the column count names the index levels instead of
    // contributing data.
    let text = "Y,M,D,v\ntime,,,,\n2020,1,15,5\n2020,2,1,6\n";
    let opts = Options::builder()
        .parse_dates(DateSpec::Named(vec![(
            "when".to_string(),
            vec!["Y".into(), "M".into(), "D".into()],
        )]))
        .index_col(IndexSpec::Columns(vec!["when".into()]))
        .has_index_names(true)
        .build()
        .unwrap();
    let mut r = reader(text, opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["v"]));
    assert_eq!(result.column("v"), Some(&Column::Int(vec![5, 6])));
    match result.index {
        RowIndex::Single { name, values } => {
            assert_eq!(name, Some("time".to_string()));
            match values {
                Column::DateTime(v) => {
                    assert_eq!(v.len(), 2);
                    assert_eq!(v[0].unwrap().date().to_string(), "2020-01-15");
                }
                other => panic!("expected DateTime index, got {:?}", other),
            }
        }
        other => panic!("expected Single index, got {:?}", other),
    }
}

#[test]
fn test_hierarchical_index() {
    let opts = Options::builder()
        .index_col(IndexSpec::Columns(vec![ColumnRef::Pos(0), ColumnRef::Pos(1)]))
        .build()
        .unwrap();
    let mut r = reader("y,m,v\n2020,1,10\n2020,2,20\n", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["v"]));
    match result.index {
        RowIndex::Multi { names, levels } => {
            assert_eq!(names, vec![Some("y".to_string()), Some("m".to_string())]);
            assert_eq!(levels[0], Column::Int(vec![2020, 2020]));
            assert_eq!(levels[1], Column::Int(vec![1, 2]));
        }
        other => panic!("expected Multi index, got {:?}", other),
    }
}

#[test]
fn test_multi_row_header() {
    let text = "c0,A,B\n,x,y\nidx,,\n1,10,20\n2,30,40\n";
    let opts = Options::builder()
        .header(HeaderSpec::Rows(vec![0, 1]))
        .index_col(IndexSpec::Columns(vec![ColumnRef::Pos(0)]))
        .build()
        .unwrap();
    let mut r = reader(text, opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(
        result.columns,
        vec![
            ColumnKey::Tuple(vec!["A".to_string(), "x".to_string()]),
            ColumnKey::Tuple(vec!["B".to_string(), "y".to_string()]),
        ]
    );
    assert_eq!(
        result.index,
        RowIndex::Single {
            name: Some("idx".to_string()),
            values: Column::Int(vec![1, 2]),
        }
    );
    assert_eq!(result.column("A"), Some(&Column::Int(vec![10, 30])));
}

#[test]
fn test_multi_row_header_extra_row_is_data() {
    // No index-name row here: the third line is data and must not be eaten.
    let text = "c0,A,B\n,x,y\nfoo,1,2\nbar,3,4\n";
    let opts = Options::builder()
        .header(HeaderSpec::Rows(vec![0, 1]))
        .index_col(IndexSpec::Columns(vec![ColumnRef::Pos(0)]))
        .build()
        .unwrap();
    let mut r = reader(text, opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.index.len(), 2);
    assert_eq!(result.column("A"), Some(&Column::Int(vec![1, 3])));
}

#[test]
fn test_field_count_error_reports_line() {
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a,b,c\n1,2\n", opts);
    let err = r.read(None).unwrap_err();
    match err {
        ParseError::FieldCount {
            expected,
            observed,
            line,
        } => {
            assert_eq!(expected, 3);
            assert_eq!(observed, 2);
            assert_eq!(line, 2);
        }
        other => panic!("expected FieldCount, got {:?}", other),
    }
}

#[test]
fn test_index_disabled_skips_field_count_check() {
    let opts = Options::builder()
        .index_col(IndexSpec::Disabled)
        .build()
        .unwrap();
    let mut r = reader("a,b,c\n1,2\n4,5,6\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.index, RowIndex::Range(2));
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 4])));
    // The short row is padded with an empty field, which reads as missing.
    assert_eq!(result.column("c").unwrap().na_count(), 1);
}

#[test]
fn test_chunked_reads() {
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a,b\n1,2\n3,4\n5,6\n", opts);

    let first = r.read(Some(2)).unwrap().unwrap();
    assert_eq!(first.column("a"), Some(&Column::Int(vec![1, 3])));

    let second = r.read(Some(2)).unwrap().unwrap();
    assert_eq!(second.column("a"), Some(&Column::Int(vec![5])));

    assert!(r.read(Some(2)).unwrap().is_none());
}

#[test]
fn test_skip_footer() {
    let opts = Options::builder().skip_footer(1).build().unwrap();
    let mut r = reader("a,b\n1,2\n3,4\ntrailer\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 3])));
}

#[test]
fn test_skip_footer_rejected_for_bounded_reads() {
    let opts = Options::builder().skip_footer(1).build().unwrap();
    let mut r = reader("a,b\n1,2\n", opts);
    assert!(matches!(
        r.read(Some(1)),
        Err(ParseError::Configuration { .. })
    ));
}

#[test]
fn test_skiprows_through_reader() {
    let opts = Options::builder().skiprows([1]).build().unwrap();
    let mut r = reader("a,b\njunk\n1,2\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1])));
}

#[test]
fn test_comment_lines_and_tails() {
    let opts = Options::builder().comment('#').build().unwrap();
    let mut r = reader("# preamble\na,b\n1,2 # note\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(result.column("b"), Some(&Column::Int(vec![2])));
}

#[test]
fn test_default_na_tokens_recognized() {
    let opts = Options::builder().build().unwrap();
    let mut r = reader("a,b\n1,NA\n2,\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 2])));
    let b = result.column("b").unwrap();
    assert_eq!(b.na_count(), 2);
    assert!(matches!(b, Column::Float(_)));
}

#[test]
fn test_custom_na_tokens() {
    let opts = Options::builder()
        .na_values(NaValues::Tokens(vec!["-999".to_string()]))
        .build()
        .unwrap();
    let mut r = reader("a\n1\n-999\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.column("a").unwrap().na_count(), 1);
}

#[test]
fn test_thousands_stripping_spares_date_sources() {
    let opts = Options::builder()
        .sep(";")
        .thousands(',')
        .parse_dates(DateSpec::Columns(vec![DateGroup::Single("d".into())]))
        .build()
        .unwrap();
    let mut r = reader("num;d;label\n1,234;1,234;x,y\n", opts);
    let result = r.read(None).unwrap().unwrap();

    // Stripped in the numeric column.
    assert_eq!(result.column("num"), Some(&Column::Int(vec![1234])));
    // Left intact in the date source, where it fails to parse and stays
    // missing rather than becoming the number 1234.
    assert_eq!(result.column("d"), Some(&Column::DateTime(vec![None])));
    // Non-numeric-shaped fields are never touched.
    assert_eq!(
        result.column("label"),
        Some(&Column::Text(vec![Some("x,y".to_string())]))
    );
}

#[test]
fn test_usecols_projection() {
    let opts = Options::builder().usecols(["a", "c"]).build().unwrap();
    let mut r = reader("a,b,c\n1,2,3\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "c"]));
    assert_eq!(result.column("c"), Some(&Column::Int(vec![3])));
    assert!(result.column("b").is_none());
}

#[test]
fn test_converter_output_is_text() {
    let upper: Converter = Arc::new(|v: &str| v.to_uppercase());
    let opts = Options::builder().converter("b", upper).build().unwrap();
    let mut r = reader("a,b\n1,x\n2,y\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(
        result.column("b"),
        Some(&Column::Text(vec![Some("X".to_string()), Some("Y".to_string())]))
    );
    // Other columns still get full inference.
    assert_eq!(result.column("a"), Some(&Column::Int(vec![1, 2])));
}

#[test]
fn test_date_fusion_named() {
    let opts = Options::builder()
        .parse_dates(DateSpec::Named(vec![(
            "date".to_string(),
            vec!["Y".into(), "M".into(), "D".into()],
        )]))
        .build()
        .unwrap();
    let mut r = reader("Y,M,D,val\n2020,1,2,5\n", opts);
    let result = r.read(None).unwrap().unwrap();

    // Fused column sits where its first source was; sources are gone.
    assert_eq!(result.columns, keys(&["date", "val"]));
    match result.column("date") {
        Some(Column::DateTime(v)) => {
            let dt = v[0].unwrap();
            assert_eq!(dt.to_string(), "2020-01-02 00:00:00");
        }
        other => panic!("expected DateTime, got {:?}", other),
    }
    assert_eq!(result.column("val"), Some(&Column::Int(vec![5])));
}

#[test]
fn test_date_fusion_keeps_sources_when_asked() {
    let opts = Options::builder()
        .parse_dates(DateSpec::Named(vec![(
            "date".to_string(),
            vec!["Y".into(), "M".into()],
        )]))
        .keep_date_col(true)
        .build()
        .unwrap();
    let mut r = reader("Y,M,val\n2020,3,5\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["date", "Y", "M", "val"]));
}

#[test]
fn test_date_fusion_name_collision_rejected() {
    let opts = Options::builder()
        .parse_dates(DateSpec::Named(vec![(
            "val".to_string(),
            vec!["Y".into(), "M".into()],
        )]))
        .build()
        .unwrap();
    let mut r = reader("Y,M,val\n2020,3,5\n", opts);
    assert!(matches!(r.read(None), Err(ParseError::DateFusion { .. })));
}

#[test]
fn test_date_fusion_unknown_source_rejected() {
    let opts = Options::builder()
        .parse_dates(DateSpec::Named(vec![(
            "date".to_string(),
            vec!["nope".into()],
        )]))
        .build()
        .unwrap();
    let mut r = reader("Y,M\n2020,3\n", opts);
    assert!(matches!(r.read(None), Err(ParseError::DateFusion { .. })));
}

#[test]
fn test_parse_dates_on_index() {
    let opts = Options::builder()
        .index_col(IndexSpec::Columns(vec!["date".into()]))
        .parse_dates(DateSpec::Index)
        .build()
        .unwrap();
    let mut r = reader("date,v\n2020-01-01,1\n2020-01-02,2\n", opts);
    let result = r.read(None).unwrap().unwrap();
    match result.index {
        RowIndex::Single { name, values } => {
            assert_eq!(name, Some("date".to_string()));
            assert!(matches!(values, Column::DateTime(_)));
            assert_eq!(values.na_count(), 0);
        }
        other => panic!("expected Single index, got {:?}", other),
    }
}

#[test]
fn test_empty_input_with_names() {
    let opts = Options::builder()
        .header(HeaderSpec::None)
        .names(["a", "b"])
        .build()
        .unwrap();
    let mut r = reader("", opts);

    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(result.index, RowIndex::Range(0));
    assert_eq!(result.row_count(), 0);

    assert!(r.read(None).unwrap().is_none());
}

#[test]
fn test_empty_input_with_names_and_index() {
    let opts = Options::builder()
        .header(HeaderSpec::None)
        .names(["id", "a"])
        .index_col(IndexSpec::Columns(vec!["id".into()]))
        .build()
        .unwrap();
    let mut r = reader("", opts);
    let result = r.read(None).unwrap().unwrap();

    assert_eq!(result.columns, keys(&["a"]));
    assert_eq!(
        result.index,
        RowIndex::Single {
            name: Some("id".to_string()),
            values: Column::Text(vec![]),
        }
    );
}

#[test]
fn test_empty_input_without_names_rejected() {
    let opts = Options::builder().build().unwrap();
    let result = TextReader::from_reader(std::io::Cursor::new(Vec::new()), opts);
    assert!(matches!(result, Err(ParseError::HeaderInference { .. })));
}

#[test]
fn test_regex_separator_through_reader() {
    let opts = Options::builder().sep(r"\s+").build().unwrap();
    let mut r = reader("a  b\n1   2\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["a", "b"]));
    assert_eq!(result.column("b"), Some(&Column::Int(vec![2])));
}

#[test]
fn test_fixed_width_through_reader() {
    let opts = Options::builder().fixed_width().build().unwrap();
    let mut r = reader("id  val\n1   2\n22  33\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["id", "val"]));
    assert_eq!(result.column("id"), Some(&Column::Int(vec![1, 22])));
    assert_eq!(result.column("val"), Some(&Column::Int(vec![2, 33])));
}

#[test]
fn test_widths_sugar() {
    let opts = Options::builder().widths([3, 3]).build().unwrap();
    let mut r = reader("ab cd \n12 34 \n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(result.columns, keys(&["ab", "cd"]));
    assert_eq!(result.column("ab"), Some(&Column::Int(vec![12])));
}

#[test]
fn test_true_false_values() {
    let opts = Options::builder()
        .true_values(["yes"])
        .false_values(["no"])
        .build()
        .unwrap();
    let mut r = reader("a\nyes\nno\n", opts);
    let result = r.read(None).unwrap().unwrap();
    assert_eq!(
        result.column("a"),
        Some(&Column::Bool(vec![Some(true), Some(false)]))
    );
}
