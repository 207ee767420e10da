//! Tests for the quote-aware and regex tokenizers.

use super::source;
use crate::error::ParseError;
use crate::tokenizer::dialect::{Dialect, QuotingMode};
use crate::tokenizer::{DelimitedTokenizer, RegexTokenizer, RowTokenizer};

fn dialect(delim: char) -> Dialect {
    Dialect::default().with_delimiter(delim)
}

fn tokenize_all(text: &str, dialect: Dialect) -> Vec<Vec<String>> {
    let mut tok = DelimitedTokenizer::new(source(text), dialect).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = tok.next_row().unwrap() {
        rows.push(row);
    }
    rows
}

#[test]
fn test_simple_split() {
    let rows = tokenize_all("a,b,c\n1,2,3\n", dialect(','));
    assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
}

#[test]
fn test_empty_fields_preserved() {
    let rows = tokenize_all("a,,c\n,,\n", dialect(','));
    assert_eq!(rows[0], vec!["a", "", "c"]);
    assert_eq!(rows[1], vec!["", "", ""]);
}

#[test]
fn test_quoted_field_with_delimiter() {
    let rows = tokenize_all("\"a,b\",c\n", dialect(','));
    assert_eq!(rows[0], vec!["a,b", "c"]);
}

#[test]
fn test_doubled_quote_is_literal() {
    let rows = tokenize_all("\"say \"\"hi\"\"\",x\n", dialect(','));
    assert_eq!(rows[0], vec!["say \"hi\"", "x"]);
}

#[test]
fn test_quote_inside_unquoted_field_is_literal() {
    let rows = tokenize_all("a\"b,c\n", dialect(','));
    assert_eq!(rows[0], vec!["a\"b", "c"]);
}

#[test]
fn test_escape_char() {
    let d = Dialect {
        escape_char: Some('\\'),
        ..dialect(',')
    };
    let rows = tokenize_all("a\\,b,c\n", d);
    assert_eq!(rows[0], vec!["a,b", "c"]);
}

#[test]
fn test_skip_initial_space() {
    let d = Dialect {
        skip_initial_space: true,
        ..dialect(',')
    };
    let rows = tokenize_all("a,  b, c\n", d);
    assert_eq!(rows[0], vec!["a", "b", "c"]);
}

#[test]
fn test_quoting_none_treats_quotes_as_data() {
    let d = Dialect {
        quoting: QuotingMode::None,
        ..dialect(',')
    };
    let rows = tokenize_all("\"a,b\",c\n", d);
    assert_eq!(rows[0], vec!["\"a", "b\"", "c"]);
}

#[test]
fn test_unterminated_quote_is_fatal() {
    let mut tok = DelimitedTokenizer::new(source("a,\"broken\nrest,of\n"), dialect(',')).unwrap();
    let err = tok.next_row().unwrap_err();
    match err {
        ParseError::UnterminatedField { line } => assert_eq!(line, 1),
        other => panic!("expected UnterminatedField, got {:?}", other),
    }
}

#[test]
fn test_missing_delimiter_rejected() {
    let result = DelimitedTokenizer::new(source("a,b\n"), Dialect::default());
    assert!(matches!(result, Err(ParseError::Configuration { .. })));
}

#[test]
fn test_crlf_terminators_stripped() {
    let rows = tokenize_all("a,b\r\n1,2\r\n", dialect(','));
    assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
}

#[test]
fn test_regex_separator() {
    let mut tok = RegexTokenizer::new(source("1   2\t3\n4 5  6\n"), r"\s+").unwrap();
    assert_eq!(tok.next_row().unwrap().unwrap(), vec!["1", "2", "3"]);
    assert_eq!(tok.next_row().unwrap().unwrap(), vec!["4", "5", "6"]);
    assert!(tok.next_row().unwrap().is_none());
}

#[test]
fn test_regex_separator_trims_lines() {
    let mut tok = RegexTokenizer::new(source("  a :: b  \n"), r"\s*::\s*").unwrap();
    assert_eq!(tok.next_row().unwrap().unwrap(), vec!["a", "b"]);
}
