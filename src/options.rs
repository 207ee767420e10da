//! Reader configuration and validation.
//!
//! All options are resolved once into an immutable [`Options`] value by
//! [`OptionsBuilder::build`], which rejects mutually exclusive or invalid
//! combinations before any row is read. Pipeline stages receive the resolved
//! value by reference and never mutate shared option state.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};
use crate::tokenizer::dialect::Dialect;

/// A column reference: by zero-based position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRef {
    Pos(usize),
    Name(String),
}

impl From<usize> for ColumnRef {
    fn from(pos: usize) -> Self {
        ColumnRef::Pos(pos)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

/// Which row(s) of the input carry column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderSpec {
    /// No header; names are supplied or synthesized.
    None,
    /// A single zero-based header row.
    Row(usize),
    /// Multiple header rows forming hierarchical column keys.
    Rows(Vec<usize>),
}

impl Default for HeaderSpec {
    fn default() -> Self {
        HeaderSpec::Row(0)
    }
}

/// Which columns form the row index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexSpec {
    /// No index requested; an implicit leading index may still be inferred.
    None,
    /// Explicit index columns, hierarchical when more than one.
    Columns(Vec<ColumnRef>),
    /// Force no index and bypass implicit-index inference and the
    /// field-count check.
    Disabled,
}

impl Default for IndexSpec {
    fn default() -> Self {
        IndexSpec::None
    }
}

/// Missing-value token configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NaValues {
    /// Universal default set only.
    Default,
    /// Extra global tokens, appended to the defaults unless suppressed.
    Tokens(Vec<String>),
    /// Per-column token overrides; unlisted columns use the default set.
    PerColumn(HashMap<String, Vec<String>>),
}

impl Default for NaValues {
    fn default() -> Self {
        NaValues::Default
    }
}

/// One date-fusion entry in a flat list specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateGroup {
    /// Parse a single column in place.
    Single(ColumnRef),
    /// Fuse several columns into one, named by joining sources with `_`.
    Combine(Vec<ColumnRef>),
}

/// Date parsing specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSpec {
    /// No date parsing.
    None,
    /// Parse index levels only.
    Index,
    /// Flat list of columns or column groups.
    Columns(Vec<DateGroup>),
    /// Mapping from output column name to source columns.
    Named(Vec<(String, Vec<ColumnRef>)>),
}

impl Default for DateSpec {
    fn default() -> Self {
        DateSpec::None
    }
}

impl DateSpec {
    /// Whether any entry fuses multiple columns or names its output, which
    /// changes when index extraction may run relative to fusion.
    pub(crate) fn has_fused_columns(&self) -> bool {
        match self {
            DateSpec::Named(entries) => !entries.is_empty(),
            DateSpec::Columns(groups) => {
                groups.iter().any(|g| matches!(g, DateGroup::Combine(_)))
            }
            _ => false,
        }
    }
}

/// Fixed-width column specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColSpecs {
    /// Infer half-open intervals from sample rows.
    Infer,
    /// Explicit half-open `[start, end)` character intervals.
    Explicit(Vec<(usize, usize)>),
}

/// A user converter applied to every raw value of one column.
///
/// Converter output is trusted as-is; numeric and boolean inference are
/// skipped for converted columns, while NA-token matching still applies to
/// the textual output.
pub type Converter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A caller-supplied date parser, applied scalar-by-scalar ahead of the
/// built-in parsing chain. Returning `None` falls through to the general
/// parser.
pub type DateParserFn = Arc<dyn Fn(&str) -> Option<NaiveDateTime> + Send + Sync>;

/// Fully-resolved, immutable reader configuration.
#[derive(Clone)]
pub struct Options {
    pub dialect: Dialect,
    /// Multi-character separator, treated as a regular expression.
    pub sep_pattern: Option<String>,
    pub header: HeaderSpec,
    /// Explicit column names, used instead of (or without) a header row.
    pub names: Option<Vec<String>>,
    /// Prefix for synthesized column names when there is no header.
    pub prefix: Option<String>,
    pub index_col: IndexSpec,
    /// Column projection by position or name.
    pub usecols: Option<Vec<ColumnRef>>,
    /// Zero-based physical line numbers to skip.
    pub skiprows: HashSet<usize>,
    /// Trailing rows to discard; full (unbounded) reads only.
    pub skip_footer: usize,
    pub na_values: NaValues,
    /// Append user NA tokens to the universal defaults rather than
    /// replacing them.
    pub keep_default_na: bool,
    pub true_values: Vec<String>,
    pub false_values: Vec<String>,
    pub converters: HashMap<ColumnRef, Converter>,
    pub parse_dates: DateSpec,
    /// Keep fused source columns alongside the derived column.
    pub keep_date_col: bool,
    /// Prefer day-first interpretation of ambiguous calendar strings.
    pub dayfirst: bool,
    pub date_parser: Option<DateParserFn>,
    /// Thousands separator stripped from numeric-shaped fields.
    pub thousands: Option<char>,
    /// Comment marker; the remainder of a line at or after it is dropped.
    pub comment: Option<char>,
    /// Suffix repeated column names as `name.1`, `name.2`, ...
    pub mangle_dupe_cols: bool,
    /// Fixed-width mode when present.
    pub colspecs: Option<ColSpecs>,
    /// Expect a dedicated index-name row after the header.
    pub has_index_names: bool,
    /// Log per-column NA substitution counts.
    pub verbose: bool,
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("dialect", &self.dialect)
            .field("sep_pattern", &self.sep_pattern)
            .field("header", &self.header)
            .field("names", &self.names)
            .field("index_col", &self.index_col)
            .field("usecols", &self.usecols)
            .field("skiprows", &self.skiprows)
            .field("skip_footer", &self.skip_footer)
            .field("na_values", &self.na_values)
            .field("keep_default_na", &self.keep_default_na)
            .field("parse_dates", &self.parse_dates)
            .field("thousands", &self.thousands)
            .field("comment", &self.comment)
            .field("mangle_dupe_cols", &self.mangle_dupe_cols)
            .field("colspecs", &self.colspecs)
            .field("converters", &self.converters.len())
            .finish_non_exhaustive()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            sep_pattern: None,
            header: HeaderSpec::default(),
            names: None,
            prefix: None,
            index_col: IndexSpec::default(),
            usecols: None,
            skiprows: HashSet::new(),
            skip_footer: 0,
            na_values: NaValues::default(),
            keep_default_na: true,
            true_values: Vec::new(),
            false_values: Vec::new(),
            converters: HashMap::new(),
            parse_dates: DateSpec::default(),
            keep_date_col: false,
            dayfirst: false,
            date_parser: None,
            thousands: None,
            comment: None,
            mangle_dupe_cols: true,
            colspecs: None,
            has_index_names: false,
            verbose: false,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Whether the reader runs in fixed-width mode.
    pub fn is_fixed_width(&self) -> bool {
        self.colspecs.is_some()
    }
}

/// Builder for [`Options`]; `build` performs all cross-option validation.
pub struct OptionsBuilder {
    opts: Options,
    widths: Option<Vec<usize>>,
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self {
            opts: Options::default(),
            widths: None,
        }
    }
}

impl OptionsBuilder {
    /// Field separator. A single character configures the quote-aware
    /// tokenizer; a longer string is compiled as a regular expression and
    /// splits trimmed lines without quote-awareness.
    pub fn sep(mut self, sep: &str) -> Self {
        let mut chars = sep.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                self.opts.dialect.delimiter = Some(c);
                self.opts.sep_pattern = None;
            }
            _ => {
                self.opts.sep_pattern = Some(sep.to_string());
                self.opts.dialect.delimiter = None;
            }
        }
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.opts.dialect = dialect;
        self
    }

    pub fn header(mut self, header: HeaderSpec) -> Self {
        self.opts.header = header;
        self
    }

    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.opts.prefix = Some(prefix.to_string());
        self
    }

    pub fn index_col(mut self, spec: IndexSpec) -> Self {
        self.opts.index_col = spec;
        self
    }

    pub fn usecols<I, R>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<ColumnRef>,
    {
        self.opts.usecols = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    /// Skip the first `n` physical lines.
    pub fn skiprows_count(mut self, n: usize) -> Self {
        self.opts.skiprows = (0..n).collect();
        self
    }

    /// Skip an explicit set of zero-based physical line numbers.
    pub fn skiprows<I: IntoIterator<Item = usize>>(mut self, rows: I) -> Self {
        self.opts.skiprows = rows.into_iter().collect();
        self
    }

    pub fn skip_footer(mut self, n: usize) -> Self {
        self.opts.skip_footer = n;
        self
    }

    pub fn na_values(mut self, na: NaValues) -> Self {
        self.opts.na_values = na;
        self
    }

    pub fn keep_default_na(mut self, keep: bool) -> Self {
        self.opts.keep_default_na = keep;
        self
    }

    pub fn true_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.true_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn false_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.false_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn converter<R: Into<ColumnRef>>(mut self, column: R, f: Converter) -> Self {
        self.opts.converters.insert(column.into(), f);
        self
    }

    pub fn parse_dates(mut self, spec: DateSpec) -> Self {
        self.opts.parse_dates = spec;
        self
    }

    pub fn keep_date_col(mut self, keep: bool) -> Self {
        self.opts.keep_date_col = keep;
        self
    }

    pub fn dayfirst(mut self, dayfirst: bool) -> Self {
        self.opts.dayfirst = dayfirst;
        self
    }

    pub fn date_parser(mut self, parser: DateParserFn) -> Self {
        self.opts.date_parser = Some(parser);
        self
    }

    pub fn thousands(mut self, sep: char) -> Self {
        self.opts.thousands = Some(sep);
        self
    }

    pub fn comment(mut self, marker: char) -> Self {
        self.opts.comment = Some(marker);
        self
    }

    pub fn mangle_dupe_cols(mut self, mangle: bool) -> Self {
        self.opts.mangle_dupe_cols = mangle;
        self
    }

    /// Fixed-width mode with explicit `[start, end)` intervals.
    pub fn colspecs<I: IntoIterator<Item = (usize, usize)>>(mut self, specs: I) -> Self {
        self.opts.colspecs = Some(ColSpecs::Explicit(specs.into_iter().collect()));
        self
    }

    /// Fixed-width mode with field widths; converted to cumulative colspecs.
    pub fn widths<I: IntoIterator<Item = usize>>(mut self, widths: I) -> Self {
        self.widths = Some(widths.into_iter().collect());
        self
    }

    /// Fixed-width mode with intervals inferred from sample rows.
    pub fn fixed_width(mut self) -> Self {
        self.opts.colspecs = Some(ColSpecs::Infer);
        self
    }

    pub fn has_index_names(mut self, has: bool) -> Self {
        self.opts.has_index_names = has;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.opts.verbose = verbose;
        self
    }

    /// Validate the combination and produce the immutable [`Options`].
    pub fn build(mut self) -> Result<Options> {
        if let Some(widths) = self.widths.take() {
            if matches!(self.opts.colspecs, Some(ColSpecs::Explicit(_))) {
                return Err(ParseError::configuration(
                    "cannot specify both 'colspecs' and 'widths'",
                ));
            }
            let mut specs = Vec::with_capacity(widths.len());
            let mut col = 0;
            for w in widths {
                specs.push((col, col + w));
                col += w;
            }
            self.opts.colspecs = Some(ColSpecs::Explicit(specs));
        }

        let opts = self.opts;

        if opts.dialect.line_terminator.is_some() {
            return Err(ParseError::configuration(
                "custom line terminators are not supported",
            ));
        }

        if opts.sep_pattern.is_some() && !opts.dialect.has_default_quoting() {
            return Err(ParseError::configuration(
                "quoting options are not supported with a multi-character separator",
            ));
        }

        if let HeaderSpec::Rows(ref rows) = opts.header {
            if rows.is_empty() {
                return Err(ParseError::configuration(
                    "multi-row header specification must not be empty",
                ));
            }
            if opts.names.is_some() {
                return Err(ParseError::configuration(
                    "cannot specify names with a multi-row header",
                ));
            }
            if opts.usecols.is_some() {
                return Err(ParseError::configuration(
                    "cannot specify usecols with a multi-row header",
                ));
            }
            if let IndexSpec::Columns(ref refs) = opts.index_col {
                if refs.iter().any(|r| matches!(r, ColumnRef::Name(_))) {
                    return Err(ParseError::configuration(
                        "index_col must only contain column positions with a multi-row header",
                    ));
                }
            }
        }

        Ok(opts)
    }
}
