//! Reader orchestration: the text-to-table parsing pipeline.
//!
//! The pipeline is organized into logical components:
//! - [`buffer`] - FIFO lookahead buffering, skip/comment filtering
//! - [`header`] - header and hierarchical-column resolution
//! - [`index`] - row-index assignment and name cleaning
//!
//! [`TextReader`] wires them together with the tokenizers and the coercion
//! engine. It is driven by repeated external `read(n)` calls and holds only
//! the stream handle and the lookahead buffer between calls; each returned
//! chunk re-infers NA and column types independently, so dtype stability
//! across chunks is not guaranteed.

pub(crate) mod buffer;
pub(crate) mod header;
pub(crate) mod index;

#[cfg(test)]
pub mod tests;

use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use regex::Regex;
use tracing::{debug, info};

use crate::convert::{coerce_column, dates, text_na_scan, BoolTokens, NaProfile, PendingColumn};
use crate::error::{ParseError, Result};
use crate::options::{
    ColSpecs, ColumnRef, Converter, DateGroup, DateSpec, HeaderSpec, IndexSpec, Options,
};
use crate::tokenizer::{
    DelimitedTokenizer, FixedWidthTokenizer, LineSource, PresplitRows, RawRow, RegexTokenizer,
    RowTokenizer,
};
use crate::value::{Column, ColumnKey, ParseResult, RowIndex};

use buffer::RowBuffer;

/// Streaming parser turning delimited or fixed-width text into typed,
/// optionally multi-level-indexed columns.
///
/// Construction resolves the dialect (sniffing the delimiter if needed),
/// consumes the header rows through the lookahead buffer, and decides the
/// index assignment. Each [`read`](Self::read) call then materializes one
/// chunk as a fresh [`ParseResult`].
pub struct TextReader {
    opts: Options,
    buffer: RowBuffer,
    /// Positional column keys, index columns included (except when the
    /// index is implicit and has no keys of its own).
    orig_names: Vec<ColumnKey>,
    /// Pre-projection column count the field-count check validates against.
    num_original_columns: usize,
    /// Retained positions when a `usecols` projection is configured.
    col_indices: Option<Vec<usize>>,
    index_positions: Vec<usize>,
    index_names: Vec<Option<String>>,
    implicit_index: bool,
    index_disabled: bool,
    /// Date fusion present; index extraction must run on post-fusion
    /// columns.
    complex_dates: bool,
    /// Column positions exempt from thousands stripping (date-fusion
    /// inputs).
    no_thousands: HashSet<usize>,
    thousands_guard: Option<Regex>,
    na_profile: NaProfile,
    bool_tokens: BoolTokens,
    first_read: bool,
}

impl TextReader {
    /// Parse from any buffered line stream. The stream must already be
    /// decoded and decompressed.
    pub fn from_reader<R: BufRead + 'static>(reader: R, opts: Options) -> Result<Self> {
        let mut lines = LineSource::new(Box::new(reader));

        if let Some(specs) = &opts.colspecs {
            let explicit = match specs {
                ColSpecs::Explicit(s) => Some(s.clone()),
                ColSpecs::Infer => None,
            };
            let tokenizer =
                FixedWidthTokenizer::new(lines, explicit, opts.dialect.delimiter, opts.comment)?;
            return Self::build(Box::new(tokenizer), None, 0, opts);
        }

        if let Some(pattern) = &opts.sep_pattern {
            let tokenizer = RegexTokenizer::new(lines, pattern)?;
            return Self::build(Box::new(tokenizer), None, 0, opts);
        }

        if opts.dialect.delimiter.is_some() {
            let tokenizer = DelimitedTokenizer::new(lines, opts.dialect.clone())?;
            return Self::build(Box::new(tokenizer), None, 0, opts);
        }

        // Sniff the delimiter from the first usable line, then lock the
        // dialect for the rest of the stream.
        let mut opts = opts;
        let mut pos = 0usize;
        let mut delim = ',';
        let mut sniff_line: Option<String> = None;
        loop {
            if opts.skiprows.contains(&pos) {
                if lines.next_line()?.is_none() {
                    break;
                }
                pos += 1;
                continue;
            }
            match lines.next_line()? {
                Some(line) => {
                    pos += 1;
                    let visible = match opts.comment {
                        Some(marker) => line.split(marker).next().unwrap_or("").to_string(),
                        None => line.clone(),
                    };
                    if visible.trim().is_empty() {
                        continue;
                    }
                    delim = opts.dialect.sniff_delimiter(&visible);
                    sniff_line = Some(line);
                    break;
                }
                None => break,
            }
        }
        opts.dialect = opts.dialect.with_delimiter(delim);

        let dialect = opts.dialect.clone();
        let seeded = match &sniff_line {
            Some(line) => Some(DelimitedTokenizer::split_line(&dialect, delim, line, pos)?),
            None => None,
        };
        let tokenizer = DelimitedTokenizer::new(lines, dialect)?;
        Self::build(Box::new(tokenizer), seeded, pos, opts)
    }

    /// Parse from an in-memory sequence of pre-split rows.
    pub fn from_rows(rows: Vec<RawRow>, opts: Options) -> Result<Self> {
        Self::build(Box::new(PresplitRows::new(rows)), None, 0, opts)
    }

    fn build(
        tokenizer: Box<dyn RowTokenizer>,
        seeded: Option<RawRow>,
        pos: usize,
        opts: Options,
    ) -> Result<Self> {
        let mut buffer = RowBuffer::new(tokenizer, opts.skiprows.clone(), opts.comment);
        buffer.set_pos(pos);
        if let Some(row) = seeded {
            buffer.seed(row);
        }

        let resolution = header::infer_columns(&mut buffer, &opts)?;
        let mut num_original_columns = resolution.num_original_columns;
        let col_indices = resolution.col_indices;

        let mut index_positions: Vec<usize> = Vec::new();
        let mut index_names: Vec<Option<String>> = Vec::new();
        let multi_level = resolution.levels.len() > 1;
        let mut orig_names: Vec<ColumnKey>;

        if multi_level {
            let mut positions: Vec<usize> = Vec::new();
            if let IndexSpec::Columns(refs) = &opts.index_col {
                for r in refs {
                    match r {
                        ColumnRef::Pos(p) => positions.push(*p),
                        ColumnRef::Name(name) => {
                            return Err(ParseError::configuration(format!(
                                "index column '{}' must be a position with a multi-row header",
                                name
                            )))
                        }
                    }
                }
            }
            let header_rows = match &opts.header {
                HeaderSpec::Rows(rows) => rows.clone(),
                _ => Vec::new(),
            };
            let (keys, names) =
                header::extract_multi_indexer_columns(resolution.levels, &positions, &header_rows)?;
            num_original_columns = keys.len();
            orig_names = keys;
            index_names = names;
            index_positions = positions;
        } else {
            orig_names = resolution
                .levels
                .into_iter()
                .next()
                .unwrap_or_default()
                .into_iter()
                .map(ColumnKey::Scalar)
                .collect();
        }

        let index_disabled = matches!(opts.index_col, IndexSpec::Disabled);
        let complex_dates = opts.parse_dates.has_fused_columns();
        let mut implicit_index = false;

        if !complex_dates {
            // Peek up to two rows: detect an index-name row on its own
            // line, or an implicit leading index from a narrow header.
            let line = buffer.next_line()?;
            let next_line = buffer.next_line()?;

            let mut handled = false;
            if let Some(line) = &line {
                if let Some(next) = &next_line {
                    if next.len() == line.len() + num_original_columns {
                        // Column names and index names on different rows.
                        index_positions = (0..line.len()).collect();
                        index_names = line
                            .iter()
                            .map(|s| if s.is_empty() { None } else { Some(s.clone()) })
                            .collect();
                        let mut prepended: Vec<ColumnKey> =
                            line.iter().cloned().map(ColumnKey::Scalar).collect();
                        prepended.extend(orig_names.iter().cloned());
                        orig_names = prepended;
                        num_original_columns = next.len();
                        buffer.drop_front();
                        handled = true;
                    }
                }

                if !handled && !index_disabled {
                    let implicit_first = line.len().saturating_sub(num_original_columns);
                    if implicit_first > 0 {
                        implicit_index = true;
                        match &opts.index_col {
                            IndexSpec::None => {
                                index_positions = (0..implicit_first).collect();
                            }
                            IndexSpec::Columns(refs) => {
                                for r in refs {
                                    match r {
                                        ColumnRef::Pos(p) => index_positions.push(*p),
                                        ColumnRef::Name(name) => {
                                            return Err(ParseError::column_selection(format!(
                                                "index column '{}' cannot be matched by name \
                                                 against an implicit index",
                                                name
                                            )))
                                        }
                                    }
                                }
                            }
                            IndexSpec::Disabled => {}
                        }
                        index_names = vec![None; index_positions.len()];
                        handled = true;
                    }
                }
            }

            if !handled {
                if let IndexSpec::Columns(refs) = &opts.index_col {
                    let mut cols_copy = orig_names.clone();
                    let (names, positions) = index::clean_index_names(&mut cols_copy, refs)?;
                    if index_names.is_empty() {
                        index_names = names;
                    }
                    index_positions = positions;
                }
            }
        }

        let no_thousands = no_thousands_positions(&opts, &orig_names);
        let thousands_guard = match opts.thousands {
            Some(sep) => Some(Regex::new(&format!("[^-0-9{}.]", regex::escape(&sep.to_string())))?),
            None => None,
        };
        let na_profile = NaProfile::resolve(&opts.na_values, opts.keep_default_na);
        let bool_tokens = BoolTokens::resolve(&opts.true_values, &opts.false_values);

        debug!(
            columns = orig_names.len(),
            index_levels = index_positions.len(),
            implicit = implicit_index,
            "reader initialized"
        );

        Ok(Self {
            opts,
            buffer,
            orig_names,
            num_original_columns,
            col_indices,
            index_positions,
            index_names,
            implicit_index,
            index_disabled,
            complex_dates,
            no_thousands,
            thousands_guard,
            na_profile,
            bool_tokens,
            first_read: true,
        })
    }

    /// Resolved column keys, index columns included.
    pub fn column_keys(&self) -> &[ColumnKey] {
        &self.orig_names
    }

    /// Materialize the next `rows` logical rows (all remaining when
    /// `None`). Returns `Ok(None)` once the stream is exhausted after the
    /// first chunk; an empty input yields one empty-but-correctly-shaped
    /// result.
    pub fn read(&mut self, rows: Option<usize>) -> Result<Option<ParseResult>> {
        if rows.is_some() && self.opts.skip_footer > 0 {
            return Err(ParseError::configuration(
                "skip_footer is not supported for bounded chunked reads",
            ));
        }

        let mut content = self.buffer.get_lines(rows)?;
        if rows.is_none() && self.opts.skip_footer > 0 {
            let keep = content.len().saturating_sub(self.opts.skip_footer);
            content.truncate(keep);
        }
        // Comment truncation may leave wholly-empty rows; they carry no
        // fields and are suppressed.
        content.retain(|row| !row.is_empty());

        if content.is_empty() {
            if self.first_read {
                self.first_read = false;
                return Ok(Some(self.empty_result()));
            }
            return Ok(None);
        }
        self.first_read = false;

        let mut indexnamerow: Option<RawRow> = None;
        if self.opts.has_index_names {
            let empty_count = content[0].iter().filter(|f| f.is_empty()).count();
            if empty_count == self.orig_names.len() {
                indexnamerow = Some(content.remove(0));
            }
        }

        let alldata = self.rows_to_cols(content)?;
        let data = self.exclude_implicit_index(&alldata);
        let (columns, pending) = self.do_date_conversions(data)?;
        let typed = self.convert_data(pending);
        let (index, columns, data) = self.make_index(typed, &alldata, columns, indexnamerow)?;

        info!(
            rows = index.len(),
            columns = columns.len(),
            "materialized chunk"
        );
        Ok(Some(ParseResult {
            index,
            columns,
            data,
        }))
    }

    /// Validate field counts, transpose rows to columns, apply the usecols
    /// projection, and strip thousands separators.
    fn rows_to_cols(&self, content: Vec<RawRow>) -> Result<Vec<Vec<String>>> {
        let mut expected = self.num_original_columns;
        if self.implicit_index {
            expected += self.index_positions.len();
        }

        let width = content.iter().map(Vec::len).max().unwrap_or(0);
        if expected != width && !self.index_disabled {
            let mut bad = 0;
            for (i, row) in content.iter().enumerate() {
                bad = i;
                if row.len() != expected {
                    break;
                }
            }
            let line = (self.buffer.pos() + 1)
                .saturating_sub(content.len() - bad + self.opts.skip_footer);
            return Err(ParseError::FieldCount {
                expected,
                observed: width,
                line,
            });
        }

        let mut cols: Vec<Vec<String>> = vec![Vec::with_capacity(content.len()); width];
        for row in &content {
            for (i, col) in cols.iter_mut().enumerate() {
                col.push(row.get(i).cloned().unwrap_or_default());
            }
        }

        if let Some(indices) = &self.col_indices {
            let ic = if self.implicit_index {
                self.index_positions.len()
            } else {
                0
            };
            cols = cols
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i < ic || indices.contains(&(i - ic)))
                .map(|(_, c)| c)
                .collect();
        }

        if let (Some(guard), Some(sep)) = (&self.thousands_guard, self.opts.thousands) {
            let offset = if self.implicit_index {
                self.index_positions.len()
            } else {
                0
            };
            for (pos, col) in cols.iter_mut().enumerate() {
                if pos < offset || self.no_thousands.contains(&(pos - offset)) {
                    continue;
                }
                for value in col.iter_mut() {
                    if value.contains(sep) && !guard.is_match(value.trim()) {
                        *value = value.replace(sep, "");
                    }
                }
            }
        }

        Ok(cols)
    }

    /// Pair each column key with its array, skipping implicit-index
    /// positions which carry no key of their own.
    fn exclude_implicit_index(&self, alldata: &[Vec<String>]) -> Vec<(ColumnKey, Vec<String>)> {
        if self.implicit_index {
            let excluded: HashSet<usize> = self.index_positions.iter().copied().collect();
            let mut offset = 0;
            self.orig_names
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    while excluded.contains(&(i + offset)) {
                        offset += 1;
                    }
                    let values = alldata.get(i + offset).cloned().unwrap_or_default();
                    (key.clone(), values)
                })
                .collect()
        } else {
            self.orig_names
                .iter()
                .zip(alldata.iter())
                .map(|(key, values)| (key.clone(), values.clone()))
                .collect()
        }
    }

    /// Resolve a date-specification reference to a concrete column key.
    fn resolve_ref(&self, col_ref: &ColumnRef, order: &[ColumnKey]) -> Result<ColumnKey> {
        match col_ref {
            ColumnRef::Pos(p) => self.orig_names.get(*p).cloned().ok_or_else(|| {
                ParseError::date_fusion(format!(
                    "column position {} out of range in date specification",
                    p
                ))
            }),
            ColumnRef::Name(name) => order
                .iter()
                .find(|key| key.matches(name))
                .cloned()
                .ok_or_else(|| {
                    ParseError::date_fusion(format!(
                        "unresolved column '{}' in date specification",
                        name
                    ))
                }),
        }
    }

    /// Whether a scalar parse-dates reference points at an index column;
    /// those are converted during index aggregation instead.
    fn is_index_ref(&self, col_ref: &ColumnRef, key: &ColumnKey) -> bool {
        match col_ref {
            ColumnRef::Pos(p) => self.index_positions.contains(p),
            ColumnRef::Name(name) => {
                self.index_names
                    .iter()
                    .any(|n| n.as_deref() == Some(name.as_str()))
                    || self
                        .index_positions
                        .iter()
                        .any(|&p| self.orig_names.get(p) == Some(key))
            }
        }
    }

    /// Apply the date specification: in-place scalar conversions and
    /// multi-column fusion, updating the key ordering.
    fn do_date_conversions(
        &self,
        data: Vec<(ColumnKey, Vec<String>)>,
    ) -> Result<(Vec<ColumnKey>, HashMap<ColumnKey, PendingColumn>)> {
        let mut order: Vec<ColumnKey> = data.iter().map(|(k, _)| k.clone()).collect();
        let mut map: HashMap<ColumnKey, PendingColumn> = data
            .into_iter()
            .map(|(k, v)| (k, PendingColumn::Raw(v)))
            .collect();

        let mut fused_sources: Vec<ColumnKey> = Vec::new();
        match &self.opts.parse_dates {
            DateSpec::None | DateSpec::Index => {}
            DateSpec::Columns(groups) => {
                for group in groups {
                    match group {
                        DateGroup::Single(col_ref) => {
                            let key = self.resolve_ref(col_ref, &order)?;
                            if self.is_index_ref(col_ref, &key) {
                                continue;
                            }
                            let raw = map
                                .get(&key)
                                .ok_or_else(|| {
                                    ParseError::date_fusion(format!(
                                        "unresolved column '{}' in date specification",
                                        key
                                    ))
                                })?
                                .to_strings();
                            let na = self.na_profile.tokens_for(&key);
                            let parsed = dates::parse_date_column(
                                &raw,
                                na,
                                self.opts.dayfirst,
                                self.opts.date_parser.as_ref(),
                            );
                            map.insert(key, PendingColumn::Parsed(parsed));
                        }
                        DateGroup::Combine(refs) => {
                            self.fuse(refs, None, &mut order, &mut map, &mut fused_sources)?;
                        }
                    }
                }
            }
            DateSpec::Named(entries) => {
                for (name, refs) in entries {
                    self.fuse(refs, Some(name), &mut order, &mut map, &mut fused_sources)?;
                }
            }
        }

        if !self.opts.keep_date_col {
            for source in &fused_sources {
                map.remove(source);
                if let Some(i) = order.iter().position(|k| k == source) {
                    order.remove(i);
                }
            }
        }
        Ok((order, map))
    }

    /// Fuse the referenced source columns into one parsed temporal column,
    /// inserted at the position of the first source.
    fn fuse(
        &self,
        refs: &[ColumnRef],
        name: Option<&str>,
        order: &mut Vec<ColumnKey>,
        map: &mut HashMap<ColumnKey, PendingColumn>,
        fused_sources: &mut Vec<ColumnKey>,
    ) -> Result<()> {
        let mut keys = Vec::with_capacity(refs.len());
        let mut sources: Vec<Vec<String>> = Vec::with_capacity(refs.len());
        for col_ref in refs {
            let key = self.resolve_ref(col_ref, order)?;
            match map.get(&key) {
                Some(pending) => sources.push(pending.to_strings()),
                None => {
                    return Err(ParseError::date_fusion(format!(
                        "unresolved column '{}' in date specification",
                        key
                    )))
                }
            }
            keys.push(key);
        }
        if keys.is_empty() {
            return Err(ParseError::date_fusion(
                "date fusion entry references no columns",
            ));
        }

        let out_name = match name {
            Some(n) => n.to_string(),
            None => keys
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join("_"),
        };
        let out_key = ColumnKey::Scalar(out_name.clone());
        if map.contains_key(&out_key) {
            return Err(ParseError::date_fusion(format!(
                "date column '{}' already exists",
                out_name
            )));
        }

        let concatenated = dates::concat_date_cols(&sources);
        let na = self.na_profile.tokens_for(&keys[0]);
        let parsed = dates::parse_date_column(
            &concatenated,
            na,
            self.opts.dayfirst,
            self.opts.date_parser.as_ref(),
        );
        map.insert(out_key.clone(), PendingColumn::Parsed(parsed));

        let insert_at = order
            .iter()
            .position(|k| k == &keys[0])
            .unwrap_or(order.len());
        order.insert(insert_at, out_key);
        for key in keys {
            if !fused_sources.contains(&key) {
                fused_sources.push(key);
            }
        }
        Ok(())
    }

    /// Run converters, NA masking, and type inference for every column.
    fn convert_data(
        &self,
        pending: HashMap<ColumnKey, PendingColumn>,
    ) -> HashMap<ColumnKey, Column> {
        let converters = self.resolve_converters();

        pending
            .into_iter()
            .map(|(key, column)| {
                let typed = match column {
                    PendingColumn::Parsed(col) => col,
                    PendingColumn::Raw(values) => {
                        let na = self.na_profile.tokens_for(&key);
                        let (col, na_count) = match converters.get(&key) {
                            Some(converter) => {
                                let converted: Vec<String> =
                                    values.iter().map(|v| converter(v)).collect();
                                text_na_scan(&converted, na)
                            }
                            None => coerce_column(&values, na, &self.bool_tokens),
                        };
                        if self.opts.verbose && na_count > 0 {
                            info!("filled {} NA values in column {}", na_count, key);
                        }
                        col
                    }
                };
                (key, typed)
            })
            .collect()
    }

    fn resolve_converters(&self) -> HashMap<ColumnKey, Converter> {
        let mut resolved = HashMap::new();
        for (col_ref, converter) in &self.opts.converters {
            let key = match col_ref {
                ColumnRef::Pos(p) => self.orig_names.get(*p).cloned(),
                ColumnRef::Name(name) => Some(
                    self.orig_names
                        .iter()
                        .find(|k| k.matches(name))
                        .cloned()
                        .unwrap_or_else(|| ColumnKey::Scalar(name.clone())),
                ),
            };
            if let Some(key) = key {
                resolved.insert(key, converter.clone());
            }
        }
        resolved
    }

    /// Whether index level `slot` should be parsed as dates during
    /// aggregation.
    fn should_parse_dates(&self, slot: usize) -> bool {
        match &self.opts.parse_dates {
            DateSpec::None | DateSpec::Named(_) => false,
            DateSpec::Index => true,
            DateSpec::Columns(groups) => groups.iter().any(|g| match g {
                DateGroup::Single(ColumnRef::Pos(p)) => {
                    self.index_positions.get(slot) == Some(p)
                }
                DateGroup::Single(ColumnRef::Name(name)) => {
                    self.index_names.get(slot).map(Option::as_deref)
                        == Some(Some(name.as_str()))
                }
                DateGroup::Combine(_) => false,
            }),
        }
    }

    /// Extract the row index, removing index columns from the key sequence
    /// and the data mapping.
    fn make_index(
        &self,
        mut data: HashMap<ColumnKey, Column>,
        alldata: &[Vec<String>],
        mut columns: Vec<ColumnKey>,
        indexnamerow: Option<RawRow>,
    ) -> Result<(RowIndex, Vec<ColumnKey>, HashMap<ColumnKey, Column>)> {
        let nrows = alldata.first().map_or(0, Vec::len);
        let index_requested = !self.index_disabled
            && (!self.index_positions.is_empty()
                || (self.complex_dates
                    && matches!(self.opts.index_col, IndexSpec::Columns(_))));

        if !index_requested {
            return Ok((RowIndex::Range(nrows), columns, data));
        }

        let (levels, mut names) = if self.complex_dates {
            // Index refs resolve against post-fusion columns; extraction
            // pulls the already-typed arrays.
            let refs = match &self.opts.index_col {
                IndexSpec::Columns(refs) => refs,
                _ => return Ok((RowIndex::Range(nrows), columns, data)),
            };
            let pre_removal = columns.clone();
            let (names, positions) = index::clean_index_names(&mut columns, refs)?;
            let mut levels = Vec::with_capacity(positions.len());
            for &pos in &positions {
                let key = &pre_removal[pos];
                let col = data.remove(key).ok_or_else(|| {
                    ParseError::column_selection(format!(
                        "index column '{}' missing from materialized data",
                        key
                    ))
                })?;
                levels.push(col);
            }
            (levels, names)
        } else {
            let mut levels = Vec::with_capacity(self.index_positions.len());
            for (slot, &pos) in self.index_positions.iter().enumerate() {
                let raw = alldata.get(pos).cloned().unwrap_or_default();
                let name = self.index_names.get(slot).cloned().flatten();
                let na = match &name {
                    Some(n) => self.na_profile.tokens_for_name(n),
                    None => self.na_profile.global(),
                };
                let col = if self.should_parse_dates(slot) {
                    dates::parse_date_column(
                        &raw,
                        na,
                        self.opts.dayfirst,
                        self.opts.date_parser.as_ref(),
                    )
                } else {
                    coerce_column(&raw, na, &self.bool_tokens).0
                };
                levels.push(col);
            }

            if !self.implicit_index {
                // Explicit index columns leave both the key sequence and
                // the data mapping.
                for &pos in &self.index_positions {
                    if let Some(key) = self.orig_names.get(pos) {
                        data.remove(key);
                        if let Some(i) = columns.iter().position(|k| k == key) {
                            columns.remove(i);
                        }
                    }
                }
            }
            (levels, self.index_names.clone())
        };

        if let Some(row) = indexnamerow {
            let coffset = row.len().saturating_sub(columns.len());
            names = row[..coffset.min(row.len())]
                .iter()
                .map(|s| if s.is_empty() { None } else { Some(s.clone()) })
                .collect();
        }

        let index = build_row_index(levels, names);
        Ok((index, columns, data))
    }

    /// Empty-but-correctly-shaped result for an empty input: zero rows,
    /// correct column keys, index columns removed.
    fn empty_result(&self) -> ParseResult {
        let mut columns = self.orig_names.clone();
        let index = if self.index_disabled || self.index_positions.is_empty() {
            RowIndex::Range(0)
        } else {
            if !self.implicit_index {
                let mut positions = self.index_positions.clone();
                positions.sort_unstable_by(|a, b| b.cmp(a));
                for pos in positions {
                    if pos < columns.len() {
                        columns.remove(pos);
                    }
                }
            }
            build_row_index(
                vec![Column::Text(Vec::new()); self.index_positions.len()],
                self.index_names.clone(),
            )
        };
        let data = columns
            .iter()
            .map(|k| (k.clone(), Column::Text(Vec::new())))
            .collect();
        ParseResult {
            index,
            columns,
            data,
        }
    }
}

/// Column positions excluded from thousands stripping: every date-fusion
/// input, whose separators are not numeric grouping.
fn no_thousands_positions(opts: &Options, orig_names: &[ColumnKey]) -> HashSet<usize> {
    let mut positions = HashSet::new();
    let mut add = |col_ref: &ColumnRef| {
        match col_ref {
            ColumnRef::Pos(p) => {
                positions.insert(*p);
            }
            ColumnRef::Name(name) => {
                if let Some(p) = orig_names.iter().position(|k| k.matches(name)) {
                    positions.insert(p);
                }
            }
        };
    };

    match &opts.parse_dates {
        DateSpec::None | DateSpec::Index => {}
        DateSpec::Columns(groups) => {
            for group in groups {
                match group {
                    DateGroup::Single(r) => add(r),
                    DateGroup::Combine(refs) => refs.iter().for_each(&mut add),
                }
            }
        }
        DateSpec::Named(entries) => {
            for (_, refs) in entries {
                refs.iter().for_each(&mut add);
            }
        }
    }
    positions
}

fn build_row_index(mut levels: Vec<Column>, names: Vec<Option<String>>) -> RowIndex {
    if levels.len() == 1 {
        RowIndex::Single {
            name: names.into_iter().next().flatten(),
            values: levels.remove(0),
        }
    } else {
        let mut names = names;
        names.resize(levels.len(), None);
        RowIndex::Multi { names, levels }
    }
}
