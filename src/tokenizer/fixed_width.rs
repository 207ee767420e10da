//! Fixed-width tokenizer.
//!
//! Fields are extracted via half-open `[start, end)` character intervals.
//! When intervals are not supplied they are inferred from up to 100 sample
//! lines: a union bitmap marks every character position that is occupied in
//! any sample row, and each maximal run of occupied positions becomes one
//! field's interval. Sampled lines are replayed before new reads, so
//! inference consumes no data.

use std::collections::VecDeque;

use tracing::debug;

use super::{LineSource, RawRow, RowTokenizer};
use crate::error::{ParseError, Result};

/// Number of lines sampled for interval inference.
const INFERENCE_SAMPLE_LINES: usize = 100;

pub struct FixedWidthTokenizer {
    lines: LineSource,
    /// Sampled lines awaiting replay, oldest first.
    replay: VecDeque<String>,
    colspecs: Vec<(usize, usize)>,
    /// Padding characters stripped from extracted fields and treated as
    /// unoccupied during inference.
    pad: Vec<char>,
}

impl FixedWidthTokenizer {
    /// Build a tokenizer with explicit or inferred column intervals.
    ///
    /// `delimiter`, when given, replaces the default padding set
    /// (`\n\r\t` and space) with `\r\n` plus that character. `comment`
    /// truncates sample lines during inference only; field-level comment
    /// handling happens downstream.
    pub fn new(
        mut lines: LineSource,
        colspecs: Option<Vec<(usize, usize)>>,
        delimiter: Option<char>,
        comment: Option<char>,
    ) -> Result<Self> {
        let pad = match delimiter {
            Some(d) => vec!['\r', '\n', d],
            None => vec!['\n', '\r', '\t', ' '],
        };

        let mut replay = VecDeque::new();
        let colspecs = match colspecs {
            Some(specs) => {
                for &(start, end) in &specs {
                    if end <= start {
                        return Err(ParseError::configuration(format!(
                            "invalid column specification [{}, {}): end must exceed start",
                            start, end
                        )));
                    }
                }
                specs
            }
            None => {
                let inferred = Self::detect_colspecs(&mut lines, &mut replay, &pad, comment)?;
                if inferred.is_empty() {
                    return Err(ParseError::configuration(
                        "could not infer fixed-width columns: no occupied positions in sample",
                    ));
                }
                debug!(columns = inferred.len(), "inferred fixed-width intervals");
                inferred
            }
        };

        Ok(Self {
            lines,
            replay,
            colspecs,
            pad,
        })
    }

    /// Inferred or supplied intervals, for inspection.
    pub fn colspecs(&self) -> &[(usize, usize)] {
        &self.colspecs
    }

    /// Sample up to [`INFERENCE_SAMPLE_LINES`] lines, mark occupied
    /// character positions across all of them, and return the maximal runs.
    fn detect_colspecs(
        lines: &mut LineSource,
        replay: &mut VecDeque<String>,
        pad: &[char],
        comment: Option<char>,
    ) -> Result<Vec<(usize, usize)>> {
        while replay.len() < INFERENCE_SAMPLE_LINES {
            match lines.next_line()? {
                Some(line) => replay.push_back(line),
                None => break,
            }
        }

        let mut mask: Vec<bool> = Vec::new();
        for line in replay.iter() {
            let visible: &str = match comment {
                Some(marker) => line.split(marker).next().unwrap_or(""),
                None => line,
            };
            for (i, c) in visible.chars().enumerate() {
                if pad.contains(&c) {
                    continue;
                }
                if i >= mask.len() {
                    mask.resize(i + 1, false);
                }
                mask[i] = true;
            }
        }

        let mut specs = Vec::new();
        let mut run_start = None;
        for (i, &occupied) in mask.iter().enumerate() {
            match (occupied, run_start) {
                (true, None) => run_start = Some(i),
                (false, Some(start)) => {
                    specs.push((start, i));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            specs.push((start, mask.len()));
        }
        Ok(specs)
    }

    fn extract(&self, line: &str) -> RawRow {
        let chars: Vec<char> = line.chars().collect();
        self.colspecs
            .iter()
            .map(|&(start, end)| {
                let start = start.min(chars.len());
                let end = end.min(chars.len());
                let raw: String = chars[start..end].iter().collect();
                raw.trim_matches(|c| self.pad.contains(&c)).to_string()
            })
            .collect()
    }
}

impl RowTokenizer for FixedWidthTokenizer {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        let line = match self.replay.pop_front() {
            Some(line) => Some(line),
            None => self.lines.next_line()?,
        };
        Ok(line.map(|l| self.extract(&l)))
    }
}
