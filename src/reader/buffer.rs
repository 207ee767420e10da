//! FIFO lookahead buffer over a row tokenizer.
//!
//! Header inference peeks rows through this buffer without consuming them;
//! once header consumption completes, the buffered remainder is replayed
//! before new rows are pulled from the tokenizer. "Already tokenized" and
//! "already consumed" are kept distinct on purpose.

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::tokenizer::{RawRow, RowTokenizer};

pub(crate) struct RowBuffer {
    tokenizer: Box<dyn RowTokenizer>,
    buf: VecDeque<RawRow>,
    /// Physical rows consumed from the source, skipped rows included.
    pos: usize,
    skiprows: HashSet<usize>,
    comment: Option<char>,
    exhausted: bool,
}

impl RowBuffer {
    pub fn new(
        tokenizer: Box<dyn RowTokenizer>,
        skiprows: HashSet<usize>,
        comment: Option<char>,
    ) -> Self {
        Self {
            tokenizer,
            buf: VecDeque::new(),
            pos: 0,
            skiprows,
            comment,
            exhausted: false,
        }
    }

    /// Physical position in the source, counting skipped rows.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Adjust the position after rows were consumed outside the buffer
    /// (delimiter sniffing consumes the first data line directly).
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buf.is_empty()
    }

    /// Push an externally tokenized row into the buffer (sniffed first
    /// line), applying the comment filter like any other row.
    pub fn seed(&mut self, row: RawRow) {
        let row = self.apply_comment(row);
        self.buf.push_back(row);
    }

    /// Drop fields at/after the comment marker; a field containing the
    /// marker is truncated and everything after it on the row is dropped.
    fn apply_comment(&self, row: RawRow) -> RawRow {
        let marker = match self.comment {
            Some(m) => m,
            None => return row,
        };
        let mut out = Vec::with_capacity(row.len());
        for field in row {
            match field.find(marker) {
                None => out.push(field),
                Some(at) => {
                    if at > 0 {
                        out.push(field[..at].to_string());
                    }
                    break;
                }
            }
        }
        out
    }

    /// Pull the next row from the tokenizer, honoring skiprows and the
    /// comment filter, without buffering it.
    fn pull(&mut self) -> Result<Option<RawRow>> {
        loop {
            if self.skiprows.contains(&self.pos) {
                if self.tokenizer.next_row()?.is_none() {
                    self.exhausted = true;
                    return Ok(None);
                }
                self.pos += 1;
                continue;
            }
            match self.tokenizer.next_row()? {
                Some(row) => {
                    self.pos += 1;
                    return Ok(Some(self.apply_comment(row)));
                }
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
            }
        }
    }

    /// Read the next row and keep it buffered for later replay.
    pub fn next_line(&mut self) -> Result<Option<RawRow>> {
        match self.pull()? {
            Some(row) => {
                self.buf.push_back(row.clone());
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    /// Front of the buffer, filling it if required; does not consume.
    pub fn buffered_line(&mut self) -> Result<Option<RawRow>> {
        if let Some(front) = self.buf.front() {
            return Ok(Some(front.clone()));
        }
        self.next_line()
    }

    /// Discard all buffered rows (header rows already consumed).
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Discard the oldest buffered row.
    pub fn drop_front(&mut self) {
        self.buf.pop_front();
    }

    /// Keep only the newest buffered row (a peeked row that turned out to
    /// be data rather than header).
    pub fn keep_only_last(&mut self) {
        if let Some(last) = self.buf.pop_back() {
            self.buf.clear();
            self.buf.push_back(last);
        }
    }

    /// Drain `rows` logical rows (or everything when unbounded), buffered
    /// remainder first, then the tokenizer.
    pub fn get_lines(&mut self, rows: Option<usize>) -> Result<Vec<RawRow>> {
        let mut lines: Vec<RawRow> = Vec::new();

        match rows {
            Some(want) => {
                while lines.len() < want {
                    if let Some(row) = self.buf.pop_front() {
                        lines.push(row);
                        continue;
                    }
                    match self.pull()? {
                        Some(row) => lines.push(row),
                        None => break,
                    }
                }
            }
            None => {
                lines.extend(self.buf.drain(..));
                while let Some(row) = self.pull()? {
                    lines.push(row);
                }
            }
        }
        Ok(lines)
    }
}
