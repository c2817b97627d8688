// * Row tokenization
// * Turns a message body into logical per-class rows.
// * A row starts at a course code; wrapped lines are merged back into the row they continue.

use crate::config::constants::CELL_DELIMITER;
use crate::refinery::content_cleaner::ContentCleaner;
use crate::refinery::errors::MalformedBody;
use crate::refinery::field_extractor::COURSE_PATTERN;
use serde::{Deserialize, Serialize};

/// One logical class entry, possibly built from several physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    /// Buffered fields joined with " | "
    pub text: String,
    /// Physical lines merged into this row
    pub line_count: usize,
    /// 0-based index of the line that opened the row
    pub first_line: usize,
}

/// Counters collected while the row sequence is drained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerStats {
    pub lines_scanned: usize,
    pub rows_emitted: usize,
    pub skipped_blocks: usize,
    pub skipped_lines: usize,
}

/// Splits a raw body into [`ScheduleRow`]s
pub struct RowTokenizer {
    cleaner: ContentCleaner,
}

impl RowTokenizer {
    pub fn new() -> Self {
        Self {
            cleaner: ContentCleaner::new(),
        }
    }

    /// Prepares a lazy row sequence over `body`.
    ///
    /// A blank body is "no classes", not an error. A non-blank body that yields no
    /// usable lines is [`MalformedBody`].
    pub fn tokenize(&self, body: &str, is_html: bool) -> Result<ScheduleRows, MalformedBody> {
        if body.trim().is_empty() {
            return Ok(ScheduleRows::new(Vec::new()));
        }

        let (kind, lines) = if is_html {
            ("html", self.cleaner.clean(body).lines)
        } else {
            ("text", plain_lines(body))
        };

        if lines.iter().all(|l| l.is_empty()) {
            return Err(MalformedBody {
                kind,
                body_len: body.len(),
            });
        }

        Ok(ScheduleRows::new(lines))
    }
}

impl Default for RowTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

// * Plain text: trim each line and drop control characters (stray \r, form feeds)
fn plain_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| {
            line.chars()
                .filter(|c| !c.is_control() || *c == '\t')
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}

/// True when the line opens a new class row
pub fn starts_row(line: &str) -> bool {
    COURSE_PATTERN.is_match(line.trim_start())
}

fn segments(line: &str) -> impl Iterator<Item = &str> {
    line.split(CELL_DELIMITER).map(str::trim)
}

/// Fields of the row currently being built
#[derive(Debug)]
struct RowBuffer {
    fields: Vec<String>,
    line_count: usize,
    first_line: usize,
}

impl RowBuffer {
    fn start(line: &str, index: usize) -> Self {
        Self {
            fields: segments(line).map(str::to_string).collect(),
            line_count: 1,
            first_line: index,
        }
    }

    // * First segment extends the last field; later segments open new fields
    fn continue_with(&mut self, line: &str) {
        let mut parts = segments(line);
        if let Some(head) = parts.next() {
            match self.fields.last_mut() {
                Some(last) if last.is_empty() => last.push_str(head),
                Some(last) => {
                    if !head.is_empty() {
                        last.push(' ');
                        last.push_str(head);
                    }
                }
                None => self.fields.push(head.to_string()),
            }
        }
        self.fields.extend(parts.map(str::to_string));
        self.line_count += 1;
    }

    fn into_row(self) -> ScheduleRow {
        let separator = format!(" {} ", CELL_DELIMITER);
        let text = self
            .fields
            .iter()
            .filter(|f| !f.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&separator);
        ScheduleRow {
            text,
            line_count: self.line_count,
            first_line: self.first_line,
        }
    }
}

/// Lazy, single-pass row sequence. Call [`ScheduleRows::stats`] after draining.
#[derive(Debug)]
pub struct ScheduleRows {
    lines: std::vec::IntoIter<String>,
    index: usize,
    current: Option<RowBuffer>,
    in_skipped_block: bool,
    stats: TokenizerStats,
}

impl ScheduleRows {
    fn new(lines: Vec<String>) -> Self {
        Self {
            lines: lines.into_iter(),
            index: 0,
            current: None,
            in_skipped_block: false,
            stats: TokenizerStats::default(),
        }
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    fn flush(&mut self) -> Option<ScheduleRow> {
        let row = self.current.take()?.into_row();
        self.stats.rows_emitted += 1;
        Some(row)
    }

    fn skip(&mut self) {
        if !self.in_skipped_block {
            self.stats.skipped_blocks += 1;
            self.in_skipped_block = true;
        }
        self.stats.skipped_lines += 1;
    }
}

impl Iterator for ScheduleRows {
    type Item = ScheduleRow;

    fn next(&mut self) -> Option<ScheduleRow> {
        while let Some(line) = self.lines.next() {
            let index = self.index;
            self.index += 1;

            if line.is_empty() {
                // * Blank line closes the row; what follows is boilerplate until a course line
                self.in_skipped_block = false;
                if let Some(row) = self.flush() {
                    return Some(row);
                }
                continue;
            }

            self.stats.lines_scanned += 1;

            if starts_row(&line) {
                self.in_skipped_block = false;
                let finished = self.flush();
                self.current = Some(RowBuffer::start(&line, index));
                if finished.is_some() {
                    return finished;
                }
            } else if let Some(buffer) = self.current.as_mut() {
                buffer.continue_with(&line);
            } else {
                self.skip();
            }
        }

        self.flush()
    }
}
