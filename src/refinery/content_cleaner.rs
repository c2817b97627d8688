// * HTML structure flattening
// * Strips markup from a schedule email while keeping its table structure as plain text:
// * row boundaries become line breaks, cell boundaries become the in-line delimiter.

use crate::config::constants::CELL_DELIMITER;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};

// * Subtrees that never carry schedule text
const SKIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "title",
];

// * Elements that start and end their own line
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "blockquote", "pre", "caption", "center", "hr",
];

/// Configuration for HTML flattening
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Character written between table cells
    pub cell_delimiter: char,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            cell_delimiter: CELL_DELIMITER,
        }
    }
}

/// Plain-text rendition of an HTML body
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CleanedContent {
    /// Physical lines, trimmed; blank entries mark table/section boundaries
    pub lines: Vec<String>,
    /// Number of <table> elements seen
    pub table_count: usize,
    /// Number of <tr> elements seen
    pub row_count: usize,
}

impl CleanedContent {
    /// Lines that carry text
    pub fn usable_line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.trim().is_empty()).count()
    }
}

/// Flattens HTML into delimited plain-text lines
pub struct ContentCleaner {
    config: CleanerConfig,
}

impl ContentCleaner {
    /// Creates a new cleaner with default configuration
    pub fn new() -> Self {
        Self {
            config: CleanerConfig::default(),
        }
    }

    /// Creates a new cleaner with custom configuration
    pub fn with_config(config: CleanerConfig) -> Self {
        Self { config }
    }

    /// Parses the document and walks it in source order
    pub fn clean(&self, html: &str) -> CleanedContent {
        let document = Html::parse_document(html);
        let mut writer = LineWriter::new(self.config.cell_delimiter);
        self.walk(document.root_element(), &mut writer);
        writer.finish()
    }

    fn walk(&self, element: ElementRef, out: &mut LineWriter) {
        let name = element.value().name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }

        match name {
            "br" => out.break_line(),
            "table" => {
                out.table_count += 1;
                out.blank_line();
                self.walk_children(element, out);
                out.blank_line();
            }
            "tr" => {
                out.row_count += 1;
                out.break_line();
                self.walk_children(element, out);
                out.break_line();
            }
            "td" | "th" => {
                out.open_cell();
                self.walk_children(element, out);
            }
            _ if BLOCK_TAGS.contains(&name) => {
                out.break_line();
                self.walk_children(element, out);
                out.break_line();
            }
            _ => self.walk_children(element, out),
        }
    }

    fn walk_children(&self, element: ElementRef, out: &mut LineWriter) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_text(text),
                Node::Element(_) => {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        self.walk(child_element, out);
                    }
                }
                _ => {}
            }
        }
    }
}

impl Default for ContentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates collapsed text into lines
struct LineWriter {
    lines: Vec<String>,
    current: String,
    pending_space: bool,
    delimiter: char,
    table_count: usize,
    row_count: usize,
}

impl LineWriter {
    fn new(delimiter: char) -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            pending_space: false,
            delimiter,
            table_count: 0,
            row_count: 0,
        }
    }

    // * HTML whitespace semantics: any run of whitespace is one space
    fn push_text(&mut self, text: &str) {
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                self.pending_space = true;
            }
            if self.pending_space && !self.current.is_empty() {
                self.current.push(' ');
            }
            self.pending_space = false;
            self.current.push_str(word);
        }
        if text.ends_with(char::is_whitespace) {
            self.pending_space = true;
        }
    }

    fn open_cell(&mut self) {
        // * Empty cells collapse; the first cell of a line gets no delimiter
        let written = self.current.trim_end();
        if !written.is_empty() && !written.ends_with(self.delimiter) {
            self.current.push(' ');
            self.current.push(self.delimiter);
            self.current.push(' ');
        }
        self.pending_space = false;
    }

    fn break_line(&mut self) {
        let line = self
            .current
            .trim()
            .trim_end_matches(self.delimiter)
            .trim_end();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
        self.pending_space = false;
    }

    fn blank_line(&mut self) {
        self.break_line();
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn finish(mut self) -> CleanedContent {
        self.break_line();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        CleanedContent {
            lines: self.lines,
            table_count: self.table_count,
            row_count: self.row_count,
        }
    }
}

/// Convenience function to flatten HTML with default configuration
pub fn extract_lines(html: &str) -> Vec<String> {
    ContentCleaner::new().clean(html).lines
}
