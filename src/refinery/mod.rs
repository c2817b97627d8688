// * The Refinery (Extraction Pipeline)
// * Turns one raw timetable email into one ScheduleSnapshot:
// * tokenize -> extract -> filter -> correct -> assemble.
// * Pure and synchronous. The only shared input is the read-only ScheduleConfig.

pub mod content_cleaner;
pub mod errors;
pub mod field_extractor;
pub mod tokenizer;

// * Re-exports for convenient access
pub use content_cleaner::{extract_lines, CleanedContent, CleanerConfig, ContentCleaner};
pub use errors::{MalformedBody, RefineryError};
pub use field_extractor::{find_room, find_time, FieldExtractor, RoomKind};
pub use tokenizer::{RowTokenizer, ScheduleRow, ScheduleRows, TokenizerStats};

use crate::config::settings::ScheduleConfig;
use crate::engine::calendar::resolve_target;
use crate::engine::correction::CorrectionEngine;
use crate::persistence::assembler::RecordAssembler;
use crate::persistence::schema::{RawEmailMessage, ScheduleSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunDiagnostics {
    /// Non-blank physical lines looked at
    pub lines_scanned: usize,
    /// Logical rows produced by the tokenizer
    pub rows_tokenized: usize,
    /// Boilerplate blocks discarded before or between rows
    pub skipped_blocks: usize,
    /// Lines or rows with no course code to attach to
    pub unparseable_rows: usize,
    /// Rows missing at least one secondary field after extraction
    pub partial_extractions: usize,
    /// Rows rejected by the semester allow-list
    pub filtered_out: usize,
    /// Field values filled by the correction engine
    pub corrections_applied: usize,
    /// Rows collapsed by the dedup key
    pub duplicates_removed: usize,
}

/// Snapshot plus the counters that explain it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefineryOutcome {
    pub snapshot: ScheduleSnapshot,
    pub diagnostics: RunDiagnostics,
}

impl RefineryOutcome {
    /// Converts the outcome to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// The schedule refinery
///
/// # Example
/// ```ignore
/// use timetable_flow::config::ScheduleConfig;
/// use timetable_flow::refinery::Refinery;
/// use std::sync::Arc;
///
/// let config = Arc::new(ScheduleConfig::for_semesters(&["BS(SE)-5C"])?);
/// let refinery = Refinery::new(config);
/// let outcome = refinery.process(&message)?;
///
/// println!("Classes: {}", outcome.snapshot.summary.total_items);
/// ```
#[derive(Clone)]
pub struct Refinery {
    config: Arc<ScheduleConfig>,
    tokenizer: Arc<RowTokenizer>,
}

impl Refinery {
    pub fn new(config: Arc<ScheduleConfig>) -> Self {
        Self {
            config,
            tokenizer: Arc::new(RowTokenizer::new()),
        }
    }

    /// Runs one message through the full pipeline
    ///
    /// # Pipeline Steps:
    /// 1. Tokenize the body into rows (HTML flattened first)
    /// 2. Extract fields per row; rows without a course are dropped
    /// 3. Filter by semester allow-list
    /// 4. Correct missing fields
    /// 5. Dedup, sort and summarize
    pub fn process(&self, message: &RawEmailMessage) -> Result<RefineryOutcome, RefineryError> {
        let config = self.config.as_ref();
        let mut diagnostics = RunDiagnostics::default();

        let mut rows = self
            .tokenizer
            .tokenize(&message.body, message.body_is_html)
            .map_err(|source| RefineryError::MalformedMessageBody {
                message_id: message.message_id.clone(),
                source,
            })?;

        let extractor = FieldExtractor::new(config);
        let corrector = CorrectionEngine::new(config);
        let mut assembler = RecordAssembler::new();

        for row in rows.by_ref() {
            diagnostics.rows_tokenized += 1;

            // * Step 2: extraction
            let Some(record) = extractor.extract(&row.text) else {
                diagnostics.unparseable_rows += 1;
                debug!(line = row.first_line, "Row dropped: no course code");
                continue;
            };
            if !record.missing_fields().is_empty() {
                diagnostics.partial_extractions += 1;
            }

            // * Step 3: filtering happens strictly before correction
            let Some(record) = config.semester_filter.admit(record) else {
                diagnostics.filtered_out += 1;
                debug!(line = row.first_line, "Row dropped: semester not allowed");
                continue;
            };

            // * Step 4: correction
            let (record, applied) = corrector.correct(record);
            diagnostics.corrections_applied += applied.len();

            assembler.push(record);
        }

        let stats = rows.stats();
        diagnostics.lines_scanned = stats.lines_scanned;
        diagnostics.skipped_blocks = stats.skipped_blocks;
        diagnostics.unparseable_rows += stats.skipped_lines;
        diagnostics.duplicates_removed = assembler.duplicates_removed();

        // * Step 5: assembly
        let target = resolve_target(&message.subject, message.received_at, config);
        let message_id = Some(message.message_id.clone()).filter(|id| !id.trim().is_empty());
        let snapshot = assembler.finish(target.for_day, target.for_date, message_id);

        info!(
            message_id = %message.message_id,
            for_date = %snapshot.for_date,
            items = snapshot.items.len(),
            lines_scanned = diagnostics.lines_scanned,
            rows_tokenized = diagnostics.rows_tokenized,
            skipped_blocks = diagnostics.skipped_blocks,
            unparseable_rows = diagnostics.unparseable_rows,
            partial_extractions = diagnostics.partial_extractions,
            filtered_out = diagnostics.filtered_out,
            corrections_applied = diagnostics.corrections_applied,
            duplicates_removed = diagnostics.duplicates_removed,
            "Schedule refined"
        );

        Ok(RefineryOutcome {
            snapshot,
            diagnostics,
        })
    }

    /// Returns the current configuration
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }
}

/// Runs the pipeline without constructing a [`Refinery`]
pub fn refine_message(
    message: &RawEmailMessage,
    config: &Arc<ScheduleConfig>,
) -> Result<RefineryOutcome, RefineryError> {
    Refinery::new(Arc::clone(config)).process(message)
}
