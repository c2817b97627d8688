use thiserror::Error;

// * Tokenizer-level failure: a non-blank body produced no usable lines
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no usable lines in {kind} body ({body_len} bytes)")]
pub struct MalformedBody {
    pub kind: &'static str,
    pub body_len: usize,
}

// * Unified Error type for the Refinery pipeline.
// * Everything else (unparseable rows, partial extraction) degrades to counters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefineryError {
    #[error("Malformed message body in {message_id}: {source}")]
    MalformedMessageBody {
        message_id: String,
        #[source]
        source: MalformedBody,
    },
}
