use std::path::PathBuf;

use thiserror::Error;

/// Domain errors raised by the drill core.
///
/// Most of these are recoverable: the bank loader and the mistake ledger log
/// them and degrade instead of propagating.
#[derive(Debug, Error)]
pub enum DrillError {
    /// The phrase bank file is missing or unreadable.
    #[error("phrase bank unavailable at {path}: {source}")]
    BankUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The phrase bank file exists but is not a JSON array of rows.
    #[error("phrase bank at {path} is malformed: {source}")]
    BankMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The bank has no usable records, so no question can be asked.
    #[error("no questions available: the phrase bank is empty")]
    NoPhrases,

    /// Multiple choice needs three distractor meanings besides the answer.
    #[error("multiple choice needs at least 4 distinct meanings, found {found}")]
    NotEnoughMeanings { found: usize },

    /// Writing the mistake ledger failed.
    #[error("failed to persist mistake ledger: {0}")]
    Persistence(#[from] anyhow::Error),
}
