pub mod synonyms;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::question::QuizMode;
use crate::error::DrillError;

pub use synonyms::SynonymIndex;

/// Meanings needed before multiple choice can be offered.
pub const CHOICE_OPTION_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRecord {
    pub phrase: String,
    pub meaning: String,
    pub sentence: String,
    pub answer: String,
}

impl PhraseRecord {
    /// Build a record from raw cells. Returns `None` when the trimmed phrase
    /// or sentence is empty. A blank answer falls back to the phrase.
    pub fn from_cells(phrase: &str, sentence: &str, answer: &str, meaning: &str) -> Option<Self> {
        let phrase = phrase.trim();
        let sentence = sentence.trim();
        if phrase.is_empty() || sentence.is_empty() {
            return None;
        }
        let answer = match answer.trim() {
            "" => phrase,
            a => a,
        };
        Some(Self {
            phrase: phrase.to_string(),
            meaning: meaning.trim().to_string(),
            sentence: sentence.to_string(),
            answer: answer.to_string(),
        })
    }
}

/// The phrase bank: records, the synonym index and distinct meanings.
#[derive(Clone, Debug, Default)]
pub struct PhraseBank {
    pub phrases: Vec<PhraseRecord>,
    pub synonyms: SynonymIndex,
    pub meanings: Vec<String>,
}

impl PhraseBank {
    /// Load the bank, degrading to an empty bank on any error.
    pub fn load(path: &Path) -> Self {
        Self::load_reporting(path).0
    }

    /// Like [`PhraseBank::load`], also handing back the error that emptied
    /// the bank so a caller can show it.
    pub fn load_reporting(path: &Path) -> (Self, Option<DrillError>) {
        match Self::try_load(path) {
            Ok(bank) => {
                tracing::info!(
                    path = %path.display(),
                    phrases = bank.len(),
                    meanings = bank.meanings.len(),
                    "loaded phrase bank"
                );
                (bank, None)
            }
            Err(err) => {
                tracing::warn!(error = %err, "phrase bank not loaded, continuing with empty bank");
                (Self::default(), Some(err))
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, DrillError> {
        let content = fs::read_to_string(path).map_err(|source| DrillError::BankUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| DrillError::BankMalformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a JSON array of row objects (`phrase`, `sentence`, `Answer`, `meaning`).
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let rows: Vec<Map<String, Value>> = serde_json::from_str(content)?;
        Ok(Self::from_rows(rows.iter().filter_map(|row| {
            PhraseRecord::from_cells(
                &cell(row, &["phrase"]),
                &cell(row, &["sentence"]),
                &cell(row, &["Answer", "answer"]),
                &cell(row, &["meaning"]),
            )
        })))
    }

    pub fn from_rows(records: impl IntoIterator<Item = PhraseRecord>) -> Self {
        let mut bank = Self::default();
        for record in records {
            if !bank.meanings.contains(&record.meaning) {
                bank.meanings.push(record.meaning.clone());
            }
            bank.synonyms.insert(&record.meaning, &record.phrase);
            bank.synonyms.insert(&record.meaning, &record.answer);
            bank.phrases.push(record);
        }
        bank
    }

    pub fn find(&self, phrase: &str) -> Option<&PhraseRecord> {
        self.phrases.iter().find(|r| r.phrase == phrase)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn supports_choice(&self) -> bool {
        self.meanings.len() >= CHOICE_OPTION_COUNT
    }

    /// Modes this bank can serve. Choice drops out below four meanings.
    pub fn available_modes(&self) -> Vec<QuizMode> {
        QuizMode::ALL
            .into_iter()
            .filter(|m| *m != QuizMode::Choice || self.supports_choice())
            .collect()
    }
}

/// First present column among `names`, stringified the way a spreadsheet
/// export would render it.
fn cell(row: &Map<String, Value>, names: &[&str]) -> String {
    names
        .iter()
        .find_map(|name| row.get(*name))
        .map(|value| match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default()
}
