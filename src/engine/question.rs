use serde::{Deserialize, Serialize};

use crate::bank::PhraseRecord;
use crate::engine::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Phrase,
    Sentence,
    Listening,
    Choice,
    Speaking,
}

impl QuizMode {
    pub const ALL: [QuizMode; 5] = [
        QuizMode::Phrase,
        QuizMode::Sentence,
        QuizMode::Listening,
        QuizMode::Choice,
        QuizMode::Speaking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Phrase => "phrase",
            QuizMode::Sentence => "sentence",
            QuizMode::Listening => "listening",
            QuizMode::Choice => "choice",
            QuizMode::Speaking => "speaking",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuizMode::Phrase => "Phrase",
            QuizMode::Sentence => "Sentence",
            QuizMode::Listening => "Dictation",
            QuizMode::Choice => "Listen & Choose",
            QuizMode::Speaking => "Speaking",
        }
    }

    /// Modes whose prompt is played as audio before answering.
    pub fn has_prompt_audio(self) -> bool {
        matches!(
            self,
            QuizMode::Listening | QuizMode::Choice | QuizMode::Speaking
        )
    }
}

/// First-letter scaffold shown on request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hint {
    pub first: char,
    pub len: usize,
}

/// The question currently on screen. Built by the selector and replaced as a
/// whole on every transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveQuestion {
    pub item: PhraseRecord,
    pub mode: QuizMode,
    pub is_review: bool,
    pub options: Vec<String>,
}

impl ActiveQuestion {
    /// The text an answer is compared against in this mode.
    pub fn target_text(&self) -> String {
        match self.mode {
            QuizMode::Phrase => self.item.phrase.clone(),
            QuizMode::Choice => self.item.meaning.clone(),
            QuizMode::Sentence | QuizMode::Listening => self.item.answer.clone(),
            QuizMode::Speaking => self.full_sentence(),
        }
    }

    pub fn full_sentence(&self) -> String {
        normalize::fill_blank(&self.item.sentence, &self.item.answer)
    }

    pub fn masked_sentence(&self) -> String {
        normalize::mask_blank(&self.item.sentence)
    }

    /// Text handed to the synthesizer for the prompt, if the mode has one.
    pub fn prompt_audio_text(&self) -> Option<String> {
        match self.mode {
            QuizMode::Listening | QuizMode::Speaking => Some(self.full_sentence()),
            QuizMode::Choice => Some(self.item.phrase.clone()),
            QuizMode::Phrase | QuizMode::Sentence => None,
        }
    }

    pub fn hint(&self) -> Option<Hint> {
        let target = match self.mode {
            QuizMode::Phrase => &self.item.phrase,
            QuizMode::Sentence | QuizMode::Listening => &self.item.answer,
            QuizMode::Choice | QuizMode::Speaking => return None,
        };
        target.chars().next().map(|first| Hint {
            first,
            len: target.chars().count(),
        })
    }
}
