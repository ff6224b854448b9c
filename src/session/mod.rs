//! Per-learner drill state and the transitions that mutate it.
//!
//! Every learner action is one call on [`Session`]: pick the next question,
//! submit a typed answer, submit a speech transcript, reveal the hint or skip.
//! Collaborators are passed in explicitly; the session holds no globals.

pub mod tally;

use rand::Rng;

use crate::bank::PhraseBank;
use crate::engine::grader::{self, GradeOutcome};
use crate::engine::normalize::speakable;
use crate::engine::question::{ActiveQuestion, Hint};
use crate::engine::selector::{self, SelectorSettings};
use crate::error::DrillError;
use crate::speech::{AudioClip, SpeechSynthesizer, Transcript};
use crate::store::ledger::MistakeLedger;

pub use tally::Tally;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AudioSlot {
    #[default]
    Empty,
    Ready(AudioClip),
    /// Synthesis was attempted and returned nothing.
    Failed,
}

impl AudioSlot {
    fn from_synthesis(tts: &dyn SpeechSynthesizer, text: &str) -> Self {
        match tts.synthesize(&speakable(text)) {
            Some(clip) => AudioSlot::Ready(clip),
            None => AudioSlot::Failed,
        }
    }

    pub fn clip(&self) -> Option<&AudioClip> {
        match self {
            AudioSlot::Ready(clip) => Some(clip),
            _ => None,
        }
    }
}

/// Why a spoken answer could not be graded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechNotice {
    RecordingFailed,
    NotRecognized,
    ServiceError(String),
    OtherError(String),
}

impl SpeechNotice {
    pub fn message(&self) -> String {
        match self {
            SpeechNotice::RecordingFailed => "Recording failed, check the record command.".into(),
            SpeechNotice::NotRecognized => "Couldn't make that out, please try again.".into(),
            SpeechNotice::ServiceError(detail) => format!("Speech service error: {detail}"),
            SpeechNotice::OtherError(detail) => format!("Speech recognition failed: {detail}"),
        }
    }
}

#[derive(Default)]
pub struct Session {
    question: Option<ActiveQuestion>,
    feedback: Option<GradeOutcome>,
    heard: Option<String>,
    notice: Option<SpeechNotice>,
    show_hint: bool,
    prompt_audio: AudioSlot,
    feedback_audio: AudioSlot,
    tally: Tally,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current question and reset all per-question state.
    pub fn next_question<R: Rng + ?Sized>(
        &mut self,
        bank: &PhraseBank,
        ledger: &mut MistakeLedger,
        settings: &SelectorSettings,
        tts: &dyn SpeechSynthesizer,
        rng: &mut R,
    ) -> Result<&ActiveQuestion, DrillError> {
        self.skip();
        let question = selector::pick_next(bank, ledger, settings, rng)?;
        if let Some(text) = question.prompt_audio_text() {
            self.prompt_audio = AudioSlot::from_synthesis(tts, &text);
        }
        Ok(&*self.question.insert(question))
    }

    /// Abandon the current question. Nothing is persisted.
    pub fn skip(&mut self) {
        self.question = None;
        self.feedback = None;
        self.heard = None;
        self.notice = None;
        self.show_hint = false;
        self.prompt_audio = AudioSlot::Empty;
        self.feedback_audio = AudioSlot::Empty;
    }

    /// Grade a typed (or chosen) answer. Returns `None` when there is no
    /// open question or it was already answered.
    pub fn submit(
        &mut self,
        bank: &PhraseBank,
        ledger: &mut MistakeLedger,
        tts: &dyn SpeechSynthesizer,
        input: &str,
    ) -> Option<&GradeOutcome> {
        if self.feedback.is_some() {
            return None;
        }
        let question = self.question.as_ref()?;
        let mut outcome = grader::grade(question, &bank.synonyms, input);
        grader::apply_to_ledger(&mut outcome, ledger);
        self.tally.record(outcome.verdict);
        self.feedback_audio = AudioSlot::from_synthesis(tts, &outcome.full_sentence);
        self.notice = None;
        Some(&*self.feedback.insert(outcome))
    }

    /// Grade a speech transcript. Failure transcripts only raise a notice
    /// and leave the question open.
    pub fn submit_transcript(
        &mut self,
        bank: &PhraseBank,
        ledger: &mut MistakeLedger,
        tts: &dyn SpeechSynthesizer,
        transcript: Transcript,
    ) -> Option<&GradeOutcome> {
        if self.question.is_none() || self.feedback.is_some() {
            return None;
        }
        let Some(text) = transcript.usable_text().map(str::to_string) else {
            let notice = match transcript {
                Transcript::ServiceError(detail) => SpeechNotice::ServiceError(detail),
                Transcript::OtherError(detail) => SpeechNotice::OtherError(detail),
                Transcript::Heard(_) | Transcript::NotRecognized => SpeechNotice::NotRecognized,
            };
            tracing::info!(?notice, "speech answer not graded");
            self.notice = Some(notice);
            return None;
        };
        self.heard = Some(text.clone());
        self.submit(bank, ledger, tts, &text)
    }

    pub fn recording_failed(&mut self) {
        if self.feedback.is_none() {
            self.notice = Some(SpeechNotice::RecordingFailed);
        }
    }

    pub fn toggle_hint(&mut self) {
        if self.feedback.is_none() {
            self.show_hint = !self.show_hint;
        }
    }

    /// The hint, when it has been requested and the question is still open.
    pub fn visible_hint(&self) -> Option<Hint> {
        if !self.show_hint || self.feedback.is_some() {
            return None;
        }
        self.question.as_ref()?.hint()
    }

    pub fn question(&self) -> Option<&ActiveQuestion> {
        self.question.as_ref()
    }

    pub fn feedback(&self) -> Option<&GradeOutcome> {
        self.feedback.as_ref()
    }

    pub fn is_answered(&self) -> bool {
        self.feedback.is_some()
    }

    pub fn heard(&self) -> Option<&str> {
        self.heard.as_deref()
    }

    pub fn notice(&self) -> Option<&SpeechNotice> {
        self.notice.as_ref()
    }

    pub fn prompt_audio(&self) -> &AudioSlot {
        &self.prompt_audio
    }

    pub fn feedback_audio(&self) -> &AudioSlot {
        &self.feedback_audio
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::PhraseRecord;
    use crate::engine::grader::Verdict;
    use crate::engine::question::QuizMode;
    use crate::speech::Silent;
    use crate::store::ledger::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::cell::RefCell;

    /// Records what it was asked to say and returns a fixed clip.
    #[derive(Default)]
    struct RecordingTts {
        spoken: RefCell<Vec<String>>,
    }

    impl SpeechSynthesizer for RecordingTts {
        fn synthesize(&self, text: &str) -> Option<AudioClip> {
            self.spoken.borrow_mut().push(text.to_string());
            Some(AudioClip {
                bytes: vec![1, 2, 3],
                extension: "mp3",
            })
        }
    }

    fn bank() -> PhraseBank {
        PhraseBank::from_rows([
            PhraseRecord::from_cells("give up", "She ___ smoking.", "gave up", "放棄").unwrap(),
            PhraseRecord::from_cells("quit", "He ___ his job.", "quit", "放棄").unwrap(),
        ])
    }

    fn session_with(mode: QuizMode) -> Session {
        let bank = bank();
        Session {
            question: Some(ActiveQuestion {
                item: bank.find("give up").unwrap().clone(),
                mode,
                is_review: false,
                options: Vec::new(),
            }),
            ..Session::default()
        }
    }

    #[test]
    fn next_question_resets_transient_state() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let mut session = session_with(QuizMode::Phrase);
        session.toggle_hint();
        session.submit(&bank, &mut ledger, &Silent, "wrong");
        assert!(session.is_answered());

        let mut rng = SmallRng::seed_from_u64(9);
        session
            .next_question(&bank, &mut ledger, &SelectorSettings::default(), &Silent, &mut rng)
            .unwrap();
        assert!(session.feedback().is_none());
        assert!(session.visible_hint().is_none());
        assert_eq!(session.feedback_audio(), &AudioSlot::Empty);
        assert_eq!(session.tally().answered(), 1);
    }

    #[test]
    fn prompt_audio_failure_is_recorded_not_fatal() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let settings = SelectorSettings {
            modes: vec![QuizMode::Listening],
            ..SelectorSettings::default()
        };
        let mut session = Session::new();
        let mut rng = SmallRng::seed_from_u64(1);
        session
            .next_question(&bank, &mut ledger, &settings, &Silent, &mut rng)
            .unwrap();
        assert_eq!(session.prompt_audio(), &AudioSlot::Failed);
    }

    #[test]
    fn prompt_audio_speaks_filled_sentence_without_underscores() {
        let bank = PhraseBank::from_rows([PhraseRecord::from_cells(
            "give up",
            "She ___ smoking.",
            "gave up",
            "放棄",
        )
        .unwrap()]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let settings = SelectorSettings {
            modes: vec![QuizMode::Speaking],
            ..SelectorSettings::default()
        };
        let tts = RecordingTts::default();
        let mut session = Session::new();
        session
            .next_question(&bank, &mut ledger, &settings, &tts, &mut SmallRng::seed_from_u64(0))
            .unwrap();
        assert!(session.prompt_audio().clip().is_some());
        assert_eq!(tts.spoken.borrow().as_slice(), &["She gave up smoking."]);
    }

    #[test]
    fn empty_bank_leaves_no_question() {
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let mut session = session_with(QuizMode::Phrase);
        let result = session.next_question(
            &PhraseBank::default(),
            &mut ledger,
            &SelectorSettings::default(),
            &Silent,
            &mut SmallRng::seed_from_u64(0),
        );
        assert!(matches!(result, Err(DrillError::NoPhrases)));
        assert!(session.question().is_none());
    }

    #[test]
    fn second_submit_is_ignored() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let mut session = session_with(QuizMode::Sentence);
        assert_eq!(
            session.submit(&bank, &mut ledger, &Silent, "gave up").unwrap().verdict,
            Verdict::Correct
        );
        assert!(session.submit(&bank, &mut ledger, &Silent, "nope").is_none());
        assert!(ledger.is_empty());
        assert_eq!(session.tally().correct, 1);
    }

    #[test]
    fn feedback_audio_reads_full_sentence() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let tts = RecordingTts::default();
        let mut session = session_with(QuizMode::Phrase);
        session.submit(&bank, &mut ledger, &tts, "give up");
        assert_eq!(tts.spoken.borrow().as_slice(), &["She gave up smoking."]);
        assert!(session.feedback_audio().clip().is_some());
    }

    #[test]
    fn failure_transcripts_are_never_graded() {
        let bank = bank();
        let store = MemoryStore::default();
        let mut ledger = MistakeLedger::load(Box::new(store.clone()));
        let mut session = session_with(QuizMode::Speaking);

        for transcript in [
            Transcript::NotRecognized,
            Transcript::ServiceError("API Error".into()),
            Transcript::OtherError("device busy".into()),
            Transcript::Heard("  ".into()),
        ] {
            assert!(
                session
                    .submit_transcript(&bank, &mut ledger, &Silent, transcript)
                    .is_none()
            );
            assert!(session.notice().is_some());
            assert!(!session.is_answered());
        }
        assert!(store.snapshot().is_empty());
        assert_eq!(session.tally().answered(), 0);
    }

    #[test]
    fn heard_transcript_is_graded() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::with_keys(&["give up"])));
        let mut session = session_with(QuizMode::Speaking);
        session.submit_transcript(&bank, &mut ledger, &Silent, Transcript::NotRecognized);
        let outcome = session
            .submit_transcript(
                &bank,
                &mut ledger,
                &Silent,
                Transcript::Heard("she gave up smoking".into()),
            )
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Correct);
        assert_eq!(session.heard(), Some("she gave up smoking"));
        assert!(session.notice().is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn hint_toggles_until_answered() {
        let bank = bank();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let mut session = session_with(QuizMode::Sentence);
        assert!(session.visible_hint().is_none());
        session.toggle_hint();
        assert_eq!(session.visible_hint(), Some(Hint { first: 'g', len: 7 }));
        session.submit(&bank, &mut ledger, &Silent, "give up");
        assert!(session.visible_hint().is_none());
    }

    #[test]
    fn skip_discards_without_persisting() {
        let store = MemoryStore::with_keys(&["quit"]);
        let ledger = MistakeLedger::load(Box::new(store.clone()));
        let mut session = session_with(QuizMode::Phrase);
        session.toggle_hint();
        session.skip();
        assert!(session.question().is_none());
        assert!(session.visible_hint().is_none());
        assert_eq!(ledger.keys(), &["quit"]);
        assert_eq!(store.snapshot(), vec!["quit".to_string()]);
    }
}
