use crate::bank::SynonymIndex;
use crate::engine::diff::{self, DiffSpan};
use crate::engine::normalize::{fold, normalize};
use crate::engine::question::{ActiveQuestion, QuizMode};
use crate::store::ledger::MistakeLedger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// The bare phrase was given where an inflected answer was expected.
    CorrectWrongForm,
    /// Another term with the same meaning was given.
    CorrectSynonymWrongTarget,
    Incorrect,
}

impl Verdict {
    /// Near misses neither clear nor add a mistake.
    pub fn is_soft(self) -> bool {
        matches!(
            self,
            Verdict::CorrectWrongForm | Verdict::CorrectSynonymWrongTarget
        )
    }
}

/// What grading did to the mistake ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerEffect {
    Unchanged,
    Added,
    Removed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GradeOutcome {
    pub verdict: Verdict,
    pub mode: QuizMode,
    pub phrase: String,
    pub given: String,
    pub target: String,
    pub full_sentence: String,
    pub diff: Option<Vec<DiffSpan>>,
    pub ledger_effect: LedgerEffect,
}

impl GradeOutcome {
    pub fn headline(&self) -> String {
        match self.verdict {
            Verdict::Correct if self.ledger_effect == LedgerEffect::Removed => {
                "Correct! Removed from your mistake list.".to_string()
            }
            Verdict::Correct => "Correct!".to_string(),
            Verdict::CorrectWrongForm => format!(
                "Right phrase, wrong form. This sentence needs \"{}\".",
                self.target
            ),
            Verdict::CorrectSynonymWrongTarget => format!(
                "Right meaning! You answered \"{}\", but this question wants \"{}\".",
                self.given.trim(),
                self.target
            ),
            Verdict::Incorrect => format!("Incorrect. Answer: {}", self.target),
        }
    }
}

/// Matching rules for free-text answers, tried in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Exact,
    WrongForm,
    Synonym,
}

pub const TIERS: [Tier; 3] = [Tier::Exact, Tier::WrongForm, Tier::Synonym];

struct Candidate<'a> {
    question: &'a ActiveQuestion,
    synonyms: &'a SynonymIndex,
    input: String,
    folded_input: String,
    target: String,
}

impl Tier {
    pub fn applies_to(self, mode: QuizMode) -> bool {
        match self {
            Tier::Exact => mode != QuizMode::Choice,
            Tier::WrongForm => matches!(
                mode,
                QuizMode::Sentence | QuizMode::Listening | QuizMode::Speaking
            ),
            Tier::Synonym => !matches!(mode, QuizMode::Choice | QuizMode::Speaking),
        }
    }

    pub fn verdict(self) -> Verdict {
        match self {
            Tier::Exact => Verdict::Correct,
            Tier::WrongForm => Verdict::CorrectWrongForm,
            Tier::Synonym => Verdict::CorrectSynonymWrongTarget,
        }
    }

    fn matches(self, c: &Candidate<'_>) -> bool {
        match self {
            Tier::Exact => c.input == c.target,
            Tier::WrongForm => {
                let bare = normalize(&c.question.item.phrase);
                c.input == bare && bare != c.target
            }
            Tier::Synonym => c
                .synonyms
                .contains(&c.question.item.meaning, &c.folded_input),
        }
    }
}

/// Grade `raw_input` against `question`. Pure: ledger updates are applied
/// separately by [`apply_to_ledger`].
pub fn grade(question: &ActiveQuestion, synonyms: &SynonymIndex, raw_input: &str) -> GradeOutcome {
    let target = question.target_text();
    let verdict = if question.mode == QuizMode::Choice {
        if raw_input == target {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    } else {
        let candidate = Candidate {
            question,
            synonyms,
            input: normalize(raw_input),
            folded_input: fold(raw_input),
            target: normalize(&target),
        };
        TIERS
            .into_iter()
            .filter(|tier| tier.applies_to(question.mode))
            .find(|tier| tier.matches(&candidate))
            .map_or(Verdict::Incorrect, Tier::verdict)
    };

    let diff = (verdict == Verdict::Incorrect
        && question.mode != QuizMode::Choice
        && !raw_input.is_empty())
    .then(|| diff::annotate(raw_input, &target));

    tracing::debug!(
        phrase = %question.item.phrase,
        mode = question.mode.as_str(),
        ?verdict,
        "graded answer"
    );

    GradeOutcome {
        verdict,
        mode: question.mode,
        phrase: question.item.phrase.clone(),
        given: raw_input.to_string(),
        target,
        full_sentence: question.full_sentence(),
        diff,
        ledger_effect: LedgerEffect::Unchanged,
    }
}

/// Correct clears the phrase from the ledger, Incorrect adds it, near misses
/// leave it alone. Persists only when something changed.
pub fn apply_to_ledger(outcome: &mut GradeOutcome, ledger: &mut MistakeLedger) {
    let changed = match outcome.verdict {
        Verdict::Correct => ledger.remove(&outcome.phrase).then_some(LedgerEffect::Removed),
        Verdict::Incorrect => ledger.add(&outcome.phrase).then_some(LedgerEffect::Added),
        Verdict::CorrectWrongForm | Verdict::CorrectSynonymWrongTarget => None,
    };
    if let Some(effect) = changed {
        ledger.save();
        outcome.ledger_effect = effect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{PhraseBank, PhraseRecord};
    use crate::store::ledger::MemoryStore;

    fn bank() -> PhraseBank {
        PhraseBank::from_rows([
            PhraseRecord::from_cells("give up", "She ___ smoking.", "gave up", "放棄").unwrap(),
            PhraseRecord::from_cells("quit", "He ___ his job.", "quit", "放棄").unwrap(),
            PhraseRecord::from_cells("look after", "I ___ my sister.", "look after", "照顧").unwrap(),
        ])
    }

    fn question(bank: &PhraseBank, phrase: &str, mode: QuizMode) -> ActiveQuestion {
        ActiveQuestion {
            item: bank.find(phrase).unwrap().clone(),
            mode,
            is_review: false,
            options: Vec::new(),
        }
    }

    #[test]
    fn tier_table_matches_modes() {
        use QuizMode::*;
        assert!(TIERS.iter().all(|t| !t.applies_to(Choice)));
        assert!(Tier::Exact.applies_to(Phrase));
        assert!(!Tier::WrongForm.applies_to(Phrase));
        assert!(Tier::WrongForm.applies_to(Speaking));
        assert!(Tier::Synonym.applies_to(Listening));
        assert!(!Tier::Synonym.applies_to(Speaking));
    }

    #[test]
    fn bare_phrase_in_sentence_mode_is_wrong_form() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Sentence);
        let outcome = grade(&q, &bank.synonyms, "give up");
        assert_eq!(outcome.verdict, Verdict::CorrectWrongForm);
        assert_eq!(outcome.target, "gave up");
        assert!(outcome.diff.is_none());
    }

    #[test]
    fn inflected_answer_is_correct() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Sentence);
        assert_eq!(grade(&q, &bank.synonyms, "Gave up!").verdict, Verdict::Correct);
    }

    #[test]
    fn synonym_in_sentence_mode() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Sentence);
        let outcome = grade(&q, &bank.synonyms, "  Quit ");
        assert_eq!(outcome.verdict, Verdict::CorrectSynonymWrongTarget);
        assert!(outcome.headline().contains("gave up"));
    }

    #[test]
    fn synonym_lookup_is_not_punctuation_stripped() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Sentence);
        assert_eq!(grade(&q, &bank.synonyms, "quit!").verdict, Verdict::Incorrect);
    }

    #[test]
    fn speaking_skips_synonym_tier() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Speaking);
        assert_eq!(grade(&q, &bank.synonyms, "quit").verdict, Verdict::Incorrect);
        assert_eq!(
            grade(&q, &bank.synonyms, "She gave up smoking").verdict,
            Verdict::Correct
        );
        assert_eq!(
            grade(&q, &bank.synonyms, "give up").verdict,
            Verdict::CorrectWrongForm
        );
    }

    #[test]
    fn phrase_mode_accepts_answer_form_only_as_synonym() {
        let bank = bank();
        let q = question(&bank, "give up", QuizMode::Phrase);
        assert_eq!(grade(&q, &bank.synonyms, "give up").verdict, Verdict::Correct);
        assert_eq!(
            grade(&q, &bank.synonyms, "gave up").verdict,
            Verdict::CorrectSynonymWrongTarget
        );
    }

    #[test]
    fn wrong_form_requires_phrase_to_differ_from_target() {
        let bank = bank();
        let q = question(&bank, "look after", QuizMode::Listening);
        // Phrase equals answer, so the exact tier wins.
        assert_eq!(grade(&q, &bank.synonyms, "look after").verdict, Verdict::Correct);
    }

    #[test]
    fn choice_is_exact_and_case_sensitive() {
        let bank = PhraseBank::from_rows([
            PhraseRecord::from_cells("run", "I ___.", "", "Run").unwrap(),
        ]);
        let mut q = question(&bank, "run", QuizMode::Choice);
        q.options = vec!["Run".into(), "a".into(), "b".into(), "c".into()];
        assert_eq!(grade(&q, &bank.synonyms, "Run").verdict, Verdict::Correct);
        let wrong = grade(&q, &bank.synonyms, "run");
        assert_eq!(wrong.verdict, Verdict::Incorrect);
        assert!(wrong.diff.is_none());
    }

    #[test]
    fn incorrect_answer_carries_diff_unless_empty() {
        let bank = bank();
        let q = question(&bank, "look after", QuizMode::Phrase);
        let outcome = grade(&q, &bank.synonyms, "look at");
        assert_eq!(outcome.verdict, Verdict::Incorrect);
        assert!(outcome.diff.is_some());

        let empty = grade(&q, &bank.synonyms, "");
        assert_eq!(empty.verdict, Verdict::Incorrect);
        assert!(empty.diff.is_none());
    }

    #[test]
    fn grading_is_deterministic() {
        let bank = bank();
        for mode in QuizMode::ALL {
            let q = question(&bank, "give up", mode);
            for input in ["give up", "gave up", "quit", "", "nonsense", "放棄"] {
                assert_eq!(
                    grade(&q, &bank.synonyms, input),
                    grade(&q, &bank.synonyms, input)
                );
            }
        }
    }

    #[test]
    fn ledger_effects_follow_verdict() {
        let bank = bank();
        let store = MemoryStore::default();
        let mut ledger = MistakeLedger::load(Box::new(store.clone()));
        let q = question(&bank, "give up", QuizMode::Sentence);

        let mut wrong = grade(&q, &bank.synonyms, "nope");
        apply_to_ledger(&mut wrong, &mut ledger);
        assert_eq!(wrong.ledger_effect, LedgerEffect::Added);
        assert_eq!(store.snapshot(), vec!["give up".to_string()]);

        let mut soft = grade(&q, &bank.synonyms, "give up");
        apply_to_ledger(&mut soft, &mut ledger);
        assert_eq!(soft.ledger_effect, LedgerEffect::Unchanged);
        assert!(ledger.contains("give up"));

        let mut synonym = grade(&q, &bank.synonyms, "quit");
        apply_to_ledger(&mut synonym, &mut ledger);
        assert_eq!(synonym.ledger_effect, LedgerEffect::Unchanged);
        assert!(ledger.contains("give up"));

        let mut right = grade(&q, &bank.synonyms, "gave up");
        apply_to_ledger(&mut right, &mut ledger);
        assert_eq!(right.ledger_effect, LedgerEffect::Removed);
        assert!(right.headline().contains("Removed"));
        assert!(store.snapshot().is_empty());

        // Correct again: nothing to remove.
        let mut again = grade(&q, &bank.synonyms, "gave up");
        apply_to_ledger(&mut again, &mut ledger);
        assert_eq!(again.ledger_effect, LedgerEffect::Unchanged);
    }
}
