use rand::Rng;
use rand::seq::SliceRandom;

use crate::bank::{CHOICE_OPTION_COUNT, PhraseBank, PhraseRecord};
use crate::engine::question::{ActiveQuestion, QuizMode};
use crate::error::DrillError;
use crate::store::ledger::MistakeLedger;

pub const DEFAULT_REVIEW_PROBABILITY: f64 = 0.7;

/// Selection knobs taken from the config.
#[derive(Clone, Debug)]
pub struct SelectorSettings {
    pub review_probability: f64,
    pub modes: Vec<QuizMode>,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            review_probability: DEFAULT_REVIEW_PROBABILITY,
            modes: QuizMode::ALL.to_vec(),
        }
    }
}

/// Choose the next question.
///
/// With a non-empty ledger, a review item is drawn with
/// `review_probability`. A ledger key that no longer resolves is dropped
/// and persisted, then selection falls back to the whole bank. The mode is
/// drawn independently of whether the item is a review.
pub fn pick_next<R: Rng + ?Sized>(
    bank: &PhraseBank,
    ledger: &mut MistakeLedger,
    settings: &SelectorSettings,
    rng: &mut R,
) -> Result<ActiveQuestion, DrillError> {
    if bank.is_empty() {
        return Err(DrillError::NoPhrases);
    }

    let review = pick_review(bank, ledger, settings.review_probability, rng);
    let is_review = review.is_some();
    let item = match review {
        Some(item) => item,
        None => bank
            .phrases
            .choose(rng)
            .cloned()
            .ok_or(DrillError::NoPhrases)?,
    };

    let mode = pick_mode(bank, &settings.modes, rng);
    let options = if mode == QuizMode::Choice {
        choice_options(&item.meaning, &bank.meanings, rng)?
    } else {
        Vec::new()
    };

    tracing::debug!(phrase = %item.phrase, mode = mode.as_str(), is_review, "picked question");
    Ok(ActiveQuestion {
        item,
        mode,
        is_review,
        options,
    })
}

fn pick_review<R: Rng + ?Sized>(
    bank: &PhraseBank,
    ledger: &mut MistakeLedger,
    probability: f64,
    rng: &mut R,
) -> Option<PhraseRecord> {
    if ledger.is_empty() || !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return None;
    }
    let key = ledger.keys().choose(rng)?.clone();
    match bank.find(&key) {
        Some(item) => Some(item.clone()),
        None => {
            tracing::info!(phrase = %key, "dropping stale mistake not found in phrase bank");
            ledger.remove(&key);
            ledger.save();
            None
        }
    }
}

/// Uniform over the enabled modes the bank can serve. Falls back to every
/// mode the bank can serve if the configured list leaves nothing.
fn pick_mode<R: Rng + ?Sized>(bank: &PhraseBank, enabled: &[QuizMode], rng: &mut R) -> QuizMode {
    let available = bank.available_modes();
    let usable: Vec<QuizMode> = available
        .iter()
        .copied()
        .filter(|m| enabled.contains(m))
        .collect();
    let pool = if usable.is_empty() { &available } else { &usable };
    pool.choose(rng).copied().unwrap_or(QuizMode::Phrase)
}

/// Three distinct distractor meanings plus the correct one, shuffled.
pub fn choice_options<R: Rng + ?Sized>(
    correct: &str,
    meanings: &[String],
    rng: &mut R,
) -> Result<Vec<String>, DrillError> {
    let distractors: Vec<&String> = meanings.iter().filter(|m| *m != correct).collect();
    let needed = CHOICE_OPTION_COUNT - 1;
    if distractors.len() < needed {
        return Err(DrillError::NotEnoughMeanings {
            found: distractors.len() + 1,
        });
    }
    let mut options: Vec<String> = distractors
        .choose_multiple(rng, needed)
        .map(|m| (*m).clone())
        .collect();
    options.push(correct.to_string());
    options.shuffle(rng);
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ledger::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn bank_with_meanings(meanings: &[&str]) -> PhraseBank {
        PhraseBank::from_rows(meanings.iter().enumerate().map(|(i, m)| {
            PhraseRecord::from_cells(&format!("phrase {i}"), "We ___ it.", "", m).unwrap()
        }))
    }

    fn meanings(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn empty_bank_has_no_questions() {
        let bank = PhraseBank::default();
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            pick_next(&bank, &mut ledger, &SelectorSettings::default(), &mut rng),
            Err(DrillError::NoPhrases)
        ));
    }

    #[test]
    fn choice_options_with_five_meanings() {
        let all = meanings(&["放棄", "開始", "照顧", "出發", "結束"]);
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let options = choice_options("放棄", &all, &mut rng).unwrap();
            assert_eq!(options.len(), 4);
            assert_eq!(options.iter().filter(|o| *o == "放棄").count(), 1);
            let distinct: HashSet<&String> = options.iter().collect();
            assert_eq!(distinct.len(), 4);
            assert!(options.iter().all(|o| all.contains(o)));
        }
    }

    #[test]
    fn choice_options_vary_position() {
        let all = meanings(&["a", "b", "c", "d", "e"]);
        let positions: HashSet<usize> = (0..100)
            .map(|seed| {
                let mut rng = SmallRng::seed_from_u64(seed);
                let options = choice_options("a", &all, &mut rng).unwrap();
                options.iter().position(|o| o == "a").unwrap()
            })
            .collect();
        assert_eq!(positions.len(), 4);
    }

    #[test]
    fn choice_options_need_three_distractors() {
        let all = meanings(&["a", "b", "c"]);
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(matches!(
            choice_options("a", &all, &mut rng),
            Err(DrillError::NotEnoughMeanings { found: 3 })
        ));
    }

    #[test]
    fn small_bank_never_selects_choice() {
        let bank = bank_with_meanings(&["a", "b", "c"]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let settings = SelectorSettings::default();
        for seed in 0..200 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let q = pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap();
            assert_ne!(q.mode, QuizMode::Choice);
            assert!(q.options.is_empty());
        }
    }

    #[test]
    fn every_mode_is_reachable() {
        let bank = bank_with_meanings(&["a", "b", "c", "d", "e"]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let settings = SelectorSettings::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let seen: HashSet<QuizMode> = (0..300)
            .map(|_| pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap().mode)
            .collect();
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn configured_modes_restrict_selection() {
        let bank = bank_with_meanings(&["a", "b", "c", "d"]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::default()));
        let settings = SelectorSettings {
            modes: vec![QuizMode::Phrase],
            ..SelectorSettings::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let q = pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap();
            assert_eq!(q.mode, QuizMode::Phrase);
        }
    }

    #[test]
    fn review_items_come_from_ledger() {
        let bank = bank_with_meanings(&["a", "b", "c", "d", "e"]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::with_keys(&["phrase 2"])));
        let settings = SelectorSettings::default();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut reviews = 0;
        for _ in 0..1000 {
            let q = pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap();
            if q.is_review {
                reviews += 1;
                assert_eq!(q.item.phrase, "phrase 2");
            }
        }
        // 0.7 nominal; wide margin keeps this stable across rand versions.
        assert!((600..800).contains(&reviews), "reviews = {reviews}");
    }

    #[test]
    fn zero_probability_never_reviews() {
        let bank = bank_with_meanings(&["a", "b", "c", "d"]);
        let mut ledger = MistakeLedger::load(Box::new(MemoryStore::with_keys(&["phrase 0"])));
        let settings = SelectorSettings {
            review_probability: 0.0,
            ..SelectorSettings::default()
        };
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..100 {
            assert!(!pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap().is_review);
        }
    }

    #[test]
    fn stale_key_is_removed_and_persisted() {
        let bank = bank_with_meanings(&["a", "b", "c", "d"]);
        let store = MemoryStore::with_keys(&["gone"]);
        let mut ledger = MistakeLedger::load(Box::new(store.clone()));
        let settings = SelectorSettings {
            review_probability: 1.0,
            ..SelectorSettings::default()
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let q = pick_next(&bank, &mut ledger, &settings, &mut rng).unwrap();
        assert!(!q.is_review);
        assert!(bank.find(&q.item.phrase).is_some());
        assert!(ledger.is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn same_seed_same_question() {
        let bank = bank_with_meanings(&["a", "b", "c", "d", "e"]);
        let settings = SelectorSettings::default();
        let mut first = MistakeLedger::load(Box::new(MemoryStore::with_keys(&["phrase 1"])));
        let mut second = MistakeLedger::load(Box::new(MemoryStore::with_keys(&["phrase 1"])));
        let a = pick_next(&bank, &mut first, &settings, &mut SmallRng::seed_from_u64(42)).unwrap();
        let b = pick_next(&bank, &mut second, &settings, &mut SmallRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
