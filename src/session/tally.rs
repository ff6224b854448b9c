use crate::engine::grader::Verdict;

/// Answers given this session. Near misses are kept apart from both
/// correct and incorrect answers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub correct: u32,
    pub near_miss: u32,
    pub incorrect: u32,
}

impl Tally {
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Correct => self.correct += 1,
            Verdict::CorrectWrongForm | Verdict::CorrectSynonymWrongTarget => self.near_miss += 1,
            Verdict::Incorrect => self.incorrect += 1,
        }
    }

    pub fn answered(&self) -> u32 {
        self.correct + self.near_miss + self.incorrect
    }

    pub fn accuracy(&self) -> f64 {
        match self.answered() {
            0 => 100.0,
            n => self.correct as f64 / n as f64 * 100.0,
        }
    }
}
