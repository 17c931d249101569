use crate::progression::ratio_percent;
use serde::{Deserialize, Serialize};

fn default_pass_percent() -> u8 {
    60
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub answer: usize,
}

/// A level's end-of-level quiz.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Quiz {
    pub questions: Vec<Question>,
    #[serde(default = "default_pass_percent")]
    pub pass_percent: u8,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct QuizResult {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
    pub passed: bool,
}

impl Quiz {
    /// Grades one submission. `answers[i]` is the chosen option for question
    /// `i`; missing or `None` answers count as wrong.
    pub fn grade(&self, answers: &[Option<usize>]) -> QuizResult {
        let total = self.questions.len();
        if total == 0 {
            return QuizResult {
                correct: 0,
                total: 0,
                percent: 100,
                passed: true,
            };
        }

        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(*i).copied().flatten() == Some(q.answer))
            .count();
        let percent = ratio_percent(correct, total);

        QuizResult {
            correct,
            total,
            percent,
            passed: percent >= self.pass_percent,
        }
    }

    /// Questions whose `answer` does not point at one of their options.
    pub fn invalid_questions(&self) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| q.answer >= q.options.len())
            .map(|(i, _)| i)
            .collect()
    }
}
