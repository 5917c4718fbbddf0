//! Compare a scanned answer map against an answer key

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AnswerMap, Choice, Verdict};

/// Answer key: expected choice per 1-based question number
pub type AnswerKey = BTreeMap<u32, Choice>;

/// Outcome for a single keyed question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutcome {
    /// 1-based question number
    pub question: u32,
    /// What the scan resolved, absent when the sheet had no such question
    pub detected: Option<Verdict>,
    /// The keyed correct choice
    pub expected: Choice,
    /// True only for a confident mark matching the key
    pub correct: bool,
}

/// Per-question outcomes plus the aggregate score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Questions answered correctly
    pub correct: usize,
    /// Questions in the key
    pub total: usize,
    /// correct / total as a percentage, 0 for an empty key
    pub score: f64,
    /// One outcome per keyed question, in question order
    pub details: Vec<QuestionOutcome>,
}

/// Grade detected answers against the key.
///
/// Only a confident `Marked` verdict can earn a point; ambiguous rows and
/// questions missing from the scan count as wrong. Questions the scan found
/// but the key omits are ignored.
pub fn compare_answers(answers: &AnswerMap, key: &AnswerKey) -> ComparisonReport {
    let mut details = Vec::with_capacity(key.len());
    let mut correct = 0usize;

    for (&question, &expected) in key {
        let detected = answers.get(question);
        let is_correct = matches!(detected, Some(Verdict::Marked(c)) if c == expected);
        if is_correct {
            correct += 1;
        }
        details.push(QuestionOutcome {
            question,
            detected,
            expected,
            correct: is_correct,
        });
    }

    let total = key.len();
    ComparisonReport {
        correct,
        total,
        score: if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        },
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(choices: &[Choice]) -> AnswerKey {
        choices
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as u32 + 1, c))
            .collect()
    }

    #[test]
    fn test_four_of_five_scores_eighty() {
        let answers = AnswerMap::from_verdicts(vec![
            Verdict::Marked(Choice::A),
            Verdict::Marked(Choice::B),
            Verdict::Marked(Choice::C),
            Verdict::Marked(Choice::E), // wrong, key says D
            Verdict::Marked(Choice::E),
        ]);
        let report = compare_answers(
            &answers,
            &key(&[Choice::A, Choice::B, Choice::C, Choice::D, Choice::E]),
        );
        assert_eq!(report.correct, 4);
        assert_eq!(report.total, 5);
        assert!((report.score - 80.0).abs() < 1e-9);
        assert!(!report.details[3].correct);
    }

    #[test]
    fn test_ambiguous_never_matches() {
        let answers = AnswerMap::from_verdicts(vec![Verdict::Ambiguous]);
        let report = compare_answers(&answers, &key(&[Choice::A]));
        assert_eq!(report.correct, 0);
        assert_eq!(report.details[0].detected, Some(Verdict::Ambiguous));
    }

    #[test]
    fn test_question_missing_from_scan_is_wrong() {
        let answers = AnswerMap::from_verdicts(vec![Verdict::Marked(Choice::A)]);
        let report = compare_answers(&answers, &key(&[Choice::A, Choice::B]));
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert_eq!(report.details[1].detected, None);
    }

    #[test]
    fn test_empty_key_scores_zero() {
        let answers = AnswerMap::from_verdicts(vec![Verdict::Marked(Choice::A)]);
        let report = compare_answers(&answers, &AnswerKey::new());
        assert_eq!(report.total, 0);
        assert_eq!(report.score, 0.0);
        assert!(report.details.is_empty());
    }
}
