// src/engine/selector.rs

//! Picks which questions of a quiz an attempt presents.

use std::collections::{BTreeMap, HashMap};

use rand::{Rng, seq::SliceRandom};

use crate::models::{
    question::{Question, QuestionKind},
    quiz::{DisplayConfig, DisplayMode},
};

/// Ordered question indices for one attempt. Never fails: an empty result
/// means the policy selected nothing and the attempt must not start.
pub fn select<R: Rng + ?Sized>(
    questions: &[Question],
    config: &DisplayConfig,
    rng: &mut R,
) -> Vec<usize> {
    match config.mode {
        DisplayMode::QuestionCount => select_by_count(questions, &config.parameters, rng),
        DisplayMode::TotalScore => select_by_score(questions, config.target_score, rng),
    }
}

/// Draws `min(count, available)` questions of each requested type without
/// replacement, then shuffles the whole selection so types are interleaved.
pub fn select_by_count<R: Rng + ?Sized>(
    questions: &[Question],
    counts: &BTreeMap<QuestionKind, u32>,
    rng: &mut R,
) -> Vec<usize> {
    let mut pools: HashMap<QuestionKind, Vec<usize>> = HashMap::new();
    for (i, question) in questions.iter().enumerate() {
        pools.entry(question.kind()).or_default().push(i);
    }

    let mut selected = Vec::new();
    for (kind, count) in counts {
        if *count == 0 {
            continue;
        }
        let Some(pool) = pools.get_mut(kind) else {
            continue;
        };
        pool.shuffle(rng);
        let take = (*count as usize).min(pool.len());
        selected.extend_from_slice(&pool[..take]);
    }

    selected.shuffle(rng);
    selected
}

/// Shuffles the positively scored questions and accepts them in that order
/// until the accumulated score reaches `target_score`. The last accepted
/// question may overshoot the target.
pub fn select_by_score<R: Rng + ?Sized>(
    questions: &[Question],
    target_score: i64,
    rng: &mut R,
) -> Vec<usize> {
    let mut candidates: Vec<(usize, i64)> = questions
        .iter()
        .enumerate()
        .map(|(i, question)| (i, question.score()))
        .filter(|(_, score)| *score > 0)
        .collect();
    candidates.shuffle(rng);

    let mut selected = Vec::new();
    let mut accumulated: i64 = 0;
    for (index, score) in candidates {
        if accumulated >= target_score {
            break;
        }
        selected.push(index);
        accumulated = accumulated.saturating_add(score);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{ChoiceQuestion, MultipartQuestion, Part, TextQuestion};
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashSet;

    fn short(score: i64) -> Question {
        Question::ShortAnswer(TextQuestion {
            text: "q".to_string(),
            score,
            answer: Some("a".to_string()),
        })
    }

    fn choice(score: i64) -> Question {
        Question::MultipleChoice(ChoiceQuestion {
            text: "q".to_string(),
            score,
            options: vec!["a".to_string(), "b".to_string()],
            answer: Some("a".to_string()),
        })
    }

    fn multipart(part_scores: &[i64]) -> Question {
        Question::Multipart(MultipartQuestion {
            text: "m".to_string(),
            parts: part_scores
                .iter()
                .map(|s| {
                    Part::ShortAnswer(TextQuestion {
                        text: "p".to_string(),
                        score: *s,
                        answer: Some("x".to_string()),
                    })
                })
                .collect(),
        })
    }

    fn bank() -> Vec<Question> {
        vec![
            short(1),
            choice(2),
            short(3),
            choice(1),
            multipart(&[1, 2]),
            short(0),
            choice(5),
        ]
    }

    fn counts(pairs: &[(QuestionKind, u32)]) -> BTreeMap<QuestionKind, u32> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_count_mode_length_types_and_uniqueness() {
        let questions = bank();
        let requested = counts(&[
            (QuestionKind::ShortAnswer, 2),
            (QuestionKind::MultipleChoice, 10),
            (QuestionKind::MultipleSelect, 4),
        ]);

        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected = select_by_count(&questions, &requested, &mut rng);

            // min(2, 3) short answers + min(10, 3) choices, no multiple-select exists.
            assert_eq!(selected.len(), 5);
            let unique: HashSet<_> = selected.iter().collect();
            assert_eq!(unique.len(), selected.len());
            for i in &selected {
                let kind = questions[*i].kind();
                assert!(requested.get(&kind).copied().unwrap_or(0) > 0);
            }
        }
    }

    #[test]
    fn test_count_mode_all_zero_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let requested = counts(&[(QuestionKind::ShortAnswer, 0), (QuestionKind::Multipart, 0)]);

        assert!(select_by_count(&bank(), &requested, &mut rng).is_empty());
    }

    #[test]
    fn test_count_mode_interleaves_types() {
        let questions = bank();
        let requested = counts(&[(QuestionKind::ShortAnswer, 3), (QuestionKind::MultipleChoice, 3)]);

        let orders: HashSet<Vec<QuestionKind>> = (0..50)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                select_by_count(&questions, &requested, &mut rng)
                    .into_iter()
                    .map(|i| questions[i].kind())
                    .collect()
            })
            .collect();

        // Type order varies between attempts rather than always grouping by type.
        assert!(orders.len() > 2);
    }

    #[test]
    fn test_score_mode_reaches_target_minimally() {
        let questions = bank();

        for target in 1..=14 {
            for seed in 0..30 {
                let mut rng = StdRng::seed_from_u64(seed);
                let selected = select_by_score(&questions, target, &mut rng);
                let total: i64 = selected.iter().map(|i| questions[*i].score()).sum();
                assert!(total >= target, "target {} got {}", target, total);

                let without_last: i64 = selected[..selected.len() - 1]
                    .iter()
                    .map(|i| questions[*i].score())
                    .sum();
                assert!(without_last < target);

                assert!(selected.iter().all(|i| questions[*i].score() > 0));
            }
        }
    }

    #[test]
    fn test_score_mode_unreachable_target_takes_everything_positive() {
        let questions = bank();
        let mut rng = StdRng::seed_from_u64(3);
        let mut selected = select_by_score(&questions, 1_000, &mut rng);
        selected.sort_unstable();

        assert_eq!(selected, vec![0, 1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_score_mode_non_positive_target_is_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(select_by_score(&bank(), 0, &mut rng).is_empty());
        assert!(select_by_score(&bank(), -5, &mut rng).is_empty());
    }

    #[test]
    fn test_select_dispatches_on_mode() {
        let questions = bank();
        let mut rng = StdRng::seed_from_u64(9);
        let config = DisplayConfig {
            mode: DisplayMode::TotalScore,
            parameters: BTreeMap::new(),
            target_score: 3,
        };

        let selected = select(&questions, &config, &mut rng);
        assert!(!selected.is_empty());
    }
}
