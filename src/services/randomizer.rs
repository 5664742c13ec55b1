use crate::models::question::{Choice, QuestionDetails};
use rand::seq::SliceRandom;
use rand::Rng;

/// Presentation-only shuffling of a question's selectable options. Every
/// fetch draws a fresh uniform permutation; nothing is persisted, and the
/// answer key is addressed by stable ids only, so the arrangement a student
/// saw can never influence grading.
pub fn randomize_question(details: &QuestionDetails, rng: &mut impl Rng) -> QuestionDetails {
    match details {
        QuestionDetails::MatchingHeading { items, headings } => {
            QuestionDetails::MatchingHeading {
                items: items.clone(),
                headings: shuffled(headings, rng),
            }
        }
        QuestionDetails::MatchingSentenceEndings { items, endings } => {
            QuestionDetails::MatchingSentenceEndings {
                items: items.clone(),
                endings: shuffled(endings, rng),
            }
        }
        QuestionDetails::MatchingFeatures { items, features } => {
            QuestionDetails::MatchingFeatures {
                items: items.clone(),
                features: shuffled(features, rng),
            }
        }
        QuestionDetails::MultipleChoice { items } => QuestionDetails::MultipleChoice {
            items: items
                .iter()
                .map(|item| {
                    let mut shuffled_item = item.clone();
                    shuffled_item.options.shuffle(rng);
                    shuffled_item
                })
                .collect(),
        },
        // Remaining kinds have no selectable option list to reorder.
        other => other.clone(),
    }
}

fn shuffled(choices: &[Choice], rng: &mut impl Rng) -> Vec<Choice> {
    let mut out = choices.to_vec();
    out.shuffle(rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{AnswerKeyEntry, McqItem, Question, QuestionItem};
    use crate::services::scoring_service::ScoringService;
    use std::collections::{BTreeSet, HashMap};

    fn heading_question() -> Question {
        Question {
            id: 1,
            requirement: "Choose the correct heading for each paragraph.".into(),
            details: QuestionDetails::MatchingHeading {
                items: vec![
                    QuestionItem { id: "1".into(), prompt: "Paragraph A".into() },
                    QuestionItem { id: "2".into(), prompt: "Paragraph B".into() },
                    QuestionItem { id: "3".into(), prompt: "Paragraph C".into() },
                ],
                headings: vec![
                    Choice { id: "A".into(), text: "Origins".into() },
                    Choice { id: "B".into(), text: "Decline".into() },
                    Choice { id: "C".into(), text: "Revival".into() },
                ],
            },
            answer_key: vec![
                AnswerKeyEntry { item_id: "1".into(), value: "A".into(), justification: None },
                AnswerKeyEntry { item_id: "2".into(), value: "C".into(), justification: None },
                AnswerKeyEntry { item_id: "3".into(), value: "B".into(), justification: None },
            ],
            retired_item_ids: vec![],
        }
    }

    #[test]
    fn shuffling_preserves_the_option_set() {
        let question = heading_question();
        let mut rng = rand::thread_rng();
        let randomized = randomize_question(&question.details, &mut rng);

        let ids = |d: &QuestionDetails| -> BTreeSet<String> {
            match d {
                QuestionDetails::MatchingHeading { headings, .. } => {
                    headings.iter().map(|c| c.id.clone()).collect()
                }
                _ => panic!("expected matching_heading"),
            }
        };
        assert_eq!(ids(&question.details), ids(&randomized));
    }

    #[test]
    fn score_is_invariant_under_presentation_order() {
        let question = heading_question();
        let submitted: HashMap<String, String> = [("1", "A"), ("2", "B"), ("3", "B")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let baseline = ScoringService::score_question(&question, &submitted).unwrap();
        assert_eq!(baseline.correct_count(), 2);

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut reordered = question.clone();
            reordered.details = randomize_question(&question.details, &mut rng);
            let score = ScoringService::score_question(&reordered, &submitted).unwrap();
            assert_eq!(score.correct_count(), baseline.correct_count());
            assert_eq!(score.per_item, baseline.per_item);
        }
    }

    #[test]
    fn mcq_options_shuffle_per_item() {
        let details = QuestionDetails::MultipleChoice {
            items: vec![McqItem {
                id: "1".into(),
                prompt: "Pick one".into(),
                options: vec![
                    Choice { id: "A".into(), text: "first".into() },
                    Choice { id: "B".into(), text: "second".into() },
                    Choice { id: "C".into(), text: "third".into() },
                    Choice { id: "D".into(), text: "fourth".into() },
                ],
            }],
        };
        let mut rng = rand::thread_rng();
        let randomized = randomize_question(&details, &mut rng);
        match randomized {
            QuestionDetails::MultipleChoice { items } => {
                let ids: BTreeSet<String> =
                    items[0].options.iter().map(|o| o.id.clone()).collect();
                assert_eq!(ids.len(), 4);
            }
            _ => panic!("expected multiple_choice"),
        }
    }
}
