//! Per-question aggregation over a survey's responses
//!
//! Everything here is a pure function of the question definition and the
//! already-fetched response list. Malformed answers are skipped, never
//! reported as errors, so a single bad row cannot break a dashboard.
//!
//! | question type                       | summary                                 |
//! |-------------------------------------|-----------------------------------------|
//! | `text`                              | non-empty answers, response order       |
//! | `scale`                             | one-decimal average + 1..=10 histogram  |
//! | `single_choice` / `multiple_choice` | count per option, undeclared values too |

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::model::{Answer, Question, QuestionKind, SurveyResponse};

/// Lowest bucket of the scale histogram
pub const SCALE_MIN: i64 = 1;
/// Highest bucket of the scale histogram
pub const SCALE_MAX: i64 = 10;

/// Aggregated result for one question
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionSummary {
    Text { answers: Vec<String> },
    Scale(ScaleSummary),
    Choice(ChoiceSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleSummary {
    /// Mean of the valid answers rounded to one decimal, 0 when there are none
    pub average: f64,
    /// Buckets 1..=10, all present even when zero
    pub counts: BTreeMap<u8, u64>,
    /// Number of answers that parsed and fell inside 1..=10
    pub valid_answers: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceSummary {
    /// Declared options first in declared order, then undeclared values in first-seen order
    pub counts: Vec<OptionCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionCount {
    pub option: String,
    pub count: u64,
    /// False when the value is not one of the question's options (definition drift)
    pub declared: bool,
}

impl ChoiceSummary {
    /// Count for `option`, 0 if it never appeared
    pub fn count_of(&self, option: &str) -> u64 {
        self.counts
            .iter()
            .find(|c| c.option == option)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Summarise one question over every response to its survey
pub fn summarize(question: &Question, responses: &[SurveyResponse]) -> QuestionSummary {
    let answers = responses
        .iter()
        .filter_map(|r| r.answers.get(question.id()));

    match question.kind() {
        QuestionKind::Text => QuestionSummary::Text {
            answers: collect_text(answers),
        },
        QuestionKind::Scale => QuestionSummary::Scale(summarize_scale(answers)),
        QuestionKind::SingleChoice | QuestionKind::MultipleChoice => {
            QuestionSummary::Choice(summarize_choice(question.options(), answers))
        }
    }
}

fn collect_text<'a>(answers: impl Iterator<Item = &'a Answer>) -> Vec<String> {
    answers
        .filter_map(|a| match a {
            Answer::One(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
        .collect()
}

/// Histogram and average over scale answers
pub fn summarize_scale<'a>(answers: impl Iterator<Item = &'a Answer>) -> ScaleSummary {
    let mut counts: BTreeMap<u8, u64> = (SCALE_MIN..=SCALE_MAX).map(|b| (b as u8, 0)).collect();
    let mut sum: u64 = 0;
    let mut valid: u64 = 0;

    for answer in answers {
        let Answer::One(raw) = answer else { continue };
        let Some(value) = parse_leading_int(raw) else { continue };
        if !(SCALE_MIN..=SCALE_MAX).contains(&value) {
            continue;
        }
        if let Some(bucket) = counts.get_mut(&(value as u8)) {
            *bucket += 1;
        }
        sum += value as u64;
        valid += 1;
    }

    ScaleSummary {
        average: mean_one_decimal(sum, valid),
        counts,
        valid_answers: valid,
    }
}

/// Count per option. Undeclared values are kept under their literal key.
pub fn summarize_choice<'a>(
    options: &[String],
    answers: impl Iterator<Item = &'a Answer>,
) -> ChoiceSummary {
    let mut counts: Vec<OptionCount> = Vec::with_capacity(options.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(options.len());

    for option in options {
        if index.contains_key(option) {
            continue;
        }
        index.insert(option.clone(), counts.len());
        counts.push(OptionCount {
            option: option.clone(),
            count: 0,
            declared: true,
        });
    }

    let mut bump = |value: &str| {
        if value.is_empty() {
            return;
        }
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push(OptionCount {
                    option: value.to_string(),
                    count: 1,
                    declared: false,
                });
            }
        }
    };

    for answer in answers {
        match answer {
            Answer::One(value) => bump(value),
            Answer::Many(values) => {
                // A selection set: repeating a value in one response counts once
                let mut seen = HashSet::new();
                for value in values {
                    if seen.insert(value.as_str()) {
                        bump(value);
                    }
                }
            }
        }
    }

    ChoiceSummary { counts }
}

/// Integer prefix of `raw`: leading whitespace, optional sign, then digits.
/// Trailing characters are ignored ("7 stars" is 7); no digits means `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// `sum / n` rounded half-up to one decimal place; 0 when `n == 0`
fn mean_one_decimal(sum: u64, n: u64) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let tenths = (sum * 20 + n) / (2 * n);
    tenths as f64 / 10.0
}

/// `count / total * 100` rounded half-up to a whole percent; 0 when `total == 0`
pub fn percentage(count: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (count * 200 + total) / (2 * total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerSheet;

    fn response(id: &str, answers: Vec<(&str, Answer)>) -> SurveyResponse {
        SurveyResponse {
            id: id.into(),
            survey_id: "s1".into(),
            answers: answers
                .into_iter()
                .map(|(q, a)| (q.to_string(), a))
                .collect::<AnswerSheet>(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    fn one(s: &str) -> Answer {
        Answer::One(s.into())
    }

    fn many(values: &[&str]) -> Answer {
        Answer::Many(values.iter().map(|s| s.to_string()).collect())
    }

    fn single_choice(options: &[&str]) -> Question {
        Question::SingleChoice {
            id: "q".into(),
            text: "Pick".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn multiple_choice(options: &[&str]) -> Question {
        Question::MultipleChoice {
            id: "q".into(),
            text: "Pick any".into(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn scale() -> Question {
        Question::Scale {
            id: "q".into(),
            text: "Rate".into(),
        }
    }

    fn text() -> Question {
        Question::Text {
            id: "q".into(),
            text: "Why?".into(),
        }
    }

    #[test]
    fn test_scale_excludes_junk_and_out_of_range() {
        let responses = vec![
            response("r1", vec![("q", one("3"))]),
            response("r2", vec![("q", one("7"))]),
            response("r3", vec![("q", one("7"))]),
            response("r4", vec![("q", one("x"))]),
            response("r5", vec![("q", one("11"))]),
        ];

        let QuestionSummary::Scale(summary) = summarize(&scale(), &responses) else {
            panic!("expected scale summary");
        };

        assert_eq!(summary.average, 5.7);
        assert_eq!(summary.valid_answers, 3);
        assert_eq!(summary.counts.len(), 10);
        assert_eq!(summary.counts[&7], 2);
        assert_eq!(summary.counts[&3], 1);
        let others: u64 = summary
            .counts
            .iter()
            .filter(|(k, _)| **k != 3 && **k != 7)
            .map(|(_, v)| *v)
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn test_scale_empty_is_zero() {
        let QuestionSummary::Scale(summary) = summarize(&scale(), &[]) else {
            panic!("expected scale summary");
        };
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.valid_answers, 0);
        assert!(summary.counts.values().all(|c| *c == 0));
        assert_eq!(
            summary.counts.keys().copied().collect::<Vec<_>>(),
            (1..=10).collect::<Vec<u8>>()
        );
    }

    #[test]
    fn test_scale_drops_zero_and_negative() {
        let answers = [one("0"), one("-3"), one("10"), many(&["5"])];
        let summary = summarize_scale(answers.iter());
        assert_eq!(summary.valid_answers, 1);
        assert_eq!(summary.counts[&10], 1);
        assert_eq!(summary.average, 10.0);
    }

    #[test]
    fn test_scale_average_rounds_half_up() {
        // 7 / 4 = 1.75 -> 1.8
        let answers = [one("1"), one("2"), one("2"), one("2")];
        assert_eq!(summarize_scale(answers.iter()).average, 1.8);

        let answers = [one("1"), one("1"), one("1"), one("2")];
        // 5 / 4 = 1.25 -> 1.3
        assert_eq!(summarize_scale(answers.iter()).average, 1.3);
    }

    #[test]
    fn test_single_choice_counts_undeclared_values() {
        let responses = vec![
            response("r1", vec![("q", one("A"))]),
            response("r2", vec![("q", one("A"))]),
            response("r3", vec![("q", one("C"))]),
        ];

        let QuestionSummary::Choice(summary) = summarize(&single_choice(&["A", "B"]), &responses)
        else {
            panic!("expected choice summary");
        };

        let pairs: Vec<(&str, u64, bool)> = summary
            .counts
            .iter()
            .map(|c| (c.option.as_str(), c.count, c.declared))
            .collect();
        assert_eq!(pairs, vec![("A", 2, true), ("B", 0, true), ("C", 1, false)]);
    }

    #[test]
    fn test_multiple_choice_increments_each_selection() {
        let responses = vec![
            response("r1", vec![("q", many(&["A", "B"]))]),
            response("r2", vec![("q", many(&["B"]))]),
        ];

        let QuestionSummary::Choice(summary) =
            summarize(&multiple_choice(&["A", "B", "C"]), &responses)
        else {
            panic!("expected choice summary");
        };

        assert_eq!(summary.count_of("A"), 1);
        assert_eq!(summary.count_of("B"), 2);
        assert_eq!(summary.count_of("C"), 0);
    }

    #[test]
    fn test_multiple_choice_repeated_selection_counts_once() {
        let answers = [many(&["A", "A", ""])];
        let summary = summarize_choice(&["A".to_string()], answers.iter());
        assert_eq!(summary.count_of("A"), 1);
        assert_eq!(summary.counts.len(), 1);
    }

    #[test]
    fn test_choice_empty_responses() {
        let QuestionSummary::Choice(summary) = summarize(&single_choice(&["A", "B"]), &[]) else {
            panic!("expected choice summary");
        };
        assert_eq!(summary.counts.len(), 2);
        assert!(summary.counts.iter().all(|c| c.count == 0 && c.declared));
    }

    #[test]
    fn test_text_keeps_non_empty_in_response_order() {
        let responses = vec![
            response("r1", vec![("q", one(""))]),
            response("r2", vec![("q", one("hello"))]),
            response("r3", vec![("other", one("ignored"))]),
            response("r4", vec![("q", one("world"))]),
        ];

        assert_eq!(
            summarize(&text(), &responses),
            QuestionSummary::Text {
                answers: vec!["hello".into(), "world".into()],
            }
        );
    }

    #[test]
    fn test_text_null_answer_skipped() {
        let sheet: AnswerSheet = serde_json::from_str(r#"{"q": null}"#).unwrap();
        let responses = vec![
            response("r1", vec![("q", one(""))]),
            response("r2", vec![("q", one("hello"))]),
            SurveyResponse {
                id: "r3".into(),
                survey_id: "s1".into(),
                answers: sheet,
                created_at: "2026-01-01T00:00:00.000Z".into(),
            },
        ];

        assert_eq!(
            summarize(&text(), &responses),
            QuestionSummary::Text {
                answers: vec!["hello".into()],
            }
        );
    }

    #[test]
    fn test_text_empty() {
        assert_eq!(
            summarize(&text(), &[]),
            QuestionSummary::Text { answers: vec![] }
        );
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("7"), Some(7));
        assert_eq!(parse_leading_int("  8"), Some(8));
        assert_eq!(parse_leading_int("7.9"), Some(7));
        assert_eq!(parse_leading_int("3 stars"), Some(3));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int("+4"), Some(4));
        assert_eq!(parse_leading_int("x"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("99999999999999999999999"), None);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(5, 0), 0);
    }

    #[test]
    fn test_summary_json_shape() {
        let answers = [one("A")];
        let summary = QuestionSummary::Choice(summarize_choice(&["A".to_string()], answers.iter()));
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["kind"], "choice");
        assert_eq!(value["counts"][0]["option"], "A");
        assert_eq!(value["counts"][0]["count"], 1);
    }
}
