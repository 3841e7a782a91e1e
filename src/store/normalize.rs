//! Validation and normalization of upstream payloads.
//!
//! A payload either passes every check and becomes a [`StatsSnapshot`],
//! or is rejected as a whole. Nothing partially valid reaches the cache.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::calendar::SubmissionCalendar;
use super::types::{Badge, CalendarInfo, ContestInfo, Difficulty, StatsSnapshot, UserInfo};
use crate::upstream::{DifficultyCount, FetchError, GraphQlResponse};

/// Turns a raw GraphQL response into a snapshot stamped with `fetched_at`.
pub fn normalize(
    response: GraphQlResponse,
    fetched_at: DateTime<Utc>,
) -> Result<StatsSnapshot, FetchError> {
    if let Some(first) = response.errors.first() {
        return Err(invalid(format!("GraphQL error: {}", first.message)));
    }

    let data = response
        .data
        .ok_or_else(|| invalid("response has no data"))?;
    let user = data
        .user_info
        .ok_or_else(|| invalid("response has no userInfo"))?;

    let solved = user
        .problems_solved
        .and_then(|s| s.ac_submission_num)
        .unwrap_or_default();
    let totals = data.all_questions_count.unwrap_or_default();

    let easy_solved = count_for(&solved, Difficulty::Easy);
    let medium_solved = count_for(&solved, Difficulty::Medium);
    let hard_solved = count_for(&solved, Difficulty::Hard);
    let total_solved = match lookup(&solved, Difficulty::All) {
        Some(count) => count,
        None => sum_tiers("solved", [easy_solved, medium_solved, hard_solved])?,
    };

    let total_easy = count_for(&totals, Difficulty::Easy);
    let total_medium = count_for(&totals, Difficulty::Medium);
    let total_hard = count_for(&totals, Difficulty::Hard);
    let total_questions = match lookup(&totals, Difficulty::All) {
        Some(count) => count,
        None => sum_tiers("question", [total_easy, total_medium, total_hard])?,
    };

    for (tier, solved, total) in [
        (Difficulty::All, total_solved, total_questions),
        (Difficulty::Easy, easy_solved, total_easy),
        (Difficulty::Medium, medium_solved, total_medium),
        (Difficulty::Hard, hard_solved, total_hard),
    ] {
        if total > 0 && solved > total {
            return Err(invalid(format!(
                "{} solved count {} exceeds total {}",
                tier.label(),
                solved,
                total
            )));
        }
    }

    let contest = data.contest_info.unwrap_or_default();
    let rating = contest.rating.unwrap_or(0.0);
    let top_percentage = contest.top_percentage.unwrap_or(0.0);
    if !rating.is_finite() || rating < 0.0 {
        return Err(invalid(format!("contest rating {rating} out of range")));
    }
    if !top_percentage.is_finite() || !(0.0..=100.0).contains(&top_percentage) {
        return Err(invalid(format!(
            "contest percentile {top_percentage} out of range"
        )));
    }

    let user_calendar = user.user_calendar.unwrap_or_default();
    let submission_calendar = match user_calendar.submission_calendar {
        Some(encoded) => SubmissionCalendar::decode(&Value::String(encoded)).map_err(invalid)?,
        None => SubmissionCalendar::new(),
    };

    let badges = user
        .badges
        .unwrap_or_default()
        .into_iter()
        .map(|b| Badge {
            id: b.id.unwrap_or_default(),
            display_name: b.display_name.unwrap_or_default(),
            icon: b.icon.unwrap_or_default(),
            category: b.category.unwrap_or_default(),
        })
        .collect();

    Ok(StatsSnapshot {
        user_info: UserInfo {
            total_solved,
            total_questions,
            easy_solved,
            total_easy,
            medium_solved,
            total_medium,
            hard_solved,
            total_hard,
            ranking: user.profile.and_then(|p| p.ranking).unwrap_or(0),
            badges,
        },
        contest_info: ContestInfo {
            rating,
            top_percentage,
        },
        calendar: CalendarInfo {
            submission_calendar,
            total_active_days: user_calendar.total_active_days.unwrap_or(0),
            streak: user_calendar.streak.unwrap_or(0),
            active_years: user_calendar.active_years.unwrap_or_default(),
        },
        last_updated: fetched_at,
    })
}

fn lookup(counts: &[DifficultyCount], difficulty: Difficulty) -> Option<u64> {
    counts
        .iter()
        .find(|c| Difficulty::from_label(&c.difficulty) == Some(difficulty))
        .map(|c| c.count)
}

fn count_for(counts: &[DifficultyCount], difficulty: Difficulty) -> u64 {
    lookup(counts, difficulty).unwrap_or(0)
}

/// Sum of the per-tier counts, used when the "All" entry is missing.
fn sum_tiers(what: &str, counts: [u64; 3]) -> Result<u64, FetchError> {
    counts
        .into_iter()
        .try_fold(0u64, |acc, count| acc.checked_add(count))
        .ok_or_else(|| invalid(format!("{what} counts overflow")))
}

fn invalid(reason: impl Into<String>) -> FetchError {
    FetchError::Invalid(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_717_200_000, 0).unwrap()
    }

    fn parse(value: Value) -> GraphQlResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_contest_defaults_to_zero() {
        let response = parse(json!({
            "data": {
                "userInfo": {
                    "problemsSolved": {"acSubmissionNum": [
                        {"difficulty": "Easy", "count": 5},
                        {"difficulty": "Medium", "count": 3},
                        {"difficulty": "Hard", "count": 1}
                    ]}
                },
                "allQuestionsCount": [
                    {"difficulty": "Easy", "count": 10},
                    {"difficulty": "Medium", "count": 10},
                    {"difficulty": "Hard", "count": 10}
                ],
                "contestInfo": null
            }
        }));

        let snapshot = normalize(response, now()).unwrap();
        let info = &snapshot.user_info;

        assert_eq!((info.easy_solved, info.total_easy), (5, 10));
        assert_eq!((info.medium_solved, info.total_medium), (3, 10));
        assert_eq!((info.hard_solved, info.total_hard), (1, 10));
        assert_eq!(info.total_solved, 9);
        assert_eq!(info.total_questions, 30);
        assert_eq!(snapshot.contest_info.rating, 0.0);
        assert_eq!(snapshot.contest_info.top_percentage, 0.0);
        assert!(snapshot.calendar.submission_calendar.is_empty());
        assert!(info.badges.is_empty());
        assert_eq!(snapshot.last_updated, now());
    }

    #[test]
    fn test_full_payload() {
        let response = parse(json!({
            "data": {
                "userInfo": {
                    "userCalendar": {
                        "activeYears": [2024],
                        "submissionCalendar": "{\"1704067200\": 3}",
                        "totalActiveDays": 1,
                        "streak": 1
                    },
                    "problemsSolved": {"acSubmissionNum": [
                        {"difficulty": "All", "count": 12},
                        {"difficulty": "Easy", "count": 6},
                        {"difficulty": "Medium", "count": 4},
                        {"difficulty": "Hard", "count": 2}
                    ]},
                    "profile": {"ranking": 4242},
                    "badges": [{"id": "7", "displayName": "Knight", "icon": "https://x/k.png", "category": "COMPETITION"}]
                },
                "allQuestionsCount": [{"difficulty": "All", "count": 3000}],
                "contestInfo": {"rating": 1850.5, "topPercentage": 7.25}
            }
        }));

        let snapshot = normalize(response, now()).unwrap();

        assert_eq!(snapshot.user_info.total_solved, 12);
        assert_eq!(snapshot.user_info.total_questions, 3000);
        assert_eq!(snapshot.user_info.ranking, 4242);
        assert_eq!(snapshot.user_info.badges[0].display_name, "Knight");
        assert_eq!(snapshot.contest_info.rating, 1850.5);
        assert_eq!(snapshot.calendar.submission_calendar.total(), 3);
        assert_eq!(snapshot.calendar.active_years, vec![2024]);
    }

    #[test]
    fn test_rejects_missing_user() {
        let response = parse(json!({"data": {"userInfo": null}}));
        assert!(matches!(normalize(response, now()), Err(FetchError::Invalid(_))));

        let response = parse(json!({"data": null}));
        assert!(matches!(normalize(response, now()), Err(FetchError::Invalid(_))));
    }

    #[test]
    fn test_rejects_graphql_errors() {
        let response = parse(json!({
            "data": {"userInfo": {}},
            "errors": [{"message": "rate limited"}]
        }));
        let err = normalize(response, now()).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_rejects_malformed_calendar() {
        let response = parse(json!({
            "data": {"userInfo": {"userCalendar": {"submissionCalendar": "{oops"}}}
        }));
        assert!(matches!(normalize(response, now()), Err(FetchError::Invalid(_))));
    }

    #[test]
    fn test_rejects_out_of_range_contest() {
        let response = parse(json!({
            "data": {
                "userInfo": {},
                "contestInfo": {"rating": 1500.0, "topPercentage": 140.0}
            }
        }));
        assert!(normalize(response, now()).is_err());
    }

    #[test]
    fn test_rejects_solved_above_total() {
        let response = parse(json!({
            "data": {
                "userInfo": {"problemsSolved": {"acSubmissionNum": [{"difficulty": "Hard", "count": 11}]}},
                "allQuestionsCount": [{"difficulty": "Hard", "count": 10}]
            }
        }));
        assert!(normalize(response, now()).is_err());
    }

    #[test]
    fn test_rejects_overflowing_tier_counts() {
        let response = parse(json!({
            "data": {
                "userInfo": {"problemsSolved": {"acSubmissionNum": [
                    {"difficulty": "Easy", "count": u64::MAX},
                    {"difficulty": "Medium", "count": u64::MAX}
                ]}},
                "allQuestionsCount": []
            }
        }));
        assert!(matches!(normalize(response, now()), Err(FetchError::Invalid(_))));
    }

    #[test]
    fn test_huge_calendar_counts_do_not_overflow() {
        let response = parse(json!({
            "data": {"userInfo": {"userCalendar": {
                "submissionCalendar": format!(
                    "{{\"1704067200\": {max}, \"1704153600\": {max}}}",
                    max = u64::MAX
                )
            }}}
        }));
        let snapshot = normalize(response, now()).unwrap();
        assert_eq!(snapshot.calendar.submission_calendar.total(), u64::MAX);
    }
}
