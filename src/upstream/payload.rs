//! Raw GraphQL response types.
//!
//! Mirrors the aliases used in the profile query. Every nested field is
//! optional here; the normalizer decides what is required.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<ProfileData>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user_info: Option<MatchedUser>,
    pub all_questions_count: Option<Vec<DifficultyCount>>,
    pub contest_info: Option<ContestRanking>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedUser {
    pub user_calendar: Option<UserCalendar>,
    pub problems_solved: Option<SubmitStats>,
    pub profile: Option<UserProfile>,
    pub badges: Option<Vec<RawBadge>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCalendar {
    pub active_years: Option<Vec<i32>>,
    /// JSON-encoded `{"<unix day>": count}` object.
    pub submission_calendar: Option<String>,
    pub total_active_days: Option<u32>,
    pub streak: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitStats {
    pub ac_submission_num: Option<Vec<DifficultyCount>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub ranking: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBadge {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub icon: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestRanking {
    pub rating: Option<f64>,
    pub top_percentage: Option<f64>,
}
