//! LeetCode GraphQL client.

use futures::future::BoxFuture;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use super::{FetchError, GraphQlResponse, StatsSource};

/// Profile query. Aliases match the field names in [`super::payload`].
pub const PROFILE_QUERY: &str = r#"
query userProfile($username: String!) {
  userInfo: matchedUser(username: $username) {
    userCalendar {
      activeYears
      submissionCalendar
      totalActiveDays
      streak
    }
    problemsSolved: submitStats {
      acSubmissionNum {
        difficulty
        count
      }
    }
    profile {
      ranking
    }
    badges {
      id
      displayName
      icon
      category
    }
  }
  allQuestionsCount {
    difficulty
    count
  }
  contestInfo: userContestRanking(username: $username) {
    rating
    topPercentage
  }
}
"#;

const USER_AGENT: &str = concat!("cpstats/", env!("CARGO_PKG_VERSION"));

/// Fetches profiles from the public GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct LeetCodeClient {
    http: Client,
    endpoint: String,
}

impl LeetCodeClient {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    async fn query_profile(&self, username: &str) -> Result<GraphQlResponse, FetchError> {
        let body = serde_json::json!({
            "query": PROFILE_QUERY,
            "variables": { "username": username },
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .header(header::REFERER, "https://leetcode.com")
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(classify_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Invalid(e.to_string()))
    }
}

impl StatsSource for LeetCodeClient {
    fn fetch_profile<'a>(
        &'a self,
        username: &'a str,
    ) -> BoxFuture<'a, Result<GraphQlResponse, FetchError>> {
        Box::pin(self.query_profile(username))
    }
}

fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_decode() {
        FetchError::Invalid(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}
