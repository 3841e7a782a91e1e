//! Sparse submission calendar.
//!
//! Maps the UTC-midnight UNIX timestamp of a day (as a decimal string) to
//! the number of submissions made that day. Upstream delivers it as a
//! JSON-encoded string; consumers may hold it either encoded or decoded.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Day-start timestamp key -> submission count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmissionCalendar(BTreeMap<String, u64>);

impl SubmissionCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strictly decodes a JSON value that is either an object of counts or a
    /// string holding one. `null` decodes to an empty calendar.
    pub fn decode(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::String(encoded) => {
                let trimmed = encoded.trim();
                if trimmed.is_empty() {
                    return Ok(Self::new());
                }
                let inner: Value = serde_json::from_str(trimmed)
                    .map_err(|e| format!("submission calendar is not valid JSON: {e}"))?;
                match inner {
                    Value::Object(_) | Value::Null => Self::decode(&inner),
                    other => Err(format!(
                        "submission calendar must decode to an object, got {}",
                        json_kind(&other)
                    )),
                }
            }
            Value::Object(entries) => {
                let mut days = BTreeMap::new();
                for (key, count) in entries {
                    let day = key
                        .trim()
                        .parse::<i64>()
                        .ok()
                        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                        .ok_or_else(|| format!("calendar key {key:?} is not a UNIX timestamp"))?;
                    let count = count_of(count)
                        .ok_or_else(|| format!("calendar count for {key} is not a count"))?;
                    // Keys are stored as the UTC midnight of their day
                    let total: &mut u64 = days
                        .entry(day_key(day.date_naive()).to_string())
                        .or_insert(0);
                    *total = total.saturating_add(count);
                }
                Ok(Self(days))
            }
            other => Err(format!(
                "submission calendar must be an object or string, got {}",
                json_kind(other)
            )),
        }
    }

    /// Decodes like [`SubmissionCalendar::decode`] but never fails: malformed
    /// input is logged and treated as an empty calendar.
    pub fn from_value_lenient(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::new();
        };
        match Self::decode(value) {
            Ok(calendar) => calendar,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed submission calendar");
                Self::new()
            }
        }
    }

    /// Submissions recorded for the given day.
    pub fn count_on(&self, date: NaiveDate) -> u64 {
        self.0
            .get(&day_key(date).to_string())
            .copied()
            .unwrap_or(0)
    }

    pub fn insert(&mut self, date: NaiveDate, count: u64) {
        self.0.insert(day_key(date).to_string(), count);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.0.values().fold(0, |acc, count| acc.saturating_add(*count))
    }

    /// Entries as `(UTC date, count)`, skipping keys that are not timestamps.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.0.iter().filter_map(|(key, count)| {
            let ts = key.parse::<i64>().ok()?;
            let date = DateTime::<Utc>::from_timestamp(ts, 0)?.date_naive();
            Some((date, *count))
        })
    }
}

impl<'de> Deserialize<'de> for SubmissionCalendar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value).map_err(serde::de::Error::custom)
    }
}

impl FromIterator<(NaiveDate, u64)> for SubmissionCalendar {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, u64)>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for (date, count) in iter {
            calendar.insert(date, count);
        }
        calendar
    }
}

/// UTC-midnight UNIX timestamp of a date.
pub fn day_key(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn count_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_key_is_utc_midnight() {
        assert_eq!(day_key(date(2024, 1, 1)), 1_704_067_200);
        assert_eq!(day_key(date(1970, 1, 1)), 0);
    }

    #[test]
    fn test_decode_encoded_string() {
        let value = json!("{\"1704067200\": 3, \"1704153600\": 1}");
        let calendar = SubmissionCalendar::decode(&value).unwrap();

        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.count_on(date(2024, 1, 1)), 3);
        assert_eq!(calendar.count_on(date(2024, 1, 2)), 1);
        assert_eq!(calendar.count_on(date(2024, 1, 3)), 0);
    }

    #[test]
    fn test_decode_object() {
        let calendar = SubmissionCalendar::decode(&json!({"1704067200": 7})).unwrap();
        assert_eq!(calendar.total(), 7);
    }

    #[test]
    fn test_decode_empty_forms() {
        assert!(SubmissionCalendar::decode(&json!("{}")).unwrap().is_empty());
        assert!(SubmissionCalendar::decode(&json!("")).unwrap().is_empty());
        assert!(SubmissionCalendar::decode(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(SubmissionCalendar::decode(&json!("not json")).is_err());
        assert!(SubmissionCalendar::decode(&json!("[1, 2]")).is_err());
        assert!(SubmissionCalendar::decode(&json!({"yesterday": 1})).is_err());
        assert!(SubmissionCalendar::decode(&json!({"1704067200": -1})).is_err());
        assert!(SubmissionCalendar::decode(&json!(42)).is_err());
    }

    #[test]
    fn test_decode_merges_keys_onto_their_day() {
        let calendar = SubmissionCalendar::decode(&json!({
            "01704067200": 1,
            "+1704067200": 2,
            "1704070800": 3,
            "1704153600": 4
        }))
        .unwrap();

        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.count_on(date(2024, 1, 1)), 6);
        assert_eq!(calendar.count_on(date(2024, 1, 2)), 4);
        assert_eq!(calendar.total(), 10);
    }

    #[test]
    fn test_total_saturates() {
        let calendar = SubmissionCalendar::decode(&json!({
            "1704067200": u64::MAX,
            "1704070800": u64::MAX,
            "1704153600": u64::MAX
        }))
        .unwrap();

        assert_eq!(calendar.count_on(date(2024, 1, 1)), u64::MAX);
        assert_eq!(calendar.total(), u64::MAX);
    }

    #[test]
    fn test_lenient_degrades_to_empty() {
        let garbage = json!("{broken");
        assert!(SubmissionCalendar::from_value_lenient(Some(&garbage)).is_empty());
        assert!(SubmissionCalendar::from_value_lenient(None).is_empty());
    }

    #[test]
    fn test_days_iterates_dates() {
        let calendar: SubmissionCalendar =
            [(date(2024, 2, 29), 2), (date(2023, 12, 31), 5)].into_iter().collect();
        let days: Vec<_> = calendar.days().collect();

        assert!(days.contains(&(date(2024, 2, 29), 2)));
        assert!(days.contains(&(date(2023, 12, 31), 5)));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let calendar: SubmissionCalendar = [(date(2024, 1, 1), 3)].into_iter().collect();
        let json = serde_json::to_string(&calendar).unwrap();
        assert_eq!(json, r#"{"1704067200":3}"#);

        let back: SubmissionCalendar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, calendar);
    }
}
