use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One analyst event: a brokerage changing or reiterating a rating and/or price target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAction {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub ticker: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub brokerage: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub rating_from: String,
    #[serde(default)]
    pub rating_to: String,
    /// Zero means the previous target is unknown.
    #[serde(default)]
    pub target_from: f64,
    #[serde(default)]
    pub target_to: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Ticker,
    Company,
    Action,
    TargetTo,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Unknown columns fall back to `created_at`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ticker" => Self::Ticker,
            "company" => Self::Company,
            "action" => Self::Action,
            "targetTo" | "target_to" => Self::TargetTo,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingFilter {
    /// Case-insensitive substring over ticker or company.
    pub search: Option<String>,
    pub ticker: Option<String>,
    /// Case-insensitive substring over the action text.
    pub action: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for RatingFilter {
    fn default() -> Self {
        Self {
            search: None,
            ticker: None,
            action: None,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
            limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatingPage {
    pub records: Vec<RatingAction>,
    pub total_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_record_with_missing_optionals() {
        let v = json!({
            "ticker": "AAPL",
            "brokerage": "Morgan Stanley",
            "action": "upgraded by",
            "ratingFrom": "Hold",
            "ratingTo": "Buy",
            "targetFrom": 180.0,
            "targetTo": 220.0,
            "createdAt": "2026-01-27T10:00:00Z"
        });

        let rec: RatingAction = serde_json::from_value(v).unwrap();
        assert_eq!(rec.ticker, "AAPL");
        assert_eq!(rec.rating_to, "Buy");
        assert_eq!(rec.company, "");
        assert!(rec.id.is_none());
    }

    #[test]
    fn sort_params_fall_back_to_created_at_desc() {
        assert_eq!(SortField::parse("targetTo"), SortField::TargetTo);
        assert_eq!(SortField::parse("target_to"), SortField::TargetTo);
        assert_eq!(SortField::parse("drop table"), SortField::CreatedAt);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }
}
