//! Multi-factor scoring of analyst rating actions.
//!
//! Records are grouped by ticker; each group is scored on the strongest individual record,
//! cross-brokerage consensus and time-decayed momentum, plus live market factors when a
//! snapshot for the ticker is available. Everything here is pure and synchronous.

pub mod composite;
pub mod consensus;
pub mod enrichment;
pub mod rank;
pub mod reasons;
pub mod signal;
pub mod tables;

use crate::domain::market::MarketSnapshot;
use crate::domain::rating::RatingAction;
use crate::domain::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

pub use composite::Regime;
pub use tables::LookupTables;

/// A sub-score with its optional explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    pub score: f64,
    pub reason: Option<String>,
}

impl Factor {
    pub fn new(score: f64) -> Self {
        Self { score, reason: None }
    }

    pub fn with_reason(score: f64, reason: String) -> Self {
        Self {
            score,
            reason: Some(reason),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0)
    }
}

/// Partitions records by exact ticker; input order is kept inside each group.
pub fn group_by_ticker(records: &[RatingAction]) -> BTreeMap<&str, Vec<&RatingAction>> {
    let mut groups: BTreeMap<&str, Vec<&RatingAction>> = BTreeMap::new();
    for record in records {
        groups.entry(record.ticker.as_str()).or_default().push(record);
    }
    groups
}

/// Scores every ticker in the batch and returns them ranked, without truncation.
pub fn recommend(
    records: &[RatingAction],
    snapshots: &HashMap<String, MarketSnapshot>,
    now: DateTime<Utc>,
    tables: &LookupTables,
) -> Vec<Recommendation> {
    let groups = group_by_ticker(records);
    let mut out = Vec::with_capacity(groups.len());

    for (ticker, group) in &groups {
        let regime = Regime::select(snapshots.get(*ticker));
        if let Some(rec) = composite::score_group(group, regime, now, tables) {
            out.push(rec);
        }
    }

    let scored = out.len();
    let ranked = rank::rank(out, usize::MAX);
    tracing::debug!(
        records = records.len(),
        tickers = scored,
        enriched = snapshots.len(),
        ranked = ranked.len(),
        "scored rating actions"
    );
    ranked
}
