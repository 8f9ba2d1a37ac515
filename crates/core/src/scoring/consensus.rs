use crate::domain::rating::RatingAction;
use crate::scoring::reasons;
use crate::scoring::tables::LookupTables;
use crate::scoring::Factor;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

const MOMENTUM_DECAY_DAYS: f64 = 30.0;
const MOMENTUM_SATURATION_K: f64 = 2.0;
const BEARISH_SIGNAL_WEIGHT: f64 = 0.5;
const RECENT_WINDOW_DAYS: f64 = 7.0;
const MIN_CONFIDENT_SAMPLE: usize = 3;

/// Share of distinct brokerages with at least one bullish action, damped for fewer than three.
pub fn consensus(group: &[&RatingAction], tables: &LookupTables) -> Factor {
    let mut brokerages = HashSet::new();
    let mut bullish_brokerages = HashSet::new();

    for record in group {
        let brokerage = record.brokerage.to_lowercase();
        if tables.is_bullish(&record.action) {
            bullish_brokerages.insert(brokerage.clone());
        }
        brokerages.insert(brokerage);
    }

    let total = brokerages.len();
    let bullish = bullish_brokerages.len();
    if total == 0 {
        return Factor::zero();
    }

    let mut score = bullish as f64 / total as f64 * 100.0;
    if total < MIN_CONFIDENT_SAMPLE {
        score *= total as f64 / MIN_CONFIDENT_SAMPLE as f64;
    }

    Factor::with_reason(score, reasons::analysts_bullish(bullish, total))
}

/// Recency-weighted net signal mapped onto a saturating `[0, 100)` curve.
///
/// `now` is captured once per scoring pass so every group decays against the same instant.
pub fn momentum(group: &[&RatingAction], now: DateTime<Utc>, tables: &LookupTables) -> Factor {
    let mut weighted = 0.0;
    let mut recent = 0usize;

    for record in group {
        let days = days_since(record.created_at, now);
        let decay = (-days / MOMENTUM_DECAY_DAYS).exp();

        if tables.is_bullish(&record.action) {
            weighted += decay;
        } else {
            weighted -= decay * BEARISH_SIGNAL_WEIGHT;
        }

        if days <= RECENT_WINDOW_DAYS {
            recent += 1;
        }
    }

    if weighted <= 0.0 {
        return Factor::zero();
    }

    let score = weighted / (weighted + MOMENTUM_SATURATION_K) * 100.0;
    if recent > 0 {
        Factor::with_reason(score, reasons::recent_signals(recent))
    } else {
        Factor::new(score)
    }
}

/// Number of distinct brokerages, compared case-insensitively.
pub fn distinct_brokerages(group: &[&RatingAction]) -> usize {
    group
        .iter()
        .map(|r| r.brokerage.to_lowercase())
        .collect::<HashSet<_>>()
        .len()
}

/// Strictly more than half of the records carry a bullish action.
pub fn is_majority_bullish(group: &[&RatingAction], tables: &LookupTables) -> bool {
    let bullish = group.iter().filter(|r| tables.is_bullish(&r.action)).count();
    bullish * 2 > group.len()
}

fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / 86_400_000.0
}
