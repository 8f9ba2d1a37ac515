use crate::domain::market::MarketSnapshot;
use crate::domain::rating::RatingAction;
use crate::domain::recommendation::Recommendation;
use crate::scoring::consensus::{consensus, distinct_brokerages, momentum};
use crate::scoring::enrichment::{market_factors, MarketFactors};
use crate::scoring::signal::{analyst_upside, score_record, SignalScores};
use crate::scoring::tables::LookupTables;
use crate::scoring::Factor;
use chrono::{DateTime, Utc};

/// Weights used when no market snapshot is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackWeights {
    pub upgrade: f64,
    pub target: f64,
    pub action: f64,
    pub consensus: f64,
    pub momentum: f64,
}

pub const FALLBACK_WEIGHTS: FallbackWeights = FallbackWeights {
    upgrade: 0.20,
    target: 0.20,
    action: 0.20,
    consensus: 0.25,
    momentum: 0.15,
};

/// Weights used when a market snapshot is available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedWeights {
    pub upgrade: f64,
    pub target: f64,
    pub action: f64,
    pub consensus: f64,
    pub momentum: f64,
    pub real_upside: f64,
    pub market_cap: f64,
    pub price_trend: f64,
}

pub const ENRICHED_WEIGHTS: EnrichedWeights = EnrichedWeights {
    upgrade: 0.15,
    target: 0.10,
    action: 0.15,
    consensus: 0.20,
    momentum: 0.10,
    real_upside: 0.15,
    market_cap: 0.10,
    price_trend: 0.05,
};

impl FallbackWeights {
    /// Weighted sum of one record's sub-scores; also ranks records inside a group.
    pub fn individual(&self, s: &SignalScores) -> f64 {
        s.upgrade * self.upgrade + s.target * self.target + s.action * self.action
    }

    pub fn combine(&self, best: &SignalScores, consensus: f64, momentum: f64) -> f64 {
        (self.individual(best) + consensus * self.consensus + momentum * self.momentum) / 10.0
    }
}

impl EnrichedWeights {
    pub fn combine(
        &self,
        best: &SignalScores,
        consensus: f64,
        momentum: f64,
        market: &MarketFactors,
    ) -> f64 {
        (best.upgrade * self.upgrade
            + best.target * self.target
            + best.action * self.action
            + consensus * self.consensus
            + momentum * self.momentum
            + market.real_upside.score * self.real_upside
            + market.market_cap.score * self.market_cap
            + market.price_trend.score * self.price_trend)
            / 10.0
    }
}

/// Selected per ticker by whether a market snapshot is present.
#[derive(Debug, Clone, Copy)]
pub enum Regime<'a> {
    Fallback,
    Enriched(&'a MarketSnapshot),
}

impl<'a> Regime<'a> {
    pub fn select(snapshot: Option<&'a MarketSnapshot>) -> Self {
        match snapshot {
            Some(s) => Self::Enriched(s),
            None => Self::Fallback,
        }
    }
}

/// Scores one ticker group. `group` must be non-empty.
pub fn score_group(
    group: &[&RatingAction],
    regime: Regime<'_>,
    now: DateTime<Utc>,
    tables: &LookupTables,
) -> Option<Recommendation> {
    let (representative, best) = best_representative(group, tables)?;
    let consensus = consensus(group, tables);
    let momentum = momentum(group, now, tables);

    let mut reasons = best.reasons.clone();
    push_reason(&mut reasons, &consensus);
    push_reason(&mut reasons, &momentum);

    let mut upside = analyst_upside(group);

    let (raw, market_snapshot) = match regime {
        Regime::Fallback => (
            FALLBACK_WEIGHTS.combine(&best, consensus.score, momentum.score),
            None,
        ),
        Regime::Enriched(snapshot) => {
            let market = market_factors(group, snapshot, tables);
            push_reason(&mut reasons, &market.real_upside);
            push_reason(&mut reasons, &market.market_cap);
            push_reason(&mut reasons, &market.price_trend);
            if let Some(pct) = market.upside_percent {
                upside = pct;
            }
            (
                ENRICHED_WEIGHTS.combine(&best, consensus.score, momentum.score, &market),
                Some(snapshot.clone()),
            )
        }
    };

    Some(Recommendation {
        rating: representative.clone(),
        composite_score: round_one_decimal(raw),
        reasons,
        upside_potential: round_one_decimal(upside),
        analyst_count: distinct_brokerages(group),
        market_snapshot,
    })
}

/// Highest individually-scored record; the first one wins ties.
fn best_representative<'r>(
    group: &[&'r RatingAction],
    tables: &LookupTables,
) -> Option<(&'r RatingAction, SignalScores)> {
    let mut iter = group.iter();
    let first = *iter.next()?;
    let mut best = (first, score_record(first, tables));
    let mut best_score = FALLBACK_WEIGHTS.individual(&best.1);

    for &record in iter {
        let scores = score_record(record, tables);
        let s = FALLBACK_WEIGHTS.individual(&scores);
        if s > best_score {
            best_score = s;
            best = (record, scores);
        }
    }

    Some(best)
}

fn push_reason(reasons: &mut Vec<String>, factor: &Factor) {
    if let Some(r) = factor.reason.as_ref().filter(|r| !r.is_empty()) {
        reasons.push(r.clone());
    }
}

/// Rounds half away from zero to one decimal place.
pub fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
