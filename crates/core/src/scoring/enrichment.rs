use crate::domain::market::MarketSnapshot;
use crate::domain::rating::RatingAction;
use crate::scoring::consensus::is_majority_bullish;
use crate::scoring::reasons;
use crate::scoring::tables::LookupTables;
use crate::scoring::Factor;

const LARGE_CAP_BILLIONS: f64 = 10.0;
const MID_CAP_BILLIONS: f64 = 2.0;
const SMALL_CAP_BILLIONS: f64 = 0.3;

/// Scores derived from a live market snapshot for one ticker group.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketFactors {
    pub real_upside: Factor,
    pub market_cap: Factor,
    pub price_trend: Factor,
    /// Upside of the average analyst target over the current price, when both are known.
    pub upside_percent: Option<f64>,
}

pub fn market_factors(
    group: &[&RatingAction],
    snapshot: &MarketSnapshot,
    tables: &LookupTables,
) -> MarketFactors {
    let upside_percent = upside_over_price(group, snapshot);

    MarketFactors {
        real_upside: real_upside(upside_percent, group, snapshot),
        market_cap: market_cap_tier(snapshot),
        price_trend: price_trend(group, snapshot, tables),
        upside_percent,
    }
}

/// Mean of all positive `target_to` values, or 0 when there are none.
pub fn average_target(group: &[&RatingAction]) -> f64 {
    let (sum, count) = group
        .iter()
        .filter(|r| r.target_to > 0.0)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.target_to, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn upside_over_price(group: &[&RatingAction], snapshot: &MarketSnapshot) -> Option<f64> {
    let avg_target = average_target(group);
    if snapshot.current_price <= 0.0 || avg_target <= 0.0 {
        return None;
    }
    Some((avg_target - snapshot.current_price) / snapshot.current_price * 100.0)
}

fn real_upside(
    upside_percent: Option<f64>,
    group: &[&RatingAction],
    snapshot: &MarketSnapshot,
) -> Factor {
    match upside_percent {
        Some(pct) if pct > 0.0 => Factor::with_reason(
            (pct * 2.0).min(100.0),
            reasons::real_upside(pct, snapshot.current_price, average_target(group)),
        ),
        _ => Factor::zero(),
    }
}

fn market_cap_tier(snapshot: &MarketSnapshot) -> Factor {
    // Unknown size is neutral.
    if snapshot.market_capitalization <= 0.0 {
        return Factor::new(50.0);
    }

    let billions = snapshot.market_capitalization / 1000.0;
    if billions >= LARGE_CAP_BILLIONS {
        Factor::with_reason(100.0, reasons::large_cap(billions))
    } else if billions >= MID_CAP_BILLIONS {
        Factor::with_reason(75.0, reasons::mid_cap(billions))
    } else if billions >= SMALL_CAP_BILLIONS {
        Factor::new(50.0)
    } else {
        Factor::new(25.0)
    }
}

fn price_trend(
    group: &[&RatingAction],
    snapshot: &MarketSnapshot,
    tables: &LookupTables,
) -> Factor {
    let change = snapshot.day_change_percent;
    if change == 0.0 || !is_majority_bullish(group, tables) {
        return Factor::new(50.0);
    }

    if change > 0.0 {
        Factor::with_reason((50.0 + change * 10.0).min(100.0), reasons::price_trend_up(change))
    } else {
        Factor::new((50.0 + change * 10.0).max(0.0))
    }
}
