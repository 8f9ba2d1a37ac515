use crate::domain::rating::RatingAction;
use crate::scoring::reasons;
use crate::scoring::tables::{LookupTables, DEFAULT_ACTION_SCORE};
use crate::scoring::Factor;

/// Sub-scores of a single record, each in `[0, 100]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalScores {
    pub upgrade: f64,
    pub target: f64,
    pub action: f64,
    /// Upgrade, target and action reasons, in that order, when present.
    pub reasons: Vec<String>,
}

pub fn score_record(record: &RatingAction, tables: &LookupTables) -> SignalScores {
    let upgrade = rating_upgrade(record, tables);
    let target = target_increase(record);
    let action = action_type(record, tables);

    let reasons = [&upgrade, &target, &action]
        .into_iter()
        .filter_map(|f| f.reason.clone())
        .collect();

    SignalScores {
        upgrade: upgrade.score,
        target: target.score,
        action: action.score,
        reasons,
    }
}

fn rating_upgrade(record: &RatingAction, tables: &LookupTables) -> Factor {
    let from = tables.rating_strength(&record.rating_from);
    let to = tables.rating_strength(&record.rating_to);

    if to > from && from > 0 {
        let score = f64::from(to - from) / 4.0 * 100.0;
        return Factor::with_reason(
            score,
            reasons::rating_upgraded(&record.rating_from, &record.rating_to),
        );
    }

    if to >= 4 {
        return Factor::with_reason(50.0, reasons::strong_rating(&record.rating_to));
    }

    Factor::zero()
}

fn target_increase(record: &RatingAction) -> Factor {
    match target_change_percent(record) {
        Some(pct) if pct > 0.0 => {
            Factor::with_reason(pct.min(100.0), reasons::target_increased(pct, record.target_to))
        }
        _ => Factor::zero(),
    }
}

fn action_type(record: &RatingAction, tables: &LookupTables) -> Factor {
    match tables.action_score(&record.action) {
        Some(score) => {
            Factor::with_reason(score, reasons::action_by(&record.action, &record.brokerage))
        }
        None => Factor::new(DEFAULT_ACTION_SCORE),
    }
}

/// Percent change from the previous to the new target; `None` when either is unknown.
pub fn target_change_percent(record: &RatingAction) -> Option<f64> {
    if record.target_from <= 0.0 || record.target_to <= 0.0 {
        return None;
    }
    Some((record.target_to - record.target_from) / record.target_from * 100.0)
}

/// Largest analyst-implied upside across the group, floored at zero.
pub fn analyst_upside(group: &[&RatingAction]) -> f64 {
    group
        .iter()
        .filter_map(|r| target_change_percent(r))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::record;

    #[test]
    fn upgrade_scores_tier_distance() {
        let t = LookupTables::global();
        let r = record("AAPL", "MS", "upgraded by", "hold", "buy", 180.0, 220.0);
        let s = score_record(&r, t);
        assert_eq!(s.upgrade, 25.0);
        assert_eq!(s.reasons[0], "Rating upgraded from hold to buy");

        let r = record("AAPL", "MS", "upgraded by", "Strong Sell", "Strong Buy", 0.0, 0.0);
        assert_eq!(score_record(&r, t).upgrade, 100.0);
    }

    #[test]
    fn unknown_from_rating_never_counts_as_upgrade() {
        let t = LookupTables::global();
        let r = record("AAPL", "MS", "initiated by", "", "Strong Buy", 0.0, 0.0);
        let s = score_record(&r, t);
        // Falls through to the strong-rating branch, not the upgrade branch.
        assert_eq!(s.upgrade, 50.0);
        assert_eq!(s.reasons[0], "Strong rating: Strong Buy");

        let r = record("AAPL", "MS", "initiated by", "n/a", "Neutral", 0.0, 0.0);
        assert_eq!(score_record(&r, t).upgrade, 0.0);
    }

    #[test]
    fn target_increase_caps_at_100_and_ignores_cuts() {
        let t = LookupTables::global();
        let r = record("X", "B", "target raised by", "buy", "buy", 10.0, 35.0);
        assert_eq!(score_record(&r, t).target, 100.0);

        let r = record("X", "B", "target lowered by", "buy", "buy", 185.0, 140.0);
        assert_eq!(score_record(&r, t).target, 0.0);

        let r = record("X", "B", "target raised by", "buy", "buy", 0.0, 140.0);
        assert_eq!(score_record(&r, t).target, 0.0);
    }

    #[test]
    fn unmatched_action_defaults_without_reason() {
        let t = LookupTables::global();
        let r = record("X", "B", "target set by", "", "", 0.0, 0.0);
        let s = score_record(&r, t);
        assert_eq!(s.action, DEFAULT_ACTION_SCORE);
        assert!(s.reasons.is_empty());
    }

    #[test]
    fn analyst_upside_takes_the_max_positive_change() {
        let a = record("X", "A", "upgraded by", "hold", "buy", 100.0, 110.0);
        let b = record("X", "B", "upgraded by", "hold", "buy", 100.0, 130.0);
        let c = record("X", "C", "downgraded by", "buy", "sell", 100.0, 80.0);
        assert!((analyst_upside(&[&a, &b, &c]) - 30.0).abs() < 1e-9);
        assert_eq!(analyst_upside(&[&c]), 0.0);
    }
}
