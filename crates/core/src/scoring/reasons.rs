//! Human-readable explanation strings attached to recommendations.

pub fn rating_upgraded(from: &str, to: &str) -> String {
    format!("Rating upgraded from {from} to {to}")
}

pub fn strong_rating(to: &str) -> String {
    format!("Strong rating: {to}")
}

pub fn target_increased(percent: f64, target: f64) -> String {
    format!("Target price increased {percent:.1}% to ${target:.2}")
}

pub fn action_by(action: &str, brokerage: &str) -> String {
    let action = action.trim();
    if brokerage.is_empty() {
        return action.strip_suffix("by").unwrap_or(action).to_string();
    }

    // Upstream feeds usually phrase actions as "upgraded by".
    if action.to_lowercase().ends_with("by") {
        return format!("{action} {brokerage}");
    }

    format!("{action} by {brokerage}")
}

pub fn analysts_bullish(bullish: usize, total: usize) -> String {
    format!("{bullish}/{total} analysts bullish")
}

pub fn recent_signals(count: usize) -> String {
    format!("{count} analyst signals in the last 7 days")
}

pub fn real_upside(percent: f64, current_price: f64, avg_target: f64) -> String {
    format!(
        "{percent:.1}% upside from current price ${current_price:.2} to average target ${avg_target:.2}"
    )
}

pub fn large_cap(cap_in_billions: f64) -> String {
    format!("Large-cap company (${cap_in_billions:.1}B market cap)")
}

pub fn mid_cap(cap_in_billions: f64) -> String {
    format!("Mid-cap company (${cap_in_billions:.1}B market cap)")
}

pub fn price_trend_up(day_change_percent: f64) -> String {
    format!("Price trending up today (+{day_change_percent:.2}%)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_reason_avoids_double_by() {
        assert_eq!(action_by("upgraded by", "Morgan Stanley"), "upgraded by Morgan Stanley");
        assert_eq!(action_by("upgraded", "Morgan Stanley"), "upgraded by Morgan Stanley");
        assert_eq!(action_by(" target raised by ", ""), "target raised ");
    }

    #[test]
    fn numeric_templates_use_fixed_precision() {
        assert_eq!(
            target_increased(22.2222, 220.0),
            "Target price increased 22.2% to $220.00"
        );
        assert_eq!(large_cap(2950.5), "Large-cap company ($2950.5B market cap)");
        assert_eq!(price_trend_up(1.5), "Price trending up today (+1.50%)");
    }
}
