use crate::domain::recommendation::Recommendation;
use std::cmp::Ordering;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 100;

/// Anything outside `1..=100`, or missing, becomes the default.
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit {
        Some(n) if (1..=MAX_LIMIT as i64).contains(&n) => n as usize,
        _ => DEFAULT_LIMIT,
    }
}

/// Drops non-positive scores, sorts descending and truncates.
///
/// Ties are broken by ticker so repeated runs produce identical output; callers should not
/// rely on that order.
pub fn rank(mut recommendations: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    recommendations.retain(|r| r.composite_score > 0.0);
    recommendations.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.ticker().cmp(b.ticker()))
    });
    recommendations.truncate(limit);
    recommendations
}
