use crate::domain::rating::{RatingAction, RatingFilter, RatingPage, SortField, SortOrder};
use crate::source::RatingSource;
use anyhow::Context;
use std::cmp::Ordering;
use std::path::Path;

/// Rating actions held in memory, typically loaded from a JSON export.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRatingSource {
    records: Vec<RatingAction>,
}

impl InMemoryRatingSource {
    pub fn new(records: Vec<RatingAction>) -> Self {
        Self { records }
    }

    /// Reads a JSON array of rating actions.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let records = serde_json::from_str::<Vec<RatingAction>>(&text)
            .with_context(|| format!("{} is not a JSON array of rating actions", path.display()))?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl RatingSource for InMemoryRatingSource {
    async fn find_all(&self, filter: &RatingFilter) -> anyhow::Result<RatingPage> {
        anyhow::ensure!(filter.limit >= 1, "limit must be >= 1 (got {})", filter.limit);

        let mut matched: Vec<&RatingAction> =
            self.records.iter().filter(|r| matches(r, filter)).collect();
        let total_count = matched.len() as u64;

        matched.sort_by(|a, b| {
            let ord = compare(a, b, filter.sort_by);
            match filter.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let page = filter.page.max(1);
        let offset = usize::try_from((page - 1).saturating_mul(filter.limit)).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);

        let records = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(RatingPage {
            records,
            total_count,
        })
    }
}

fn matches(record: &RatingAction, filter: &RatingFilter) -> bool {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        if !record.ticker.to_lowercase().contains(&needle)
            && !record.company.to_lowercase().contains(&needle)
        {
            return false;
        }
    }

    if let Some(ticker) = filter.ticker.as_deref().filter(|s| !s.is_empty()) {
        if record.ticker != ticker {
            return false;
        }
    }

    if let Some(action) = filter.action.as_deref().filter(|s| !s.is_empty()) {
        if !record.action.to_lowercase().contains(&action.to_lowercase()) {
            return false;
        }
    }

    true
}

fn compare(a: &RatingAction, b: &RatingAction, field: SortField) -> Ordering {
    match field {
        SortField::Ticker => a.ticker.cmp(&b.ticker),
        SortField::Company => a.company.cmp(&b.company),
        SortField::Action => a.action.cmp(&b.action),
        SortField::TargetTo => a
            .target_to
            .partial_cmp(&b.target_to)
            .unwrap_or(Ordering::Equal),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
