pub mod memory;

use crate::domain::rating::{RatingFilter, RatingPage};

/// Where rating actions come from. Errors are fatal to the ranking call.
#[async_trait::async_trait]
pub trait RatingSource: Send + Sync {
    async fn find_all(&self, filter: &RatingFilter) -> anyhow::Result<RatingPage>;
}
