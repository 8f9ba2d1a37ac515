pub mod market;
pub mod rating;
pub mod recommendation;
