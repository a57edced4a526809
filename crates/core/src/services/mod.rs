pub mod catalog;
pub mod feed;
pub mod generator;
pub mod random_walk;
pub mod scheduler;
pub mod valuation;
