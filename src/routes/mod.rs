pub mod benchmark;
pub mod buckets;
pub mod funds;
pub mod health;
pub mod portfolio;
