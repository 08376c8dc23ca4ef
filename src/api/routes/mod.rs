pub mod health;
pub mod ingest;
pub mod regions;
pub mod stats;
