pub mod api;
pub mod config;
pub mod fixtures;
pub mod harness;
pub mod metrics;
pub mod model;
pub mod pool;
pub mod runner;
pub mod scoring;
pub mod util;
pub mod validate;
