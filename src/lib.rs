pub mod config;
pub mod dashboard;
pub mod database;
pub mod database_schema;
pub mod diagram;
pub mod dot_generator;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod metrics;
pub mod query_catalog;
pub mod renderer;
pub mod report;
pub mod types;
