// Library exports for testing
pub mod ai;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingestion;
pub mod llm;
pub mod models;
pub mod routes;
pub mod search;
pub mod state;
pub mod storage;
pub mod utils;
pub mod views;
