pub mod config;
pub mod database;
pub mod dedupe;
pub mod handlers;
pub mod helpers;
pub mod storage;

pub use database::Database;
