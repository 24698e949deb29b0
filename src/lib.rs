pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod storage;
