pub mod config;
pub mod db;
pub mod error;
pub mod polls;
pub mod sse;
pub mod startup;
pub mod voting;
