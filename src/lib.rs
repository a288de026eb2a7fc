//! Bridges a Kafka topic of card transactions to dashboard clients, either as a bounded
//! snapshot or as a live server-sent event stream.

pub mod broker;
pub mod codec;
pub mod collector;
pub mod config;
pub mod http;
pub mod models;
pub mod relay;
pub mod session;
pub mod types;
