//! Eventscope - correlation search and aggregation over API event logs.

pub mod aggregate;
pub mod config;
pub mod duration;
pub mod error;
pub mod es_http;
pub mod es_query;
pub mod es_search;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod types;
