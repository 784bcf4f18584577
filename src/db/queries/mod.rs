//! Database queries

pub mod embedding;
pub mod scenario;
