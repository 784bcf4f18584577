//! Business logic services

pub mod embedding;
pub mod feature_vector;
pub mod geo;
pub mod heatmap;
pub mod optimizer;
pub mod schedule;
pub mod simulate;
pub mod vector_store;
