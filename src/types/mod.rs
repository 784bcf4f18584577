//! Type definitions

pub mod embedding;
pub mod heatmap;
pub mod messages;
pub mod scenario;
pub mod simulate;

pub use embedding::*;
pub use heatmap::*;
pub use messages::*;
pub use scenario::*;
pub use simulate::*;
