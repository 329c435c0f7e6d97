pub mod embedding;
pub mod stats;
pub mod utils;
