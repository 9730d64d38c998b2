pub mod age;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod features;
pub mod identity;
pub mod interchange;
pub mod model;
pub mod profile;
pub mod resolver;
pub mod similarity;
pub mod store;

pub use error::PipelineError;
pub use store::Store;
