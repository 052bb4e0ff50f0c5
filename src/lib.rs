pub mod archive;
pub mod config;
pub mod constants;
pub mod error;
pub mod fsops;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod sanitizer;
pub mod store;

pub use config::Config;
pub use error::{PipelineError, Result};
