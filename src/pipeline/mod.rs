// Batch pipelines: sanitize (raw -> sanitized + archive) and import (sanitized -> store + public)

pub mod import;
pub mod outcome;
pub mod sanitize;

pub use import::ImportPipeline;
pub use outcome::{FileOutcome, FileReport, Phase, RunSummary};
pub use sanitize::SanitizePipeline;
