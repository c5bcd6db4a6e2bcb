pub mod job;
pub mod options;
pub mod report;
pub mod result;

pub use job::{EngineKind, Job, OutputFormat};
pub use options::{ConversionOptions, PaperSize};
pub use report::BatchReport;
pub use result::{ConversionResult, FailureKind, JobFailure, JobStatus};
