pub mod config;
pub mod error;
pub mod types;

pub use config::{AnalysisConfig, ArchLensConfig, LlmConfig, VerifyConfig};
pub use error::{ArchLensError, Result};
pub use types::{
    Cycle, DegreeTable, FileRecord, FilesByPackage, PackageGraph, Smell, Verdict,
};
