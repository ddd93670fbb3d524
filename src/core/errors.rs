use thiserror::Error;

use crate::core::models::ArtifactKind;

/// Run-aborting failures. Everything below this severity is converted to a
/// failed or skipped `StageResult` at the adapter boundary and never unwinds
/// across a stage.
#[derive(Error, Debug)]
pub enum ReconError {
    #[error("no subdomain discovery tool enabled; enable at least one of subfinder, amass, sublist3r")]
    NoDiscoverySource,

    #[error("no subdomains found for {target}")]
    NoSubdomains { target: String },

    #[error("hard gate failed before {stage}: required artifact ({artifact}) is missing or empty")]
    MissingPrerequisite {
        stage: &'static str,
        artifact: ArtifactKind,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconError {
    /// Stable exit codes so callers can tell the fatal classes apart without
    /// parsing log output.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReconError::NoDiscoverySource => 2,
            ReconError::NoSubdomains { .. } => 3,
            ReconError::MissingPrerequisite { .. } => 4,
            ReconError::Io(_) => 1,
        }
    }
}
