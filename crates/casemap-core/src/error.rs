use crate::document::StoreError;
use crate::exhibit::Exhibit;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage, used to say where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    LayerResolution,
    SubjectResolution,
    SubjectSync,
    BufferPolicy,
    BufferGeneration,
    BufferSync,
    Framing,
    Stamping,
    Save,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Input => "input validation",
            Stage::LayerResolution => "layer resolution",
            Stage::SubjectResolution => "subject geometry resolution",
            Stage::SubjectSync => "subject store sync",
            Stage::BufferPolicy => "buffer distance policy",
            Stage::BufferGeneration => "buffer generation",
            Stage::BufferSync => "buffer store sync",
            Stage::Framing => "view framing",
            Stage::Stamping => "layout text stamping",
            Stage::Save => "document save",
            Stage::Export => "export",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionReason {
    MapNotFound,
    NoMatchingLayer { pattern: String },
    LayoutNotFound,
    FrameNotFound { frame: String },
    /// The map frame has no usable page size, so no map scale can be derived from it.
    DegenerateFrame { frame: String, width: f64, height: f64 },
    NoMatchingFeatures { predicate: String },
    EmptyStore,
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionReason::MapNotFound => f.write_str("no map has that exact name"),
            ResolutionReason::NoMatchingLayer { pattern } => {
                write!(f, "no layer matches `{pattern}`")
            }
            ResolutionReason::LayoutNotFound => f.write_str("no layout has that exact name"),
            ResolutionReason::FrameNotFound { frame } => {
                write!(f, "layout has no map frame named `{frame}`")
            }
            ResolutionReason::DegenerateFrame {
                frame,
                width,
                height,
            } => write!(f, "map frame `{frame}` has an unusable size {width}x{height}"),
            ResolutionReason::NoMatchingFeatures { predicate } => {
                write!(f, "no features match {predicate}")
            }
            ResolutionReason::EmptyStore => f.write_str("store holds no features"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Delete,
    Insert,
    RefreshExtent,
    Tag,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncPhase::Delete => "delete all features from",
            SyncPhase::Insert => "insert features into",
            SyncPhase::RefreshExtent => "refresh the extent of",
            SyncPhase::Tag => "tag features in",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{stage}: invalid input: {message}")]
    InvalidInput { stage: Stage, message: String },

    #[error("{stage}: could not resolve {resource}: {reason}")]
    Resolution {
        stage: Stage,
        resource: String,
        reason: ResolutionReason,
    },

    #[error("{stage}: failed to {phase} {resource}: {source}")]
    StoreSync {
        stage: Stage,
        resource: String,
        phase: SyncPhase,
        #[source]
        source: StoreError,
    },

    #[error("{stage}: failed to add field `{field}` to {resource}: {source}")]
    SchemaEvolution {
        stage: Stage,
        resource: String,
        field: String,
        #[source]
        source: StoreError,
    },

    #[error("{stage}: failed to write the {exhibit} exhibit from layout `{layout}` to {}: {source}", .path.display())]
    Export {
        stage: Stage,
        exhibit: Exhibit,
        layout: String,
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("{stage}: {resource}: {operation} exceeded the {limit:?} operation budget ({elapsed:?})")]
    Timeout {
        stage: Stage,
        resource: String,
        operation: &'static str,
        limit: Duration,
        elapsed: Duration,
    },

    #[error("{stage}: {resource}: {source}")]
    Store {
        stage: Stage,
        resource: String,
        #[source]
        source: StoreError,
    },
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidInput { stage, .. }
            | Error::Resolution { stage, .. }
            | Error::StoreSync { stage, .. }
            | Error::SchemaEvolution { stage, .. }
            | Error::Export { stage, .. }
            | Error::Timeout { stage, .. }
            | Error::Store { stage, .. } => *stage,
        }
    }

    pub(crate) fn resolution(
        stage: Stage,
        resource: impl fmt::Display,
        reason: ResolutionReason,
    ) -> Self {
        Error::Resolution {
            stage,
            resource: resource.to_string(),
            reason,
        }
    }

    /// Wraps a collaborator failure, keeping operation budget overruns distinct.
    pub(crate) fn store(stage: Stage, resource: impl fmt::Display, source: StoreError) -> Self {
        match source {
            StoreError::Timeout {
                operation,
                limit,
                elapsed,
            } => Error::Timeout {
                stage,
                resource: resource.to_string(),
                operation,
                limit,
                elapsed,
            },
            source => Error::Store {
                stage,
                resource: resource.to_string(),
                source,
            },
        }
    }
}

/// A non-fatal condition surfaced in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// More than one map or layer matched; the first one was used.
    AmbiguousMatch {
        stage: Stage,
        resource_kind: &'static str,
        pattern: String,
        chosen: String,
        candidates: Vec<String>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AmbiguousMatch {
                stage,
                resource_kind,
                pattern,
                chosen,
                candidates,
            } => write!(
                f,
                "{stage}: {} {resource_kind}s match `{pattern}`; using `{chosen}`",
                candidates.len()
            ),
        }
    }
}
