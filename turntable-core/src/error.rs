/// Error taxonomy for the frame transform pipeline
use std::fmt;

/// Shader stage a compile diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Everything that can go wrong while setting up or driving the pipeline.
///
/// Setup errors (`ResourceUnavailable`, `CompileFailure`, `LinkFailure`,
/// `InvalidConfiguration`) are fatal: the render loop never starts.
/// `DrawFailure` only ever drops the current frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// No graphics context, missing canvas, unreadable asset.
    ResourceUnavailable(String),
    /// A shader failed to compile; `log` is the backend's diagnostic text.
    CompileFailure { stage: ShaderStage, log: String },
    /// The program failed to link.
    LinkFailure(String),
    /// Zero rotation period, degenerate camera vectors, bad frustum.
    InvalidConfiguration(String),
    /// An operation was called in a state that does not allow it.
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },
    /// A single draw call failed.
    DrawFailure(String),
}

impl PipelineError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PipelineError::InvalidConfiguration(msg.into())
    }

    /// True for errors that abort setup rather than a single frame
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PipelineError::DrawFailure(_))
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::ResourceUnavailable(msg) => write!(f, "resource unavailable: {}", msg),
            PipelineError::CompileFailure { stage, log } => {
                write!(f, "{} shader failed to compile: {}", stage, log)
            }
            PipelineError::LinkFailure(log) => write!(f, "program failed to link: {}", log),
            PipelineError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            PipelineError::InvalidState { expected, found } => {
                write!(f, "invalid state: expected {}, found {}", expected, found)
            }
            PipelineError::DrawFailure(msg) => write!(f, "draw failed: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

pub type Result<T> = std::result::Result<T, PipelineError>;
