use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error belongs to. Each stage has its own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Resource,
    Rendering,
}

impl Stage {
    pub fn exit_code(&self) -> i32 {
        match self {
            Stage::Validation => 2,
            Stage::Resource => 3,
            Stage::Rendering => 4,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Resource => "resource",
            Stage::Rendering => "rendering",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("count must be at least 1 (got {0})")]
    InvalidCount(i64),

    #[error("start must be at least 1 (got {0})")]
    InvalidStart(i64),

    #[error("label numbers overflow: start {start} + count {count}")]
    NumberOverflow { start: i64, count: i64 },

    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    #[error("prefix {0:?} contains characters that cannot be printed in a standard PDF font")]
    UnprintablePrefix(String),

    #[error("unknown font {0:?}. Supported: helvetica, helvetica-bold, courier, courier-bold")]
    UnknownFont(String),

    #[error("invalid sheet geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to read layout file {path:?}: {message}")]
    LayoutFile { path: PathBuf, message: String },

    #[error("template not found: {0:?}")]
    TemplateNotFound(PathBuf),

    #[error("failed to load template {path:?}: {source}")]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("template {0:?} has no pages")]
    TemplateEmpty(PathBuf),

    #[error("cannot write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode QR code for {identifier}: {source}")]
    QrEncoding {
        identifier: String,
        #[source]
        source: qrcode::types::QrError,
    },

    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),
}

impl LabelError {
    pub fn stage(&self) -> Stage {
        match self {
            LabelError::InvalidCount(_)
            | LabelError::InvalidStart(_)
            | LabelError::NumberOverflow { .. }
            | LabelError::EmptyBaseUrl
            | LabelError::UnprintablePrefix(_)
            | LabelError::UnknownFont(_)
            | LabelError::InvalidGeometry(_)
            | LabelError::LayoutFile { .. } => Stage::Validation,
            LabelError::TemplateNotFound(_)
            | LabelError::TemplateUnreadable { .. }
            | LabelError::TemplateEmpty(_)
            | LabelError::Output { .. } => Stage::Resource,
            LabelError::QrEncoding { .. } | LabelError::PdfAssembly(_) => Stage::Rendering,
        }
    }
}

/// Find the stage of the first `LabelError` in an error chain.
pub fn stage_of(err: &anyhow::Error) -> Option<Stage> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<LabelError>())
        .map(LabelError::stage)
}
