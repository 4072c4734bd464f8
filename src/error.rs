use thiserror::Error;

/// Everything the engine can report to its host.
///
/// Construction-time variants are returned before any frame runs. Runtime
/// variants come out of [`crate::Engine::frame`]; only `AssetLoadFailed` is
/// recoverable, the engine substitutes a fallback visual and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("2d drawing context is not available")]
    ContextUnavailable,
    #[error("2d drawing context was lost")]
    ContextLost,
    #[error("failed to load asset `{asset}`: {reason}")]
    AssetLoadFailed { asset: String, reason: String },
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn asset(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AssetLoadFailed {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContextUnavailable => "CANVAS_CONTEXT_UNAVAILABLE",
            Self::ContextLost => "CANVAS_CONTEXT_LOST",
            Self::AssetLoadFailed { .. } => "ASSET_LOAD_FAILED",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    /// Fatal errors end the session; the host must tear down and rebuild.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::AssetLoadFailed { .. })
    }
}
