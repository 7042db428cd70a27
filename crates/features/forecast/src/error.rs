use crate::season::Season;
use std::borrow::Cow;
use std::path::PathBuf;

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// A season label outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown season '{input}'")]
pub struct UnknownSeason {
    input: String,
}

impl UnknownSeason {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self { input: input.into() }
    }

    /// The raw label the caller supplied.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Structural violations of a season's feature contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureValidationError {
    #[error(transparent)]
    UnknownSeason(#[from] UnknownSeason),

    #[error("Feature count mismatch: expected {expected}, received {received}")]
    FeatureCountMismatch { expected: usize, received: usize },

    /// `position` is zero-based, `feature` is the schema name at that position.
    #[error("Non-numeric feature at position {position} ({feature})")]
    NonNumericFeature { position: usize, feature: String },
}

/// Failures raised by a scoring artifact at request time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Model expects {expected} inputs, received {received}")]
    InputWidth { expected: usize, received: usize },

    #[error("Model produced a non-finite value: {value}")]
    NonFiniteOutput { value: f64 },
}

/// Request-scoped failures of the prediction path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownSeason(#[from] UnknownSeason),

    #[error("Feature count mismatch: expected {expected}, received {received}")]
    FeatureCountMismatch { expected: usize, received: usize },

    #[error("Non-numeric feature at position {position} ({feature})")]
    NonNumericFeature { position: usize, feature: String },

    #[error("Model invocation failed for {season}: {source}")]
    ModelInvocationFailure { season: Season, source: ScoreError },
}

impl From<FeatureValidationError> for DispatchError {
    fn from(err: FeatureValidationError) -> Self {
        match err {
            FeatureValidationError::UnknownSeason(e) => Self::UnknownSeason(e),
            FeatureValidationError::FeatureCountMismatch { expected, received } => {
                Self::FeatureCountMismatch { expected, received }
            },
            FeatureValidationError::NonNumericFeature { position, feature } => {
                Self::NonNumericFeature { position, feature }
            },
        }
    }
}

/// Format-level problems with a model file's contents.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Malformed artifact JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unsupported artifact: {message}")]
    Unsupported { message: Cow<'static, str> },

    #[error("Invalid artifact: {message}")]
    Invalid { message: Cow<'static, str> },
}

/// Startup failures of the forecast slice. All of them are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Failed to read model artifact {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Failed to load model artifact {}: {source}", path.display())]
    Artifact { path: PathBuf, source: ArtifactError },

    #[error(
        "Model for {season} declares {model} inputs but its schema lists {schema} features"
    )]
    WidthMismatch { season: Cow<'static, str>, model: usize, schema: usize },

    #[error("Invalid forecast configuration{}: {message}", format_context(.context))]
    Config { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ForecastError {
    pub(crate) fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config { message: message.into(), context: None }
    }

    #[must_use]
    pub(crate) fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        if let Self::Config { context: c, .. } = &mut self {
            *c = Some(context.into());
        }
        self
    }
}

/// Problems with the single-model variant's named form fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyFieldError {
    #[error("Missing field '{field}'")]
    Missing { field: &'static str },

    #[error("Field '{field}' is not a valid number")]
    NonNumeric { field: &'static str },
}
