use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

const UNCLASSIFIED_CODE: &str = "internal_error";
const UNCLASSIFIED_MESSAGE: &str = "operation failed";
const RELEASE_CAUSE_MAX_CHARS: usize = 220;

/// What the CLI prints for a failed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    /// Stable snake_case code, e.g. `settings_write_failed`.
    pub code: String,
    pub message: String,
    /// `key: value` lines such as the settings path or the blocking task label.
    pub context: Vec<(String, String)>,
    pub causes: Vec<String>,
}

/// Error shared by the settings store, logging, the blocking runtime and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError(Box<ErrorReport>);

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self(Box::new(ErrorReport {
            code: code.into(),
            message: message.into(),
            ..ErrorReport::default()
        }))
    }

    pub fn with_code(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.code = code.into();
        self.0.message = message.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.context.push((key.into(), value.into()));
        self
    }

    /// Appends the display text of `error` and each of its sources.
    pub fn with_source<E>(mut self, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let chain = std::iter::successors(Some(&error as &(dyn StdError + 'static)), |&cause| {
            cause.source()
        });
        self.0.causes.extend(visible_causes(cause_texts(chain)));
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.0
            .context
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

fn cause_texts<'a>(chain: impl Iterator<Item = &'a (dyn StdError + 'static)>) -> Vec<String> {
    let mut texts: Vec<String> = Vec::new();
    for cause in chain {
        let text = cause.to_string();
        if text.trim().is_empty() || texts.last() == Some(&text) {
            continue;
        }
        texts.push(text);
    }
    texts
}

// Release builds print only the outermost cause, on one line and bounded.
fn visible_causes(causes: Vec<String>) -> Vec<String> {
    if cfg!(debug_assertions) {
        return causes;
    }
    causes
        .into_iter()
        .next()
        .map(|first| vec![single_line_cause(&first)])
        .unwrap_or_default()
}

fn single_line_cause(cause: &str) -> String {
    let line = cause.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= RELEASE_CAUSE_MAX_CHARS {
        return line;
    }
    let mut cut = line.chars().take(RELEASE_CAUSE_MAX_CHARS).collect::<String>();
    cut.push_str("...");
    cut
}

impl Deref for AppError {
    type Target = ErrorReport;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl StdError for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        if let Some(app_error) = error.downcast_ref::<Self>() {
            return app_error.clone();
        }
        let mut unclassified = Self::new(UNCLASSIFIED_CODE, UNCLASSIFIED_MESSAGE);
        unclassified.0.causes = visible_causes(cause_texts(error.chain()));
        unclassified
    }
}

pub trait ResultExt<T> {
    fn with_code(self, code: impl Into<String>, message: impl Into<String>) -> AppResult<T>;
    fn with_ctx(self, key: impl Into<String>, value: impl Into<String>) -> AppResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn with_code(self, code: impl Into<String>, message: impl Into<String>) -> AppResult<T> {
        self.map_err(|error| AppError::from(error.into()).with_code(code, message))
    }

    fn with_ctx(self, key: impl Into<String>, value: impl Into<String>) -> AppResult<T> {
        self.map_err(|error| AppError::from(error.into()).with_context(key, value))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[path = "../tests/core/errors_tests.rs"]
mod errors_tests;
