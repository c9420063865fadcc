// ABOUTME: Error types for tender-harvest including the ErrorCode enum and HarvestError struct.
// ABOUTME: Fatal errors abort one source; MissingRequiredField is the per-card recoverable signal.

use std::fmt;

/// Error codes representing the categories of fatal, per-source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Fetch,
    Timeout,
    Parse,
    ContainerNotFound,
    InvalidSelector,
    Config,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Parse => "unparsable document",
            ErrorCode::ContainerNotFound => "container not found",
            ErrorCode::InvalidSelector => "invalid selector",
            ErrorCode::Config => "configuration error",
        };
        write!(f, "{}", s)
    }
}

/// A fatal error for one source. Carries the source name and the stage reached
/// so a multi-source batch can log it and move on.
#[derive(Debug, thiserror::Error)]
pub struct HarvestError {
    pub code: ErrorCode,
    pub source_name: String,
    pub stage: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.source_name, self.stage, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {:#}", src)?;
        }
        Ok(())
    }
}

impl HarvestError {
    fn new(
        code: ErrorCode,
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            source_name: source_name.into(),
            stage: stage.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, source_name, stage, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, source_name, stage, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, source_name, stage, source)
    }

    /// Create a Parse error.
    pub fn parse(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Parse, source_name, stage, source)
    }

    /// Create a ContainerNotFound error.
    pub fn container_not_found(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::ContainerNotFound, source_name, stage, source)
    }

    /// Create an InvalidSelector error.
    pub fn invalid_selector(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidSelector, source_name, stage, source)
    }

    /// Create a Config error.
    pub fn config(
        source_name: impl Into<String>,
        stage: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Config, source_name, stage, source)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a Parse error.
    pub fn is_parse(&self) -> bool {
        self.code == ErrorCode::Parse
    }

    /// Returns true if this is a ContainerNotFound error.
    pub fn is_container_not_found(&self) -> bool {
        self.code == ErrorCode::ContainerNotFound
    }

    /// Returns true if this is an InvalidSelector error.
    pub fn is_invalid_selector(&self) -> bool {
        self.code == ErrorCode::InvalidSelector
    }

    /// Returns true if this is a Config error.
    pub fn is_config(&self) -> bool {
        self.code == ErrorCode::Config
    }
}

/// A required field resolved to nothing on one card. Card indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("card {card_index}: required field `{field}` missing")]
pub struct MissingRequiredField {
    pub card_index: usize,
    pub field: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_source_stage_and_cause() {
        let err = HarvestError::container_not_found(
            "care",
            "Scope",
            Some(anyhow::anyhow!("no match for `div#project1`")),
        );
        assert_eq!(
            err.to_string(),
            "care [Scope]: container not found: no match for `div#project1`"
        );
        assert!(err.is_container_not_found());
        assert!(!err.is_parse());
    }

    #[test]
    fn display_without_cause() {
        let err = HarvestError::parse("pksf", "Parse", None);
        assert_eq!(err.to_string(), "pksf [Parse]: unparsable document");
    }

    #[test]
    fn missing_required_field_message() {
        let err = MissingRequiredField {
            card_index: 2,
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "card 2: required field `title` missing");
    }
}
