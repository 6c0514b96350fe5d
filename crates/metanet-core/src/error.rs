use std::fmt;

/// Machine-readable error codes shared by the library crates and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoModel,
    NoOverview,
    ConfigParseError,
    InputFileUnreadable,
    DuplicateNodeId,
    UnknownNode,
    InvalidEdge,
    ModelParseError,
    CloningUnavailable,
    CloningFailed,
    InvalidSignificanceLevel,
    CapabilityUnavailable,
    UnknownSubsystem,
    ExportFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoModel => "E1001",
            Self::NoOverview => "E1002",
            Self::ConfigParseError => "E1003",
            Self::InputFileUnreadable => "E1004",
            Self::DuplicateNodeId => "E2001",
            Self::UnknownNode => "E2002",
            Self::InvalidEdge => "E2003",
            Self::ModelParseError => "E2004",
            Self::CloningUnavailable => "E3001",
            Self::CloningFailed => "E3002",
            Self::InvalidSignificanceLevel => "E3003",
            Self::CapabilityUnavailable => "E3004",
            Self::UnknownSubsystem => "E3005",
            Self::ExportFailed => "E3006",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoModel => "No active model",
            Self::NoOverview => "No overview graph constructed",
            Self::ConfigParseError => "Config file parse error",
            Self::InputFileUnreadable => "Input file could not be read",
            Self::DuplicateNodeId => "Duplicate node identifier",
            Self::UnknownNode => "Unknown node identifier",
            Self::InvalidEdge => "Edge does not connect a species and a reaction",
            Self::ModelParseError => "Model document parse error",
            Self::CloningUnavailable => "Species cloning not available",
            Self::CloningFailed => "Species cloning failed",
            Self::InvalidSignificanceLevel => "Invalid significance level",
            Self::CapabilityUnavailable => "Optional capability not installed",
            Self::UnknownSubsystem => "Unknown subsystem",
            Self::ExportFailed => "Subsystem export failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NoModel => Some("Load a model before running this action."),
            Self::NoOverview => Some("Construct the overview graph first (`mnet overview`)."),
            Self::ConfigParseError => Some("Fix syntax in .metanet/config.toml and retry."),
            Self::InputFileUnreadable => Some("Check that the file exists and is readable."),
            Self::DuplicateNodeId => Some("Every metabolite and reaction id must be unique."),
            Self::UnknownNode => Some("Declare every metabolite a reaction references."),
            Self::InvalidEdge => None,
            Self::ModelParseError => Some("The model must be a COBRA-style JSON document."),
            Self::CloningUnavailable => {
                Some("Install a species cloner or choose a method that does not need one.")
            }
            Self::CloningFailed => None,
            Self::InvalidSignificanceLevel => Some("Use a significance level in (0, 1]."),
            Self::CapabilityUnavailable => None,
            Self::UnknownSubsystem => Some("Use a subsystem name listed by `mnet overview`."),
            Self::ExportFailed => Some("Check that the output path is writable."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while building or transforming a [`crate::model::MetabolicGraph`].
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Two nodes were declared with the same identifier.
    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    /// An edge or attribute referenced an identifier that was never declared.
    #[error("unknown node id: {0}")]
    UnknownNode(String),

    /// Edges must connect one species and one reaction.
    #[error("edge {source_id} -> {target_id} does not connect a species and a reaction")]
    InvalidEdge {
        source_id: String,
        target_id: String,
    },

    /// The model document could not be decoded.
    #[error("failed to parse model document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The model document could not be read.
    #[error("model I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Map this error onto the shared code table.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DuplicateId(_) => ErrorCode::DuplicateNodeId,
            Self::UnknownNode(_) => ErrorCode::UnknownNode,
            Self::InvalidEdge { .. } => ErrorCode::InvalidEdge,
            Self::Parse(_) => ErrorCode::ModelParseError,
            Self::Io(_) => ErrorCode::InputFileUnreadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, ModelError};
    use std::collections::HashSet;

    const ALL: [ErrorCode; 15] = [
        ErrorCode::NoModel,
        ErrorCode::NoOverview,
        ErrorCode::ConfigParseError,
        ErrorCode::InputFileUnreadable,
        ErrorCode::DuplicateNodeId,
        ErrorCode::UnknownNode,
        ErrorCode::InvalidEdge,
        ErrorCode::ModelParseError,
        ErrorCode::CloningUnavailable,
        ErrorCode::CloningFailed,
        ErrorCode::InvalidSignificanceLevel,
        ErrorCode::CapabilityUnavailable,
        ErrorCode::UnknownSubsystem,
        ErrorCode::ExportFailed,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn codes_follow_e_prefix_format() {
        for code in ALL {
            let text = code.code();
            assert_eq!(text.len(), 5);
            assert!(text.starts_with('E'));
            assert!(text[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_matches_code() {
        assert_eq!(ErrorCode::NoModel.to_string(), "E1001");
    }

    #[test]
    fn model_errors_map_to_codes() {
        let err = ModelError::DuplicateId("h2o_c".into());
        assert_eq!(err.code(), ErrorCode::DuplicateNodeId);
        assert!(err.to_string().contains("h2o_c"));
    }
}
