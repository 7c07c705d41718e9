/// Broad category of an [`AppError`].
///
/// Per-source data problems never become errors (they are recorded as
/// diagnostics instead); these kinds cover failures that abort a whole call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong input shape: missing columns, malformed model files, mismatched grids.
    Format,
    /// A model source that cannot be routed to any loader.
    Fatal,
    /// Out-of-range or inconsistent parameters (stack bounds, log ages, CLI values).
    Validation,
    /// A result was requested before the step that produces it was run.
    State,
    /// Filesystem failures.
    Io,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Format | ErrorKind::Fatal | ErrorKind::Io => 2,
            ErrorKind::Validation => 3,
            ErrorKind::State => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.exit_code(),
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::State, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::format("x").exit_code(), 2);
        assert_eq!(AppError::fatal("x").exit_code(), 2);
        assert_eq!(AppError::validation("x").exit_code(), 3);
        assert_eq!(AppError::state("x").exit_code(), 4);
        assert_eq!(AppError::validation("bad bounds").to_string(), "bad bounds");
    }
}
