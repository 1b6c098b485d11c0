/// Broad category of an [`AppError`].
///
/// Each kind maps to a fixed process exit code so scripts can tell a failed
/// data load apart from a typo in a view name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fetching or parsing the dataset failed. Nothing can render without it.
    Load,
    /// A view name outside the fixed menu.
    UnknownView,
    /// A user-supplied parameter outside its allowed range.
    InvalidInput,
    /// A chart encoding references a column the derived table does not have.
    Encoding,
    /// Terminal or export file failures.
    Io,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::UnknownView | ErrorKind::InvalidInput => 2,
            ErrorKind::Io => 3,
            ErrorKind::Load => 4,
            ErrorKind::Encoding => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn unknown_view(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownView,
            format!("Unknown view '{name}'. Run `fp views` to list the available views."),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Encoding, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
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
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
