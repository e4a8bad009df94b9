use std::fmt;
use std::path::{Path, PathBuf};

/// Positional diagnostic produced by the Go front end.
///
/// Rendered in the parser's own format, `file:line:col: message`, so failures
/// read the same way `go vet` style tooling reports them.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub path: PathBuf,
    /// 1-based line number.
    pub line: u32,
    /// 1-based byte column within the line.
    pub col: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(path: &Path, line: u32, col: u32, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
            col,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.col,
            self.message
        )
    }
}

impl std::error::Error for ParseError {}
