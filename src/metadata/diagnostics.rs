//! Non-fatal problems found while generating a Portable PDB.
//!
//! Generation is lenient: a method whose body cannot be located, a duplicate sequence-point
//! submission or a file the decompiler failed on is skipped, and the rest of the container is
//! still produced. Every such event is recorded here, with the method token and the virtual file
//! path it concerns, and returned to the caller with the generation report.
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for lock-free appends, so the parallel
//! per-file phase can report without synchronization.
//!
//! # Examples
//!
//! ```rust
//! use dotpdb::metadata::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
//! use dotpdb::metadata::token::Token;
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.push(
//!     Diagnostic::new(
//!         DiagnosticSeverity::Warning,
//!         DiagnosticCategory::DuplicateMethod,
//!         "Sequence points submitted twice",
//!     )
//!     .with_token(Token::method_def(4))
//!     .with_file("App/Program.cs"),
//! );
//!
//! assert_eq!(diagnostics.warning_count(), 1);
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! ```

use std::fmt::{self, Write};

use serde::Serialize;

use crate::metadata::token::Token;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticSeverity {
    /// Informational, nothing was lost
    Info,
    /// Debug information for a method or file was dropped
    Warning,
    /// A whole file or binary could not be processed
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Which stage produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    /// Method body missing, out of range or unreadable
    MethodBody,
    /// Sequence points submitted for the same method by two files
    DuplicateMethod,
    /// Sequence points were omitted or could not be encoded
    SequencePoints,
    /// The decompiler failed for a file
    Decompiler,
    /// Content id could not be taken from the assembly
    ContentId,
    /// Anything else
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::MethodBody => write!(f, "MethodBody"),
            DiagnosticCategory::DuplicateMethod => write!(f, "DuplicateMethod"),
            DiagnosticCategory::SequencePoints => write!(f, "SequencePoints"),
            DiagnosticCategory::Decompiler => write!(f, "Decompiler"),
            DiagnosticCategory::ContentId => write!(f, "ContentId"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Producing stage
    pub category: DiagnosticCategory,
    /// Human readable description
    pub message: String,
    /// The method or type concerned
    pub token: Option<Token>,
    /// The virtual path of the source file concerned
    pub file: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic without context
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            token: None,
            file: None,
        }
    }

    /// Attach the token this diagnostic concerns
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Attach the virtual file path this diagnostic concerns
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(token) = self.token {
            write!(f, " (token: {token})")?;
        }

        if let Some(file) = &self.file {
            write!(f, " (file: {file})")?;
        }

        Ok(())
    }
}

/// Thread-safe, append-only collection of [`Diagnostic`]s
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Record a diagnostic
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Record an informational entry without context
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Record a warning without context
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Record an error without context
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Error, category, message));
    }

    /// Number of entries
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// True if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Number of error entries
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.severity_count(DiagnosticSeverity::Error)
    }

    /// Number of warning entries
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.severity_count(DiagnosticSeverity::Warning)
    }

    fn severity_count(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Iterate all entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// All entries of one category
    #[must_use]
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Clone the entries out, for reporting
    #[must_use]
    pub fn to_vec(&self) -> Vec<Diagnostic> {
        self.iter().cloned().collect()
    }

    /// One line per severity count, followed by every warning and error
    #[must_use]
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s)",
            self.error_count(),
            self.warning_count()
        );

        for diag in self
            .iter()
            .filter(|d| d.severity != DiagnosticSeverity::Info)
        {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn context() {
        let diag = Diagnostic::new(
            DiagnosticSeverity::Warning,
            DiagnosticCategory::MethodBody,
            "No body",
        )
        .with_token(Token::method_def(1))
        .with_file("App/Program.cs");

        assert_eq!(diag.token, Some(Token(0x06000001)));
        assert_eq!(diag.file.as_deref(), Some("App/Program.cs"));

        let display = diag.to_string();
        assert!(display.contains("WARN"));
        assert!(display.contains("MethodBody"));
        assert!(display.contains("0x06000001"));
        assert!(display.contains("App/Program.cs"));
    }

    #[test]
    fn container() {
        let diagnostics = Diagnostics::new();
        assert!(diagnostics.is_empty());

        diagnostics.info(DiagnosticCategory::General, "Info message");
        diagnostics.warning(DiagnosticCategory::SequencePoints, "Warning message");
        diagnostics.error(DiagnosticCategory::Decompiler, "Error message");

        assert_eq!(diagnostics.count(), 3);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Decompiler).len(), 1);

        let summary = diagnostics.summary();
        assert!(summary.contains("1 error(s), 1 warning(s)"));
        assert!(!summary.contains("Info message"));
    }

    #[test]
    fn concurrent_push() {
        let diagnostics = Arc::new(Diagnostics::new());
        let mut handles = vec![];

        for i in 0..10 {
            let diag_clone = Arc::clone(&diagnostics);
            handles.push(thread::spawn(move || {
                diag_clone.warning(DiagnosticCategory::General, format!("Thread {i} warning"));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(diagnostics.count(), 10);
        assert_eq!(diagnostics.to_vec().len(), 10);
    }
}
