//! Compiler diagnostics: collection, builder and rendering.

mod printer;

pub use printer::DiagnosticsPrinter;

use rowan::TextRange;

use scriba_syntax::{LexicalError, ParserError};

use crate::error::CompilerError;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The stable code behind a diagnostic, by compilation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    Lexical,
    Parser(ParserError),
    Compiler(CompilerError),
}

/// A rendered message with its location and code.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub range: TextRange,
    pub message: String,
}

impl DiagnosticMessage {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity,
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}

/// Collection of diagnostic messages from one compilation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, code: CompilerError, range: TextRange) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Error,
            code: DiagnosticCode::Compiler(code),
            range,
            message: code.to_string(),
        });
    }

    pub fn warning(&mut self, code: CompilerError, range: TextRange) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Warning,
            code: DiagnosticCode::Compiler(code),
            range,
            message: code.to_string(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>, range: TextRange) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Info,
            code: DiagnosticCode::Lexical,
            range,
            message: message.into(),
        });
    }

    pub fn syntax_error(&mut self, error: ParserError, range: TextRange) {
        self.messages.push(DiagnosticMessage {
            severity: Severity::Error,
            code: DiagnosticCode::Parser(error),
            range,
            message: error.to_string(),
        });
    }

    pub fn lexical_error(&mut self, error: &LexicalError) {
        let offset = error.offset();
        self.messages.push(DiagnosticMessage {
            severity: Severity::Error,
            code: DiagnosticCode::Lexical,
            range: TextRange::empty(offset),
            message: error.to_string(),
        });
    }

    pub fn push(&mut self, message: DiagnosticMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    pub fn printer<'a>(&'a self, source: &'a str) -> DiagnosticsPrinter<'a> {
        DiagnosticsPrinter::new(&self.messages, source)
    }
}
