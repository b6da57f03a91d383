//! Diagnostic rendering through annotate-snippets.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};

use super::{DiagnosticMessage, Severity};

/// Renders a batch of diagnostics against their source.
pub struct DiagnosticsPrinter<'a> {
    messages: &'a [DiagnosticMessage],
    source: &'a str,
    path: Option<&'a str>,
    colored: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(messages: &'a [DiagnosticMessage], source: &'a str) -> Self {
        Self {
            messages,
            source,
            path: None,
            colored: false,
        }
    }

    pub fn with_path(mut self, path: &'a str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, on: bool) -> Self {
        self.colored = on;
        self
    }

    pub fn render(&self) -> String {
        if self.messages.is_empty() {
            return String::new();
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        let mut output = String::new();

        for (i, diag) in self.messages.iter().enumerate() {
            let start: usize = diag.range.start().into();
            let end: usize = diag.range.end().into();
            let end = if start == end {
                (start + 1).min(self.source.len())
            } else {
                end
            };
            let start = start.min(end);

            let mut snippet = Snippet::source(self.source).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(start..end)
                    .label(&diag.message),
            );

            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }

            let level = match diag.severity {
                Severity::Info => Level::INFO,
                Severity::Warning => Level::WARNING,
                Severity::Error => Level::ERROR,
            };

            let report = vec![level.primary_title(&diag.message).element(snippet)];

            if i > 0 {
                output.push('\n');
            }
            output.push_str(&renderer.render(&report).to_string());
        }

        output
    }
}
