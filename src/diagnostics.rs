//! Diagnostic reporting infrastructure.
//!
//! Diagnostics from tuple-comparison binding are collected, never thrown:
//! binding proceeds best-effort so sibling expressions keep analyzing, and
//! the caller drains the accumulated bag when the expression is done.
//!
//! # Error Codes
//!
//! Tuple-comparison diagnostics use a dedicated range:
//!
//! - **E0701-E0799**: errors (arity, operator resolution, boolean coercion)
//! - **W0701-W0799**: warnings (deprecation, ignored element names)

use crate::span::Span;
use ariadne::{Color, Label, Report, ReportKind, Source};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Diagnostic codes for tuple-comparison binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Tuple operands have different flattened arities.
    CardinalityMismatch,
    /// No comparison strategy resolves for an element pair.
    NoApplicableOperator,
    /// A bare `null` or `default` faces a non-nullable tuple operand.
    AmbiguousNullOrDefaultOperand,
    /// An element comparison result is not boolean and has no coercion path.
    NonBooleanResult,
    /// A resolved operator or conversion is marked deprecated.
    DeprecatedMember,
    /// A deprecated member whose mark demands an error.
    DeprecatedMemberDenied,
    /// A tuple-literal element name is ignored by the comparison.
    TupleElementNameIgnored,
}

impl ErrorCode {
    /// The stable code string, e.g. "E0701".
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::CardinalityMismatch => "E0701",
            ErrorCode::NoApplicableOperator => "E0702",
            ErrorCode::AmbiguousNullOrDefaultOperand => "E0703",
            ErrorCode::NonBooleanResult => "E0704",
            ErrorCode::DeprecatedMemberDenied => "E0705",
            ErrorCode::DeprecatedMember => "W0701",
            ErrorCode::TupleElementNameIgnored => "W0702",
        }
    }

    /// A short description of the code.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::CardinalityMismatch => {
                "tuple operands of == or != must have matching arities"
            }
            ErrorCode::NoApplicableOperator => "no applicable equality operator for element pair",
            ErrorCode::AmbiguousNullOrDefaultOperand => {
                "bare null or default is ambiguous against this tuple operand"
            }
            ErrorCode::NonBooleanResult => {
                "comparison result is not boolean and cannot be coerced"
            }
            ErrorCode::DeprecatedMember => "use of deprecated member",
            ErrorCode::DeprecatedMemberDenied => "use of deprecated member",
            ErrorCode::TupleElementNameIgnored => "tuple element name is ignored",
        }
    }

    /// An optional help message for the code.
    pub fn help(self) -> Option<&'static str> {
        match self {
            ErrorCode::AmbiguousNullOrDefaultOperand => {
                Some("use a tuple literal with explicit element values instead")
            }
            ErrorCode::NonBooleanResult => Some(
                "declare an implicit conversion to bool, or truth-testing operators, \
                 on the result type",
            ),
            _ => None,
        }
    }
}

/// The kind of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Error,
    Warning,
}

impl DiagnosticKind {
    fn to_report_kind(self) -> ReportKind<'static> {
        match self {
            DiagnosticKind::Error => ReportKind::Error,
            DiagnosticKind::Warning => ReportKind::Warning,
        }
    }

    fn color(self) -> Color {
        match self {
            DiagnosticKind::Error => Color::Red,
            DiagnosticKind::Warning => Color::Yellow,
        }
    }
}

/// A single diagnostic with a primary span and optional labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The kind of diagnostic.
    pub kind: DiagnosticKind,
    /// The error code (e.g., "E0701").
    pub code: Option<String>,
    /// The main message.
    pub message: String,
    /// The primary span where the problem occurred.
    pub span: Span,
    /// Additional labels pointing to relevant code.
    pub labels: Vec<DiagnosticLabel>,
    /// Suggestions for fixing the problem.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code: None,
            message: message.into(),
            span,
            labels: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code: None,
            message: message.into(),
            span,
            labels: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Set the error code, pulling in its help message if available.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code.as_str().to_string());
        if let Some(help) = code.help() {
            self.suggestions.push(help.to_string());
        }
        self
    }

    /// Add a secondary label.
    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagnosticLabel {
            span,
            message: message.into(),
        });
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

/// A secondary label attached to a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticLabel {
    /// The span this label points to.
    pub span: Span,
    /// The label message.
    pub message: String,
}

/// An ordered collection of diagnostics from one binding call.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether any error (not warning) has been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take all diagnostics out of the bag.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

/// The failure modes of tuple-comparison binding.
///
/// Every kind converts into a [`Diagnostic`]; none aborts binding. An
/// error kind makes the bound expression error-typed while analysis of
/// the rest of the expression continues.
#[derive(Debug, Clone, Error)]
pub enum BindErrorKind {
    #[error(
        "tuple operands of `{op}` must have matching arities, \
         but the left operand has arity {left} and the right has arity {right}"
    )]
    CardinalityMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },

    #[error("operator `{op}` cannot be applied to operands of type `{left}` and `{right}`")]
    NoApplicableOperator {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("operator `{op}` is ambiguous between multiple user-defined operators on operands of type `{left}` and `{right}`")]
    AmbiguousOperator {
        op: &'static str,
        left: String,
        right: String,
    },

    #[error("operator `{op}` is ambiguous on an operand of type `{operand}`: a bare `{literal}` has no tuple shape here")]
    AmbiguousNullOrDefaultOperand {
        op: &'static str,
        operand: String,
        literal: &'static str,
    },

    #[error(
        "the result type `{result}` of operator `{op}` is not boolean \
         and has no implicit boolean conversion or truth-testing operator"
    )]
    NonBooleanResult {
        op: &'static str,
        result: String,
    },
}

impl BindErrorKind {
    /// The code this kind reports under.
    pub fn code(&self) -> ErrorCode {
        match self {
            BindErrorKind::CardinalityMismatch { .. } => ErrorCode::CardinalityMismatch,
            BindErrorKind::NoApplicableOperator { .. }
            | BindErrorKind::AmbiguousOperator { .. } => ErrorCode::NoApplicableOperator,
            BindErrorKind::AmbiguousNullOrDefaultOperand { .. } => {
                ErrorCode::AmbiguousNullOrDefaultOperand
            }
            BindErrorKind::NonBooleanResult { .. } => ErrorCode::NonBooleanResult,
        }
    }

    /// Convert into an error diagnostic at `span`.
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        let code = self.code();
        Diagnostic::error(self.to_string(), span).with_code(code)
    }
}

/// Diagnostic emitter that renders diagnostics to stderr.
pub struct DiagnosticEmitter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    /// Emit a diagnostic to stderr.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        let mut builder = Report::build(
            diagnostic.kind.to_report_kind(),
            self.filename,
            diagnostic.span.start,
        );

        let message = if let Some(code) = &diagnostic.code {
            format!("[{}] {}", code, diagnostic.message)
        } else {
            diagnostic.message.clone()
        };
        builder = builder.with_message(&message);

        builder = builder.with_label(
            Label::new((self.filename, diagnostic.span.start..diagnostic.span.end))
                .with_color(diagnostic.kind.color())
                .with_message(&diagnostic.message),
        );

        for label in &diagnostic.labels {
            builder = builder.with_label(
                Label::new((self.filename, label.span.start..label.span.end))
                    .with_color(Color::Blue)
                    .with_message(&label.message),
            );
        }

        if !diagnostic.suggestions.is_empty() {
            let help = diagnostic.suggestions.join("\n");
            builder = builder.with_help(help);
        }

        let report = builder.finish();
        report
            .eprint((self.filename, Source::from(self.source)))
            .expect("failed to write diagnostic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ErrorCode::CardinalityMismatch.as_str(), "E0701");
        assert_eq!(ErrorCode::NoApplicableOperator.as_str(), "E0702");
        assert_eq!(ErrorCode::AmbiguousNullOrDefaultOperand.as_str(), "E0703");
        assert_eq!(ErrorCode::NonBooleanResult.as_str(), "E0704");
        assert_eq!(ErrorCode::DeprecatedMemberDenied.as_str(), "E0705");
        assert_eq!(ErrorCode::DeprecatedMember.as_str(), "W0701");
        assert_eq!(ErrorCode::TupleElementNameIgnored.as_str(), "W0702");
    }

    #[test]
    fn test_bind_error_into_diagnostic() {
        let kind = BindErrorKind::CardinalityMismatch {
            op: "==",
            left: 2,
            right: 3,
        };
        let diag = kind.into_diagnostic(Span::new(0, 10, 1, 1));
        assert!(diag.is_error());
        assert_eq!(diag.code.as_deref(), Some("E0701"));
        assert!(diag.message.contains("arity 2"));
        assert!(diag.message.contains("arity 3"));
    }

    #[test]
    fn test_bag_tracks_errors_and_warnings() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::warning("name ignored", Span::dummy()));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::error("no operator", Span::dummy()));
        assert!(bag.has_errors());
        assert_eq!(bag.take().len(), 2);
        assert!(!bag.has_errors());
    }
}
