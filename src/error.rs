//! Error types for markup parsing and template compilation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::dom::DomError;
use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
            #[allow(unreachable_patterns)]
            other => format!("{:?}", other),
        };

        let mut expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .collect();
        expected.dedup();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::OpenTag(tag) => format!("<{}>", tag.name),
        Token::CloseTag(name) => format!("</{}>", name),
        Token::Text(_) => "text".to_string(),
        Token::Comment(_) => "comment".to_string(),
        Token::CData(_) => "CDATA section".to_string(),
        Token::Doctype(_) => "doctype".to_string(),
        Token::Instruction(_) => "processing instruction".to_string(),
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that abort the definition of a template shape
///
/// Addresses are pre-order node indices within the template fragment.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The joined template markup is not well-formed
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// A static segment already contains the slot marker text
    #[error("static segment {segment} contains the slot marker {marker:?}")]
    MarkerInStatics { segment: usize, marker: String },

    /// A node kind templates cannot contain
    #[error("unsupported {kind} node at address {address}")]
    UnsupportedNode { kind: &'static str, address: usize },

    /// A slot in a position no part can bind (tag or attribute name)
    #[error("slot in the {context} of <{element}> at address {address} is not supported")]
    UnsupportedSlot {
        context: &'static str,
        element: String,
        address: usize,
    },

    /// Parts consume a different number of values than the template has slots
    #[error("template has {expected} slots but its parts consume {found} values")]
    SlotCountMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Dom(#[from] DomError),
}

impl From<Vec<ParseError>> for CompileError {
    fn from(errors: Vec<ParseError>) -> Self {
        CompileError::Parse(errors)
    }
}

impl CompileError {
    /// Format the error against the joined template markup
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_format_includes_message() {
        let err = ParseError::Syntax {
            span: 5..11,
            message: "Unexpected </span>".to_string(),
            expected: vec!["</div>".to_string()],
        };
        let report = err.format("<div></span>", "template.html");
        assert!(report.contains("Unexpected </span>"));
        assert!(report.contains("template.html"));
    }

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::SlotCountMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "template has 2 slots but its parts consume 1 values"
        );
    }

    #[test]
    fn test_parse_errors_joined() {
        let err = CompileError::from(vec![
            ParseError::Syntax {
                span: 0..1,
                message: "a".to_string(),
                expected: vec![],
            },
            ParseError::Syntax {
                span: 2..3,
                message: "b".to_string(),
                expected: vec![],
            },
        ]);
        assert_eq!(
            err.to_string(),
            "parse errors: Parse error at 0..1: a; Parse error at 2..3: b"
        );
    }
}
