use std::fmt;

use regex_syntax::{ast, hir};

/// The broad category of a pattern compilation failure.
///
/// The code domain is deliberately coarser than the parser's own error
/// taxonomy so that callers can branch on stable categories while the parser
/// remains free to refine its diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// The pattern compiled successfully.
    NoError,
    /// Unexpected internal failure.
    Internal,
    /// Bad escape sequence, e.g. `\y` or an unsupported backreference.
    BadEscape,
    /// Bad character class, e.g. an unknown `\p{..}` property.
    BadCharClass,
    /// Bad character class range, e.g. `[z-a]`.
    BadCharRange,
    /// Missing closing `]`.
    MissingBracket,
    /// Missing or unbalanced parenthesis.
    MissingParen,
    /// The pattern ends with a lone `\`.
    TrailingBackslash,
    /// Repetition operator with nothing to repeat, e.g. a leading `*`.
    RepeatArgument,
    /// Bad repetition count, e.g. `a{2,1}` or an unclosed `{`.
    RepeatSize,
    /// Repetition operator used where it is not allowed.
    RepeatOp,
    /// Bad or unsupported Perl operator, e.g. look-around or stray flags.
    BadPerlOp,
    /// The pattern is not valid UTF-8 or demands matching invalid UTF-8.
    BadUtf8,
    /// Bad or duplicate named capture group.
    BadNamedCapture,
    /// Compilation exceeded the configured memory budget.
    PatternTooLarge,
}

impl ErrorCode {
    /// A short human-readable description of the code.
    pub fn description(&self) -> &'static str {
        use self::ErrorCode::*;
        match *self {
            NoError => "no error",
            Internal => "internal error",
            BadEscape => "bad escape sequence",
            BadCharClass => "bad character class",
            BadCharRange => "bad character class range",
            MissingBracket => "missing closing ]",
            MissingParen => "missing closing )",
            TrailingBackslash => "trailing \\ at end of regexp",
            RepeatArgument => "repetition operator missing argument",
            RepeatSize => "bad repetition operator",
            RepeatOp => "repetition operator not allowed",
            BadPerlOp => "bad perl operator",
            BadUtf8 => "invalid UTF-8 in regexp",
            BadNamedCapture => "bad named capture group",
            PatternTooLarge => "pattern too large (compile failed)",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A pattern compilation error.
///
/// An `Error` is recorded on the compiled pattern rather than returned, so
/// that every subsequent match operation can fail cheaply. Callers inspect
/// it through [`Regex::ok`](crate::Regex::ok),
/// [`Regex::error`](crate::Regex::error) and friends.
#[derive(Clone, Debug)]
pub struct Error {
    code: ErrorCode,
    message: String,
    arg: String,
}

impl Error {
    pub(crate) fn new(
        code: ErrorCode,
        message: impl Into<String>,
        arg: impl Into<String>,
    ) -> Error {
        Error { code, message: message.into(), arg: arg.into() }
    }

    pub(crate) fn from_ast(pattern: &str, err: &ast::Error) -> Error {
        let code = ast_error_code(err.kind());
        let arg =
            fragment(pattern, err.span().start.offset, err.span().end.offset);
        Error::new(code, err.to_string(), arg)
    }

    pub(crate) fn from_hir(pattern: &str, err: &hir::Error) -> Error {
        let code = hir_error_code(err.kind());
        let arg =
            fragment(pattern, err.span().start.offset, err.span().end.offset);
        Error::new(code, err.to_string(), arg)
    }

    pub(crate) fn too_large() -> Error {
        Error::new(
            ErrorCode::PatternTooLarge,
            "pattern too large - compile failed",
            "",
        )
    }

    pub(crate) fn reverse_too_large() -> Error {
        Error::new(
            ErrorCode::PatternTooLarge,
            "pattern too large - reverse compile failed",
            "",
        )
    }

    pub(crate) fn internal(message: impl Into<String>) -> Error {
        Error::new(ErrorCode::Internal, message, "")
    }

    /// The category of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The full error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The fragment of the pattern the error points at, when known.
    pub fn arg(&self) -> &str {
        &self.arg
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

fn fragment(pattern: &str, start: usize, end: usize) -> String {
    let end = end.min(pattern.len());
    let start = start.min(end);
    pattern.get(start..end).unwrap_or("").to_string()
}

fn ast_error_code(kind: &ast::ErrorKind) -> ErrorCode {
    use regex_syntax::ast::ErrorKind::*;

    match *kind {
        ClassEscapeInvalid => ErrorCode::BadEscape,
        ClassRangeInvalid | ClassRangeLiteral => ErrorCode::BadCharRange,
        ClassUnclosed => ErrorCode::MissingBracket,
        DecimalEmpty | DecimalInvalid => ErrorCode::RepeatSize,
        EscapeHexEmpty | EscapeHexInvalid | EscapeHexInvalidDigit => {
            ErrorCode::BadEscape
        }
        EscapeUnexpectedEof => ErrorCode::TrailingBackslash,
        EscapeUnrecognized => ErrorCode::BadEscape,
        FlagDanglingNegation
        | FlagDuplicate { .. }
        | FlagRepeatedNegation { .. }
        | FlagUnexpectedEof
        | FlagUnrecognized => ErrorCode::BadPerlOp,
        GroupNameDuplicate { .. }
        | GroupNameEmpty
        | GroupNameInvalid
        | GroupNameUnexpectedEof => ErrorCode::BadNamedCapture,
        GroupUnclosed | GroupUnopened => ErrorCode::MissingParen,
        RepetitionCountInvalid
        | RepetitionCountDecimalEmpty
        | RepetitionCountUnclosed => ErrorCode::RepeatSize,
        RepetitionMissing => ErrorCode::RepeatArgument,
        UnsupportedBackreference => ErrorCode::BadEscape,
        UnsupportedLookAround => ErrorCode::BadPerlOp,
        _ => ErrorCode::Internal,
    }
}

fn hir_error_code(kind: &hir::ErrorKind) -> ErrorCode {
    use regex_syntax::hir::ErrorKind::*;

    match *kind {
        UnicodeNotAllowed => ErrorCode::BadEscape,
        InvalidUtf8 => ErrorCode::BadUtf8,
        UnicodePropertyNotFound | UnicodePropertyValueNotFound => {
            ErrorCode::BadCharClass
        }
        UnicodePerlClassNotFound | UnicodeCaseUnavailable => {
            ErrorCode::BadCharClass
        }
        _ => ErrorCode::Internal,
    }
}

/// An error in a rewrite template, reported by
/// [`Regex::check_rewrite`](crate::Regex::check_rewrite) and the
/// substitution operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RewriteError {
    /// The template ends with a lone `\`.
    TrailingBackslash,
    /// A `\` is followed by something other than a digit or `\`.
    BadEscape(u8),
    /// The template references a group the pattern does not have.
    GroupOutOfRange {
        /// The largest group index the template asks for.
        requested: usize,
        /// The number of capturing groups actually available.
        available: usize,
    },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RewriteError::TrailingBackslash => {
                write!(f, "Rewrite schema error: '\\' not allowed at end.")
            }
            RewriteError::BadEscape(_) => {
                write!(
                    f,
                    "Rewrite schema error: '\\' must be followed by a digit \
                     or '\\'."
                )
            }
            RewriteError::GroupOutOfRange { requested, available } => {
                write!(
                    f,
                    "Rewrite schema requests {} matches, but the regexp only \
                     has {} parenthesized subexpressions.",
                    requested, available,
                )
            }
        }
    }
}

impl std::error::Error for RewriteError {}
