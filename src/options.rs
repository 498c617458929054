/// How haystack bytes (and character classes) are interpreted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// Haystacks are UTF-8; `.` and classes work on codepoints.
    Utf8,
    /// Haystacks are arbitrary bytes; `.` and classes work on single bytes.
    Latin1,
}

/// The default memory budget, split between the forward and reverse
/// automata at compile time.
pub const DEFAULT_MAX_MEM: usize = 8 << 20;

/// Configuration for compiling a [`Regex`](crate::Regex).
///
/// The setters follow the builder style: they consume and return the
/// options value, so a configuration reads as one expression.
///
/// ```
/// use regex_mux::{Encoding, Options, Regex};
///
/// let opts = Options::new().encoding(Encoding::Latin1).case_sensitive(false);
/// let re = Regex::with_options(r"abc", &opts);
/// assert!(re.ok());
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    encoding: Encoding,
    posix_syntax: bool,
    longest_match: bool,
    log_errors: bool,
    literal: bool,
    never_nl: bool,
    dot_nl: bool,
    never_capture: bool,
    case_sensitive: bool,
    perl_classes: bool,
    word_boundary: bool,
    one_line: bool,
    max_mem: usize,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            encoding: Encoding::Utf8,
            posix_syntax: false,
            longest_match: false,
            log_errors: true,
            literal: false,
            never_nl: false,
            dot_nl: false,
            never_capture: false,
            case_sensitive: true,
            perl_classes: false,
            word_boundary: false,
            one_line: false,
            max_mem: DEFAULT_MAX_MEM,
        }
    }
}

impl Options {
    pub fn new() -> Options {
        Options::default()
    }

    /// Options for matching raw bytes rather than UTF-8.
    pub fn latin1() -> Options {
        Options::new().encoding(Encoding::Latin1)
    }

    /// POSIX egrep syntax with leftmost-longest matching.
    pub fn posix() -> Options {
        Options::new().posix_syntax(true).longest_match(true)
    }

    /// Like the defaults, but without logging compile failures.
    pub fn quiet() -> Options {
        Options::new().log_errors(false)
    }

    /// Set the haystack encoding.
    pub fn encoding(mut self, encoding: Encoding) -> Options {
        self.encoding = encoding;
        self
    }

    /// Restrict patterns to POSIX egrep syntax. Perl character classes,
    /// word boundaries and multi-line anchoring are then opt-in via
    /// [`perl_classes`](Options::perl_classes),
    /// [`word_boundary`](Options::word_boundary) and
    /// [`one_line`](Options::one_line).
    pub fn posix_syntax(mut self, yes: bool) -> Options {
        self.posix_syntax = yes;
        self
    }

    /// Report the leftmost-longest match (POSIX semantics) instead of the
    /// leftmost-first match (Perl semantics).
    pub fn longest_match(mut self, yes: bool) -> Options {
        self.longest_match = yes;
        self
    }

    /// Log pattern compile failures via the `log` crate.
    pub fn log_errors(mut self, yes: bool) -> Options {
        self.log_errors = yes;
        self
    }

    /// Treat the pattern as a literal string instead of a regexp.
    pub fn literal(mut self, yes: bool) -> Options {
        self.literal = yes;
        self
    }

    /// Never match `\n`, even when the pattern asks for it explicitly.
    pub fn never_nl(mut self, yes: bool) -> Options {
        self.never_nl = yes;
        self
    }

    /// Let `.` match `\n`.
    pub fn dot_nl(mut self, yes: bool) -> Options {
        self.dot_nl = yes;
        self
    }

    /// Parse all groups as non-capturing.
    pub fn never_capture(mut self, yes: bool) -> Options {
        self.never_capture = yes;
        self
    }

    /// Match case-sensitively. The pattern can still override this with
    /// `(?i)` outside of POSIX mode.
    pub fn case_sensitive(mut self, yes: bool) -> Options {
        self.case_sensitive = yes;
        self
    }

    /// Allow Perl character classes (`\d`, `\s`, `\w`) in POSIX mode.
    pub fn perl_classes(mut self, yes: bool) -> Options {
        self.perl_classes = yes;
        self
    }

    /// Allow `\b` and `\B` in POSIX mode.
    pub fn word_boundary(mut self, yes: bool) -> Options {
        self.word_boundary = yes;
        self
    }

    /// In POSIX mode, make `^` and `$` match only at the beginning and end
    /// of the text rather than at line boundaries.
    pub fn one_line(mut self, yes: bool) -> Options {
        self.one_line = yes;
        self
    }

    /// The approximate upper bound, in bytes, on the memory the compiled
    /// automata may use. Two thirds go to the forward engines and one third
    /// to the reverse engines.
    pub fn max_mem(mut self, bytes: usize) -> Options {
        self.max_mem = bytes;
        self
    }

    pub fn get_encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn get_posix_syntax(&self) -> bool {
        self.posix_syntax
    }

    pub fn get_longest_match(&self) -> bool {
        self.longest_match
    }

    pub fn get_log_errors(&self) -> bool {
        self.log_errors
    }

    pub fn get_literal(&self) -> bool {
        self.literal
    }

    pub fn get_never_nl(&self) -> bool {
        self.never_nl
    }

    pub fn get_dot_nl(&self) -> bool {
        self.dot_nl
    }

    pub fn get_never_capture(&self) -> bool {
        self.never_capture
    }

    pub fn get_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn get_perl_classes(&self) -> bool {
        self.perl_classes
    }

    pub fn get_word_boundary(&self) -> bool {
        self.word_boundary
    }

    pub fn get_one_line(&self) -> bool {
        self.one_line
    }

    pub fn get_max_mem(&self) -> usize {
        self.max_mem
    }

    /// The forward engines have two DFAs (first-match and full-match kinds
    /// share the suffix program) while the reverse side has one, so the
    /// forward side gets twice the memory.
    pub(crate) fn forward_budget(&self) -> usize {
        self.max_mem.saturating_mul(2) / 3
    }

    pub(crate) fn reverse_budget(&self) -> usize {
        self.max_mem / 3
    }
}
