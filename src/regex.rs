use std::collections::HashMap;
use std::sync::OnceLock;

use log::error;
use regex_automata::{util::primitives::PatternID, Span};
use regex_syntax::hir::{Hir, Look};

use crate::{
    args::Arg,
    error::{Error, ErrorCode, RewriteError},
    options::Options,
    rewrite, syntax,
    wrappers::{self, CachePool, Engines, Reverse},
};

/// Where a match is required to begin and end, relative to the searched
/// text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// The match may appear anywhere.
    Unanchored,
    /// The match must begin where the search begins.
    Start,
    /// The match must cover the searched text exactly.
    Both,
}

/// A compiled pattern and the dispatcher that routes searches across its
/// engines.
///
/// Construction always succeeds in the sense that it returns a `Regex`;
/// a bad pattern is recorded on the value and every match operation on it
/// returns false. Check [`ok`](Regex::ok) (or [`error`](Regex::error))
/// after construction.
///
/// ```
/// use regex_mux::Regex;
///
/// let re = Regex::new(r"(\d+)-(\d+)");
/// assert!(re.ok());
/// let mut m = [None; 3];
/// assert!(re.search("2009-1125", 0, regex_mux::Anchor::Both, &mut m));
/// ```
///
/// A `Regex` is immutable once built: concurrent searches from many
/// threads share it freely. Per-search scratch comes from an internal
/// pool, and the two lazily-built programs (the reverse program for
/// locating unanchored match starts, and the end-anchored program for
/// full-match requests) publish through a once-only initializer.
#[derive(Debug)]
pub struct Regex {
    pattern: String,
    options: Options,
    error: Option<Box<Error>>,
    core: Option<Core>,
}

/// Everything a valid pattern compiles into.
#[derive(Debug)]
pub(crate) struct Core {
    /// The residual expression after prefix factoring; kept for the lazy
    /// reverse and end-anchored compiles.
    pub(crate) suffix: Hir,
    /// Bytes every match must start with, possibly empty. Stored
    /// ASCII-lowercase when `prefix_foldcase` is set.
    pub(crate) prefix: Vec<u8>,
    pub(crate) prefix_foldcase: bool,
    pub(crate) num_captures: usize,
    pub(crate) anchor_start: bool,
    pub(crate) anchor_end: bool,
    pub(crate) forward: Engines,
    pub(crate) reverse: OnceLock<Result<Reverse, Error>>,
    pub(crate) full: OnceLock<Result<Engines, Error>>,
    named: OnceLock<HashMap<String, usize>>,
    pub(crate) pool: CachePool,
}

impl Regex {
    /// Compiles `pattern` with the default [`Options`].
    pub fn new(pattern: &str) -> Regex {
        Regex::with_options(pattern, &Options::default())
    }

    /// Compiles `pattern` under `options`.
    pub fn with_options(pattern: &str, options: &Options) -> Regex {
        let options = options.clone();
        match compile(pattern, &options) {
            Ok(core) => Regex {
                pattern: pattern.to_string(),
                options,
                error: None,
                core: Some(core),
            },
            Err(err) => {
                if options.get_log_errors() {
                    error!("error parsing '{}': {}", pattern, err.message());
                }
                Regex {
                    pattern: pattern.to_string(),
                    options,
                    error: Some(Box::new(err)),
                    core: None,
                }
            }
        }
    }

    /// Whether the pattern compiled.
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// The pattern text this value was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The options this value was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The compile error message, or `""` for a valid pattern.
    pub fn error(&self) -> &str {
        self.error.as_deref().map_or("", |e| e.message())
    }

    /// The offending fragment of the pattern, or `""`.
    pub fn error_arg(&self) -> &str {
        self.error.as_deref().map_or("", |e| e.arg())
    }

    /// The compile error category. Also reports a failure of one of the
    /// lazily-built programs, which can only be a budget overrun.
    pub fn error_code(&self) -> ErrorCode {
        if let Some(err) = self.error.as_deref() {
            return err.code();
        }
        if let Some(core) = &self.core {
            let lazy_failed = matches!(core.reverse.get(), Some(Err(_)))
                || matches!(core.full.get(), Some(Err(_)));
            if lazy_failed {
                return ErrorCode::PatternTooLarge;
            }
        }
        ErrorCode::NoError
    }

    /// Number of parenthesized capture groups, not counting the whole
    /// match. Zero for an invalid pattern.
    pub fn num_captures(&self) -> usize {
        self.core.as_ref().map_or(0, |c| c.num_captures)
    }

    /// Size of the forward program, in NFA states. Zero for an invalid
    /// pattern.
    pub fn program_size(&self) -> usize {
        self.core.as_ref().map_or(0, |c| c.forward.program_size())
    }

    /// The pattern's named capture groups, mapped to their indices.
    /// Computed on first use.
    pub fn named_captures(&self) -> &HashMap<String, usize> {
        static EMPTY: OnceLock<HashMap<String, usize>> = OnceLock::new();
        match &self.core {
            None => EMPTY.get_or_init(HashMap::new),
            Some(core) => core.named.get_or_init(|| {
                let info = core.forward.nfa().group_info();
                let mut map = HashMap::new();
                for i in 1..info.group_len(PatternID::ZERO) {
                    if let Some(name) = info.to_name(PatternID::ZERO, i) {
                        map.insert(name.to_string(), i);
                    }
                }
                map
            }),
        }
    }

    /// The core matching operation: searches `haystack` from `startpos`
    /// under `anchor`, filling `submatch` with the overall match followed
    /// by capture groups. Slots beyond the pattern's captures are cleared.
    ///
    /// Returns false on no match, and always returns false on an invalid
    /// pattern.
    pub fn search<H: ?Sized + AsRef<[u8]>>(
        &self,
        haystack: &H,
        startpos: usize,
        anchor: Anchor,
        submatch: &mut [Option<Span>],
    ) -> bool {
        let core = match &self.core {
            Some(core) => core,
            None => {
                if self.options.get_log_errors() {
                    error!("invalid regex '{}': {}", self.pattern, self.error());
                }
                return false;
            }
        };
        core.search(&self.options, haystack.as_ref(), startpos, anchor, submatch)
    }

    /// Whether the pattern matches anywhere in `haystack`.
    pub fn is_match<H: ?Sized + AsRef<[u8]>>(&self, haystack: &H) -> bool {
        self.search(haystack, 0, Anchor::Unanchored, &mut [])
    }

    /// The span of the first match in `haystack`.
    pub fn find<H: ?Sized + AsRef<[u8]>>(&self, haystack: &H) -> Option<Span> {
        let mut m = [None];
        if self.search(haystack, 0, Anchor::Unanchored, &mut m) {
            m[0]
        } else {
            None
        }
    }

    /// Matches the pattern against all of `text`, parsing capture groups
    /// into `args` (see [`bind!`](crate::bind)). Fails if the pattern has
    /// fewer groups than there are arguments, or if any argument rejects
    /// its capture.
    pub fn full_match<'h, H: ?Sized + AsRef<[u8]>>(
        &self,
        text: &'h H,
        args: &mut [Arg<'_, 'h>],
    ) -> bool {
        self.do_match(text.as_ref(), Anchor::Both, None, args)
    }

    /// Like [`full_match`](Regex::full_match), but the match may appear
    /// anywhere in `text`.
    pub fn partial_match<'h, H: ?Sized + AsRef<[u8]>>(
        &self,
        text: &'h H,
        args: &mut [Arg<'_, 'h>],
    ) -> bool {
        self.do_match(text.as_ref(), Anchor::Unanchored, None, args)
    }

    /// Matches the pattern at the beginning of `*input` and, on success,
    /// advances `*input` past the matched bytes.
    pub fn consume<'h>(
        &self,
        input: &mut &'h [u8],
        args: &mut [Arg<'_, 'h>],
    ) -> bool {
        let text = *input;
        let mut consumed = 0;
        if self.do_match(text, Anchor::Start, Some(&mut consumed), args) {
            *input = &text[consumed..];
            true
        } else {
            false
        }
    }

    /// Matches the pattern anywhere in `*input` and, on success, advances
    /// `*input` past the end of the match.
    pub fn find_and_consume<'h>(
        &self,
        input: &mut &'h [u8],
        args: &mut [Arg<'_, 'h>],
    ) -> bool {
        let text = *input;
        let mut consumed = 0;
        if self.do_match(text, Anchor::Unanchored, Some(&mut consumed), args)
        {
            *input = &text[consumed..];
            true
        } else {
            false
        }
    }

    fn do_match<'h>(
        &self,
        text: &'h [u8],
        anchor: Anchor,
        consumed: Option<&mut usize>,
        args: &mut [Arg<'_, 'h>],
    ) -> bool {
        let nvec = if args.is_empty() && consumed.is_none() {
            0
        } else {
            args.len() + 1
        };
        let mut vec = vec![None; nvec];
        if !self.search(text, 0, anchor, &mut vec) {
            return false;
        }
        if let Some(consumed) = consumed {
            *consumed = vec[0].map_or(0, |s: Span| s.end);
        }
        if args.is_empty() {
            return true;
        }
        if self.num_captures() < args.len() {
            return false;
        }
        for (i, arg) in args.iter_mut().enumerate() {
            let capture = match vec[i + 1] {
                Some(span) => &text[span.start..span.end],
                None => &[][..],
            };
            if !arg.bind(capture) {
                return false;
            }
        }
        true
    }

    /// Replaces the first match of the pattern in `text` with `rewrite`
    /// (`\1`..`\9` expand to capture groups, `\0` to the whole match).
    /// Returns whether a replacement happened; a malformed or oversized
    /// rewrite is an error before any matching runs.
    pub fn replace(
        &self,
        text: &mut Vec<u8>,
        rewrite: &[u8],
    ) -> Result<bool, RewriteError> {
        let nvec = 1 + self.checked_max_submatch(rewrite)?;
        let mut vec = vec![None; nvec];
        if !self.search(text.as_slice(), 0, Anchor::Unanchored, &mut vec) {
            return Ok(false);
        }
        let m0 = match vec[0] {
            Some(span) => span,
            None => return Ok(false),
        };
        let mut expansion = Vec::new();
        rewrite::rewrite(&mut expansion, rewrite, text, &vec)?;
        text.splice(m0.start..m0.end, expansion);
        Ok(true)
    }

    /// Replaces every non-overlapping match of the pattern in `text` with
    /// `rewrite`, left to right, and returns how many replacements were
    /// made. A zero-length match immediately after a previous match is
    /// suppressed, so the cursor always advances and adjacent empty
    /// matches insert at most one rewrite per position.
    pub fn global_replace(
        &self,
        text: &mut Vec<u8>,
        rewrite: &[u8],
    ) -> Result<usize, RewriteError> {
        let nvec = 1 + self.checked_max_submatch(rewrite)?;
        let mut vec = vec![None; nvec];
        let mut out = Vec::with_capacity(text.len());
        let ep = text.len();
        let mut p = 0;
        let mut lastend = None;
        let mut count = 0;
        while p <= ep {
            if !self.search(text.as_slice(), p, Anchor::Unanchored, &mut vec)
            {
                break;
            }
            let m0 = match vec[0] {
                Some(span) => span,
                None => break,
            };
            if p < m0.start {
                out.extend_from_slice(&text[p..m0.start]);
            }
            if Some(m0.start) == lastend && m0.len() == 0 {
                // An empty match at the end of the previous match would
                // neither advance nor add anything: move one byte along.
                if p < ep {
                    out.push(text[p]);
                }
                p += 1;
                continue;
            }
            rewrite::rewrite(&mut out, rewrite, text, &vec)?;
            p = m0.end;
            lastend = Some(p);
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }
        if p < ep {
            out.extend_from_slice(&text[p..]);
        }
        *text = out;
        Ok(count)
    }

    /// Matches the pattern in `text` and expands `rewrite` with the
    /// result. `None` means the pattern did not match.
    pub fn extract<H: ?Sized + AsRef<[u8]>>(
        &self,
        text: &H,
        rewrite: &[u8],
    ) -> Result<Option<Vec<u8>>, RewriteError> {
        let text = text.as_ref();
        let nvec = 1 + self.checked_max_submatch(rewrite)?;
        let mut vec = vec![None; nvec];
        if !self.search(text, 0, Anchor::Unanchored, &mut vec) {
            return Ok(None);
        }
        let mut out = Vec::new();
        rewrite::rewrite(&mut out, rewrite, text, &vec)?;
        Ok(Some(out))
    }

    /// Checks that `rewrite` is well formed and only references groups
    /// this pattern has.
    pub fn check_rewrite(&self, rewrite: &[u8]) -> Result<(), RewriteError> {
        self.checked_max_submatch(rewrite).map(|_| ())
    }

    fn checked_max_submatch(
        &self,
        rewrite: &[u8],
    ) -> Result<usize, RewriteError> {
        let max = rewrite::check(rewrite)?;
        if max > self.num_captures() {
            return Err(RewriteError::GroupOutOfRange {
                requested: max,
                available: self.num_captures(),
            });
        }
        Ok(max)
    }

    /// Byte-string bounds `(min, max)` such that every text this pattern
    /// matches (from its anchored start) begins with a string in that
    /// range, each side capped at `maxlen` bytes. `None` when nothing
    /// useful is known.
    pub fn possible_match_range(
        &self,
        maxlen: usize,
    ) -> Option<(Vec<u8>, Vec<u8>)> {
        let core = self.core.as_ref()?;
        let n = core.prefix.len().min(maxlen);
        let mut pmin = core.prefix[..n].to_vec();
        let mut pmax = core.prefix[..n].to_vec();
        if core.prefix_foldcase {
            // The stored prefix is lowercase; the uppercase variant sorts
            // first, so it forms the min side.
            for b in pmin.iter_mut() {
                if b.is_ascii_lowercase() {
                    *b -= 32;
                }
            }
        }

        let rest = maxlen - n;
        let suffix_range = if rest > 0 {
            let mut guard = core.pool.get();
            core.forward
                .hybrid()
                .possible_match_range(&mut guard.fwd, rest)
        } else {
            None
        };
        match suffix_range {
            Some((dmin, dmax)) => {
                pmin.extend_from_slice(&dmin);
                pmax.extend_from_slice(&dmax);
            }
            None if !pmax.is_empty() => {
                // The program gave us nothing, but the literal prefix is
                // still a bound once rounded up to cover any suffix.
                pmax = crate::literal::prefix_successor(&pmax);
            }
            None => return None,
        }
        Some((pmin, pmax))
    }
}

impl Core {
    /// The reverse program, compiled on first use with a third of the
    /// memory budget. A budget overrun here poisons the pattern: matching
    /// keeps failing and `error_code` reports it.
    pub(crate) fn reverse_prog(&self, opts: &Options) -> Result<&Reverse, ()> {
        let result = self.reverse.get_or_init(|| {
            Reverse::new(&self.suffix, opts, opts.reverse_budget()).map_err(
                |err| {
                    if opts.get_log_errors() {
                        error!("error compiling reverse program: {}", err);
                    }
                    err
                },
            )
        });
        result.as_ref().map_err(|_| ())
    }

    /// The end-anchored engine set used for both-anchored requests,
    /// compiled on first use: the suffix expression with an end-of-text
    /// assertion appended, so "must cover the whole text" is enforced by
    /// the program instead of the driver.
    pub(crate) fn full_engines(&self, opts: &Options) -> Option<&Engines> {
        let result = self.full.get_or_init(|| {
            let hir = Hir::concat(vec![
                self.suffix.clone(),
                Hir::look(Look::End),
            ]);
            Engines::new(&hir, opts, opts.forward_budget()).map_err(|err| {
                if opts.get_log_errors() {
                    error!("error compiling full-match program: {}", err);
                }
                err
            })
        });
        result.as_ref().ok()
    }
}

fn compile(pattern: &str, opts: &Options) -> Result<Core, Error> {
    let hir = syntax::parse(pattern, opts)?;
    let (suffix, prefix) = crate::literal::required_prefix(hir);
    let (prefix, prefix_foldcase) = prefix.unwrap_or((Vec::new(), false));
    let props = suffix.properties();
    let num_captures = props.explicit_captures_len();
    let anchor_start = props.look_set_prefix().contains(Look::Start);
    let anchor_end = props.look_set_suffix().contains(Look::End);
    let forward = Engines::new(&suffix, opts, opts.forward_budget())?;
    Ok(Core {
        suffix,
        prefix,
        prefix_foldcase,
        num_captures,
        anchor_start,
        anchor_end,
        forward,
        reverse: OnceLock::new(),
        full: OnceLock::new(),
        named: OnceLock::new(),
        pool: wrappers::new_cache_pool(),
    })
}
