/*!
Literal-prefix analysis and byte-string helpers.

A pattern of the form `^literal rest` factors into a required byte prefix
and a residual suffix expression. Searches then check the prefix with a
plain byte comparison and hand only the suffix to the automata, pinned to
start where the prefix ended.
*/

use regex_syntax::hir::{self, Class, Hir, HirKind};

/// Splits a required literal prefix off the front of `hir`.
///
/// Returns the residual suffix expression plus, when factoring succeeded,
/// the prefix bytes and whether comparisons must fold ASCII case. Factoring
/// only applies when the expression is anchored at the start of the text:
/// otherwise the prefix could begin anywhere and a head comparison would be
/// meaningless. The prefix bytes are stored ASCII-lowercased whenever the
/// fold flag is set.
pub(crate) fn required_prefix(hir: Hir) -> (Hir, Option<(Vec<u8>, bool)>) {
    let (bytes, foldcase, consumed) = match analyze(&hir) {
        None => return (hir, None),
        Some(parts) => parts,
    };
    let subs = match hir.into_kind() {
        HirKind::Concat(subs) => subs,
        _ => unreachable!("prefix analysis only accepts concatenations"),
    };
    let suffix = Hir::concat(subs.into_iter().skip(consumed).collect());
    (suffix, Some((bytes, foldcase)))
}

/// The read-only half of `required_prefix`: the prefix bytes, the fold
/// flag and how many concatenation elements they cover (including the
/// leading anchor).
fn analyze(hir: &Hir) -> Option<(Vec<u8>, bool, usize)> {
    let subs = match *hir.kind() {
        HirKind::Concat(ref subs) => subs,
        _ => return None,
    };
    match subs.first().map(|h| h.kind()) {
        Some(&HirKind::Look(hir::Look::Start)) => {}
        _ => return None,
    }

    let mut bytes = Vec::new();
    let mut foldcase = false;
    let mut consumed = 1;
    for sub in subs.iter().skip(1) {
        match *sub.kind() {
            HirKind::Literal(hir::Literal(ref lit)) => {
                // A fold-insensitive run must stay free of ASCII letters:
                // letters seen while folding is off would be folded
                // retroactively by the single prefix-wide flag.
                if foldcase && lit.iter().any(u8::is_ascii_alphabetic) {
                    break;
                }
                bytes.extend_from_slice(lit);
            }
            HirKind::Class(ref cls) => {
                let lower = match fold_pair(cls) {
                    None => break,
                    Some(lower) => lower,
                };
                if !foldcase
                    && bytes.iter().any(|b| b.is_ascii_alphabetic())
                {
                    break;
                }
                foldcase = true;
                bytes.push(lower);
            }
            _ => break,
        }
        consumed += 1;
    }
    if bytes.is_empty() {
        return None;
    }
    Some((bytes, foldcase, consumed))
}

/// If the class is exactly an ASCII `{upper, lower}` case pair, returns the
/// lowercase byte. Classes with extra members (for example Unicode fold
/// orbits like `K`/`k`/KELVIN SIGN) do not qualify.
fn fold_pair(cls: &Class) -> Option<u8> {
    let (lo, hi) = match *cls {
        Class::Unicode(ref cls) => {
            let ranges = cls.ranges();
            if ranges.len() != 2 {
                return None;
            }
            if ranges[0].start() != ranges[0].end()
                || ranges[1].start() != ranges[1].end()
            {
                return None;
            }
            let (lo, hi) = (ranges[0].start(), ranges[1].start());
            if !lo.is_ascii() || !hi.is_ascii() {
                return None;
            }
            (lo as u8, hi as u8)
        }
        Class::Bytes(ref cls) => {
            let ranges = cls.ranges();
            if ranges.len() != 2 {
                return None;
            }
            if ranges[0].start() != ranges[0].end()
                || ranges[1].start() != ranges[1].end()
            {
                return None;
            }
            (ranges[0].start(), ranges[1].start())
        }
    };
    if lo.is_ascii_uppercase() && hi == lo + 32 {
        return Some(hi);
    }
    None
}

/// Compares `text` against an ASCII-lowercase `prefix`, folding `A`..`Z`
/// in `text` on the fly. No locale, no Unicode case mapping.
pub(crate) fn ascii_eq_fold(prefix: &[u8], text: &[u8]) -> bool {
    if prefix.len() != text.len() {
        return false;
    }
    prefix.iter().zip(text.iter()).all(|(&p, &t)| {
        let t = if t.is_ascii_uppercase() { t + 32 } else { t };
        p == t
    })
}

/// Escapes `unquoted` so that, parsed as a pattern, it matches exactly the
/// original bytes.
///
/// Every byte outside `[A-Za-z0-9_]` that does not have its high bit set is
/// escaped with a backslash. Bytes with the high bit set are copied
/// verbatim so that UTF-8 and Latin-1 sequences survive unescaped. A NUL
/// byte becomes the four bytes `\x00`, since `\0` followed by a digit would
/// read as an octal escape in other regexp libraries.
///
/// ```
/// use regex_mux::quote_meta;
///
/// assert_eq!(quote_meta(b"1.5-2+3"), b"1\\.5\\-2\\+3");
/// ```
pub fn quote_meta(unquoted: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(unquoted.len() * 2);
    for &b in unquoted {
        if !b.is_ascii_alphanumeric() && b != b'_' && b & 0x80 == 0 {
            if b == 0 {
                result.extend_from_slice(b"\\x00");
                continue;
            }
            result.push(b'\\');
        }
        result.push(b);
    }
    result
}

/// The smallest byte string strictly greater than every string that starts
/// with `prefix`: trailing `0xff` bytes are dropped and the last remaining
/// byte is incremented. Returns an empty vector when no such string exists.
pub(crate) fn prefix_successor(prefix: &[u8]) -> Vec<u8> {
    let mut out = prefix.to_vec();
    while let Some(&last) = out.last() {
        if last == 0xff {
            out.pop();
        } else {
            *out.last_mut().unwrap() = last + 1;
            break;
        }
    }
    out
}
