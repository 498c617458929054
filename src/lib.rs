/*!
An RE2-flavored matching front end over automata-based regex engines.

A [`Regex`] compiles its pattern once and then answers every search by
routing it to the cheapest engine that can handle it:

* a lazy **DFA** proves whether a match exists and where it ends, with a
  second, reversed DFA walking backwards to find where it began;
* a **one-pass DFA** extracts capture groups in one linear scan when the
  pattern admits it;
* a **bounded backtracker** handles small program × text products with a
  visited bitmap that guarantees termination;
* a **PikeVM** handles everything else.

The DFAs run under a memory budget ([`Options::max_mem`]) and may refuse
to build or give up mid-search; either way the request silently falls back
to the NFA engines, so callers only ever observe match/no-match.

# Examples

Typed capture extraction with [`full_match`](Regex::full_match):

```
use regex_mux::{bind, Regex};

let re = Regex::new(r"(\d+)-(\d+)");
assert!(re.ok());
let (mut year, mut day) = (0i32, 0i32);
assert!(re.full_match("2009-1125", bind![&mut year, &mut day]));
assert_eq!((year, day), (2009, 1125));
```

Substitution with a rewrite template:

```
use regex_mux::Regex;

let re = Regex::new(r"(\d+) (\d+)");
let mut text = b"10 20".to_vec();
assert_eq!(re.global_replace(&mut text, b"\\2 \\1"), Ok(1));
assert_eq!(text, b"20 10");
```

Bad patterns are recorded rather than returned: construction always yields
a `Regex`, and [`ok`](Regex::ok) / [`error`](Regex::error) report what
happened. Match operations on a broken pattern return false.

A compiled `Regex` is immutable and can be shared across threads; every
search draws its scratch space from an internal pool.
*/

#![deny(unsafe_code)]

mod args;
mod error;
mod literal;
mod options;
mod regex;
mod rewrite;
mod strategy;
mod syntax;
mod wrappers;

pub use crate::{
    args::{Arg, Bind, CRadix, FromRadix, Hex, Octal},
    error::{Error, ErrorCode, RewriteError},
    literal::quote_meta,
    options::{Encoding, Options, DEFAULT_MAX_MEM},
    rewrite::max_submatch,
    regex::{Anchor, Regex},
};

/// The half-open byte range of a match or capture group, re-exported from
/// the underlying engine crate.
pub use regex_automata::Span;
