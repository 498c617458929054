/*!
Typed output bindings for the convenience matchers.

[`full_match`](crate::Regex::full_match) and friends accept a slice of
[`Arg`] values, each of which parses one capture group into a typed
destination. The [`bind!`](crate::bind) macro builds that slice at any
arity:

```
use regex_mux::{bind, Regex};

let re = Regex::new(r"(\d+):(\d+)");
let (mut h, mut m) = (0u32, 0u32);
assert!(re.full_match("12:34", bind![&mut h, &mut m]));
assert_eq!((h, m), (12, 34));
```

Integers parse in base 10 by default; wrap the destination in [`Hex`],
[`Octal`] or [`CRadix`] for other bases. Parsers are strict: no leading
whitespace, no trailing junk, no overflow, and no `-` for unsigned
destinations.
*/

use std::fmt;

/// Parses a capture group into a typed destination.
///
/// Implementations exist for the integer types at 16/32/64 bits, `f32`,
/// `f64`, `u8` (a single byte), `String`, `Vec<u8>`, `&[u8]` (a borrow of
/// the haystack) and `()` (accept and discard).
pub trait Bind<'h> {
    /// Parses `capture` into `self`, returning false on rejection. An
    /// absent capture group is presented as an empty slice.
    fn bind(&mut self, capture: &'h [u8]) -> bool;
}

/// A type-erased [`Bind`] destination, as built by [`bind!`](crate::bind).
pub struct Arg<'a, 'h> {
    dest: &'a mut dyn Bind<'h>,
}

impl<'a, 'h> Arg<'a, 'h> {
    pub fn new<T: Bind<'h>>(dest: &'a mut T) -> Arg<'a, 'h> {
        Arg { dest }
    }

    pub(crate) fn bind(&mut self, capture: &'h [u8]) -> bool {
        self.dest.bind(capture)
    }
}

impl<'a, 'h> fmt::Debug for Arg<'a, 'h> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Arg { .. }")
    }
}

/// Builds the argument slice for the typed matchers.
///
/// `bind![&mut a, &mut b]` erases each destination behind an [`Arg`], in
/// order. With no arguments it produces an empty slice.
#[macro_export]
macro_rules! bind {
    () => {
        &mut [] as &mut [$crate::Arg<'_, '_>]
    };
    ($($dest:expr),+ $(,)?) => {
        &mut [$($crate::Arg::new($dest)),+]
    };
}

/// Parses a signed integer with a radix: 10, 16 (optional `0x` prefix),
/// 8, or 0 meaning "like C": `0x` is hex, a leading `0` is octal,
/// anything else is decimal.
fn parse_signed(bytes: &[u8], radix: u32) -> Option<i128> {
    let (neg, digits, radix) = normalize(bytes, radix)?;
    let s = std::str::from_utf8(digits).ok()?;
    let mag = u128::from_str_radix(s, radix).ok()?;
    if mag > i128::MAX as u128 {
        return None;
    }
    Some(if neg { -(mag as i128) } else { mag as i128 })
}

/// Like `parse_signed`, but a leading `-` is an error rather than silently
/// wrapping.
fn parse_unsigned(bytes: &[u8], radix: u32) -> Option<u128> {
    if bytes.first() == Some(&b'-') {
        return None;
    }
    let (_, digits, radix) = normalize(bytes, radix)?;
    let s = std::str::from_utf8(digits).ok()?;
    u128::from_str_radix(s, radix).ok()
}

fn normalize(bytes: &[u8], radix: u32) -> Option<(bool, &[u8], u32)> {
    if bytes.is_empty() {
        return None;
    }
    let (neg, rest) = match bytes[0] {
        b'-' => (true, &bytes[1..]),
        b'+' => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    let (digits, radix) = match radix {
        0 => {
            if rest.len() > 1 && (rest.starts_with(b"0x") || rest.starts_with(b"0X")) {
                (&rest[2..], 16)
            } else if rest.len() > 1 && rest[0] == b'0' {
                (rest, 8)
            } else {
                (rest, 10)
            }
        }
        16 => {
            if rest.starts_with(b"0x") || rest.starts_with(b"0X") {
                (&rest[2..], 16)
            } else {
                (rest, 16)
            }
        }
        r => (rest, r),
    };
    if digits.is_empty() {
        return None;
    }
    Some((neg, digits, radix))
}

macro_rules! bind_signed {
    ($($ty:ty),*) => {$(
        impl<'h> Bind<'h> for $ty {
            fn bind(&mut self, capture: &'h [u8]) -> bool {
                match parse_signed(capture, 10)
                    .and_then(|n| <$ty>::try_from(n).ok())
                {
                    Some(n) => {
                        *self = n;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

macro_rules! bind_unsigned {
    ($($ty:ty),*) => {$(
        impl<'h> Bind<'h> for $ty {
            fn bind(&mut self, capture: &'h [u8]) -> bool {
                match parse_unsigned(capture, 10)
                    .and_then(|n| <$ty>::try_from(n).ok())
                {
                    Some(n) => {
                        *self = n;
                        true
                    }
                    None => false,
                }
            }
        }
    )*};
}

bind_signed!(i16, i32, i64);
bind_unsigned!(u16, u32, u64);

/// Integer destinations that can parse in a caller-chosen radix, for the
/// [`Hex`], [`Octal`] and [`CRadix`] wrappers.
pub trait FromRadix: Sized {
    fn from_radix(bytes: &[u8], radix: u32) -> Option<Self>;
}

macro_rules! from_radix_signed {
    ($($ty:ty),*) => {$(
        impl FromRadix for $ty {
            fn from_radix(bytes: &[u8], radix: u32) -> Option<$ty> {
                parse_signed(bytes, radix)
                    .and_then(|n| <$ty>::try_from(n).ok())
            }
        }
    )*};
}

macro_rules! from_radix_unsigned {
    ($($ty:ty),*) => {$(
        impl FromRadix for $ty {
            fn from_radix(bytes: &[u8], radix: u32) -> Option<$ty> {
                parse_unsigned(bytes, radix)
                    .and_then(|n| <$ty>::try_from(n).ok())
            }
        }
    )*};
}

from_radix_signed!(i16, i32, i64);
from_radix_unsigned!(u16, u32, u64);

macro_rules! radix_wrapper {
    ($(#[$doc:meta])* $name:ident, $radix:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<'a, T>(pub &'a mut T);

        impl<'a, 'h, T: FromRadix> Bind<'h> for $name<'a, T> {
            fn bind(&mut self, capture: &'h [u8]) -> bool {
                match T::from_radix(capture, $radix) {
                    Some(n) => {
                        *self.0 = n;
                        true
                    }
                    None => false,
                }
            }
        }
    };
}

radix_wrapper!(
    /// Parses the capture as hexadecimal, with an optional `0x` prefix.
    Hex,
    16
);
radix_wrapper!(
    /// Parses the capture as octal.
    Octal,
    8
);
radix_wrapper!(
    /// Parses the capture like a C integer literal: `0x..` is hex, `0..`
    /// is octal, everything else is decimal.
    CRadix,
    0
);

impl<'h> Bind<'h> for f64 {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        let s = match std::str::from_utf8(capture) {
            Ok(s) => s,
            Err(_) => return false,
        };
        match s.parse() {
            Ok(v) => {
                *self = v;
                true
            }
            Err(_) => false,
        }
    }
}

impl<'h> Bind<'h> for f32 {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        let s = match std::str::from_utf8(capture) {
            Ok(s) => s,
            Err(_) => return false,
        };
        match s.parse() {
            Ok(v) => {
                *self = v;
                true
            }
            Err(_) => false,
        }
    }
}

impl<'h> Bind<'h> for String {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        match std::str::from_utf8(capture) {
            Ok(s) => {
                self.clear();
                self.push_str(s);
                true
            }
            Err(_) => false,
        }
    }
}

impl<'h> Bind<'h> for Vec<u8> {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        self.clear();
        self.extend_from_slice(capture);
        true
    }
}

impl<'h> Bind<'h> for &'h [u8] {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        *self = capture;
        true
    }
}

impl<'h> Bind<'h> for u8 {
    fn bind(&mut self, capture: &'h [u8]) -> bool {
        if capture.len() != 1 {
            return false;
        }
        *self = capture[0];
        true
    }
}

impl<'h> Bind<'h> for () {
    fn bind(&mut self, _capture: &'h [u8]) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'h, T: Bind<'h> + Default>(capture: &'h [u8]) -> Option<T> {
        let mut v = T::default();
        if v.bind(capture) {
            Some(v)
        } else {
            None
        }
    }

    #[test]
    fn decimal_integers() {
        assert_eq!(parse::<i32>(b"123"), Some(123));
        assert_eq!(parse::<i32>(b"-123"), Some(-123));
        assert_eq!(parse::<i32>(b"+7"), Some(7));
        assert_eq!(parse::<u32>(b"123"), Some(123));
        assert_eq!(parse::<i64>(b"9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse::<i64>(b"-9223372036854775808"), Some(i64::MIN));
    }

    #[test]
    fn strictness() {
        assert_eq!(parse::<i32>(b""), None);
        assert_eq!(parse::<i32>(b" 1"), None);
        assert_eq!(parse::<i32>(b"1 "), None);
        assert_eq!(parse::<i32>(b"1x"), None);
        assert_eq!(parse::<u32>(b"-1"), None);
        assert_eq!(parse::<u32>(b"-0"), None);
        assert_eq!(parse::<i16>(b"40000"), None);
        assert_eq!(parse::<u16>(b"70000"), None);
        assert_eq!(parse::<i64>(b"9223372036854775808"), None);
    }

    #[test]
    fn radix_wrappers() {
        let mut v = 0u32;
        assert!(Hex(&mut v).bind(b"ff"));
        assert_eq!(v, 0xff);
        assert!(Hex(&mut v).bind(b"0xFF"));
        assert_eq!(v, 0xff);
        assert!(Octal(&mut v).bind(b"777"));
        assert_eq!(v, 0o777);
        assert!(CRadix(&mut v).bind(b"0x10"));
        assert_eq!(v, 16);
        assert!(CRadix(&mut v).bind(b"010"));
        assert_eq!(v, 8);
        assert!(CRadix(&mut v).bind(b"10"));
        assert_eq!(v, 10);
        assert!(CRadix(&mut v).bind(b"0"));
        assert_eq!(v, 0);

        let mut s = 0i32;
        assert!(Hex(&mut s).bind(b"-10"));
        assert_eq!(s, -16);
    }

    #[test]
    fn floats() {
        assert_eq!(parse::<f64>(b"1.5"), Some(1.5));
        assert_eq!(parse::<f64>(b"-2e3"), Some(-2000.0));
        assert_eq!(parse::<f64>(b""), None);
        assert_eq!(parse::<f64>(b"1.5x"), None);
        assert_eq!(parse::<f32>(b"0.25"), Some(0.25));
    }

    #[test]
    fn strings_and_bytes() {
        assert_eq!(parse::<String>(b"abc"), Some("abc".to_string()));
        assert_eq!(parse::<String>(b"\xff"), None);
        assert_eq!(parse::<Vec<u8>>(b"\xff"), Some(vec![0xff]));
        assert_eq!(parse::<u8>(b"x"), Some(b'x'));
        assert_eq!(parse::<u8>(b"xy"), None);
        let mut slice: &[u8] = b"";
        assert!(slice.bind(b"zap"));
        assert_eq!(slice, b"zap");
        assert!(().clone().bind(b"anything"));
    }
}
