use std::sync::Arc;
use std::thread;

use quickcheck::quickcheck;
use regex_mux::{bind, Anchor, Options, Regex, RewriteError, Span};

fn span(start: usize, end: usize) -> Option<Span> {
    Some(Span { start, end })
}

fn submatches(re: &Regex, text: &str, anchor: Anchor) -> Option<Vec<Option<Span>>> {
    let mut m = vec![None; 1 + re.num_captures()];
    if re.search(text, 0, anchor, &mut m) {
        Some(m)
    } else {
        None
    }
}

#[test]
fn full_match_with_submatches() {
    let re = Regex::new(r"([0-9]+)-([0-9]+)");
    assert!(re.ok());
    let m = submatches(&re, "2009-1125", Anchor::Both).unwrap();
    assert_eq!(m, vec![span(0, 9), span(0, 4), span(5, 9)]);

    let (mut year, mut rest) = (String::new(), String::new());
    assert!(re.partial_match("2009-1125", bind![&mut year, &mut rest]));
    assert_eq!(year, "2009");
    assert_eq!(rest, "1125");
}

#[test]
fn global_replace_simple() {
    let re = Regex::new(r"\d+");
    let mut text = b"a1b22c333".to_vec();
    assert_eq!(re.global_replace(&mut text, b"X"), Ok(3));
    assert_eq!(text, b"aXbXcX");
}

#[test]
fn global_replace_empty_group_pattern() {
    let re = Regex::new(r"()");
    let mut text = b"abc".to_vec();
    assert_eq!(re.global_replace(&mut text, b"-"), Ok(4));
    assert_eq!(text, b"-a-b-c-");
}

#[test]
fn global_replace_empty_pattern() {
    let re = Regex::new(r"");
    let mut text = b"ab".to_vec();
    assert_eq!(re.global_replace(&mut text, b"-"), Ok(3));
    assert_eq!(text, b"-a-b-");
}

#[test]
fn global_replace_no_match_leaves_text_alone() {
    let re = Regex::new(r"z+");
    let mut text = b"abc".to_vec();
    assert_eq!(re.global_replace(&mut text, b"X"), Ok(0));
    assert_eq!(text, b"abc");
}

#[test]
fn global_replace_adjacent_empty_and_nonempty() {
    // `a*` alternates real matches and suppressed empty ones: the empty
    // match right after the `aa` replacement and the one at the end of
    // the first `<>` are both swallowed with a single byte copy.
    let re = Regex::new(r"a*");
    let mut text = b"baab".to_vec();
    let count = re.global_replace(&mut text, b"<>").unwrap();
    assert_eq!(text, b"<>b<>b<>");
    assert_eq!(count, 3);
}

#[test]
fn replace_first_match_only() {
    let re = Regex::new(r"(\d+)");
    let mut text = b"x12y34".to_vec();
    assert_eq!(re.replace(&mut text, b"[\\1]"), Ok(true));
    assert_eq!(text, b"x[12]y34");

    let mut none = b"xyz".to_vec();
    assert_eq!(re.replace(&mut none, b"[\\1]"), Ok(false));
    assert_eq!(none, b"xyz");
}

#[test]
fn replace_is_idempotent_when_rewrite_cannot_match() {
    let re = Regex::new(r"\d+");
    let mut once = b"a123b".to_vec();
    re.replace(&mut once, b"X").unwrap();
    let mut twice = once.clone();
    re.replace(&mut twice, b"X").unwrap();
    assert_eq!(once, b"aXb");
    assert_eq!(once, twice);
}

#[test]
fn extract_rewrites_submatches() {
    let re = Regex::new(r"(\d+) (\d+)");
    assert_eq!(re.extract("1 2", b"\\2 \\1"), Ok(Some(b"2 1".to_vec())));
    assert_eq!(re.extract("no digits", b"\\2 \\1"), Ok(None));
}

#[test]
fn check_rewrite_reports_group_counts() {
    let re = Regex::new(r"(\d+)");
    assert_eq!(re.check_rewrite(b"\\1"), Ok(()));
    let err = re.check_rewrite(b"\\3").unwrap_err();
    assert_eq!(
        err,
        RewriteError::GroupOutOfRange { requested: 3, available: 1 },
    );
    assert_eq!(
        err.to_string(),
        "Rewrite schema requests 3 matches, but the regexp only has 1 \
         parenthesized subexpressions.",
    );
    assert_eq!(
        re.check_rewrite(b"bad \\"),
        Err(RewriteError::TrailingBackslash),
    );
    assert_eq!(
        re.check_rewrite(b"bad \\x"),
        Err(RewriteError::BadEscape(b'x')),
    );
}

#[test]
fn rewrite_errors_short_circuit_replacement() {
    let re = Regex::new(r"\d+");
    let mut text = b"a1".to_vec();
    assert!(re.global_replace(&mut text, b"\\9").is_err());
    assert_eq!(text, b"a1");
}

#[test]
fn full_match_fold_case_binding() {
    let re = Regex::new(r"(?i)(HELLO)");
    let mut got = String::new();
    assert!(re.full_match("hello", bind![&mut got]));
    assert_eq!(got, "hello");
}

#[test]
fn quote_meta_round_trips_through_matching() {
    let text = "1.5-2+3[]";
    let quoted = regex_mux::quote_meta(text.as_bytes());
    let re = Regex::new(std::str::from_utf8(&quoted).unwrap());
    assert!(re.ok());
    let m = submatches(&re, text, Anchor::Both).unwrap();
    assert_eq!(m[0], span(0, text.len()));
    assert!(!re.is_match("1x5-2+3[]"));
}

#[test]
fn quote_meta_nul_byte() {
    assert_eq!(regex_mux::quote_meta(b"\x00"), b"\\x00".to_vec());
    assert_eq!(regex_mux::quote_meta(b"1.5-2+3"), b"1\\.5\\-2\\+3".to_vec());
}

#[test]
fn empty_pattern_and_empty_text() {
    let re = Regex::new(r"^$");
    let m = submatches(&re, "", Anchor::Unanchored).unwrap();
    assert_eq!(m[0], span(0, 0));
    assert!(!re.is_match("x"));
}

#[test]
fn prefix_only_pattern_anchoring() {
    let re = Regex::new(r"abc");
    assert!(re.is_match("xxabcyy"));
    assert!(!re.search("xxabcyy", 0, Anchor::Start, &mut []));
    assert!(re.search("abcyy", 0, Anchor::Start, &mut []));
    assert!(!re.search("abcyy", 0, Anchor::Both, &mut []));
    assert!(re.search("abc", 0, Anchor::Both, &mut []));
}

#[test]
fn required_prefix_filter_applies_unanchored() {
    let re = Regex::new(r"^abc\d+");
    let mut m = [None];
    assert!(re.search("abc77", 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(0, 5));
    // The prefix pins the start: a later occurrence is not a match.
    assert!(!re.is_match("xxabc77"));
}

#[test]
fn fold_case_prefix() {
    let re = Regex::new(r"(?i)Hello world");
    assert!(re.is_match("HELLO WORLD"));
    assert!(re.is_match("say Hello World now"));

    let anchored = Regex::new(r"(?i)^hello");
    assert!(anchored.is_match("HeLLo there"));
    assert!(!anchored.is_match("nope"));
}

#[test]
fn startpos_offsets_the_search() {
    let re = Regex::new(r"\d+");
    let mut m = [None];
    assert!(re.search("12 34", 2, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(3, 5));
    assert!(!re.search("12", 2, Anchor::Unanchored, &mut m));
    assert!(!re.search("12", 3, Anchor::Unanchored, &mut m));
}

#[test]
fn submatch_slots_beyond_captures_are_absent() {
    let re = Regex::new(r"(a)(z)?");
    let mut m = vec![None; 5];
    assert!(re.search("xa", 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(1, 2));
    assert_eq!(m[1], span(1, 2));
    assert_eq!(m[2], None);
    assert_eq!(m[3], None);
    assert_eq!(m[4], None);
}

#[test]
fn consume_advances_the_cursor() {
    let re = Regex::new(r"(\w+)\s*");
    let mut input: &[u8] = b"alpha beta gamma";
    let mut word = String::new();
    let mut words = Vec::new();
    while re.consume(&mut input, bind![&mut word]) {
        words.push(word.clone());
    }
    assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    assert!(input.is_empty());
}

#[test]
fn find_and_consume_skips_ahead() {
    let re = Regex::new(r"(\d+)");
    let mut input: &[u8] = b"a 10 b 20";
    let mut n = 0u32;
    assert!(re.find_and_consume(&mut input, bind![&mut n]));
    assert_eq!(n, 10);
    assert_eq!(input, b" b 20");
    assert!(re.find_and_consume(&mut input, bind![&mut n]));
    assert_eq!(n, 20);
    assert!(input.is_empty());
    assert!(!re.find_and_consume(&mut input, bind![&mut n]));
}

#[test]
fn typed_bindings_reject_bad_parses() {
    let re = Regex::new(r"(\w+)");
    let mut n = 0i32;
    // The capture is not a number, so the call fails as a whole.
    assert!(!re.full_match("abc", bind![&mut n]));

    // More bindings than capture groups also fails.
    let mut extra = 0i32;
    assert!(!re.full_match("12", bind![&mut n, &mut extra]));
}

#[test]
fn more_captures_than_bindings_is_fine() {
    let re = Regex::new(r"(\d+)-(\d+)");
    let mut first = 0i64;
    assert!(re.full_match("12-34", bind![&mut first]));
    assert_eq!(first, 12);
}

#[test]
fn tiny_memory_budget_still_matches() {
    let opts = Options::new().max_mem(1024);
    let re = Regex::with_options(r"([0-9]+)-([0-9]+)", &opts);
    assert!(re.ok());
    let m = submatches(&re, "2009-1125", Anchor::Both).unwrap();
    assert_eq!(m, vec![span(0, 9), span(0, 4), span(5, 9)]);

    // Unanchored location exercises the reverse-program path, which at
    // this budget gives up and lands on the NFA.
    let mut m = [None; 2];
    assert!(re.search("xx2009-1125yy", 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(2, 11));
}

#[test]
fn tiny_memory_budget_on_large_text() {
    let opts = Options::new().max_mem(1024);
    let re = Regex::with_options(r"(\d+)-(\d+)", &opts);
    let mut text = vec![b'x'; 100_000];
    text.extend_from_slice(b"12-34");
    text.extend_from_slice(&vec![b'y'; 1_000]);
    let mut m = [None; 3];
    assert!(re.search(&text, 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(100_000, 100_005));
    assert_eq!(m[1], span(100_000, 100_002));
    assert_eq!(m[2], span(100_003, 100_005));
}

#[test]
fn large_text_uses_dfa_location() {
    let re = Regex::new(r"(\d+)-(\d+)");
    let mut text = vec![b'x'; 50_000];
    text.extend_from_slice(b"987-654");
    let mut m = [None; 3];
    assert!(re.search(&text, 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(50_000, 50_007));
    assert_eq!(m[1], span(50_000, 50_003));
    assert_eq!(m[2], span(50_004, 50_007));
    assert!(!re.search(&vec![b'x'; 50_000], 0, Anchor::Unanchored, &mut m));
}

#[test]
fn longest_match_option() {
    let first = Regex::new(r"a|ab");
    let mut m = [None];
    assert!(first.search("xab", 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(1, 2));

    let longest =
        Regex::with_options(r"a|ab", &Options::new().longest_match(true));
    assert!(longest.search("xab", 0, Anchor::Unanchored, &mut m));
    assert_eq!(m[0], span(1, 3));

    // Anchored longest.
    assert!(longest.search("ab", 0, Anchor::Start, &mut m));
    assert_eq!(m[0], span(0, 2));
}

#[test]
fn full_match_backs_off_from_greedy_first_choice() {
    // Leftmost-first would stop at `a`, but the full match must cover the
    // whole text.
    let re = Regex::new(r"a|ab");
    assert!(re.search("ab", 0, Anchor::Both, &mut []));
    let m = submatches(&re, "ab", Anchor::Both).unwrap();
    assert_eq!(m[0], span(0, 2));
    assert!(!re.search("ax", 0, Anchor::Both, &mut []));
}

#[test]
fn latin1_matches_raw_bytes() {
    let latin1 = Regex::with_options(r"x.+y", &Options::latin1());
    assert!(latin1.is_match(b"ax\xff\xfeyb".as_slice()));

    let utf8 = Regex::new(r"x.+y");
    assert!(!utf8.is_match(b"ax\xff\xfeyb".as_slice()));
}

#[test]
fn never_nl_option() {
    let re = Regex::with_options(r"a[\n ]b", &Options::new().never_nl(true));
    assert!(re.ok());
    assert!(re.is_match("a b"));
    assert!(!re.is_match("a\nb"));
}

#[test]
fn dot_nl_option() {
    let plain = Regex::new(r"a.b");
    assert!(!plain.is_match("a\nb"));
    let dotnl = Regex::with_options(r"a.b", &Options::new().dot_nl(true));
    assert!(dotnl.is_match("a\nb"));
}

#[test]
fn never_capture_option() {
    let re =
        Regex::with_options(r"(a)(?P<x>b)", &Options::new().never_capture(true));
    assert!(re.ok());
    assert_eq!(re.num_captures(), 0);
    assert!(re.is_match("ab"));
    assert!(re.named_captures().is_empty());
}

#[test]
fn posix_mode_multiline_anchors() {
    let posix = Regex::with_options(r"^b", &Options::posix());
    assert!(posix.is_match("a\nb"));

    let one_line =
        Regex::with_options(r"^b", &Options::posix().one_line(true));
    assert!(!one_line.is_match("a\nb"));
    assert!(one_line.is_match("b"));
}

#[test]
fn literal_option() {
    let re = Regex::with_options(r"a+(b", &Options::new().literal(true));
    assert!(re.ok());
    assert!(re.is_match("xa+(bz"));
    assert!(!re.is_match("aab"));
}

#[test]
fn possible_match_range_literal() {
    let re = Regex::new(r"^abc");
    assert_eq!(
        re.possible_match_range(10),
        Some((b"abc".to_vec(), b"abc".to_vec())),
    );
}

#[test]
fn possible_match_range_foldcase_prefix() {
    let re = Regex::new(r"(?i)^hello");
    assert_eq!(
        re.possible_match_range(10),
        Some((b"HELLO".to_vec(), b"hello".to_vec())),
    );
}

#[test]
fn possible_match_range_truncates() {
    let re = Regex::new(r"abc");
    assert_eq!(
        re.possible_match_range(2),
        Some((b"ab".to_vec(), b"ac".to_vec())),
    );
    let re = Regex::new(r"a+");
    assert_eq!(
        re.possible_match_range(3),
        Some((b"a".to_vec(), b"aab".to_vec())),
    );
}

#[test]
fn concurrent_searches_share_one_pattern() {
    let re = Arc::new(Regex::new(r"(\w+)@(\w+)"));
    let mut handles = Vec::new();
    for i in 0..8 {
        let re = Arc::clone(&re);
        handles.push(thread::spawn(move || {
            for j in 0..200 {
                let text = format!("{}user{}@host{}", "x ".repeat(j % 7), i, j);
                let m = {
                    let mut m = vec![None; 3];
                    assert!(re.search(&text, 0, Anchor::Unanchored, &mut m));
                    m
                };
                let start = m[0].unwrap().start;
                assert_eq!(&text.as_bytes()[start..start + 4], b"user");
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn dfa_and_nfa_pipelines_agree() {
    // The same searches with a starved DFA budget must produce identical
    // overall spans.
    let patterns = [r"(\d+)-(\d+)", r"\w+z", r"(a+)(b*)?c"];
    let texts = ["2009-1125", "xyz abcz 12-9", "aaabbc", "", "zzz-111"];
    for pattern in patterns {
        let fast = Regex::new(pattern);
        let starved =
            Regex::with_options(pattern, &Options::new().max_mem(1024));
        for text in texts {
            let a = submatches(&fast, text, Anchor::Unanchored);
            let b = submatches(&starved, text, Anchor::Unanchored);
            assert_eq!(a, b, "pattern {:?} on {:?}", pattern, text);
        }
    }
}

quickcheck! {
    fn global_replace_replaces_every_digit_run(data: Vec<u8>) -> bool {
        let re = Regex::new(r"[0-9]+");
        let mut text = data.clone();
        let count = match re.global_replace(&mut text, b"X") {
            Ok(count) => count,
            Err(_) => return false,
        };
        let mut runs = 0;
        let mut in_run = false;
        for &b in &data {
            let d = b.is_ascii_digit();
            if d && !in_run {
                runs += 1;
            }
            in_run = d;
        }
        count == runs && !text.iter().any(|b| b.is_ascii_digit())
    }

    fn global_replace_terminates_on_empty_matches(data: Vec<u8>) -> bool {
        let re = Regex::new(r"a*");
        let mut text = data.clone();
        re.global_replace(&mut text, b"").is_ok()
            && !text.contains(&b'a')
    }
}
