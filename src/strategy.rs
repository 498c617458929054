/*!
The per-request engine selection and match driver.

Every search runs the same funnel: check the required prefix, reconcile
anchors, let the DFAs prove or locate the match when they can, then hand
the smallest possible span to the cheapest engine that can report capture
groups. A DFA that runs out of cache is never an error: the request falls
through to the NFA engines over the whole subtext.
*/

use log::{error, trace};
use regex_automata::{
    hybrid, util::primitives::NonMaxUsize, Anchored, Input, Span,
};

use crate::{
    literal::ascii_eq_fold,
    options::Options,
    regex::{Anchor, Core},
    wrappers::{dfa_outcome, Cache, DfaOutcome, EngineCache, Engines},
};

/// What the DFA phase learned about the request.
enum Step {
    /// The match is known to lie exactly in this span.
    Located(Span),
    /// The DFA proved there is no match.
    NoMatch,
    /// The DFA could not answer; re-run on the NFA engines.
    GaveUp,
    /// Unrecoverable disagreement or a broken reverse program.
    Fail,
}

impl Core {
    /// The single entry point behind every matching operation.
    ///
    /// On success, `submatch[0]` is the overall match and `submatch[i]` is
    /// capture group `i`; slots past the pattern's capture count are
    /// cleared. Spans index into `haystack`.
    pub(crate) fn search(
        &self,
        opts: &Options,
        haystack: &[u8],
        startpos: usize,
        re_anchor: Anchor,
        submatch: &mut [Option<Span>],
    ) -> bool {
        if startpos > haystack.len() {
            return false;
        }
        let nsubmatch = submatch.len();
        let want_loc = nsubmatch != 0;
        let ncap = (1 + self.num_captures).min(nsubmatch);
        let mut start = startpos;
        let end = haystack.len();

        // Reconcile the caller's anchor with the pattern's own anchors so
        // the faster anchored paths below apply as often as possible.
        let mut anchor = re_anchor;
        if self.anchor_start && self.anchor_end {
            anchor = Anchor::Both;
        } else if self.anchor_start && anchor != Anchor::Both {
            anchor = Anchor::Start;
        }

        // Required-prefix filter. Passing it pins the match start, so the
        // effective anchor rises to at least start-anchored.
        let mut prefixlen = 0;
        if !self.prefix.is_empty() {
            prefixlen = self.prefix.len();
            let subtext = &haystack[start..];
            if prefixlen > subtext.len() {
                return false;
            }
            let head = &subtext[..prefixlen];
            let head_matches = if self.prefix_foldcase {
                ascii_eq_fold(&self.prefix, head)
            } else {
                self.prefix[..] == *head
            };
            if !head_matches {
                return false;
            }
            start += prefixlen;
            if anchor != Anchor::Both {
                anchor = Anchor::Start;
            }
        }

        // A both-anchored request runs against the end-anchored engine
        // set, where "must reach end of text" is part of the program; the
        // request itself then proceeds as a start-anchored search.
        let engines = if anchor == Anchor::Both {
            match self.full_engines(opts) {
                Some(engines) => engines,
                None => return false,
            }
        } else {
            &self.forward
        };

        let mut guard = self.pool.get();
        let Cache { ref mut fwd, ref mut full, ref mut rev, ref mut slots } =
            *guard;
        let ecache = if anchor == Anchor::Both { full } else { fwd };

        let mut skipped_test = false;
        let mut located = None;
        match anchor {
            Anchor::Unanchored => {
                if opts.get_longest_match() && want_loc {
                    // The All-kind forward DFA keeps accepting later starts,
                    // so it cannot report the leftmost match. The PikeVM
                    // can; send the whole subtext there.
                    trace!("longest-match unanchored search skips the DFA");
                    skipped_test = true;
                } else {
                    match self.dfa_unanchored(
                        opts, engines, ecache, rev, haystack, start, end,
                        want_loc,
                    ) {
                        Step::Located(span) => {
                            if !want_loc {
                                return true;
                            }
                            located = Some(span);
                        }
                        Step::NoMatch => return false,
                        Step::GaveUp => skipped_test = true,
                        Step::Fail => return false,
                    }
                }
            }
            Anchor::Start | Anchor::Both => {
                // On small texts the submatch engines outrun the DFA, so
                // when one of them is going to run anyway, skip the DFA.
                let skip_for_one_pass = engines.onepass().is_some()
                    && haystack.len() <= 4096
                    && (ncap > 1 || haystack.len() <= 8);
                let skip_for_bit_state = !skip_for_one_pass
                    && ncap > 1
                    && engines.backtracker().get(haystack.len()).is_some();
                if skip_for_one_pass || skip_for_bit_state {
                    trace!("skipping DFA for a small anchored search");
                    skipped_test = true;
                } else {
                    match dfa_anchored(
                        engines, ecache, haystack, start, end, want_loc,
                    ) {
                        Step::Located(span) => {
                            if !want_loc {
                                return true;
                            }
                            located = Some(span);
                        }
                        Step::NoMatch => return false,
                        Step::GaveUp => skipped_test = true,
                        Step::Fail => return false,
                    }
                }
            }
        }

        if !skipped_test && ncap <= 1 {
            // The DFAs alone pinned down the match; no engine needed.
            if ncap == 1 {
                submatch[0] = located;
            }
        } else {
            let (span, anchored) = match (skipped_test, located) {
                // The DFA found the exact span: extract within it,
                // anchored at its start.
                (false, Some(span)) => (span, Anchored::Yes),
                (false, None) => return false,
                // The DFA was skipped or gave up: search the entire
                // subtext under the original anchor.
                (true, _) => {
                    let anchored = if anchor == Anchor::Unanchored {
                        Anchored::No
                    } else {
                        Anchored::Yes
                    };
                    (Span { start, end }, anchored)
                }
            };
            if !run_extraction(
                engines,
                ecache,
                slots,
                haystack,
                span,
                anchored,
                ncap,
                skipped_test,
                submatch,
            ) {
                return false;
            }
        }

        // Re-attach the prefix that the filter stripped off the front.
        if prefixlen > 0 && nsubmatch > 0 {
            if let Some(m) = submatch[0].as_mut() {
                m.start -= prefixlen;
            }
        }
        for slot in submatch.iter_mut().skip(ncap) {
            *slot = None;
        }
        true
    }

    /// Unanchored location via the DFA pair: the forward scan finds where
    /// the match ends, then the reverse program runs right-to-left from
    /// there, anchored, to find where it began.
    fn dfa_unanchored(
        &self,
        opts: &Options,
        engines: &Engines,
        ecache: &mut EngineCache,
        rev_cache: &mut Option<hybrid::dfa::Cache>,
        haystack: &[u8],
        start: usize,
        end: usize,
        want_loc: bool,
    ) -> Step {
        let dfa = match engines.hybrid().get() {
            Some(dfa) => dfa,
            None => return Step::GaveUp,
        };
        let cache = ecache.hybrid.get_or_insert_with(|| dfa.create_cache());
        let input =
            Input::new(haystack).span(start..end).earliest(!want_loc);
        let half = match dfa_outcome(dfa.try_search_fwd(cache, &input)) {
            DfaOutcome::Answer(half) => half,
            DfaOutcome::GaveUp => return Step::GaveUp,
        };
        let hm = match half {
            Some(hm) => hm,
            None => return Step::NoMatch,
        };
        if !want_loc {
            return Step::Located(Span { start, end: hm.offset() });
        }
        let rev = match self.reverse_prog(opts) {
            Ok(rev) => rev,
            Err(()) => return Step::Fail,
        };
        let rdfa = match rev.dfa() {
            Some(rdfa) => rdfa,
            None => return Step::GaveUp,
        };
        let rcache = rev_cache.get_or_insert_with(|| rdfa.create_cache());
        let rinput = Input::new(haystack)
            .span(start..hm.offset())
            .anchored(Anchored::Yes);
        let rhalf = match dfa_outcome(rdfa.try_search_rev(rcache, &rinput)) {
            DfaOutcome::Answer(rhalf) => rhalf,
            DfaOutcome::GaveUp => return Step::GaveUp,
        };
        match rhalf {
            Some(rm) => Step::Located(Span {
                start: rm.offset(),
                end: hm.offset(),
            }),
            None => {
                error!("reverse DFA inconsistency");
                Step::Fail
            }
        }
    }
}

fn dfa_anchored(
    engines: &Engines,
    ecache: &mut EngineCache,
    haystack: &[u8],
    start: usize,
    end: usize,
    want_loc: bool,
) -> Step {
    let dfa = match engines.hybrid().get() {
        Some(dfa) => dfa,
        None => return Step::GaveUp,
    };
    let cache = ecache.hybrid.get_or_insert_with(|| dfa.create_cache());
    let input = Input::new(haystack)
        .span(start..end)
        .anchored(Anchored::Yes)
        .earliest(!want_loc);
    match dfa_outcome(dfa.try_search_fwd(cache, &input)) {
        DfaOutcome::Answer(Some(hm)) => {
            Step::Located(Span { start, end: hm.offset() })
        }
        DfaOutcome::Answer(None) => Step::NoMatch,
        DfaOutcome::GaveUp => Step::GaveUp,
    }
}

/// Runs exactly one submatch engine over `span`: the one-pass DFA when the
/// program admits it and the search is anchored, the bounded backtracker
/// when its bitmap covers the span, and otherwise the PikeVM.
fn run_extraction(
    engines: &Engines,
    ecache: &mut EngineCache,
    slots_buf: &mut Vec<Option<NonMaxUsize>>,
    haystack: &[u8],
    span: Span,
    anchored: Anchored,
    ncap: usize,
    skipped_test: bool,
    submatch: &mut [Option<Span>],
) -> bool {
    let input = Input::new(haystack)
        .span(span.start..span.end)
        .anchored(anchored);
    slots_buf.clear();
    slots_buf.resize(ncap.max(1) * 2, None);
    let slots = &mut slots_buf[..];

    let matched = if let Some(op) = engines.onepass().get(anchored) {
        trace!("extracting submatches with the one-pass DFA");
        let cache = ecache.onepass.get_or_insert_with(|| op.create_cache());
        match op.try_search_slots(cache, &input, slots) {
            Ok(pid) => pid.is_some(),
            Err(err) => {
                error!("one-pass search failed: {}", err);
                false
            }
        }
    } else if let Some(bt) = engines.backtracker().get(span.len()) {
        trace!("extracting submatches with the bounded backtracker");
        let cache = ecache.backtrack.get_or_insert_with(|| bt.create_cache());
        match bt.try_search_slots(cache, &input, slots) {
            Ok(pid) => pid.is_some(),
            Err(err) => {
                error!("bounded backtracker search failed: {}", err);
                false
            }
        }
    } else {
        trace!("extracting submatches with the PikeVM");
        let cache = ecache
            .pikevm
            .get_or_insert_with(|| engines.pikevm().create_cache());
        engines.pikevm().search_slots(cache, &input, slots).is_some()
    };
    if !matched {
        if !skipped_test {
            // The DFA said there is a match here. A submatch engine that
            // disagrees is a bug in one of them; fail the search rather
            // than report a match with no location.
            error!("submatch engine disagreed with the DFA");
        }
        return false;
    }
    for (i, m) in submatch.iter_mut().take(ncap).enumerate() {
        *m = match (slots[i * 2], slots[i * 2 + 1]) {
            (Some(s), Some(e)) => {
                Some(Span { start: s.get(), end: e.get() })
            }
            _ => None,
        };
    }
    true
}
