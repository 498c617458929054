/*!
Thin capability wrappers around the underlying matching engines.

Each wrapper owns "an engine or nothing": construction failures (a pattern
that is not one-pass, a cache budget too small for the lazy DFA, a program
too big for the bounded backtracker) simply leave the wrapper empty, and
the search-time decision tree routes around it. The one engine that must
always exist is the PikeVM.
*/

use log::debug;
use regex_automata::{
    dfa::onepass,
    hybrid,
    nfa::thompson::{self, backtrack, pikevm, WhichCaptures, NFA},
    util::{pool::Pool, primitives::NonMaxUsize},
    Anchored, Input, MatchError, MatchKind, PatternID,
};
use regex_syntax::hir::Hir;

use crate::{
    error::Error,
    literal::prefix_successor,
    options::{Encoding, Options},
};

/// Programs above this size never use the bounded backtracker.
pub(crate) const MAX_BITSTATE_PROG: usize = 500;

/// Upper bound on the backtracker's visited bitmap, in bits. The longest
/// searchable span is then `MAX_BITSTATE_BITS / program_size`.
pub(crate) const MAX_BITSTATE_BITS: usize = 256 * 1024;

/// Floor for the NFA compiler's size limit, so that a deliberately starved
/// memory budget still compiles small patterns and exercises the
/// DFA-to-NFA fallback instead of failing outright.
const MIN_NFA_BUDGET: usize = 16 * 1024;

pub(crate) fn match_kind(opts: &Options) -> MatchKind {
    if opts.get_longest_match() {
        MatchKind::All
    } else {
        MatchKind::LeftmostFirst
    }
}

/// The forward-direction engine set compiled from one expression: the NFA
/// itself plus every engine that could be built from it.
#[derive(Debug)]
pub(crate) struct Engines {
    nfa: NFA,
    pikevm: PikeVM,
    onepass: OnePass,
    backtracker: BitState,
    hybrid: Hybrid,
}

impl Engines {
    /// Compiles `hir` and builds whatever engines fit in `budget` bytes.
    /// A quarter of the budget bounds the NFA, half feeds the lazy DFA
    /// cache and the remaining quarter bounds the one-pass table.
    pub(crate) fn new(
        hir: &Hir,
        opts: &Options,
        budget: usize,
    ) -> Result<Engines, Error> {
        let kind = match_kind(opts);
        let nfa = thompson::Compiler::new()
            .configure(
                thompson::Config::new()
                    .utf8(opts.get_encoding() == Encoding::Utf8)
                    .nfa_size_limit(Some((budget / 4).max(MIN_NFA_BUDGET))),
            )
            .build_from_hir(hir)
            .map_err(|_| Error::too_large())?;
        let pikevm = PikeVM::new(&nfa, kind)?;
        let onepass = OnePass::new(&nfa, kind, budget / 4);
        let backtracker = BitState::new(&nfa, kind);
        let hybrid = Hybrid::new(&nfa, kind, budget / 2);
        Ok(Engines { nfa, pikevm, onepass, backtracker, hybrid })
    }

    pub(crate) fn nfa(&self) -> &NFA {
        &self.nfa
    }

    pub(crate) fn pikevm(&self) -> &PikeVM {
        &self.pikevm
    }

    pub(crate) fn onepass(&self) -> &OnePass {
        &self.onepass
    }

    pub(crate) fn backtracker(&self) -> &BitState {
        &self.backtracker
    }

    pub(crate) fn hybrid(&self) -> &Hybrid {
        &self.hybrid
    }

    /// Number of NFA states; the dispatcher's notion of program size.
    pub(crate) fn program_size(&self) -> usize {
        self.nfa.states().len()
    }
}

#[derive(Debug)]
pub(crate) struct PikeVM(pikevm::PikeVM);

impl PikeVM {
    fn new(nfa: &NFA, kind: MatchKind) -> Result<PikeVM, Error> {
        let engine = pikevm::Builder::new()
            .configure(pikevm::Config::new().match_kind(kind))
            .build_from_nfa(nfa.clone())
            .map_err(|e| Error::internal(e.to_string()))?;
        debug!("PikeVM built");
        Ok(PikeVM(engine))
    }

    pub(crate) fn create_cache(&self) -> pikevm::Cache {
        self.0.create_cache()
    }

    #[inline(always)]
    pub(crate) fn search_slots(
        &self,
        cache: &mut pikevm::Cache,
        input: &Input<'_>,
        slots: &mut [Option<NonMaxUsize>],
    ) -> Option<PatternID> {
        self.0.search_slots(cache, input, slots)
    }
}

#[derive(Debug)]
pub(crate) struct OnePass(Option<onepass::DFA>);

impl OnePass {
    fn new(nfa: &NFA, kind: MatchKind, size_limit: usize) -> OnePass {
        let config = onepass::Config::new()
            .match_kind(kind)
            .size_limit(Some(size_limit.max(MIN_NFA_BUDGET)));
        let result =
            onepass::Builder::new().configure(config).build_from_nfa(nfa.clone());
        match result {
            Ok(engine) => {
                debug!("one-pass DFA built");
                OnePass(Some(engine))
            }
            Err(err) => {
                debug!("one-pass DFA unavailable: {}", err);
                OnePass(None)
            }
        }
    }

    pub(crate) fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// The one-pass engine only runs anchored searches.
    #[inline(always)]
    pub(crate) fn get(&self, anchored: Anchored) -> Option<&onepass::DFA> {
        if anchored != Anchored::Yes {
            return None;
        }
        self.0.as_ref()
    }
}

#[derive(Debug)]
pub(crate) struct BitState(Option<backtrack::BoundedBacktracker>);

impl BitState {
    fn new(nfa: &NFA, kind: MatchKind) -> BitState {
        // The backtracker commits to its first preference at every branch,
        // which is leftmost-first semantics and nothing else.
        if kind != MatchKind::LeftmostFirst {
            return BitState(None);
        }
        if nfa.states().len() > MAX_BITSTATE_PROG {
            debug!("program too big for the bounded backtracker");
            return BitState(None);
        }
        let config = backtrack::Config::new()
            .visited_capacity(MAX_BITSTATE_BITS / 8);
        let result = backtrack::Builder::new()
            .configure(config)
            .build_from_nfa(nfa.clone());
        match result {
            Ok(engine) => {
                debug!("bounded backtracker built");
                BitState(Some(engine))
            }
            Err(err) => {
                debug!("bounded backtracker unavailable: {}", err);
                BitState(None)
            }
        }
    }

    /// Usable only when the visited bitmap covers the whole span.
    #[inline(always)]
    pub(crate) fn get(
        &self,
        span_len: usize,
    ) -> Option<&backtrack::BoundedBacktracker> {
        let engine = self.0.as_ref()?;
        if span_len > engine.max_haystack_len() {
            return None;
        }
        Some(engine)
    }
}

#[derive(Debug)]
pub(crate) struct Hybrid(Option<hybrid::dfa::DFA>);

impl Hybrid {
    fn new(nfa: &NFA, kind: MatchKind, cache_budget: usize) -> Hybrid {
        let config = hybrid::dfa::Config::new()
            .match_kind(kind)
            .byte_classes(true)
            .unicode_word_boundary(true)
            .cache_capacity(cache_budget)
            // A cache below the engine's own floor refuses to build, which
            // downgrades this pattern to the NFA engines. Never silently
            // allocate past the budget instead.
            .skip_cache_capacity_check(false)
            // Repeated cache clearing with too little forward progress
            // makes the search report "gave up", which the dispatcher
            // turns into an NFA fallback.
            .minimum_cache_clear_count(Some(10))
            .minimum_bytes_per_state(Some(10));
        let result = hybrid::dfa::Builder::new()
            .configure(config)
            .build_from_nfa(nfa.clone());
        match result {
            Ok(dfa) => {
                debug!("lazy DFA built");
                Hybrid(Some(dfa))
            }
            Err(err) => {
                debug!("lazy DFA unavailable: {}", err);
                Hybrid(None)
            }
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> Option<&hybrid::dfa::DFA> {
        self.0.as_ref()
    }

    /// Greedy min/max walk over the lazy DFA, bounded at `maxlen` bytes.
    /// Returns byte strings bracketing every text the program can match
    /// from its anchored start state.
    pub(crate) fn possible_match_range(
        &self,
        cache: &mut EngineCache,
        maxlen: usize,
    ) -> Option<(Vec<u8>, Vec<u8>)> {
        let dfa = self.get()?;
        let cache = cache.hybrid.get_or_insert_with(|| dfa.create_cache());
        let (min, _) = walk_extreme(dfa, cache, maxlen, false)?;
        let (max, truncated) = walk_extreme(dfa, cache, maxlen, true)?;
        let max = if truncated {
            let max = prefix_successor(&max);
            if max.is_empty() {
                return None;
            }
            max
        } else {
            max
        };
        Some((min, max))
    }
}

/// One step of `possible_match_range`: repeatedly take the smallest (or
/// largest) byte with a live transition. The smallest walk stops at the
/// first state that can complete a match; the largest walk keeps going
/// until the program dies or the length bound hits. The second return
/// value reports whether the walk was truncated by `maxlen`.
fn walk_extreme(
    dfa: &hybrid::dfa::DFA,
    cache: &mut hybrid::dfa::Cache,
    maxlen: usize,
    largest: bool,
) -> Option<(Vec<u8>, bool)> {
    let input = Input::new("").anchored(Anchored::Yes);
    let mut sid = dfa.start_state_forward(cache, &input).ok()?;
    let mut bytes = Vec::new();
    loop {
        let eoi = dfa.next_eoi_state(cache, sid).ok()?;
        let can_match_here = eoi.is_match();
        if can_match_here && !largest {
            return Some((bytes, false));
        }
        if bytes.len() >= maxlen {
            return Some((bytes, true));
        }
        let mut chosen = None;
        let candidates: Box<dyn Iterator<Item = u8>> = if largest {
            Box::new((0..=255u8).rev())
        } else {
            Box::new(0..=255u8)
        };
        for b in candidates {
            let next = dfa.next_state(cache, sid, b).ok()?;
            if next.is_quit() {
                return None;
            }
            if !next.is_dead() {
                chosen = Some((b, next));
                break;
            }
        }
        match chosen {
            None => {
                return if can_match_here { Some((bytes, false)) } else { None }
            }
            Some((b, next)) => {
                bytes.push(b);
                sid = next;
            }
        }
    }
}

/// The reverse-direction program: a capture-free reversed NFA driving a
/// longest-match lazy DFA. Only built when an unanchored search actually
/// needs a match start.
#[derive(Debug)]
pub(crate) struct Reverse {
    dfa: Option<hybrid::dfa::DFA>,
}

impl Reverse {
    pub(crate) fn new(
        hir: &Hir,
        opts: &Options,
        budget: usize,
    ) -> Result<Reverse, Error> {
        let nfa = thompson::Compiler::new()
            .configure(
                thompson::Config::new()
                    .reverse(true)
                    .which_captures(WhichCaptures::None)
                    .utf8(opts.get_encoding() == Encoding::Utf8)
                    .nfa_size_limit(Some((budget / 2).max(MIN_NFA_BUDGET))),
            )
            .build_from_hir(hir)
            .map_err(|_| Error::reverse_too_large())?;
        // Scanning right to left, the "leftmost" match end is the start of
        // the overall match, and we want the leftmost possible start: that
        // is longest-match semantics regardless of the pattern's own kind.
        let hybrid = Hybrid::new(&nfa, MatchKind::All, budget / 2);
        Ok(Reverse { dfa: hybrid.0 })
    }

    #[inline(always)]
    pub(crate) fn dfa(&self) -> Option<&hybrid::dfa::DFA> {
        self.dfa.as_ref()
    }
}

/// Mutable scratch for one engine set. Every slot fills on first use, so a
/// cache created before the lazily-built engine sets exist stays cheap.
#[derive(Debug, Default)]
pub(crate) struct EngineCache {
    pub(crate) pikevm: Option<pikevm::Cache>,
    pub(crate) onepass: Option<onepass::Cache>,
    pub(crate) backtrack: Option<backtrack::Cache>,
    pub(crate) hybrid: Option<hybrid::dfa::Cache>,
}

/// Per-search scratch, handed out by the pattern's pool. Searches never
/// share a live cache, so concurrent callers proceed independently.
#[derive(Debug, Default)]
pub(crate) struct Cache {
    pub(crate) slots: Vec<Option<NonMaxUsize>>,
    pub(crate) fwd: EngineCache,
    pub(crate) full: EngineCache,
    pub(crate) rev: Option<hybrid::dfa::Cache>,
}

impl Cache {
    pub(crate) fn new() -> Cache {
        Cache::default()
    }
}

pub(crate) type CachePoolFn = Box<
    dyn Fn() -> Cache
        + Send
        + Sync
        + std::panic::UnwindSafe
        + std::panic::RefUnwindSafe,
>;

pub(crate) type CachePool = Pool<Cache, CachePoolFn>;

pub(crate) fn new_cache_pool() -> CachePool {
    Pool::new(Box::new(Cache::new))
}

/// Distinguishes "the DFA answered" from "the DFA ran out of room", which
/// the dispatcher must treat in opposite ways.
#[derive(Debug)]
pub(crate) enum DfaOutcome<T> {
    Answer(T),
    GaveUp,
}

pub(crate) fn dfa_outcome<T>(
    result: Result<T, MatchError>,
) -> DfaOutcome<T> {
    match result {
        Ok(t) => DfaOutcome::Answer(t),
        Err(err) => {
            debug!("lazy DFA quit mid-search: {}", err);
            DfaOutcome::GaveUp
        }
    }
}
