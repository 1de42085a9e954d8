use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

pub const CARD_SYMBOLS: [&str; 8] = ["🔥", "⚡", "🌌", "⚛️", "🛰️", "💾", "🧩", "🧪"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub pairs: u8,
    pub match_delay_ms: u64,
    pub mismatch_delay_ms: u64,
}

impl MemoryConfig {
    pub fn clamped(self) -> Self {
        let pairs = self.pairs.clamp(1, CARD_SYMBOLS.len() as u8);
        if pairs != self.pairs {
            log::warn!("memory pairs {} clamped to {}", self.pairs, pairs);
        }
        Self { pairs, ..self }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pairs: CARD_SYMBOLS.len() as u8,
            match_delay_ms: 600,
            mismatch_delay_ms: 1000,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Index into [`CARD_SYMBOLS`].
    pub symbol: u8,
    pub flipped: bool,
    pub matched: bool,
}

impl Card {
    const fn face_down(symbol: u8) -> Self {
        Self {
            symbol,
            flipped: false,
            matched: false,
        }
    }

    /// Face up and still waiting to be resolved.
    pub const fn is_open(&self) -> bool {
        self.flipped && !self.matched
    }

    pub fn glyph(&self) -> &'static str {
        CARD_SYMBOLS[usize::from(self.symbol) % CARD_SYMBOLS.len()]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Resolution {
    Match(usize, usize),
    Mismatch(usize, usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    NoChange,
    Opened,
    /// Second card of a pair turned, resolution scheduled.
    PairPending { matching: bool },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryInput {
    Flip(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub cards: Vec<Card>,
    pub moves: u32,
    pub matches: u32,
    pub resolving: bool,
    pub cleared: bool,
}

#[derive(Clone, Debug)]
pub struct MemoryMatch {
    config: MemoryConfig,
    cards: Vec<Card>,
    open: Vec<usize>,
    moves: u32,
    matches: u32,
    pending: Option<TimerHandle>,
    timers: Scheduler<Resolution>,
    rng: GameRng,
}

impl MemoryMatch {
    /// Lays out the given symbols in order instead of shuffling.
    pub fn with_symbols(config: MemoryConfig, symbols: &[u8], seed: u64) -> Self {
        Self {
            config: config.clamped(),
            cards: symbols.iter().copied().map(Card::face_down).collect(),
            open: Vec::with_capacity(2),
            moves: 0,
            matches: 0,
            pending: None,
            timers: Scheduler::new(),
            rng: seeded_rng(seed),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn is_resolving(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_cleared(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|card| card.matched)
    }

    pub fn flip(&mut self, index: usize) -> Result<FlipOutcome> {
        let card = *self.cards.get(index).ok_or(GameError::InvalidIndex(index))?;
        if self.open.len() >= 2 || card.flipped || card.matched {
            return Ok(FlipOutcome::NoChange);
        }

        self.cards[index].flipped = true;
        self.open.push(index);
        let &[first, second] = self.open.as_slice() else {
            return Ok(FlipOutcome::Opened);
        };

        self.moves += 1;
        let matching = self.cards[first].symbol == self.cards[second].symbol;
        let (delay_ms, resolution) = if matching {
            (self.config.match_delay_ms, Resolution::Match(first, second))
        } else {
            (
                self.config.mismatch_delay_ms,
                Resolution::Mismatch(first, second),
            )
        };
        self.pending = Some(
            self.timers
                .schedule(Duration::from_millis(delay_ms), resolution),
        );
        Ok(FlipOutcome::PairPending { matching })
    }

    fn resolve(&mut self, fired: Fired<Resolution>) {
        if self.pending != Some(fired.handle) {
            log::trace!("dropping stale resolution {:?}", fired.event);
            return;
        }
        self.pending = None;
        self.open.clear();

        match fired.event {
            Resolution::Match(a, b) => {
                self.cards[a].matched = true;
                self.cards[b].matched = true;
                self.matches += 1;
                if self.is_cleared() {
                    log::debug!("board cleared in {} moves", self.moves);
                }
            }
            Resolution::Mismatch(a, b) => {
                self.cards[a].flipped = false;
                self.cards[b].flipped = false;
            }
        }
    }

    fn deal(&mut self) {
        let mut symbols: Vec<u8> = (0..self.config.pairs).flat_map(|s| [s, s]).collect();
        symbols.shuffle(&mut self.rng);
        self.cards = symbols.into_iter().map(Card::face_down).collect();
        self.open.clear();
        self.moves = 0;
        self.matches = 0;
    }
}

impl Simulator for MemoryMatch {
    type Config = MemoryConfig;
    type Input = MemoryInput;
    type Snapshot = MemorySnapshot;

    fn new(config: MemoryConfig, seed: u64) -> Self {
        let mut game = Self::with_symbols(config, &[], seed);
        game.deal();
        game
    }

    fn apply(&mut self, input: MemoryInput) {
        let MemoryInput::Flip(index) = input;
        if let Err(err) = self.flip(index) {
            log::warn!("ignored {:?}: {}", input, err);
        }
    }

    fn advance(&mut self, dt: Duration) {
        let deadline = self.timers.deadline_after(dt);
        while let Some(fired) = self.timers.pop_due(deadline) {
            self.resolve(fired);
        }
        self.timers.catch_up(deadline);
    }

    fn is_terminal(&self) -> bool {
        self.is_cleared()
    }

    fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            cards: self.cards.clone(),
            moves: self.moves,
            matches: self.matches,
            resolving: self.is_resolving(),
            cleared: self.is_cleared(),
        }
    }

    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.pending = None;
    }

    fn reset(&mut self) {
        self.teardown();
        self.deal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn board() -> MemoryMatch {
        MemoryMatch::with_symbols(MemoryConfig::default(), &[0, 0, 1, 1, 2, 2], 0)
    }

    fn open_count(game: &MemoryMatch) -> usize {
        game.cards().iter().filter(|card| card.is_open()).count()
    }

    #[test]
    fn deal_contains_each_symbol_twice() {
        let game = MemoryMatch::init(5);
        assert_eq!(game.cards().len(), 16);
        for symbol in 0..8 {
            assert_eq!(game.cards().iter().filter(|c| c.symbol == symbol).count(), 2);
        }
    }

    #[test]
    fn glyph_follows_symbol() {
        let game = board();
        assert_eq!(game.cards()[0].glyph(), CARD_SYMBOLS[0]);
        assert_eq!(game.cards()[5].glyph(), CARD_SYMBOLS[2]);
    }

    #[test]
    fn matching_pair_resolves_after_short_delay() {
        let mut game = board();

        assert_eq!(game.flip(0).unwrap(), FlipOutcome::Opened);
        assert_eq!(
            game.flip(1).unwrap(),
            FlipOutcome::PairPending { matching: true }
        );
        assert_eq!(game.flip(2).unwrap(), FlipOutcome::NoChange);

        game.advance(ms(599));
        assert!(!game.cards()[0].matched);
        game.advance(ms(1));
        assert!(game.cards()[0].matched && game.cards()[1].matched);
        assert_eq!(open_count(&game), 0);
        assert_eq!(game.matches(), 1);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn mismatched_pair_turns_back_after_long_delay() {
        let mut game = board();

        game.flip(0).unwrap();
        assert_eq!(
            game.flip(2).unwrap(),
            FlipOutcome::PairPending { matching: false }
        );

        game.advance(ms(999));
        assert!(game.cards()[0].flipped);
        game.advance(ms(1));
        assert!(!game.cards()[0].flipped && !game.cards()[2].flipped);
        assert!(!game.cards()[0].matched);
        assert!(!game.is_resolving());
    }

    #[test]
    fn flipping_same_card_twice_is_ignored() {
        let mut game = board();

        game.flip(3).unwrap();
        assert_eq!(game.flip(3).unwrap(), FlipOutcome::NoChange);
        assert_eq!(open_count(&game), 1);
        assert_eq!(game.flip(6), Err(GameError::InvalidIndex(6)));
    }

    #[test]
    fn reset_cancels_pending_resolution() {
        let mut game = board();
        game.flip(0).unwrap();
        game.flip(1).unwrap();

        game.reset();
        game.advance(ms(5000));

        assert!(game.cards().iter().all(|card| !card.flipped && !card.matched));
        assert_eq!(game.matches(), 0);
    }

    #[test]
    fn never_more_than_two_open() {
        let mut game = MemoryMatch::init(21);
        let mut rng = seeded_rng(8);
        for _ in 0..400 {
            game.apply(MemoryInput::Flip(rng.random_range(0..16)));
            assert!(open_count(&game) <= 2);
            game.advance(ms(rng.random_range(0..700)));
            assert!(open_count(&game) <= 2);
        }
    }

    #[test]
    fn clearing_every_pair_is_terminal() {
        let mut game = board();
        for pair in 0..3 {
            game.flip(pair * 2).unwrap();
            game.flip(pair * 2 + 1).unwrap();
            game.advance(ms(600));
        }
        assert!(game.is_terminal());
        assert!(game.snapshot().cleared);
    }
}
