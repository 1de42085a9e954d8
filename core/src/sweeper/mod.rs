use alloc::collections::VecDeque;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;
pub use layout::*;

mod layout;

/// Player-visible mark on a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellMark {
    #[default]
    Hidden,
    Revealed,
    Flagged,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweeperState {
    #[default]
    Playing,
    Won,
    Lost,
}

impl SweeperState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SweeperInput {
    Reveal(Coord2),
    ToggleFlag(Coord2),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub neighbor_mine_count: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweeperSnapshot {
    pub size: Coord2,
    pub mines: CellCount,
    pub mines_left: isize,
    pub state: SweeperState,
    pub triggered_mine: Option<Coord2>,
    pub cells: Array2<CellView>,
}

#[derive(Clone, Debug)]
pub struct Minesweeper {
    config: SweeperConfig,
    layout: MineLayout,
    board: Array2<CellMark>,
    revealed_count: CellCount,
    flagged_count: CellCount,
    state: SweeperState,
    triggered_mine: Option<Coord2>,
    rng: GameRng,
}

impl Minesweeper {
    /// Plays on a fixed layout; `reset` deals random layouts of the same shape.
    pub fn with_layout(layout: MineLayout, seed: u64) -> Self {
        let config = SweeperConfig::new_unchecked(layout.size(), layout.mine_count());
        let board = Array2::default(layout.size().to_nd_index());
        Self {
            config,
            layout,
            board,
            revealed_count: 0,
            flagged_count: 0,
            state: SweeperState::Playing,
            triggered_mine: None,
            rng: seeded_rng(seed),
        }
    }

    pub fn state(&self) -> SweeperState {
        self.state
    }

    pub fn size(&self) -> Coord2 {
        self.layout.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.layout.mine_count()
    }

    pub fn mines_left(&self) -> isize {
        (self.layout.mine_count() as isize) - (self.flagged_count as isize)
    }

    pub fn cell_at(&self, coords: Coord2) -> CellMark {
        self.board[coords.to_nd_index()]
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        let coords = self.layout.validate_coords(coords)?;
        if self.state.is_finished() {
            return Ok(MarkOutcome::NoChange);
        }

        let cell = &mut self.board[coords.to_nd_index()];
        Ok(match *cell {
            CellMark::Hidden => {
                *cell = CellMark::Flagged;
                self.flagged_count += 1;
                MarkOutcome::Changed
            }
            CellMark::Flagged => {
                *cell = CellMark::Hidden;
                self.flagged_count -= 1;
                MarkOutcome::Changed
            }
            CellMark::Revealed => MarkOutcome::NoChange,
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.layout.validate_coords(coords)?;
        if self.state.is_finished() || self.cell_at(coords) != CellMark::Hidden {
            return Ok(RevealOutcome::NoChange);
        }

        if self.layout.contains_mine(coords) {
            self.board[coords.to_nd_index()] = CellMark::Revealed;
            self.triggered_mine = Some(coords);
            self.state = SweeperState::Lost;
            log::debug!("hit mine at {:?}", coords);
            return Ok(RevealOutcome::HitMine);
        }

        self.flood_reveal(coords);

        if self.revealed_count == self.layout.safe_cell_count() {
            self.state = SweeperState::Won;
            log::debug!("all {} safe cells revealed", self.revealed_count);
            Ok(RevealOutcome::Won)
        } else {
            Ok(RevealOutcome::Revealed)
        }
    }

    /// Reveals `start` and, through zero-count cells, everything connected to it.
    /// Only hidden cells are entered, so flags stop the fill; mines are never reached
    /// because they only border non-zero cells.
    fn flood_reveal(&mut self, start: Coord2) {
        let mut frontier = VecDeque::from([start]);

        while let Some(coords) = frontier.pop_front() {
            if self.board[coords.to_nd_index()] != CellMark::Hidden {
                continue;
            }

            self.board[coords.to_nd_index()] = CellMark::Revealed;
            self.revealed_count += 1;
            let count = self.layout.neighbor_mine_count(coords);
            log::trace!("revealed {:?}, neighbor mines: {}", coords, count);

            if count == 0 {
                frontier.extend(
                    self.layout
                        .neighbors(coords)
                        .filter(|&pos| self.board[pos.to_nd_index()] == CellMark::Hidden),
                );
            }
        }
    }

    fn deal(&mut self) {
        let layout = MineLayout::generate(self.config, &mut self.rng);
        self.board = Array2::default(layout.size().to_nd_index());
        self.layout = layout;
        self.revealed_count = 0;
        self.flagged_count = 0;
        self.state = SweeperState::Playing;
        self.triggered_mine = None;
    }
}

impl Simulator for Minesweeper {
    type Config = SweeperConfig;
    type Input = SweeperInput;
    type Snapshot = SweeperSnapshot;

    fn new(config: SweeperConfig, seed: u64) -> Self {
        let config = config.clamped();
        let mut rng = seeded_rng(seed);
        let layout = MineLayout::generate(config, &mut rng);
        let mut game = Self::with_layout(layout, seed);
        game.rng = rng;
        game
    }

    fn apply(&mut self, input: SweeperInput) {
        let result = match input {
            SweeperInput::Reveal(coords) => self.reveal(coords).map(RevealOutcome::has_update),
            SweeperInput::ToggleFlag(coords) => {
                self.toggle_flag(coords).map(MarkOutcome::has_update)
            }
        };
        if let Err(err) = result {
            log::warn!("ignored {:?}: {}", input, err);
        }
    }

    fn is_terminal(&self) -> bool {
        self.state.is_finished()
    }

    fn snapshot(&self) -> SweeperSnapshot {
        let cells = Array2::from_shape_fn(self.board.dim(), |(x, y)| {
            let coords = (x as Coord, y as Coord);
            let mark = self.board[[x, y]];
            CellView {
                is_mine: self.layout.contains_mine(coords),
                is_revealed: mark == CellMark::Revealed,
                is_flagged: mark == CellMark::Flagged,
                neighbor_mine_count: self.layout.neighbor_mine_count(coords),
            }
        });

        SweeperSnapshot {
            size: self.size(),
            mines: self.total_mines(),
            mines_left: self.mines_left(),
            state: self.state,
            triggered_mine: self.triggered_mine,
            cells,
        }
    }

    fn reset(&mut self) {
        self.deal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(size: Coord2, mines: &[Coord2]) -> Minesweeper {
        Minesweeper::with_layout(MineLayout::from_mine_coords(size, mines).unwrap(), 0)
    }

    #[test]
    fn reveal_hits_mine_and_freezes_board() {
        let mut engine = engine((3, 3), &[(0, 0)]);
        engine.toggle_flag((2, 2)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::HitMine);
        assert_eq!(engine.state(), SweeperState::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
        assert_eq!(engine.cell_at((0, 0)), CellMark::Revealed);

        let frozen = engine.snapshot();
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.toggle_flag((2, 2)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.toggle_flag((1, 2)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.snapshot(), frozen);
    }

    #[test]
    fn flood_fill_opens_zero_region() {
        let mut engine = engine((3, 3), &[(2, 2)]);

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((1, 1)), CellMark::Revealed);
        assert_eq!(engine.layout().neighbor_mine_count((1, 1)), 1);
        assert_eq!(engine.cell_at((2, 2)), CellMark::Hidden);
    }

    #[test]
    fn flood_fill_skips_flags_and_mines() {
        let mines = &[(4, 4), (4, 0)];
        let mut engine = engine((5, 5), mines);
        engine.toggle_flag((1, 1)).unwrap();
        engine.toggle_flag((0, 4)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);

        let snapshot = engine.snapshot();
        for cell in snapshot.cells.iter() {
            assert!(!(cell.is_revealed && cell.is_mine));
            assert!(!(cell.is_revealed && cell.is_flagged));
        }
        assert_eq!(engine.cell_at((1, 1)), CellMark::Flagged);
        assert_eq!(engine.cell_at((0, 4)), CellMark::Flagged);
        assert_eq!(engine.cell_at((2, 2)), CellMark::Revealed);
        assert_eq!(engine.state(), SweeperState::Playing);
    }

    #[test]
    fn flagged_cell_cannot_be_revealed() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.mines_left(), 0);

        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
    }

    #[test]
    fn winning_board_transitions_to_won_state() {
        let mut engine = engine((2, 1), &[(0, 0)]);

        assert_eq!(engine.reveal((1, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(engine.state(), SweeperState::Won);
        assert!(engine.is_terminal());
    }

    #[test]
    fn out_of_bounds_is_an_error_but_not_through_apply() {
        let mut engine = engine((2, 2), &[(0, 0)]);

        assert_eq!(engine.reveal((5, 0)), Err(GameError::InvalidCoords));

        let before = engine.snapshot();
        engine.apply(SweeperInput::Reveal((5, 0)));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn reset_deals_same_shape() {
        let mut game = Minesweeper::new(SweeperConfig::new((8, 6), 10), 3);
        game.reveal((0, 0)).unwrap();
        game.reset();

        let snapshot = game.snapshot();
        assert_eq!(snapshot.size, (8, 6));
        assert_eq!(snapshot.mines, 10);
        assert_eq!(snapshot.state, SweeperState::Playing);
        assert!(snapshot.cells.iter().all(|cell| !cell.is_revealed));
        assert_eq!(snapshot.cells.iter().filter(|cell| cell.is_mine).count(), 10);
    }
}
