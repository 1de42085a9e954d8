use core::ops::Index;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl SweeperConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Clamps to a playable board: at least 2 cells, at least one mine and one safe cell.
    pub fn new(size: Coord2, mines: CellCount) -> Self {
        Self::new_unchecked(size, mines).clamped()
    }

    pub fn try_new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidCoords);
        }
        if mines >= config.total_cells() {
            return Err(GameError::TooManyMines);
        }
        Ok(config)
    }

    pub fn clamped(self) -> Self {
        let size_x = self.size.0.clamp(1, Coord::MAX);
        let size_y = self.size.1.clamp(if size_x == 1 { 2 } else { 1 }, Coord::MAX);
        let max_mines = mult(size_x, size_y) - 1;
        let mines = self.mines.clamp(1, max_mines);
        if mines != self.mines || (size_x, size_y) != self.size {
            log::warn!(
                "sweeper config {:?}/{} clamped to {:?}/{}",
                self.size,
                self.mines,
                (size_x, size_y),
                mines
            );
        }
        Self::new_unchecked((size_x, size_y), mines)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::new_unchecked((10, 10), 15)
    }
}

/// Mine placement plus the neighbor counts derived from it. Both are fixed for the
/// lifetime of a board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    size: Coord2,
    mine_mask: Array2<bool>,
    neighbor_counts: Array2<u8>,
    mine_count: CellCount,
}

impl MineLayout {
    /// Fails with `InvalidCoords` when either side does not fit a [`Coord`].
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (size_x, size_y) = mine_mask.dim();
        let size = (
            size_x.try_into().map_err(|_| GameError::InvalidCoords)?,
            size_y.try_into().map_err(|_| GameError::InvalidCoords)?,
        );
        Ok(Self::from_sized_mask(mine_mask, size))
    }

    fn from_sized_mask(mine_mask: Array2<bool>, size: Coord2) -> Self {
        let mut neighbor_counts = Array2::zeros(mine_mask.dim());
        let mut mine_count: CellCount = 0;

        for ((x, y), &is_mine) in mine_mask.indexed_iter() {
            if is_mine {
                mine_count += 1;
                continue;
            }
            let coords = (x as Coord, y as Coord);
            neighbor_counts[coords.to_nd_index()] = moore_neighbors(coords, size)
                .filter(|&pos| mine_mask[pos.to_nd_index()])
                .count() as u8;
        }

        Self {
            size,
            mine_mask,
            neighbor_counts,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_sized_mask(mine_mask, size))
    }

    /// Rejection sampling: draw uniform cells, retry on cells that already hold a mine.
    pub fn generate(config: SweeperConfig, rng: &mut GameRng) -> Self {
        let config = config.clamped();
        let (size_x, size_y) = config.size;
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());

        let mut planted = 0;
        let mut retries = 0u32;
        while planted < config.mines {
            let coords = (rng.random_range(0..size_x), rng.random_range(0..size_y));
            let cell = &mut mine_mask[coords.to_nd_index()];
            if *cell {
                retries += 1;
                continue;
            }
            *cell = true;
            planted += 1;
        }
        log::debug!(
            "planted {} mines on {:?} ({} retries)",
            planted,
            config.size,
            retries
        );

        Self::from_sized_mask(mine_mask, config.size)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    /// Zero for mine cells.
    pub fn neighbor_mine_count(&self, coords: Coord2) -> u8 {
        self.neighbor_counts[coords.to_nd_index()]
    }

    pub fn neighbors(&self, coords: Coord2) -> impl Iterator<Item = Coord2> + use<> {
        moore_neighbors(coords, self.size())
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_computed_from_final_placement() {
        let layout = MineLayout::from_mine_coords((3, 3), &[(0, 0), (2, 2)]).unwrap();

        assert_eq!(layout.mine_count(), 2);
        assert_eq!(layout.safe_cell_count(), 7);
        assert_eq!(layout.neighbor_mine_count((1, 1)), 2);
        assert_eq!(layout.neighbor_mine_count((2, 0)), 0);
        assert_eq!(layout.neighbor_mine_count((0, 0)), 0);
    }

    #[test]
    fn rejects_mines_outside_board() {
        assert_eq!(
            MineLayout::from_mine_coords((2, 2), &[(2, 0)]),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn mask_wider_than_a_coord_is_rejected() {
        let wide: Array2<bool> = Array2::default((256, 2));
        assert_eq!(MineLayout::from_mine_mask(wide), Err(GameError::InvalidCoords));

        let mut mask: Array2<bool> = Array2::default((255, 2));
        mask[[254, 1]] = true;
        let layout = MineLayout::from_mine_mask(mask).unwrap();
        assert_eq!(layout.size(), (255, 2));
        assert_eq!(layout.total_cells(), 510);
        assert!(layout.contains_mine((254, 1)));
        assert_eq!(layout.neighbor_mine_count((253, 0)), 1);
    }

    #[test]
    fn generate_places_exact_mine_count() {
        let mut rng = seeded_rng(17);
        for mines in [1, 15, 50, 99] {
            let layout = MineLayout::generate(SweeperConfig::new((10, 10), mines), &mut rng);
            assert_eq!(layout.mine_count(), mines);
        }
    }

    #[test]
    fn config_keeps_one_safe_cell() {
        let config = SweeperConfig::new((3, 3), 40);
        assert_eq!(config.mines, 8);
        assert_eq!(
            SweeperConfig::try_new((3, 3), 9),
            Err(GameError::TooManyMines)
        );
        assert!(SweeperConfig::try_new((10, 10), 15).is_ok());
    }
}
