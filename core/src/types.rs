use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Unit step on a grid. `y` grows downwards, so `Up` is `(0, -1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Moves one step in `direction` on a torus of `bounds`, re-entering on the opposite edge.
pub fn wrapping_step(coords: Coord2, direction: Direction, bounds: Coord2) -> Coord2 {
    let (dx, dy) = direction.delta();
    let wrap = |value: Coord, delta: i8, bound: Coord| -> Coord {
        let next = (i16::from(value) + i16::from(delta)).rem_euclid(i16::from(bound));
        next as Coord
    };
    (wrap(coords.0, dx, bounds.0), wrap(coords.1, dy, bounds.1))
}

const MOORE: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn offset(coords: Coord2, (dx, dy): (i8, i8), (max_x, max_y): Coord2) -> Option<Coord2> {
    let x = coords.0.checked_add_signed(dx)?;
    let y = coords.1.checked_add_signed(dy)?;
    (x < max_x && y < max_y).then_some((x, y))
}

/// The up-to-eight in-bounds cells around `center`, clipped at the edges.
pub fn moore_neighbors(center: Coord2, bounds: Coord2) -> impl Iterator<Item = Coord2> {
    MOORE
        .into_iter()
        .filter_map(move |delta| offset(center, delta, bounds))
}
