use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::warn;

use crate::error::Error;
use crate::grid::GridShape;

/// Names accepted by [`Pattern::from_str`] and by the `pattern` config key.
pub const PRESETS: &[&str] = &[
    "random",
    "progressive",
    "horizontal-sweep",
    "vertical-sweep",
    "corner",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

/// How the cells of a grid are staggered during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PatternRepr")]
pub enum Pattern {
    /// Ranks drawn at random from `1..=N`; `unique` draws without replacement.
    Random { unique: bool },
    /// Row-major order, optionally reversed.
    Progressive { reversed: bool },
    /// Ordered by column (horizontal) or row (vertical) coordinate.
    Sweep {
        axis: Axis,
        reversed: bool,
        alternate: bool,
    },
    /// Radiates from one corner by the product of row and column.
    Corner { opposite: bool, alternate: bool },
}

impl Default for Pattern {
    fn default() -> Self {
        Self::Random { unique: false }
    }
}

/// A [`Pattern`] with its direction fixed for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedPattern {
    Random { unique: bool },
    Progressive { reversed: bool },
    Sweep { axis: Axis, reversed: bool },
    Corner { opposite: bool },
}

impl Pattern {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Random { .. } => "random",
            Self::Progressive { .. } => "progressive",
            Self::Sweep { .. } => "sweep",
            Self::Corner { .. } => "corner",
        }
    }

    /// Fix the direction for the given cycle. Alternating patterns flip on
    /// every cycle; everything else keeps its configured direction.
    pub fn resolve(&self, cycle: u64) -> ResolvedPattern {
        let even = cycle % 2 == 0;
        match *self {
            Self::Random { unique } => ResolvedPattern::Random { unique },
            Self::Progressive { reversed } => ResolvedPattern::Progressive { reversed },
            Self::Sweep {
                axis,
                reversed,
                alternate,
            } => ResolvedPattern::Sweep {
                axis,
                reversed: if alternate { even } else { reversed },
            },
            Self::Corner {
                opposite,
                alternate,
            } => ResolvedPattern::Corner {
                opposite: if alternate { !even } else { opposite },
            },
        }
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = match s.trim() {
            "random" => Self::Random { unique: false },
            "progressive" => Self::Progressive { reversed: false },
            "horizontal-sweep" => Self::Sweep {
                axis: Axis::Horizontal,
                reversed: false,
                alternate: true,
            },
            "vertical-sweep" => Self::Sweep {
                axis: Axis::Vertical,
                reversed: false,
                alternate: true,
            },
            "corner" => Self::Corner {
                opposite: false,
                alternate: true,
            },
            other => {
                return Err(Error::UnknownPattern {
                    name: other.to_string(),
                });
            }
        };
        Ok(pattern)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Preset(String),
    Detailed(DetailedPattern),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum DetailedPattern {
    Random {
        #[serde(default)]
        unique: bool,
    },
    Progressive {
        #[serde(default)]
        reversed: bool,
    },
    Sweep {
        #[serde(default)]
        axis: Axis,
        #[serde(default)]
        reversed: bool,
        #[serde(default)]
        alternate: bool,
    },
    Corner {
        #[serde(default)]
        opposite: bool,
        #[serde(default)]
        alternate: bool,
    },
}

impl TryFrom<PatternRepr> for Pattern {
    type Error = Error;

    fn try_from(repr: PatternRepr) -> Result<Self, Self::Error> {
        let detailed = match repr {
            PatternRepr::Preset(name) => return name.parse(),
            PatternRepr::Detailed(detailed) => detailed,
        };
        Ok(match detailed {
            DetailedPattern::Random { unique } => Self::Random { unique },
            DetailedPattern::Progressive { reversed } => Self::Progressive { reversed },
            DetailedPattern::Sweep {
                axis,
                reversed,
                alternate,
            } => Self::Sweep {
                axis,
                reversed,
                alternate,
            },
            DetailedPattern::Corner {
                opposite,
                alternate,
            } => Self::Corner {
                opposite,
                alternate,
            },
        })
    }
}

/// Produce one rank per cell. A cell's fade starts `rank * step` after the
/// cycle begins.
///
/// Never fails: a `shape` that does not describe `size` cells still yields
/// `size` ranks, laid out on a best-effort grid.
pub fn generate<R: Rng + ?Sized>(
    size: usize,
    pattern: &ResolvedPattern,
    shape: GridShape,
    rng: &mut R,
) -> Vec<u32> {
    match *pattern {
        ResolvedPattern::Progressive { reversed } => progressive(size, reversed),
        ResolvedPattern::Sweep { axis, reversed } => sweep(size, axis, reversed, shape),
        ResolvedPattern::Corner { opposite } => corner(size, opposite, shape),
        ResolvedPattern::Random { unique } => random(size, unique, rng),
    }
}

fn progressive(size: usize, reversed: bool) -> Vec<u32> {
    let mut ranks: Vec<u32> = (1..=size as u32).collect();
    if reversed {
        ranks.reverse();
    }
    ranks
}

fn sweep(size: usize, axis: Axis, reversed: bool, shape: GridShape) -> Vec<u32> {
    let cells = CellWalk::new(size, shape);
    (0..size)
        .map(|i| {
            let (row, column) = cells.at(i);
            let rank = match (axis, reversed) {
                (Axis::Vertical, false) => row,
                (Axis::Vertical, true) => cells.rows.saturating_sub(1).saturating_sub(row),
                (Axis::Horizontal, false) => column,
                (Axis::Horizontal, true) => cells.columns.saturating_sub(1).saturating_sub(column),
            };
            rank as u32
        })
        .collect()
}

fn corner(size: usize, opposite: bool, shape: GridShape) -> Vec<u32> {
    let cells = CellWalk::new(size, shape);
    let far = cells.rows.saturating_sub(1) * cells.columns.saturating_sub(1);
    (0..size)
        .map(|i| {
            let (row, column) = cells.at(i);
            let product = row * column;
            let rank = if opposite {
                far.saturating_sub(product)
            } else {
                product
            };
            rank as u32
        })
        .collect()
}

fn random<R: Rng + ?Sized>(size: usize, unique: bool, rng: &mut R) -> Vec<u32> {
    let mut pool: Vec<u32> = (1..=size as u32).collect();
    if unique {
        pool.shuffle(rng);
        return pool;
    }
    (0..size)
        .map(|_| pool[rng.random_range(0..pool.len())])
        .collect()
}

/// Maps a cell index to grid coordinates, tolerating shapes that do not
/// match the cell count.
struct CellWalk {
    rows: usize,
    columns: usize,
    row_width: usize,
}

impl CellWalk {
    fn new(size: usize, shape: GridShape) -> Self {
        if shape.is_empty() || shape.cells() != size {
            warn!(
                size,
                rows = shape.rows,
                columns = shape.columns,
                "grid shape does not match cell count; reveal pattern degraded"
            );
        }
        let columns = shape.columns.max(1);
        let row_width = if shape.rows > 0 && size % shape.rows == 0 && size >= shape.rows {
            size / shape.rows
        } else {
            columns
        };
        Self {
            rows: shape.rows.max(1),
            columns,
            row_width,
        }
    }

    fn at(&self, index: usize) -> (usize, usize) {
        let row = (index / self.columns).min(self.rows - 1);
        (row, index % self.row_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mismatched_shape_still_yields_one_rank_per_cell() {
        let mut rng = StdRng::seed_from_u64(3);
        let shape = GridShape::new(3, 3);
        for pattern in [
            ResolvedPattern::Sweep {
                axis: Axis::Vertical,
                reversed: true,
            },
            ResolvedPattern::Sweep {
                axis: Axis::Horizontal,
                reversed: true,
            },
            ResolvedPattern::Corner { opposite: true },
            ResolvedPattern::Progressive { reversed: false },
        ] {
            assert_eq!(generate(7, &pattern, shape, &mut rng).len(), 7);
        }
    }

    #[test]
    fn empty_shape_degrades_to_flat_sequence() {
        let mut rng = StdRng::seed_from_u64(3);
        let ranks = generate(
            4,
            &ResolvedPattern::Corner { opposite: false },
            GridShape::new(0, 0),
            &mut rng,
        );
        assert_eq!(ranks, vec![0, 0, 0, 0]);
    }

    #[test]
    fn walk_clamps_overflowing_rows() {
        let walk = CellWalk::new(7, GridShape::new(2, 3));
        assert_eq!(walk.at(6), (1, 0));
    }
}
