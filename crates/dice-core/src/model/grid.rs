use crate::model::column::{COLUMN_HEIGHT, Column};
use crate::model::die::DieValue;
use serde::{Deserialize, Serialize};

pub const COLUMN_COUNT: usize = 3;
pub const GRID_SLOTS: usize = COLUMN_COUNT * COLUMN_HEIGHT;

/// A player's 3x3 board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    columns: [Column; COLUMN_COUNT],
}

/// Score breakdown returned to display collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridScore {
    pub total: u32,
    pub columns: [u32; COLUMN_COUNT],
}

impl Grid {
    pub const EMPTY: Grid = Grid {
        columns: [Column::EMPTY; COLUMN_COUNT],
    };

    pub fn from_columns(columns: [Column; COLUMN_COUNT]) -> Self {
        Grid { columns }
    }

    pub fn columns(&self) -> &[Column; COLUMN_COUNT] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> Option<&mut Column> {
        self.columns.get_mut(index)
    }

    pub fn filled_slots(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    pub fn is_full(&self) -> bool {
        self.columns.iter().all(Column::is_full)
    }

    /// Column indices that still have room, ascending.
    pub fn open_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.is_full())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn score(&self) -> GridScore {
        let columns = self.columns.map(|column| column.score());
        GridScore {
            total: columns.iter().sum(),
            columns,
        }
    }

    pub fn total(&self) -> u32 {
        self.columns.iter().map(Column::score).sum()
    }
}

pub fn column_score(column: &Column) -> u32 {
    column.score()
}

pub fn grid_score(grid: &Grid) -> GridScore {
    grid.score()
}

/// Points `grid` would gain if `die` were placed in `column`. Zero when the
/// column is full or out of range.
pub fn placement_gain(grid: &Grid, column: usize, die: DieValue) -> u32 {
    let Some(current) = grid.column(column) else {
        return 0;
    };
    let mut next = *current;
    if next.place(die).is_none() {
        return 0;
    }
    next.score() - current.score()
}

/// Points `opponent` would lose if `die` were placed against their `column`.
pub fn removal_loss(opponent: &Grid, column: usize, die: DieValue) -> u32 {
    let Some(current) = opponent.column(column) else {
        return 0;
    };
    let mut next = *current;
    next.remove_value(die);
    current.score() - next.score()
}
