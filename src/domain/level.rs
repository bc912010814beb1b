/// The level catalog: six fixed puzzles, three per difficulty tier.
///
/// Catalog order is semantically meaningful — it defines the progression
/// sequence within a tier. Levels are static data; nothing mutates them
/// for the lifetime of the process.
///
/// Data-entry invariant (checked by tests, not at runtime): every level's
/// start and end lie inside the grid and are not obstacle cells.

use crate::domain::command::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Easy,
    Hard,
}

impl Difficulty {
    /// Numeric tier as it appears in level labels and log records.
    pub fn tier(self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Hard => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Difficulty::Easy => "Level 1 (Easy)",
            Difficulty::Hard => "Level 2 (Hard)",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LevelData {
    pub id: u32,
    pub difficulty: Difficulty,
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub start: Cell,
    pub end: Cell,
    pub obstacles: &'static [Cell],
}

impl LevelData {
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }
}

static CATALOG: [LevelData; 6] = [
    // Difficulty 1
    LevelData {
        id: 1,
        difficulty: Difficulty::Easy,
        grid_rows: 5,
        grid_cols: 5,
        start: (0, 0),
        end: (0, 4),
        obstacles: &[(1, 0), (1, 1), (1, 2), (1, 3), (1, 4)], // top row path
    },
    LevelData {
        id: 2,
        difficulty: Difficulty::Easy,
        grid_rows: 5,
        grid_cols: 5,
        start: (2, 0),
        end: (2, 4),
        obstacles: &[(0, 0), (1, 0), (3, 0), (4, 0)], // middle row
    },
    LevelData {
        id: 3,
        difficulty: Difficulty::Easy,
        grid_rows: 4,
        grid_cols: 4,
        start: (0, 0),
        end: (3, 3),
        obstacles: &[(0, 1), (1, 0), (2, 3), (3, 2)], // diagonal-ish
    },
    // Difficulty 2
    LevelData {
        id: 4,
        difficulty: Difficulty::Hard,
        grid_rows: 6,
        grid_cols: 6,
        start: (0, 0),
        end: (5, 5),
        obstacles: &[(0, 1), (0, 2), (1, 1), (2, 2), (3, 3), (4, 4)],
    },
    LevelData {
        id: 5,
        difficulty: Difficulty::Hard,
        grid_rows: 6,
        grid_cols: 6,
        start: (5, 0),
        end: (0, 5),
        obstacles: &[(4, 0), (4, 1), (4, 2), (2, 3), (2, 4), (2, 5)],
    },
    LevelData {
        id: 6,
        difficulty: Difficulty::Hard,
        grid_rows: 5,
        grid_cols: 5,
        start: (2, 2),
        end: (4, 4),
        obstacles: &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)],
    },
];

/// The full catalog, in progression order.
pub fn catalog() -> &'static [LevelData] {
    &CATALOG
}

/// Levels of one tier, in catalog order. Always non-empty.
pub fn levels_for(difficulty: Difficulty) -> Vec<&'static LevelData> {
    catalog().iter().filter(|l| l.difficulty == difficulty).collect()
}

/// Label recorded with each attempt, e.g. "Diff 1 - Lvl 2".
/// `index` is the position within the tier's sublist, zero-based.
pub fn level_label(difficulty: Difficulty, index: usize) -> String {
    format!("Diff {} - Lvl {}", difficulty.tier(), index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_levels_per_tier() {
        assert_eq!(levels_for(Difficulty::Easy).len(), 3);
        assert_eq!(levels_for(Difficulty::Hard).len(), 3);
    }

    #[test]
    fn tier_sublists_preserve_catalog_order() {
        let easy: Vec<u32> = levels_for(Difficulty::Easy).iter().map(|l| l.id).collect();
        let hard: Vec<u32> = levels_for(Difficulty::Hard).iter().map(|l| l.id).collect();
        assert_eq!(easy, vec![1, 2, 3]);
        assert_eq!(hard, vec![4, 5, 6]);
    }

    #[test]
    fn start_and_end_in_bounds() {
        for level in catalog() {
            assert!(level.start.0 < level.grid_rows, "level {} start row", level.id);
            assert!(level.start.1 < level.grid_cols, "level {} start col", level.id);
            assert!(level.end.0 < level.grid_rows, "level {} end row", level.id);
            assert!(level.end.1 < level.grid_cols, "level {} end col", level.id);
        }
    }

    #[test]
    fn start_and_end_not_obstacles() {
        for level in catalog() {
            assert!(!level.is_obstacle(level.start), "level {} start blocked", level.id);
            assert!(!level.is_obstacle(level.end), "level {} end blocked", level.id);
        }
    }

    #[test]
    fn start_never_equals_end() {
        // An empty replay must always be Incomplete; that only holds
        // while no level starts on its own goal.
        for level in catalog() {
            assert_ne!(level.start, level.end, "level {}", level.id);
        }
    }

    #[test]
    fn obstacles_in_bounds() {
        for level in catalog() {
            for &(r, c) in level.obstacles {
                assert!(r < level.grid_rows && c < level.grid_cols, "level {}", level.id);
            }
        }
    }

    #[test]
    fn labels_are_one_based_per_tier() {
        assert_eq!(level_label(Difficulty::Easy, 0), "Diff 1 - Lvl 1");
        assert_eq!(level_label(Difficulty::Easy, 2), "Diff 1 - Lvl 3");
        assert_eq!(level_label(Difficulty::Hard, 1), "Diff 2 - Lvl 2");
    }
}
