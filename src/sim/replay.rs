/// The replay simulator: executes a frozen command queue against a level.
///
/// State machine:
///
///   Idle ──start──▶ Running ──▶ { Success | Blocked | Incomplete }
///
/// The owner drops the `Replay` once the terminal outcome is recorded,
/// returning to Idle. A cancelled replay is simply dropped mid-run; no
/// outcome, no log entry.
///
/// ## Ordering contract (load-bearing, do not reorder):
///
///   1. Apply one command: axis delta, clamp to the grid.
///   2. Check the NEW cell against the obstacle set. On hit: `Blocked`,
///      remaining commands are never applied.
///   3. Only after the whole queue ran: final cell == end ⇒ `Success`,
///      else `Incomplete`.
///
/// Success is never checked mid-queue — a queue that walks across the
/// goal and off again is `Incomplete`, and a queue that reaches the goal
/// early but later steps into an obstacle is `Blocked`. Checking all
/// steps at once would change which obstacle contact gets reported.
///
/// Stepping is cursor-driven (`advance()` once per presentation delay)
/// so the shell can animate; `run()` drives the same cursor to the end
/// for headless callers and tests. Both share `advance()`, so the
/// semantics cannot diverge.

use crate::domain::command::{Cell, Command};
use crate::domain::level::LevelData;
use crate::sim::event::ReplayEvent;

/// Terminal classification of a replay attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Success,
    Blocked,
    Incomplete,
}

pub struct Replay {
    level: LevelData,
    queue: Vec<Command>,
    cursor: usize,
    pos: Cell,
    outcome: Option<Outcome>,
}

impl Replay {
    /// Freeze a command queue and place the character on the start cell.
    pub fn start(level: LevelData, queue: Vec<Command>) -> Self {
        let pos = level.start;
        Replay {
            level,
            queue,
            cursor: 0,
            pos,
            outcome: None,
        }
    }

    /// Current character position (updated by each `advance`).
    #[allow(dead_code)]
    pub fn position(&self) -> Cell {
        self.pos
    }

    /// Still executing? False once a terminal outcome is set.
    pub fn is_running(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Execute one step of the state machine.
    ///
    /// While commands remain: applies the next one and reports `Stepped`
    /// or `Blocked`. Once the queue is exhausted: reports `ReachedGoal`
    /// or `FellShort` and becomes terminal. Returns None after that.
    pub fn advance(&mut self) -> Option<ReplayEvent> {
        if self.outcome.is_some() {
            return None;
        }

        if let Some(&cmd) = self.queue.get(self.cursor) {
            self.cursor += 1;
            self.pos = cmd.apply(self.pos, self.level.grid_rows, self.level.grid_cols);
            let (row, col) = self.pos;
            if self.level.is_obstacle(self.pos) {
                self.outcome = Some(Outcome::Blocked);
                return Some(ReplayEvent::Blocked { row, col });
            }
            return Some(ReplayEvent::Stepped { row, col });
        }

        // Queue exhausted: evaluate the final cell. An empty queue lands
        // here on the first advance and evaluates the start cell.
        if self.pos == self.level.end {
            self.outcome = Some(Outcome::Success);
            Some(ReplayEvent::ReachedGoal)
        } else {
            self.outcome = Some(Outcome::Incomplete);
            Some(ReplayEvent::FellShort)
        }
    }
}

/// Run a whole queue to its terminal outcome in one call.
/// Returns the outcome plus the sequence of intermediate positions,
/// one per applied command (clamped-in-place steps included).
#[allow(dead_code)]
pub fn run(level: LevelData, queue: &[Command]) -> (Outcome, Vec<Cell>) {
    let mut replay = Replay::start(level, queue.to_vec());
    let mut trace = vec![];
    while let Some(event) = replay.advance() {
        match event {
            ReplayEvent::Stepped { row, col } | ReplayEvent::Blocked { row, col } => {
                trace.push((row, col));
            }
            _ => {}
        }
    }
    // advance() always terminates: the queue is finite and the final
    // evaluation sets an outcome.
    (replay.outcome().unwrap_or(Outcome::Incomplete), trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::Command::*;
    use crate::domain::level::catalog;

    fn level(id: u32) -> LevelData {
        *catalog().iter().find(|l| l.id == id).unwrap()
    }

    #[test]
    fn level_one_straight_run_succeeds() {
        // 5x5, start (0,0), end (0,4), obstacles fill row 1
        let (outcome, trace) = run(level(1), &[Right, Right, Right, Right]);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(trace, vec![(0, 1), (0, 2), (0, 3), (0, 4)]);
    }

    #[test]
    fn replay_is_deterministic() {
        let queue = [Right, Down, Right, Right];
        let first = run(level(3), &queue);
        for _ in 0..10 {
            assert_eq!(run(level(3), &queue), first);
        }
    }

    #[test]
    fn obstacle_stops_before_later_commands() {
        // Level 1: Down from (0,0) lands on obstacle (1,0). The rest of
        // the queue would reach the end cell, but must never run.
        let (outcome, trace) = run(level(1), &[Right, Down, Up, Right, Right, Right]);
        assert_eq!(outcome, Outcome::Blocked);
        assert_eq!(trace, vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn boundary_clamp_stays_on_edge() {
        // Up from (0,0) clamps in place; not a wrap, not an error.
        let (outcome, trace) = run(level(1), &[Up]);
        assert_eq!(outcome, Outcome::Incomplete);
        assert_eq!(trace, vec![(0, 0)]);
    }

    #[test]
    fn empty_queue_is_incomplete() {
        for lvl in catalog() {
            let (outcome, trace) = run(*lvl, &[]);
            assert_eq!(outcome, Outcome::Incomplete, "level {}", lvl.id);
            assert!(trace.is_empty());
        }
    }

    #[test]
    fn no_early_exit_on_success() {
        // Reach the end cell mid-queue, then walk off: Incomplete.
        let (outcome, trace) = run(level(1), &[Right, Right, Right, Right, Left]);
        assert_eq!(outcome, Outcome::Incomplete);
        assert_eq!(*trace.last().unwrap(), (0, 3));
    }

    #[test]
    fn overlong_queue_fully_consumed() {
        // End reached, then clamped against the right edge twice; final
        // cell is still the end, so the overshoot does not spoil the win.
        let (outcome, trace) = run(level(1), &[Right, Right, Right, Right, Right, Right]);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(trace.len(), 6);
        assert_eq!(*trace.last().unwrap(), (0, 4));
    }

    #[test]
    fn advance_reports_steps_then_terminal_then_none() {
        let mut replay = Replay::start(level(1), vec![Right]);
        assert!(replay.is_running());
        assert_eq!(replay.advance(), Some(ReplayEvent::Stepped { row: 0, col: 1 }));
        assert!(replay.is_running());
        assert_eq!(replay.advance(), Some(ReplayEvent::FellShort));
        assert_eq!(replay.outcome(), Some(Outcome::Incomplete));
        assert_eq!(replay.advance(), None);
    }

    #[test]
    fn blocked_reports_collision_cell() {
        let mut replay = Replay::start(level(1), vec![Down, Right]);
        assert_eq!(replay.advance(), Some(ReplayEvent::Blocked { row: 1, col: 0 }));
        assert_eq!(replay.outcome(), Some(Outcome::Blocked));
        assert_eq!(replay.position(), (1, 0));
        // Remaining command never runs
        assert_eq!(replay.advance(), None);
        assert_eq!(replay.position(), (1, 0));
    }

    #[test]
    fn hand_solved_queues_win() {
        let solutions: [(u32, &[Command]); 5] = [
            (1, &[Right, Right, Right, Right]),
            (2, &[Right, Right, Right, Right]),
            (4, &[Down, Down, Right, Down, Right, Down, Right, Down, Right, Right]),
            (
                5,
                &[
                    Right, Right, Right, Up, Up, Left, Left, Left, Up, Up, Up, Right, Right,
                    Right, Right, Right,
                ],
            ),
            (6, &[Down, Down, Right, Right]),
        ];
        for (id, queue) in solutions {
            let (outcome, _) = run(level(id), queue);
            assert_eq!(outcome, Outcome::Success, "level {}", id);
        }
    }

    #[test]
    fn level_three_start_is_boxed_in() {
        // Catalog data ships level 3 with both of the start cell's
        // neighbors blocked; the first effective move is always Blocked.
        let (right, _) = run(level(3), &[Right]);
        let (down, _) = run(level(3), &[Down]);
        assert_eq!(right, Outcome::Blocked);
        assert_eq!(down, Outcome::Blocked);
    }

    #[test]
    fn clamped_step_still_checks_current_cell() {
        // Level 2 has an obstacle at (1,0); from start (2,0) an Up lands
        // there, and a Left from start clamps onto (2,0) which is clear.
        let (up, _) = run(level(2), &[Up]);
        assert_eq!(up, Outcome::Blocked);
        let (left, trace) = run(level(2), &[Left]);
        assert_eq!(left, Outcome::Incomplete);
        assert_eq!(trace, vec![(2, 0)]);
    }
}
