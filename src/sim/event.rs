/// Events emitted while a replay executes.
/// The presentation layer consumes these for animation/sound/toasts.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayEvent {
    /// The character moved (or was clamped in place) by one command.
    Stepped { row: usize, col: usize },
    /// The step landed on an obstacle; the replay stopped here.
    Blocked { row: usize, col: usize },
    /// Queue exhausted on the goal cell.
    ReachedGoal,
    /// Queue exhausted somewhere other than the goal.
    FellShort,
}
