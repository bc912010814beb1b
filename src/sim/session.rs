/// Session state: the screen state machine plus per-screen working state.
///
/// ## Screen FSM
///
///   Login ──login(kid)────▶ LevelSelect ──choose──▶ Game
///     ▲  ──login(parent)──▶ ParentDashboard          │
///     │                                              │
///     └────────── logout (any screen) ◀──────────────┘
///                         Game exit / catalog done ──▶ LevelSelect
///
/// Navigation state is never persisted — every process start is Login.
/// All of it lives in one explicit struct passed to the loop and the
/// renderer; no ambient globals.

use crate::domain::command::{Cell, Command};
use crate::domain::level::{level_label, levels_for, Difficulty, LevelData};
use crate::domain::user::{GameLog, User};
use crate::sim::replay::{Outcome, Replay};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Login,
    ParentDashboard,
    LevelSelect,
    Game,
}

/// The navigation controller: current screen, who is signed in,
/// which tier they picked.
pub struct Session {
    pub screen: Screen,
    pub current_user: Option<User>,
    pub difficulty: Difficulty,
}

impl Session {
    pub fn new() -> Self {
        Session {
            screen: Screen::Login,
            current_user: None,
            difficulty: Difficulty::Easy,
        }
    }

    /// Successful authentication routes by role.
    pub fn login(&mut self, user: User) {
        self.screen = if user.is_parent {
            Screen::ParentDashboard
        } else {
            Screen::LevelSelect
        };
        self.current_user = Some(user);
    }

    pub fn choose_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.screen = Screen::Game;
    }

    /// Leave the game screen (manual exit or catalog completed).
    pub fn exit_game(&mut self) {
        self.screen = Screen::LevelSelect;
    }

    /// Allowed from any screen; clears the signed-in user.
    pub fn logout(&mut self) {
        self.screen = Screen::Login;
        self.current_user = None;
    }

    /// Name to record attempts under. Empty only on the login screen,
    /// where no attempt can be made.
    pub fn user_name(&self) -> &str {
        self.current_user.as_ref().map(|u| u.name.as_str()).unwrap_or("")
    }
}

// ── Login screen ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoginField {
    Name,
    Password,
}

pub struct LoginForm {
    pub name: String,
    pub password: String,
    pub focus: LoginField,
    /// Registration mode: Enter creates an account instead of logging in.
    pub registering: bool,
    /// Role toggle while registering: false = kid, true = parent.
    pub register_parent: bool,
}

impl LoginForm {
    pub fn new() -> Self {
        LoginForm {
            name: String::new(),
            password: String::new(),
            focus: LoginField::Name,
            registering: false,
            register_parent: false,
        }
    }

    pub fn type_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        match self.focus {
            LoginField::Name => self.name.push(c),
            LoginField::Password => self.password.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            LoginField::Name => self.name.pop(),
            LoginField::Password => self.password.pop(),
        };
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Name => LoginField::Password,
            LoginField::Password => LoginField::Name,
        };
    }

    pub fn clear(&mut self) {
        *self = LoginForm::new();
    }
}

// ── Game screen ──

pub struct GameState {
    pub difficulty: Difficulty,
    /// The tier's levels in progression order.
    pub levels: Vec<LevelData>,
    pub level_index: usize,
    pub queue: Vec<Command>,
    pub character: Cell,
    pub replay: Option<Replay>,
    /// Ticks until the running replay advances again.
    pub step_timer: u32,
    /// Outcome of the last finished replay, shown until the next
    /// play/reset.
    pub last_outcome: Option<Outcome>,
    /// After a win: ticks until the next level loads. Input stays
    /// blocked while this counts down.
    pub advance_timer: u32,
}

impl GameState {
    pub fn new(difficulty: Difficulty) -> Self {
        let levels: Vec<LevelData> = levels_for(difficulty).into_iter().copied().collect();
        let character = levels[0].start;
        GameState {
            difficulty,
            levels,
            level_index: 0,
            queue: vec![],
            character,
            replay: None,
            step_timer: 0,
            last_outcome: None,
            advance_timer: 0,
        }
    }

    pub fn level(&self) -> LevelData {
        self.levels[self.level_index]
    }

    /// Label recorded with this level's attempts.
    pub fn label(&self) -> String {
        level_label(self.difficulty, self.level_index)
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    /// Replay in flight or win-pause counting down — queue edits and
    /// a new PLAY are both refused.
    pub fn is_busy(&self) -> bool {
        self.replay.is_some() || self.advance_timer > 0
    }

    /// Append a command during the build phase. Ignored while busy.
    pub fn push_command(&mut self, cmd: Command) {
        if !self.is_busy() {
            self.queue.push(cmd);
        }
    }

    /// Clear the queue and return the character to the start cell.
    /// Ignored while busy.
    pub fn reset(&mut self) {
        if !self.is_busy() {
            self.queue.clear();
            self.character = self.level().start;
            self.last_outcome = None;
        }
    }

    /// Freeze the queue and begin a replay. The running-flag guard:
    /// returns false (and does nothing) while one is already in flight.
    pub fn start_replay(&mut self, start_delay_ticks: u32) -> bool {
        if self.is_busy() {
            return false;
        }
        self.character = self.level().start;
        self.last_outcome = None;
        self.replay = Some(Replay::start(self.level(), self.queue.clone()));
        self.step_timer = start_delay_ticks;
        true
    }

    /// Record the terminal outcome and return to the build phase.
    /// The queue survives a loss so the kid can study it.
    pub fn finish_replay(&mut self, outcome: Outcome) {
        self.replay = None;
        self.last_outcome = Some(outcome);
    }

    /// Move to the next level of the tier with a fresh queue.
    /// False when this was the last one (catalog completed).
    pub fn advance_level(&mut self) -> bool {
        if self.level_index + 1 < self.levels.len() {
            self.level_index += 1;
            self.queue.clear();
            self.character = self.level().start;
            self.last_outcome = None;
            true
        } else {
            false
        }
    }
}

// ── Parent dashboard ──

pub struct DashboardView {
    pub logs: Vec<GameLog>,
    pub scroll: usize,
}

impl DashboardView {
    pub fn new() -> Self {
        DashboardView { logs: vec![], scroll: 0 }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, visible: usize) {
        if self.scroll + visible < self.logs.len() {
            self.scroll += 1;
        }
    }
}

// ── Aggregate app state (what the loop mutates and the renderer reads) ──

pub struct App {
    pub session: Session,
    pub login: LoginForm,
    pub game: Option<GameState>,
    pub dashboard: DashboardView,

    /// Level-select cursor: 0 = Easy, 1 = Hard, 2 = Logout.
    pub select_cursor: usize,

    // Toast message with tick countdown
    pub message: String,
    pub message_timer: u32,

    pub anim_tick: u32,
}

impl App {
    pub fn new() -> Self {
        App {
            session: Session::new(),
            login: LoginForm::new(),
            game: None,
            dashboard: DashboardView::new(),
            select_cursor: 0,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Per-tick message countdown; 0 duration means sticky.
    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::Command::*;

    #[test]
    fn boots_to_login_with_no_user() {
        let s = Session::new();
        assert_eq!(s.screen, Screen::Login);
        assert!(s.current_user.is_none());
    }

    #[test]
    fn kid_login_goes_to_level_select() {
        let mut s = Session::new();
        s.login(User::new("kim", "pw", false));
        assert_eq!(s.screen, Screen::LevelSelect);
        assert_eq!(s.user_name(), "kim");
    }

    #[test]
    fn parent_login_goes_to_dashboard() {
        let mut s = Session::new();
        s.login(User::new("mom", "pw", true));
        assert_eq!(s.screen, Screen::ParentDashboard);
    }

    #[test]
    fn difficulty_choice_enters_game_and_exit_returns() {
        let mut s = Session::new();
        s.login(User::new("kim", "pw", false));
        s.choose_difficulty(Difficulty::Hard);
        assert_eq!(s.screen, Screen::Game);
        assert_eq!(s.difficulty, Difficulty::Hard);
        s.exit_game();
        assert_eq!(s.screen, Screen::LevelSelect);
    }

    #[test]
    fn logout_clears_user_from_any_screen() {
        let mut s = Session::new();
        s.login(User::new("mom", "pw", true));
        s.logout();
        assert_eq!(s.screen, Screen::Login);
        assert!(s.current_user.is_none());

        let mut s = Session::new();
        s.login(User::new("kim", "pw", false));
        s.choose_difficulty(Difficulty::Easy);
        s.logout();
        assert_eq!(s.screen, Screen::Login);
        assert!(s.current_user.is_none());
    }

    #[test]
    fn replay_guard_blocks_reentry() {
        let mut g = GameState::new(Difficulty::Easy);
        g.queue = vec![Right];
        assert!(g.start_replay(0));
        assert!(!g.start_replay(0)); // already running
        g.finish_replay(Outcome::Incomplete);
        assert_eq!(g.last_outcome, Some(Outcome::Incomplete));
        assert!(g.start_replay(0));
        assert!(g.last_outcome.is_none());
    }

    #[test]
    fn win_pause_counts_as_busy() {
        let mut g = GameState::new(Difficulty::Easy);
        g.advance_timer = 5;
        assert!(g.is_busy());
        assert!(!g.start_replay(0));
        g.push_command(Right);
        assert!(g.queue.is_empty());
    }

    #[test]
    fn queue_edits_ignored_while_replaying() {
        let mut g = GameState::new(Difficulty::Easy);
        g.push_command(Right);
        g.start_replay(0);
        g.push_command(Left);
        g.reset();
        assert_eq!(g.queue, vec![Right]);
    }

    #[test]
    fn reset_clears_queue_and_homes_character() {
        let mut g = GameState::new(Difficulty::Easy);
        g.push_command(Right);
        g.push_command(Down);
        g.character = (2, 2);
        g.reset();
        assert!(g.queue.is_empty());
        assert_eq!(g.character, g.level().start);
    }

    #[test]
    fn advance_walks_the_tier_then_signals_completion() {
        let mut g = GameState::new(Difficulty::Easy);
        g.push_command(Right);
        assert!(g.advance_level());
        assert_eq!(g.level_index, 1);
        assert!(g.queue.is_empty());
        assert_eq!(g.character, g.level().start);
        assert!(g.advance_level());
        assert!(!g.advance_level()); // three per tier
        assert_eq!(g.level_index, 2);
    }

    #[test]
    fn login_form_typing_and_focus() {
        let mut f = LoginForm::new();
        f.type_char('k');
        f.type_char('i');
        f.toggle_focus();
        f.type_char('p');
        f.type_char('w');
        f.backspace();
        assert_eq!(f.name, "ki");
        assert_eq!(f.password, "p");
        f.toggle_focus();
        assert_eq!(f.focus, LoginField::Name);
    }
}
