/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::command::Command;
use domain::level::Difficulty;
use domain::user::{GameLog, User};
use sim::event::ReplayEvent;
use sim::replay::Outcome;
use sim::session::{App, GameState, Screen};
use sim::store::{self, Store};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Default toast duration in ticks (~2s at the default tick rate).
const TOAST_TICKS: u32 = 40;

/// Pause after a win before the next level loads.
const WIN_PAUSE_MS: u64 = 1000;

fn main() {
    let config = GameConfig::load();
    let store = Store::open(&config.data_dir);

    let mut app = App::new();
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut app, &store, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Grid Cadet!");
}

fn game_loop(
    app: &mut App,
    store: &Store,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.replay.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_screen(app, store, sound, &kb, &gp, config) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            app.anim_tick = app.anim_tick.wrapping_add(1);
            app.tick_message();
            tick_replay(app, store, sound, config);
            last_tick = Instant::now();
        }

        renderer.render(app)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_PLAY: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];

/// How many dashboard rows scroll_down assumes are visible.
/// Matches the renderer's layout on a standard 24-row terminal.
const DASHBOARD_VISIBLE: usize = 16;

/// Per-screen input handling. Returns true to quit the program.
fn handle_screen(
    app: &mut App,
    store: &Store,
    sound: Option<&SoundEngine>,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
) -> bool {
    match app.session.screen {
        Screen::Login => handle_login(app, store, sound, kb),
        Screen::LevelSelect => handle_level_select(app, kb, gp),
        Screen::Game => handle_game(app, kb, gp, config),
        Screen::ParentDashboard => handle_dashboard(app, kb, gp),
    }
}

// ── Login / registration ──

fn handle_login(app: &mut App, store: &Store, sound: Option<&SoundEngine>, kb: &InputState) -> bool {
    let esc = kb.any_pressed(&[KeyCode::Esc]);

    // Text entry first: every typed character lands in the focused field.
    for c in kb.typed_chars() {
        app.login.type_char(c);
    }
    for _ in 0..kb.repeat_count(KeyCode::Backspace) {
        app.login.backspace();
    }
    if kb.any_pressed(&[KeyCode::Tab]) {
        app.login.toggle_focus();
    }

    if app.login.registering {
        // Role toggle
        if kb.any_pressed(&[KeyCode::Up]) || kb.any_pressed(&[KeyCode::Down]) {
            app.login.register_parent = !app.login.register_parent;
        }

        if kb.any_pressed(&[KeyCode::Enter]) {
            register_account(app, store, sound);
        } else if esc {
            app.login.registering = false;
        }
        return false;
    }

    if kb.any_pressed(&[KeyCode::Enter]) {
        match store.authenticate(&app.login.name, &app.login.password) {
            Some(user) => {
                enter_session(app, store, user);
                if let Some(sfx) = sound {
                    sfx.play_chirp();
                }
            }
            None => app.set_message("Invalid Login", TOAST_TICKS),
        }
    } else if kb.any_pressed(&[KeyCode::F(2)]) {
        app.login.registering = true;
    } else if esc {
        return true; // quit from the login screen
    }

    false
}

fn register_account(app: &mut App, store: &Store, sound: Option<&SoundEngine>) {
    let form = &app.login;

    // The record format has no escaping; refuse fields it can't hold.
    if !store::field_is_clean(&form.name) || !store::field_is_clean(&form.password) {
        app.set_message("Name and password must be non-empty, without commas", TOAST_TICKS);
        return;
    }

    let user = User::new(&form.name, &form.password, form.register_parent);
    match store.save_user(&user) {
        Ok(()) => {
            let msg = if user.is_parent {
                "Parent Account Created!"
            } else {
                "Kid Account Created!"
            };
            app.set_message(msg, TOAST_TICKS);
            if let Some(sfx) = sound {
                sfx.play_chirp();
            }
            app.login.registering = false;
        }
        Err(_) => app.set_message("Save failed!", TOAST_TICKS),
    }
}

/// Shared post-login routing: load what the landing screen needs.
fn enter_session(app: &mut App, store: &Store, user: User) {
    let is_parent = user.is_parent;
    app.session.login(user);
    app.login.clear();
    if is_parent {
        app.dashboard.logs = store.load_logs();
        app.dashboard.scroll = 0;
    } else {
        app.select_cursor = 0;
    }
}

// ── Difficulty select ──

fn handle_level_select(app: &mut App, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    if kb.any_pressed(&[KeyCode::Up]) || gp.up_pressed() {
        app.select_cursor = app.select_cursor.saturating_sub(1);
    } else if kb.any_pressed(&[KeyCode::Down]) || gp.down_pressed() {
        app.select_cursor = (app.select_cursor + 1).min(2);
    } else if confirm {
        match app.select_cursor {
            0 => start_game(app, Difficulty::Easy),
            1 => start_game(app, Difficulty::Hard),
            _ => logout(app),
        }
    } else if esc {
        logout(app);
    }

    false
}

fn start_game(app: &mut App, difficulty: Difficulty) {
    app.session.choose_difficulty(difficulty);
    app.game = Some(GameState::new(difficulty));
}

fn logout(app: &mut App) {
    app.session.logout();
    app.game = None;
    app.login.clear();
    app.select_cursor = 0;
}

// ── Game screen ──

fn handle_game(app: &mut App, kb: &InputState, gp: &GamepadState, config: &GameConfig) -> bool {
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    // Exit is always available. Leaving mid-replay abandons it:
    // the dropped Replay never reaches a terminal state, so no log
    // entry is written for it.
    if esc {
        app.session.exit_game();
        app.game = None;
        return false;
    }

    let game = match app.game.as_mut() {
        Some(g) => g,
        None => return false,
    };

    if game.is_busy() {
        return false; // replay or win-pause in progress
    }

    if kb.any_pressed(KEYS_UP) || gp.up_pressed() {
        game.push_command(Command::Up);
    } else if kb.any_pressed(KEYS_DOWN) || gp.down_pressed() {
        game.push_command(Command::Down);
    } else if kb.any_pressed(KEYS_LEFT) || gp.left_pressed() {
        game.push_command(Command::Left);
    } else if kb.any_pressed(KEYS_RIGHT) || gp.right_pressed() {
        game.push_command(Command::Right);
    } else if kb.any_pressed(KEYS_PLAY) || gp.play_pressed() {
        game.start_replay(config.replay.start_delay_ticks());
    } else if kb.any_pressed(KEYS_RESET) || gp.reset_pressed() {
        game.reset();
    }

    false
}

// ── Parent dashboard ──

fn handle_dashboard(app: &mut App, kb: &InputState, gp: &GamepadState) -> bool {
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    if kb.any_pressed(&[KeyCode::Up]) || gp.up_pressed() {
        app.dashboard.scroll_up();
    } else if kb.any_pressed(&[KeyCode::Down]) || gp.down_pressed() {
        app.dashboard.scroll_down(DASHBOARD_VISIBLE);
    } else if esc {
        logout(app);
    }

    false
}

// ── Replay ticking ──

/// Advance the in-flight replay by one game-loop tick: count down the
/// inter-step delay, apply one command when it expires, and handle the
/// terminal outcome (log record, toast, sound, level progression).
fn tick_replay(app: &mut App, store: &Store, sound: Option<&SoundEngine>, config: &GameConfig) {
    if app.session.screen != Screen::Game {
        return;
    }
    let child = app.session.user_name().to_string();

    let mut toast: Option<&'static str> = None;
    let mut catalog_done = false;

    {
        let game = match app.game.as_mut() {
            Some(g) => g,
            None => return,
        };

        // Win-pause countdown → next level or catalog completion
        if game.advance_timer > 0 {
            game.advance_timer -= 1;
            if game.advance_timer == 0 && !game.advance_level() {
                catalog_done = true;
            }
        } else if game.is_replaying() {
            if game.step_timer > 0 {
                game.step_timer -= 1;
                return;
            }
            game.step_timer = config.replay.step_delay_ticks();

            let event = match game.replay.as_mut() {
                Some(replay) => replay.advance(),
                None => None,
            };

            match event {
                Some(ReplayEvent::Stepped { row, col }) => {
                    game.character = (row, col);
                    if let Some(sfx) = sound {
                        sfx.play_step();
                    }
                }
                Some(ReplayEvent::Blocked { row, col }) => {
                    game.character = (row, col);
                    let saved = record_attempt(store, &child, game, false);
                    game.finish_replay(Outcome::Blocked);
                    toast = Some(if saved { "Hit an obstacle! Try again." } else { SAVE_FAILED });
                    if let Some(sfx) = sound {
                        sfx.play_blocked();
                    }
                }
                Some(ReplayEvent::ReachedGoal) => {
                    let saved = record_attempt(store, &child, game, true);
                    game.finish_replay(Outcome::Success);
                    game.advance_timer = win_pause_ticks(config);
                    toast = Some(if saved { "Level Complete!" } else { SAVE_FAILED });
                    if let Some(sfx) = sound {
                        sfx.play_win();
                    }
                }
                Some(ReplayEvent::FellShort) => {
                    let saved = record_attempt(store, &child, game, false);
                    game.finish_replay(Outcome::Incomplete);
                    toast = Some(if saved { "Did not reach goal." } else { SAVE_FAILED });
                    if let Some(sfx) = sound {
                        sfx.play_fell_short();
                    }
                }
                None => game.replay = None,
            }
        }
    }

    if let Some(msg) = toast {
        app.set_message(msg, TOAST_TICKS);
    }
    if catalog_done {
        app.session.exit_game();
        app.game = None;
        app.set_message("All Levels Completed!", TOAST_TICKS * 2);
    }
}

fn win_pause_ticks(config: &GameConfig) -> u32 {
    (WIN_PAUSE_MS / config.replay.tick_rate_ms.max(1)).max(1) as u32
}

const SAVE_FAILED: &str = "Progress save failed!";

/// Append one attempt record. A write failure is surfaced as a toast
/// by the caller, never fatal — the game goes on with the store
/// unavailable.
fn record_attempt(store: &Store, child: &str, game: &GameState, success: bool) -> bool {
    let log = GameLog {
        child_name: child.to_string(),
        level_label: game.label(),
        success,
        timestamp_millis: store::now_millis(),
    };
    store.append_log(&log).is_ok()
}
