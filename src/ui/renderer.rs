/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.
///
/// One compose function per screen; the session's Screen enum picks it.

use std::io::{self, BufWriter, Write};

use chrono::{Local, TimeZone};
use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::level::Difficulty;
use crate::sim::replay::Outcome;
use crate::sim::session::{App, GameState, LoginField, Screen};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// Using the SAME explicit RGB for `Clear(ClearType::All)` and every
    /// cell's background keeps VTE-based terminals from painting the
    /// inter-row gap a different color (visible horizontal lines).
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 34 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }

    /// Paint a full row with a background, then write a string on it.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(1, y, s, fg, bg);
    }

    /// Horizontally centered string.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

/// Each grid cell = 2 terminal columns, so the board reads roughly square.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const BOARD_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 24, b: 64 };
const TOAST_FG: Color = Color::Black;
const TOAST_BG: Color = Color::Rgb { r: 210, g: 185, b: 55 };
const HELP_FG: Color = Color::DarkGrey;
const FIELD_BG: Color = Color::Rgb { r: 38, g: 42, b: 70 };
const FOCUS_BG: Color = Color::Rgb { r: 60, g: 70, b: 120 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for a clean transition
        let screen = app.session.screen;
        if self.last_screen != Some(screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        // Build front buffer
        self.front.clear();

        match screen {
            Screen::Login => self.compose_login(app),
            Screen::LevelSelect => self.compose_level_select(app),
            Screen::Game => self.compose_game(app),
            Screen::ParentDashboard => self.compose_dashboard(app),
        }

        self.compose_toast(app);

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // Not ResetColor — the terminal default may differ from BASE_BG
        // and would cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Shared chrome ──

    fn compose_toast(&mut self, app: &App) {
        if app.message.is_empty() {
            return;
        }
        let row = self.front.height.saturating_sub(3);
        let msg = format!("◈ {}", app.message);
        self.front.put_bar(row, &msg, TOAST_FG, TOAST_BG);
    }

    fn compose_help(&mut self, text: &str) {
        let row = self.front.height.saturating_sub(1);
        self.front.put_str(1, row, text, HELP_FG, Color::Reset);
    }

    // ── Login / registration ──

    fn compose_login(&mut self, app: &App) {
        let form = &app.login;

        self.front.put_centered(2, "G R I D   C A D E T", Color::Rgb { r: 120, g: 220, b: 255 }, Color::Reset);
        self.front.put_centered(3, "plot the path, run the commands", HELP_FG, Color::Reset);

        let mode = if form.registering {
            if form.register_parent {
                "── CREATE ACCOUNT: PARENT ──"
            } else {
                "── CREATE ACCOUNT: KID ──"
            }
        } else {
            "── SIGN IN ──"
        };
        self.front.put_centered(6, mode, Color::White, Color::Reset);

        let field_w = 24usize;
        let fx = self.front.width.saturating_sub(field_w + 11) / 2;

        // Username field
        let name_bg = if form.focus == LoginField::Name { FOCUS_BG } else { FIELD_BG };
        self.front.put_str(fx, 8, "Username ", Color::White, Color::Reset);
        let shown: String = form.name.chars().take(field_w).collect();
        self.front.put_str(fx + 10, 8, &format!("{:<w$}", shown, w = field_w), Color::White, name_bg);

        // Password field (masked)
        let pass_bg = if form.focus == LoginField::Password { FOCUS_BG } else { FIELD_BG };
        self.front.put_str(fx, 10, "Password ", Color::White, Color::Reset);
        let masked = "*".repeat(form.password.chars().count().min(field_w));
        self.front.put_str(fx + 10, 10, &format!("{:<w$}", masked, w = field_w), Color::White, pass_bg);

        // Cursor marker on the focused field
        let (cy, filled) = match form.focus {
            LoginField::Name => (8usize, form.name.chars().count()),
            LoginField::Password => (10usize, form.password.chars().count()),
        };
        if filled < field_w {
            let blink = (app.anim_tick / 8) % 2 == 0;
            if blink {
                self.front.set(fx + 10 + filled, cy, Cell::from_char('_', Color::White, FOCUS_BG));
            }
        }

        if form.registering {
            self.front.put_centered(
                13,
                "Tab: switch field   ↑/↓: kid ⇄ parent   Enter: create   Esc: back",
                HELP_FG,
                Color::Reset,
            );
        } else {
            self.front.put_centered(
                13,
                "Tab: switch field   Enter: sign in   F2: create account",
                HELP_FG,
                Color::Reset,
            );
        }

        self.compose_help("Esc/Ctrl+C: quit");
    }

    // ── Difficulty select ──

    fn compose_level_select(&mut self, app: &App) {
        let name = app.session.user_name().to_string();
        self.front.put_bar(HUD_ROW, &format!("Signed in: {}", name), Color::White, HUD_BG);

        self.front.put_centered(3, "SELECT DIFFICULTY", Color::Rgb { r: 120, g: 220, b: 255 }, Color::Reset);

        let entries = [Difficulty::Easy.title(), Difficulty::Hard.title(), "Exit / Logout"];
        for (i, entry) in entries.iter().enumerate() {
            let y = 6 + i * 2;
            let selected = app.select_cursor == i;
            let (fg, bg) = if selected {
                (Color::Black, Color::Rgb { r: 120, g: 220, b: 255 })
            } else {
                (Color::White, Color::Reset)
            };
            let marker = if selected { "▸ " } else { "  " };
            self.front.put_centered(y, &format!("{}{:^18}{}", marker, entry, if selected { " ◂" } else { "  " }), fg, bg);
        }

        self.compose_help("↑/↓: move   Enter: choose   Esc: logout");
    }

    // ── Game screen ──

    fn compose_game(&mut self, app: &App) {
        let game = match &app.game {
            Some(g) => g,
            None => return,
        };
        let level = game.level();

        // ── HUD row ──
        let hud = format!(
            "{}   {}   Queue:{:<3}",
            app.session.user_name(),
            game.label(),
            game.queue.len(),
        );
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Board, horizontally centered ──
        let board_cols = level.grid_cols * CELL_W;
        let left = self.front.width.saturating_sub(board_cols + 2) / 2;

        for row in 0..level.grid_rows {
            let y = BOARD_ROW + row;
            for col in 0..level.grid_cols {
                let x = left + col * CELL_W;
                self.compose_board_cell(game, (row, col), x, y);
            }
        }

        // ── Queue bar ──
        let queue_row = BOARD_ROW + level.grid_rows + 1;
        let glyphs: String = if game.queue.is_empty() {
            "Queue empty — press the arrows to add commands".to_string()
        } else {
            game.queue.iter().map(|c| format!("{} ", c.glyph())).collect()
        };
        self.front.put_str(2, queue_row, &format!("Commands: {}", glyphs), Color::White, Color::Reset);

        // ── Status line ──
        let status_row = queue_row + 2;
        let (status, fg) = if game.is_replaying() {
            ("RUNNING...", Color::White)
        } else {
            match game.last_outcome {
                Some(Outcome::Success) => ("LEVEL COMPLETE!", Color::Green),
                Some(Outcome::Blocked) => {
                    ("HIT AN OBSTACLE!", Color::Rgb { r: 255, g: 110, b: 90 })
                }
                Some(Outcome::Incomplete) => {
                    ("DID NOT REACH GOAL", Color::Rgb { r: 255, g: 110, b: 90 })
                }
                None => ("Build your command queue, then press P to play", Color::White),
            }
        };
        self.front.put_str(2, status_row, status, fg, Color::Reset);

        self.compose_help("←↑↓→: queue   P: play   R: reset   Esc: exit");
    }

    /// Draw one board cell (2 terminal columns) at buffer position (x, y).
    fn compose_board_cell(&mut self, game: &GameState, cell: (usize, usize), x: usize, y: usize) {
        let level = game.level();
        let is_char = game.character == cell;
        let blocked_here = game.last_outcome == Some(Outcome::Blocked) && is_char;

        let (c0, c1, fg, bg) = if blocked_here {
            ('☺', '!', Color::White, Color::Rgb { r: 170, g: 40, b: 40 })
        } else if is_char {
            ('☺', ' ', Color::Rgb { r: 120, g: 220, b: 255 }, Color::Rgb { r: 30, g: 50, b: 90 })
        } else if level.is_obstacle(cell) {
            ('█', '█', Color::Rgb { r: 95, g: 95, b: 105 }, Color::Rgb { r: 60, g: 60, b: 70 })
        } else if cell == level.end {
            ('★', ' ', Color::Rgb { r: 255, g: 220, b: 60 }, Color::Rgb { r: 25, g: 70, b: 30 })
        } else {
            ('·', ' ', Color::Rgb { r: 70, g: 75, b: 100 }, Color::Reset)
        };
        self.front.set(x, y, Cell::from_char(c0, fg, bg));
        self.front.set(x + 1, y, Cell::from_char(c1, fg, bg));
    }

    // ── Parent dashboard ──

    fn compose_dashboard(&mut self, app: &App) {
        let hud = format!("Parent Dashboard — {}", app.session.user_name());
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);

        let view = &app.dashboard;
        let list_top = 2usize;
        let visible = self.front.height.saturating_sub(list_top + 3).max(1);

        if view.logs.is_empty() {
            self.front.put_str(2, list_top + 1, "No attempts recorded yet.", HELP_FG, Color::Reset);
        }

        for (i, log) in view.logs.iter().skip(view.scroll).take(visible).enumerate() {
            let y = list_top + i;
            let result = if log.success { "Success" } else { "Fail" };
            let result_fg = if log.success { Color::Green } else { Color::Rgb { r: 255, g: 110, b: 90 } };
            let when = format_timestamp(log.timestamp_millis);

            let line = format!("{:<12} {:<16}", log.child_name, log.level_label);
            self.front.put_str(2, y, &line, Color::White, Color::Reset);
            self.front.put_str(31, y, result, result_fg, Color::Reset);
            self.front.put_str(40, y, &when, HELP_FG, Color::Reset);
        }

        // Scroll indicator when the list overflows
        if view.logs.len() > visible {
            let info = format!("{}-{} of {}",
                view.scroll + 1,
                (view.scroll + visible).min(view.logs.len()),
                view.logs.len(),
            );
            let y = self.front.height.saturating_sub(2);
            self.front.put_str(2, y, &info, HELP_FG, Color::Reset);
        }

        self.compose_help("↑/↓: scroll   Esc: logout");
    }
}

/// Epoch milliseconds → local "YYYY-MM-DD HH:MM" for the dashboard.
fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "----".to_string(),
    }
}
