/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub replay: ReplayConfig,
    pub gamepad: GamepadConfig,
    /// Store location override; empty = auto-resolve.
    pub data_dir: String,
}

#[derive(Clone, Debug)]
pub struct ReplayConfig {
    /// Game loop tick length.
    pub tick_rate_ms: u64,
    /// Pause before the first replay step, so the kid sees the
    /// character back on the start cell.
    pub start_delay_ms: u64,
    /// Pause between replay steps (the animation cadence).
    pub step_delay_ms: u64,
}

impl ReplayConfig {
    /// A millisecond delay expressed in game-loop ticks, at least 1.
    fn ticks(&self, delay_ms: u64) -> u32 {
        (delay_ms / self.tick_rate_ms.max(1)).max(1) as u32
    }

    pub fn start_delay_ticks(&self) -> u32 {
        self.ticks(self.start_delay_ms)
    }

    pub fn step_delay_ticks(&self) -> u32 {
        self.ticks(self.step_delay_ms)
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub play: Vec<String>,
    pub reset: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    replay: TomlReplay,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlReplay {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_start_delay")]
    start_delay_ms: u64,
    #[serde(default = "default_step_delay")]
    step_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_play")]
    play: Vec<String>,
    #[serde(default = "default_reset")]
    reset: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    data_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_start_delay() -> u64 { 500 }
fn default_step_delay() -> u64 { 600 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_play() -> Vec<String> { vec!["X".into()] }
fn default_reset() -> Vec<String> { vec!["Y".into()] }

impl Default for TomlReplay {
    fn default() -> Self {
        TomlReplay {
            tick_rate_ms: default_tick_rate(),
            start_delay_ms: default_start_delay(),
            step_delay_ms: default_step_delay(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            play: default_play(),
            reset: default_reset(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { data_dir: String::new() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let toml_cfg = load_toml(&candidate_dirs());

        GameConfig {
            replay: ReplayConfig {
                tick_rate_ms: toml_cfg.replay.tick_rate_ms,
                start_delay_ms: toml_cfg.replay.start_delay_ms,
                step_delay_ms: toml_cfg.replay.step_delay_ms,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                play: toml_cfg.gamepad.play,
                reset: toml_cfg.gamepad.reset,
            },
            data_dir: toml_cfg.general.data_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/gridcadet → /usr/games/gridcadet
        // still finds data relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_ticks_round_down_with_floor_of_one() {
        let r = ReplayConfig { tick_rate_ms: 50, start_delay_ms: 500, step_delay_ms: 600 };
        assert_eq!(r.start_delay_ticks(), 10);
        assert_eq!(r.step_delay_ticks(), 12);

        let fast = ReplayConfig { tick_rate_ms: 100, start_delay_ms: 30, step_delay_ms: 0 };
        assert_eq!(fast.start_delay_ticks(), 1);
        assert_eq!(fast.step_delay_ticks(), 1);
    }

    #[test]
    fn toml_defaults_cover_missing_sections() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.replay.tick_rate_ms, 50);
        assert_eq!(cfg.replay.step_delay_ms, 600);
        assert!(cfg.general.data_dir.is_empty());
        assert_eq!(cfg.gamepad.play, vec!["X".to_string()]);
    }

    #[test]
    fn toml_partial_override() {
        let cfg: TomlConfig = toml::from_str(
            "[replay]\nstep_delay_ms = 200\n\n[general]\ndata_dir = \"/tmp/cadet\"\n",
        )
        .unwrap();
        assert_eq!(cfg.replay.step_delay_ms, 200);
        assert_eq!(cfg.replay.tick_rate_ms, 50); // untouched default
        assert_eq!(cfg.general.data_dir, "/tmp/cadet");
    }
}
