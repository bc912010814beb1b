/// Append-only record store for user accounts and attempt logs.
///
/// ## File formats (plain text, newline-delimited, comma-separated):
///
///   `users.txt`:  `name,password,is_parent`        is_parent ∈ {true,false}
///   `logs.txt`:   `child_name,level_label,success,timestamp_millis`
///
/// Every write is a single-line append, so no partial record can be
/// observed. Loads skip lines with the wrong field count instead of
/// failing — existing files from older installs keep parsing.
///
/// Format constraint: fields are joined with ',' and records with '\n',
/// with no escaping. Names and passwords must not contain either
/// character; registration rejects them (`field_is_clean`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::user::{GameLog, User};

const USERS_FILE: &str = "users.txt";
const LOGS_FILE: &str = "logs.txt";

pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open a store rooted at an explicit directory.
    pub fn new(dir: PathBuf) -> Self {
        Store { dir }
    }

    /// Open a store at the configured directory, or the default location
    /// when the config override is empty.
    pub fn open(data_dir_override: &str) -> Self {
        let dir = if data_dir_override.is_empty() {
            default_data_dir()
        } else {
            PathBuf::from(data_dir_override)
        };
        let _ = std::fs::create_dir_all(&dir);
        Store { dir }
    }

    #[allow(dead_code)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Users ──

    pub fn save_user(&self, user: &User) -> Result<(), String> {
        self.append_line(USERS_FILE, &serialize_user(user))
    }

    /// All user records in file order. Missing file = no users yet.
    pub fn load_users(&self) -> Vec<User> {
        self.read_lines(USERS_FILE)
            .iter()
            .filter_map(|line| parse_user(line))
            .collect()
    }

    /// First stored record matching both name and password.
    pub fn authenticate(&self, name: &str, password: &str) -> Option<User> {
        self.load_users()
            .into_iter()
            .find(|u| u.name == name && u.password == password)
    }

    // ── Attempt logs ──

    pub fn append_log(&self, log: &GameLog) -> Result<(), String> {
        self.append_line(LOGS_FILE, &serialize_log(log))
    }

    /// All attempt records in file order (oldest first).
    pub fn load_logs(&self) -> Vec<GameLog> {
        self.read_lines(LOGS_FILE)
            .iter()
            .filter_map(|line| parse_log(line))
            .collect()
    }

    // ── Internal ──

    fn append_line(&self, file: &str, line: &str) -> Result<(), String> {
        let path = self.dir.join(file);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("open {}: {}", path.display(), e))?;
        writeln!(f, "{}", line).map_err(|e| format!("write {}: {}", path.display(), e))
    }

    fn read_lines(&self, file: &str) -> Vec<String> {
        match std::fs::read_to_string(self.dir.join(file)) {
            Ok(content) => content.lines().map(|l| l.to_string()).collect(),
            Err(_) => vec![],
        }
    }
}

// ── Record serialization ──

fn serialize_user(user: &User) -> String {
    format!("{},{},{}", user.name, user.password, user.is_parent)
}

fn parse_user(line: &str) -> Option<User> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 3 {
        return None;
    }
    Some(User {
        name: parts[0].to_string(),
        password: parts[1].to_string(),
        is_parent: parts[2] == "true",
    })
}

fn serialize_log(log: &GameLog) -> String {
    format!(
        "{},{},{},{}",
        log.child_name, log.level_label, log.success, log.timestamp_millis
    )
}

fn parse_log(line: &str) -> Option<GameLog> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() != 4 {
        return None;
    }
    Some(GameLog {
        child_name: parts[0].to_string(),
        level_label: parts[1].to_string(),
        success: parts[2] == "true",
        timestamp_millis: parts[3].parse().ok()?,
    })
}

/// May this string be stored as a record field?
/// The format has no escaping, so the delimiter and line breaks are out.
pub fn field_is_clean(s: &str) -> bool {
    !s.is_empty() && !s.contains(',') && !s.contains('\n') && !s.contains('\r')
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ── Data directory resolution ──

/// Default store location:
///   1. exe directory if writable (portable installs)
///   2. ~/.local/share/gridcadet (system installs)
///   3. CWD as a last resort
fn default_data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let probe = parent.join(".write_test_gridcadet");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gridcadet");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> Store {
        let dir = std::env::temp_dir().join(format!("gridcadet_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Store::new(dir)
    }

    #[test]
    fn user_record_round_trip() {
        let u = User::new("mika", "hunter2", false);
        assert_eq!(parse_user(&serialize_user(&u)), Some(u));
        let p = User::new("dad", "secret", true);
        assert_eq!(parse_user(&serialize_user(&p)), Some(p));
    }

    #[test]
    fn log_batch_round_trip_preserves_order() {
        let logs: Vec<GameLog> = (0..5)
            .map(|i| GameLog {
                child_name: format!("kid{}", i),
                level_label: format!("Diff 1 - Lvl {}", i + 1),
                success: i % 2 == 0,
                timestamp_millis: 1_700_000_000_000 + i as i64,
            })
            .collect();
        let parsed: Vec<GameLog> = logs
            .iter()
            .map(serialize_log)
            .filter_map(|l| parse_log(&l))
            .collect();
        assert_eq!(parsed, logs);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let store = temp_store("malformed");
        std::fs::write(
            store.dir().join("users.txt"),
            "ana,pw1,false\nbroken line without fields\nbo,pw2,true,extra\nciri,pw3,true\n",
        )
        .unwrap();
        let users = store.load_users();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "ana");
        assert_eq!(users[1].name, "ciri");
    }

    #[test]
    fn register_then_authenticate() {
        let store = temp_store("auth");
        store.save_user(&User::new("kim", "pass123", false)).unwrap();
        store.save_user(&User::new("mom", "letmein", true)).unwrap();

        let kim = store.authenticate("kim", "pass123").unwrap();
        assert!(!kim.is_parent);
        assert!(store.authenticate("kim", "wrong").is_none());
        assert!(store.authenticate("nobody", "pass123").is_none());
        assert!(store.authenticate("mom", "letmein").unwrap().is_parent);
    }

    #[test]
    fn duplicate_names_resolve_to_first_match() {
        let store = temp_store("dupes");
        store.save_user(&User::new("sam", "first", false)).unwrap();
        store.save_user(&User::new("sam", "second", true)).unwrap();
        // Each password still finds its own record; the first full match wins.
        assert!(!store.authenticate("sam", "first").unwrap().is_parent);
        assert!(store.authenticate("sam", "second").unwrap().is_parent);
    }

    #[test]
    fn logs_append_in_order() {
        let store = temp_store("logs");
        for i in 0..3 {
            store
                .append_log(&GameLog {
                    child_name: "kid".into(),
                    level_label: level_label_for(i),
                    success: i == 2,
                    timestamp_millis: 1000 + i as i64,
                })
                .unwrap();
        }
        let logs = store.load_logs();
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].level_label, "Diff 1 - Lvl 1");
        assert_eq!(logs[2].timestamp_millis, 1002);
        assert!(logs[2].success);
    }

    fn level_label_for(i: usize) -> String {
        format!("Diff 1 - Lvl {}", i + 1)
    }

    #[test]
    fn end_to_end_win_appends_success_record() {
        use crate::domain::command::Command::Right;
        use crate::domain::level::{level_label, levels_for, Difficulty};
        use crate::sim::replay::{run, Outcome};

        let store = temp_store("end_to_end");
        let level = *levels_for(Difficulty::Easy)[0];
        let (outcome, _) = run(level, &[Right, Right, Right, Right]);
        assert_eq!(outcome, Outcome::Success);

        store
            .append_log(&GameLog {
                child_name: "kim".into(),
                level_label: level_label(Difficulty::Easy, 0),
                success: outcome == Outcome::Success,
                timestamp_millis: now_millis(),
            })
            .unwrap();

        let logs = store.load_logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
        assert_eq!(logs[0].level_label, "Diff 1 - Lvl 1");
    }

    #[test]
    fn delimiter_fields_are_rejected_by_validation() {
        assert!(field_is_clean("mika"));
        assert!(field_is_clean("pass word"));
        assert!(!field_is_clean("a,b"));
        assert!(!field_is_clean("line\nbreak"));
        assert!(!field_is_clean(""));
    }

    #[test]
    fn missing_files_load_empty() {
        let store = temp_store("empty");
        assert!(store.load_users().is_empty());
        assert!(store.load_logs().is_empty());
    }
}
