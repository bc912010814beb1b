/// User accounts and attempt records.
///
/// Both are plain immutable records: created once, never mutated,
/// never deleted. The name is the identity key — duplicates are
/// possible, and login resolves to the first stored match.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub password: String,
    pub is_parent: bool,
}

impl User {
    pub fn new(name: &str, password: &str, is_parent: bool) -> Self {
        User {
            name: name.to_string(),
            password: password.to_string(),
            is_parent,
        }
    }
}

/// One attempt record, appended whenever a replay reaches a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameLog {
    pub child_name: String,
    pub level_label: String,
    pub success: bool,
    pub timestamp_millis: i64,
}
