//! Line-oriented `key=value` upsert for flat settings files.
//!
//! Each assignment is merged on its own: the first line starting with
//! `key=` is replaced whole, otherwise `key=value` is appended. Merging works
//! on in-memory text only; reading and writing the file is the caller's job.
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Line terminator written after every replaced or appended line.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

const DELIMITER: char = '=';

/// Errors raised while building keys and assignments.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("setting key must not be empty")]
    EmptyKey,
    #[error("setting key {key:?} must not contain '='")]
    KeyContainsDelimiter { key: String },
    #[error("setting key {key:?} must not contain a line break")]
    KeyContainsLineBreak { key: String },
    #[error("value for {key} must not contain a line break")]
    ValueContainsLineBreak { key: String },
    #[error("could not build pattern for key {key}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

/// A validated settings key with its line-matching pattern.
#[derive(Debug, Clone)]
pub struct SettingKey {
    name: String,
    line: Regex,
}

impl SettingKey {
    /// Validate `name` and compile the pattern matching its line.
    ///
    /// The key is matched literally at the start of a line. A final line with
    /// no terminator still counts as a match.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, contains `=` or a line break.
    pub fn new(name: &str) -> Result<Self, SettingsError> {
        if name.is_empty() {
            return Err(SettingsError::EmptyKey);
        }
        if name.contains(DELIMITER) {
            return Err(SettingsError::KeyContainsDelimiter {
                key: name.to_string(),
            });
        }
        if has_line_break(name) {
            return Err(SettingsError::KeyContainsLineBreak {
                key: name.to_string(),
            });
        }
        let pattern = format!(r"(?m)^{}{DELIMITER}.*(?:\n|\z)", regex::escape(name));
        let line = Regex::new(&pattern).map_err(|source| SettingsError::Pattern {
            key: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            line,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for SettingKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SettingKey {}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One `key=value` pair to merge into settings text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingAssignment {
    key: SettingKey,
    value: String,
}

impl SettingAssignment {
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the value spans lines.
    pub fn new(key: &str, value: impl Into<String>) -> Result<Self, SettingsError> {
        let key = SettingKey::new(key)?;
        Self::with_key(key, value)
    }

    /// Pair an already validated key with a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value spans lines.
    pub fn with_key(key: SettingKey, value: impl Into<String>) -> Result<Self, SettingsError> {
        let value = value.into();
        if has_line_break(&value) {
            return Err(SettingsError::ValueContainsLineBreak {
                key: key.name.clone(),
            });
        }
        Ok(Self { key, value })
    }

    #[must_use]
    pub const fn key(&self) -> &SettingKey {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The full line written for this assignment, terminator included.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{}{DELIMITER}{}{LINE_ENDING}", self.key.name, self.value)
    }
}

impl std::fmt::Display for SettingAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{DELIMITER}{}", self.key.name, self.value)
    }
}

/// Whether an upsert replaced an existing line or appended a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpsertAction {
    Updated,
    Added,
}

/// Result of merging one assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub content: String,
    pub action: UpsertAction,
}

/// Merge one assignment, reporting whether it updated or appended.
#[must_use]
pub fn upsert(content: &str, assignment: &SettingAssignment) -> Upsert {
    let line = assignment.line();
    if let Some(found) = assignment.key.line.find(content) {
        let mut merged = String::with_capacity(content.len() + line.len());
        merged.push_str(&content[..found.start()]);
        merged.push_str(&line);
        merged.push_str(&content[found.end()..]);
        Upsert {
            content: merged,
            action: UpsertAction::Updated,
        }
    } else {
        // Appended as-is even when the existing text lacks a trailing newline.
        let mut merged = String::with_capacity(content.len() + line.len());
        merged.push_str(content);
        merged.push_str(&line);
        Upsert {
            content: merged,
            action: UpsertAction::Added,
        }
    }
}

/// Merge one assignment into `content`.
#[must_use]
pub fn apply(content: &str, assignment: &SettingAssignment) -> String {
    upsert(content, assignment).content
}

/// Merge assignments one after another, threading the content through.
///
/// Returns the merged text plus the action taken for each assignment, in
/// input order.
#[must_use]
pub fn apply_all(content: &str, assignments: &[SettingAssignment]) -> (String, Vec<UpsertAction>) {
    let mut merged = content.to_string();
    let mut actions = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let step = upsert(&merged, assignment);
        merged = step.content;
        actions.push(step.action);
    }
    (merged, actions)
}

/// Value of the first `key=` line, without its terminator.
#[must_use]
pub fn lookup<'a>(content: &'a str, key: &SettingKey) -> Option<&'a str> {
    let found = key.line.find(content)?;
    let line = found.as_str().trim_end_matches(['\n', '\r']);
    line.split_once(DELIMITER).map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(key: &str, value: &str) -> SettingAssignment {
        SettingAssignment::new(key, value).unwrap()
    }

    fn lines(content: &str) -> Vec<&str> {
        content.lines().collect()
    }

    #[test]
    fn empty_content_gets_single_line() {
        let merged = upsert("", &assign("K", "v"));
        assert_eq!(merged.content, format!("K=v{LINE_ENDING}"));
        assert_eq!(merged.action, UpsertAction::Added);
    }

    #[test]
    fn existing_line_replaced_in_place() {
        let content = "[ServerSettings]\nK=old\nOther=1\n";
        let merged = upsert(content, &assign("K", "new"));
        assert_eq!(merged.action, UpsertAction::Updated);
        assert_eq!(
            lines(&merged.content),
            vec!["[ServerSettings]", "K=new", "Other=1"]
        );
    }

    #[test]
    fn append_then_update_leaves_one_line() {
        let once = apply("A=1\n", &assign("K", "v1"));
        let twice = apply(&once, &assign("K", "v2"));
        let k_lines: Vec<&str> = twice.lines().filter(|l| l.starts_with("K=")).collect();
        assert_eq!(k_lines, vec!["K=v2"]);
    }

    #[test]
    fn replace_is_idempotent() {
        let content = "K=old\nB=2\n";
        let once = apply(content, &assign("K", "v"));
        let twice = apply(&once, &assign("K", "v"));
        assert_eq!(once, twice);
    }

    #[test]
    fn only_first_duplicate_is_replaced() {
        let content = "K=1\nK=2\n";
        let merged = apply(content, &assign("K", "3"));
        assert_eq!(lines(&merged), vec!["K=3", "K=2"]);
    }

    #[test]
    fn key_must_start_the_line() {
        let content = "XK=1\n# K=2\nKK=3\n";
        let merged = upsert(content, &assign("K", "v"));
        assert_eq!(merged.action, UpsertAction::Added);
        assert!(merged.content.starts_with(content));
    }

    #[test]
    fn key_is_matched_literally() {
        let content = "AxB=1\nA.B=2\n";
        let merged = apply(content, &assign("A.B", "9"));
        assert_eq!(lines(&merged), vec!["AxB=1", "A.B=9"]);
    }

    #[test]
    fn unterminated_tail_is_appended_after() {
        let merged = apply("A=1", &assign("K", "v"));
        assert_eq!(merged, format!("A=1K=v{LINE_ENDING}"));
    }

    #[test]
    fn unterminated_final_key_line_is_replaced() {
        let merged = upsert("A=1\nK=old", &assign("K", "new"));
        assert_eq!(merged.action, UpsertAction::Updated);
        assert_eq!(merged.content, format!("A=1\nK=new{LINE_ENDING}"));
    }

    #[test]
    fn crlf_line_is_replaced_whole() {
        let merged = apply("K=old\r\nB=2\r\n", &assign("K", "new"));
        assert_eq!(merged, format!("K=new{LINE_ENDING}B=2\r\n"));
    }

    #[test]
    fn empty_value_is_allowed() {
        let merged = apply("K=old\n", &assign("K", ""));
        assert_eq!(merged, format!("K={LINE_ENDING}"));
    }

    #[test]
    fn apply_all_reports_actions_in_order() {
        let assignments = vec![assign("A", "1"), assign("B", "2"), assign("C", "3")];
        let (merged, actions) = apply_all("B=0\n", &assignments);
        assert_eq!(
            actions,
            vec![
                UpsertAction::Added,
                UpsertAction::Updated,
                UpsertAction::Added
            ]
        );
        assert_eq!(lines(&merged), vec!["B=2", "A=1", "C=3"]);
    }

    #[test]
    fn lookup_reads_first_value() {
        let key = SettingKey::new("K").unwrap();
        assert_eq!(lookup("A=1\nK=x=y\r\nK=z\n", &key), Some("x=y"));
        assert_eq!(lookup("A=1\n", &key), None);
    }

    #[test]
    fn rejects_invalid_keys_and_values() {
        assert!(matches!(SettingKey::new(""), Err(SettingsError::EmptyKey)));
        assert!(matches!(
            SettingKey::new("A=B"),
            Err(SettingsError::KeyContainsDelimiter { .. })
        ));
        assert!(matches!(
            SettingKey::new("A\nB"),
            Err(SettingsError::KeyContainsLineBreak { .. })
        ));
        assert!(matches!(
            SettingAssignment::new("K", "one\ntwo"),
            Err(SettingsError::ValueContainsLineBreak { .. })
        ));
    }

    #[test]
    fn display_omits_terminator() {
        assert_eq!(assign("K", "v").to_string(), "K=v");
        assert_eq!(SettingKey::new("K").unwrap().to_string(), "K");
    }
}
