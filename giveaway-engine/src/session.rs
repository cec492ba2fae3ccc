use chrono::{DateTime, Utc};
use giveaway_core::{CoreError, ResourceError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Every field is written as this literal string when no session is active,
/// keeping the file schema stable between runs.
const NULL_SENTINEL: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    target: String,
    submission_url: String,
    wait_minutes: String,
    time_posted: String,
    keyword: String,
    keyfile_path: String,
}

impl RawSession {
    fn empty() -> Self {
        Self {
            target: NULL_SENTINEL.to_string(),
            submission_url: NULL_SENTINEL.to_string(),
            wait_minutes: NULL_SENTINEL.to_string(),
            time_posted: NULL_SENTINEL.to_string(),
            keyword: NULL_SENTINEL.to_string(),
            keyfile_path: NULL_SENTINEL.to_string(),
        }
    }
}

/// Durable record of an in-progress giveaway, enough to resume after an
/// interruption.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Subreddit the submission was posted to; empty when the run attached
    /// to an existing submission by URL.
    pub target: String,
    pub submission_url: String,
    pub wait_minutes: i64,
    pub time_posted: DateTime<Utc>,
    pub keyword: Option<String>,
    pub keyfile_path: PathBuf,
}

/// Reads and writes the session resource.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the active session, if any. A missing file or a sentinel
    /// submission URL both mean there is nothing to resume.
    pub fn load(&self) -> Result<Option<SessionState>, CoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ResourceError::SessionUnreadable {
                    path: self.path.display().to_string(),
                    source,
                }
                .into())
            }
        };

        let raw: RawSession =
            toml::from_str(&contents).map_err(|e| ResourceError::SessionMalformed {
                path: self.path.display().to_string(),
                details: e.to_string(),
            })?;

        if raw.submission_url == NULL_SENTINEL {
            return Ok(None);
        }

        let malformed = |details: String| ResourceError::SessionMalformed {
            path: self.path.display().to_string(),
            details,
        };

        let wait_minutes = raw
            .wait_minutes
            .parse::<i64>()
            .map_err(|e| malformed(format!("waitMinutes: {e}")))?;
        let time_posted = DateTime::parse_from_rfc3339(&raw.time_posted)
            .map_err(|e| malformed(format!("timePosted: {e}")))?
            .with_timezone(&Utc);

        let target = if raw.target == NULL_SENTINEL {
            String::new()
        } else {
            raw.target
        };
        let keyword = if raw.keyword == NULL_SENTINEL || raw.keyword.is_empty() {
            None
        } else {
            Some(raw.keyword)
        };

        Ok(Some(SessionState {
            target,
            submission_url: raw.submission_url,
            wait_minutes,
            time_posted,
            keyword,
            keyfile_path: PathBuf::from(raw.keyfile_path),
        }))
    }

    pub fn save(&self, state: &SessionState) -> Result<(), CoreError> {
        let raw = RawSession {
            target: if state.target.is_empty() {
                NULL_SENTINEL.to_string()
            } else {
                state.target.clone()
            },
            submission_url: state.submission_url.clone(),
            wait_minutes: state.wait_minutes.to_string(),
            time_posted: state.time_posted.to_rfc3339(),
            keyword: state
                .keyword
                .clone()
                .unwrap_or_else(|| NULL_SENTINEL.to_string()),
            keyfile_path: state.keyfile_path.display().to_string(),
        };
        self.write_raw(&raw)
    }

    /// Reset every field to the sentinel. The file stays on disk so the
    /// schema is in place for the next run.
    pub fn clear(&self) -> Result<(), CoreError> {
        info!("Erasing session state in {}", self.path.display());
        self.write_raw(&RawSession::empty())
    }

    fn write_raw(&self, raw: &RawSession) -> Result<(), CoreError> {
        let contents = toml::to_string(raw).expect("session state serializes to TOML");
        fs::write(&self.path, contents).map_err(|source| ResourceError::SessionUnwritable {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!("Session state written to {}", self.path.display());
        Ok(())
    }
}

/// Wait time left after subtracting the minutes elapsed since the session
/// was persisted, clamped at zero in both directions.
pub fn remaining_wait_minutes(
    original: i64,
    posted: DateTime<Utc>,
    now: DateTime<Utc>,
) -> i64 {
    let elapsed = (now - posted).num_minutes().max(0);
    (original - elapsed).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn sample_state() -> SessionState {
        SessionState {
            target: "tinkertown".to_string(),
            submission_url: "https://redd.it/abc123".to_string(),
            wait_minutes: 100,
            time_posted: Utc::now(),
            keyword: Some("xyzzy".to_string()),
            keyfile_path: PathBuf::from("keyfile.txt"),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("resume.toml"));

        let state = sample_state();
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.target, "tinkertown");
        assert_eq!(loaded.submission_url, "https://redd.it/abc123");
        assert_eq!(loaded.wait_minutes, 100);
        assert_eq!(loaded.keyword.as_deref(), Some("xyzzy"));
        assert_eq!(loaded.keyfile_path, PathBuf::from("keyfile.txt"));
        // RFC 3339 round trip keeps sub-minute precision.
        assert!((loaded.time_posted - state.time_posted).num_seconds().abs() <= 1);
    }

    #[test]
    fn test_missing_file_means_no_session() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("resume.toml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear_writes_sentinels() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("resume.toml"));

        store.save(&sample_state()).unwrap();
        store.clear().unwrap();

        // The file still exists but no session is active.
        assert!(store.path().exists());
        assert!(store.load().unwrap().is_none());

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("submissionUrl = \"null\""));
        assert!(contents.contains("keyfilePath = \"null\""));
    }

    #[test]
    fn test_no_keyword_round_trips_as_sentinel() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("resume.toml"));

        let mut state = sample_state();
        state.keyword = None;
        state.target = String::new();
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.keyword, None);
        assert_eq!(loaded.target, "");
    }

    #[test]
    fn test_malformed_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume.toml");
        fs::write(&path, "this is not a session file").unwrap();

        let store = SessionStore::new(path);
        assert!(matches!(
            store.load(),
            Err(CoreError::Resource(ResourceError::SessionMalformed { .. }))
        ));
    }

    #[test]
    fn test_remaining_wait_subtracts_elapsed() {
        let posted = Utc::now();
        let now = posted + Duration::minutes(20);
        assert_eq!(remaining_wait_minutes(100, posted, now), 80);
    }

    #[test]
    fn test_remaining_wait_clamps_at_zero() {
        let posted = Utc::now();
        let now = posted + Duration::minutes(500);
        assert_eq!(remaining_wait_minutes(100, posted, now), 0);
    }

    #[test]
    fn test_remaining_wait_ignores_clock_skew() {
        let posted = Utc::now();
        let now = posted - Duration::minutes(5);
        assert_eq!(remaining_wait_minutes(100, posted, now), 100);
    }
}
