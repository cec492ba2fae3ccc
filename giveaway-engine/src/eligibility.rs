use chrono::{DateTime, Utc};
use giveaway_core::{AdmissionRules, AuthorProfile, Comment, CoreError, ResourceError};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

const SECONDS_PER_DAY: i64 = 86_400;

/// Load the banned-handle list, one handle per line, whitespace-stripped.
pub fn load_banned_list(path: &Path) -> Result<HashSet<String>, CoreError> {
    let contents = fs::read_to_string(path).map_err(|source| ResourceError::BanListUnreadable {
        path: path.display().to_string(),
        source,
    })?;

    let banned: HashSet<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    info!("Loaded {} banned users from {}", banned.len(), path.display());
    Ok(banned)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    DeletedAuthor,
    AlreadySeen,
    AlreadyChecked,
    KeywordMissing,
    Banned,
    TooNew { required_days: i64 },
    BelowAgeFloor { required_days: i64 },
    LowKarma { link_karma: i64, comment_karma: i64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DeletedAuthor => write!(f, "account was deleted"),
            RejectReason::AlreadySeen => write!(f, "was already evaluated this run"),
            RejectReason::AlreadyChecked => write!(f, "comment was already processed"),
            RejectReason::KeywordMissing => write!(f, "did not include the keyword"),
            RejectReason::Banned => write!(f, "is on the banned users list"),
            RejectReason::TooNew { required_days } => {
                write!(f, "is less than {} days old", required_days)
            }
            RejectReason::BelowAgeFloor { required_days } => {
                write!(f, "is below the {} day account-age floor", required_days)
            }
            RejectReason::LowKarma {
                link_karma,
                comment_karma,
            } => write!(
                f,
                "does not have enough karma. Post karma: {}, comment karma: {}",
                link_karma, comment_karma
            ),
        }
    }
}

/// Outcome of the cheap checks that need nothing but the comment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screening {
    /// Passed; fetch the author's profile and call [`EligibilityFilter::admit`].
    NeedsProfile(String),
    Skip(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Eligible,
    Rejected(RejectReason),
}

/// Multi-criteria admission filter with the run's dedupe state.
#[derive(Debug)]
pub struct EligibilityFilter {
    banned: HashSet<String>,
    seen_authors: HashSet<String>,
    checked_comments: HashSet<String>,
}

impl EligibilityFilter {
    pub fn new(banned: HashSet<String>) -> Self {
        Self {
            banned,
            seen_authors: HashSet::new(),
            checked_comments: HashSet::new(),
        }
    }

    /// First phase: deleted author, dedupe gates, keyword, ban list. The
    /// comment id is marked processed as soon as it passes the dedupe
    /// gates, whatever happens downstream, so later polls never revisit it.
    pub fn screen(&mut self, comment: &Comment, keyword: Option<&str>) -> Screening {
        let Some(author) = comment.author.as_deref() else {
            return Screening::Skip(RejectReason::DeletedAuthor);
        };

        if self.seen_authors.contains(author) {
            return Screening::Skip(RejectReason::AlreadySeen);
        }

        if !self.checked_comments.insert(comment.id.clone()) {
            return Screening::Skip(RejectReason::AlreadyChecked);
        }

        if let Some(keyword) = keyword {
            if !comment.body.contains(keyword) {
                return Screening::Skip(RejectReason::KeywordMissing);
            }
        }

        if self.banned.contains(author) {
            return Screening::Skip(RejectReason::Banned);
        }

        Screening::NeedsProfile(author.to_string())
    }

    /// Second phase: account age and karma thresholds against a freshly
    /// fetched profile. The author is marked seen before any threshold is
    /// compared, so one rejection here excludes that account for the rest
    /// of the run even if a later comment of theirs would pass.
    pub fn admit(
        &mut self,
        profile: &AuthorProfile,
        rules: &AdmissionRules,
        now: DateTime<Utc>,
    ) -> Decision {
        self.seen_authors.insert(profile.name.clone());

        let age_cutoff = now.timestamp() - rules.min_account_age_days * SECONDS_PER_DAY;
        if profile.created_utc > age_cutoff {
            return Decision::Rejected(RejectReason::TooNew {
                required_days: rules.min_account_age_days,
            });
        }

        if let Some(floor_days) = rules.account_age_floor_days {
            let floor_cutoff = now.timestamp() - floor_days * SECONDS_PER_DAY;
            if profile.created_utc > floor_cutoff {
                return Decision::Rejected(RejectReason::BelowAgeFloor {
                    required_days: floor_days,
                });
            }
        }

        let link_short = rules
            .min_link_karma
            .is_some_and(|min| profile.link_karma < min);
        let comment_short = rules
            .min_comment_karma
            .is_some_and(|min| profile.comment_karma < min);
        if link_short || comment_short {
            return Decision::Rejected(RejectReason::LowKarma {
                link_karma: profile.link_karma,
                comment_karma: profile.comment_karma,
            });
        }

        Decision::Eligible
    }

    pub fn seen_count(&self) -> usize {
        self.seen_authors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, author: Option<&str>, body: &str) -> Comment {
        Comment {
            id: id.to_string(),
            author: author.map(String::from),
            body: body.to_string(),
            created_utc: 0,
        }
    }

    fn profile(name: &str, created_utc: i64) -> AuthorProfile {
        AuthorProfile {
            name: name.to_string(),
            created_utc,
            link_karma: 50,
            comment_karma: 50,
        }
    }

    fn rules(min_days: i64) -> AdmissionRules {
        AdmissionRules {
            min_account_age_days: min_days,
            account_age_floor_days: None,
            min_link_karma: None,
            min_comment_karma: None,
        }
    }

    #[test]
    fn test_keyword_literal_substring() {
        let mut filter = EligibilityFilter::new(HashSet::new());

        let entering = comment("c1", Some("alpha"), "I want it xyzzy please");
        assert_eq!(
            filter.screen(&entering, Some("xyzzy")),
            Screening::NeedsProfile("alpha".to_string())
        );

        let missing = comment("c2", Some("beta"), "I want it");
        assert_eq!(
            filter.screen(&missing, Some("xyzzy")),
            Screening::Skip(RejectReason::KeywordMissing)
        );
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let shouting = comment("c1", Some("alpha"), "I want it XYZZY please");
        assert_eq!(
            filter.screen(&shouting, Some("xyzzy")),
            Screening::Skip(RejectReason::KeywordMissing)
        );
    }

    #[test]
    fn test_deleted_author_skipped_without_marks() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let deleted = comment("c1", None, "hello");
        assert_eq!(
            filter.screen(&deleted, None),
            Screening::Skip(RejectReason::DeletedAuthor)
        );
        // The comment id was never marked, so a later author-restored fetch
        // would still be considered.
        let restored = comment("c1", Some("alpha"), "hello");
        assert_eq!(
            filter.screen(&restored, None),
            Screening::NeedsProfile("alpha".to_string())
        );
    }

    #[test]
    fn test_comment_checked_exactly_once() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let entry = comment("c1", Some("alpha"), "no keyword here");

        // First pass marks the comment even though the keyword fails.
        assert_eq!(
            filter.screen(&entry, Some("xyzzy")),
            Screening::Skip(RejectReason::KeywordMissing)
        );
        assert_eq!(
            filter.screen(&entry, Some("xyzzy")),
            Screening::Skip(RejectReason::AlreadyChecked)
        );
    }

    #[test]
    fn test_banned_author_always_rejected() {
        let mut banned = HashSet::new();
        banned.insert("spammer".to_string());
        let mut filter = EligibilityFilter::new(banned);

        let entry = comment("c1", Some("spammer"), "pick me");
        assert_eq!(
            filter.screen(&entry, None),
            Screening::Skip(RejectReason::Banned)
        );
    }

    #[test]
    fn test_account_age_threshold() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();

        let two_days_old = profile("old_enough", now.timestamp() - 2 * SECONDS_PER_DAY);
        assert_eq!(
            filter.admit(&two_days_old, &rules(1), now),
            Decision::Eligible
        );

        let one_hour_old = profile("fresh", now.timestamp() - 3_600);
        assert_eq!(
            filter.admit(&one_hour_old, &rules(1), now),
            Decision::Rejected(RejectReason::TooNew { required_days: 1 })
        );
    }

    #[test]
    fn test_secondary_age_floor() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();
        let mut rules = rules(1);
        rules.account_age_floor_days = Some(30);

        let ten_days_old = profile("passing_min", now.timestamp() - 10 * SECONDS_PER_DAY);
        assert_eq!(
            filter.admit(&ten_days_old, &rules, now),
            Decision::Rejected(RejectReason::BelowAgeFloor { required_days: 30 })
        );
    }

    #[test]
    fn test_karma_thresholds_disabled_by_default() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();

        let mut zero_karma = profile("lurker", now.timestamp() - 400 * SECONDS_PER_DAY);
        zero_karma.link_karma = 0;
        zero_karma.comment_karma = 0;

        assert_eq!(filter.admit(&zero_karma, &rules(1), now), Decision::Eligible);
    }

    #[test]
    fn test_karma_thresholds_enforced_when_set() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();
        let mut rules = rules(1);
        rules.min_comment_karma = Some(100);

        let candidate = profile("quiet", now.timestamp() - 400 * SECONDS_PER_DAY);
        assert_eq!(
            filter.admit(&candidate, &rules, now),
            Decision::Rejected(RejectReason::LowKarma {
                link_karma: 50,
                comment_karma: 50
            })
        );
    }

    #[test]
    fn test_rejected_author_stays_seen() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();

        // Rejected for age on the first comment.
        let fresh = profile("alpha", now.timestamp() - 3_600);
        assert!(matches!(
            filter.admit(&fresh, &rules(1), now),
            Decision::Rejected(_)
        ));

        // A second, otherwise-fine comment from the same author is skipped
        // outright: one rejection excludes the account for the whole run.
        let later = comment("c2", Some("alpha"), "another try");
        assert_eq!(
            filter.screen(&later, None),
            Screening::Skip(RejectReason::AlreadySeen)
        );
    }

    #[test]
    fn test_winner_cannot_win_twice() {
        let mut filter = EligibilityFilter::new(HashSet::new());
        let now = Utc::now();

        let winner = profile("alpha", now.timestamp() - 400 * SECONDS_PER_DAY);
        assert_eq!(filter.admit(&winner, &rules(1), now), Decision::Eligible);

        let second_entry = comment("c2", Some("alpha"), "me again");
        assert_eq!(
            filter.screen(&second_entry, None),
            Screening::Skip(RejectReason::AlreadySeen)
        );
    }

    #[test]
    fn test_load_banned_list_missing_file() {
        let result = load_banned_list(Path::new("/nonexistent/banned.list"));
        assert!(matches!(
            result,
            Err(CoreError::Resource(ResourceError::BanListUnreadable { .. }))
        ));
    }
}
