pub mod distribution;
pub mod eligibility;
pub mod key_pool;
pub mod session;

pub use distribution::{order_comments, GiveawayRun, RunSummary};
pub use eligibility::{load_banned_list, Decision, EligibilityFilter, RejectReason, Screening};
pub use key_pool::KeyPool;
pub use session::{remaining_wait_minutes, SessionState, SessionStore};
