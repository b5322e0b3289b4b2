//! Group governance: per-group rules, mention detection, the routing
//! decision for each group message, and the timed self-pause.

pub mod governor;
pub mod mention;
pub mod pause;
pub mod rules;


pub use governor::{DropReason, GroupGovernor, ReplyPermit, Verdict};
pub use mention::MentionDetector;
pub use pause::{PauseRequest, PauseScheduler};
pub use rules::{GroupRules, RuleDefaults, RuleStore, SharedRules};
