//! Per-group rule sets, created lazily and shared by identity.

use chrono::{DateTime, Duration, Utc};
use ducker_core::{clock::Clock, config::GovernanceConfig, message::normalize_id};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Governance state for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRules {
    pub group_id: String,
    /// Empty means everyone is allowed.
    pub allowed_users: HashSet<String>,
    /// Checked before `allowed_users`.
    pub blocked_users: HashSet<String>,
    pub ai_enabled: bool,
    pub max_history_messages: usize,
    pub require_mention: bool,
    pub custom_prompt: Option<String>,
    pub response_cooldown_secs: u64,
    pub last_response_at: DateTime<Utc>,
    pub paused: bool,
    /// Only meaningful while `paused`.
    pub paused_until: Option<DateTime<Utc>>,
    /// An AI reply has been admitted and not yet sent or abandoned.
    pub(crate) reply_in_flight: bool,
}

/// Outcome of the pause check on an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    Active,
    Paused,
}

impl GroupRules {
    /// Whether `sender` may trigger AI replies. Blocks win over allows.
    pub fn is_permitted(&self, sender: &str) -> bool {
        let sender = normalize_id(sender);
        let listed = |set: &HashSet<String>| set.iter().any(|u| normalize_id(u) == sender);
        if listed(&self.blocked_users) {
            return false;
        }
        self.allowed_users.is_empty() || listed(&self.allowed_users)
    }

    /// Strictly more than the cooldown has elapsed since the last reply.
    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        let cooldown = Duration::seconds(self.response_cooldown_secs as i64);
        now - self.last_response_at > cooldown
    }

    /// Pause check with lazy expiry: an expired pause is lifted here.
    pub fn check_pause(&mut self, now: DateTime<Utc>) -> PauseState {
        if !self.paused {
            return PauseState::Active;
        }
        match self.paused_until {
            Some(until) if now >= until => {
                self.unpause();
                info!("group {} pause expired, reactivated", self.group_id);
                PauseState::Active
            }
            _ => PauseState::Paused,
        }
    }

    pub fn pause_until(&mut self, until: DateTime<Utc>) {
        self.paused = true;
        self.paused_until = Some(until);
    }

    pub fn unpause(&mut self) {
        self.paused = false;
        self.paused_until = None;
    }

    /// Whole minutes left in the pause, rounded up, at least 1.
    pub fn remaining_pause_minutes(&self, now: DateTime<Utc>) -> i64 {
        let secs = self
            .paused_until
            .map(|until| (until - now).num_seconds())
            .unwrap_or_default();
        ((secs + 59) / 60).max(1)
    }
}

/// Defaults applied to lazily created rule sets.
#[derive(Debug, Clone)]
pub struct RuleDefaults {
    pub ai_enabled: bool,
    pub require_mention: bool,
    pub max_history_messages: usize,
    pub response_cooldown_secs: u64,
}

impl From<&GovernanceConfig> for RuleDefaults {
    fn from(cfg: &GovernanceConfig) -> Self {
        Self {
            ai_enabled: cfg.ai_enabled,
            require_mention: cfg.require_mention,
            max_history_messages: cfg.max_history_messages,
            response_cooldown_secs: cfg.response_cooldown_secs.max(1),
        }
    }
}

pub type SharedRules = Arc<Mutex<GroupRules>>;

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory registry of group rules.
///
/// The map lock is held only to find or create an entry. Each entry has its
/// own lock, so read-check-write sequences on one group never block another.
/// Nothing is persisted: a restart starts every group from the defaults.
pub struct RuleStore {
    defaults: RuleDefaults,
    clock: Arc<dyn Clock>,
    groups: Mutex<HashMap<String, SharedRules>>,
}

impl RuleStore {
    pub fn new(defaults: RuleDefaults, clock: Arc<dyn Clock>) -> Self {
        Self {
            defaults,
            clock,
            groups: Mutex::new(HashMap::new()),
        }
    }

    fn fresh(&self, group_id: &str) -> GroupRules {
        let now = self.clock.now();
        GroupRules {
            group_id: group_id.to_string(),
            allowed_users: HashSet::new(),
            blocked_users: HashSet::new(),
            ai_enabled: self.defaults.ai_enabled,
            max_history_messages: self.defaults.max_history_messages,
            require_mention: self.defaults.require_mention,
            custom_prompt: None,
            response_cooldown_secs: self.defaults.response_cooldown_secs,
            // Far enough back that the first message may be answered.
            last_response_at: now
                - Duration::seconds(self.defaults.response_cooldown_secs as i64)
                - Duration::minutes(1),
            paused: false,
            paused_until: None,
            reply_in_flight: false,
        }
    }

    /// The shared record for `group_id`, created with defaults if absent.
    /// Every call for the same key returns the same record.
    pub fn get(&self, group_id: &str) -> SharedRules {
        let mut groups = lock(&self.groups);
        if let Some(rules) = groups.get(group_id) {
            return Arc::clone(rules);
        }
        let rules = Arc::new(Mutex::new(self.fresh(group_id)));
        groups.insert(group_id.to_string(), Arc::clone(&rules));
        rules
    }

    /// Replace the record for `group_id` wholesale. The stored `group_id`
    /// is forced to the key, and holders of the shared record see the change.
    pub fn set(&self, group_id: &str, mut rules: GroupRules) {
        rules.group_id = group_id.to_string();
        let shared = self.get(group_id);
        let mut current = lock(&shared);
        rules.reply_in_flight = current.reply_in_flight;
        *current = rules;
    }

    /// Copy of the current record.
    pub fn snapshot(&self, group_id: &str) -> GroupRules {
        lock(&self.get(group_id)).clone()
    }

    /// Run `f` with exclusive access to the group's record.
    pub fn update<R>(&self, group_id: &str, f: impl FnOnce(&mut GroupRules) -> R) -> R {
        let shared = self.get(group_id);
        let mut rules = lock(&shared);
        f(&mut rules)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- Admin setters ---

    pub fn enable_ai(&self, group_id: &str) {
        self.update(group_id, |r| r.ai_enabled = true);
    }

    pub fn disable_ai(&self, group_id: &str) {
        self.update(group_id, |r| r.ai_enabled = false);
    }

    pub fn allow_user(&self, group_id: &str, user: &str) {
        self.update(group_id, |r| r.allowed_users.insert(normalize_id(user)));
    }

    pub fn disallow_user(&self, group_id: &str, user: &str) {
        let user = normalize_id(user);
        self.update(group_id, |r| r.allowed_users.retain(|u| normalize_id(u) != user));
    }

    pub fn block_user(&self, group_id: &str, user: &str) {
        self.update(group_id, |r| r.blocked_users.insert(normalize_id(user)));
    }

    pub fn unblock_user(&self, group_id: &str, user: &str) {
        let user = normalize_id(user);
        self.update(group_id, |r| r.blocked_users.retain(|u| normalize_id(u) != user));
    }

    /// Set or clear (with an empty string) the group's custom prompt.
    pub fn set_custom_prompt(&self, group_id: &str, prompt: &str) {
        let prompt = prompt.trim();
        self.update(group_id, |r| {
            r.custom_prompt = (!prompt.is_empty()).then(|| prompt.to_string())
        });
    }

    /// Pause for `duration` starting now. Returns the expiry.
    pub fn pause_for(&self, group_id: &str, duration: std::time::Duration) -> DateTime<Utc> {
        let until = self.now() + Duration::from_std(duration).unwrap_or_else(|_| Duration::zero());
        self.update(group_id, |r| r.pause_until(until));
        info!("group {group_id} paused until {until}");
        until
    }

    /// Lift the pause flag only. `PauseScheduler::cancel` also stops a
    /// running sequence.
    pub(crate) fn unpause(&self, group_id: &str) {
        self.update(group_id, GroupRules::unpause);
        info!("group {group_id} unpaused");
    }
}
