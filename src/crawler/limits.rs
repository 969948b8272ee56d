//! Rate-limit policy: which group a URL belongs to and how that group is paced

use crate::config::{DefaultLimitConfig, LimitConfig, RequestConfig};
use crate::url::{glob_matches, host_key};
use rand::Rng;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Parallelism and spacing of one domain-glob group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitRule {
    /// Host glob; `None` for the default group
    pub glob: Option<String>,

    /// Maximum concurrent requests (0 = unlimited)
    pub parallelism: usize,

    /// Minimum spacing between two dispatches
    pub delay: Duration,

    /// Upper bound of the random extra spacing
    pub jitter: Duration,
}

impl LimitRule {
    fn from_config(config: &LimitConfig) -> Self {
        Self {
            glob: Some(config.domain_glob.clone()),
            parallelism: config.parallelism,
            delay: Duration::from_millis(config.delay_in_ms),
            jitter: Duration::from_millis(config.random_delay_in_ms),
        }
    }

    fn default_from(config: &DefaultLimitConfig) -> Self {
        Self {
            glob: None,
            parallelism: config.parallelism,
            delay: Duration::from_millis(config.delay_in_ms),
            jitter: Duration::from_millis(config.random_delay_in_ms),
        }
    }

    /// Checks if the rule's glob matches a host key
    pub fn matches(&self, host: &str) -> bool {
        self.glob
            .as_deref()
            .is_some_and(|glob| glob_matches(glob, host))
    }

    /// Draws the spacing that must follow a dispatch: `delay + U(0, jitter)`
    pub fn roll_gap(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let jitter_ms = self.jitter.as_millis() as u64;
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

impl fmt::Display for LimitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parallelism = match self.parallelism {
            0 => "unlimited".to_string(),
            n => n.to_string(),
        };
        write!(
            f,
            "{} (parallelism {}, delay {:?}, jitter {:?})",
            self.glob.as_deref().unwrap_or("<default>"),
            parallelism,
            self.delay,
            self.jitter
        )
    }
}

/// Every limit rule of a run, in matching order, plus the default
///
/// Groups are identified by index: `0..rules.len()` for configured rules and
/// `rules.len()` for the default group.
#[derive(Debug, Clone)]
pub struct Limits {
    rules: Vec<LimitRule>,
    default: LimitRule,
}

impl Limits {
    /// Builds the limits from the request configuration
    ///
    /// The inline `domainGlob` rule (if any) is matched first, followed by
    /// the entries of `limits` in order.
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            rules: config.limit_rules().iter().map(LimitRule::from_config).collect(),
            default: LimitRule::default_from(&config.default_limit),
        }
    }

    /// Limits with no rules and the given default
    pub fn with_default(parallelism: usize, delay: Duration) -> Self {
        Self {
            rules: Vec::new(),
            default: LimitRule {
                glob: None,
                parallelism,
                delay,
                jitter: Duration::ZERO,
            },
        }
    }

    /// Adds a rule after the existing ones
    pub fn push_rule(&mut self, rule: LimitRule) {
        self.rules.push(rule);
    }

    /// Returns the group of a URL: the first rule whose glob matches its host
    pub fn group_for(&self, url: &Url) -> usize {
        host_key(url)
            .and_then(|host| self.rules.iter().position(|rule| rule.matches(&host)))
            .unwrap_or(self.rules.len())
    }

    /// Returns the rule of a group
    pub fn rule(&self, group: usize) -> &LimitRule {
        self.rules.get(group).unwrap_or(&self.default)
    }

    /// Configured rules, without the default
    pub fn rules(&self) -> &[LimitRule] {
        &self.rules
    }

    /// Rule applied to hosts that match no configured rule
    pub fn default_rule(&self) -> &LimitRule {
        &self.default
    }

    /// Number of groups, including the default group
    pub fn group_count(&self) -> usize {
        self.rules.len() + 1
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::with_default(0, Duration::ZERO)
    }
}
