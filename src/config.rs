//! Advisor configuration from environment variables

use std::env;
use std::time::Duration;

use crate::advisor::Command;

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Keys bound to the two continuous-mode actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBindings {
    pub toggle: char,
    pub trigger: char,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle: 'q',
            trigger: 'w',
        }
    }
}

impl KeyBindings {
    /// Command for a key press, if the key is bound.
    pub fn command_for(&self, key: char) -> Option<Command> {
        if key == self.toggle {
            Some(Command::Toggle)
        } else if key == self.trigger {
            Some(Command::Trigger)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdvisorConfig {
    /// Base URL of the advisory service
    pub service_url: String,

    /// Per-request timeout. `None` lets a request wait indefinitely.
    pub request_timeout: Option<Duration>,

    pub user_agent: String,

    pub keys: KeyBindings,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: None,
            user_agent: concat!("move-advisor/", env!("CARGO_PKG_VERSION")).to_string(),
            keys: KeyBindings::default(),
        }
    }
}

impl AdvisorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or unparseable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let service_url = lookup("ADVISOR_SERVICE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.service_url);

        let request_timeout = lookup("ADVISOR_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let user_agent = lookup("ADVISOR_USER_AGENT").unwrap_or(defaults.user_agent);

        let keys = KeyBindings {
            toggle: lookup("ADVISOR_TOGGLE_KEY")
                .and_then(|v| single_char(&v))
                .unwrap_or(defaults.keys.toggle),
            trigger: lookup("ADVISOR_TRIGGER_KEY")
                .and_then(|v| single_char(&v))
                .unwrap_or(defaults.keys.trigger),
        };

        Self {
            service_url,
            request_timeout,
            user_agent,
            keys,
        }
    }
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
