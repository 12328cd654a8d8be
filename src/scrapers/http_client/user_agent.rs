//! User agent selection for storefront sessions.

pub const USER_AGENT: &str = concat!("ozon-reviews/", env!("CARGO_PKG_VERSION"));

/// Config value that asks for browser user agents.
pub const IMPERSONATE: &str = "impersonate";

/// Desktop browsers the storefront serves its regular pages to.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 YaBrowser/24.12.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Which user agent each storefront session presents.
///
/// A session keeps one user agent for its whole lifetime so the cookies the
/// storefront hands out always come back with the agent they were issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAgentPolicy {
    /// This crate's own agent.
    Crate,
    /// Browser agents, a different one for each new session.
    Browser,
    Custom(String),
}

impl UserAgentPolicy {
    pub fn from_config(value: Option<&str>) -> Self {
        match value {
            None => Self::Crate,
            Some(IMPERSONATE) => Self::Browser,
            Some(custom) => Self::Custom(custom.to_string()),
        }
    }

    /// Agent for the `session`-th session opened by a client (0-based).
    pub fn for_session(&self, session: usize) -> &str {
        match self {
            Self::Crate => USER_AGENT,
            Self::Browser => BROWSER_USER_AGENTS[session % BROWSER_USER_AGENTS.len()],
            Self::Custom(agent) => agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        assert_eq!(UserAgentPolicy::from_config(None), UserAgentPolicy::Crate);
        assert_eq!(
            UserAgentPolicy::from_config(Some("impersonate")),
            UserAgentPolicy::Browser
        );
        assert_eq!(
            UserAgentPolicy::from_config(Some("MyBot/1.0")),
            UserAgentPolicy::Custom("MyBot/1.0".to_string())
        );
    }

    #[test]
    fn test_browser_agent_changes_per_session() {
        let policy = UserAgentPolicy::Browser;
        assert_ne!(policy.for_session(0), policy.for_session(1));
        assert_eq!(
            policy.for_session(0),
            policy.for_session(BROWSER_USER_AGENTS.len())
        );
        assert!(policy.for_session(2).starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_fixed_agents_ignore_session() {
        assert!(UserAgentPolicy::Crate.for_session(7).starts_with("ozon-reviews/"));
        let custom = UserAgentPolicy::Custom("MyBot/1.0".to_string());
        assert_eq!(custom.for_session(0), "MyBot/1.0");
        assert_eq!(custom.for_session(3), "MyBot/1.0");
    }
}
