use crate::net::RequestOptions;

const USER_AGENT_VAR: &str = "FRAGMENT_LOADER_USER_AGENT";
const BASE_URL_VAR: &str = "FRAGMENT_LOADER_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Base that path-only locations such as `/frag.html` resolve against.
    pub base_url: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            user_agent: concat!("fragment-loader/", env!("CARGO_PKG_VERSION")).to_string(),
            base_url: None,
        }
    }
}

impl LoaderConfig {
    /// Defaults, overridden by `FRAGMENT_LOADER_USER_AGENT` and
    /// `FRAGMENT_LOADER_BASE_URL` when set and non-empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(user_agent) = lookup(USER_AGENT_VAR).filter(|v| !v.is_empty()) {
            config.user_agent = user_agent;
        }
        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|v| !v.is_empty()) {
            config.base_url = Some(base_url);
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub(crate) fn request_options(&self) -> RequestOptions<'_> {
        RequestOptions {
            user_agent: &self.user_agent,
            base_url: self.base_url.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_names_crate() {
        assert!(LoaderConfig::default().user_agent.starts_with("fragment-loader/"));
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config = LoaderConfig::from_lookup(|key| match key {
            USER_AGENT_VAR => Some("probe/1".to_string()),
            BASE_URL_VAR => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.user_agent, "probe/1");
        assert_eq!(config.base_url, None);
    }
}
