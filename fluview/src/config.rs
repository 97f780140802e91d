use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base address of the Epidata API; the endpoint name is appended as a path segment.
    pub base_url: String,
    /// Per-request timeout. No timeout is applied when unset.
    pub timeout_secs: Option<u64>,
    /// API key sent as the `auth` parameter unless a request already carries one.
    pub auth: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "https://api.delphi.cmu.edu/epidata".into(),
            timeout_secs: None,
            auth: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_should_fill_defaults() {
        let config: Config = serde_json::from_str(r#"{"timeout_secs": 30}"#).unwrap();
        assert_eq!(config.base_url, Config::default().base_url);
        assert_eq!(config.timeout_secs, Some(30));
        assert!(config.auth.is_none());
    }
}
