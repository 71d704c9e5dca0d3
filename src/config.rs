use anyhow::{Context, bail};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8888";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    /// `false` sends through the blocking `/chat` endpoint instead of the stream.
    pub streaming: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("AGENTDASH_API_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            bail!("AGENTDASH_API_URL must be an http(s) URL, got {api_url:?}");
        }

        let token = lookup("AGENTDASH_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let streaming = match lookup("AGENTDASH_STREAMING") {
            None => true,
            Some(value) => parse_flag(&value)
                .with_context(|| format!("invalid AGENTDASH_STREAMING value {value:?}"))?,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            streaming,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got {other:?}"),
    }
}
