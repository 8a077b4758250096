use home::home_dir;
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::{
    constant::{CONFIG_DIR, CONFIG_ENV, CONFIG_FILE, DEFAULT_API_BASE},
    PostboardError, PostboardResult,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PostboardConfig {
    /// Collection endpoint of the posts API.
    /// Example: http://127.0.0.1:5000/api/posts
    pub api_base: Url,
    /// Optional request timeout in seconds. Requests never time out
    /// unless this is set.
    pub timeout_secs: Option<u64>,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for PostboardConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("default api base is a valid url"),
            timeout_secs: None,
            user_agent: format!("postboard/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PostboardConfig {
    pub fn with_api_base(mut self, api_base: Url) -> Self {
        self.api_base = api_base;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Parse a config from TOML text. Missing keys fall back to defaults.
    pub fn from_toml(text: &str) -> PostboardResult<Self> {
        toml::from_str(text).map_err(|e| PostboardError::config_error(e.to_string()).into())
    }

    /// Load the config from `path`, or from the location named by
    /// `POSTBOARDCONF`, or from `~/.postboard/postboard.toml`.
    /// A missing default file yields the default config; a missing
    /// explicit file is an error.
    pub fn load(path: Option<PathBuf>) -> PostboardResult<Self> {
        let explicit = path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        let filepath = match explicit {
            Some(filepath) => {
                if !filepath.is_file() {
                    return Err(PostboardError::config_error(format!(
                        "{} does not exist or is not a file",
                        filepath.display()
                    ))
                    .into());
                }
                filepath
            }
            None => match default_config_path() {
                Some(filepath) if filepath.is_file() => filepath,
                _ => return Ok(Self::default()),
            },
        };

        tracing::debug!(path = %filepath.display(), "loading config");
        let text = std::fs::read_to_string(&filepath)?;
        Self::from_toml(&text)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}
