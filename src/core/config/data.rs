use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the temple backend listens when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Environment variable overriding the configured server.
pub const SERVER_URL_ENV: &str = "QIUQIAN_SERVER_URL";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the temple backend, e.g. `http://127.0.0.1:8000`
    pub server_url: Option<String>,
    /// Upper bound on a whole request, including a streamed chat reply
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Pick the backend URL: command-line flag, then environment, then the
    /// config file, then the built-in default.
    pub fn resolve_server_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
        [flag, env, self.server_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        match &self.server_url {
            Some(url) => println!("  server-url: {url}"),
            None => println!("  server-url: (unset, using {DEFAULT_SERVER_URL})"),
        }
        match self.request_timeout_secs {
            Some(secs) => println!("  request-timeout-secs: {secs}"),
            None => println!("  request-timeout-secs: (unset, using {DEFAULT_REQUEST_TIMEOUT_SECS})"),
        }
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
