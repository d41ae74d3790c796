// secrets
use anyhow::Context;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use tracing::info;

pub static SECRET_MANAGER: Lazy<SecretManager> = Lazy::new(SecretManager::from_env);

enum MODE {
    DEV,
    PROD,
}

pub struct SecretManager {
    secrets: HashMap<String, String>,
}

impl SecretManager {
    fn from_env() -> Self {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::new(&vars)
    }

    fn new(vars: &HashMap<String, String>) -> Self {
        let var = |key: &str| vars.get(key).cloned().filter(|v| !v.is_empty());

        let mut secrets: HashMap<String, String> = HashMap::new();
        let mode = match var("MODE") {
            Some(mode) if mode.to_lowercase() == "prod" => MODE::PROD,
            _ => MODE::DEV,
        };
        match mode {
            MODE::DEV => {
                secrets.insert("MODE".to_string(), "dev".to_string());
                secrets.insert(
                    "HOST".to_string(),
                    var("HOST").unwrap_or("127.0.0.1".to_string()),
                );
            }
            MODE::PROD => {
                secrets.insert("MODE".to_string(), "prod".to_string());
                secrets.insert(
                    "HOST".to_string(),
                    var("HOST").unwrap_or("0.0.0.0".to_string()),
                );
            }
        }
        secrets.insert(
            "PORT".to_string(),
            var("PORT").unwrap_or("8000".to_string()),
        );

        // Extractor
        secrets.insert(
            "YTDLP_BIN".to_string(),
            var("YTDLP_BIN").unwrap_or("yt-dlp".to_string()),
        );
        secrets.insert(
            "YTDLP_TIMEOUT_SECS".to_string(),
            var("YTDLP_TIMEOUT_SECS").unwrap_or("30".to_string()),
        );

        // Proxy
        secrets.insert(
            "PROXY_CONNECT_TIMEOUT_SECS".to_string(),
            var("PROXY_CONNECT_TIMEOUT_SECS").unwrap_or("10".to_string()),
        );
        secrets.insert(
            "PROXY_ALLOWED_HOSTS".to_string(),
            var("PROXY_ALLOWED_HOSTS").unwrap_or_default(),
        );
        secrets.insert(
            "USER_AGENT".to_string(),
            var("USER_AGENT")
                .unwrap_or(format!("audio-relay/{}", env!("CARGO_PKG_VERSION"))),
        );

        // Log which keys are configured (NOT their values!)
        let mut configured: Vec<&str> = secrets
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        configured.sort_unstable();
        info!("Settings configured: {:?}", configured);

        SecretManager { secrets }
    }

    pub fn get(&self, key: &str) -> String {
        self.secrets.get(key).cloned().unwrap_or_default()
    }

    fn parse_secs(&self, key: &str) -> anyhow::Result<Duration> {
        let raw = self.get(key);
        let secs: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds, got {:?}", key, raw))?;
        anyhow::ensure!(secs > 0, "{} must be greater than zero", key);
        Ok(Duration::from_secs(secs))
    }
}

/// Typed view of the environment, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub ytdlp_bin: String,
    pub ytdlp_timeout: Duration,
    pub proxy_connect_timeout: Duration,
    pub proxy_allowed_hosts: Vec<String>,
    pub user_agent: String,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_secrets(&SECRET_MANAGER)
    }

    fn from_secrets(secrets: &SecretManager) -> anyhow::Result<Self> {
        let port_raw = secrets.get("PORT");
        let port: u16 = port_raw
            .trim()
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got {:?}", port_raw))?;

        let proxy_allowed_hosts = secrets
            .get("PROXY_ALLOWED_HOSTS")
            .split(',')
            .map(|h| h.trim().trim_start_matches('.').to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        Ok(Settings {
            host: secrets.get("HOST"),
            port,
            ytdlp_bin: secrets.get("YTDLP_BIN"),
            ytdlp_timeout: secrets.parse_secs("YTDLP_TIMEOUT_SECS")?,
            proxy_connect_timeout: secrets.parse_secs("PROXY_CONNECT_TIMEOUT_SECS")?,
            proxy_allowed_hosts,
            user_agent: secrets.get("USER_AGENT"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_secrets(&SecretManager::new(&vars))
    }

    #[test]
    fn dev_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr(), "127.0.0.1:8000");
        assert_eq!(s.ytdlp_bin, "yt-dlp");
        assert_eq!(s.ytdlp_timeout, Duration::from_secs(30));
        assert_eq!(s.proxy_connect_timeout, Duration::from_secs(10));
        assert!(s.proxy_allowed_hosts.is_empty());
        assert!(s.user_agent.starts_with("audio-relay/"));
    }

    #[test]
    fn prod_binds_all_interfaces() {
        let s = settings(&[("MODE", "PROD"), ("PORT", "9000")]).unwrap();
        assert_eq!(s.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn allowed_hosts_are_normalized() {
        let s = settings(&[("PROXY_ALLOWED_HOSTS", " GoogleVideo.com, .example.org ,,")]).unwrap();
        assert_eq!(s.proxy_allowed_hosts, vec!["googlevideo.com", "example.org"]);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(settings(&[("PORT", "eighty")]).is_err());
        assert!(settings(&[("YTDLP_TIMEOUT_SECS", "0")]).is_err());
        assert!(settings(&[("PROXY_CONNECT_TIMEOUT_SECS", "-1")]).is_err());
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let s = settings(&[("YTDLP_BIN", ""), ("PORT", "")]).unwrap();
        assert_eq!(s.ytdlp_bin, "yt-dlp");
        assert_eq!(s.port, 8000);
    }
}
