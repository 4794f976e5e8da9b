use crate::adapters::cloudflare::DEFAULT_BASE_URL;
use crate::core::reconcile::DEFAULT_CHUNK_SIZE;
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "gateway-sync.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub gateway: GatewayConfig,
    pub feeds: FeedsConfig,
    pub normalize: NormalizeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_base_url: String,
    /// 清單名稱，前綴為 `[AdBlock-<list_name>]`
    pub list_name: String,
    pub chunk_size: usize,
    pub timeout_seconds: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            list_name: "DNS Block List".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub block: Vec<String>,
    pub allow: Vec<String>,
    /// 每行一個 URL 的本地檔案
    pub block_file: Option<String>,
    pub allow_file: Option<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            block: Vec::new(),
            allow: Vec::new(),
            block_file: Some("lists.txt".to_string()),
            allow_file: Some("whitelists.txt".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub collapse_subdomains: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `compact` or `json`
    pub format: Option<String>,
    pub level: Option<String>,
}

/// Feed URLs after merging inline entries with URL files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFeeds {
    pub block: Vec<String>,
    pub allow: Vec<String>,
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Explicit path must exist; otherwise the default file is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => {
                tracing::debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                Ok(Self::default())
            }
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content)
            .map_err(|e| SyncError::config(format!("TOML parsing error: {}", e)))
    }

    /// 替換環境變數 (例如 ${FEED_URL})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern compiles"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Merges inline feed URLs with the URL files. A missing block file is an
    /// error only when no inline block URL is configured; a missing allow file
    /// means no allow feed.
    pub async fn resolve_feeds<S: Storage>(&self, storage: &S) -> Result<ResolvedFeeds> {
        let mut block = self.feeds.block.clone();
        let mut allow = self.feeds.allow.clone();

        if let Some(file) = &self.feeds.block_file {
            match read_url_file(storage, file).await {
                Ok(urls) => block.extend(urls),
                Err(e) if block.is_empty() => return Err(e),
                Err(e) => tracing::warn!("⚠️ Ignoring block feed file {}: {}", file, e),
            }
        }

        if let Some(file) = &self.feeds.allow_file {
            match read_url_file(storage, file).await {
                Ok(urls) => allow.extend(urls),
                Err(e) => tracing::debug!("No allow feed file {}: {}", file, e),
            }
        }

        if block.is_empty() {
            return Err(SyncError::MissingConfigError {
                field: "feeds.block".to_string(),
            });
        }
        for url in block.iter() {
            validation::validate_url("feeds.block", url)?;
        }
        for url in allow.iter() {
            validation::validate_url("feeds.allow", url)?;
        }

        Ok(ResolvedFeeds { block, allow })
    }

    pub fn wants_json_logs(&self) -> bool {
        self.logging.format.as_deref() == Some("json")
    }
}

async fn read_url_file<S: Storage>(storage: &S, path: &str) -> Result<Vec<String>> {
    let bytes = storage.read_file(path).await?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

impl ConfigProvider for SyncConfig {
    fn list_prefix(&self) -> String {
        format!("[AdBlock-{}]", self.gateway.list_name)
    }

    fn policy_name(&self) -> String {
        format!("{} Block Ads", self.list_prefix())
    }

    fn chunk_size(&self) -> usize {
        self.gateway.chunk_size
    }

    fn collapse_subdomains(&self) -> bool {
        self.normalize.collapse_subdomains
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("gateway.api_base_url", &self.gateway.api_base_url)?;
        validation::validate_non_empty_string("gateway.list_name", &self.gateway.list_name)?;
        validation::validate_range("gateway.chunk_size", self.gateway.chunk_size, 1, DEFAULT_CHUNK_SIZE)?;
        validation::validate_range("gateway.timeout_seconds", self.gateway.timeout_seconds, 1, 600)?;

        if let Some(file) = &self.feeds.block_file {
            validation::validate_path("feeds.block_file", file)?;
        }
        if let Some(file) = &self.feeds.allow_file {
            validation::validate_path("feeds.allow_file", file)?;
        }

        if let Some(format) = self.logging.format.as_deref() {
            if !["compact", "json"].contains(&format) {
                return Err(SyncError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_list_and_policy_names() {
        let config = SyncConfig::default();
        assert_eq!(config.list_prefix(), "[AdBlock-DNS Block List]");
        assert_eq!(config.policy_name(), "[AdBlock-DNS Block List] Block Ads");
        assert_eq!(config.chunk_size(), 1000);
        assert!(!config.collapse_subdomains());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[gateway]
list_name = "Home"
chunk_size = 500

[feeds]
block = ["https://example.com/hosts.txt"]
block_file = "custom-lists.txt"

[normalize]
collapse_subdomains = true
"#;

        let config = SyncConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.list_prefix(), "[AdBlock-Home]");
        assert_eq!(config.chunk_size(), 500);
        assert_eq!(config.gateway.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.feeds.block_file.as_deref(), Some("custom-lists.txt"));
        assert_eq!(config.feeds.allow_file.as_deref(), Some("whitelists.txt"));
        assert!(config.collapse_subdomains());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ADBLOCK_SYNC_TEST_FEED", "https://feeds.example.com/block.txt");

        let toml_content = r#"
[feeds]
block = ["${ADBLOCK_SYNC_TEST_FEED}"]
"#;

        let config = SyncConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.feeds.block, vec!["https://feeds.example.com/block.txt"]);

        std::env::remove_var("ADBLOCK_SYNC_TEST_FEED");
    }

    #[test]
    fn test_config_validation() {
        let too_big = SyncConfig::from_toml_str("[gateway]\nchunk_size = 5000\n").unwrap();
        assert!(too_big.validate().is_err());

        let bad_url = SyncConfig::from_toml_str("[gateway]\napi_base_url = \"not a url\"\n").unwrap();
        assert!(bad_url.validate().is_err());

        let bad_format = SyncConfig::from_toml_str("[logging]\nformat = \"xml\"\n").unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[gateway]\nlist_name = \"File Test\"\n")
            .unwrap();

        let config = SyncConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.gateway.list_name, "File Test");
        assert!(SyncConfig::load(Some(Path::new("/nonexistent/gateway-sync.toml"))).is_err());
    }

    #[tokio::test]
    async fn test_resolve_feeds_reads_url_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("lists.txt"),
            "# ads\nhttps://a.example.com/hosts\n\nhttps://b.example.com/hosts\n",
        )
        .unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());

        let feeds = SyncConfig::default().resolve_feeds(&storage).await.unwrap();

        assert_eq!(
            feeds.block,
            vec!["https://a.example.com/hosts", "https://b.example.com/hosts"]
        );
        assert!(feeds.allow.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_feeds_requires_a_block_feed() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());

        let result = SyncConfig::default().resolve_feeds(&storage).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resolve_feeds_rejects_non_http_urls() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap());
        let mut config = SyncConfig::default();
        config.feeds.block = vec!["ftp://example.com/hosts".to_string()];

        let result = config.resolve_feeds(&storage).await;

        assert!(matches!(result, Err(SyncError::InvalidConfigValueError { .. })));
    }
}
