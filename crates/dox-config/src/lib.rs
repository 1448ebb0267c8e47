//! Configuration management for dox.
//!
//! Parses `dox.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. Directory
//! values support `~` expansion and are resolved relative to the config
//! file's directory (or the working directory when no file was found).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override docs content directory.
    pub docs_dir: Option<PathBuf>,
    /// Override development mode flag.
    pub dev: Option<bool>,
    /// Override live reload enabled flag.
    pub live_reload_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "dox.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site metadata.
    pub site: SiteConfig,
    /// Server configuration.
    pub server: ServerConfig,
    /// Docs configuration (paths are relative strings from TOML).
    docs: DocsConfigRaw,
    /// Blog configuration (paths are relative strings from TOML).
    blog: BlogConfigRaw,
    /// Versioned-docs configuration.
    versions: VersionsConfigRaw,
    /// Live reload configuration.
    pub live_reload: LiveReloadConfig,

    /// Resolved docs configuration (set after loading).
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// Resolved blog configuration (set after loading).
    #[serde(skip)]
    pub blog_resolved: BlogConfig,
    /// Resolved versions configuration (set after loading).
    #[serde(skip)]
    pub versions_resolved: VersionsConfig,
    /// Development mode: bypass caches and include draft posts.
    #[serde(skip)]
    pub dev: bool,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site metadata.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name, shown by the server in listings.
    pub name: String,
    /// Optional site description.
    pub description: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Documentation".to_owned(),
            description: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
        }
    }
}

/// Raw docs configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    dir: Option<String>,
    base_url: Option<String>,
    sidebar: SidebarConfigRaw,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SidebarConfigRaw {
    auto_sort: Option<bool>,
}

/// Resolved docs configuration with absolute paths.
#[derive(Debug, Clone, Default)]
pub struct DocsConfig {
    /// Root directory of the docs content tree.
    pub dir: PathBuf,
    /// URL prefix for generated doc links.
    pub base_url: String,
    /// Whether navigation leaves are sorted by front-matter order.
    pub auto_sort: bool,
}

/// Raw blog configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BlogConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    base_url: Option<String>,
}

/// Resolved blog configuration with absolute paths.
#[derive(Debug, Clone, Default)]
pub struct BlogConfig {
    /// Whether the blog content set is enabled.
    pub enabled: bool,
    /// Root directory of the blog content tree.
    pub dir: PathBuf,
    /// URL prefix for generated post links.
    pub base_url: String,
}

/// Raw versions configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct VersionsConfigRaw {
    enabled: Option<bool>,
    versions: Vec<VersionEntryRaw>,
}

#[derive(Debug, Deserialize)]
struct VersionEntryRaw {
    name: String,
    dir: String,
    #[serde(default)]
    is_default: bool,
}

/// Resolved versioned-docs configuration.
#[derive(Debug, Clone, Default)]
pub struct VersionsConfig {
    /// Whether versioned docs are enabled.
    pub enabled: bool,
    /// Known versions in declaration order.
    pub versions: Vec<VersionEntry>,
}

/// A single docs version.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    /// Version name used in lookups and URLs.
    pub name: String,
    /// Root directory of this version's content tree.
    pub dir: PathBuf,
    /// Whether this version is the default.
    pub is_default: bool,
}

impl VersionsConfig {
    /// Look up a version entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.name == name)
    }

    /// The default version, when one is marked.
    #[must_use]
    pub fn default_version(&self) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.is_default)
    }
}

/// Live reload configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Whether live reload is enabled.
    pub enabled: bool,
    /// Quiet window for coalescing file events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 100,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL prefix field to start with a slash and not end with one.
fn require_url_prefix(value: &str, field: &str) -> Result<(), ConfigError> {
    if !value.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must start with /"
        )));
    }
    if value.len() > 1 && value.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "{field} must not end with /"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `dox.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(docs_dir) = &settings.docs_dir {
            self.docs_resolved.dir.clone_from(docs_dir);
        }
        if let Some(dev) = settings.dev {
            self.dev = dev;
        }
        if let Some(live_reload_enabled) = settings.live_reload_enabled {
            self.live_reload.enabled = live_reload_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            server: ServerConfig::default(),
            docs: DocsConfigRaw::default(),
            blog: BlogConfigRaw::default(),
            versions: VersionsConfigRaw::default(),
            live_reload: LiveReloadConfig::default(),
            docs_resolved: DocsConfig {
                dir: base.join("docs"),
                base_url: "/docs".to_owned(),
                auto_sort: true,
            },
            blog_resolved: BlogConfig {
                enabled: false,
                dir: base.join("blog"),
                base_url: "/blog".to_owned(),
            },
            versions_resolved: VersionsConfig::default(),
            dev: false,
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        require_url_prefix(&self.docs_resolved.base_url, "docs.base_url")?;
        require_url_prefix(&self.blog_resolved.base_url, "blog.base_url")?;

        if self.versions_resolved.enabled {
            if self.versions_resolved.versions.is_empty() {
                return Err(ConfigError::Validation(
                    "[versions] enabled but no [[versions.versions]] entries".to_owned(),
                ));
            }
            for entry in &self.versions_resolved.versions {
                require_non_empty(&entry.name, "versions.versions.name")?;
            }
            let defaults = self
                .versions_resolved
                .versions
                .iter()
                .filter(|v| v.is_default)
                .count();
            if defaults > 1 {
                return Err(ConfigError::Validation(
                    "at most one version may set is_default".to_owned(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |dir: Option<&str>, default: &str| {
            let raw = dir.unwrap_or(default);
            let expanded = shellexpand::tilde(raw);
            config_dir.join(expanded.as_ref())
        };

        self.docs_resolved = DocsConfig {
            dir: resolve(self.docs.dir.as_deref(), "docs"),
            base_url: self
                .docs
                .base_url
                .clone()
                .unwrap_or_else(|| "/docs".to_owned()),
            auto_sort: self.docs.sidebar.auto_sort.unwrap_or(true),
        };

        self.blog_resolved = BlogConfig {
            enabled: self.blog.enabled.unwrap_or(false),
            dir: resolve(self.blog.dir.as_deref(), "blog"),
            base_url: self
                .blog
                .base_url
                .clone()
                .unwrap_or_else(|| "/blog".to_owned()),
        };

        self.versions_resolved = VersionsConfig {
            enabled: self.versions.enabled.unwrap_or(false),
            versions: self
                .versions
                .versions
                .iter()
                .map(|v| VersionEntry {
                    name: v.name.clone(),
                    dir: resolve(Some(&v.dir), "docs"),
                    is_default: v.is_default,
                })
                .collect(),
        };
    }
}
