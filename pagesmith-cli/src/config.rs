use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use pagesmith_server::CmsServerConfig;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, path::PathBuf};

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PagesmithConfig {
    pub server: ServerSettings,
    /// Site configuration (from pagesmith-core)
    #[serde(flatten)]
    pub site: pagesmith_core::config::Config,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    /// Root of the page tree
    pub uploads: String,
    /// Root for uploaded images and videos
    pub files: String,
    /// Theme directory
    pub theme: String,
    /// Configuration file path
    pub config: String,
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub body_limit: usize,
    /// Open browser automatically
    pub open: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let server = CmsServerConfig::default();
        Self {
            uploads: server.uploads.to_string_lossy().to_string(),
            files: server.files.to_string_lossy().to_string(),
            theme: server.theme.to_string_lossy().to_string(),
            config: "./pagesmith.toml".to_string(),
            host: server.host,
            port: server.port,
            body_limit: server.body_limit,
            open: server.open,
        }
    }
}

impl Default for PagesmithConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            site: pagesmith_core::config::Config::default(),
        }
    }
}

impl PagesmithConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (PAGESMITH_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        Self::load_with_env(args, Environment::with_prefix("PAGESMITH"))
    }

    fn load_with_env(args: &ArgMatches, env: Environment) -> Result<Self> {
        let config_file = arg::<String>(args, "config")
            .cloned()
            .unwrap_or_else(|| ServerSettings::default().config);

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        let defaults = Self::default();
        builder = builder.add_source(ConfigBuilder::try_from(&defaults)?);

        // 2. Add configuration file if it exists
        if Path::new(&config_file).exists() {
            tracing::debug!(file = %config_file, "reading configuration file");
            builder = builder.add_source(File::new(&config_file, FileFormat::Toml));
        }

        // 3. Add environment variables, double underscore for nested keys
        builder = builder.add_source(env.prefix_separator("_").separator("__"));

        // 4. Override with CLI arguments that are defined for this command
        let mut cli_overrides = HashMap::new();
        for key in ["uploads", "files", "theme", "config", "host"] {
            if let Some(value) = arg::<String>(args, key) {
                cli_overrides.insert(format!("server.{key}"), value.clone());
            }
        }
        if let Some(port) = arg::<u16>(args, "port") {
            cli_overrides.insert("server.port".to_string(), port.to_string());
        }
        if arg::<bool>(args, "open").copied().unwrap_or(false) {
            cli_overrides.insert("server.open".to_string(), "true".to_string());
        }

        if !cli_overrides.is_empty() {
            builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
        }

        let config: PagesmithConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    pub fn site(&self) -> pagesmith_core::config::SiteConfig {
        self.site.site.clone().unwrap_or_default()
    }

    /// Everything the HTTP server needs
    pub fn server_config(&self) -> CmsServerConfig {
        CmsServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            uploads: PathBuf::from(&self.server.uploads),
            files: PathBuf::from(&self.server.files),
            theme: PathBuf::from(&self.server.theme),
            site: self.site(),
            body_limit: self.server.body_limit,
            open: self.server.open,
        }
    }
}

/// An argument's value, or `None` when the command does not define it.
fn arg<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, id: &str) -> Option<&'a T> {
    args.try_get_one::<T>(id).unwrap_or(None)
}
