use serde::{Deserialize, Serialize};

/// The `[site]` table of `pagesmith.toml`. The CLI loads the file and
/// flattens this struct into its own configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub site: Option<SiteConfig>,
}

/// Site-wide values handed to the page template as `site`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: Option<String>,
    pub tagline: Option<String>,
}
