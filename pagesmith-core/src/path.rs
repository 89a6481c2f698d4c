use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Page path is empty")]
    Empty,
    #[error("Page path contains an invalid component: `{0}`")]
    InvalidComponent(String),
    #[error("Invalid file name: `{0}`")]
    InvalidName(String),
}

/// A relative, `/`-separated location under the uploads root.
///
/// Doubles as the routing key (`/page/<path>`) and the directory holding
/// the page's `index.html` and `schema.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath {
    components: Vec<String>,
}

impl PagePath {
    pub const INDEX: &'static str = "index";

    /// Components may not start with `.` (the scanner treats those as
    /// hidden) or carry whitespace at either end.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let normalized = raw.trim().replace('\\', "/");
        let mut components = Vec::new();

        for part in normalized.split('/') {
            if part.is_empty() {
                continue;
            }
            let valid = !part.starts_with('.')
                && part.trim() == part
                && !part.contains(['\0', ':']);
            if !valid {
                return Err(PathError::InvalidComponent(part.to_string()));
            }
            components.push(part.to_string());
        }

        if components.is_empty() {
            return Err(PathError::Empty);
        }

        Ok(Self { components })
    }

    /// Like [`PagePath::parse`], but an empty or missing path means the home page.
    pub fn parse_or_index(raw: Option<&str>) -> Result<Self, PathError> {
        match raw.map(str::trim) {
            None | Some("") | Some("/") => Ok(Self::index()),
            Some(raw) => Self::parse(raw),
        }
    }

    pub fn index() -> Self {
        Self {
            components: vec![Self::INDEX.to_string()],
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn name(&self) -> &str {
        // parse never yields an empty path
        self.components.last().map(String::as_str).unwrap_or(Self::INDEX)
    }

    pub fn to_fs_path<P: AsRef<Path>>(&self, root: P) -> PathBuf {
        let mut path = root.as_ref().to_path_buf();
        for component in &self.components {
            path.push(component);
        }
        path
    }

    pub fn url(&self) -> String {
        format!("/page/{}", self)
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("/"))
    }
}

impl std::str::FromStr for PagePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Name of an uploaded media file: exactly one plain path component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaName(String);

impl MediaName {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let name = raw.trim();
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0', ':']);

        if valid {
            Ok(Self(name.to_string()))
        } else {
            Err(PathError::InvalidName(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
