use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid page schema: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// What the editor saves and `schema.json` stores: `{"title": .., "schema": [..]}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageSchema {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub schema: Vec<Block>,
}

impl PageSchema {
    pub fn new<S: Into<String>>(title: S, schema: Vec<Block>) -> Self {
        Self {
            title: title.into(),
            schema,
        }
    }

    pub fn from_json(data: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Block {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Title,
    Text,
    Html,
    Formatted,
    Image,
    TwoImages,
    FourImages,
    Video,
    Youtube,
    Menu,
    Separation,
}

impl BlockKind {
    /// How many images a gallery block holds.
    pub fn image_slots(self) -> Option<usize> {
        match self {
            BlockKind::Image => Some(1),
            BlockKind::TwoImages => Some(2),
            BlockKind::FourImages => Some(4),
            _ => None,
        }
    }
}

impl Block {
    pub fn new<I: Into<String>>(id: I, kind: BlockKind, content: Value) -> Self {
        Self {
            id: id.into(),
            kind,
            content,
        }
    }

    /// The content as a string, or empty for anything else.
    pub fn text(&self) -> &str {
        self.content.as_str().unwrap_or_default()
    }

    /// Media sources: an array of strings, or a single string as one item.
    /// Blank entries are dropped.
    pub fn sources(&self) -> Vec<&str> {
        let items: Vec<&str> = match &self.content {
            Value::String(s) => vec![s.as_str()],
            Value::Array(values) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        items
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
