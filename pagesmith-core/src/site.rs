use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub text: String,
    pub link: String,
}

/// A page as served back to the site frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPage {
    pub title: String,
    pub content: String,
}
