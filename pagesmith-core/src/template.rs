use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::config::SiteConfig;
use crate::render::render_blocks;
use crate::scanner::{Structure, navigation};
use crate::schema::PageSchema;

/// Name a theme uses to override the page layout.
pub const PAGE_TEMPLATE: &str = "page.html";

const DEFAULT_PAGE_TEMPLATE: &str = include_str!("../templates/page.html");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Tera(#[from] tera::Error),
}

pub struct PageRenderer {
    tera: Tera,
    context: Context,
}

impl PageRenderer {
    /// Use `<theme_dir>/page.html` when present, the built-in layout otherwise.
    pub fn new<P: AsRef<Path>>(theme_dir: P) -> Result<Self, TemplateError> {
        let theme_page = theme_dir.as_ref().join(PAGE_TEMPLATE);

        let mut tera = Tera::default();
        if theme_page.is_file() {
            tracing::info!(template = %theme_page.display(), "using theme page template");
            tera.add_template_file(&theme_page, Some(PAGE_TEMPLATE))?;
        } else {
            tera.add_raw_template(PAGE_TEMPLATE, DEFAULT_PAGE_TEMPLATE)?;
        }

        Ok(Self::from_tera(tera))
    }

    pub fn builtin() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, DEFAULT_PAGE_TEMPLATE)?;

        Ok(Self::from_tera(tera))
    }

    fn from_tera(tera: Tera) -> Self {
        let mut renderer = Self {
            tera,
            context: Context::new(),
        };
        renderer.add_to_context("site", &SiteConfig::default());
        renderer
    }

    pub fn with_site(mut self, site: &SiteConfig) -> Self {
        self.add_to_context("site", site);
        self
    }

    /// Add a value shared by every rendered page
    pub fn add_to_context<T: Serialize>(&mut self, key: &str, value: &T) {
        self.context.insert(key, value);
    }

    /// Render a complete HTML document for a page.
    pub fn render_document(
        &self,
        schema: &PageSchema,
        structure: &Structure,
    ) -> Result<String, TemplateError> {
        let mut context = self.context.clone();
        context.insert("title", &schema.title);
        context.insert("content", &render_blocks(&schema.schema, structure));
        context.insert("navigation", &navigation(structure, None));

        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }
}
