use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::path::{PagePath, PathError};
use crate::scanner::{ScanError, Structure, StructureScanner};
use crate::schema::{PageSchema, SchemaError};
use crate::site::StoredPage;
use crate::template::{PageRenderer, TemplateError};

pub const PAGE_HTML: &str = "index.html";
pub const PAGE_SCHEMA: &str = "schema.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Page not found: {0}")]
    NotFound(PagePath),
    #[error("Page already exists: {0}")]
    AlreadyExists(PagePath),
    #[error("Cannot move `{from}` inside itself (`{to}`)")]
    IntoItself { from: PagePath, to: PagePath },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pages on disk: `<root>/<page path>/{index.html,schema.json}`.
pub struct PageStore {
    root: PathBuf,
    renderer: PageRenderer,
}

impl PageStore {
    pub fn new<P: AsRef<Path>>(root: P, renderer: PageRenderer) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            renderer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn structure(&self) -> Result<Structure, ScanError> {
        StructureScanner::new(&self.root).scan()
    }

    /// Write a page, replacing whatever was stored at `path`.
    pub fn create(&self, path: &PagePath, schema: &PageSchema) -> Result<(), StoreError> {
        let dir = path.to_fs_path(&self.root);
        fs::create_dir_all(&dir)?;
        self.write_page(&dir, schema)?;

        tracing::info!(page = %path, blocks = schema.schema.len(), "created page");
        Ok(())
    }

    pub fn edit(&self, path: &PagePath, schema: &PageSchema) -> Result<(), StoreError> {
        let dir = path.to_fs_path(&self.root);
        if !dir.join(PAGE_HTML).is_file() || !dir.join(PAGE_SCHEMA).is_file() {
            return Err(StoreError::NotFound(path.clone()));
        }
        self.write_page(&dir, schema)?;

        tracing::info!(page = %path, blocks = schema.schema.len(), "edited page");
        Ok(())
    }

    /// Remove a page directory and everything below it.
    pub fn delete(&self, path: &PagePath) -> Result<(), StoreError> {
        let dir = path.to_fs_path(&self.root);
        if !dir.is_dir() {
            return Err(StoreError::NotFound(path.clone()));
        }
        fs::remove_dir_all(&dir)?;

        tracing::info!(page = %path, "deleted page");
        Ok(())
    }

    pub fn rename(&self, from: &PagePath, to: &PagePath) -> Result<(), StoreError> {
        let old_dir = from.to_fs_path(&self.root);
        let new_dir = to.to_fs_path(&self.root);

        if !old_dir.exists() {
            return Err(StoreError::NotFound(from.clone()));
        }
        if new_dir.exists() {
            return Err(StoreError::AlreadyExists(to.clone()));
        }
        if to.components().starts_with(from.components()) {
            return Err(StoreError::IntoItself {
                from: from.clone(),
                to: to.clone(),
            });
        }

        if let Some(parent) = new_dir.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&old_dir, &new_dir)?;

        tracing::info!(from = %from, to = %to, "renamed page");
        Ok(())
    }

    pub fn read_html(&self, path: &PagePath) -> Result<String, StoreError> {
        self.read_page_file(path, PAGE_HTML)
    }

    pub fn read_schema(&self, path: &PagePath) -> Result<PageSchema, StoreError> {
        let data = self.read_page_file(path, PAGE_SCHEMA)?;
        Ok(PageSchema::from_json(&data)?)
    }

    /// The stored HTML plus a title, taken from the schema when there is one.
    pub fn get(&self, path: &PagePath) -> Result<StoredPage, StoreError> {
        let content = self.read_html(path)?;
        let title = match self.read_schema(path) {
            Ok(schema) if !schema.title.is_empty() => schema.title,
            Ok(_) | Err(StoreError::NotFound(_)) => path.name().to_string(),
            Err(e) => return Err(e),
        };

        Ok(StoredPage { title, content })
    }

    /// Re-render `index.html` for every page that has a `schema.json`.
    pub fn rebuild_all(&self) -> Result<usize, StoreError> {
        if !self.root.is_dir() {
            return Ok(0);
        }

        let structure = self.structure()?;
        let mut rebuilt = 0;

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
        {
            let entry = entry.map_err(ScanError::from)?;
            let schema_path = entry.path().join(PAGE_SCHEMA);
            if !entry.file_type().is_dir() || !schema_path.is_file() {
                continue;
            }

            let schema = PageSchema::from_json(&fs::read_to_string(&schema_path)?)?;
            let html = self.renderer.render_document(&schema, &structure)?;
            write_atomic(&entry.path().join(PAGE_HTML), &html)?;

            tracing::debug!(page = %entry.path().display(), "rebuilt page");
            rebuilt += 1;
        }

        Ok(rebuilt)
    }

    fn write_page(&self, dir: &Path, schema: &PageSchema) -> Result<(), StoreError> {
        let structure = self.structure()?;
        let html = self.renderer.render_document(schema, &structure)?;

        write_atomic(&dir.join(PAGE_SCHEMA), &schema.to_json_pretty()?)?;
        write_atomic(&dir.join(PAGE_HTML), &html)?;
        Ok(())
    }

    fn read_page_file(&self, path: &PagePath, file: &str) -> Result<String, StoreError> {
        match fs::read_to_string(path.to_fs_path(&self.root).join(file)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path.clone())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write through a uniquely named hidden sibling so readers never see a
/// partial file. The sibling is removed when any step fails.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".pagesmith-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Block, BlockKind};
    use serde_json::json;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> PageStore {
        PageStore::new(temp.path().join("uploads"), PageRenderer::builtin().unwrap())
    }

    fn schema(title: &str, text: &str) -> PageSchema {
        PageSchema::new(title, vec![Block::new("1", BlockKind::Text, json!(text))])
    }

    fn path(raw: &str) -> PagePath {
        PagePath::parse(raw).unwrap()
    }

    #[test]
    fn test_create_writes_html_and_schema() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("blog/hello"), &schema("Hello", "first")).unwrap();

        let dir = temp.path().join("uploads/blog/hello");
        let html = fs::read_to_string(dir.join(PAGE_HTML)).unwrap();
        assert!(html.contains("<p>first</p>"));

        let stored: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(PAGE_SCHEMA)).unwrap()).unwrap();
        assert_eq!(stored["title"], "Hello");
        assert_eq!(stored["schema"][0]["type"], "text");

        // no temp files left behind
        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_create_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("about"), &schema("About", "v1")).unwrap();
        store.create(&path("about"), &schema("About", "v2")).unwrap();

        assert!(store.read_html(&path("about")).unwrap().contains("v2"));
    }

    #[test]
    fn test_edit_requires_existing_page() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let err = store.edit(&path("ghost"), &schema("Ghost", "boo")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.create(&path("real"), &schema("Real", "v1")).unwrap();
        store.edit(&path("real"), &schema("Real again", "v2")).unwrap();
        assert_eq!(store.read_schema(&path("real")).unwrap().title, "Real again");
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("blog/a"), &schema("A", "a")).unwrap();
        store.delete(&path("blog")).unwrap();
        assert!(!temp.path().join("uploads/blog").exists());

        assert!(matches!(
            store.delete(&path("blog")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("draft"), &schema("Draft", "x")).unwrap();
        store.create(&path("taken"), &schema("Taken", "y")).unwrap();

        store.rename(&path("draft"), &path("archive/2024/final")).unwrap();
        assert!(store.read_html(&path("archive/2024/final")).is_ok());
        assert!(matches!(
            store.read_html(&path("draft")),
            Err(StoreError::NotFound(_))
        ));

        assert!(matches!(
            store.rename(&path("missing"), &path("x")),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.rename(&path("archive"), &path("taken")),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.rename(&path("archive"), &path("archive/inner")),
            Err(StoreError::IntoItself { .. })
        ));
    }

    #[test]
    fn test_get_uses_schema_title() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("about"), &schema("About us", "x")).unwrap();
        let page = store.get(&path("about")).unwrap();
        assert_eq!(page.title, "About us");
        assert!(page.content.contains("<p>x</p>"));

        // html without a schema still serves, titled by its directory
        let bare = temp.path().join("uploads/legacy");
        fs::create_dir_all(&bare).unwrap();
        fs::write(bare.join(PAGE_HTML), "<p>old</p>").unwrap();
        let page = store.get(&path("legacy")).unwrap();
        assert_eq!(page.title, "legacy");
        assert_eq!(page.content, "<p>old</p>");
    }

    #[test]
    fn test_rebuild_all() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store.create(&path("one"), &schema("One", "1")).unwrap();
        store.create(&path("two/nested"), &schema("Nested", "2")).unwrap();
        fs::write(temp.path().join("uploads/one").join(PAGE_HTML), "stale").unwrap();

        assert_eq!(store.rebuild_all().unwrap(), 2);
        let html = store.read_html(&path("one")).unwrap();
        assert!(html.contains("<p>1</p>"));
        // navigation now sees every page
        assert!(html.contains(">nested</a>"));
    }

    #[test]
    fn test_rebuild_without_root() {
        let temp = TempDir::new().unwrap();
        assert_eq!(store(&temp).rebuild_all().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_edits_last_writer_wins() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let hot = path("hot");
        store.create(&hot, &schema("Hot", "start")).unwrap();

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let (store, hot) = (&store, &hot);
                scope.spawn(move || {
                    for round in 0..50 {
                        let text = format!("worker {worker} round {round}");
                        store.edit(hot, &schema("Hot", &text)).unwrap();
                    }
                });
            }
        });

        let stored = store.read_schema(&hot).unwrap();
        assert!(stored.schema[0].text().starts_with("worker "));
        assert!(store.read_html(&hot).unwrap().contains("<p>worker "));

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("uploads/hot"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
