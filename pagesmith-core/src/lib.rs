pub mod config;
pub mod media;
pub mod path;
pub mod render;
pub mod scanner;
pub mod schema;
pub mod site;
pub mod store;
pub mod template;

// Re-export main types
pub use media::{MediaError, MediaStore};
pub use path::{MediaName, PagePath, PathError};
pub use render::{MediaKind, render_blocks};
pub use scanner::{ScanError, Structure, StructureNode, StructureScanner};
pub use schema::{Block, BlockKind, PageSchema, SchemaError};
pub use site::{NavItem, StoredPage};
pub use store::{PageStore, StoreError};
pub use template::{PageRenderer, TemplateError};
