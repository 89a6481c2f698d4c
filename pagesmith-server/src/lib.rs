use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};
use pagesmith_core::{MediaStore, PageRenderer, PageStore, config::SiteConfig};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod routes;

pub use error::ApiError;

/// Configuration for the page server
#[derive(Debug, Clone)]
pub struct CmsServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Root of the page tree
    pub uploads: PathBuf,
    /// Root for uploaded images and videos
    pub files: PathBuf,
    /// Directory that may hold a `page.html` override
    pub theme: PathBuf,
    pub site: SiteConfig,
    /// Largest accepted request body, in bytes
    pub body_limit: usize,
    /// Auto-open browser
    pub open: bool,
}

impl Default for CmsServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            uploads: PathBuf::from("./uploads"),
            files: PathBuf::from("./files"),
            theme: PathBuf::from("./theme"),
            site: SiteConfig::default(),
            body_limit: 256 * 1024 * 1024,
            open: false,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pages: Arc<PageStore>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    pub fn new(pages: PageStore, media: MediaStore) -> Self {
        Self {
            pages: Arc::new(pages),
            media: Arc::new(media),
        }
    }
}

/// Every endpoint the editor and the public site talk to.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(routes::welcome))
        .route("/structure", get(routes::structure))
        .route("/page-get", get(routes::page_get))
        .route("/page-get-schema", get(routes::page_get_schema))
        .route("/pages/{*path}", get(routes::page_html))
        .route("/page", post(routes::create_page))
        .route("/page/edit", post(routes::edit_page))
        .route("/page/rename", put(routes::rename_page))
        .route("/delete/page", delete(routes::delete_page))
        .route("/image", get(routes::get_image).post(routes::upload_image))
        .route("/video", get(routes::get_video).post(routes::upload_video))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct CmsServer {
    config: CmsServerConfig,
}

impl CmsServer {
    /// Create a new server with the given configuration
    pub fn new(config: CmsServerConfig) -> Self {
        Self { config }
    }

    pub fn state(&self) -> Result<AppState> {
        let renderer = PageRenderer::new(&self.config.theme)?.with_site(&self.config.site);
        let pages = PageStore::new(&self.config.uploads, renderer);
        let media = MediaStore::new(&self.config.files);

        Ok(AppState::new(pages, media))
    }

    /// Run the server until ctrl-c
    pub async fn run(self) -> Result<()> {
        std::fs::create_dir_all(&self.config.uploads)?;

        let app = router(self.state()?, self.config.body_limit);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        tracing::info!("Serving at http://{}", addr);
        tracing::info!(uploads = %self.config.uploads.display(), files = %self.config.files.display(), "storage roots");

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
