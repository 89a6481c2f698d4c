use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, Request, State,
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use pagesmith_core::{MediaKind, MediaName, PagePath, PageSchema, StoredPage, Structure};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    page_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    #[serde(alias = "path")]
    page_path: Option<String>,
    schema: Option<PageSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameBody {
    old_page_path: Option<String>,
    new_page_path: Option<String>,
}

/// Run filesystem work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome!" }))
}

pub async fn structure(State(state): State<AppState>) -> Result<Json<Structure>, ApiError> {
    let structure = blocking(move || Ok(state.pages.structure()?)).await?;
    Ok(Json(structure))
}

pub async fn page_get(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<StoredPage>, ApiError> {
    let path = PagePath::parse_or_index(query.page_path.as_deref())?;
    let page = blocking(move || Ok(state.pages.get(&path)?)).await?;
    Ok(Json(page))
}

pub async fn page_get_schema(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageSchema>, ApiError> {
    let path = PagePath::parse_or_index(query.page_path.as_deref())?;
    let schema = blocking(move || Ok(state.pages.read_schema(&path)?)).await?;
    Ok(Json(schema))
}

/// The stored document itself, for browsers and static hosting checks.
pub async fn page_html(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Html<String>, ApiError> {
    let path = PagePath::parse(&raw)?;
    let html = blocking(move || Ok(state.pages.read_html(&path)?)).await?;
    Ok(Html(html))
}

fn page_body(
    payload: Result<Json<PageBody>, JsonRejection>,
) -> Result<(PagePath, PageSchema), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    match (present(body.page_path), body.schema) {
        (Some(path), Some(schema)) => Ok((PagePath::parse(&path)?, schema)),
        _ => Err(ApiError::bad_request("Missing page path or schema.")),
    }
}

pub async fn create_page(
    State(state): State<AppState>,
    payload: Result<Json<PageBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let (path, schema) = page_body(payload)?;
    blocking(move || Ok(state.pages.create(&path, &schema)?)).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Page created successfully." })),
    ))
}

pub async fn edit_page(
    State(state): State<AppState>,
    payload: Result<Json<PageBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let (path, schema) = page_body(payload)?;
    blocking(move || Ok(state.pages.edit(&path, &schema)?)).await?;

    Ok(Json(json!({ "message": "Page edited successfully." })))
}

pub async fn rename_page(
    State(state): State<AppState>,
    payload: Result<Json<RenameBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let (Some(old), Some(new)) = (present(body.old_page_path), present(body.new_page_path)) else {
        return Err(ApiError::bad_request(
            "Missing old page path or new page path.",
        ));
    };
    let old = PagePath::parse(&old)?;
    let new = PagePath::parse(&new)?;

    blocking(move || Ok(state.pages.rename(&old, &new)?)).await?;

    Ok(Json(json!({ "message": "Page renamed successfully." })))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let raw = present(query.page_path).ok_or_else(|| ApiError::bad_request("Missing page path."))?;
    let path = PagePath::parse(&raw)?;

    blocking(move || Ok(state.pages.delete(&path)?)).await?;

    Ok(Json(json!({ "message": "Page deleted successfully." })))
}

/// Raw image body; the file extension comes from `Content-Type`.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let name = blocking(move || Ok(state.media.save_image(&body, content_type.as_deref())?)).await?;

    Ok(Json(json!({
        "message": "Image uploaded successfully.",
        "image": name.as_str(),
    })))
}

/// Multipart upload carrying the file in a `video` field.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("video") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        upload = Some((file_name, data));
        break;
    }

    let Some((file_name, data)) = upload else {
        return Err(ApiError::bad_request("No video uploaded."));
    };

    let name = blocking(move || Ok(state.media.save_video(&data, file_name.as_deref())?)).await?;

    Ok(Json(json!({
        "message": "Video uploaded successfully.",
        "video": name.as_str(),
    })))
}

pub async fn get_image(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_media(state, MediaKind::Image, query, request).await
}

pub async fn get_video(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
    request: Request,
) -> Result<Response, ApiError> {
    serve_media(state, MediaKind::Video, query, request).await
}

/// Hand the file to `ServeFile` so content types and range requests work.
async fn serve_media(
    state: AppState,
    kind: MediaKind,
    query: MediaQuery,
    request: Request,
) -> Result<Response, ApiError> {
    let raw = present(query.name).ok_or_else(|| ApiError::bad_request("No name provided"))?;
    let name = MediaName::parse(&raw)?;
    let path = blocking(move || Ok(state.media.path(kind, &name)?)).await?;

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}
