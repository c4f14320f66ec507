//! Static file serving for the document root.
//!
//! Files are served by `ServeDir` (MIME type from the extension, `index.html`
//! for directories, 307 redirect to the trailing-slash form of a directory
//! path). When `ServeDir` finds nothing it hands the request to a fallback
//! that renders a listing for directories without an index and a 404
//! otherwise; by then a directory path always ends in `/`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::State,
    http::Uri,
    response::Html,
    Router,
};
use tera::Tera;
use tower_http::services::ServeDir;

use crate::error::AppError;
use crate::templates::{render_listing, ListingEntry};

#[derive(Clone)]
struct ListingState {
    root: Arc<PathBuf>,
    tera: Arc<Tera>,
}

/// Create the file service for `root`, falling back to directory listings.
pub fn create_static_service(root: &Path, tera: Arc<Tera>) -> ServeDir<Router> {
    let listing = Router::new()
        .fallback(directory_listing)
        .with_state(ListingState {
            root: Arc::new(root.to_path_buf()),
            tera,
        });

    ServeDir::new(root)
        .append_index_html_on_directories(true)
        .fallback(listing)
}

async fn directory_listing(
    State(state): State<ListingState>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let request_path = uri.path();
    let (decoded, dir) = resolve_path(&state.root, request_path)
        .ok_or_else(|| AppError::NotFound(request_path.to_string()))?;

    let is_dir = tokio::fs::metadata(&dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(AppError::NotFound(decoded));
    }

    let entries = read_entries(&dir).await?;
    let html = render_listing(&state.tera, &decoded, &entries)?;
    Ok(Html(html))
}

/// Map a request path onto the filesystem under `root`.
///
/// Returns the percent-decoded path and the filesystem location, or `None`
/// when the path would escape the root.
fn resolve_path(root: &Path, request_path: &str) -> Option<(String, PathBuf)> {
    let decoded = urlencoding::decode(request_path).ok()?.into_owned();
    let mut resolved = root.to_path_buf();

    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains('\\') {
            return None;
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => resolved.push(part),
            _ => return None,
        }
    }

    Some((decoded, resolved))
}

/// Directory entries sorted case-insensitively; directories end in `/`,
/// symlinks are marked with `@` in the displayed name only.
async fn read_entries(dir: &Path) -> Result<Vec<ListingEntry>, AppError> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut rows = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_link = entry
            .file_type()
            .await
            .map(|t| t.is_symlink())
            .unwrap_or(false);
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let mut display = name.clone();
        let mut href = urlencoding::encode(&name).into_owned();
        if is_dir {
            display.push('/');
            href.push('/');
        }
        if is_link {
            display.push('@');
        }

        rows.push((name.to_lowercase(), ListingEntry { name: display, href }));
    }

    rows.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(rows.into_iter().map(|(_, entry)| entry).collect())
}
