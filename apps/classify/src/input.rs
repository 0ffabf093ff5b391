use std::path::Path;

use anyhow::Context;
use shared::domain::ImagePayload;
use tracing::warn;

/// Reads a picked file as-is. The content type is guessed from the extension and is advisory.
pub async fn load_image(path: &Path) -> anyhow::Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image '{}'", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let content_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());

    match content_type.as_deref() {
        Some(ct) if ct.starts_with("image/") => {}
        other => warn!(
            path = %path.display(),
            content_type = other.unwrap_or("unknown"),
            "selected file does not look like an image; sending it anyway"
        ),
    }

    Ok(ImagePayload::new(filename, content_type, bytes))
}
