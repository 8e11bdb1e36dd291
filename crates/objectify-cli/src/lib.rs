use std::path::Path;

use anyhow::Context;
use objectify_core::{BinaryObject, Event, Listing};
use serde::Serialize;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// MIME type guessed from a file extension. Unknown extensions fall back to
/// `application/octet-stream`.
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("heic") => "image/heic",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Accept either a literal `data:` URI or a path to a file, and return a
/// data URI for the upload flow.
pub fn load_upload_input(input: &str) -> anyhow::Result<String> {
    if input.starts_with("data:") {
        return Ok(input.to_string());
    }

    let path = Path::new(input);
    let bytes = std::fs::read(path).with_context(|| format!("Read {}", path.display()))?;
    Ok(BinaryObject::new(bytes, mime_type_for_path(path)).to_data_uri())
}

/// Read a signed listing event from a JSON file, verify it and map it.
pub fn load_listing(path: &Path) -> anyhow::Result<Listing> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Read {}", path.display()))?;
    let event: Event = serde_json::from_str(&raw).context("Parse event JSON")?;
    event
        .verify()
        .with_context(|| format!("Event {} does not verify", event.id()))?;
    Ok(Listing::from_event(&event)?)
}
