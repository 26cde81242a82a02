use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

/// Lowercased extension of the last path segment, with its leading dot.
/// Empty unless the extension is 1 to 10 ASCII alphanumerics, so the result
/// is always safe to append to a physical name.
pub fn get_file_extension(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);

    match base.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}

/// Human-readable byte count for limit messages.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= MB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Content type for a served file, looked up by extension.
pub fn content_type_for(filename: &str) -> String {
    let extension = get_file_extension(filename);
    let known = match extension.as_str() {
        ".jpg" | ".jpeg" => Some("image/jpeg"),
        ".png" => Some("image/png"),
        ".gif" => Some("image/gif"),
        ".webp" => Some("image/webp"),
        ".svg" => Some("image/svg+xml"),
        ".mp4" => Some("video/mp4"),
        ".webm" => Some("video/webm"),
        ".ogg" => Some("video/ogg"),
        ".mp3" => Some("audio/mpeg"),
        ".wav" => Some("audio/wav"),
        ".pdf" => Some("application/pdf"),
        ".txt" => Some("text/plain"),
        ".json" => Some("application/json"),
        ".zip" => Some("application/zip"),
        ".doc" => Some("application/msword"),
        ".docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    };

    match known {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// MIME type for an upload whose part carried no usable `Content-Type`.
pub fn guess_mime_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

pub fn physical_name(file_id: Uuid, extension: &str) -> String {
    format!("{}{}", file_id, extension)
}

/// Storage key of an original, relative to the uploads root.
pub fn user_file_key(user_id: Uuid, physical_name: &str) -> String {
    format!("users/{}/files/{}", user_id, physical_name)
}

/// Storage key of a thumbnail, relative to the uploads root.
pub fn user_thumbnail_key(user_id: Uuid, thumbnail_name: &str) -> String {
    format!("users/{}/thumbs/{}", user_id, thumbnail_name)
}

pub fn public_file_url(user_id: Uuid, physical_name: &str) -> String {
    format!("/uploads/{}", user_file_key(user_id, physical_name))
}
