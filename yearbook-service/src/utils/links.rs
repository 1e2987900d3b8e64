//! Rewriting of stored Drive share links into image-proxy URLs.
//!
//! Uploaded photos are persisted as `https://drive.google.com/uc?id=<id>`
//! share links; responses rewrite those to this service's proxy so clients
//! never talk to the provider directly.

/// Extract the file id from a Drive share link (`…?id=<fileId>`).
pub fn drive_file_id(url: &str) -> Option<&str> {
    let start = url.find("id=")? + 3;
    let rest = &url[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());

    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

/// Rewrite a stored picture link to the proxy route under the configured
/// external base URL. Non-Drive links pass through untouched.
pub fn proxied_image_url(server_url: &str, stored_url: &str) -> String {
    match drive_file_id(stored_url) {
        Some(file_id) => format!(
            "{}/api/v1/google-image/{}",
            server_url.trim_end_matches('/'),
            file_id
        ),
        None => stored_url.to_string(),
    }
}
