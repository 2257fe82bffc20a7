//! Content-hash helpers.
//!
//! Hashes are MD5 hex so they compare directly against the ETags that
//! S3-style backends return for plain (non-multipart) uploads.

/// MD5 hex digest of a byte slice.
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Incremental MD5 for objects read in ranges.
pub struct Md5Stream {
    ctx: md5::Context,
}

impl Md5Stream {
    pub fn new() -> Self {
        Self {
            ctx: md5::Context::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.ctx.consume(bytes);
    }

    pub fn finish_hex(self) -> String {
        format!("{:x}", self.ctx.compute())
    }
}

impl Default for Md5Stream {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a backend ETag into a comparable MD5 hex string.
///
/// Strips surrounding quotes. Multipart-upload ETags (`<hex>-<parts>`) are
/// not object MD5s and are reported as `None` so callers fall back to
/// hashing the content themselves.
pub fn normalize_etag(etag: &str) -> Option<String> {
    let trimmed = etag.trim_matches('"');
    if trimmed.is_empty() || trimmed.contains('-') {
        return None;
    }
    if trimmed.len() == 32 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(trimmed.to_ascii_lowercase())
    } else {
        None
    }
}
