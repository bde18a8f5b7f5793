//! URL scheme helpers
//!
//! Sources are announced with a short protocol token (`rtsp`, `rtmp`, ...).
//! A push target only reacts to sources whose token prefixes its URL.

/// Maximum length of a protocol token
const SCHEMA_LEN: usize = 4;

/// Extract the protocol token of a URL.
///
/// Returns the lowercased text before `://`, truncated to four characters,
/// or `None` if the URL has no scheme separator.
pub fn scheme_of(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    Some(scheme.chars().take(SCHEMA_LEN).collect::<String>().to_ascii_lowercase())
}

/// Check whether a source announced under `schema` belongs to `target_url`.
///
/// The comparison is a case-insensitive prefix match. An empty schema
/// never matches.
pub fn matches_target(target_url: &str, schema: &str) -> bool {
    if schema.is_empty() || schema.len() > target_url.len() {
        return false;
    }
    target_url.as_bytes()[..schema.len()].eq_ignore_ascii_case(schema.as_bytes())
}
