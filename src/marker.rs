//! Correlation marker codec.
//!
//! A task's correlation id is embedded in its display text so the link to the
//! remote task can be recovered without consulting the store. The current
//! form is a numeric trailing parenthetical, `"Buy milk (4721)"`. A legacy
//! form, `"Buy milk # [a1b2c3d4]"` (8 hex chars), is still recognized for
//! migration but never written.
//!
//! The in-text marker is a recoverable hint only; the correlation store is
//! the source of truth.

/// Return the correlation id embedded in `content`, if any.
///
/// The current `(NNNN)` form is checked before the legacy `# [xxxxxxxx]`
/// form; the first match wins.
pub fn extract(content: &str) -> Option<String> {
    extract_current(content).or_else(|| extract_legacy(content))
}

/// Remove any embedded markers and trim surrounding whitespace.
///
/// Idempotent: stripping twice equals stripping once. Hand-edited lines can
/// stack a stale marker behind a fresh one, so stripping loops until no
/// marker form remains.
pub fn strip(content: &str) -> String {
    let mut stripped = content.trim();
    loop {
        if let Some((body, _)) = split_current(stripped) {
            stripped = body.trim_end();
            continue;
        }
        if let Some((body, _)) = split_legacy(stripped) {
            stripped = body.trim_end();
            continue;
        }
        return stripped.trim().to_string();
    }
}

/// Append the current-form marker for `id`, replacing any existing marker.
pub fn add(content: &str, id: &str) -> String {
    let body = strip(content);
    if body.is_empty() {
        return format!("({id})");
    }
    format!("{body} ({id})")
}

fn extract_current(content: &str) -> Option<String> {
    split_current(content.trim()).map(|(_, id)| id.to_string())
}

fn extract_legacy(content: &str) -> Option<String> {
    split_legacy(content.trim()).map(|(_, id)| id.to_string())
}

/// Split `"body (NNNN)"` into body and id. The parenthetical must be the
/// final token and all-numeric.
fn split_current(trimmed: &str) -> Option<(&str, &str)> {
    let rest = trimmed.strip_suffix(')')?;
    let open = rest.rfind('(')?;
    let id = &rest[open + 1..];
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&rest[..open], id))
}

/// Split `"body # [xxxxxxxx]"` into body and id. The bracketed id must be
/// exactly 8 lowercase-insensitive hex characters.
fn split_legacy(trimmed: &str) -> Option<(&str, &str)> {
    let rest = trimmed.strip_suffix(']')?;
    let open = rest.rfind('[')?;
    let id = &rest[open + 1..];
    if id.len() != 8 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let body = rest[..open].trim_end();
    let body = body.strip_suffix('#')?;
    Some((body, id))
}
