//! Turns raw store error text into messages fit for API callers.
//!
//! Backend failures arrive as strings such as
//! `bo_error: triggerDelete failed: 400:Error:Exception: com.x.InvalidArgumentException: text: SmartObjectImpl[ID=...]`.
//! Everything except `text` is internal detail and is removed.

use crate::store::ERROR_SENTINEL;
use regex::Regex;
use std::sync::OnceLock;

/// Returned when nothing readable survives cleaning.
pub const FALLBACK_MESSAGE: &str = "An error occurred.";

struct Patterns {
    sentinel: Regex,
    operation: Regex,
    status_code: Regex,
    wrapper: Regex,
    qualified_before_colon: Regex,
    qualified: Regex,
    dangling_dump: Regex,
    whitespace: Regex,
    repeated_period: Regex,
    trailing_separator: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static pattern");
        Patterns {
            sentinel: re(&format!(r"^{}\s*", regex::escape(ERROR_SENTINEL.trim_end()))),
            operation: re(r"^[a-z][A-Za-z]*\s+failed\s*:\s*"),
            status_code: re(r"^\d{3}\s*:\s*"),
            wrapper: re(r"(?i)^(?:error\s*:\s*exception|exception|error)\s*:\s*"),
            qualified_before_colon: re(r"\b(?:[a-z_][a-z0-9_]*\.)+[A-Z][A-Za-z0-9_$]*\s*:\s*"),
            qualified: re(r"\b(?:[a-z_][a-z0-9_]*\.)+[A-Z][A-Za-z0-9_$]*"),
            dangling_dump: re(r"\s*[:.,;]?\s*[A-Z][A-Za-z0-9_$]*\[[^\]]*$"),
            whitespace: re(r"\s+"),
            repeated_period: re(r"\.(?:\s*\.)+"),
            trailing_separator: re(r"[\s:;,]+$"),
        }
    })
}

/// Clean `raw` and, when `context` names an operation the message does not already start
/// with, prefix `"<Context> failed. "`. Never returns an empty string.
pub fn sanitize(raw: &str, context: Option<&str>) -> String {
    let cleaned = clean(raw);
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(op) if !cleaned.to_lowercase().starts_with(&op.to_lowercase()) => {
            format!("{} failed. {}", capitalize_word(op), cleaned)
        }
        _ => cleaned,
    }
}

fn clean(raw: &str) -> String {
    let p = patterns();
    let mut s = raw.trim().to_string();
    if s.is_empty() {
        return FALLBACK_MESSAGE.to_string();
    }

    s = p.sentinel.replace(&s, "").into_owned();
    s = p.operation.replace(&s, "").into_owned();
    s = p.status_code.replace(&s, "").into_owned();
    // Wrappers nest ("Error: Exception: ..."), peel until stable.
    loop {
        let next = p.wrapper.replace(&s, "").into_owned();
        if next == s {
            break;
        }
        s = next;
    }
    s = p.qualified_before_colon.replace_all(&s, "").into_owned();

    while let Some(cut) = trailing_dump_start(&s) {
        s.truncate(cut);
        s = p.trailing_separator.replace(&s, "").into_owned();
    }
    s = p.dangling_dump.replace(&s, "").into_owned();
    s = p.qualified.replace_all(&s, "").into_owned();

    s = p.whitespace.replace_all(&s, " ").trim().to_string();
    s = p.repeated_period.replace_all(&s, ".").into_owned();
    s = p.trailing_separator.replace(&s, "").into_owned();

    if s.is_empty() {
        return FALLBACK_MESSAGE.to_string();
    }
    let mut s = capitalize_first(&s);
    if !s.ends_with(['.', '!', '?']) {
        s.push('.');
    }
    s
}

/// Byte offset where a trailing `Identifier[...]` object dump begins, if the text ends with one.
/// Brackets are matched by depth so nested dumps (`A[ID=B[..]]`) are taken whole.
fn trailing_dump_start(s: &str) -> Option<usize> {
    let trimmed = s.trim_end();
    if !trimmed.ends_with(']') {
        return None;
    }
    let mut depth = 0usize;
    let mut open = None;
    for (i, b) in trimmed.bytes().enumerate().rev() {
        match b {
            b']' => depth += 1,
            b'[' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    open = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let open = open?;
    let head = &trimmed[..open];
    let start = head
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let ident = &head[start..];
    if ident.starts_with(|c: char| c.is_ascii_uppercase()) {
        Some(start)
    } else {
        None
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize_word(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
