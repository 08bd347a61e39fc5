//! Text shaping shared by the list output and the picker protocol.

/// Cut `s` to at most `max` characters, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Cut `s` to at most `max` characters, ending a cut with `...`.
pub fn truncate_ascii(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Replace characters that would break a tab-separated line.
pub fn sanitize_field(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}
