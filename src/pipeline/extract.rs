use serde_json::Value;

/// Pulls the first balanced-looking JSON object out of noisy generator
/// output.
///
/// Two tiers: a direct parse of the whole string, then the substring from
/// the first `{` to the last `}` inclusive. With multiple brace pairs in the
/// text the heuristic takes the outermost span, which may swallow nested
/// noise; that is accepted behavior, not a bug. Anything beyond these two
/// tiers (tolerant parsing, fence stripping) would change which malformed
/// outputs are accepted and is deliberately not done.
pub fn extract_json_object(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && value.is_object()
    {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if start >= end {
        return None;
    }

    serde_json::from_str::<Value>(&trimmed[start..=end]).ok()
}
