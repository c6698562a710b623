use crate::markers::{classify, is_simple_label, FragmentKind, MarkerSet, MARKERS_V1};
use crate::normalize::normalize_ai_text;

/// Normalize every fragment, drop empty and label-only ones, then fold
/// continuation clauses back into the point they continue.
pub fn normalize_ai_text_array<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    let cleaned: Vec<String> = items
        .iter()
        .map(|item| normalize_ai_text(item.as_ref()))
        .filter(|item| {
            let trimmed = item.trim();
            !trimmed.is_empty() && !is_simple_label(trimmed)
        })
        .collect();

    merge_continuations(cleaned, &MARKERS_V1)
}

/// A missing list normalizes to an empty one.
pub fn normalize_optional_array<S: AsRef<str>>(items: Option<&[S]>) -> Vec<String> {
    items.map(normalize_ai_text_array).unwrap_or_default()
}

/// Append each continuation fragment to the entry before it, joined by a
/// single space. Order of first appearance is preserved.
pub fn merge_continuations(items: Vec<String>, markers: &MarkerSet) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(items.len());

    for item in items {
        let current = item.trim();
        if current.is_empty() {
            continue;
        }

        match (classify(current, markers), merged.last_mut()) {
            (FragmentKind::Continuation, Some(previous)) => {
                previous.push(' ');
                previous.push_str(current);
            }
            _ => merged.push(current.to_string()),
        }
    }

    merged
}
