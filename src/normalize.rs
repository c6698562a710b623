use crate::markers::{is_simple_label, LABELS_LONGEST_FIRST};
use once_cell::sync::Lazy;
use regex::Regex;

// ── Line patterns ──
// A "marker" is a run of up to three bullet/heading/emphasis characters.

struct LabelPatterns {
    label_only: Regex,
    with_colon: Regex,
    without_colon: Regex,
}

static LABEL_PATTERNS: Lazy<Vec<LabelPatterns>> = Lazy::new(|| {
    LABELS_LONGEST_FIRST
        .iter()
        .map(|label| {
            let label = regex::escape(label);
            let prefix = format!(r"(?i)^\s*(?:[•*#-]\s*){{1,3}}{label}\s*\**");
            LabelPatterns {
                label_only: Regex::new(&format!(r"{prefix}\s*:?\s*\**\s*$"))
                    .expect("label-only pattern should compile"),
                with_colon: Regex::new(&format!(r"{prefix}\s*:\s*\**\s*"))
                    .expect("label-with-colon pattern should compile"),
                without_colon: Regex::new(&format!(r"{prefix}\s+"))
                    .expect("label-without-colon pattern should compile"),
            }
        })
        .collect()
});

static BULLET_EMPHASIS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*•\s*\*{0,2}\s*\*{0,2}\s*").expect("valid regex"));
static LEADING_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\*{1,3}\s*").expect("valid regex"));
static LEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[•#-]\s*").expect("valid regex"));
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+").expect("valid regex"));
static TRAILING_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\s*[:•])+\s*$").expect("valid regex"));
static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static LEADING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s_=-]+").expect("valid regex"));
static TRAILING_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[_=-]+\s*$").expect("valid regex"));

/// Strip markdown decoration and section labels from AI-generated text,
/// keeping the content.
///
/// The result has no leading/trailing whitespace, no markdown emphasis, and at
/// most one blank line between paragraphs. Applying it twice gives the same
/// result as applying it once.
pub fn normalize_ai_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut current = text.replace("\r\n", "\n").replace('\r', "\n");
    // A pass only deletes characters or turns tabs into spaces, so it settles
    // in at most one pass per character.
    let max_passes = current.chars().count() + 2;
    for _ in 0..max_passes {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Missing text normalizes to an empty string.
pub fn normalize_optional(text: Option<&str>) -> String {
    text.map(normalize_ai_text).unwrap_or_default()
}

fn normalize_pass(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.split('\n') {
        match normalize_line(line) {
            // Collapse blank runs; never start with a blank line.
            Some(l) if l.is_empty() => {
                if lines.last().is_some_and(|last| !last.is_empty()) {
                    lines.push(l);
                }
            }
            Some(l) => lines.push(l),
            None => {}
        }
    }
    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// `None` drops the line entirely; `Some("")` keeps it as a paragraph break.
fn normalize_line(line: &str) -> Option<String> {
    if LABEL_PATTERNS.iter().any(|p| p.label_only.is_match(line)) {
        return None;
    }

    let mut line = strip_label_prefixes(line);
    line = strip_markdown(&line);
    line = TRAILING_NOISE.replace(&line, "").into_owned();
    line = HORIZONTAL_SPACE.replace_all(&line, " ").into_owned();
    line = LEADING_SEPARATOR.replace(line.trim(), "").into_owned();
    line = TRAILING_SEPARATOR.replace(&line, "").into_owned();

    if is_simple_label(&line) {
        return None;
    }
    Some(line)
}

fn strip_label_prefixes(line: &str) -> String {
    let mut line = line.to_string();
    for patterns in LABEL_PATTERNS.iter() {
        line = patterns.with_colon.replace(&line, "").into_owned();
        if let Some(m) = patterns.without_colon.find(&line) {
            // Only when real words follow the label.
            if line[m.end()..].chars().next().is_some_and(char::is_alphabetic) {
                line = line[m.end()..].to_string();
            }
        }
    }
    line
}

fn strip_markdown(line: &str) -> String {
    let line = strip_leading_markers(line).replace('*', "");
    HEADING.replace(&line, "").into_owned()
}

/// Peel bullets, emphasis and list numbers off the front until none is left,
/// so nested markers cost one pass instead of one pass each.
fn strip_leading_markers(line: &str) -> &str {
    let mut rest = line;
    loop {
        let before = rest.len();
        for re in [&*BULLET_EMPHASIS, &*LEADING_EMPHASIS, &*LEADING_MARKER] {
            if let Some(m) = re.find(rest) {
                rest = &rest[m.end()..];
            }
        }
        rest = strip_list_number(rest);
        if rest.len() == before {
            return rest;
        }
    }
}

/// Drop a leading "1." or "2)" list marker. "3.5 sao" is content, not a list.
fn strip_list_number(line: &str) -> &str {
    let body = line.trim_start();
    let rest = body.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == body.len() {
        return line;
    }
    match rest.strip_prefix(|c: char| c == '.' || c == ')') {
        Some(after) if !after.starts_with(|c: char| c.is_ascii_digit()) => after.trim_start(),
        _ => line,
    }
}
