use crate::fragments::normalize_ai_text_array;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Longest comma-separated piece still treated as its own item.
const MAX_COMMA_ITEM_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Positive,
    Negative,
    Suggestion,
    Noise,
}

impl Category {
    pub fn all() -> Vec<Category> {
        vec![
            Category::Positive,
            Category::Negative,
            Category::Suggestion,
            Category::Noise,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Category::Positive => "positive",
            Category::Negative => "negative",
            Category::Suggestion => "suggestion",
            Category::Noise => "noise",
        }
    }

    /// The label the summarizer writes in front of the section, before a colon.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Positive => "Tích cực",
            Category::Negative => "Tiêu cực",
            Category::Suggestion => "Đề xuất",
            Category::Noise => "Nhiễu",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::Positive => "#22c55e",
            Category::Negative => "#ef4444",
            Category::Suggestion => "#3b82f6",
            Category::Noise => "#94a3b8",
        }
    }
}

/// Items per category, in scan order. Categories without items stay as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSections {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub suggestion: Vec<String>,
    pub noise: Vec<String>,
}

impl AnalysisSections {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Positive => &self.positive,
            Category::Negative => &self.negative,
            Category::Suggestion => &self.suggestion,
            Category::Noise => &self.noise,
        }
    }

    fn get_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Positive => &mut self.positive,
            Category::Negative => &mut self.negative,
            Category::Suggestion => &mut self.suggestion,
            Category::Noise => &mut self.noise,
        }
    }

    /// True when no category has any item.
    pub fn is_empty(&self) -> bool {
        Category::all().into_iter().all(|c| self.get(c).is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> + '_ {
        Category::all().into_iter().map(move |c| (c, self.get(c)))
    }

    /// Run every category through the fragment normalizer.
    pub fn normalized(&self) -> AnalysisSections {
        let mut out = AnalysisSections::default();
        for (category, items) in self.iter() {
            *out.get_mut(category) = normalize_ai_text_array(items);
        }
        out
    }
}

// ── Patterns ──

static CATEGORY_PATTERNS: Lazy<Vec<(Category, Regex)>> = Lazy::new(|| {
    Category::all()
        .into_iter()
        .map(|c| {
            let pattern = format!(r"(?i){}\s*:", regex::escape(c.label()));
            (c, Regex::new(&pattern).expect("category pattern should compile"))
        })
        .collect()
});

static LINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\d+[.)](?:\s+|$)|[-•*]+\s*)").expect("valid regex"));
static INLINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s+)(?:\d+[.)]|[-•*])\s+").expect("valid regex"));

/// Split AI text at "<label>:" markers into per-category item lists.
///
/// Returns `None` when no category label occurs anywhere, so the caller can
/// fall back to showing the text as prose.
pub fn extract_sections(text: &str) -> Option<AnalysisSections> {
    let mut hits: Vec<(usize, usize, Category)> = CATEGORY_PATTERNS
        .iter()
        .flat_map(|(category, re)| re.find_iter(text).map(move |m| (m.start(), m.end(), *category)))
        .collect();

    if hits.is_empty() {
        debug!("No category labels found in {} chars of text", text.len());
        return None;
    }

    hits.sort_by_key(|(start, _, _)| *start);

    let mut sections = AnalysisSections::default();
    for (i, (_, content_start, category)) in hits.iter().enumerate() {
        let content_end = hits
            .get(i + 1)
            .map_or(text.len(), |(next_start, _, _)| *next_start)
            .max(*content_start);
        let items = split_items(&text[*content_start..content_end]);
        sections.get_mut(*category).extend(items);
    }

    debug!(
        "Extracted {} label occurrences: positive={} negative={} suggestion={} noise={}",
        hits.len(),
        sections.positive.len(),
        sections.negative.len(),
        sections.suggestion.len(),
        sections.noise.len()
    );

    Some(sections)
}

/// Break one section's content into items: one per line, else one per list
/// marker, else one per short comma-separated clause, else the whole thing.
fn split_items(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() > 1 {
        return lines
            .into_iter()
            .map(strip_item_marker)
            .filter(|l| !l.is_empty())
            .collect();
    }

    let single = content.trim();
    if single.is_empty() {
        return Vec::new();
    }

    let by_marker: Vec<String> = INLINE_MARKER
        .split(single)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if by_marker.len() >= 2 {
        return by_marker;
    }

    let by_comma: Vec<&str> = single
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if by_comma.len() >= 2 && by_comma.iter().all(|p| p.chars().count() < MAX_COMMA_ITEM_CHARS) {
        return by_comma.into_iter().map(str::to_string).collect();
    }

    let item = strip_item_marker(single);
    if item.is_empty() {
        Vec::new()
    } else {
        vec![item]
    }
}

fn strip_item_marker(line: &str) -> String {
    LINE_MARKER.replace(line, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_repeated_labels_contribute_in_scan_order() {
        let sections = extract_sections("Tích cực: Tốt. Tiêu cực: Chậm. Tích cực: Giao diện đẹp")
            .expect("labels should be found");
        assert_eq!(sections.positive, vec!["Tốt.", "Giao diện đẹp"]);
        assert_eq!(sections.negative, vec!["Chậm."]);
        assert!(sections.suggestion.is_empty());
        assert!(sections.noise.is_empty());
    }

    #[test]
    fn unit_text_without_labels_reports_no_sections() {
        assert!(extract_sections("Khách hàng nhìn chung hài lòng với dịch vụ.").is_none());
        assert!(extract_sections("").is_none());
    }

    #[test]
    fn unit_numbered_lines_split_with_prefix_stripped() {
        let sections = extract_sections("Tích cực:\n1. Tốt\n2. Nhanh").expect("labels should be found");
        assert_eq!(sections.positive, vec!["Tốt", "Nhanh"]);
    }

    #[test]
    fn unit_inline_markers_split_single_line_content() {
        let sections =
            extract_sections("Đề xuất: 1. Thêm ngôn ngữ 2. Giảm thời gian chờ").expect("labels should be found");
        assert_eq!(sections.suggestion, vec!["Thêm ngôn ngữ", "Giảm thời gian chờ"]);
    }

    #[test]
    fn unit_short_comma_parts_split_and_long_ones_do_not() {
        let sections = extract_sections("Tiêu cực: Giá cao, Giao hàng chậm").expect("labels should be found");
        assert_eq!(sections.negative, vec!["Giá cao", "Giao hàng chậm"]);

        let long_clause = "a".repeat(120);
        let text = format!("Tiêu cực: {long_clause}, Giao hàng chậm");
        let sections = extract_sections(&text).expect("labels should be found");
        assert_eq!(sections.negative, vec![format!("{long_clause}, Giao hàng chậm")]);
    }

    #[test]
    fn unit_labels_match_case_insensitively_with_spaced_colon() {
        let sections = extract_sections("TÍCH CỰC : Nhân viên nhiệt tình\nnhiễu: asdfgh")
            .expect("labels should be found");
        assert_eq!(sections.positive, vec!["Nhân viên nhiệt tình"]);
        assert_eq!(sections.noise, vec!["asdfgh"]);
    }

    #[test]
    fn unit_label_without_colon_is_not_a_section() {
        assert!(extract_sections("Phản hồi tích cực chiếm đa số").is_none());
    }

    #[test]
    fn unit_empty_categories_are_present_as_empty_lists() {
        let sections = extract_sections("Nhiễu:").expect("labels should be found");
        assert!(sections.is_empty());
        assert_eq!(sections.iter().count(), 4);
        assert!(sections.iter().all(|(_, items)| items.is_empty()));
    }

    #[test]
    fn integration_markdown_summary_is_extracted_and_normalized() {
        let raw = "**Tích cực:**\n- Nhân viên thân thiện\n- và hỗ trợ nhanh\n\n**Tiêu cực:**\n- Ứng dụng hay bị lỗi\n\n**Đề xuất:** Bổ sung chế độ tối";
        let sections = extract_sections(raw).expect("labels should be found");
        // The closing "**" of each heading lands in the section and is dropped.
        assert_eq!(sections.positive, vec!["Nhân viên thân thiện", "và hỗ trợ nhanh"]);

        let normalized = sections.normalized();
        assert_eq!(normalized.positive, vec!["Nhân viên thân thiện và hỗ trợ nhanh"]);
        assert_eq!(normalized.negative, vec!["Ứng dụng hay bị lỗi"]);
        assert_eq!(normalized.suggestion, vec!["Bổ sung chế độ tối"]);
        assert!(normalized.noise.is_empty());
    }

    #[test]
    fn unit_category_metadata_is_stable() {
        let keys: Vec<&str> = Category::all().iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!["positive", "negative", "suggestion", "noise"]);
        assert_eq!(Category::Negative.label(), "Tiêu cực");
        assert!(Category::all().iter().all(|c| c.color().starts_with('#')));
        assert_eq!(
            serde_json::to_string(&Category::Suggestion).expect("category should serialize"),
            "\"suggestion\""
        );
    }
}
