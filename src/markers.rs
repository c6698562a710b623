/// Labels the AI summarizer puts in front of sections, longest first so that
/// "Điểm tích cực" is consumed before "Điểm".
pub const LABELS_LONGEST_FIRST: &[&str] = &[
    "Điểm không hài lòng",
    "Điểm tích cực",
    "Điểm tiêu cực",
    "Đề xuất cải tiến",
    "Đề xuất",
    "Tích cực",
    "Tiêu cực",
    "Nhận định",
    "Kết luận",
    "Tóm tắt",
    "Điểm",
];

/// Labels that carry no content when they end up alone on a line.
pub const SIMPLE_LABELS: &[&str] = &[
    "Điểm",
    "Đề xuất",
    "Tích cực",
    "Tiêu cực",
    "Nhận định",
    "Kết luận",
    "Tóm tắt",
];

/// Word lists that decide whether a fragment opens a new point or continues
/// the previous one. Bump `version` whenever a list changes.
#[derive(Debug, Clone, Copy)]
pub struct MarkerSet {
    pub version: u32,
    pub new_sentence: &'static [&'static str],
    pub continuation: &'static [&'static str],
}

pub const MARKERS_V1: MarkerSet = MarkerSet {
    version: 1,
    new_sentence: &[
        "một", "hai", "ba", "bốn", "năm", "sáu", "bảy", "tám", "chín", "mười",
        "người",
        "ngược lại", "tuy nhiên", "nhưng", "mặt khác",
        "đề xuất", "kết luận", "tóm lại", "tổng kết",
    ],
    continuation: &[
        "nhấn mạnh", "đồng thời", "ngoài ra", "bên cạnh đó", "hơn nữa", "thêm vào đó",
        "đặc biệt", "quan trọng là", "đáng chú ý", "nổi bật",
        "và", "với", "vì", "do", "từ", "theo", "về", "cho", "trong", "trên", "dưới",
        "sau", "trước", "khi", "nếu", "mà", "của", "để", "được", "bị", "sẽ", "đã", "đang",
    ],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    NewSentence,
    Continuation,
    Independent,
}

/// Classify a normalized fragment against a marker table.
///
/// Markers are plain case-insensitive prefixes, so "Khiếu nại" counts as
/// "khi". Sentence-start markers win over continuation markers. A fragment
/// that opens with a lowercase letter is a continuation even without a marker.
pub fn classify(fragment: &str, markers: &MarkerSet) -> FragmentKind {
    let trimmed = fragment.trim();
    let lowered = trimmed.to_lowercase();

    if markers.new_sentence.iter().any(|m| lowered.starts_with(m)) {
        return FragmentKind::NewSentence;
    }

    let starts_lowercase = trimmed.chars().next().is_some_and(char::is_lowercase);
    if starts_lowercase || markers.continuation.iter().any(|m| lowered.starts_with(m)) {
        return FragmentKind::Continuation;
    }

    FragmentKind::Independent
}

/// True when `line` is nothing but one of [`SIMPLE_LABELS`], optionally
/// followed by a colon.
pub fn is_simple_label(line: &str) -> bool {
    let trimmed = line.trim();
    let without_colon = trimmed.strip_suffix(':').unwrap_or(trimmed).trim_end();
    let lowered = without_colon.to_lowercase();
    SIMPLE_LABELS.iter().any(|label| label.to_lowercase() == lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capitalize(word: &str) -> String {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    #[test]
    fn unit_every_new_sentence_marker_classifies_as_new_sentence() {
        for marker in MARKERS_V1.new_sentence {
            let fragment = format!("{} khách hàng phản hồi", capitalize(marker));
            assert_eq!(
                classify(&fragment, &MARKERS_V1),
                FragmentKind::NewSentence,
                "marker {marker:?}"
            );
        }
    }

    #[test]
    fn unit_every_continuation_marker_classifies_as_continuation_when_capitalized() {
        for marker in MARKERS_V1.continuation {
            let fragment = format!("{} khách hàng phản hồi", capitalize(marker));
            assert_eq!(
                classify(&fragment, &MARKERS_V1),
                FragmentKind::Continuation,
                "marker {marker:?}"
            );
        }
    }

    #[test]
    fn unit_markers_match_as_plain_prefixes() {
        assert_eq!(classify("Khiếu nại về thời gian chờ", &MARKERS_V1), FragmentKind::Continuation);
        assert_eq!(classify("Màu sắc hài hòa", &MARKERS_V1), FragmentKind::Continuation);
        assert_eq!(classify("Doanh nghiệp phản hồi nhanh", &MARKERS_V1), FragmentKind::Continuation);
        // Lowercase, but "ba" marks a new sentence first.
        assert_eq!(classify("bao bì đẹp", &MARKERS_V1), FragmentKind::NewSentence);
        assert_eq!(classify("Ngược lại, đa số hài lòng", &MARKERS_V1), FragmentKind::NewSentence);
    }

    #[test]
    fn unit_lowercase_start_is_continuation() {
        assert_eq!(classify("giá cả hợp lý", &MARKERS_V1), FragmentKind::Continuation);
        assert_eq!(classify("Giá cả hợp lý", &MARKERS_V1), FragmentKind::Independent);
    }

    #[test]
    fn unit_lowercase_new_sentence_marker_still_starts_new_sentence() {
        assert_eq!(classify("tuy nhiên vẫn còn chậm", &MARKERS_V1), FragmentKind::NewSentence);
    }

    #[test]
    fn unit_is_simple_label_accepts_colon_and_case() {
        assert!(is_simple_label("Tích cực"));
        assert!(is_simple_label("tích cực :"));
        assert!(is_simple_label("  KẾT LUẬN:"));
        assert!(!is_simple_label("Tích cực: tốt"));
        assert!(!is_simple_label("Nhiễu"));
    }

    #[test]
    fn unit_label_tables_are_ordered_and_consistent() {
        for (i, earlier) in LABELS_LONGEST_FIRST.iter().enumerate() {
            for later in &LABELS_LONGEST_FIRST[i + 1..] {
                assert!(!later.starts_with(earlier), "{earlier:?} would shadow {later:?}");
            }
        }
        for label in SIMPLE_LABELS {
            assert!(LABELS_LONGEST_FIRST.contains(label));
        }
    }
}
