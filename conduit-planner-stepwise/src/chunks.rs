//! Splitting one request into sequential sentence chunks.

use std::sync::OnceLock;

use regex::Regex;

const MAX_CHUNKS: usize = 5;

fn conjunction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*(?:그리고|그리고 나서|그 다음|다음으로|then|and then)\s*").expect("valid regex"))
}

/// Split `user_text` on sequencing conjunctions (그리고, 그 다음, 다음으로,
/// and, then), dropping empty chunks and capping the result at
/// [`MAX_CHUNKS`].
pub fn sentence_chunks(user_text: &str) -> Vec<String> {
    let text = user_text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    conjunction_pattern()
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .take(MAX_CHUNKS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_korean_and_english_conjunctions() {
        let chunks = sentence_chunks("캘린더 확인하고 그리고 노션에 회의록 만들고 then 리니어에 이슈 등록해줘");
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn caps_at_five_chunks() {
        let text = "a 그리고 b 그리고 c 그리고 d 그리고 e 그리고 f 그리고 g";
        assert_eq!(sentence_chunks(text).len(), 5);
    }

    #[test]
    fn blank_text_yields_no_chunks() {
        assert!(sentence_chunks("   ").is_empty());
    }

    #[test]
    fn single_sentence_with_no_conjunction_is_one_chunk() {
        assert_eq!(sentence_chunks("노션 페이지 만들어줘"), vec!["노션 페이지 만들어줘".to_string()]);
    }
}
