//! Deterministic requirement extraction from free-form request text.

use conduit_plan::AgentRequirement;
use regex::Regex;
use std::sync::OnceLock;

fn quantity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d{1,2})\s*(개|건|페이지|page|pages|줄|line|lines)?").expect("valid regex"))
}

/// Pull the first one- or two-digit number out of `text`, optionally
/// followed by a Korean or English count unit.
pub fn extract_quantity(text: &str) -> Option<u32> {
    let captures = quantity_pattern().captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Classify `user_text` into one or more high-level requirements. Falls
/// back to a single generic "analyze and plan" requirement when nothing
/// matches.
pub fn extract_requirements(user_text: &str) -> Vec<AgentRequirement> {
    let normalized = user_text.trim();
    let quantity = extract_quantity(normalized);

    let mut requirements = Vec::new();
    if contains_any(normalized, &["요약", "summary", "정리"]) {
        requirements.push(AgentRequirement {
            summary: "대상 콘텐츠 요약".to_string(),
            quantity,
            constraints: Vec::new(),
        });
    }
    if contains_any(normalized, &["생성", "만들", "작성", "create"]) {
        requirements.push(AgentRequirement::new("결과물 생성"));
    }
    if contains_any(normalized, &["추가", "업데이트", "갱신", "append", "update"]) {
        requirements.push(AgentRequirement::new("기존 결과물 수정/추가"));
    }
    if contains_any(normalized, &["조회", "검색", "찾", "list", "search"]) {
        requirements.push(AgentRequirement {
            summary: "대상 데이터 조회".to_string(),
            quantity,
            constraints: Vec::new(),
        });
    }
    if contains_any(normalized, &["내용", "본문", "상위", "줄", "출력", "보여"]) {
        requirements.push(AgentRequirement {
            summary: "페이지 본문 일부 추출".to_string(),
            quantity,
            constraints: Vec::new(),
        });
    }
    if contains_any(normalized, &["제목 변경", "제목 수정", "rename", "바꿔", "변경"]) && normalized.contains("제목") {
        requirements.push(AgentRequirement::new("페이지 메타데이터 업데이트"));
    }
    if contains_any(normalized, &["삭제", "지워", "아카이브", "archive"]) {
        requirements.push(AgentRequirement::new("페이지 아카이브(삭제)"));
    }
    if contains_any(normalized, &["데이터소스", "data source", "data_source"]) {
        requirements.push(AgentRequirement {
            summary: "데이터소스 질의".to_string(),
            quantity,
            constraints: Vec::new(),
        });
    }

    if requirements.is_empty() {
        requirements.push(AgentRequirement {
            summary: "사용자 요청 분석 및 실행 계획 수립".to_string(),
            quantity,
            constraints: Vec::new(),
        });
    }
    requirements
}
