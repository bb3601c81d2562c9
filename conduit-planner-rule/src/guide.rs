//! Per-service API-guide markdown lookup for planning context.
//!
//! Guides are plain markdown files, one per service, with `##`/`###`
//! headings. [`extract_sections`] pulls out a fixed set of Korean section
//! titles (purpose, auth, scopes, endpoints, limits, error handling,
//! recommended workflow) and [`GuideRetriever::planning_context`] joins
//! them into a single note, truncated to a caller-supplied budget.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Section headings the planner looks for, in the order they're joined.
pub const DEFAULT_PLANNING_SECTIONS: &[&str] =
    &["목적", "인증", "권한", "핵심 엔드포인트", "제한 사항", "에러 처리", "권장 워크플로우"];

/// Errors from loading or rendering a service's API guide.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GuideError {
    /// No guide file exists for the requested service.
    #[error("API guide not found for service '{0}'")]
    NotFound(String),

    /// The guide file exists but could not be read.
    #[error("failed to read guide for '{0}': {1}")]
    ReadFailed(String, String),
}

/// Source of per-service planning context.
pub trait GuideRetriever: Send + Sync {
    /// Return up to `max_chars` of planning context for `service`, or
    /// [`GuideError::NotFound`] if no guide exists.
    fn planning_context(&self, service: &str, max_chars: usize) -> Result<String, GuideError>;
}

/// Extract the configured section bodies from `markdown`, keyed by title,
/// dropping sections with no body.
pub fn extract_sections(markdown: &str, section_titles: &[&str]) -> Vec<(String, String)> {
    let mut bodies: Vec<Vec<&str>> = section_titles.iter().map(|_| Vec::new()).collect();
    let mut current: Option<usize> = None;

    for line in markdown.lines() {
        if let Some(heading) = line.strip_prefix("### ").or_else(|| line.strip_prefix("## ")) {
            let heading = heading.trim();
            current = section_titles.iter().position(|title| heading.contains(*title));
            continue;
        }
        if let Some(idx) = current {
            bodies[idx].push(line);
        }
    }

    section_titles
        .iter()
        .zip(bodies)
        .filter_map(|(title, lines)| {
            let body = lines.join("\n").trim().to_string();
            if body.is_empty() {
                None
            } else {
                Some((title.to_string(), body))
            }
        })
        .collect()
}

fn render_context(markdown: &str, section_titles: &[&str], max_chars: usize) -> String {
    let sections = extract_sections(markdown, section_titles);
    let context = if sections.is_empty() {
        markdown.trim().to_string()
    } else {
        sections
            .into_iter()
            .map(|(title, body)| format!("[{title}]\n{body}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let char_count = context.chars().count();
    if char_count > max_chars {
        let truncated: String = context.chars().take(max_chars).collect();
        format!("{}\n...", truncated.trim_end())
    } else {
        context
    }
}

/// Reads guides from `{root}/{service}.md`, service names lower-cased.
pub struct MarkdownGuideRetriever {
    root: PathBuf,
    section_titles: Vec<&'static str>,
}

impl MarkdownGuideRetriever {
    /// Build a retriever rooted at `root`, using [`DEFAULT_PLANNING_SECTIONS`].
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            section_titles: DEFAULT_PLANNING_SECTIONS.to_vec(),
        }
    }
}

impl GuideRetriever for MarkdownGuideRetriever {
    fn planning_context(&self, service: &str, max_chars: usize) -> Result<String, GuideError> {
        let path = self.root.join(format!("{}.md", service.trim().to_lowercase()));
        if !path.exists() {
            return Err(GuideError::NotFound(service.to_string()));
        }
        let markdown = std::fs::read_to_string(&path).map_err(|e| GuideError::ReadFailed(service.to_string(), e.to_string()))?;
        Ok(render_context(&markdown, &self.section_titles, max_chars))
    }
}

/// Append a `"{service} guide loaded"` or `"{service} guide missing"` note
/// to `notes` for each of `target_services`, per `spec.md` §4.9's
/// "attempt to load a per-service planning context" step. Never errors —
/// a missing guide is expected, not exceptional.
pub fn collect_guide_notes(retriever: &dyn GuideRetriever, target_services: &[String], max_chars: usize, notes: &mut Vec<String>) {
    for service in target_services {
        match retriever.planning_context(service, max_chars) {
            Ok(context) if !context.is_empty() => notes.push(format!("{service} guide loaded")),
            Ok(_) | Err(GuideError::NotFound(_)) => notes.push(format!("{service} guide missing")),
            Err(GuideError::ReadFailed(..)) => notes.push(format!("{service} guide missing")),
        }
    }
}
