//! Compose constraints for locally created posts

use regex::Regex;
use std::sync::LazyLock;

use crate::error::EngineError;
use crate::model::PostDraft;

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\p{L}\p{N}_]+)").expect("hashtag pattern is valid"));

/// Compose policy configuration
#[derive(Debug, Clone, Default)]
pub struct ComposePolicy {
    /// Minimum title length in characters, when a title is given
    pub min_title_chars: Option<usize>,
    /// Minimum body length in characters, when a body is given
    pub min_body_chars: Option<usize>,
    /// Maximum title length in characters
    pub max_title_chars: Option<usize>,
    /// Maximum body length in characters
    pub max_body_chars: Option<usize>,
    /// Merge `#hashtags` found in the body into the tag set
    pub extract_hashtags: bool,
}

/// Validator for compose drafts and edits
#[derive(Debug, Clone, Default)]
pub struct ComposeValidator {
    config: ComposePolicy,
}

impl ComposeValidator {
    pub fn new(config: ComposePolicy) -> Self {
        Self { config }
    }

    /// Validate a draft and return its normalized form
    pub fn validate(&self, draft: &PostDraft) -> Result<PostDraft, PolicyViolation> {
        let title = draft.title.trim().to_string();
        let body = draft.body.trim().to_string();

        self.check_content(&title, &body)?;

        let tags = self.merge_hashtags(&draft.tags, &body);

        Ok(PostDraft {
            title,
            body,
            media: non_blank(draft.media.as_deref()),
            tags,
            location: non_blank(draft.location.as_deref()),
        })
    }

    /// Check title/body content after an edit has been merged
    /// Normalize `tags` and append hashtags found in `body` when extraction is on
    pub fn merge_hashtags(&self, tags: &[String], body: &str) -> Vec<String> {
        let mut tags = normalize_tags(tags);
        if self.config.extract_hashtags {
            for tag in extract_hashtags(body) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        tags
    }

    pub fn check_content(&self, title: &str, body: &str) -> Result<(), PolicyViolation> {
        if title.trim().is_empty() && body.trim().is_empty() {
            return Err(PolicyViolation::EmptyContent);
        }

        check_length("title", title, self.config.min_title_chars, self.config.max_title_chars)?;
        check_length("body", body, self.config.min_body_chars, self.config.max_body_chars)?;

        Ok(())
    }
}

fn check_length(
    field: &'static str,
    value: &str,
    min: Option<usize>,
    max: Option<usize>,
) -> Result<(), PolicyViolation> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Ok(());
    }
    if let Some(min) = min {
        if len < min {
            return Err(PolicyViolation::TooShort { field, len, min });
        }
    }
    if let Some(max) = max {
        if len > max {
            return Err(PolicyViolation::TooLong { field, len, max });
        }
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Trim, strip a leading `#` and deduplicate, keeping first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#').trim();
        if tag.is_empty() || out.iter().any(|t| t == tag) {
            continue;
        }
        out.push(tag.to_string());
    }
    out
}

/// Hashtags in `text`, without the `#`, in order of appearance
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for capture in HASHTAG.captures_iter(text) {
        let tag = &capture[1];
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Compose policy violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("post needs a title or a body")]
    EmptyContent,
    #[error("{field} is too short ({len} < {min} characters)")]
    TooShort {
        field: &'static str,
        len: usize,
        min: usize,
    },
    #[error("{field} is too long ({len} > {max} characters)")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl From<PolicyViolation> for EngineError {
    fn from(violation: PolicyViolation) -> Self {
        EngineError::Validation(violation.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, body: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_blank_title_and_body() {
        let validator = ComposeValidator::default();
        let result = validator.validate(&draft("   ", "\n"));
        assert_eq!(result, Err(PolicyViolation::EmptyContent));
    }

    #[test]
    fn test_title_alone_is_enough() {
        let validator = ComposeValidator::default();
        let result = validator.validate(&draft("  Sunset  ", "")).unwrap();
        assert_eq!(result.title, "Sunset");
        assert_eq!(result.body, "");
    }

    #[test]
    fn test_min_lengths_apply_to_present_fields() {
        let validator = ComposeValidator::new(ComposePolicy {
            min_title_chars: Some(5),
            min_body_chars: Some(10),
            ..Default::default()
        });

        assert!(matches!(
            validator.validate(&draft("Hey", "")),
            Err(PolicyViolation::TooShort { field: "title", .. })
        ));
        assert!(matches!(
            validator.validate(&draft("Hello there", "short")),
            Err(PolicyViolation::TooShort { field: "body", .. })
        ));
        assert!(validator.validate(&draft("Hello", "long enough body")).is_ok());
    }

    #[test]
    fn test_max_title_length() {
        let validator = ComposeValidator::new(ComposePolicy {
            max_title_chars: Some(10),
            ..Default::default()
        });
        let result = validator.validate(&draft(&"a".repeat(11), ""));
        assert!(matches!(result, Err(PolicyViolation::TooLong { .. })));
    }

    #[test]
    fn test_extracts_hashtags_into_tags() {
        let validator = ComposeValidator::new(ComposePolicy {
            extract_hashtags: true,
            ..Default::default()
        });
        let mut input = draft("Trip", "Back from #hiking with #friends and more #hiking");
        input.tags = vec!["#travel".to_string(), "friends".to_string()];

        let result = validator.validate(&input).unwrap();
        assert_eq!(result.tags, vec!["travel", "friends", "hiking"]);
    }

    #[test]
    fn test_blank_optional_fields_become_none() {
        let validator = ComposeValidator::default();
        let mut input = draft("Title", "");
        input.media = Some("  ".to_string());
        input.location = Some(" Lisbon ".to_string());

        let result = validator.validate(&input).unwrap();
        assert_eq!(result.media, None);
        assert_eq!(result.location.as_deref(), Some("Lisbon"));
    }
}
