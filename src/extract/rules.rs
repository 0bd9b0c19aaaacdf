//! Configurable extraction predicates.
//!
//! Every structural heuristic the extractor uses is a CSS selector string
//! here, so supporting a new authoring tool's page template is a config
//! change. Lists named `*_containers` are prioritised: the first selector
//! whose matches yield content wins and later ones are not consulted.

use serde::{Deserialize, Serialize};

use crate::dom::SelectorRule;
use crate::error::Result;

/// Selector strings and thresholds driving [`extract_page`](super::extract_page).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRules {
    /// Prioritised lesson container selectors.
    pub lesson_containers: Vec<String>,
    /// Elements whose text titles a lesson (first match in document order).
    pub lesson_titles: String,
    /// Paragraph-like elements inside a lesson.
    pub paragraphs: String,
    /// Minimum trimmed length, exclusive, for a lesson paragraph.
    pub min_paragraph_chars: usize,
    /// Minimum trimmed length, exclusive, for fallback body text.
    pub min_fallback_chars: usize,

    /// Prioritised quiz container selectors.
    pub quiz_containers: Vec<String>,
    pub quiz_titles: String,
    /// Question-like elements; the innermost ones holding inputs are used.
    pub question_containers: String,
    /// Prioritised sources of question text inside a question.
    pub question_texts: Vec<String>,
    /// `<option>` text that is a placeholder, not an answer.
    pub answer_placeholder: String,

    /// Navigation entries.
    pub navigation: String,
    /// Minimum trimmed length, exclusive, for a navigation entry.
    pub min_navigation_chars: usize,
    /// Classes marking the current navigation entry.
    pub active_classes: Vec<String>,

    /// Interactive elements.
    pub interactions: String,
    /// Action handler text is cut to this many characters.
    pub action_max_chars: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            lesson_containers: strings(&[
                r#".lesson, [class*="lesson"], [id*="lesson"]"#,
                r#".module, [class*="module"]"#,
                r#".slide, [class*="slide"]"#,
                r#"section, .section, [class*="section"]"#,
                "article",
            ]),
            lesson_titles: r#"h1, h2, h3, h4, h5, h6, [role="heading"], .title, [class*="title"]"#
                .into(),
            paragraphs: "p, li, blockquote, dd, figcaption, pre".into(),
            min_paragraph_chars: 20,
            min_fallback_chars: 30,

            quiz_containers: strings(&[
                r#".quiz, [class*="quiz"]"#,
                r#".assessment, [class*="assessment"]"#,
                "form",
                "body",
            ]),
            quiz_titles: r#"h1, h2, h3, h4, h5, h6, .quiz-title"#.into(),
            question_containers: r#".question, [class*="question"], fieldset"#.into(),
            question_texts: strings(&[
                "legend",
                r#".question-text, .prompt, .stem, [class*="question-text"]"#,
                "h1, h2, h3, h4, h5, h6",
                "p",
                "label",
            ]),
            answer_placeholder: "Select an answer".into(),

            navigation: r#"nav li, .nav li, .navigation li, .menu li, [role="navigation"] li, [class*="nav"] li"#
                .into(),
            min_navigation_chars: 2,
            active_classes: strings(&["active", "current", "selected"]),

            interactions: concat!(
                "button, input[type=\"button\"], input[type=\"submit\"], [role=\"button\"], ",
                "[onclick], [class*=\"btn\"], [class*=\"button\"], [class*=\"interactive\"], ",
                "[class*=\"clickable\"]"
            )
            .into(),
            action_max_chars: 120,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ExtractionRules {
    /// Validate and compile every selector.
    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            lesson_containers: compile_list(&self.lesson_containers)?,
            lesson_titles: SelectorRule::parse(&self.lesson_titles)?,
            paragraphs: SelectorRule::parse(&self.paragraphs)?,
            quiz_containers: compile_list(&self.quiz_containers)?,
            quiz_titles: SelectorRule::parse(&self.quiz_titles)?,
            question_containers: SelectorRule::parse(&self.question_containers)?,
            question_texts: compile_list(&self.question_texts)?,
            navigation: SelectorRule::parse(&self.navigation)?,
            interactions: SelectorRule::parse(&self.interactions)?,
            headings: SelectorRule::parse("h1, h2, h3, h4, h5, h6")?,
            images: SelectorRule::parse("img[src]")?,
            links: SelectorRule::parse("a[href]")?,
            choice_inputs: SelectorRule::parse(r#"input[type="radio"], input[type="checkbox"]"#)?,
            selects: SelectorRule::parse("select")?,
            rules: self.clone(),
        })
    }
}

fn compile_list(sources: &[String]) -> Result<Vec<SelectorRule>> {
    sources.iter().map(|s| SelectorRule::parse(s)).collect()
}

/// [`ExtractionRules`] with every selector parsed, ready to share across
/// extraction threads.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub(crate) lesson_containers: Vec<SelectorRule>,
    pub(crate) lesson_titles: SelectorRule,
    pub(crate) paragraphs: SelectorRule,
    pub(crate) quiz_containers: Vec<SelectorRule>,
    pub(crate) quiz_titles: SelectorRule,
    pub(crate) question_containers: SelectorRule,
    pub(crate) question_texts: Vec<SelectorRule>,
    pub(crate) navigation: SelectorRule,
    pub(crate) interactions: SelectorRule,
    pub(crate) headings: SelectorRule,
    pub(crate) images: SelectorRule,
    pub(crate) links: SelectorRule,
    pub(crate) choice_inputs: SelectorRule,
    pub(crate) selects: SelectorRule,
    rules: ExtractionRules,
}

impl CompiledRules {
    /// The thresholds and strings these rules were compiled from.
    pub fn source(&self) -> &ExtractionRules {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults_compile() {
        let compiled = ExtractionRules::default().compile().unwrap();
        assert_eq!(compiled.lesson_containers.len(), 5);
        assert_eq!(compiled.source().min_paragraph_chars, 20);
    }

    #[test]
    fn test_invalid_rule_is_reported() {
        let rules = ExtractionRules {
            quiz_containers: vec![".quiz".into(), "form[".into()],
            ..Default::default()
        };
        let err = rules.compile().unwrap_err();
        assert!(matches!(err, Error::InvalidSelector { rule, .. } if rule == "form["));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let rules: ExtractionRules = toml::from_str(
            r#"
            lesson_containers = [".topic"]
            min_paragraph_chars = 10
            "#,
        )
        .unwrap();
        assert_eq!(rules.lesson_containers, [".topic"]);
        assert_eq!(rules.min_paragraph_chars, 10);
        assert_eq!(rules.answer_placeholder, "Select an answer");
    }
}
