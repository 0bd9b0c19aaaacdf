//! Quiz extraction.
//!
//! Quiz containers come from the first quiz rule whose outermost matches
//! hold at least one question; a rule matching only decorative elements
//! falls through to the next. Inside a container, a question is the
//! innermost question-like element, or the container itself, that holds a
//! choice input or a `<select>`.

use super::{Answer, CompiledRules, QuestionBlock, QuizBlock, first_productive, innermost};
use crate::dom::{NodeId, PageDom};
use crate::util::collapse_whitespace;

pub(super) fn extract(dom: &PageDom, rules: &CompiledRules) -> Vec<QuizBlock> {
    first_productive(dom, &rules.quiz_containers, dom.document(), |containers| {
        quizzes(dom, rules, containers)
    })
}

fn quizzes(dom: &PageDom, rules: &CompiledRules, containers: Vec<NodeId>) -> Vec<QuizBlock> {
    let mut quizzes = Vec::new();

    for container in containers {
        let question_nodes = question_nodes(dom, rules, container);
        let questions = questions(dom, rules, &question_nodes);
        if questions.is_empty() {
            continue;
        }

        let title = rules
            .quiz_titles
            .select(dom, container)
            .into_iter()
            .filter(|&h| !question_nodes.iter().any(|&q| q == h || dom.is_ancestor(q, h)))
            .map(|h| dom.text(h))
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| format!("Quiz {}", quizzes.len() + 1));

        quizzes.push(QuizBlock { title, questions });
    }

    quizzes
}

fn has_answer_inputs(dom: &PageDom, rules: &CompiledRules, id: NodeId) -> bool {
    dom.descendants(id)
        .any(|d| rules.choice_inputs.matches(dom, d) || rules.selects.matches(dom, d))
}

fn question_nodes(dom: &PageDom, rules: &CompiledRules, container: NodeId) -> Vec<NodeId> {
    let candidates: Vec<NodeId> = std::iter::once(container)
        .chain(rules.question_containers.select(dom, container))
        .filter(|&id| has_answer_inputs(dom, rules, id))
        .collect();
    innermost(dom, candidates)
}

fn questions(dom: &PageDom, rules: &CompiledRules, nodes: &[NodeId]) -> Vec<QuestionBlock> {
    let mut out = Vec::new();
    for &node in nodes {
        let Some((text_node, text)) = question_text(dom, rules, node) else {
            continue;
        };
        let answers = answers(dom, rules, node, text_node, &text);
        if answers.is_empty() {
            continue;
        }
        out.push(QuestionBlock {
            ordinal: out.len() + 1,
            text,
            answers,
        });
    }
    out
}

/// First non-empty match of the first question-text rule that yields one.
fn question_text(dom: &PageDom, rules: &CompiledRules, question: NodeId) -> Option<(NodeId, String)> {
    rules.question_texts.iter().find_map(|rule| {
        rule.select(dom, question)
            .into_iter()
            .map(|id| (id, dom.text(id)))
            .find(|(_, text)| !text.is_empty())
    })
}

fn answers(
    dom: &PageDom,
    rules: &CompiledRules,
    question: NodeId,
    text_node: NodeId,
    question_text: &str,
) -> Vec<Answer> {
    let placeholder = rules.source().answer_placeholder.as_str();
    let mut texts = Vec::new();

    for id in dom.descendants(question) {
        if rules.choice_inputs.matches(dom, id) {
            if let Some(text) = choice_text(dom, id, question, text_node, question_text) {
                texts.push(text);
            }
        } else if rules.selects.matches(dom, id) {
            texts.extend(
                dom.descendants(id)
                    .filter(|&o| dom.has_tag(o, &["option"]))
                    .map(|o| dom.text(o))
                    .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(placeholder)),
            );
        }
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Answer {
            label: answer_label(i),
            text,
        })
        .collect()
}

/// Text for one radio/checkbox: its label, else the text right after it,
/// else its parent's text minus the question, else its value.
fn choice_text(
    dom: &PageDom,
    input: NodeId,
    question: NodeId,
    text_node: NodeId,
    question_text: &str,
) -> Option<String> {
    let non_empty = |s: String| (!s.is_empty()).then_some(s);

    let for_label = dom.non_empty_attr(input, "id").and_then(|id| {
        dom.descendants(dom.document())
            .filter(|&l| dom.has_tag(l, &["label"]) && dom.attr(l, "for").is_some_and(|f| f.trim() == id))
            .map(|l| dom.text(l))
            .find(|t| !t.is_empty())
    });

    for_label
        .or_else(|| {
            dom.ancestors(input)
                .take_while(|&a| a != question)
                .find(|&a| dom.has_tag(a, &["label"]))
                .and_then(|label| non_empty(dom.text(label)))
        })
        .or_else(|| adjacent_text(dom, input, text_node))
        .or_else(|| {
            dom.parent(input)
                .filter(|&p| p != text_node)
                .and_then(|p| non_empty(strip_once(&dom.text(p), question_text)))
        })
        .or_else(|| dom.non_empty_attr(input, "value").map(collapse_whitespace))
}

/// Following siblings up to the next input or line break: a sibling
/// `<label>`, or loose inline text.
fn adjacent_text(dom: &PageDom, input: NodeId, text_node: NodeId) -> Option<String> {
    let mut raw = String::new();
    let mut current = dom.get(input).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);

    while current.is_some() {
        if let Some(text) = dom.text_content(current) {
            raw.push_str(text);
        } else if dom.is_element(current) {
            if current == text_node || dom.has_tag(current, &["input", "select", "br", "p", "div", "li"]) {
                break;
            }
            if dom.has_tag(current, &["label"]) {
                let label = dom.text(current);
                if raw.trim().is_empty() && !label.is_empty() {
                    return Some(label);
                }
                break;
            }
            raw.push(' ');
            raw.push_str(&dom.text(current));
        }
        current = dom.get(current).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
    }

    let text = collapse_whitespace(&raw);
    (!text.is_empty()).then_some(text)
}

fn strip_once(text: &str, needle: &str) -> String {
    let stripped = if needle.is_empty() {
        text.to_string()
    } else {
        text.replacen(needle, "", 1)
    };
    collapse_whitespace(&stripped)
}

/// `A`..`Z`, then `AA`, `AB`, ... like spreadsheet columns.
pub(crate) fn answer_label(index: usize) -> String {
    let mut n = index + 1;
    let mut label = Vec::new();
    while n > 0 {
        n -= 1;
        label.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::extract::ExtractionRules;

    fn run(html: &str) -> Vec<QuizBlock> {
        let rules = ExtractionRules::default().compile().unwrap();
        extract(&parse_html(html), &rules)
    }

    fn answer_texts(q: &QuestionBlock) -> Vec<(&str, &str)> {
        q.answers
            .iter()
            .map(|a| (a.label.as_str(), a.text.as_str()))
            .collect()
    }

    #[test]
    fn test_answer_labels() {
        assert_eq!(answer_label(0), "A");
        assert_eq!(answer_label(2), "C");
        assert_eq!(answer_label(25), "Z");
        assert_eq!(answer_label(26), "AA");
        assert_eq!(answer_label(27), "AB");
    }

    #[test]
    fn test_label_for_and_wrapping_label() {
        let quizzes = run(
            r#"<div class="quiz"><h2>Check your understanding</h2>
              <fieldset><legend>Capital of France?</legend>
                <input type="radio" id="q1a" name="q1"><label for="q1a">Paris</label>
                <input type="radio" id="q1b" name="q1"><label for="q1b">Lyon</label>
              </fieldset>
              <div class="question"><p>Pick the primes.</p>
                <label><input type="checkbox" name="q2"> Two</label>
                <label><input type="checkbox" name="q2"> Nine</label>
              </div></div>"#,
        );
        assert_eq!(quizzes.len(), 1);
        let quiz = &quizzes[0];
        assert_eq!(quiz.title, "Check your understanding");
        assert_eq!(quiz.questions.len(), 2);
        assert_eq!(quiz.questions[0].text, "Capital of France?");
        assert_eq!(answer_texts(&quiz.questions[0]), [("A", "Paris"), ("B", "Lyon")]);
        assert_eq!(quiz.questions[1].ordinal, 2);
        assert_eq!(answer_texts(&quiz.questions[1]), [("A", "Two"), ("B", "Nine")]);
    }

    #[test]
    fn test_loose_text_parent_text_and_value_fallbacks() {
        let quizzes = run(
            r#"<form>
              <div class="question"><h4>Largest planet?</h4>
                <input type="radio" name="a"> Jupiter <br>
                <input type="radio" name="a"> Mars <br></div>
              <div class="question"><h4>Smallest planet?</h4>
                <span><input type="radio" name="b" value="m"></span>
                <input type="radio" name="b" value="Pluto (formerly)"><br></div>
            </form>"#,
        );
        let questions = &quizzes[0].questions;
        assert_eq!(quizzes[0].title, "Quiz 1");
        assert_eq!(answer_texts(&questions[0]), [("A", "Jupiter"), ("B", "Mars")]);
        assert_eq!(answer_texts(&questions[1]), [("A", "m"), ("B", "Pluto (formerly)")]);
    }

    #[test]
    fn test_select_options_skip_placeholder() {
        let quizzes = run(
            r#"<div class="assessment"><div class="question">
              <label>Boiling point of water?</label>
              <select><option>Select an answer</option><option></option>
                <option>100 C</option><option>50 C</option></select>
            </div></div>"#,
        );
        let question = &quizzes[0].questions[0];
        assert_eq!(question.text, "Boiling point of water?");
        assert_eq!(answer_texts(question), [("A", "100 C"), ("B", "50 C")]);
    }

    #[test]
    fn test_questions_and_quizzes_need_content() {
        // No text for the question, then no answers at all.
        let quizzes = run(
            r#"<div class="quiz">
              <div class="question"><input type="radio" name="x"></div>
              <div class="question"><p>Anyone there?</p><input type="text"></div>
            </div>"#,
        );
        assert!(quizzes.is_empty());
    }

    #[test]
    fn test_bare_questions_use_body_container() {
        let quizzes = run(
            r#"<h1>Module Review</h1>
            <div class="question"><p>True or false: the sky is blue.</p>
              <label><input type="radio" name="t">True</label>
              <label><input type="radio" name="t">False</label></div>"#,
        );
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].title, "Module Review");
        assert_eq!(quizzes[0].questions[0].answers.len(), 2);
    }

    #[test]
    fn test_decorative_quiz_class_falls_through_to_form() {
        let quizzes = run(
            r#"<div class="quiz-banner"><h2>Knowledge check</h2></div>
            <form><fieldset><legend>Capital of France?</legend>
              <label><input type="radio" name="c">Paris</label>
              <label><input type="radio" name="c">Lyon</label>
            </fieldset></form>"#,
        );
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].title, "Quiz 1");
        let question = &quizzes[0].questions[0];
        assert_eq!(question.text, "Capital of France?");
        assert_eq!(answer_texts(question), [("A", "Paris"), ("B", "Lyon")]);
    }
}
