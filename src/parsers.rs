// WHY: model replies for some tasks follow a fixed layout that the CLI turns into structured JSON
// Parsing is lenient: missing sections give empty results, never errors

use anyhow::{Context, Result};
use regex_automata::meta::Regex;
use serde::Serialize;
use tracing::debug;

/// Heading that separates reflection questions from calming strategies
pub const CALMING_HEADING_PATTERN: &str = r"(?i)calming strategies:";
/// `1. question` lines
pub const QUESTION_LINE_PATTERN: &str = r"(?m)^[ \t]*[0-9]+\.[ \t]*([^\r\n]*)";
/// `[ ] strategy` tick-box lines
pub const STRATEGY_LINE_PATTERN: &str = r"(?m)^[ \t]*\[[ \t]*\][ \t]*([^\r\n]*)";
/// First line of text after the task label
pub const TASK_INSTRUCTION_PATTERN: &str = r"Task Instruction:\s*([^\r\n]+)";
/// Everything after the support label
pub const SUPPORT_PROMPT_PATTERN: &str = r"Support Prompt:\s*((?s:.+))";

/// Questions and tick-box strategies from a behaviour reflection sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReflectionSheet {
    pub questions: Vec<String>,
    pub strategies: Vec<String>,
}

/// The two labelled parts of a functional literacy activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiteracyActivity {
    pub task_instruction: Option<String>,
    pub support_prompt: Option<String>,
}

/// Compiled patterns for structured task replies
pub struct OutputParser {
    calming_heading: Regex,
    question_line: Regex,
    strategy_line: Regex,
    task_instruction: Regex,
    support_prompt: Regex,
}

impl OutputParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            calming_heading: Regex::new(CALMING_HEADING_PATTERN).context("Failed to compile calming heading pattern")?,
            question_line: Regex::new(QUESTION_LINE_PATTERN).context("Failed to compile question pattern")?,
            strategy_line: Regex::new(STRATEGY_LINE_PATTERN).context("Failed to compile strategy pattern")?,
            task_instruction: Regex::new(TASK_INSTRUCTION_PATTERN)
                .context("Failed to compile task instruction pattern")?,
            support_prompt: Regex::new(SUPPORT_PROMPT_PATTERN).context("Failed to compile support prompt pattern")?,
        })
    }

    /// Split a reflection sheet at the calming strategies heading
    ///
    /// Numbered lines before the heading are questions; `[ ]` lines between
    /// it and any repeated heading are strategies.
    pub fn parse_reflection_sheet(&self, text: &str) -> ReflectionSheet {
        let mut headings = self.calming_heading.find_iter(text);
        let (questions_text, strategies_text) = match headings.next() {
            Some(heading) => {
                let end = headings.next().map_or(text.len(), |next| next.start());
                (&text[..heading.start()], &text[heading.end()..end])
            }
            None => (text, ""),
        };

        let sheet = ReflectionSheet {
            questions: first_groups(&self.question_line, questions_text),
            strategies: first_groups(&self.strategy_line, strategies_text),
        };
        debug!(
            questions = sheet.questions.len(),
            strategies = sheet.strategies.len(),
            "Parsed reflection sheet"
        );
        sheet
    }

    pub fn parse_literacy_activity(&self, text: &str) -> LiteracyActivity {
        LiteracyActivity {
            task_instruction: first_group(&self.task_instruction, text),
            support_prompt: first_group(&self.support_prompt, text),
        }
    }
}

/// Trimmed, non-empty group 1 of every match
fn first_groups(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get_group(1))
        .map(|span| text[span.start..span.end].trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn first_group(pattern: &Regex, text: &str) -> Option<String> {
    let mut caps = pattern.create_captures();
    pattern.captures(text, &mut caps);
    let span = caps.get_group(1)?;
    let value = text[span.start..span.end].trim();
    (!value.is_empty()).then(|| value.to_string())
}
