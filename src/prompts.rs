// WHY: prompt wording lives in a versioned TOML catalogue, not in code
// Templates are filled with `{name}` substitution and paired with the cleaned user text

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::normalizer::Normalizer;

/// One task's system prompt
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptTemplate {
    #[serde(default)]
    pub description: Option<String>,
    pub system: String,
}

/// Piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Field(&'a str),
}

impl PromptTemplate {
    fn segments(&self) -> Result<Vec<Segment<'_>>> {
        let text = self.system.as_str();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((position, ch)) = chars.next() {
            match ch {
                '{' | '}' if chars.peek().map(|&(_, next)| next) == Some(ch) => {
                    segments.push(Segment::Literal(&text[literal_start..position]));
                    segments.push(Segment::Brace(ch));
                    chars.next();
                    literal_start = position + 2;
                }
                '{' => {
                    let close = text[position..]
                        .find('}')
                        .map(|offset| position + offset)
                        .ok_or_else(|| anyhow!("Unterminated '{{' at byte {position}"))?;
                    let name = &text[position + 1..close];
                    if name.trim().is_empty() {
                        bail!("Empty placeholder '{{}}' at byte {position}");
                    }
                    if name.contains('{') {
                        bail!("Nested '{{' inside placeholder at byte {position}");
                    }
                    segments.push(Segment::Literal(&text[literal_start..position]));
                    segments.push(Segment::Field(name));
                    while chars.peek().is_some_and(|&(index, _)| index <= close) {
                        chars.next();
                    }
                    literal_start = close + 1;
                }
                '}' => bail!("Single '}}' at byte {position}"),
                _ => {}
            }
        }

        segments.push(Segment::Literal(&text[literal_start..]));
        Ok(segments)
    }

    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for segment in self.segments()? {
            if let Segment::Field(name) = segment {
                if !names.iter().any(|existing| existing == name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Fill every `{name}` from `vars`; `{{` and `}}` become literal braces
    pub fn render(&self, vars: &BTreeMap<String, String>) -> Result<String> {
        let mut rendered = String::with_capacity(self.system.len());
        for segment in self.segments()? {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Brace(brace) => rendered.push(brace),
                Segment::Field(name) => {
                    let value = vars
                        .get(name)
                        .ok_or_else(|| anyhow!("Missing value for placeholder '{name}'"))?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

/// Task name -> template mapping loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct Catalogue {
    pub version: u32,
    #[serde(default)]
    pub templates: BTreeMap<String, PromptTemplate>,
}

impl Catalogue {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalogue: Catalogue = toml::from_str(content).context("Failed to parse prompt catalogue")?;
        debug!(
            version = catalogue.version,
            templates = catalogue.templates.len(),
            "Parsed prompt catalogue"
        );
        Ok(catalogue)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt catalogue {}", path.display()))?;
        let catalogue = Self::from_toml_str(&content)?;
        info!("Loaded {} prompt templates from {}", catalogue.templates.len(), path.display());
        Ok(catalogue)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn get(&self, task: &str) -> Result<&PromptTemplate> {
        self.templates
            .get(task)
            .ok_or_else(|| anyhow!("Unknown task '{task}' (catalogue v{})", self.version))
    }
}

/// One chat-completion message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body for a chat-completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// One completion choice in a chat response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Response body from a chat-completion endpoint
///
/// Only `choices[].message` is read; every other field is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse chat response JSON")
    }

    /// Text of the first choice
    pub fn content(&self) -> Result<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| anyhow!("Chat response has no choices"))
    }
}

/// Render the task's system prompt and pair it with the cleaned user text
pub fn build_request(
    catalogue: &Catalogue,
    task: &str,
    vars: &BTreeMap<String, String>,
    user_input: &str,
    normalizer: &Normalizer,
) -> Result<ChatRequest> {
    let system = catalogue
        .get(task)?
        .render(vars)
        .with_context(|| format!("Failed to render template '{task}'"))?;
    let user = normalizer.normalize(user_input);

    Ok(ChatRequest {
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system.trim().to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user.trim().to_string(),
            },
        ],
    })
}

/// Parse `key=value` pairs as given on the command line
pub fn parse_vars<S: AsRef<str>>(pairs: &[S]) -> Result<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("Empty key in '{pair}'");
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}
