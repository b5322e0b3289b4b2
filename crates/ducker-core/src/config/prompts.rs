use std::collections::HashMap;

use super::shellexpand;

/// Prompt templates, optionally overridden by `{data_dir}/prompts/SYSTEM_PROMPT.md`.
///
/// The file uses `## Section` headers. Missing files or sections fall back
/// to the built-in templates.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// Persona for private conversations.
    pub private: String,
    /// Default persona for groups without a custom prompt.
    pub group: String,
    /// Joke instruction. The do-not-repeat list is appended after it.
    pub joke: String,
    /// Pickup-line instruction with a `{target}` placeholder.
    pub pickup: String,
    /// Story instruction with a `{genre}` placeholder.
    pub story: String,
    /// Explanation instruction with a `{text}` placeholder.
    pub explain: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            private: "You are DuckerIA, the virtual assistant of Hyper Ducker, a small web application studio.\n\
                      - You are a conversation partner, not a salesperson. The company is not selling services right now.\n\
                      - Be relaxed, friendly, and informal. Keep the user engaged with natural follow-up questions.\n\
                      - Never share customer data, promise prices or discounts, or offer a human handoff.\n\
                      - If you do not know something, say so plainly.\n\
                      - Do not use emojis.".into(),
            group: "You are DuckerIA, a member of a WhatsApp group.\n\
                    - Be relaxed and natural. You are part of the group, not a help desk.\n\
                    - Answer only what was asked, directly. One or two short sentences.\n\
                    - Do not push topics or steer the conversation to technology.\n\
                    - Be respectful with everyone. Do not use emojis.\n\
                    The recent group conversation follows. Use it only for context.".into(),
            joke: "You are a laid-back comedian. Tell one short, funny joke suitable for all audiences.\n\
                   - At most 3-4 sentences.\n\
                   - Any style works: puns, situations, one-liners.\n\
                   - Do not use emojis.\n\
                   - Reply ONLY with the joke, no commentary.".into(),
            pickup: "You write creative, funny pickup lines suitable for all audiences.\n\
                     Write one pickup line aimed at {target}.\n\
                     - At most 3-4 sentences, nothing offensive.\n\
                     - Do not use emojis.\n\
                     - Reply ONLY with the pickup line, no commentary.".into(),
            story: "You are a creative storyteller.\n\
                    Write a story in the genre: {genre}.\n\
                    - Give it a beginning, a middle, and an end, in 5 to 10 paragraphs.\n\
                    - Keep it suitable for all audiences.\n\
                    - Do not use emojis.\n\
                    - Reply ONLY with the story, no commentary.".into(),
            explain: "Explain the following message in simple, clear terms. \
                      Give context where it helps, and keep the explanation short.\n\n\
                      Message: \"{text}\"".into(),
        }
    }
}

impl Prompts {
    /// Load overrides from `{data_dir}/prompts/SYSTEM_PROMPT.md`.
    pub fn load(data_dir: &str) -> Self {
        let mut prompts = Self::default();
        let dir = shellexpand(data_dir);

        let prompt_path = format!("{dir}/prompts/SYSTEM_PROMPT.md");
        if let Ok(content) = std::fs::read_to_string(&prompt_path) {
            prompts.apply_sections(&parse_markdown_sections(&content));
            tracing::info!("loaded prompts from {prompt_path}");
        }

        prompts
    }

    fn apply_sections(&mut self, sections: &HashMap<String, String>) {
        let slots: [(&str, &mut String); 6] = [
            ("Private", &mut self.private),
            ("Group", &mut self.group),
            ("Joke", &mut self.joke),
            ("Pickup", &mut self.pickup),
            ("Story", &mut self.story),
            ("Explain", &mut self.explain),
        ];
        for (name, slot) in slots {
            if let Some(v) = sections.get(name) {
                *slot = v.clone();
            }
        }
    }
}

/// Parse a markdown file with `## Section` headers into a map of section name -> body.
pub(super) fn parse_markdown_sections(content: &str) -> HashMap<String, String> {
    let mut sections = HashMap::new();
    let mut current_key: Option<String> = None;
    let mut current_body = String::new();

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            if let Some(key) = current_key.take() {
                let trimmed = current_body.trim().to_string();
                if !trimmed.is_empty() {
                    sections.insert(key, trimmed);
                }
            }
            current_key = Some(header.trim().to_string());
            current_body.clear();
        } else if current_key.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }

    if let Some(key) = current_key {
        let trimmed = current_body.trim().to_string();
        if !trimmed.is_empty() {
            sections.insert(key, trimmed);
        }
    }

    sections
}
