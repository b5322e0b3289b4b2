//! Wire format of the console transport and WhatsApp markup conversion.

use ducker_core::{
    error::DuckerError,
    message::{ChatPresence, InboundMessage, MediaRef},
};
use serde::{Deserialize, Serialize};

/// One outbound action, printed as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OutboundEvent {
    Text {
        chat: String,
        text: String,
    },
    Mention {
        chat: String,
        text: String,
        mentioned: String,
    },
    Media {
        chat: String,
        media: MediaRef,
        caption: String,
        gif_loop: bool,
    },
    Presence {
        chat: String,
        state: ChatPresence,
    },
}

impl OutboundEvent {
    pub fn to_line(&self) -> Result<String, DuckerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse one stdin line. Blank lines yield `None`.
pub(super) fn parse_inbound(line: &str) -> Result<Option<InboundMessage>, DuckerError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Convert Markdown the model tends to emit into WhatsApp markup.
///
/// - `# Header` (any level) -> `*Header*`
/// - `**bold**` -> `*bold*`
/// - `[text](url)` -> `text (url)`
pub fn sanitize_for_whatsapp(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let header = trimmed.trim_start_matches('#');
            if header.len() < trimmed.len() && header.starts_with(' ') {
                return format!("*{}*", header.trim());
            }
            convert_bold(&convert_links(line))
        })
        .collect();

    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn convert_links(line: &str) -> String {
    let mut result = line.to_string();
    let mut from = 0;
    while let Some(open) = result[from..].find('[').map(|i| i + from) {
        let Some(mid) = result[open..].find("](").map(|i| i + open) else {
            break;
        };
        let Some(close) = result[mid + 2..].find(')').map(|i| i + mid + 2) else {
            break;
        };
        let replacement = format!("{} ({})", &result[open + 1..mid], &result[mid + 2..close]);
        result.replace_range(open..=close, &replacement);
        from = open + replacement.len();
    }
    result
}

fn convert_bold(line: &str) -> String {
    let mut result = line.to_string();
    while let Some(start) = result.find("**") {
        let Some(end) = result[start + 2..].find("**").map(|i| i + start + 2) else {
            break;
        };
        let inner = result[start + 2..end].to_string();
        result.replace_range(start..end + 2, &format!("*{inner}*"));
    }
    result
}
