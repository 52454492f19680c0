//! Plain-text rendering of client state for the terminal.

use std::fmt::Write;

use crate::conversation::ConversationController;
use crate::credential::CredentialManager;
use crate::models::{ChatMessage, Role};
use crate::registry::RegistryClient;

/// Document list for the active group filter, marking the selection.
pub fn render_documents(registry: &RegistryClient) -> String {
    let docs = registry.filtered_documents();
    let mut out = String::new();
    if docs.is_empty() {
        out.push_str("(no documents)\n");
        return out;
    }

    let _ = writeln!(out, "  {:<40} {:<16} {:>10}  UPLOADED", "FILENAME", "GROUP", "SIZE");
    for doc in docs {
        let marker = if registry.selected() == Some(doc.filename.as_str()) {
            '*'
        } else {
            ' '
        };
        let size = doc.size.map(format_size).unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {:<40} {:<16} {:>10}  {}",
            marker,
            doc.filename,
            registry.group_of(doc),
            size,
            doc.upload_time.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn render_groups(registry: &RegistryClient) -> String {
    let mut out = String::new();
    for name in registry.groups().iter() {
        let marker = if name == registry.group_filter() { '*' } else { ' ' };
        let _ = writeln!(out, "{} {}", marker, name);
    }
    out
}

pub fn render_message(msg: &ChatMessage) -> String {
    let mut out = String::new();
    let who = match msg.role() {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let _ = writeln!(out, "[{}] {}", who, msg.content());
    if msg.role() == Role::Assistant {
        if let Some(files) = msg.source_files().filter(|f| !f.is_empty()) {
            let _ = writeln!(out, "    sources: {}", files.join(", "));
        }
    }
    out
}

pub fn render_transcript(messages: &[ChatMessage]) -> String {
    if messages.is_empty() {
        return "(no messages)\n".to_string();
    }
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Status line for the chat area: busy indicator or last error.
pub fn render_chat_status(convo: &ConversationController) -> Option<String> {
    if convo.is_busy() {
        return Some("waiting for answer...".to_string());
    }
    convo.error().map(render_error)
}

pub fn render_key_panel(creds: &CredentialManager) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "key:    {}", mask_key(creds.key()));
    if let Some(status) = creds.status() {
        let _ = writeln!(out, "status: {}", status);
    }
    out
}

pub fn render_error(message: &str) -> String {
    format!("error: {}", message)
}

/// Show only the first 6 and last 4 characters of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::config::LabelsConfig;
    use crate::models::{DocumentRecord, UNASSIGNED};
    use std::sync::Arc;

    #[test]
    fn test_render_assistant_sources() {
        let msg = ChatMessage::assistant("Answer.", Some(vec!["a.pdf".into(), "b.pdf".into()]));
        let out = render_message(&msg);
        assert!(out.starts_with("[assistant] Answer."));
        assert!(out.contains("sources: a.pdf, b.pdf"));
    }

    #[test]
    fn test_render_user_has_no_sources_line() {
        let out = render_message(&ChatMessage::user("Q?"));
        assert_eq!(out, "[you] Q?\n");
    }

    #[test]
    fn test_render_empty_transcript() {
        assert_eq!(render_transcript(&[]), "(no messages)\n");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("sk-1234567890abcd"), "sk-123...abcd");
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[tokio::test]
    async fn test_render_documents_shows_unassigned_and_selection() {
        let fake = Arc::new(FakeBackend::with_files(vec![
            DocumentRecord::new("report.pdf"),
            DocumentRecord::new("q3.xlsx").with_group("Finance"),
        ]));
        let mut reg = RegistryClient::new(fake, LabelsConfig::default());
        reg.refresh().await;
        reg.select("report.pdf").await.unwrap();

        let out = render_documents(&reg);
        let report_line = out.lines().find(|l| l.contains("report.pdf")).unwrap();
        assert!(report_line.starts_with('*'));
        assert!(report_line.contains(UNASSIGNED));
        assert!(out.contains("Finance"));

        let groups = render_groups(&reg);
        assert!(groups.lines().next().unwrap().starts_with("* 全部"));
    }
}
