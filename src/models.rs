//! Core data models shared by the controllers and the backend client.
//!
//! These types cover the chat transcript, the document registry, and the
//! JSON bodies exchanged with the backend.

use serde::{Deserialize, Deserializer, Serialize};

/// Group value meaning "no filter". Heads every [`GroupSet`].
pub const ALL_GROUPS: &str = "全部";

/// Group the backend assigns to documents that were never grouped.
pub const UNASSIGNED: &str = "未分组";

/// Storage key holding the serialized transcript.
pub const TRANSCRIPT_KEY: &str = "ds_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_source_files"
    )]
    source_files: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            source_files: None,
        }
    }

    pub fn assistant(content: impl Into<String>, source_files: Option<Vec<String>>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            source_files,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_files(&self) -> Option<&[String]> {
        self.source_files.as_deref()
    }

    /// The `{role, content}` pair sent to `/ask/`.
    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Older snapshots and some backend versions send `source_files` as a single
/// string instead of a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceFilesRepr {
    List(Vec<String>),
    One(String),
}

fn deserialize_source_files<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr: Option<SourceFilesRepr> = Option::deserialize(deserializer)?;
    Ok(repr.map(|r| match r {
        SourceFilesRepr::List(files) => files,
        SourceFilesRepr::One(file) => vec![file],
    }))
}

/// Metadata for one uploaded document, as listed by `GET /files/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub filename: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub upload_time: Option<String>,
}

impl DocumentRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            group: None,
            original_filename: None,
            size: None,
            upload_time: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// True when the document has no group or carries the backend's
    /// "unassigned" marker.
    pub fn is_unassigned(&self, unassigned: &str) -> bool {
        match self.group.as_deref() {
            None => true,
            Some(g) => g.trim().is_empty() || g == unassigned,
        }
    }
}

/// Distinct group names, always headed by the "all" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSet {
    sentinel: String,
    names: Vec<String>,
}

impl GroupSet {
    /// A set holding only the sentinel.
    pub fn sentinel_only(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            names: Vec::new(),
        }
    }

    /// Build from backend group names, keeping first-seen order and
    /// dropping duplicates and any name equal to the sentinel.
    pub fn from_names<I, S>(sentinel: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::sentinel_only(sentinel);
        for name in names {
            let name = name.into();
            if name != set.sentinel && !set.names.contains(&name) {
                set.names.push(name);
            }
        }
        set
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn is_sentinel(&self, name: &str) -> bool {
        name == self.sentinel
    }

    /// Real group names, excluding the sentinel.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Sentinel first, then every group name.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.sentinel.as_str()).chain(self.names.iter().map(String::as_str))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.is_sentinel(name) || self.names.iter().any(|n| n == name)
    }

    /// Number of entries including the sentinel.
    pub fn len(&self) -> usize {
        self.names.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

// ============ Wire bodies ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /ask/`. `group` is omitted entirely when no filter applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskAnswer {
    pub answer: String,
    #[serde(default, deserialize_with = "deserialize_source_files")]
    pub source_files: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadOutcome {
    #[serde(default)]
    pub text: String,
    pub filename: String,
    #[serde(default)]
    pub original_filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FilesBody {
    #[serde(default)]
    pub files: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupsBody {
    #[serde(default)]
    pub groups: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentBody {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_serializes_without_sources() {
        let msg = ChatMessage::user("hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_assistant_message_keeps_sources() {
        let msg = ChatMessage::assistant("answer", Some(vec!["a.pdf".into(), "b.docx".into()]));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["source_files"], json!(["a.pdf", "b.docx"]));
        assert_eq!(msg.source_files().unwrap().len(), 2);
    }

    #[test]
    fn test_source_files_accepts_single_string() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "x",
            "source_files": "only.pdf"
        }))
        .unwrap();
        assert_eq!(msg.source_files(), Some(&["only.pdf".to_string()][..]));
    }

    #[test]
    fn test_source_files_null_is_none() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "x",
            "source_files": null
        }))
        .unwrap();
        assert!(msg.source_files().is_none());
    }

    #[test]
    fn test_ask_request_omits_missing_group() {
        let req = AskRequest {
            messages: vec![ChatMessage::user("q").to_wire()],
            group: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"messages": [{"role": "user", "content": "q"}]}));
    }

    #[test]
    fn test_group_set_dedups_and_heads_with_sentinel() {
        let set = GroupSet::from_names(ALL_GROUPS, ["Finance", "未分组", "Finance", "全部", "HR"]);
        let all: Vec<&str> = set.iter().collect();
        assert_eq!(all, vec!["全部", "Finance", "未分组", "HR"]);
        assert_eq!(set.len(), 4);
        assert!(set.contains("HR"));
        assert!(set.is_sentinel("全部"));
    }

    #[test]
    fn test_document_record_unassigned() {
        let rec = DocumentRecord::new("a.pdf");
        assert!(rec.is_unassigned(UNASSIGNED));
        assert!(rec.clone().with_group(UNASSIGNED).is_unassigned(UNASSIGNED));
        assert!(!rec.with_group("Finance").is_unassigned(UNASSIGNED));
    }

    #[test]
    fn test_document_record_tolerates_extra_fields() {
        let rec: DocumentRecord = serde_json::from_value(json!({
            "filename": "report.pdf",
            "original_filename": "report.pdf",
            "size": 1024,
            "upload_time": "2025-01-01 10:00:00",
            "group": "Finance",
            "extra": true
        }))
        .unwrap();
        assert_eq!(rec.size, Some(1024));
        assert_eq!(rec.group.as_deref(), Some("Finance"));
    }
}
