//! Client-side cache of backend document metadata.
//!
//! [`RegistryClient`] mirrors the backend's document list and group names,
//! tracks the selected document and its text, and issues the mutating
//! calls (upload, rename, delete, set-group).
//!
//! # Reconciliation
//!
//! | Operation | After success |
//! |-----------|---------------|
//! | upload | re-fetch documents and groups; select the stored filename |
//! | rename | re-fetch documents and groups; follow the selection |
//! | delete | drop the record locally; re-fetch groups only |
//! | set group | re-fetch documents and groups |
//!
//! Full re-fetches pick up server-side side effects such as collision
//! renames (`report.pdf` stored as `report_1.pdf`). Delete is the exception:
//! the record is removed from the cache directly.
//!
//! Blank inputs (`rename` to an empty or unchanged name, `set_group` with a
//! blank group) are skipped without a request; anything else is sent
//! untrimmed. Delete requires an explicit
//! [`Confirmation`].

use std::sync::Arc;

use crate::backend::{Backend, FileUpload};
use crate::config::LabelsConfig;
use crate::error::{messages, ClientError, ClientResult};
use crate::models::{DocumentRecord, GroupSet, UploadOutcome};

/// The user's answer to "delete this file?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

pub struct RegistryClient {
    backend: Arc<dyn Backend>,
    labels: LabelsConfig,
    documents: Vec<DocumentRecord>,
    groups: GroupSet,
    group_filter: String,
    selected: Option<String>,
    content: Option<String>,
    uploading: bool,
    loading_content: bool,
    upload_error: Option<String>,
    error: Option<String>,
}

impl RegistryClient {
    pub fn new(backend: Arc<dyn Backend>, labels: LabelsConfig) -> Self {
        let groups = GroupSet::sentinel_only(labels.all_groups.clone());
        let group_filter = labels.all_groups.clone();
        Self {
            backend,
            labels,
            documents: Vec::new(),
            groups,
            group_filter,
            selected: None,
            content: None,
            uploading: false,
            loading_content: false,
            upload_error: None,
            error: None,
        }
    }

    // ============ Reads ============

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn groups(&self) -> &GroupSet {
        &self.groups
    }

    pub fn group_filter(&self) -> &str {
        &self.group_filter
    }

    /// Documents in the active group, or all of them under the sentinel.
    pub fn filtered_documents(&self) -> Vec<&DocumentRecord> {
        if self.groups.is_sentinel(&self.group_filter) {
            return self.documents.iter().collect();
        }
        self.documents
            .iter()
            .filter(|d| self.group_of(d) == self.group_filter)
            .collect()
    }

    /// Display group for a record; missing groups read as "unassigned".
    pub fn group_of<'a>(&'a self, record: &'a DocumentRecord) -> &'a str {
        if record.is_unassigned(&self.labels.unassigned) {
            &self.labels.unassigned
        } else {
            record.group.as_deref().unwrap_or(&self.labels.unassigned)
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_loading_content(&self) -> bool {
        self.loading_content
    }

    pub fn upload_error(&self) -> Option<&str> {
        self.upload_error.as_deref()
    }

    /// Last file-operation error (list, rename, delete, group, content).
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_group_filter(&mut self, name: impl Into<String>) {
        self.group_filter = name.into();
    }

    // ============ Fetches ============

    /// Replace the cache with the backend's list. A transport failure empties
    /// the cache instead of leaving stale entries.
    pub async fn list_documents(&mut self) -> &[DocumentRecord] {
        self.error = None;
        match self.backend.list_files().await {
            Ok(files) => self.documents = files,
            Err(e) => {
                tracing::warn!(error = %e, "could not list documents");
                self.error = Some(e.display_message(messages::LIST_FAILED));
                self.documents.clear();
            }
        }
        &self.documents
    }

    pub async fn list_groups(&mut self) -> &GroupSet {
        let sentinel = self.labels.all_groups.clone();
        self.groups = match self.backend.list_groups().await {
            Ok(names) => GroupSet::from_names(sentinel, names),
            Err(e) => {
                tracing::warn!(error = %e, "could not list groups");
                GroupSet::sentinel_only(sentinel)
            }
        };
        if !self.groups.contains(&self.group_filter) {
            self.group_filter = self.groups.sentinel().to_string();
        }
        &self.groups
    }

    /// Documents first, then groups.
    pub async fn refresh(&mut self) {
        self.list_documents().await;
        self.list_groups().await;
    }

    // ============ Mutations ============

    /// Upload a picked file. `None` means nothing was picked.
    ///
    /// On success the stored file becomes the selection and its extracted
    /// text the content.
    pub async fn upload(&mut self, file: Option<FileUpload>) -> ClientResult<UploadOutcome> {
        let Some(file) = file else {
            let err = ClientError::Validation(messages::NO_FILE_SELECTED);
            self.upload_error = Some(err.display_message(messages::UPLOAD_FAILED));
            return Err(err);
        };

        self.uploading = true;
        self.upload_error = None;
        self.content = None;
        let result = self.backend.upload(file).await;
        self.uploading = false;

        match result {
            Ok(outcome) => {
                tracing::info!(filename = %outcome.filename, "uploaded");
                self.content = Some(outcome.text.clone());
                self.selected = Some(outcome.filename.clone());
                self.refresh().await;
                Ok(outcome)
            }
            Err(e) => {
                self.upload_error = Some(e.display_message(messages::UPLOAD_FAILED));
                Err(e)
            }
        }
    }

    /// Returns `Ok(false)` without a request when `new_name` is blank or
    /// unchanged. A non-blank name is sent as given.
    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> ClientResult<bool> {
        if new_name.trim().is_empty() || new_name == old_name {
            return Ok(false);
        }

        self.error = None;
        if let Err(e) = self.backend.rename(old_name, new_name).await {
            self.error = Some(e.display_message(messages::RENAME_FAILED));
            return Err(e);
        }

        tracing::info!(%old_name, %new_name, "renamed");
        self.refresh().await;
        if self.selected.as_deref() == Some(old_name) {
            self.selected = Some(new_name.to_string());
        }
        Ok(true)
    }

    /// Returns `Ok(false)` without a request when the user declined.
    pub async fn remove(
        &mut self,
        filename: &str,
        confirmation: Confirmation,
    ) -> ClientResult<bool> {
        if confirmation == Confirmation::Declined {
            return Ok(false);
        }

        self.error = None;
        if let Err(e) = self.backend.delete(filename).await {
            self.error = Some(e.display_message(messages::DELETE_FAILED));
            return Err(e);
        }

        tracing::info!(%filename, "deleted");
        self.documents.retain(|d| d.filename != filename);
        if self.selected.as_deref() == Some(filename) {
            self.selected = None;
            self.content = None;
        }
        self.list_groups().await;
        Ok(true)
    }

    /// Returns `Ok(false)` without a request when `group` is blank.
    pub async fn set_group(&mut self, filename: &str, group: &str) -> ClientResult<bool> {
        if group.trim().is_empty() {
            return Ok(false);
        }

        self.error = None;
        if let Err(e) = self.backend.set_group(filename, group).await {
            self.error = Some(e.display_message(messages::GROUP_FAILED));
            return Err(e);
        }

        tracing::info!(%filename, %group, "group set");
        self.refresh().await;
        Ok(true)
    }

    /// Select a document and load its extracted text.
    pub async fn select(&mut self, filename: &str) -> ClientResult<()> {
        self.selected = Some(filename.to_string());
        self.content = None;
        self.error = None;
        self.loading_content = true;
        let result = self.backend.fetch_content(filename).await;
        self.loading_content = false;

        match result {
            Ok(text) => {
                self.content = Some(text);
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.display_message(messages::READ_CONTENT_FAILED));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::models::{ALL_GROUPS, UNASSIGNED};

    fn registry(fake: &Arc<FakeBackend>) -> RegistryClient {
        RegistryClient::new(fake.clone(), LabelsConfig::default())
    }

    fn seeded() -> Arc<FakeBackend> {
        Arc::new(FakeBackend::with_files(vec![
            DocumentRecord::new("a.pdf").with_group("Finance"),
            DocumentRecord::new("b.docx").with_group(UNASSIGNED),
            DocumentRecord::new("c.xlsx"),
        ]))
    }

    #[tokio::test]
    async fn test_list_documents_and_groups() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        assert_eq!(reg.documents().len(), 3);
        let groups: Vec<&str> = reg.groups().iter().collect();
        assert_eq!(groups, vec![ALL_GROUPS, "Finance", UNASSIGNED]);
    }

    #[tokio::test]
    async fn test_list_failure_yields_empty_and_sentinel() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        fake.fail_with(ClientError::Transport("down".into()));
        assert!(reg.list_documents().await.is_empty());
        assert_eq!(reg.list_groups().await.len(), 1);
        assert_eq!(reg.error(), Some(messages::LIST_FAILED));
    }

    #[tokio::test]
    async fn test_successful_relist_clears_list_error() {
        let fake = seeded();
        let mut reg = registry(&fake);
        fake.fail_with(ClientError::Transport("down".into()));
        reg.list_documents().await;
        assert_eq!(reg.error(), Some(messages::LIST_FAILED));

        fake.recover();
        assert_eq!(reg.list_documents().await.len(), 3);
        assert!(reg.error().is_none());
    }

    #[tokio::test]
    async fn test_upload_selects_and_refreshes() {
        let fake = Arc::new(FakeBackend::default());
        let mut reg = registry(&fake);
        let outcome = reg
            .upload(Some(FileUpload::new("report.pdf", b"abc".to_vec())))
            .await
            .unwrap();
        assert_eq!(outcome.filename, "report.pdf");
        assert_eq!(reg.selected(), Some("report.pdf"));
        assert_eq!(reg.content(), Some("abc"));
        assert!(!reg.is_uploading());
        assert_eq!(fake.calls(), vec!["upload", "list_files", "list_groups"]);
        let doc = &reg.documents()[0];
        assert_eq!(doc.filename, "report.pdf");
        assert_eq!(reg.group_of(doc), UNASSIGNED);
    }

    #[tokio::test]
    async fn test_upload_collision_selects_stored_name() {
        let fake = Arc::new(FakeBackend::with_files(vec![DocumentRecord::new("report.pdf")]));
        let mut reg = registry(&fake);
        reg.upload(Some(FileUpload::new("report.pdf", Vec::new())))
            .await
            .unwrap();
        assert_eq!(reg.selected(), Some("report_1.pdf"));
        assert_eq!(reg.documents().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_without_file_sends_nothing() {
        let fake = Arc::new(FakeBackend::default());
        let mut reg = registry(&fake);
        let err = reg.upload(None).await.unwrap_err();
        assert_eq!(err, ClientError::Validation(messages::NO_FILE_SELECTED));
        assert_eq!(reg.upload_error(), Some(messages::NO_FILE_SELECTED));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_errors_map_to_messages() {
        let fake = Arc::new(FakeBackend::default());
        let mut reg = registry(&fake);

        fake.fail_with(ClientError::Application("仅支持docx、xlsx、pdf文件".into()));
        let _ = reg.upload(Some(FileUpload::new("x.txt", Vec::new()))).await;
        assert_eq!(reg.upload_error(), Some("仅支持docx、xlsx、pdf文件"));

        fake.fail_with(ClientError::Transport("refused".into()));
        let _ = reg.upload(Some(FileUpload::new("x.pdf", Vec::new()))).await;
        assert_eq!(reg.upload_error(), Some(messages::UPLOAD_FAILED));
        assert!(reg.selected().is_none());
    }

    #[tokio::test]
    async fn test_rename_noop_cases_send_nothing() {
        let fake = seeded();
        let mut reg = registry(&fake);
        assert!(!reg.rename("a.pdf", "a.pdf").await.unwrap());
        assert!(!reg.rename("a.pdf", "").await.unwrap());
        assert!(!reg.rename("a.pdf", "   ").await.unwrap());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rename_sends_untrimmed_name() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        assert!(reg.rename("a.pdf", "a.pdf ").await.unwrap());
        assert!(reg.documents().iter().any(|d| d.filename == "a.pdf "));
        assert_eq!(fake.call_count("rename"), 1);
    }

    #[tokio::test]
    async fn test_rename_follows_selection() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        reg.select("a.pdf").await.unwrap();
        assert!(reg.rename("a.pdf", "annual.pdf").await.unwrap());
        assert_eq!(reg.selected(), Some("annual.pdf"));
        assert!(reg.documents().iter().any(|d| d.filename == "annual.pdf"));
        assert!(!reg.documents().iter().any(|d| d.filename == "a.pdf"));
    }

    #[tokio::test]
    async fn test_rename_conflict_surfaces_server_error() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        let err = reg.rename("a.pdf", "b.docx").await.unwrap_err();
        assert_eq!(err, ClientError::Application("新文件名已存在".into()));
        assert_eq!(reg.error(), Some("新文件名已存在"));
        assert_eq!(reg.documents().len(), 3);
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        let before = reg.documents().to_vec();
        let calls_before = fake.calls().len();

        assert!(!reg.remove("a.pdf", Confirmation::Declined).await.unwrap());
        assert_eq!(reg.documents(), before.as_slice());
        assert_eq!(fake.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_remove_drops_locally_without_refetch() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        reg.select("a.pdf").await.unwrap();

        assert!(reg.remove("a.pdf", Confirmation::Confirmed).await.unwrap());
        assert!(!reg.documents().iter().any(|d| d.filename == "a.pdf"));
        assert!(reg.selected().is_none());
        assert!(reg.content().is_none());
        assert_eq!(fake.call_count("list_files"), 1);
        assert_eq!(fake.call_count("list_groups"), 2);
        assert!(!reg.groups().contains("Finance"));
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_cache() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        fake.fail_with(ClientError::Transport("down".into()));
        assert!(reg.remove("a.pdf", Confirmation::Confirmed).await.is_err());
        assert_eq!(reg.documents().len(), 3);
        assert_eq!(reg.error(), Some(messages::DELETE_FAILED));
    }

    #[tokio::test]
    async fn test_set_group_blank_sends_nothing() {
        let fake = seeded();
        let mut reg = registry(&fake);
        assert!(!reg.set_group("a.pdf", "").await.unwrap());
        assert!(!reg.set_group("a.pdf", "  ").await.unwrap());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_group_refreshes_both_listings() {
        let fake = seeded();
        let mut reg = registry(&fake);
        assert!(reg.set_group("c.xlsx", "HR").await.unwrap());
        assert_eq!(fake.calls(), vec!["set_group", "list_files", "list_groups"]);
        assert!(reg.groups().contains("HR"));
    }

    #[tokio::test]
    async fn test_filtered_documents() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        assert_eq!(reg.filtered_documents().len(), 3);

        reg.set_group_filter("Finance");
        let names: Vec<&str> = reg
            .filtered_documents()
            .iter()
            .map(|d| d.filename.as_str())
            .collect();
        assert_eq!(names, vec!["a.pdf"]);

        reg.set_group_filter(UNASSIGNED);
        assert_eq!(reg.filtered_documents().len(), 2);
    }

    #[tokio::test]
    async fn test_stale_filter_resets_to_sentinel() {
        let fake = seeded();
        let mut reg = registry(&fake);
        reg.refresh().await;
        reg.set_group_filter("Finance");
        reg.remove("a.pdf", Confirmation::Confirmed).await.unwrap();
        assert_eq!(reg.group_filter(), ALL_GROUPS);
    }

    #[tokio::test]
    async fn test_select_missing_file_sets_error() {
        let fake = seeded();
        let mut reg = registry(&fake);
        fake.fail_with(ClientError::Transport("down".into()));
        assert!(reg.select("a.pdf").await.is_err());
        assert_eq!(reg.selected(), Some("a.pdf"));
        assert_eq!(reg.error(), Some(messages::READ_CONTENT_FAILED));
        fake.recover();
        reg.select("a.pdf").await.unwrap();
        assert_eq!(reg.content(), Some("content of a.pdf"));
        assert!(reg.error().is_none());
    }
}
