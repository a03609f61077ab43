pub mod jira;

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::model::fields::{ClonedIssueRef, FieldAvailability, FieldSet};
use crate::model::ticket::SourceTicket;

/// Remote issue tracker operations the clone pipeline depends on.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;
    async fn get_issue(&self, key: &str) -> Result<SourceTicket, TrackerError>;
    /// Fields the create screen of `project`/`issue_type_id` accepts.
    async fn create_fields(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> Result<FieldAvailability, TrackerError>;
    async fn create_issue(&self, fields: &FieldSet) -> Result<ClonedIssueRef, TrackerError>;
    async fn update_issue(&self, key: &str, fields: &FieldSet) -> Result<(), TrackerError>;
    async fn create_link(&self, link_type: &str, from: &str, to: &str)
        -> Result<(), TrackerError>;
    async fn download(&self, url: &str) -> Result<Vec<u8>, TrackerError>;
    async fn upload(&self, key: &str, filename: &str, bytes: Vec<u8>)
        -> Result<(), TrackerError>;
}
