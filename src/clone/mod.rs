pub mod attachments;
pub mod fields;

use std::fmt;
use std::time::Duration;

use tracing::Instrument;

use self::attachments::{replicate_attachments, AttachmentOutcome};
use self::fields::resolve_fields;
use crate::error::TrackerError;
use crate::model::fields::FieldSet;
use crate::model::target::TargetSpec;
use crate::model::ticket::SourceTicket;
use crate::providers::Tracker;
use crate::util::adf::{preview_text, sanitize_document};

pub const DEFAULT_PACING: Duration = Duration::from_millis(1000);

/// Steps after creation whose failure leaves the clone in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneStep {
    Description,
    Attachment(String),
    Link,
}

impl fmt::Display for CloneStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneStep::Description => f.write_str("description"),
            CloneStep::Attachment(name) => write!(f, "attachment {name}"),
            CloneStep::Link => f.write_str("link"),
        }
    }
}

#[derive(Debug)]
pub struct ClonedIssue {
    pub key: String,
    pub description: Result<(), TrackerError>,
    pub attachments: Vec<AttachmentOutcome>,
    pub link: Result<(), TrackerError>,
}

impl ClonedIssue {
    pub fn failures(&self) -> Vec<(CloneStep, &TrackerError)> {
        let mut failures = Vec::new();
        if let Err(e) = &self.description {
            failures.push((CloneStep::Description, e));
        }
        for outcome in &self.attachments {
            if let AttachmentOutcome::Failed { filename, error } = outcome {
                failures.push((CloneStep::Attachment(filename.clone()), error));
            }
        }
        if let Err(e) = &self.link {
            failures.push((CloneStep::Link, e));
        }
        failures
    }

    pub fn failed_steps(&self) -> Vec<CloneStep> {
        self.failures().into_iter().map(|(step, _)| step).collect()
    }
}

#[derive(Debug)]
pub enum TargetOutcome {
    /// Creation failed; nothing else ran for this target.
    CreateFailed(TrackerError),
    Cloned(ClonedIssue),
}

#[derive(Debug)]
pub struct TargetReport {
    pub project: String,
    pub outcome: TargetOutcome,
}

impl TargetReport {
    pub fn is_clean(&self) -> bool {
        match &self.outcome {
            TargetOutcome::CreateFailed(_) => false,
            TargetOutcome::Cloned(issue) => issue.failed_steps().is_empty(),
        }
    }

    pub fn cloned_key(&self) -> Option<&str> {
        match &self.outcome {
            TargetOutcome::Cloned(issue) => Some(&issue.key),
            TargetOutcome::CreateFailed(_) => None,
        }
    }
}

/// Fans one source ticket out to a list of targets, strictly in order.
pub struct Cloner<'a> {
    tracker: &'a dyn Tracker,
    pacing: Duration,
}

impl<'a> Cloner<'a> {
    pub fn new(tracker: &'a dyn Tracker, pacing: Duration) -> Self {
        Self { tracker, pacing }
    }

    /// Fetch `source_key` once and clone it into every target.
    ///
    /// Only the source fetch can fail the whole run.
    pub async fn run(
        &self,
        source_key: &str,
        targets: &[TargetSpec],
    ) -> Result<Vec<TargetReport>, TrackerError> {
        let source = self.tracker.get_issue(source_key).await?;
        tracing::info!(
            issue = %source.key,
            summary = source.fields.summary.as_deref().unwrap_or(""),
            attachments = source.fields.attachments.len(),
            targets = targets.len(),
            "fetched source from {}",
            self.tracker.name()
        );
        Ok(self.clone_to_targets(&source, targets).await)
    }

    /// One report per target, in input order.
    pub async fn clone_to_targets(
        &self,
        source: &SourceTicket,
        targets: &[TargetSpec],
    ) -> Vec<TargetReport> {
        let mut reports = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            let span = tracing::info_span!("target", project = %target.project);
            let outcome = self.clone_to(source, target).instrument(span).await;
            let created = matches!(outcome, TargetOutcome::Cloned(_));
            reports.push(TargetReport {
                project: target.project.clone(),
                outcome,
            });

            if created && i + 1 < targets.len() && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }
        reports
    }

    async fn clone_to(&self, source: &SourceTicket, target: &TargetSpec) -> TargetOutcome {
        let mut fields = resolve_fields(self.tracker, source, target).await;
        // The body may reference attachments that only exist after creation.
        fields.remove("description");

        let key = match self.tracker.create_issue(&fields).await {
            Ok(created) => created.key,
            Err(e) => {
                tracing::warn!("{e}");
                return TargetOutcome::CreateFailed(e);
            }
        };
        tracing::info!(issue = %key, fields = fields.len(), "created clone of {}", source.key);

        let description = self.update_description(source, &key).await;
        let attachments =
            replicate_attachments(self.tracker, &source.fields.attachments, &key).await;

        let link_type = target.link_type();
        let link = self.tracker.create_link(link_type, &source.key, &key).await;
        match &link {
            Ok(()) => tracing::info!(issue = %key, "linked to {} as {link_type}", source.key),
            Err(e) if e.is_relationship_not_found() => {
                tracing::warn!(issue = %key, "{e}; check link_type for {}", target.project)
            }
            Err(e) => tracing::warn!(issue = %key, "{e}"),
        }

        TargetOutcome::Cloned(ClonedIssue {
            key,
            description,
            attachments,
            link,
        })
    }

    async fn update_description(&self, source: &SourceTicket, key: &str) -> Result<(), TrackerError> {
        let body = sanitize_document(source.fields.description.as_ref());
        if let Some(preview) = preview_text(&body, 80) {
            tracing::debug!(issue = key, "description: {preview}");
        }
        let mut update = FieldSet::new();
        update.insert("description".into(), body);

        let result = self.tracker.update_issue(key, &update).await;
        match &result {
            Ok(()) => tracing::info!(issue = key, "description updated"),
            Err(e) => tracing::warn!(issue = key, "{e}"),
        }
        result
    }
}
