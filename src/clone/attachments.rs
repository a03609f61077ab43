use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::TrackerError;
use crate::model::ticket::Attachment;
use crate::providers::Tracker;

/// Images travel inside the description as media nodes.
const INLINE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp"];

/// Extensions the tracker refuses as direct uploads; these are zipped first.
const ARCHIVED_EXTENSIONS: &[&str] = &[
    "msg", "eml", "exe", "dll", "bat", "cmd", "sh", "ini", "sys", "db", "log",
];

#[derive(Debug)]
pub enum AttachmentOutcome {
    SkippedInline {
        filename: String,
    },
    Uploaded {
        filename: String,
        uploaded_as: String,
    },
    Failed {
        filename: String,
        error: TrackerError,
    },
}

fn is_inline_image(attachment: &Attachment) -> bool {
    attachment
        .extension()
        .is_some_and(|ext| INLINE_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn needs_archive(attachment: &Attachment) -> bool {
    attachment
        .extension()
        .is_some_and(|ext| ARCHIVED_EXTENSIONS.contains(&ext.as_str()))
}

/// Wrap `bytes` in a single-entry zip named after the original file.
pub fn archive(filename: &str, bytes: &[u8]) -> Result<Vec<u8>, TrackerError> {
    let archive_error = |detail: String| TrackerError::Archive {
        filename: filename.to_string(),
        detail,
    };
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(filename, options)
        .map_err(|e| archive_error(e.to_string()))?;
    zip.write_all(bytes)
        .map_err(|e| archive_error(e.to_string()))?;
    let cursor = zip.finish().map_err(|e| archive_error(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Copy every non-image attachment onto `issue_key`.
///
/// Attachments are handled one at a time; a failure is recorded and the
/// remaining attachments are still attempted.
pub async fn replicate_attachments(
    tracker: &dyn Tracker,
    attachments: &[Attachment],
    issue_key: &str,
) -> Vec<AttachmentOutcome> {
    let mut outcomes = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        let filename = attachment.filename.clone();
        if is_inline_image(attachment) {
            tracing::debug!(attachment = %filename, "skipping inline image");
            outcomes.push(AttachmentOutcome::SkippedInline { filename });
            continue;
        }

        match replicate_one(tracker, attachment, issue_key).await {
            Ok(uploaded_as) => {
                tracing::info!(
                    issue = issue_key,
                    attachment = %filename,
                    bytes = attachment.size,
                    "uploaded as {uploaded_as}"
                );
                outcomes.push(AttachmentOutcome::Uploaded {
                    filename,
                    uploaded_as,
                });
            }
            Err(error) => {
                tracing::warn!(issue = issue_key, attachment = %filename, "{error}");
                outcomes.push(AttachmentOutcome::Failed { filename, error });
            }
        }
    }
    outcomes
}

async fn replicate_one(
    tracker: &dyn Tracker,
    attachment: &Attachment,
    issue_key: &str,
) -> Result<String, TrackerError> {
    let bytes = tracker.download(&attachment.content).await?;
    let (name, payload) = if needs_archive(attachment) {
        (
            format!("{}.zip", attachment.filename),
            archive(&attachment.filename, &bytes)?,
        )
    } else {
        (attachment.filename.clone(), bytes)
    };
    tracker.upload(issue_key, &name, payload).await?;
    Ok(name)
}
