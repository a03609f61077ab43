use anyhow::{bail, Context, Result};

use crate::clone::attachments::AttachmentOutcome;
use crate::clone::{Cloner, TargetOutcome, TargetReport};
use crate::config;
use crate::providers::jira::JiraProvider;

#[derive(Debug)]
pub enum Command {
    Help,
    Clone { source_key: String },
}

const USAGE: &str = "Usage: fanout <ISSUE-KEY>\n\nExample:\n  fanout SUP-1234";

/// Parse the process arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<Command> {
    let mut source_key = None;
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Command::Help),
            flag if flag.starts_with('-') => bail!("Unknown option {flag}\n\n{USAGE}"),
            key if source_key.is_none() => source_key = Some(key.trim().to_string()),
            extra => bail!("Unexpected argument {extra}\n\n{USAGE}"),
        }
    }
    match source_key.filter(|k| !k.is_empty()) {
        Some(source_key) => Ok(Command::Clone { source_key }),
        None => bail!("{USAGE}"),
    }
}

/// Clone `source_key` into every configured target and print a report.
pub async fn handle_clone(source_key: &str) -> Result<()> {
    let settings = config::load_settings()?;
    let provider = JiraProvider::new(
        &settings.connection.site,
        &settings.connection.email,
        &settings.connection.api_token,
    );
    tracing::info!(
        site = provider.base_url(),
        targets = settings.targets.len(),
        "cloning {source_key}"
    );

    let cloner = Cloner::new(&provider, settings.pacing);
    let reports = cloner
        .run(source_key, &settings.targets)
        .await
        .with_context(|| format!("Cannot clone {source_key}"))?;

    for line in render_report(&reports) {
        println!("{line}");
    }
    Ok(())
}

pub fn render_report(reports: &[TargetReport]) -> Vec<String> {
    let mut lines = Vec::new();
    for report in reports {
        match &report.outcome {
            TargetOutcome::CreateFailed(e) => {
                lines.push(format!("✗ {}: not created: {e}", report.project));
            }
            TargetOutcome::Cloned(issue) => {
                let uploaded = issue
                    .attachments
                    .iter()
                    .filter(|a| matches!(a, AttachmentOutcome::Uploaded { .. }))
                    .count();
                let mark = if report.is_clean() { "✓" } else { "!" };
                lines.push(format!(
                    "{mark} {}: {} ({uploaded} attachment(s))",
                    report.project, issue.key
                ));
                for (step, e) in issue.failures() {
                    lines.push(format!("    {step} failed: {e}"));
                }
            }
        }
    }

    let created = reports.iter().filter(|r| r.cloned_key().is_some()).count();
    let clean = reports.iter().filter(|r| r.is_clean()).count();
    lines.push(format!(
        "{created}/{} created, {clean} without errors",
        reports.len()
    ));
    lines
}

pub fn print_help() {
    println!("fanout: clone a Jira issue into every configured target project\n");
    println!("{USAGE}\n");
    println!("CONFIG:");
    println!("  ~/.fanout/config.toml (or $FANOUT_CONFIG) lists [[targets]].");
    println!("  JIRA_SITE, JIRA_EMAIL and JIRA_API_TOKEN override the [jira] table.");
    println!("  RUST_LOG controls log verbosity (default: info).");
}
