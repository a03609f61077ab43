use async_trait::async_trait;
use base64::Engine;
use reqwest::Response;
use serde::Deserialize;
use serde_json::json;

use super::Tracker;
use crate::error::TrackerError;
use crate::model::fields::{ClonedIssueRef, FieldAvailability, FieldDescriptor, FieldSet};
use crate::model::ticket::SourceTicket;

const CREATE_META_PAGE: usize = 200;

/// Error message Jira returns when a link type name does not exist.
const UNKNOWN_LINK_TYPE: &str = "No issue link type";

pub struct JiraProvider {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraProvider {
    /// `site` is either a bare Atlassian Cloud site name or a full base URL.
    pub fn new(site: &str, email: &str, api_token: &str) -> Self {
        let creds = format!("{email}:{api_token}");
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: base_url(site),
            auth_header: format!("Basic {encoded}"),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api(&self, path: &str) -> String {
        format!("{}/rest/api/3/{path}", self.base_url)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }
}

fn base_url(site: &str) -> String {
    let site = site.trim().trim_end_matches('/');
    if site.contains("://") {
        site.to_string()
    } else {
        format!("https://{site}.atlassian.net")
    }
}

/// Turn a transport error or non-success response into `"<status>: <body>"`.
async fn check(resp: reqwest::Result<Response>) -> Result<Response, String> {
    let resp = resp.map_err(|e| e.to_string())?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(format!("{status}: {body}"))
}

#[derive(Deserialize)]
struct CreateMetaPage {
    #[serde(default, alias = "results")]
    fields: Vec<FieldDescriptor>,
    #[serde(default)]
    total: Option<usize>,
}

#[async_trait]
impl Tracker for JiraProvider {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn get_issue(&self, key: &str) -> Result<SourceTicket, TrackerError> {
        let lookup = |detail: String| TrackerError::Lookup {
            key: key.to_string(),
            detail,
        };
        let url = self.api(&format!("issue/{}", urlencoding::encode(key)));
        let resp = check(self.get(&url).send().await)
            .await
            .map_err(|detail| lookup(detail))?;
        resp.json()
            .await
            .map_err(|e| lookup(format!("unreadable issue payload: {e}")))
    }

    async fn create_fields(
        &self,
        project: &str,
        issue_type_id: &str,
    ) -> Result<FieldAvailability, TrackerError> {
        let meta_error = |detail: String| TrackerError::FieldMetadata {
            project: project.to_string(),
            issue_type: issue_type_id.to_string(),
            detail,
        };
        let url = self.api(&format!(
            "issue/createmeta/{}/issuetypes/{}",
            urlencoding::encode(project),
            urlencoding::encode(issue_type_id)
        ));

        let mut descriptors = Vec::new();
        loop {
            let start_at = descriptors.len().to_string();
            let max_results = CREATE_META_PAGE.to_string();
            let resp = check(
                self.get(&url)
                    .query(&[("startAt", start_at.as_str()), ("maxResults", max_results.as_str())])
                    .send()
                    .await,
            )
            .await
            .map_err(|detail| meta_error(detail))?;
            let page: CreateMetaPage = resp
                .json()
                .await
                .map_err(|e| meta_error(format!("unreadable createmeta payload: {e}")))?;

            let fetched = page.fields.len();
            descriptors.extend(page.fields);
            let done = match page.total {
                Some(total) => descriptors.len() >= total,
                None => fetched < CREATE_META_PAGE,
            };
            if done || fetched == 0 {
                break;
            }
        }

        Ok(descriptors.into_iter().collect())
    }

    async fn create_issue(&self, fields: &FieldSet) -> Result<ClonedIssueRef, TrackerError> {
        let resp = check(
            self.client
                .post(self.api("issue"))
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .json(&json!({ "fields": fields }))
                .send()
                .await,
        )
        .await
        .map_err(TrackerError::Create)?;
        resp.json()
            .await
            .map_err(|e| TrackerError::Create(format!("unreadable create response: {e}")))
    }

    async fn update_issue(&self, key: &str, fields: &FieldSet) -> Result<(), TrackerError> {
        let url = self.api(&format!("issue/{}", urlencoding::encode(key)));
        check(
            self.client
                .put(url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .json(&json!({ "fields": fields }))
                .send()
                .await,
        )
        .await
        .map_err(|detail| TrackerError::Update {
            key: key.to_string(),
            detail,
        })?;
        Ok(())
    }

    async fn create_link(&self, link_type: &str, from: &str, to: &str) -> Result<(), TrackerError> {
        let body = json!({
            "type": { "name": link_type },
            "inwardIssue": { "key": from },
            "outwardIssue": { "key": to },
        });
        let result = check(
            self.client
                .post(self.api("issueLink"))
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .json(&body)
                .send()
                .await,
        )
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(detail) if detail.contains(UNKNOWN_LINK_TYPE) => {
                Err(TrackerError::RelationshipNotFound(link_type.to_string()))
            }
            Err(detail) => Err(TrackerError::Link {
                from: from.to_string(),
                to: to.to_string(),
                detail,
            }),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, TrackerError> {
        let download_error = |detail: String| TrackerError::Download {
            url: url.to_string(),
            detail,
        };
        let resp = check(
            self.client
                .get(url)
                .header("Authorization", &self.auth_header)
                .send()
                .await,
        )
        .await
        .map_err(|detail| download_error(detail))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| download_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, key: &str, filename: &str, bytes: Vec<u8>) -> Result<(), TrackerError> {
        let upload_error = |detail: String| TrackerError::Upload {
            key: key.to_string(),
            filename: filename.to_string(),
            detail,
        };
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = self.api(&format!("issue/{}/attachments", urlencoding::encode(key)));
        check(
            self.client
                .post(url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .header("X-Atlassian-Token", "no-check")
                .multipart(form)
                .send()
                .await,
        )
        .await
        .map_err(|detail| upload_error(detail))?;
        Ok(())
    }
}
