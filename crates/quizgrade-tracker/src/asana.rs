//! Asana REST API tracker implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use quizgrade_core::error::TrackerError;
use quizgrade_core::model::{FieldPayload, RawField, Section, TaskRecord};
use quizgrade_core::traits::TaskTracker;

const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const PAGE_LIMIT: &str = "100";
const TASK_FIELDS: &str = "name,completed,assignee.name,custom_fields.name,\
custom_fields.resource_subtype,custom_fields.enum_value.name,\
custom_fields.multi_enum_values.name,custom_fields.text_value";

/// Asana tracker, authenticated with a personal access token.
pub struct AsanaTracker {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl AsanaTracker {
    pub fn new(token: &str, base_url: Option<String>) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TrackerError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            token: token.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Url, TrackerError> {
        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| TrackerError::NetworkError(format!("invalid URL for {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Send a request and map HTTP failures to `TrackerError`.
    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, TrackerError> {
        let response = request
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrackerError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    TrackerError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                .saturating_mul(1000);
            return Err(TrackerError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AsanaErrors>(&body)
                .ok()
                .and_then(|e| e.errors.into_iter().next())
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(match status {
                401 => TrackerError::AuthenticationFailed(message),
                403 => TrackerError::Forbidden(format!("{resource}: {message}")),
                404 => TrackerError::NotFound(resource.to_string()),
                _ => TrackerError::ApiError { status, message },
            });
        }

        Ok(response)
    }

    /// GET a collection, following `next_page` offsets until exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TrackerError> {
        let mut items = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut params = query.to_vec();
            params.push(("limit", PAGE_LIMIT));
            if let Some(offset) = &offset {
                params.push(("offset", offset.as_str()));
            }
            let request = self.client.get(self.url(path, &params)?);

            let page: Page<T> = self
                .send(request, path)
                .await?
                .json()
                .await
                .map_err(|e| TrackerError::ApiError {
                    status: 0,
                    message: format!("failed to parse response: {e}"),
                })?;

            items.extend(page.data);
            match page.next_page.and_then(|p| p.offset) {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(items)
    }
}

#[derive(Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    next_page: Option<NextPage>,
}

#[derive(Deserialize)]
struct NextPage {
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Deserialize)]
struct AsanaErrors {
    errors: Vec<AsanaErrorBody>,
}

#[derive(Deserialize)]
struct AsanaErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct AsanaSection {
    gid: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct AsanaTask {
    gid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    assignee: Option<AsanaUser>,
    #[serde(default)]
    custom_fields: Vec<AsanaCustomField>,
}

#[derive(Deserialize)]
struct AsanaUser {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct AsanaCustomField {
    name: String,
    #[serde(default)]
    resource_subtype: Option<String>,
    #[serde(default)]
    enum_value: Option<AsanaEnumOption>,
    #[serde(default)]
    multi_enum_values: Option<Vec<AsanaEnumOption>>,
    #[serde(default)]
    text_value: Option<String>,
}

#[derive(Deserialize)]
struct AsanaEnumOption {
    name: String,
}

impl From<AsanaCustomField> for RawField {
    fn from(field: AsanaCustomField) -> Self {
        let payload = match field.resource_subtype.as_deref() {
            Some("enum") => FieldPayload::SingleChoice {
                selected: field.enum_value.map(|v| v.name),
            },
            Some("multi_enum") => FieldPayload::MultiChoice {
                selected: field
                    .multi_enum_values
                    .unwrap_or_default()
                    .into_iter()
                    .map(|v| v.name)
                    .collect(),
            },
            Some("text") => FieldPayload::Text {
                value: field.text_value,
            },
            _ => FieldPayload::Other,
        };
        RawField {
            name: field.name,
            payload,
        }
    }
}

impl From<AsanaTask> for TaskRecord {
    fn from(task: AsanaTask) -> Self {
        TaskRecord {
            gid: task.gid,
            name: task.name.unwrap_or_else(|| "Untitled".to_string()),
            assignee: task.assignee.and_then(|a| a.name),
            fields: task.custom_fields.into_iter().map(RawField::from).collect(),
        }
    }
}

#[async_trait]
impl TaskTracker for AsanaTracker {
    fn name(&self) -> &str {
        "asana"
    }

    #[instrument(skip(self))]
    async fn list_sections(&self, project_gid: &str) -> Result<Vec<Section>, TrackerError> {
        let sections: Vec<AsanaSection> = self
            .get_all(
                &format!("/projects/{project_gid}/sections"),
                &[("opt_fields", "name")],
            )
            .await?;

        Ok(sections
            .into_iter()
            .map(|s| Section {
                gid: s.gid,
                name: s.name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_open_tasks(&self, section_gid: &str) -> Result<Vec<TaskRecord>, TrackerError> {
        let tasks: Vec<AsanaTask> = self
            .get_all(
                &format!("/sections/{section_gid}/tasks"),
                &[("completed_since", "now"), ("opt_fields", TASK_FIELDS)],
            )
            .await?;

        Ok(tasks
            .into_iter()
            .filter(|t| !t.completed)
            .map(TaskRecord::from)
            .collect())
    }

    #[instrument(skip(self))]
    async fn complete_task(&self, task_gid: &str) -> Result<(), TrackerError> {
        let path = format!("/tasks/{task_gid}");
        let request = self
            .client
            .put(self.url(&path, &[])?)
            .json(&json!({ "data": { "completed": true } }));
        self.send(request, &path).await?;
        Ok(())
    }

    #[instrument(skip(self, text))]
    async fn post_comment(&self, task_gid: &str, text: &str) -> Result<(), TrackerError> {
        let path = format!("/tasks/{task_gid}/stories");
        let request = self
            .client
            .post(self.url(&path, &[])?)
            .json(&json!({ "data": { "text": text } }));
        self.send(request, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tracker(server: &MockServer) -> AsanaTracker {
        AsanaTracker::new("test-token", Some(server.uri())).unwrap()
    }

    #[tokio::test]
    async fn lists_sections() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/p1/sections"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"gid": "s1", "name": "Backlog"},
                    {"gid": "s2", "name": "Inducción Ingreso Personal Nuevo/Contratista"}
                ]
            })))
            .mount(&server)
            .await;

        let sections = tracker(&server).list_sections("p1").await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].gid, "s2");
        assert_eq!(
            sections[1].name,
            "Inducción Ingreso Personal Nuevo/Contratista"
        );
    }

    #[tokio::test]
    async fn decodes_tasks_and_custom_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sections/s1/tasks"))
            .and(query_param("completed_since", "now"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "gid": "t1",
                    "name": "Quiz - Ana",
                    "completed": false,
                    "assignee": {"gid": "u1", "name": "Ana"},
                    "custom_fields": [
                        {"name": "q1", "resource_subtype": "enum",
                         "enum_value": {"gid": "e1", "name": "Verdadero"}},
                        {"name": "q2", "resource_subtype": "multi_enum",
                         "multi_enum_values": [{"name": "A"}, {"name": "B"}]},
                        {"name": "q3", "resource_subtype": "text", "text_value": "cortes"},
                        {"name": "q4", "resource_subtype": "enum", "enum_value": null},
                        {"name": "q5", "resource_subtype": "number", "number_value": 3}
                    ]
                }, {
                    "gid": "t2",
                    "name": "Already done",
                    "completed": true,
                    "custom_fields": []
                }]
            })))
            .mount(&server)
            .await;

        let tasks = tracker(&server).list_open_tasks("s1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.assignee.as_deref(), Some("Ana"));
        assert_eq!(
            task.fields,
            vec![
                RawField::single_choice("q1", Some("Verdadero")),
                RawField::multi_choice("q2", &["A", "B"]),
                RawField::text("q3", Some("cortes")),
                RawField::single_choice("q4", None),
                RawField::other("q5"),
            ]
        );
    }

    #[tokio::test]
    async fn follows_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/sections/s1/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"gid": "t1", "name": "First"}],
                "next_page": {"offset": "page2", "path": "/sections/s1/tasks?offset=page2"}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/sections/s1/tasks"))
            .and(query_param("offset", "page2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"gid": "t2", "name": "Second"}],
                "next_page": null
            })))
            .with_priority(1)
            .mount(&server)
            .await;

        let tasks = tracker(&server).list_open_tasks("s1").await.unwrap();
        let gids: Vec<&str> = tasks.iter().map(|t| t.gid.as_str()).collect();
        assert_eq!(gids, vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn completes_and_comments() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/tasks/t1"))
            .and(body_json(json!({"data": {"completed": true}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/tasks/t1/stories"))
            .and(body_json(json!({"data": {"text": "✅ Task approved"}})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let tracker = tracker(&server);
        tracker.complete_task("t1").await.unwrap();
        tracker.post_comment("t1", "✅ Task approved").await.unwrap();
    }

    #[tokio::test]
    async fn authentication_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/p1/sections"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errors": [{"message": "Not Authorized"}]
            })))
            .mount(&server)
            .await;

        let err = tracker(&server).list_sections("p1").await.unwrap_err();
        assert!(matches!(err, TrackerError::AuthenticationFailed(ref m) if m == "Not Authorized"));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn missing_task() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/tasks/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = tracker(&server).complete_task("nope").await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(ref r) if r == "/tasks/nope"));
    }

    #[tokio::test]
    async fn rate_limiting() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tasks/t1/stories"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = tracker(&server).post_comment("t1", "hi").await.unwrap_err();
        assert_eq!(err.retry_after_ms(), Some(7000));
    }

    #[tokio::test]
    async fn huge_retry_after_saturates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tasks/t1/stories"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", u64::MAX.to_string()),
            )
            .mount(&server)
            .await;

        let err = tracker(&server).post_comment("t1", "hi").await.unwrap_err();
        assert_eq!(err.retry_after_ms(), Some(u64::MAX));
    }

    #[tokio::test]
    async fn server_error_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/projects/p1/sections"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = tracker(&server).list_sections("p1").await.unwrap_err();
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }
}
