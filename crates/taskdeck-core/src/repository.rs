use std::future::Future;

use anyhow::{Context, anyhow};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskdeck_shared::{
    CreateTaskRequest, DeleteTaskRequest, TASKS_PATH, TaskEnvelope, UpdateTaskRequest,
};
use tracing::{debug, instrument, warn};

use crate::error::RepositoryError;
use crate::session::Session;

/// The remote task API. One call, one HTTP round trip; failures are
/// returned as-is and never retried.
pub trait TaskRepository {
    fn list(&self) -> impl Future<Output = Result<TaskEnvelope, RepositoryError>> + Send;

    fn create(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<TaskEnvelope, RepositoryError>> + Send;

    fn update(
        &self,
        request: &UpdateTaskRequest,
    ) -> impl Future<Output = Result<TaskEnvelope, RepositoryError>> + Send;

    fn delete(
        &self,
        request: &DeleteTaskRequest,
    ) -> impl Future<Output = Result<TaskEnvelope, RepositoryError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTaskRepository {
    client: Client,
    tasks_url: Url,
    session: Session,
}

impl HttpTaskRepository {
    pub fn new(base_url: &str, session: Session) -> anyhow::Result<Self> {
        let base = parse_base_url(base_url)?;
        let client = Client::builder()
            .build()
            .context("failed building HTTP client for task API")?;

        Ok(Self {
            client,
            tasks_url: endpoint(&base, &[TASKS_PATH]),
            session,
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        // Read per call so a login after construction is picked up.
        self.client
            .request(method, self.tasks_url.clone())
            .header(AUTHORIZATION, self.session.authorization())
    }
}

impl TaskRepository for HttpTaskRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<TaskEnvelope, RepositoryError> {
        let envelope: TaskEnvelope =
            execute(self.request(Method::GET), &Method::GET, &self.tasks_url).await?;
        debug!(count = ?envelope.count, success = envelope.success, "listed tasks");
        Ok(envelope)
    }

    #[instrument(skip(self, request), fields(title_len = request.title.len()))]
    async fn create(&self, request: &CreateTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        let builder = with_json(self.request(Method::POST), request, &self.tasks_url)?;
        execute(builder, &Method::POST, &self.tasks_url).await
    }

    #[instrument(skip(self, request), fields(id = %request.id))]
    async fn update(&self, request: &UpdateTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        let builder = with_json(self.request(Method::PATCH), request, &self.tasks_url)?;
        execute(builder, &Method::PATCH, &self.tasks_url).await
    }

    /// The id travels in the body; the backend does not route `/tasks/{id}`.
    #[instrument(skip(self, request), fields(id = %request.id))]
    async fn delete(&self, request: &DeleteTaskRequest) -> Result<TaskEnvelope, RepositoryError> {
        let builder = with_json(self.request(Method::DELETE), request, &self.tasks_url)?;
        execute(builder, &Method::DELETE, &self.tasks_url).await
    }
}

pub(crate) fn parse_base_url(base_url: &str) -> anyhow::Result<Url> {
    let base = Url::parse(base_url.trim())
        .with_context(|| format!("invalid API base URL: {base_url}"))?;
    if base.cannot_be_a_base() {
        return Err(anyhow!("API base URL cannot carry a path: {base_url}"));
    }
    Ok(base)
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

pub(crate) fn with_json<T: Serialize>(
    builder: RequestBuilder,
    body: &T,
    url: &Url,
) -> Result<RequestBuilder, RepositoryError> {
    let payload = serde_json::to_vec(body).map_err(|source| RepositoryError::Encode {
        url: url.to_string(),
        source,
    })?;
    Ok(builder.header(CONTENT_TYPE, "application/json").body(payload))
}

pub(crate) async fn execute<T: DeserializeOwned>(
    builder: RequestBuilder,
    method: &Method,
    url: &Url,
) -> Result<T, RepositoryError> {
    let request_error = |source| RepositoryError::Request {
        method: method.to_string(),
        url: url.to_string(),
        source,
    };

    let response = builder
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(request_error)?;

    let status = response.status();
    let body = response.text().await.map_err(request_error)?;

    if !status.is_success() {
        warn!(method = %method, url = %url, status = %status, "API returned non-success status");
        debug!(body = %body, "error response body");
        return Err(RepositoryError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status,
        });
    }

    serde_json::from_str(&body).map_err(|source| RepositoryError::Decode {
        url: url.to_string(),
        source,
    })
}
