//! HTTP backend talking to `ganttboard-server`.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use ganttboard_proto::catalog::Catalog;
use ganttboard_proto::event::{ChangeEvent, HistoryEntry, LogRequest};
use ganttboard_proto::task::{Task, TaskId};

use super::{BackendError, ChangeLog, GoodsCatalog, TaskRepository, WarehouseDirectory};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Implements every collaborator over the server's JSON API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url` (for example
    /// `http://127.0.0.1:8080`).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`BackendError::Unavailable`] if the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, BackendError> {
        let mut base =
            Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(BackendError::InvalidUrl(format!(
                "{base_url}: unsupported scheme {}",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Stored change history, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the request fails.
    pub async fn change_history(&self) -> Result<Vec<HistoryEntry>, BackendError> {
        self.get("api/change_history").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|e| BackendError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .request(method, self.endpoint(path)?)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await.map(|_| ())
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::Unavailable(err.to_string())
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        Err(BackendError::NotFound(message))
    } else {
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl TaskRepository for HttpBackend {
    async fn create(&self, task: &Task) -> Result<(), BackendError> {
        self.send_json(reqwest::Method::POST, "api/tasks", task).await
    }

    async fn update(&self, task: &Task) -> Result<(), BackendError> {
        self.send_json(reqwest::Method::PUT, "api/tasks", task).await
    }

    async fn delete(&self, id: &TaskId) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("api/tasks/{id}"))?)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await.map(|_| ())
    }

    async fn list_all(&self) -> Result<Vec<Task>, BackendError> {
        self.get("api/tasks").await
    }
}

impl ChangeLog for HttpBackend {
    async fn record(&self, event: &ChangeEvent, skip_persist: bool) -> Result<(), BackendError> {
        // The server drops these anyway.
        if skip_persist || event.is_view() {
            tracing::debug!(task_id = %event.task_id, kind = %event.kind, "view event not sent");
            return Ok(());
        }
        let request = LogRequest {
            event: event.clone(),
            skip_persist,
        };
        self.send_json(reqwest::Method::POST, "api/log_event", &request)
            .await
    }
}

impl GoodsCatalog for HttpBackend {
    async fn list_categorized(&self) -> Result<Catalog, BackendError> {
        self.get("api/goods").await
    }
}

impl WarehouseDirectory for HttpBackend {
    async fn list_warehouses(&self) -> Result<Vec<String>, BackendError> {
        self.get("api/warehouses").await
    }
}
