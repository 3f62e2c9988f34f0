//! Client for the remote `tasks` collection.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::task::{StatusPatch, Task, TaskDraft, TaskId, TaskStatus};

/// The four REST calls the task view depends on.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET /tasks`
    async fn list(&self) -> ApiResult<Vec<Task>>;

    /// `POST /tasks`, returning the id the server assigned.
    async fn create(&self, draft: &TaskDraft) -> ApiResult<TaskId>;

    /// `PUT /tasks/{id}` with the full record. The response body is ignored.
    async fn update(&self, task: &Task) -> ApiResult<()>;

    /// `PUT /tasks/{id}` with `{"status": ...}` only.
    async fn update_status(&self, id: TaskId, status: TaskStatus) -> ApiResult<()>;

    /// `DELETE /tasks/{id}`
    async fn delete(&self, id: TaskId) -> ApiResult<()>;
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    id: TaskId,
}

pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: &TaskId) -> String {
        format!("{}/tasks/{}", self.base_url, id)
    }
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = ensure_success(response).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> ApiResult<Vec<Task>> {
        let url = self.collection_url();
        debug!(%url, "fetching tasks");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn create(&self, draft: &TaskDraft) -> ApiResult<TaskId> {
        let url = self.collection_url();
        debug!(%url, title = %draft.title, "creating task");
        let response = self.client.post(url).json(draft).send().await?;
        let created: CreatedTask = decode(response).await?;
        Ok(created.id)
    }

    async fn update(&self, task: &Task) -> ApiResult<()> {
        let url = self.task_url(&task.id);
        debug!(%url, "updating task");
        let response = self.client.put(url).json(task).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn update_status(&self, id: TaskId, status: TaskStatus) -> ApiResult<()> {
        let url = self.task_url(&id);
        debug!(%url, %status, "changing task status");
        let response = self
            .client
            .put(url)
            .json(&StatusPatch { status })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> ApiResult<()> {
        let url = self.task_url(&id);
        debug!(%url, "deleting task");
        let response = self.client.delete(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}
