//! Runs store commands against the API off the UI thread.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::api::TaskApi;
use crate::task_manager::{ApiEvent, Command};

pub struct Dispatcher {
    api: Arc<dyn TaskApi>,
    runtime: Handle,
    events: UnboundedSender<ApiEvent>,
}

impl Dispatcher {
    pub fn new(api: Arc<dyn TaskApi>, runtime: Handle) -> (Self, UnboundedReceiver<ApiEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                runtime,
                events,
            },
            rx,
        )
    }

    /// Fire and forget; the outcome arrives on the event channel.
    pub fn dispatch(&self, command: Command) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let event = execute(api.as_ref(), command).await;
            if events.send(event).is_err() {
                debug!("event receiver closed, dropping response");
            }
        });
    }
}

pub async fn execute(api: &dyn TaskApi, command: Command) -> ApiEvent {
    match command {
        Command::LoadAll => ApiEvent::Loaded(api.list().await),
        Command::Create(draft) => {
            let result = api.create(&draft).await;
            ApiEvent::Created { draft, result }
        }
        Command::Update(task) => {
            let result = api.update(&task).await;
            ApiEvent::Updated { task, result }
        }
        Command::ChangeStatus { id, status } => {
            let result = api.update_status(id.clone(), status).await;
            ApiEvent::StatusChanged { id, status, result }
        }
        Command::Delete(id) => {
            let result = api.delete(id.clone()).await;
            ApiEvent::Deleted { id, result }
        }
    }
}
