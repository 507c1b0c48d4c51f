//! Host actor - owns persistence, history and HTTP execution

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::history::History;
use crate::host::client::{create_client, execute_request};
use crate::messages::{Execution, HostCommand, HostEvent, Notification, NotificationLevel};
use crate::models::Environment;
use crate::storage::Storage;

/// Host actor that processes commands from the app layer
pub struct HostActor {
    client: reqwest::Client,
    storage: Storage,
    history: History,
    environments: Vec<Environment>,
    event_tx: mpsc::UnboundedSender<HostEvent>,
    executions: JoinSet<()>,
}

impl HostActor {
    pub fn new(config: &Config, storage: Storage, event_tx: mpsc::UnboundedSender<HostEvent>) -> Self {
        let history = History::from_entries(storage.history(), config.history_limit);
        let environments = storage.environments();
        HostActor {
            client: create_client(config.request_timeout()),
            storage,
            history,
            environments,
            event_tx,
            executions: JoinSet::new(),
        }
    }

    /// Run the host message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<HostCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(HostCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command),
                    }
                }

                // Reap finished executions
                Some(_result) = self.executions.join_next() => {}
            }
        }
        tracing::info!("Host actor stopped");
    }

    pub fn handle_command(&mut self, command: HostCommand) {
        tracing::debug!(command = command.name(), "Host command");
        match command {
            HostCommand::ExecuteRequest(execution) => self.execute(execution),
            HostCommand::SaveCollections(collections) => {
                if let Err(e) = self.storage.save_collections(&collections) {
                    tracing::warn!(error = %e, "Failed to save collections");
                }
            }
            HostCommand::GetCollections => {
                self.emit(HostEvent::Collections(self.storage.collections()));
            }
            HostCommand::SaveHistory(entries) => {
                self.history = History::from_entries(entries, self.history.limit());
                self.persist_history();
            }
            HostCommand::GetHistory => self.emit(HostEvent::History(self.history.to_vec())),
            HostCommand::ClearHistory => {
                self.history.clear();
                self.persist_history();
                self.emit(HostEvent::History(Vec::new()));
            }
            HostCommand::GetEnvironments => {
                self.emit(HostEvent::Environments(self.environments.clone()));
            }
            HostCommand::SaveEnvironments(environments) => {
                if let Err(e) = self.storage.save_environments(&environments) {
                    tracing::warn!(error = %e, "Failed to save environments");
                }
                self.environments = environments;
            }
            HostCommand::OnInfo(message) => {
                tracing::info!(%message, "Info");
                self.emit(HostEvent::Notification(Notification {
                    level: NotificationLevel::Info,
                    message,
                }));
            }
            HostCommand::OnError(message) => {
                tracing::warn!(%message, "Error reported by UI");
                self.emit(HostEvent::Notification(Notification {
                    level: NotificationLevel::Error,
                    message,
                }));
            }
            HostCommand::Shutdown => {}
        }
    }

    fn execute(&mut self, execution: Execution) {
        let Execution {
            request,
            environment_id,
        } = execution;

        // History keeps the request as written, placeholders included
        self.history.record(request.clone());
        self.persist_history();
        self.emit(HostEvent::History(self.history.to_vec()));

        let environment = environment_id
            .and_then(|id| self.environments.iter().find(|env| env.id == id).cloned());
        let client = self.client.clone();
        let event_tx = self.event_tx.clone();

        self.executions.spawn(async move {
            tracing::info!(url = %request.url, method = request.method.as_str(), "Executing request");
            let response = execute_request(&client, &request, environment.as_ref()).await;
            tracing::info!(
                status = response.status,
                success = response.is_success(),
                time_ms = response.time,
                "Request completed"
            );
            let _ = event_tx.send(HostEvent::Response(response));
        });
    }

    fn persist_history(&mut self) {
        if let Err(e) = self.storage.save_history(&self.history.to_vec()) {
            tracing::warn!(error = %e, "Failed to save history");
        }
    }

    fn emit(&self, event: HostEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiRequest, Collection};

    fn actor() -> (HostActor, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config {
            history_limit: 3,
            ..Config::default()
        };
        (HostActor::new(&config, Storage::in_memory(), tx), rx)
    }

    #[tokio::test]
    async fn execute_records_history_then_responds() {
        let (mut host, mut rx) = actor();
        let request = ApiRequest {
            url: "not a url".into(),
            ..ApiRequest::default()
        };
        host.handle_command(HostCommand::ExecuteRequest(Execution {
            request,
            environment_id: None,
        }));

        match rx.recv().await {
            Some(HostEvent::History(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].request.url, "not a url");
            }
            other => panic!("expected history, got {:?}", other),
        }
        match rx.recv().await {
            Some(HostEvent::Response(response)) => assert_eq!(response.status, 0),
            other => panic!("expected response, got {:?}", other),
        }
        assert_eq!(host.storage.history().len(), 1);
    }

    #[tokio::test]
    async fn collections_round_trip_through_the_store() {
        let (mut host, mut rx) = actor();
        let collections = vec![Collection::new("Api")];
        host.handle_command(HostCommand::SaveCollections(collections.clone()));
        host.handle_command(HostCommand::GetCollections);

        match rx.recv().await {
            Some(HostEvent::Collections(loaded)) => assert_eq!(loaded, collections),
            other => panic!("expected collections, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_history_persists_and_notifies() {
        let (mut host, mut rx) = actor();
        host.history.record(ApiRequest::default());
        host.handle_command(HostCommand::ClearHistory);

        assert_eq!(rx.recv().await, Some(HostEvent::History(Vec::new())));
        assert!(host.storage.history().is_empty());
    }

    #[tokio::test]
    async fn save_history_respects_limit() {
        let (mut host, mut rx) = actor();
        for i in 0..5 {
            host.history.record(ApiRequest {
                url: format!("https://x/{}", i),
                ..ApiRequest::default()
            });
        }
        let mut entries = host.history.to_vec();
        entries.remove(0);
        host.handle_command(HostCommand::SaveHistory(entries));
        host.handle_command(HostCommand::GetHistory);

        match rx.recv().await {
            Some(HostEvent::History(loaded)) => {
                assert_eq!(loaded.len(), 2);
                assert_eq!(loaded[0].request.url, "https://x/3");
            }
            other => panic!("expected history, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn environments_are_cached_and_persisted() {
        let (mut host, mut rx) = actor();
        let mut env = Environment::new("dev");
        env.set("base", "http://localhost");
        host.handle_command(HostCommand::SaveEnvironments(vec![env.clone()]));
        host.handle_command(HostCommand::GetEnvironments);

        assert_eq!(rx.recv().await, Some(HostEvent::Environments(vec![env])));
        assert_eq!(host.storage.environments().len(), 1);
    }

    #[tokio::test]
    async fn ui_messages_echo_as_notifications() {
        let (mut host, mut rx) = actor();
        host.handle_command(HostCommand::OnError("Please enter a collection name".into()));
        match rx.recv().await {
            Some(HostEvent::Notification(n)) => {
                assert_eq!(n.level, NotificationLevel::Error);
                assert_eq!(n.message, "Please enter a collection name");
            }
            other => panic!("expected notification, got {:?}", other),
        }
    }
}
