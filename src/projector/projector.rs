use std::path::{Path, PathBuf};

use super::bootstrap::{Bootstrap, StartupQuery};
use super::error::ProjectorError as Error;
use crate::pulse::{Enumerated, Facility, Notification, SinkInfo, SinkInputInfo, SinkState};
use crate::registry::{LogSink, Node, NodeId, NodeKind, OutputContext, Registry};

const UNKNOWN_PROCESS: &str = "unknown";

/// Makes an entity name safe to embed in a file name and a log record.
/// Returns `None` for names that are empty once trimmed.
pub fn sanitize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(
        name.chars()
            .map(|c| match c {
                '/' | '\\' | ',' | '\0' | '\n' | '\r' => '_',
                c => c,
            })
            .collect(),
    )
}

#[derive(Debug)]
pub struct EventProjector {
    registry: Registry,
    context: OutputContext,
    log_dir: PathBuf,
    bootstrap: Bootstrap,
}

impl EventProjector {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self::with_registry(log_dir, Registry::new())
    }

    pub fn with_registry(log_dir: impl Into<PathBuf>, registry: Registry) -> Self {
        Self {
            registry,
            context: OutputContext::default(),
            log_dir: log_dir.into(),
            bootstrap: Bootstrap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &OutputContext {
        &self.context
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Applies one notification. Non-fatal failures are reported as
    /// diagnostics; only fatal ones are returned.
    pub fn handle(&mut self, notification: Notification) -> Result<(), Error> {
        tracing::debug!("Notification {:?}", notification);
        let result = match notification {
            Notification::Subscribed => {
                self.complete(StartupQuery::Subscribe);
                Ok(())
            }
            Notification::Listed(Facility::Sink) => {
                self.complete(StartupQuery::ListSinks);
                Ok(())
            }
            Notification::Listed(Facility::SinkInput) => {
                self.complete(StartupQuery::ListSinkInputs);
                Ok(())
            }
            Notification::Sink(Enumerated::End) | Notification::SinkInput(Enumerated::End) => Ok(()),
            Notification::Sink(Enumerated::Entry(info)) => self.on_sink(&info),
            Notification::Sink(Enumerated::Failed(msg)) => {
                Err(Error::UpstreamQueryFailure(format!("sink information: {}", msg)))
            }
            Notification::SinkInput(Enumerated::Entry(info)) => self.on_sink_input(&info),
            Notification::SinkInput(Enumerated::Failed(msg)) => {
                Err(Error::UpstreamQueryFailure(format!("sink input information: {}", msg)))
            }
            Notification::Removed { facility, index } => self.on_removed(facility, index),
        };

        match result {
            Err(e) if !e.is_fatal() => {
                tracing::warn!("{}", e);
                Ok(())
            }
            other => other,
        }
    }

    fn complete(&mut self, query: StartupQuery) {
        if self.bootstrap.complete(query) {
            tracing::info!("Startup queries complete, tracking {} node(s)", self.registry.count());
        }
    }

    fn on_sink(&mut self, info: &SinkInfo) -> Result<(), Error> {
        let Some(raw_port) = info.active_port.as_deref() else {
            tracing::debug!("Sink #{} has no active port, skipping", info.index);
            return Ok(());
        };
        let Some(port) = sanitize_name(raw_port) else {
            tracing::warn!("Sink #{} reports an empty port name, skipping", info.index);
            return Ok(());
        };

        let volume = if info.muted || info.state != SinkState::Running { 0.0 } else { info.volume };
        if info.state != SinkState::Idle {
            self.context = OutputContext::new(port.clone(), volume);
        }

        let id = NodeId::sink(info.index, &port);
        let path = self.log_dir.join(format!("sink-{}.log", port));
        let index = info.index;
        let node_id = id.clone();
        self.registry.upsert(&id, move || {
            Ok(Node::new(node_id, index, NodeKind::Output, LogSink::open(path)?))
        })?;
        self.registry.update_volume(&id, volume, &self.context)?;
        // The observed sink was just logged; refresh the active-port column everywhere else.
        self.registry.log_all_except(&id, &self.context)?;
        Ok(())
    }

    fn on_sink_input(&mut self, info: &SinkInputInfo) -> Result<(), Error> {
        let volume = if info.corked || info.muted { 0.0 } else { info.volume };
        let process = info
            .process_binary
            .as_deref()
            .and_then(sanitize_name)
            .unwrap_or_else(|| UNKNOWN_PROCESS.to_string());

        let id = NodeId::sink_input(info.index);
        let path = self.log_dir.join(format!("sink_input-{}.log", process));
        let index = info.index;
        let node_id = id.clone();
        self.registry.upsert(&id, move || {
            Ok(Node::new(node_id, index, NodeKind::Stream, LogSink::open(path)?))
        })?;
        self.registry.update_volume(&id, volume, &self.context)?;
        Ok(())
    }

    fn on_removed(&mut self, facility: Facility, index: u32) -> Result<(), Error> {
        match facility {
            Facility::Sink => {
                // Removal events carry no port, so the sink node cannot be
                // identified; record the current state of everything instead.
                tracing::warn!("Sink #{} removed, logging all nodes", index);
                self.registry.log_all(&self.context)?;
            }
            Facility::SinkInput => {
                let id = NodeId::sink_input(index);
                tracing::info!("Removing node {}", id);
                self.registry.remove(&id, &self.context)?;
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &NodeId) -> Result<(), Error> {
        Ok(self.registry.remove(id, &self.context)?)
    }

    pub fn shutdown(&mut self) -> Result<(), Error> {
        tracing::info!("Finalizing {} node(s)", self.registry.count());
        Ok(self.registry.drain(&self.context)?)
    }
}
