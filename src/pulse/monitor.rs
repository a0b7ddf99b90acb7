use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::error::MonitorError;
use super::events::{ChangeKind, Enumerated, Facility, Notification};
use super::pactl;
use crate::config::PulseConfig;

#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn query(&self, args: &[&str]) -> Result<String, MonitorError>;
}

#[derive(Clone, Debug)]
pub struct Pactl {
    program: String,
    server: Option<String>,
}

impl Pactl {
    pub fn new(program: impl Into<String>, server: Option<String>) -> Self {
        Self { program: program.into(), server }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(ref server) = self.server {
            cmd.arg("--server").arg(server);
        }
        cmd
    }

    fn subscribe(&self) -> Result<tokio::process::Child, MonitorError> {
        Ok(self
            .command()
            .arg("subscribe")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?)
    }
}

#[async_trait]
impl QueryRunner for Pactl {
    async fn query(&self, args: &[&str]) -> Result<String, MonitorError> {
        let output = self.command().args(args).stdin(Stdio::null()).output().await?;
        if !output.status.success() {
            return Err(MonitorError::Command {
                args: args.join(" "),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub struct PactlMonitor<R = Pactl> {
    runner: R,
    event_tx: mpsc::UnboundedSender<Notification>,
}

impl PactlMonitor<Pactl> {
    pub fn new(config: &PulseConfig) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        Self::with_runner(Pactl::new(config.pactl.clone(), config.server.clone()))
    }

    /// Subscribes, enumerates the current sinks and sink inputs, then
    /// forwards subscription events until the subscription ends.
    pub async fn run(self) -> Result<(), MonitorError> {
        let mut child = self.runner.subscribe()?;
        let stdout = child.stdout.take().ok_or(MonitorError::Disconnected)?;
        let mut lines = BufReader::new(stdout).lines();
        tracing::info!("Subscribed to sink and sink-input events");
        self.send(Notification::Subscribed)?;

        self.list_sinks(None).await?;
        self.list_sink_inputs(None).await?;

        while let Some(line) = lines.next_line().await? {
            self.dispatch_line(&line).await?;
        }

        let status = child.wait().await?;
        tracing::warn!("pactl subscribe exited with {}", status);
        Err(MonitorError::Disconnected)
    }
}

impl<R: QueryRunner> PactlMonitor<R> {
    pub fn with_runner(runner: R) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { runner, event_tx }, event_rx)
    }

    fn send(&self, notification: Notification) -> Result<(), MonitorError> {
        self.event_tx.send(notification).map_err(|_| MonitorError::ChannelClosed)
    }

    pub async fn dispatch_line(&self, line: &str) -> Result<(), MonitorError> {
        let Some(event) = pactl::parse_event_line(line) else {
            return Ok(());
        };
        tracing::debug!("Subscription event {:?}", event);
        match (event.facility, event.kind) {
            (facility, ChangeKind::Remove) => self.send(Notification::Removed { facility, index: event.index }),
            (Facility::Sink, _) => self.list_sinks(Some(event.index)).await,
            (Facility::SinkInput, _) => self.list_sink_inputs(Some(event.index)).await,
        }
    }

    /// Emits every sink (or only `index`) followed by an end marker, and
    /// `Listed` for a full listing. A failed query emits only `Failed`.
    pub async fn list_sinks(&self, index: Option<u32>) -> Result<(), MonitorError> {
        let listed = match self.runner.query(&["--format=json", "list", "sinks"]).await {
            Ok(json) => pactl::parse_sinks(&json),
            Err(e) => Err(e),
        };
        match listed {
            Ok(sinks) => {
                for sink in sinks.into_iter().filter(|s| index.map_or(true, |i| s.index == i)) {
                    self.send(Notification::Sink(Enumerated::Entry(sink)))?;
                }
                self.send(Notification::Sink(Enumerated::End))?;
                if index.is_none() {
                    self.send(Notification::Listed(Facility::Sink))?;
                }
                Ok(())
            }
            Err(e) => self.send(Notification::Sink(Enumerated::Failed(e.to_string()))),
        }
    }

    pub async fn list_sink_inputs(&self, index: Option<u32>) -> Result<(), MonitorError> {
        let listed = match self.runner.query(&["--format=json", "list", "sink-inputs"]).await {
            Ok(json) => pactl::parse_sink_inputs(&json),
            Err(e) => Err(e),
        };
        match listed {
            Ok(inputs) => {
                for input in inputs.into_iter().filter(|s| index.map_or(true, |i| s.index == i)) {
                    self.send(Notification::SinkInput(Enumerated::Entry(input)))?;
                }
                self.send(Notification::SinkInput(Enumerated::End))?;
                if index.is_none() {
                    self.send(Notification::Listed(Facility::SinkInput))?;
                }
                Ok(())
            }
            Err(e) => self.send(Notification::SinkInput(Enumerated::Failed(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    struct MockRunner {
        sinks: Option<&'static str>,
        inputs: &'static str,
    }

    #[async_trait]
    impl QueryRunner for MockRunner {
        async fn query(&self, args: &[&str]) -> Result<String, MonitorError> {
            match args.last() {
                Some(&"sinks") => self.sinks.map(str::to_string).ok_or(MonitorError::Command {
                    args: args.join(" "),
                    status: "exit status: 1".to_string(),
                    stderr: "Connection failure".to_string(),
                }),
                _ => Ok(self.inputs.to_string()),
            }
        }
    }

    const SINKS: &str = r#"[
        {"index": 0, "state": "RUNNING", "mute": false, "volume": {"mono": {"value": 65536}}, "active_port": "speaker"},
        {"index": 1, "state": "IDLE", "mute": false, "volume": {"mono": {"value": 32768}}, "active_port": "headphones"}
    ]"#;

    const INPUTS: &str = r#"[
        {"index": 7, "corked": false, "mute": false, "volume": {"mono": {"value": 65536}},
         "properties": {"application.process.binary": "mpv"}}
    ]"#;

    fn drain(rx: &mut mpsc::UnboundedReceiver<Notification>) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    #[tokio::test]
    async fn test_list_sinks_emits_entries_then_end() {
        let (monitor, mut rx) = PactlMonitor::with_runner(MockRunner { sinks: Some(SINKS), inputs: INPUTS });
        assert_ok!(monitor.list_sinks(None).await);

        let got = drain(&mut rx);
        assert_eq!(got.len(), 4);
        assert!(matches!(&got[0], Notification::Sink(Enumerated::Entry(s)) if s.index == 0));
        assert!(matches!(&got[1], Notification::Sink(Enumerated::Entry(s)) if s.index == 1));
        assert_eq!(got[2], Notification::Sink(Enumerated::End));
        assert_eq!(got[3], Notification::Listed(Facility::Sink));
    }

    #[tokio::test]
    async fn test_list_sinks_failure_has_no_end_marker() {
        let (monitor, mut rx) = PactlMonitor::with_runner(MockRunner { sinks: None, inputs: INPUTS });
        assert_ok!(monitor.list_sinks(None).await);

        let got = drain(&mut rx);
        assert_eq!(got.len(), 1);
        assert!(matches!(&got[0], Notification::Sink(Enumerated::Failed(msg)) if msg.contains("Connection failure")));
    }

    #[tokio::test]
    async fn test_change_event_requeries_single_entity() {
        let (monitor, mut rx) = PactlMonitor::with_runner(MockRunner { sinks: Some(SINKS), inputs: INPUTS });
        assert_ok!(monitor.dispatch_line("Event 'change' on sink #1").await);

        let got = drain(&mut rx);
        assert_eq!(got.len(), 2);
        assert!(matches!(&got[0], Notification::Sink(Enumerated::Entry(s)) if s.index == 1));
        assert_eq!(got[1], Notification::Sink(Enumerated::End));
    }

    #[tokio::test]
    async fn test_requery_after_failed_listing_is_not_a_listing() {
        let (monitor, mut rx) = PactlMonitor::with_runner(MockRunner { sinks: None, inputs: INPUTS });
        assert_ok!(monitor.list_sinks(None).await);
        assert_ok!(monitor.list_sink_inputs(None).await);
        assert_ok!(monitor.dispatch_line("Event 'change' on sink #7").await);

        let got = drain(&mut rx);
        assert!(got.contains(&Notification::Listed(Facility::SinkInput)));
        assert!(!got.contains(&Notification::Listed(Facility::Sink)));
    }

    #[tokio::test]
    async fn test_remove_event_is_forwarded() {
        let (monitor, mut rx) = PactlMonitor::with_runner(MockRunner { sinks: Some(SINKS), inputs: INPUTS });
        assert_ok!(monitor.dispatch_line("Event 'remove' on sink-input #7").await);
        assert_ok!(monitor.dispatch_line("Event 'new' on client #3").await);

        assert_eq!(
            drain(&mut rx),
            vec![Notification::Removed { facility: Facility::SinkInput, index: 7 }]
        );
    }

    #[tokio::test]
    async fn test_closed_receiver_is_an_error() {
        let (monitor, rx) = PactlMonitor::with_runner(MockRunner { sinks: Some(SINKS), inputs: INPUTS });
        drop(rx);
        assert!(matches!(monitor.list_sink_inputs(None).await, Err(MonitorError::ChannelClosed)));
    }
}
