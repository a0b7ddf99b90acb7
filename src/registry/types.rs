use std::fmt;
use std::str::FromStr;

use super::log_sink::LogSink;

/// Raw volume written in a node's final record.
pub const REMOVED_VOLUME: f64 = -1.0;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn sink(index: u32, port: &str) -> Self {
        Self(format!("sink-{}-{}", index, port))
    }

    pub fn sink_input(index: u32) -> Self {
        Self(format!("sink_input-{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Output,
    Stream,
}

/// Active output routing, as last reported by a non-idle sink.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputContext {
    pub active_port: String,
    pub active_volume: f64,
}

impl OutputContext {
    pub fn new(active_port: impl Into<String>, active_volume: f64) -> Self {
        Self { active_port: active_port.into(), active_volume }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub epoch_seconds: i64,
    pub index: u32,
    pub active_port: String,
    pub raw_volume: f64,
    pub effective_volume: f64,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{:.6},{:.6}",
            self.epoch_seconds, self.index, self.active_port, self.raw_volume, self.effective_volume
        )
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed record: {0}")]
pub struct ParseRecordError(pub String);

impl FromStr for Record {
    type Err = ParseRecordError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields.len() != 5 {
            return Err(ParseRecordError(format!("expected 5 fields, got {}", fields.len())));
        }
        let bad = |what: &str| ParseRecordError(format!("bad {} in {:?}", what, line));
        Ok(Self {
            epoch_seconds: fields[0].parse().map_err(|_| bad("timestamp"))?,
            index: fields[1].parse().map_err(|_| bad("index"))?,
            active_port: fields[2].to_string(),
            raw_volume: fields[3].parse().map_err(|_| bad("raw volume"))?,
            effective_volume: fields[4].parse().map_err(|_| bad("effective volume"))?,
        })
    }
}

#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub index: u32,
    pub kind: NodeKind,
    pub volume: f64,
    pub(crate) sink: LogSink,
}

impl Node {
    pub fn new(id: NodeId, index: u32, kind: NodeKind, sink: LogSink) -> Self {
        Self { id, index, kind, volume: 0.0, sink }
    }

    pub fn is_output(&self) -> bool {
        self.kind == NodeKind::Output
    }

    pub fn log_sink(&self) -> &LogSink {
        &self.sink
    }

    pub fn effective_volume(&self, ctx: &OutputContext) -> f64 {
        match self.kind {
            NodeKind::Output => self.volume,
            NodeKind::Stream => self.volume * ctx.active_volume,
        }
    }

    pub fn record(&self, epoch_seconds: i64, ctx: &OutputContext) -> Record {
        Record {
            epoch_seconds,
            index: self.index,
            active_port: ctx.active_port.clone(),
            raw_volume: self.volume,
            effective_volume: self.effective_volume(ctx),
        }
    }
}
