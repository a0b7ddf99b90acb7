//! Decoding of `pactl` output: `subscribe` event lines and
//! `--format=json list` documents.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::MonitorError;
use super::events::{ChangeEvent, ChangeKind, Facility, SinkInfo, SinkInputInfo, SinkState};

/// Raw volume of 100%.
pub const VOLUME_NORM: u64 = 0x10000;

const PROCESS_BINARY: &str = "application.process.binary";

#[derive(Debug, Deserialize)]
struct ChannelVolume {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct PactlSink {
    index: u32,
    #[serde(default)]
    state: String,
    #[serde(default)]
    mute: bool,
    #[serde(default)]
    volume: BTreeMap<String, ChannelVolume>,
    #[serde(default)]
    active_port: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PactlSinkInput {
    index: u32,
    #[serde(default)]
    corked: bool,
    #[serde(default)]
    mute: bool,
    #[serde(default)]
    volume: BTreeMap<String, ChannelVolume>,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

/// Averages the channels and rounds to a whole percent.
fn volume_fraction(channels: &BTreeMap<String, ChannelVolume>) -> f64 {
    if channels.is_empty() {
        return 0.0;
    }
    let avg = channels.values().map(|c| c.value).sum::<u64>() / channels.len() as u64;
    let percent = (avg * 100 + VOLUME_NORM / 2) / VOLUME_NORM;
    percent as f64 / 100.0
}

pub fn parse_sinks(json: &str) -> Result<Vec<SinkInfo>, MonitorError> {
    let sinks: Vec<PactlSink> = serde_json::from_str(json)?;
    Ok(sinks
        .into_iter()
        .map(|s| SinkInfo {
            index: s.index,
            volume: volume_fraction(&s.volume),
            active_port: s.active_port,
            muted: s.mute,
            state: SinkState::parse(&s.state),
        })
        .collect())
}

pub fn parse_sink_inputs(json: &str) -> Result<Vec<SinkInputInfo>, MonitorError> {
    let inputs: Vec<PactlSinkInput> = serde_json::from_str(json)?;
    Ok(inputs
        .into_iter()
        .map(|i| SinkInputInfo {
            index: i.index,
            volume: volume_fraction(&i.volume),
            process_binary: i
                .properties
                .get(PROCESS_BINARY)
                .and_then(|v| v.as_str())
                .map(str::to_string),
            corked: i.corked,
            muted: i.mute,
        })
        .collect())
}

/// Parses a line like `Event 'change' on sink-input #12`.
/// Facilities other than sinks and sink inputs yield `None`.
pub fn parse_event_line(line: &str) -> Option<ChangeEvent> {
    let rest = line.trim().strip_prefix("Event '")?;
    let (kind, rest) = rest.split_once("' on ")?;
    let (facility, index) = rest.rsplit_once(" #")?;

    let kind = match kind {
        "new" => ChangeKind::New,
        "change" => ChangeKind::Change,
        "remove" => ChangeKind::Remove,
        _ => return None,
    };
    let facility = match facility {
        "sink" => Facility::Sink,
        "sink-input" => Facility::SinkInput,
        _ => return None,
    };
    Some(ChangeEvent { kind, facility, index: index.parse().ok()? })
}
