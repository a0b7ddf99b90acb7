#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkState {
    Running,
    Idle,
    Suspended,
    Unknown,
}

impl SinkState {
    pub fn parse(state: &str) -> Self {
        match state.to_ascii_uppercase().as_str() {
            "RUNNING" => Self::Running,
            "IDLE" => Self::Idle,
            "SUSPENDED" => Self::Suspended,
            _ => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SinkInfo {
    pub index: u32,
    pub active_port: Option<String>,
    pub volume: f64,
    pub muted: bool,
    pub state: SinkState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SinkInputInfo {
    pub index: u32,
    pub process_binary: Option<String>,
    pub volume: f64,
    pub corked: bool,
    pub muted: bool,
}

/// One step of an enumeration: an entity, the end marker, or a failed query.
#[derive(Clone, Debug, PartialEq)]
pub enum Enumerated<T> {
    Entry(T),
    End,
    Failed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facility {
    Sink,
    SinkInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    New,
    Change,
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub facility: Facility,
    pub index: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    Subscribed,
    /// The connection-time enumeration of `facility` finished. Re-queries
    /// for a single entity never produce this.
    Listed(Facility),
    Sink(Enumerated<SinkInfo>),
    SinkInput(Enumerated<SinkInputInfo>),
    Removed { facility: Facility, index: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_state_parse() {
        assert_eq!(SinkState::parse("RUNNING"), SinkState::Running);
        assert_eq!(SinkState::parse("idle"), SinkState::Idle);
        assert_eq!(SinkState::parse("SUSPENDED"), SinkState::Suspended);
        assert_eq!(SinkState::parse("INIT"), SinkState::Unknown);
    }
}
