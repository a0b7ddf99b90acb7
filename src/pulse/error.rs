#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to run pactl: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("pactl {args} exited with {status}: {stderr}")]
    Command { args: String, status: String, stderr: String },
    #[error("Undecodable pactl output: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Subscription to the audio server ended")]
    Disconnected,
    #[error("Notification receiver dropped")]
    ChannelClosed,
}
