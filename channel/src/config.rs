//! Channel configuration.

use std::sync::Arc;

use crate::event::{EventSink, NullSink, TracingSink};
use crate::frame::MAX_FRAME_LEN;

/// Configuration shared by the handshake and the channel it produces.
#[derive(Clone)]
pub struct ChannelConfig {
    /// Maximum application frame payload accepted on read and write.
    pub max_frame_len: usize,

    /// Subscriber for structured channel events.
    pub events: Arc<dyn EventSink>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelConfig {
    pub fn new() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            events: Arc::new(NullSink),
        }
    }

    /// Development configuration: events forwarded to `tracing`.
    pub fn development() -> Self {
        Self::new().with_event_sink(Arc::new(TracingSink))
    }

    /// Production configuration: no event emission unless subscribed.
    pub fn production() -> Self {
        Self::new()
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }
}
