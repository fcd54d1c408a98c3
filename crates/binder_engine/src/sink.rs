use std::sync::mpsc::Sender;

use crate::EngineEvent;

/// Receives progress and per-chapter reports while a series is bound.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events to the engine's event channel. A hung-up receiver is
/// ignored; the job still runs to completion.
pub struct ChannelSink(Sender<EngineEvent>);

impl ChannelSink {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self(tx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.0.send(event);
    }
}

pub struct DiscardSink;

impl ProgressSink for DiscardSink {
    fn emit(&self, _event: EngineEvent) {}
}
