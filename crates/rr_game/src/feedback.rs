//! Outbound notifications for UI and audio collaborators.
//!
//! Gameplay pushes `Feedback` events into a queue during a fixed step; the
//! session drains the queue at the end of the step and hands each event to
//! every registered sink. Sinks never answer back and nothing in the
//! simulation depends on what they do with an event.

/// Slot indices are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    SlotSelected(usize),
    SlotDeselected(usize),
    SlotFilled(usize),
    SlotEmptied(usize),
    SlotOverwritten(usize),
    Text(String),
    ButtonSound,
}

#[derive(Debug, Default)]
pub struct FeedbackQueue {
    events: Vec<Feedback>,
}

impl FeedbackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Feedback) {
        self.events.push(event);
    }

    pub fn text(&mut self, message: impl Into<String>) {
        self.events.push(Feedback::Text(message.into()));
    }

    pub fn events(&self) -> &[Feedback] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Feedback> {
        std::mem::take(&mut self.events)
    }
}

pub trait FeedbackSink {
    fn notify(&mut self, event: &Feedback);
}

/// Writes every event to the log at debug level.
pub struct LogSink;

impl FeedbackSink for LogSink {
    fn notify(&mut self, event: &Feedback) {
        match event {
            Feedback::Text(message) => log::debug!("feedback text: {message}"),
            other => log::debug!("feedback: {other:?}"),
        }
    }
}
