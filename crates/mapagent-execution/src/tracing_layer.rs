//! Tracing layer that turns pipeline log events into diagnostic lines.
//!
//! Pipelines that report progress through `tracing` instead of a
//! `DiagnosticSink` are captured by installing this layer for the duration
//! of the call. Each event becomes one line: the message, followed by any
//! structured fields as `key=value`.

use std::fmt::Write as _;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// A tracing layer that sends each event, rendered as a line, to a channel.
pub struct DiagnosticLineLayer {
    sender: mpsc::UnboundedSender<String>,
}

impl DiagnosticLineLayer {
    /// Create a new layer with the given channel sender
    pub fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for DiagnosticLineLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        // Receiver gone means the capture already finished; drop the line
        let _ = self.sender.send(visitor.into_line());
    }
}

/// Field visitor that renders an event's fields into a single line
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn push_field(&mut self, name: &str, value: &str) {
        let _ = write!(self.fields, " {}={}", name, value);
    }

    fn into_line(self) -> String {
        if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), &format!("{:?}", value));
        }
    }
}
