//! Tracing capture for asserting on emitted diagnostics.
#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// One recorded event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn mentions(&self, needle: &str) -> bool {
        self.message.contains(needle) || self.fields.iter().any(|(_, v)| v.contains(needle))
    }
}

type Sink = Arc<Mutex<Vec<CapturedEvent>>>;

/// Records every event on the current thread while alive.
///
/// The subscriber is thread-scoped, so use it with the current-thread tokio
/// test runtime.
pub struct TestLogCapture {
    events: Sink,
    _guard: tracing::subscriber::DefaultGuard,
}

impl TestLogCapture {
    pub fn start() -> Self {
        let events = Sink::default();
        let subscriber = tracing_subscriber::registry().with(Recorder(events.clone()));
        Self {
            events,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn assert_logged_at_level(&self, level: Level, needle: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.level == level && e.message.contains(needle)),
            "no {level} event containing {needle:?} in {events:#?}"
        );
    }

    pub fn assert_field_logged(&self, name: &str, needle: &str) {
        let events = self.events();
        assert!(
            events
                .iter()
                .any(|e| e.field(name).is_some_and(|v| v.contains(needle))),
            "no event with {name} containing {needle:?} in {events:#?}"
        );
    }

    pub fn assert_not_logged(&self, needle: &str) {
        let hits: Vec<_> = self.events().into_iter().filter(|e| e.mentions(needle)).collect();
        assert!(hits.is_empty(), "{needle:?} appeared in {hits:#?}");
    }
}

struct Recorder(Sink);

impl<S: Subscriber> Layer<S> for Recorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut captured = CapturedEvent {
            level: *event.metadata().level(),
            message: String::new(),
            fields: Vec::new(),
        };
        event.record(&mut captured);
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(captured);
    }
}

impl Visit for CapturedEvent {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}
