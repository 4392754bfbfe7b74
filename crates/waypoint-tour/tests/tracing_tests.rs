#![forbid(unsafe_code)]

//! Structured log events emitted by the tour engine.
//!
//! A resolution miss must carry the step id and title so hosts can tell a
//! broken landmark from a slow one; a failed write must carry the backend and
//! the policy that was applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing_subscriber::layer::SubscriberExt;
use waypoint_core::geometry::Rect;
use waypoint_core::viewport::LayoutClass;
use waypoint_tour::{
    DegradedPersistencePolicy, DomSnapshot, LinkNode, MemoryStatusStore, Resolution,
    TerminalAction, TerminalRecord, TourStatusRecorder, resolve, select_catalog,
};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct FieldVisitor {
    message: String,
    fields: HashMap<String, String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.fields.insert(field.name().to_string(), rendered);
        }
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor {
            message: String::new(),
            fields: HashMap::new(),
        };
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

fn with_captured_events<F: FnOnce()>(f: F) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn find<'a>(events: &'a [CapturedEvent], message: &str) -> Option<&'a CapturedEvent> {
    events.iter().find(|event| event.message == message)
}

#[test]
fn resolution_miss_logs_step_identity() {
    let step = select_catalog(LayoutClass::Compact).get(5).unwrap().clone();
    let events = with_captured_events(|| {
        let resolution = resolve(&step, LayoutClass::Compact, &DomSnapshot::new());
        assert_eq!(resolution, Resolution::NotFound);
    });

    let miss = find(&events, "tour target not found").expect("miss is logged");
    assert_eq!(miss.level, tracing::Level::WARN);
    assert_eq!(miss.fields["step_id"], step.id);
    assert_eq!(miss.fields["title"], step.title);
    assert_eq!(miss.fields["layout"], "compact");
}

#[test]
fn fallback_resolution_logs_strategy_at_debug() {
    let step = select_catalog(LayoutClass::Compact).get(2).unwrap().clone();
    let dom = DomSnapshot::new().with_link(LinkNode::new(
        step.title.to_uppercase(),
        "/elsewhere",
        Rect::new(0.0, 120.0, 240.0, 40.0),
    ));
    let events = with_captured_events(|| {
        assert!(resolve(&step, LayoutClass::Compact, &dom).is_found());
    });

    let hit = find(&events, "tour target resolved through fallback").expect("fallback logged");
    assert_eq!(hit.level, tracing::Level::DEBUG);
    assert_eq!(hit.fields["strategy"], "exact_text");
    assert!(find(&events, "tour target not found").is_none());
}

#[test]
fn failed_write_logs_backend_and_policy() {
    let store = Arc::new(MemoryStatusStore::new());
    store.set_failing(true);
    let mut recorder = TourStatusRecorder::new(
        Box::new(store.clone()),
        DegradedPersistencePolicy::RetryOnNextSignIn,
    );

    let events = with_captured_events(|| {
        recorder.record("u-1", TerminalRecord::new(TerminalAction::Skipped, 42));
    });

    let failure = find(&events, "failed to persist tour status").expect("failure logged");
    assert_eq!(failure.level, tracing::Level::WARN);
    assert_eq!(failure.fields["action"], "skipped");
    assert_eq!(failure.fields["policy"], "retry-on-next-sign-in");
    assert_eq!(failure.fields["backend"], recorder.store_name());
}
