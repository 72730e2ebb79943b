//! Bridge from `tracing` events to a [`LogDestination`]
//!
//! ```ignore
//! let destination = Arc::new(config.build_destination()?);
//! let (layer, guard) = EmailLayer::new(destination)
//!     .with_min_level(Level::WARN)
//!     .with_worker(&Handle::current(), DEFAULT_QUEUE_CAPACITY);
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(layer)
//!     .init();
//!
//! // ...
//! guard.shutdown().await;
//! ```

use crate::destination::LogDestination;
use crate::log_model::{LogItem, LogModel, LogType};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

const INTERNAL_TARGETS: [&str; 2] = ["email_destination", "lettre"];

/// Queue size used by the worker when callers have no better estimate
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Layer that mails every event at or above a minimum level.
///
/// Event fields map onto the log model: `message` becomes the description,
/// `context` the context, `log_type` overrides the type derived from the level
/// and every other field is kept as a log item.
///
/// By default each event is delivered on the emitting thread. With
/// [`with_worker`](Self::with_worker) events go through a bounded queue to a
/// single task; events that find the queue full are counted and dropped, and
/// events emitted after the worker stopped are delivered on the emitting thread.
///
/// Events from this crate and from `lettre` are ignored so a failing send
/// cannot feed back into itself.
pub struct EmailLayer {
    destination: Arc<dyn LogDestination>,
    min_level: Level,
    source: Option<String>,
    queue: Option<Queue>,
}

struct Queue {
    sender: mpsc::Sender<Command>,
    dropped: Arc<AtomicU64>,
}

enum Command {
    Deliver(LogModel),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

impl EmailLayer {
    pub fn new(destination: Arc<dyn LogDestination>) -> Self {
        Self {
            destination,
            min_level: Level::ERROR,
            source: None,
            queue: None,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Fixed source for every event instead of the event target
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Deliver events from one task spawned on `handle`, queueing at most
    /// `capacity` events. Keep the guard and call
    /// [`EmailLayerGuard::shutdown`] before the runtime stops, otherwise queued
    /// events are lost with the runtime.
    pub fn with_worker(mut self, handle: &Handle, capacity: usize) -> (Self, EmailLayerGuard) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));
        let worker = handle.spawn(run_worker(Arc::clone(&self.destination), receiver));

        self.queue = Some(Queue {
            sender: sender.clone(),
            dropped: Arc::clone(&dropped),
        });

        let guard = EmailLayerGuard {
            sender,
            worker: Some(worker),
            dropped,
        };
        (self, guard)
    }

    fn enabled_for(&self, level: &Level, target: &str) -> bool {
        // TRACE is the greatest level, ERROR the smallest
        *level <= self.min_level
            && !INTERNAL_TARGETS
                .iter()
                .any(|internal| target.starts_with(internal))
    }

    fn log_model(&self, event: &Event<'_>) -> LogModel {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let log_type = visitor
            .log_type
            .unwrap_or_else(|| LogType::from(*metadata.level()));
        let source = self
            .source
            .clone()
            .unwrap_or_else(|| metadata.target().to_string());

        let mut log = LogModel::new(log_type, visitor.message.unwrap_or_default()).with_source(source);
        if let Some(context) = visitor.context {
            log = log.with_context(context);
        }
        log.log_items = visitor.items;
        log
    }

    fn dispatch(&self, log: LogModel) {
        let Some(queue) = &self.queue else {
            self.deliver_inline(log);
            return;
        };

        match queue.sender.try_send(Command::Deliver(log)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = queue.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    destination = self.destination.name(),
                    dropped,
                    "Log email queue is full, dropping event"
                );
            }
            Err(TrySendError::Closed(Command::Deliver(log))) => self.deliver_inline(log),
            Err(TrySendError::Closed(_)) => {}
        }
    }

    fn deliver_inline(&self, log: LogModel) {
        if let Err(e) = self.destination.send(std::slice::from_ref(&log)) {
            tracing::error!(
                destination = self.destination.name(),
                log_id = %log.log_id,
                error = %e,
                "Failed to forward log event"
            );
        }
    }
}

async fn run_worker(destination: Arc<dyn LogDestination>, mut receiver: mpsc::Receiver<Command>) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Deliver(log) => {
                if let Err(e) = destination.send_async(std::slice::from_ref(&log)).await {
                    tracing::error!(
                        destination = destination.name(),
                        log_id = %log.log_id,
                        error = %e,
                        "Failed to forward log event"
                    );
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!(destination = destination.name(), "Log email worker stopped");
}

/// Handle to the worker started by [`EmailLayer::with_worker`].
///
/// Dropping the guard leaves the worker running for as long as the runtime
/// lives.
#[derive(Debug)]
pub struct EmailLayerGuard {
    sender: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl EmailLayerGuard {
    /// Wait until every event queued before this call has been delivered
    pub async fn flush(&self) {
        let (done, delivered) = oneshot::channel();
        if self.sender.send(Command::Flush(done)).await.is_ok() {
            let _ = delivered.await;
        }
    }

    /// Deliver every queued event and stop the worker
    pub async fn shutdown(mut self) {
        let _ = self.sender.send(Command::Shutdown).await;
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Log email worker failed");
            }
        }
    }

    /// Number of events dropped because the queue was full
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for EmailLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailLayer")
            .field("destination", &self.destination.name())
            .field("min_level", &self.min_level)
            .field("source", &self.source)
            .field("queued", &self.queue.is_some())
            .finish()
    }
}

impl<S: Subscriber> Layer<S> for EmailLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.enabled_for(metadata.level(), metadata.target()) {
            return;
        }

        let log = self.log_model(event);
        self.dispatch(log);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    context: Option<String>,
    log_type: Option<LogType>,
    items: Vec<LogItem>,
}

impl EventVisitor {
    fn record_value(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => self.message = Some(value_to_string(value)),
            "context" => self.context = Some(value_to_string(value)),
            "log_type" => {
                let raw = value_to_string(value);
                match raw.parse() {
                    Ok(log_type) => self.log_type = Some(log_type),
                    Err(_) => self.items.push(LogItem::new("log_type", raw)),
                }
            }
            name => self.items.push(LogItem::new(name, value)),
        }
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::from(format!("{:?}", value)));
    }
}
