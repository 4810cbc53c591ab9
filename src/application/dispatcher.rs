//! Subscription registry and handler dispatch.

use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use super::events::{Event, EventName};
use crate::domain::errors::RegistrationError;

/// Error a handler may return. Logged and otherwise ignored.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

type Handler = Arc<dyn Fn(Event) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Registers a handler under its own function name.
///
/// ```ignore
/// async fn on_message(event: Event) -> HandlerResult { Ok(()) }
///
/// subscribe!(bot, on_message)?;
/// ```
#[macro_export]
macro_rules! subscribe {
    ($target:expr, $handler:ident) => {
        $target.on(stringify!($handler), $handler)
    };
}

/// Maps each event name to at most one handler and runs handlers on
/// tracked tasks.
///
/// Dispatch never waits for a handler. Handler errors and panics are logged
/// inside the handler's task.
///
/// `max_concurrent` limits how many handlers run at once, not how many are
/// tracked: every dispatched event gets a task, and tasks beyond the limit
/// wait for a permit. Events are never dropped. Finished tasks are reaped on
/// the next dispatch and the whole set is emptied by [`drain`](Self::drain).
pub struct Dispatcher {
    handlers: RwLock<HashMap<EventName, Handler>>,
    tasks: Mutex<JoinSet<()>>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            tasks: Mutex::new(JoinSet::new()),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Registers `handler` for the event called `name`, e.g. `on_message`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::UnknownEvent`] for a name outside the catalogue,
    /// [`RegistrationError::DuplicateHandler`] when the slot is taken. The
    /// existing handler stays in place.
    pub fn on<F, Fut>(&self, name: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let event: EventName = name.parse()?;

        match self.handlers.write().entry(event) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateHandler {
                name: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(move |event| handler(event).boxed()));
                debug!(event = %event, "Registered event handler");
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn has_handler(&self, name: EventName) -> bool {
        self.handlers.read().contains_key(&name)
    }

    /// Handler tasks spawned and not yet reaped.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock();
        reap(&mut tasks);
        tasks.len()
    }

    /// Spawns the handler registered for `event`, if any.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, event: Event) {
        let name = event.name();
        let Some(handler) = self.handlers.read().get(&name).cloned() else {
            trace!(event = %name, "No handler registered");
            return;
        };

        let permits = Arc::clone(&self.permits);
        let mut tasks = self.tasks.lock();
        reap(&mut tasks);

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            let outcome = AssertUnwindSafe(async move { handler(event).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => trace!(event = %name, "Handler finished"),
                Ok(Err(e)) => error!(event = %name, error = %e, "Event handler failed"),
                Err(panic) => error!(
                    event = %name,
                    panic = %panic_message(panic.as_ref()),
                    "Event handler panicked"
                ),
            }
        });
    }

    /// Waits up to `timeout` for in-flight handlers.
    ///
    /// Handlers still running at the deadline are detached, not cancelled.
    /// Returns whether every handler finished.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let mut tasks = std::mem::take(&mut *self.tasks.lock());
        if tasks.is_empty() {
            return true;
        }

        debug!(in_flight = tasks.len(), "Draining event handlers");
        let finished = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();

        if !finished {
            warn!(remaining = tasks.len(), "Handler drain timed out, detaching");
            tasks.detach_all();
        }
        finished
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.read().keys().collect::<Vec<_>>())
            .field("in_flight", &self.tasks.lock().len())
            .finish_non_exhaustive()
    }
}

fn reap(tasks: &mut JoinSet<()>) {
    while tasks.try_join_next().is_some() {}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
