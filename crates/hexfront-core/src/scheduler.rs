//! Day scheduler - runs registered day actions once per day boundary.
//!
//! Actions run in reverse registration order. An action that returns
//! [`ActionStatus::Complete`] is dropped; one that fails or panics is logged,
//! reported in the [`DayReport`] and kept for the next day.
//!
//! New actions go through a [`Registrar`], a cloneable handle to a shared
//! inbox. The inbox is merged into the live list at the start of each day, so
//! an action registered while a day is running first runs on the next day.

use crate::types::Day;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};

/// Error type returned by day actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What the scheduler should do with an action after it ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionStatus {
    /// Run again next day.
    Retain,
    /// Drop the action permanently.
    Complete,
}

/// A callback run once per simulated day against a context `C`.
pub trait DayAction<C>: Send {
    /// Short description used in logs and fault reports.
    fn label(&self) -> String;

    /// Run the action for `day`.
    fn on_day(&mut self, day: Day, ctx: &mut C) -> Result<ActionStatus, BoxError>;
}

/// Adapts a closure into a [`DayAction`].
pub struct FnAction<F> {
    label: String,
    f: F,
}

impl<F> FnAction<F> {
    pub fn new(label: impl Into<String>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<C, F> DayAction<C> for FnAction<F>
where
    F: FnMut(Day, &mut C) -> Result<ActionStatus, BoxError> + Send,
{
    fn label(&self) -> String {
        self.label.clone()
    }

    fn on_day(&mut self, day: Day, ctx: &mut C) -> Result<ActionStatus, BoxError> {
        (self.f)(day, ctx)
    }
}

/// An action that failed during a day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionFault {
    pub label: String,
    pub day: Day,
    pub message: String,
}

/// Summary of one day's run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DayReport {
    /// The day that was run.
    pub day: Day,
    /// Number of actions invoked.
    pub ran: usize,
    /// Number of actions that completed and were dropped.
    pub completed: usize,
    /// Actions that returned an error or panicked.
    pub faults: Vec<ActionFault>,
}

type Inbox<C> = Arc<Mutex<Vec<Box<dyn DayAction<C>>>>>;

/// Cloneable handle for registering actions, usable while a day is running.
pub struct Registrar<C> {
    inbox: Inbox<C>,
}

impl<C> Clone for Registrar<C> {
    fn clone(&self) -> Self {
        Self {
            inbox: Arc::clone(&self.inbox),
        }
    }
}

impl<C> Default for Registrar<C> {
    fn default() -> Self {
        Self {
            inbox: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<C> std::fmt::Debug for Registrar<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("pending", &self.pending())
            .finish()
    }
}

impl<C> Registrar<C> {
    /// Queue an action. It joins the scheduler at the start of the next day run.
    pub fn register(&self, action: impl DayAction<C> + 'static) {
        self.register_boxed(Box::new(action));
    }

    pub fn register_boxed(&self, action: Box<dyn DayAction<C>>) {
        debug!(action = %action.label(), "registered day action");
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action);
    }

    /// Number of actions waiting to join the scheduler.
    pub fn pending(&self) -> usize {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn take(&self) -> Vec<Box<dyn DayAction<C>>> {
        std::mem::take(&mut *self.inbox.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Runs day actions against a shared context.
pub struct DayScheduler<C> {
    actions: Vec<Box<dyn DayAction<C>>>,
    registrar: Registrar<C>,
}

impl<C> Default for DayScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DayScheduler<C> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            registrar: Registrar::default(),
        }
    }

    /// A handle that registers into this scheduler.
    pub fn registrar(&self) -> Registrar<C> {
        self.registrar.clone()
    }

    /// Queue an action for the next day run.
    pub fn register(&self, action: impl DayAction<C> + 'static) {
        self.registrar.register(action);
    }

    /// Number of live actions (not counting ones still in the inbox).
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.registrar.pending() == 0
    }

    /// Labels of live and pending actions, in registration order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.actions.iter().map(|a| a.label()).collect();
        let inbox = self
            .registrar
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        labels.extend(inbox.iter().map(|a| a.label()));
        labels
    }

    /// Drop every live and pending action.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.registrar.take();
    }

    /// Run every action once for `day`.
    ///
    /// Faults never abort the run: the failing action is kept and the rest of
    /// the day proceeds.
    pub fn run_day(&mut self, day: Day, ctx: &mut C) -> DayReport {
        let mut incoming = self.registrar.take();
        self.actions.append(&mut incoming);

        let mut report = DayReport {
            day,
            ..DayReport::default()
        };

        // Reverse order so completed actions can be removed in place.
        let mut index = self.actions.len();
        while index > 0 {
            index -= 1;
            report.ran += 1;

            let action = &mut self.actions[index];
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| action.on_day(day, ctx)));

            let message = match outcome {
                Ok(Ok(ActionStatus::Retain)) => continue,
                Ok(Ok(ActionStatus::Complete)) => {
                    self.actions.remove(index);
                    report.completed += 1;
                    continue;
                }
                Ok(Err(err)) => {
                    warn!(day, action = %action.label(), error = %err, "day action failed");
                    err.to_string()
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(day, action = %action.label(), panic = %message, "day action panicked");
                    format!("panicked: {}", message)
                }
            };

            report.faults.push(ActionFault {
                label: action.label(),
                day,
                message,
            });
        }

        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
