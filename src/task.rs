//! Background load tasks.
//!
//! [`spawn_load`] runs a closure on a dedicated, detached thread and hands
//! back a [`LoadHandle`] whose [`get`](LoadHandle::get) blocks for the
//! outcome. A detached thread never blocks process shutdown, so a caller
//! that abandons the handle leaks nothing but the in-flight work. Panics in
//! the closure surface as [`EnvgridError::TaskFailed`] instead of poisoning
//! the caller.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use crate::envgrid_errors::EnvgridError;

/// Handle to a load task in flight.
pub struct LoadHandle<T> {
    rx: mpsc::Receiver<Result<T, EnvgridError>>,
    spawn_err: Option<std::io::Error>,
}

impl<T> LoadHandle<T> {
    /// Block until the task finishes.
    pub fn get(self) -> Result<T, EnvgridError> {
        if let Some(e) = self.spawn_err {
            return Err(EnvgridError::IoError(e));
        }
        self.rx
            .recv()
            .map_err(|_| EnvgridError::TaskFailed("worker thread disappeared".to_string()))?
    }
}

/// Run a fallible load on a background thread.
///
/// Arguments
/// ---------
/// * `f`: the work to run; its error type is already [`EnvgridError`]
///
/// Return
/// ------
/// * a [`LoadHandle`] for collecting the result
pub fn spawn_load<T, F>(f: F) -> LoadHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EnvgridError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawn_err = thread::Builder::new()
        .name("envgrid-load".to_string())
        .spawn(move || {
            let outcome = match catch_unwind(AssertUnwindSafe(f)) {
                Ok(result) => result,
                Err(payload) => Err(EnvgridError::TaskFailed(panic_message(&*payload))),
            };
            // The caller may have dropped the handle; nothing to do then.
            let _ = tx.send(outcome);
        })
        .err();
    LoadHandle { rx, spawn_err }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
