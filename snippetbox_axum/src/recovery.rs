//! Panic capture for [`crate::recover_panic`]
//!
//! The panic hook runs on the panicking thread before unwinding starts, so it is the
//! only place where the backtrace still shows the code that panicked. Reports are kept
//! per thread and picked up by the stage that recovers the panic.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic;
use std::sync::Once;

/// Where and why a handler panicked
#[derive(Debug)]
pub(crate) struct PanicReport {
    pub(crate) message: String,
    pub(crate) location: String,
    pub(crate) backtrace: Backtrace,
}

thread_local! {
    static RECOVERY_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<PanicReport>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Installs the process-wide panic hook used by [`crate::recover_panic`].
///
/// Panics raised while a request is inside that stage are recorded with their
/// location and backtrace and logged once by the stage, instead of being printed by
/// the default hook. Panics anywhere else go to the previously installed hook.
/// Later calls do nothing.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if RECOVERY_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }

            let report = PanicReport {
                message: payload_message(info.payload()),
                location: info
                    .location()
                    .map(|location| location.to_string())
                    .unwrap_or_else(|| "unknown location".to_string()),
                backtrace: Backtrace::force_capture(),
            };
            LAST_PANIC.with(|last| *last.borrow_mut() = Some(report));
        }));
    });
}

/// Marks the current thread as polling code whose panics will be recovered
pub(crate) struct RecoveryScope(());

impl RecoveryScope {
    pub(crate) fn enter() -> Self {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self(())
    }
}

impl Drop for RecoveryScope {
    fn drop(&mut self) {
        RECOVERY_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Takes the report of the last panic recorded on this thread
pub(crate) fn take_panic_report() -> Option<PanicReport> {
    LAST_PANIC.with(|last| last.borrow_mut().take())
}

/// Puts a report back on the current thread, for a stage that catches a panic and
/// resumes it after an `.await` that may have moved the task to another thread.
pub(crate) fn restore_panic_report(report: Option<PanicReport>) {
    if report.is_some() {
        LAST_PANIC.with(|last| *last.borrow_mut() = report);
    }
}

pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(payload_message(&*boxed), "boom");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(payload_message(&*boxed), "bang");

        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(payload_message(&*boxed), "unknown panic");
    }

    #[test]
    fn test_panic_inside_scope_is_recorded_at_its_origin() {
        install_panic_hook();

        let result = {
            let _scope = RecoveryScope::enter();
            panic::catch_unwind(|| -> u8 { panic!("raised in a scope") })
        };
        assert!(result.is_err());

        let report = take_panic_report().expect("hook records the panic");
        assert_eq!(report.message, "raised in a scope");
        assert!(report.location.contains("recovery.rs"), "{}", report.location);
        assert!(take_panic_report().is_none());
    }

    #[test]
    fn test_panic_outside_scope_is_not_recorded() {
        install_panic_hook();

        let result = panic::catch_unwind(|| -> u8 { panic!("not in a scope") });
        assert!(result.is_err());
        assert!(take_panic_report().is_none());
    }

    #[test]
    fn test_restore_puts_report_back() {
        restore_panic_report(Some(PanicReport {
            message: "moved".to_string(),
            location: "here".to_string(),
            backtrace: Backtrace::disabled(),
        }));
        assert_eq!(take_panic_report().unwrap().message, "moved");

        restore_panic_report(None);
        assert!(take_panic_report().is_none());
    }
}
