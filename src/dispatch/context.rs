//! Registration context: the "current dispatcher" slot.
//!
//! # Responsibilities
//! - Hold the dispatcher that free registration functions write into
//! - Save and restore the enclosing dispatcher around nested groups
//!
//! # Design Decisions
//! - A thread-local stack instead of a process-wide global: setup is
//!   synchronous, so the innermost scope is always the active one
//! - Scopes are popped by a guard, so a panicking setup callback never leaves
//!   a stale dispatcher behind
//! - Calling a hook with no active scope is a programmer error

use std::cell::RefCell;

use thiserror::Error;

use crate::dispatch::Dispatcher;

thread_local! {
    static ACTIVE: RefCell<Vec<Dispatcher>> = const { RefCell::new(Vec::new()) };
}

/// Errors raised by the registration context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A registration hook ran outside a setup callback.
    #[error(
        "invalid hook call: hooks can only be called inside a setup callback \
         (Dispatcher::build, serve, mock or path)"
    )]
    NoActiveContext,
}

/// Run `setup` with `dispatcher` as the active target and hand it back.
///
/// The previous target is restored even if `setup` panics.
pub fn scope<F: FnOnce()>(dispatcher: Dispatcher, setup: F) -> Dispatcher {
    let guard = ScopeGuard::enter(dispatcher);
    setup();
    guard.exit()
}

/// Run `f` against the active dispatcher.
pub fn try_with_dispatcher<R>(
    f: impl FnOnce(&mut Dispatcher) -> R,
) -> Result<R, RegistrationError> {
    ACTIVE.with(|stack| {
        let mut stack = stack.borrow_mut();
        stack
            .last_mut()
            .map(f)
            .ok_or(RegistrationError::NoActiveContext)
    })
}

/// Run `f` against the active dispatcher.
///
/// # Panics
///
/// Panics when called outside a setup callback. `f` must not register
/// anything itself.
pub fn with_dispatcher<R>(f: impl FnOnce(&mut Dispatcher) -> R) -> R {
    match try_with_dispatcher(f) {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

/// Returns true while a setup callback is running on this thread.
pub fn is_active() -> bool {
    ACTIVE.with(|stack| !stack.borrow().is_empty())
}

struct ScopeGuard {
    depth: usize,
    exited: bool,
}

impl ScopeGuard {
    fn enter(dispatcher: Dispatcher) -> Self {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(dispatcher);
            Self {
                depth: stack.len(),
                exited: false,
            }
        })
    }

    fn exit(mut self) -> Dispatcher {
        self.exited = true;
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.truncate(self.depth);
            stack.pop().unwrap_or_default()
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        ACTIVE.with(|stack| {
            if let Ok(mut stack) = stack.try_borrow_mut() {
                stack.truncate(self.depth.saturating_sub(1));
            }
        });
        tracing::warn!(depth = self.depth, "Setup scope unwound, registrations discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Context;

    #[test]
    fn test_no_active_context() {
        assert!(!is_active());
        assert_eq!(
            try_with_dispatcher(|d| d.routes().len()),
            Err(RegistrationError::NoActiveContext)
        );
    }

    #[test]
    fn test_scope_collects_registrations() {
        let dispatcher = scope(Dispatcher::new(), || {
            assert!(is_active());
            with_dispatcher(|d| d.get("/", |_: Context| async { "foo" }));
        });
        assert!(!is_active());
        assert_eq!(dispatcher.routes().len(), 1);
    }

    #[test]
    fn test_nested_scopes_restore_parent() {
        let outer = scope(Dispatcher::new(), || {
            let inner = scope(Dispatcher::new(), || {
                with_dispatcher(|d| d.get("/inner", |_: Context| async {}));
            });
            assert_eq!(inner.routes().len(), 1);
            with_dispatcher(|d| d.get("/outer", |_: Context| async {}));
        });
        assert_eq!(outer.routes().len(), 1);
        assert_eq!(outer.routes()[0].pattern().template(), "/outer");
    }

    #[test]
    fn test_panicking_setup_clears_slot() {
        let result = std::panic::catch_unwind(|| {
            scope(Dispatcher::new(), || panic!("setup failed"));
        });
        assert!(result.is_err());
        assert!(!is_active());
    }

    #[test]
    #[should_panic(expected = "invalid hook call")]
    fn test_hook_outside_setup_panics() {
        with_dispatcher(|d| d.routes().len());
    }
}
