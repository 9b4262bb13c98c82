//! Run notifications.
//!
//! The engine reports progress through an [`Observer`]. Every method has a
//! no-op default, so implementors override only what they care about.
//! Notifications are delivered synchronously and in order; the engine does
//! not advance until the current one returns.

use crate::definition::{State, StateId};
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};

/// Listener for engine notifications.
pub trait Observer {
    /// Raised once before any symbol is processed.
    fn on_start(&mut self, _input: &str, _single_step: bool) {}

    /// Raised when a step moves to a different state.
    fn on_state_change(
        &mut self,
        _position: usize,
        _symbol: Symbol,
        _prior: &State,
        _next: &State,
    ) {
    }

    /// Raised on every step, whether or not the state changed.
    fn on_index_change(
        &mut self,
        _position: usize,
        _symbol: Symbol,
        _prior: &State,
        _next: &State,
    ) {
    }

    /// Raised on every step whose resulting state is accepting.
    fn on_accept(&mut self, _position: usize, _symbol: Symbol, _state: &State) {}

    /// Raised once after the last processed symbol.
    fn on_complete(&mut self, _final_state: &State, _single_step: bool) {}
}

impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn on_start(&mut self, input: &str, single_step: bool) {
        (**self).on_start(input, single_step)
    }

    fn on_state_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        (**self).on_state_change(position, symbol, prior, next)
    }

    fn on_index_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        (**self).on_index_change(position, symbol, prior, next)
    }

    fn on_accept(&mut self, position: usize, symbol: Symbol, state: &State) {
        (**self).on_accept(position, symbol, state)
    }

    fn on_complete(&mut self, final_state: &State, single_step: bool) {
        (**self).on_complete(final_state, single_step)
    }
}

/// Fan-out: every notification goes to `A`, then to `B`.
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn on_start(&mut self, input: &str, single_step: bool) {
        self.0.on_start(input, single_step);
        self.1.on_start(input, single_step);
    }

    fn on_state_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        self.0.on_state_change(position, symbol, prior, next);
        self.1.on_state_change(position, symbol, prior, next);
    }

    fn on_index_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        self.0.on_index_change(position, symbol, prior, next);
        self.1.on_index_change(position, symbol, prior, next);
    }

    fn on_accept(&mut self, position: usize, symbol: Symbol, state: &State) {
        self.0.on_accept(position, symbol, state);
        self.1.on_accept(position, symbol, state);
    }

    fn on_complete(&mut self, final_state: &State, single_step: bool) {
        self.0.on_complete(final_state, single_step);
        self.1.on_complete(final_state, single_step);
    }
}

type StartFn<'a> = Box<dyn FnMut(&str, bool) + 'a>;
type MoveFn<'a> = Box<dyn FnMut(usize, Symbol, &State, &State) + 'a>;
type AcceptFn<'a> = Box<dyn FnMut(usize, Symbol, &State) + 'a>;
type CompleteFn<'a> = Box<dyn FnMut(&State, bool) + 'a>;

/// A set of optional closures, one per notification.
///
/// Built with the `with_*` methods; unset callbacks drop their notification.
#[derive(Default)]
pub struct Callbacks<'a> {
    on_start: Option<StartFn<'a>>,
    on_state_change: Option<MoveFn<'a>>,
    on_index_change: Option<MoveFn<'a>>,
    on_accept: Option<AcceptFn<'a>>,
    on_complete: Option<CompleteFn<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, f: impl FnMut(&str, bool) + 'a) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn with_state_change(mut self, f: impl FnMut(usize, Symbol, &State, &State) + 'a) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    pub fn with_index_change(mut self, f: impl FnMut(usize, Symbol, &State, &State) + 'a) -> Self {
        self.on_index_change = Some(Box::new(f));
        self
    }

    pub fn with_accept(mut self, f: impl FnMut(usize, Symbol, &State) + 'a) -> Self {
        self.on_accept = Some(Box::new(f));
        self
    }

    pub fn with_complete(mut self, f: impl FnMut(&State, bool) + 'a) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl Observer for Callbacks<'_> {
    fn on_start(&mut self, input: &str, single_step: bool) {
        if let Some(f) = self.on_start.as_mut() {
            f(input, single_step);
        }
    }

    fn on_state_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        if let Some(f) = self.on_state_change.as_mut() {
            f(position, symbol, prior, next);
        }
    }

    fn on_index_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        if let Some(f) = self.on_index_change.as_mut() {
            f(position, symbol, prior, next);
        }
    }

    fn on_accept(&mut self, position: usize, symbol: Symbol, state: &State) {
        if let Some(f) = self.on_accept.as_mut() {
            f(position, symbol, state);
        }
    }

    fn on_complete(&mut self, final_state: &State, single_step: bool) {
        if let Some(f) = self.on_complete.as_mut() {
            f(final_state, single_step);
        }
    }
}

/// Owned record of one notification, with states referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Start {
        input: String,
        single_step: bool,
    },
    StateChange {
        position: usize,
        symbol: Symbol,
        from: StateId,
        to: StateId,
    },
    IndexChange {
        position: usize,
        symbol: Symbol,
        from: StateId,
        to: StateId,
    },
    Accept {
        position: usize,
        symbol: Symbol,
        state: StateId,
    },
    Complete {
        state: StateId,
        single_step: bool,
    },
}

impl Notification {
    /// Returns true for the per-step notifications (everything but start and
    /// complete).
    pub fn is_step(&self) -> bool {
        !matches!(
            self,
            Notification::Start { .. } | Notification::Complete { .. }
        )
    }
}

/// Observer that records every notification.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub notifications: Vec<Notification>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-step notifications only, in order.
    pub fn steps(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| n.is_step())
    }

    /// Positions at which acceptance was raised.
    pub fn accept_positions(&self) -> Vec<usize> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Accept { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// `(from, to)` pairs of every state change.
    pub fn state_changes(&self) -> Vec<(StateId, StateId)> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::StateChange { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl Observer for Recorder {
    fn on_start(&mut self, input: &str, single_step: bool) {
        self.notifications.push(Notification::Start {
            input: input.to_string(),
            single_step,
        });
    }

    fn on_state_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        self.notifications.push(Notification::StateChange {
            position,
            symbol,
            from: prior.id,
            to: next.id,
        });
    }

    fn on_index_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        self.notifications.push(Notification::IndexChange {
            position,
            symbol,
            from: prior.id,
            to: next.id,
        });
    }

    fn on_accept(&mut self, position: usize, symbol: Symbol, state: &State) {
        self.notifications.push(Notification::Accept {
            position,
            symbol,
            state: state.id,
        });
    }

    fn on_complete(&mut self, final_state: &State, single_step: bool) {
        self.notifications.push(Notification::Complete {
            state: final_state.id,
            single_step,
        });
    }
}

/// Observer that logs every notification through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_start(&mut self, input: &str, single_step: bool) {
        tracing::debug!(input, single_step, "run started");
    }

    fn on_state_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        tracing::debug!(
            "[{:03}] '{}' state {} -> {}",
            position,
            symbol,
            prior.label,
            next.label
        );
    }

    fn on_index_change(&mut self, position: usize, symbol: Symbol, prior: &State, next: &State) {
        tracing::trace!("[{:03}] '{}' {} to {}", position, symbol, prior.id, next.id);
    }

    fn on_accept(&mut self, position: usize, symbol: Symbol, state: &State) {
        tracing::debug!("[{:03}] '{}' accepted in {}", position, symbol, state.label);
    }

    fn on_complete(&mut self, final_state: &State, single_step: bool) {
        tracing::debug!(
            single_step,
            accepting = final_state.accepting,
            "run complete in state {}",
            final_state.label
        );
    }
}
