//! # dfawalk-core
//!
//! Table-driven DFA interpreter.
//!
//! This crate provides:
//! - Automaton definitions with total transition functions (explicit
//!   transitions plus a per-state fallback)
//! - A JSON/YAML definition format with validation
//! - The stepping engine, in full and resumable single-step modes
//! - Observer hooks for start, state change, index change, accept, and
//!   completion notifications
//!
//! ```
//! use dfawalk_core::{presets, Engine, Recorder};
//!
//! let def = presets::men_women().unwrap();
//! let mut engine = Engine::new(Recorder::new());
//! let last = engine.run("Women", &def).unwrap();
//! assert!(last.accepting);
//! assert_eq!(engine.observer().accept_positions(), vec![4]);
//! ```

pub mod definition;
pub mod engine;
pub mod error;
pub mod observer;
pub mod presets;
pub mod symbol;

pub use definition::{
    default_definition, AutomatonDefinition, DefinitionRaw, State, StateId, StateRaw, Transition,
    TransitionRaw, START,
};
pub use engine::{Engine, StepResult, Stepper};
pub use error::CoreError;
pub use observer::{Callbacks, Notification, Observer, Recorder, TracingObserver};
pub use symbol::{normalize, symbol_at, Symbol, EPSILON};
