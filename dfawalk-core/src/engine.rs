//! Execution engine - walks an input through a definition one symbol at a
//! time and reports each step to an observer.

use crate::definition::{default_definition, AutomatonDefinition, State};
use crate::error::CoreError;
use crate::observer::Observer;
use crate::symbol::Symbol;

/// The DFA interpreter.
///
/// The engine owns its observer but no definition: every call receives the
/// definition to run against, so unrelated runs never share a table.
#[derive(Debug)]
pub struct Engine<O = ()> {
    observer: O,
}

impl<O: Observer> Engine<O> {
    /// Creates an engine that reports to `observer`.
    pub fn new(observer: O) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Runs `input` through `definition`.
    ///
    /// - `definition`: `None` runs against the single-state default.
    /// - `start_index`: when set, processes exactly the symbol at this index
    ///   (single-step mode) instead of the whole input.
    /// - `resume`: when set, starts from this state instead of `start`.
    ///
    /// Returns the state reached after the last processed symbol. In
    /// single-step mode that state is the token to pass back as `resume`
    /// together with `start_index + 1`.
    ///
    /// Empty input is processed as a single epsilon step at position 0.
    pub fn execute<'d>(
        &mut self,
        input: &str,
        definition: Option<&'d AutomatonDefinition>,
        start_index: Option<usize>,
        resume: Option<&'d State>,
    ) -> Result<&'d State, CoreError> {
        let definition = match definition {
            Some(d) => d,
            None => default_definition(),
        };
        let len = input.chars().count();
        let from = start_index.unwrap_or(0);
        self.walk(input, len, input.chars().skip(from), definition, start_index, resume)
    }

    /// Shared walk loop. `chars` yields the input from `start_index` (or 0)
    /// onwards; `len` is the input's length in chars.
    pub(crate) fn walk<'d>(
        &mut self,
        input: &str,
        len: usize,
        mut chars: impl Iterator<Item = char>,
        definition: &'d AutomatonDefinition,
        start_index: Option<usize>,
        resume: Option<&'d State>,
    ) -> Result<&'d State, CoreError> {
        let span = len.max(1);
        let single_step = start_index.is_some();

        let (from, to) = match start_index {
            Some(index) if index >= span => {
                return Err(CoreError::IndexOutOfRange { index, len });
            }
            Some(index) => (index, index + 1),
            None => (0, span),
        };

        let mut current = match resume {
            Some(state) if !definition.contains(state) => {
                return Err(CoreError::InvalidResumeState {
                    state: format!("{} ({})", state.id, state.label),
                });
            }
            Some(state) => &definition.states()[state.id],
            None => definition.start(),
        };

        tracing::debug!(
            definition = %definition.name(),
            input_len = len,
            from,
            single_step,
            "executing"
        );

        self.observer.on_start(input, single_step);

        for position in from..to {
            let symbol = chars.next().map(Symbol::from).unwrap_or(Symbol::Epsilon);
            let prior = current;
            let next = definition.step_from(prior.id, symbol);

            if next.id != prior.id {
                self.observer.on_state_change(position, symbol, prior, next);
            }

            self.observer.on_index_change(position, symbol, prior, next);

            if next.accepting {
                self.observer.on_accept(position, symbol, next);
            }

            current = next;
        }

        self.observer.on_complete(current, single_step);

        tracing::debug!(
            final_state = current.id,
            accepting = current.accepting,
            "execution complete"
        );

        Ok(current)
    }

    /// Runs the whole input from the start state.
    pub fn run<'d>(
        &mut self,
        input: &str,
        definition: &'d AutomatonDefinition,
    ) -> Result<&'d State, CoreError> {
        self.execute(input, Some(definition), None, None)
    }

    /// Processes the single symbol at `index`, continuing from `resume` (or
    /// from `start` when `None`).
    pub fn step<'d>(
        &mut self,
        input: &str,
        definition: &'d AutomatonDefinition,
        index: usize,
        resume: Option<&'d State>,
    ) -> Result<&'d State, CoreError> {
        self.execute(input, Some(definition), Some(index), resume)
    }
}

/// Outcome of one [`Stepper`] step.
#[derive(Debug, Clone, Copy)]
pub struct StepResult<'d> {
    /// Position that was processed.
    pub position: usize,
    /// Symbol at that position after normalization.
    pub symbol: Symbol,
    /// State reached.
    pub state: &'d State,
    /// True if this step began a fresh pass over the input.
    pub restarted: bool,
    /// True if this step consumed the last symbol.
    pub finished: bool,
}

/// Resumable single-step cursor over one input.
///
/// Threads the returned state and the next index back into the engine on
/// every call. Stepping after the last symbol starts over from `start`.
/// The input is split into chars once, so a full pass is linear.
#[derive(Debug, Clone)]
pub struct Stepper<'d> {
    definition: &'d AutomatonDefinition,
    input: String,
    chars: Vec<char>,
    next_index: usize,
    state: Option<&'d State>,
}

impl<'d> Stepper<'d> {
    pub fn new(definition: &'d AutomatonDefinition, input: impl Into<String>) -> Self {
        Self::resume(definition, input, 0, None)
    }

    /// Rebuilds a cursor from a resume token: the index of the next symbol and
    /// the state reached by the previous step.
    pub fn resume(
        definition: &'d AutomatonDefinition,
        input: impl Into<String>,
        next_index: usize,
        state: Option<&'d State>,
    ) -> Self {
        let input = input.into();
        let chars = input.chars().collect();
        Self {
            definition,
            input,
            chars,
            next_index,
            state,
        }
    }

    /// Index of the symbol the next step will process.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// State reached by the last step, or `None` before the first one.
    pub fn state(&self) -> Option<&'d State> {
        self.state
    }

    /// Number of steps in a full pass (at least one, for empty input).
    pub fn span(&self) -> usize {
        self.chars.len().max(1)
    }

    pub fn is_finished(&self) -> bool {
        self.next_index >= self.span()
    }

    pub fn reset(&mut self) {
        self.next_index = 0;
        self.state = None;
    }

    /// Processes the next symbol.
    pub fn step<O: Observer>(
        &mut self,
        engine: &mut Engine<O>,
    ) -> Result<StepResult<'d>, CoreError> {
        if self.is_finished() {
            self.reset();
        }
        let restarted = self.next_index == 0;
        let position = self.next_index;
        let rest = self.chars.get(position..).unwrap_or(&[]);
        let symbol = rest.first().map_or(Symbol::Epsilon, |&c| Symbol::from(c));

        let state = engine.walk(
            &self.input,
            self.chars.len(),
            rest.iter().copied(),
            self.definition,
            Some(position),
            self.state,
        )?;
        self.state = Some(state);
        self.next_index += 1;

        Ok(StepResult {
            position,
            symbol,
            state,
            restarted,
            finished: self.is_finished(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::START;
    use crate::observer::{Callbacks, Notification, Recorder};
    use std::collections::BTreeMap;

    /// Accepts any input containing "ab".
    fn ab_definition() -> AutomatonDefinition {
        let names = BTreeMap::from([
            (START.to_string(), 0),
            ("a".to_string(), 1),
            ("ab".to_string(), 2),
        ]);
        let states = vec![
            State::new(0, "start").on('a', 1),
            State::new(1, "a").on('b', 2).on('a', 1),
            State::new(2, "ab").accepting(true).otherwise(2),
        ];
        AutomatonDefinition::new("ab", names, states).unwrap()
    }

    #[test]
    fn test_full_run_notification_order() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());

        let last = engine.run("xab", &def).unwrap();
        assert_eq!(last.id, 2);

        let c = |ch| Symbol::Char(ch);
        assert_eq!(
            engine.observer().notifications,
            vec![
                Notification::Start {
                    input: "xab".into(),
                    single_step: false
                },
                Notification::IndexChange {
                    position: 0,
                    symbol: c('x'),
                    from: 0,
                    to: 0
                },
                Notification::StateChange {
                    position: 1,
                    symbol: c('a'),
                    from: 0,
                    to: 1
                },
                Notification::IndexChange {
                    position: 1,
                    symbol: c('a'),
                    from: 0,
                    to: 1
                },
                Notification::StateChange {
                    position: 2,
                    symbol: c('b'),
                    from: 1,
                    to: 2
                },
                Notification::IndexChange {
                    position: 2,
                    symbol: c('b'),
                    from: 1,
                    to: 2
                },
                Notification::Accept {
                    position: 2,
                    symbol: c('b'),
                    state: 2
                },
                Notification::Complete {
                    state: 2,
                    single_step: false
                },
            ]
        );
    }

    #[test]
    fn test_accept_repeats_while_accepting() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());
        engine.run("abzz", &def).unwrap();
        assert_eq!(engine.observer().accept_positions(), vec![1, 2, 3]);
    }

    #[test]
    fn test_uppercase_input_is_folded() {
        let def = ab_definition();
        let mut engine = Engine::new(());
        assert!(engine.run("AB", &def).unwrap().accepting);
    }

    #[test]
    fn test_empty_input_takes_one_epsilon_step() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());
        let last = engine.run("", &def).unwrap();
        assert_eq!(last.id, 0);
        assert_eq!(
            engine.observer().steps().cloned().collect::<Vec<_>>(),
            vec![Notification::IndexChange {
                position: 0,
                symbol: Symbol::Epsilon,
                from: 0,
                to: 0
            }]
        );
    }

    #[test]
    fn test_default_definition_when_none_given() {
        let mut engine = Engine::new(Recorder::new());
        let last = engine.execute("hello", None, None, None).unwrap();
        assert!(last.accepting);
        assert_eq!(engine.observer().accept_positions(), vec![0, 1, 2, 3, 4]);
        assert!(engine.observer().state_changes().is_empty());
    }

    #[test]
    fn test_single_step_processes_one_symbol() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());

        let a = engine.step("ab", &def, 0, None).unwrap();
        assert_eq!(a.id, 1);
        let ab = engine.step("ab", &def, 1, Some(a)).unwrap();
        assert_eq!(ab.id, 2);

        let recorder = engine.observer();
        let index_changes = recorder
            .steps()
            .filter(|n| matches!(n, Notification::IndexChange { .. }))
            .count();
        assert_eq!(index_changes, 2);
        assert!(matches!(
            recorder.notifications.last(),
            Some(Notification::Complete {
                state: 2,
                single_step: true
            })
        ));
    }

    #[test]
    fn test_resume_in_full_mode() {
        let def = ab_definition();
        let mut engine = Engine::new(());
        let a = def.state_by_name("a").unwrap();
        let last = engine.execute("b", Some(&def), None, Some(a)).unwrap();
        assert_eq!(last.id, 2);
    }

    #[test]
    fn test_index_out_of_range_fails_before_notifying() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());

        let result = engine.step("ab", &def, 2, None);
        assert!(matches!(
            result,
            Err(CoreError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(engine.observer().notifications.is_empty());

        // Index 0 on empty input is the epsilon step
        assert!(engine.step("", &def, 0, None).is_ok());
        assert!(engine.step("", &def, 1, None).is_err());
    }

    #[test]
    fn test_foreign_resume_state_rejected() {
        let def = ab_definition();
        let mut engine = Engine::new(Recorder::new());
        let foreign = State::new(1, "elsewhere").accepting(true);

        let result = engine.step("ab", &def, 1, Some(&foreign));
        assert!(matches!(result, Err(CoreError::InvalidResumeState { .. })));
        assert!(engine.observer().notifications.is_empty());
    }

    #[test]
    fn test_callbacks_observer() {
        let def = ab_definition();
        let mut changes = Vec::new();
        let mut completed = None;
        {
            let callbacks = Callbacks::new()
                .with_state_change(|pos, _, prior, next| changes.push((pos, prior.id, next.id)))
                .with_complete(|state, _| completed = Some(state.id));
            let mut engine = Engine::new(callbacks);
            engine.run("aab", &def).unwrap();
        }
        assert_eq!(changes, vec![(0, 0, 1), (2, 1, 2)]);
        assert_eq!(completed, Some(2));
    }

    #[test]
    fn test_stepper_threads_state_and_restarts() {
        let def = ab_definition();
        let mut engine = Engine::new(());
        let mut stepper = Stepper::new(&def, "ab");

        let first = stepper.step(&mut engine).unwrap();
        assert!(first.restarted);
        assert_eq!(first.symbol, Symbol::Char('a'));
        assert_eq!(first.state.id, 1);

        let second = stepper.step(&mut engine).unwrap();
        assert!(!second.restarted);
        assert!(second.finished);
        assert!(second.state.accepting);

        let again = stepper.step(&mut engine).unwrap();
        assert!(again.restarted);
        assert_eq!(again.position, 0);
        assert_eq!(again.state.id, 1);
    }

    #[test]
    fn test_stepper_pass_matches_full_run() {
        let def = ab_definition();
        let input = "xAbaÄb".repeat(50);

        let mut full = Engine::new(Recorder::new());
        let last = full.run(&input, &def).unwrap();

        let mut stepped = Engine::new(Recorder::new());
        let mut stepper = Stepper::new(&def, input.as_str());
        assert!(stepper.state().is_none());
        while !stepper.is_finished() {
            stepper.step(&mut stepped).unwrap();
        }

        assert_eq!(stepper.state().map(|s| s.id), Some(last.id));
        assert_eq!(
            full.observer().steps().collect::<Vec<_>>(),
            stepped.observer().steps().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_stepper_on_empty_input() {
        let def = ab_definition();
        let mut engine = Engine::new(());
        let mut stepper = Stepper::new(&def, "");
        let result = stepper.step(&mut engine).unwrap();
        assert_eq!(result.symbol, Symbol::Epsilon);
        assert!(result.finished);
        assert_eq!(stepper.span(), 1);
    }

    #[test]
    fn test_stepper_resume_token() {
        let def = ab_definition();
        let mut engine = Engine::new(());
        let a = def.state_by_name("a");
        let mut stepper = Stepper::resume(&def, "ab", 1, a);

        let result = stepper.step(&mut engine).unwrap();
        assert_eq!(result.position, 1);
        assert!(result.finished);
        assert_eq!(result.state.id, 2);

        // A foreign state in the token is still rejected by the engine
        let foreign = State::new(1, "elsewhere");
        let mut bad = Stepper::resume(&def, "ab", 1, Some(&foreign));
        assert!(matches!(
            bad.step(&mut engine),
            Err(CoreError::InvalidResumeState { .. })
        ));
    }
}
