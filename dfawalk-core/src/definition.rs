//! Automaton definition types.
//!
//! A definition is an indexed sequence of states. Each state lists its
//! explicit transitions in order and names a fallback (`otherwise`) target
//! taken for every other symbol, which makes the transition function total.
//!
//! Definitions can be written in a small JSON or YAML DSL:
//!
//! ```yaml
//! name: men-women
//! states:
//!   - name: start
//!     label: "1"
//!     transitions:
//!       - { on: "w", to: w }
//!       - { on: "m", to: m }
//!     otherwise: start
//!   - name: m
//!     transitions:
//!       - { on: "e", to: me }
//!   # ...
//! ```
//!
//! State ids are list positions, and the first state must be named `start`.

use crate::error::CoreError;
use crate::symbol::{normalize, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// 0-based state ordinal, equal to the state's position in its definition.
pub type StateId = usize;

/// Name every definition must give to state 0.
pub const START: &str = "start";

/// An explicit transition out of a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Trigger symbol, already case-folded.
    pub on: char,
    /// Target state id.
    pub to: StateId,
}

impl Transition {
    pub fn new(on: char, to: StateId) -> Self {
        Self { on, to }
    }
}

/// A state in an automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Position of the state in its definition.
    pub id: StateId,
    /// Human-readable tag, not behaviorally significant.
    pub label: String,
    /// Explicit transitions; the first one whose trigger matches wins.
    pub transitions: Vec<Transition>,
    /// Target for every symbol that matches no explicit transition.
    pub otherwise: StateId,
    /// Whether reaching this state constitutes a match.
    pub accepting: bool,
}

impl State {
    pub fn new(id: StateId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            transitions: Vec::new(),
            otherwise: 0,
            accepting: false,
        }
    }

    pub fn on(mut self, symbol: char, to: StateId) -> Self {
        self.transitions.push(Transition::new(symbol, to));
        self
    }

    pub fn otherwise(mut self, to: StateId) -> Self {
        self.otherwise = to;
        self
    }

    pub fn accepting(mut self, accepting: bool) -> Self {
        self.accepting = accepting;
        self
    }

    /// Returns the id this state moves to on `symbol`.
    pub fn target(&self, symbol: Symbol) -> StateId {
        self.transitions
            .iter()
            .find(|t| Symbol::Char(t.on) == symbol)
            .map(|t| t.to)
            .unwrap_or(self.otherwise)
    }
}

/// Raw transition as written in the DSL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRaw {
    /// Trigger symbol: a string holding exactly one character.
    #[serde(deserialize_with = "deserialize_trigger")]
    pub on: char,

    /// Target state name.
    pub to: String,
}

fn deserialize_trigger<'de, D>(deserializer: D) -> Result<char, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct TriggerVisitor;

    impl<'de> Visitor<'de> for TriggerVisitor {
        type Value = char;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a single-character string")
        }

        fn visit_char<E>(self, v: char) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(normalize(v))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u32::try_from(v)
                .ok()
                .and_then(|d| char::from_digit(d, 10))
                .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            let mut chars = v.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(normalize(c)),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    deserializer.deserialize_any(TriggerVisitor)
}

/// Raw state as written in the DSL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRaw {
    /// Semantic name, unique within the definition.
    pub name: String,

    /// Display label; defaults to the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionRaw>,

    /// Fallback target name; defaults to `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise: Option<String>,

    #[serde(default)]
    pub accepting: bool,
}

/// Raw automaton definition as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionRaw {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub states: Vec<StateRaw>,

    /// Optional free-form metadata, kept on the definition but not interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Validated and indexed automaton definition.
///
/// Construction is the only place validity is checked; once built, a
/// definition is immutable, so every id it hands out is in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomatonDefinition {
    /// Definition name, for display.
    name: String,

    /// Semantic state names. Always contains `start` -> 0.
    names: BTreeMap<String, StateId>,

    /// States indexed by id.
    states: Vec<State>,

    /// Free-form metadata from the source document.
    meta: Option<serde_json::Value>,

    /// CRC32C of the canonical JSON encoding.
    checksum: String,
}

impl AutomatonDefinition {
    /// Validates and builds a definition.
    pub fn new(
        name: impl Into<String>,
        names: BTreeMap<String, StateId>,
        mut states: Vec<State>,
    ) -> Result<Self, CoreError> {
        let name = name.into();

        if states.is_empty() {
            return Err(CoreError::invalid("definition has no states"));
        }

        match names.get(START) {
            Some(0) => {}
            Some(id) => {
                return Err(CoreError::invalid(format!(
                    "state '{}' must have id 0, found {}",
                    START, id
                )))
            }
            None => {
                return Err(CoreError::invalid(format!(
                    "no state named '{}'",
                    START
                )))
            }
        }

        let count = states.len();
        for (state_name, id) in &names {
            if *id >= count {
                return Err(CoreError::invalid(format!(
                    "name '{}' refers to state {} but only {} states exist",
                    state_name, id, count
                )));
            }
        }

        for (index, state) in states.iter_mut().enumerate() {
            if state.id != index {
                return Err(CoreError::invalid(format!(
                    "state at position {} has id {}",
                    index, state.id
                )));
            }
            if state.otherwise >= count {
                return Err(CoreError::invalid(format!(
                    "state {} falls back to out-of-range state {}",
                    index, state.otherwise
                )));
            }

            let mut seen = HashSet::new();
            for t in state.transitions.iter_mut() {
                t.on = normalize(t.on);
                if t.to >= count {
                    return Err(CoreError::invalid(format!(
                        "state {} has transition on '{}' to out-of-range state {}",
                        index, t.on, t.to
                    )));
                }
                if !seen.insert(t.on) {
                    return Err(CoreError::invalid(format!(
                        "state {} has more than one transition on '{}'",
                        index, t.on
                    )));
                }
            }
        }

        Ok(Self::indexed(name, names, states))
    }

    fn indexed(name: String, names: BTreeMap<String, StateId>, states: Vec<State>) -> Self {
        let mut definition = Self {
            name,
            names,
            states,
            meta: None,
            checksum: String::new(),
        };
        definition.checksum = checksum_of(&definition.to_raw());
        definition
    }

    /// The trivial one-state definition: `start`, accepting, and falling
    /// back to itself on every symbol.
    pub fn single_state() -> Self {
        Self::indexed(
            "single-state".to_string(),
            BTreeMap::from([(START.to_string(), 0)]),
            vec![State::new(0, START).accepting(true)],
        )
    }

    /// Builds a definition from its raw DSL form.
    pub fn from_raw(raw: DefinitionRaw) -> Result<Self, CoreError> {
        let mut names = BTreeMap::new();
        for (id, state) in raw.states.iter().enumerate() {
            if names.insert(state.name.clone(), id).is_some() {
                return Err(CoreError::invalid(format!(
                    "duplicate state name '{}'",
                    state.name
                )));
            }
        }

        let resolve = |target: &str, context: &str| -> Result<StateId, CoreError> {
            names.get(target).copied().ok_or_else(|| {
                CoreError::invalid(format!("{} '{}' not in states list", context, target))
            })
        };

        let mut states = Vec::with_capacity(raw.states.len());
        for (id, s) in raw.states.iter().enumerate() {
            let transitions = s
                .transitions
                .iter()
                .map(|t| Ok(Transition::new(t.on, resolve(&t.to, "transition target")?)))
                .collect::<Result<Vec<_>, CoreError>>()?;
            let otherwise = resolve(s.otherwise.as_deref().unwrap_or(START), "fallback target")?;

            states.push(State {
                id,
                label: s.label.clone().unwrap_or_else(|| s.name.clone()),
                transitions,
                otherwise,
                accepting: s.accepting,
            });
        }

        let name = raw.name.unwrap_or_else(|| "unnamed".to_string());
        let mut definition = Self::new(name, names, states)?;
        if raw.meta.is_some() {
            definition.meta = raw.meta;
            definition.checksum = checksum_of(&definition.to_raw());
        }
        Ok(definition)
    }

    /// Parses and validates a definition from a JSON value.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, CoreError> {
        let raw: DefinitionRaw = serde_json::from_value(json.clone())?;
        Self::from_raw(raw)
    }

    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        let raw: DefinitionRaw = serde_json::from_str(s)?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, CoreError> {
        let raw: DefinitionRaw = serde_yaml::from_str(s)?;
        Self::from_raw(raw)
    }

    /// Loads a definition file. `.json` files are parsed as JSON, anything
    /// else as YAML. A definition without a name takes the file stem.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let mut raw: DefinitionRaw = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        if raw.name.is_none() {
            raw.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string());
        }

        tracing::debug!("loaded definition from {}", path.display());
        Self::from_raw(raw)
    }

    /// Returns the raw DSL form of this definition.
    pub fn to_raw(&self) -> DefinitionRaw {
        let names: Vec<String> = (0..self.states.len()).map(|id| self.name_of(id)).collect();

        let states = self
            .states
            .iter()
            .map(|s| {
                let name = &names[s.id];
                StateRaw {
                    name: name.clone(),
                    label: (s.label != *name).then(|| s.label.clone()),
                    transitions: s
                        .transitions
                        .iter()
                        .map(|t| TransitionRaw {
                            on: t.on,
                            to: names[t.to].clone(),
                        })
                        .collect(),
                    otherwise: Some(names[s.otherwise].clone()),
                    accepting: s.accepting,
                }
            })
            .collect();

        DefinitionRaw {
            name: Some(self.name.clone()),
            states,
            meta: self.meta.clone(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        Ok(serde_json::to_value(self.to_raw())?)
    }

    pub fn to_yaml_string(&self) -> Result<String, CoreError> {
        Ok(serde_yaml::to_string(&self.to_raw())?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// CRC32C of the canonical JSON encoding, as 8 hex digits.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Metadata carried over from the source document.
    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }

    /// The unique initial state.
    pub fn start(&self) -> &State {
        &self.states[0]
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn state_by_name(&self, name: &str) -> Option<&State> {
        self.names.get(name).and_then(|id| self.states.get(*id))
    }

    /// Returns a name for the state: the first semantic name mapped to it,
    /// or a synthesized `s<id>` when it has none.
    pub fn name_of(&self, id: StateId) -> String {
        if id == 0 {
            return START.to_string();
        }
        if let Some((name, _)) = self.names.iter().find(|(_, v)| **v == id) {
            return name.clone();
        }
        let mut synthesized = format!("s{}", id);
        while self.names.contains_key(&synthesized) {
            synthesized.push('_');
        }
        synthesized
    }

    pub fn names(&self) -> &BTreeMap<String, StateId> {
        &self.names
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Always false: a definition holds at least the start state.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns true if `state` is one of this definition's states.
    pub fn contains(&self, state: &State) -> bool {
        self.states.get(state.id).is_some_and(|s| s == state)
    }

    pub fn accepting_states(&self) -> impl Iterator<Item = &State> {
        self.states.iter().filter(|s| s.accepting)
    }

    /// Distinct explicit trigger symbols, sorted.
    pub fn alphabet(&self) -> BTreeSet<char> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.iter().map(|t| t.on))
            .collect()
    }

    /// Looks up the next state for `state` on `symbol`: the first explicit
    /// transition whose trigger matches, otherwise the fallback target.
    ///
    /// Returns `None` if `state` does not belong to this definition.
    pub fn next_state(&self, state: &State, symbol: Symbol) -> Option<&State> {
        if !self.contains(state) {
            return None;
        }
        Some(self.step_from(state.id, symbol))
    }

    /// Lookup on an id already known to be in range.
    pub(crate) fn step_from(&self, id: StateId, symbol: Symbol) -> &State {
        &self.states[self.states[id].target(symbol)]
    }
}

fn checksum_of(raw: &DefinitionRaw) -> String {
    let json_bytes = serde_json::to_vec(raw).unwrap_or_default();
    format!("{:08x}", crc32c::crc32c(&json_bytes))
}

/// Returns the process-wide default definition used when a run is given
/// none.
pub fn default_definition() -> &'static AutomatonDefinition {
    static DEFAULT: OnceLock<AutomatonDefinition> = OnceLock::new();
    DEFAULT.get_or_init(AutomatonDefinition::single_state)
}
