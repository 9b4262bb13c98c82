//! Output formatting for runs, steps, and definitions.

use colored::Colorize;
use dfawalk_core::{AutomatonDefinition, Notification, State, StateId, Symbol};
use serde::Serialize;

/// Summary of a state for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub id: StateId,
    pub name: String,
    pub label: String,
    pub accepting: bool,
}

impl StateSummary {
    pub fn new(definition: &AutomatonDefinition, state: &State) -> Self {
        Self {
            id: state.id,
            name: definition.name_of(state.id),
            label: state.label.clone(),
            accepting: state.accepting,
        }
    }
}

/// JSON document for a full run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub definition: &'a str,
    pub checksum: &'a str,
    pub input: &'a str,
    pub final_state: StateSummary,
    pub accepted_at: Vec<usize>,
    pub notifications: &'a [Notification],
}

/// JSON document for a single step.
#[derive(Debug, Serialize)]
pub struct StepReport<'a> {
    pub definition: &'a str,
    pub input: &'a str,
    pub position: usize,
    pub state: StateSummary,
    /// Index to pass to the next step, or `None` after the last symbol.
    pub next_index: Option<usize>,
    pub notifications: &'a [Notification],
}

/// Formats a symbol for a log line; whitespace is made visible.
pub fn display_symbol(symbol: &Symbol) -> String {
    match symbol {
        Symbol::Char(c) if c.is_whitespace() => "\u{2423}".to_string(),
        other => other.to_string(),
    }
}

/// Renders per-step notifications as log lines.
///
/// With `show_index_changes` every processed symbol gets a line; otherwise
/// only state changes do. Accept notifications are always shown.
pub fn notification_lines(notifications: &[Notification], show_index_changes: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for n in notifications {
        match n {
            Notification::IndexChange {
                position,
                symbol,
                from,
                to,
            } if show_index_changes => {
                lines.push(move_line(*position, symbol, *from, *to));
            }
            Notification::StateChange {
                position,
                symbol,
                from,
                to,
            } if !show_index_changes => {
                lines.push(move_line(*position, symbol, *from, *to));
            }
            Notification::Accept { position, .. } => {
                lines.push(format!("{:03}: {}", position, "Accepted!".green().bold()));
            }
            _ => {}
        }
    }
    lines
}

fn move_line(position: usize, symbol: &Symbol, from: StateId, to: StateId) -> String {
    let line = format!(
        "{:03}: {}, {} to {}",
        position,
        display_symbol(symbol).cyan(),
        from.to_string().bold(),
        to.to_string().bold()
    );
    if from == to {
        line
    } else {
        format!("{} {}", line, "*".yellow())
    }
}

/// One-line description of a state.
pub fn state_line(definition: &AutomatonDefinition, state: &State) -> String {
    let verdict = if state.accepting {
        "accepting".green()
    } else {
        "not accepting".yellow()
    };
    format!(
        "{} {} (label {}, {})",
        state.id.to_string().bold(),
        definition.name_of(state.id).cyan(),
        state.label,
        verdict
    )
}

/// Renders a definition as a table.
pub fn definition_table(definition: &AutomatonDefinition) -> String {
    let mut output = format!(
        "{} ({} states, checksum {})\n",
        definition.name().bold(),
        definition.len(),
        definition.checksum()
    );
    output.push_str(&format!(
        "  {:>3}  {:<10} {:<8} {:<6} {:<30} {}\n",
        "id", "name", "label", "accept", "transitions", "otherwise"
    ));

    for state in definition.states() {
        let transitions = state
            .transitions
            .iter()
            .map(|t| format!("{}->{}", t.on, definition.name_of(t.to)))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!(
            "  {:>3}  {:<10} {:<8} {:<6} {:<30} {}\n",
            state.id,
            definition.name_of(state.id),
            state.label,
            if state.accepting { "yes" } else { "no" },
            transitions,
            definition.name_of(state.otherwise)
        ));
    }
    output
}

/// Formats JSON for display.
pub fn format_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
