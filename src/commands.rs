//! Command execution.

use crate::config::{Config, OutputFormat};
use crate::render::{self, RunReport, StateSummary, StepReport};
use crate::Commands;
use colored::Colorize;
use dfawalk_core::{
    presets, AutomatonDefinition, CoreError, Engine, Recorder, State, StateId, TracingObserver,
};
use serde_json::json;

/// Executes a command and returns the formatted output.
pub fn execute(config: &Config, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl => Err("repl is not a one-shot command".into()),

        // Surrounding whitespace is not part of the searched text
        Commands::Run { text } => {
            let definition = config.definition.load()?;
            run(config, &definition, text.trim())
        }

        Commands::Step { text, index, state } => {
            let definition = config.definition.load()?;
            let resume = state
                .as_deref()
                .map(|name| resolve_state(&definition, name))
                .transpose()?;
            step(config, &definition, text.trim(), index, resume)
        }

        Commands::Show { raw } => {
            let definition = config.definition.load()?;
            show(config, &definition, raw)
        }

        Commands::Check { file } => {
            let definition = AutomatonDefinition::from_path(&file)?;
            match config.output.format {
                OutputFormat::Json => Ok(render::format_json(&json!({
                    "valid": true,
                    "name": definition.name(),
                    "states": definition.len(),
                    "accepting": definition
                        .accepting_states()
                        .map(|s| definition.name_of(s.id))
                        .collect::<Vec<_>>(),
                    "checksum": definition.checksum(),
                }))?),
                OutputFormat::Text => Ok(format!(
                    "{} {} ({} states, {} accepting, checksum {})",
                    "Valid".green(),
                    definition.name().cyan(),
                    definition.len(),
                    definition.accepting_states().count(),
                    definition.checksum()
                )),
            }
        }

        Commands::Presets => {
            let mut listed = Vec::new();
            for name in presets::names() {
                let definition = presets::by_name(name)?;
                listed.push((name.to_string(), definition));
            }
            match config.output.format {
                OutputFormat::Json => {
                    let value: Vec<_> = listed
                        .iter()
                        .map(|(name, def)| {
                            json!({
                                "name": name,
                                "states": def.len(),
                                "checksum": def.checksum(),
                            })
                        })
                        .collect();
                    Ok(render::format_json(&value)?)
                }
                OutputFormat::Text => {
                    let lines: Vec<_> = listed
                        .iter()
                        .map(|(name, def)| {
                            format!("  {:<14} {} states", name.cyan(), def.len())
                        })
                        .collect();
                    Ok(format!("{}\n{}", "Presets:".bold(), lines.join("\n")))
                }
            }
        }

        Commands::Config { save } => match save {
            Some(path) => {
                config.save(&path)?;
                Ok(format!("{} {}", "Saved config to".green(), path.display()))
            }
            None => Ok(serde_yaml::to_string(config)?),
        },
    }
}

/// Looks a state up by name, then by numeric id.
pub(crate) fn resolve_state<'d>(
    definition: &'d AutomatonDefinition,
    name: &str,
) -> Result<&'d State, CoreError> {
    definition
        .state_by_name(name)
        .or_else(|| {
            name.parse::<StateId>()
                .ok()
                .and_then(|id| definition.state(id))
        })
        .ok_or_else(|| CoreError::UnknownState {
            name: name.to_string(),
        })
}

/// Full-mode run.
pub(crate) fn run(
    config: &Config,
    definition: &AutomatonDefinition,
    text: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut engine = Engine::new((Recorder::new(), TracingObserver));
    let last = engine.run(text, definition)?;
    let (recorder, _) = engine.into_observer();

    match config.output.format {
        OutputFormat::Json => {
            let report = RunReport {
                definition: definition.name(),
                checksum: definition.checksum(),
                input: text,
                final_state: StateSummary::new(definition, last),
                accepted_at: recorder.accept_positions(),
                notifications: &recorder.notifications,
            };
            Ok(render::format_json(&report)?)
        }
        OutputFormat::Text => {
            let mut lines =
                render::notification_lines(&recorder.notifications, config.output.show_index_changes);
            lines.push(format!(
                "{} {}",
                "Final state:".bold(),
                render::state_line(definition, last)
            ));
            Ok(lines.join("\n"))
        }
    }
}

/// Single-step call; prints the resume token for the next one.
pub(crate) fn step(
    config: &Config,
    definition: &AutomatonDefinition,
    text: &str,
    index: usize,
    resume: Option<&State>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut engine = Engine::new((Recorder::new(), TracingObserver));
    let state = engine.step(text, definition, index, resume)?;
    let (recorder, _) = engine.into_observer();

    let span = text.chars().count().max(1);
    let next_index = (index + 1 < span).then_some(index + 1);

    match config.output.format {
        OutputFormat::Json => {
            let report = StepReport {
                definition: definition.name(),
                input: text,
                position: index,
                state: StateSummary::new(definition, state),
                next_index,
                notifications: &recorder.notifications,
            };
            Ok(render::format_json(&report)?)
        }
        OutputFormat::Text => {
            // A single step always gets its line, even with --changes-only
            let mut lines = render::notification_lines(&recorder.notifications, true);
            lines.push(format!(
                "{} {}",
                "State:".bold(),
                render::state_line(definition, state)
            ));
            match next_index {
                Some(next) => lines.push(format!(
                    "{} --index {} --state {}",
                    "Next:".dimmed(),
                    next,
                    definition.name_of(state.id)
                )),
                None => lines.push("End of input".dimmed().to_string()),
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Renders the definition as a table, or as its document with `raw`.
pub(crate) fn show(
    config: &Config,
    definition: &AutomatonDefinition,
    raw: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    match (raw, config.output.format) {
        (true, OutputFormat::Json) => Ok(render::format_json(&definition.to_json()?)?),
        (true, OutputFormat::Text) => Ok(definition.to_yaml_string()?),
        (false, OutputFormat::Json) => Ok(render::format_json(&json!({
            "name": definition.name(),
            "checksum": definition.checksum(),
            "states": definition
                .states()
                .iter()
                .map(|s| StateSummary::new(definition, s))
                .collect::<Vec<_>>(),
            "alphabet": definition.alphabet(),
        }))?),
        (false, OutputFormat::Text) => Ok(render::definition_table(definition)),
    }
}
