//! Interactive stepping REPL.

use crate::commands;
use crate::config::Config;
use crate::render;
use colored::Colorize;
use dfawalk_core::{
    presets, AutomatonDefinition, CoreError, Engine, Recorder, StateId, Stepper, TracingObserver,
};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};

const HELP_TEXT: &str = r#"
Available commands:
  help                    Show this help

  text <text>             Set the input text (resets the stepper)
  step [n]                Process the next symbol (n times)
  run [text]              Run the whole text at once
  reset                   Start the next step from the beginning
  state                   Show the current state and position

  show [raw]              Show the active definition
  load <file>             Load a definition file (JSON or YAML)
  preset <name>           Switch to a bundled preset
  presets                 List bundled presets

  quit, exit              Exit the REPL
"#;

/// Upper bound for `step <n>`.
const MAX_STEP_COUNT: usize = 10_000;

/// Stepping session over one definition and one input text.
struct Session {
    definition: AutomatonDefinition,
    text: String,
    next_index: usize,
    state: Option<StateId>,
    engine: Engine<(Recorder, TracingObserver)>,
}

impl Session {
    fn new(definition: AutomatonDefinition) -> Self {
        Self {
            definition,
            text: String::new(),
            next_index: 0,
            state: None,
            engine: Engine::new((Recorder::new(), TracingObserver)),
        }
    }

    fn reset(&mut self) {
        self.next_index = 0;
        self.state = None;
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.reset();
    }

    fn set_definition(&mut self, definition: AutomatonDefinition) {
        self.definition = definition;
        self.reset();
    }

    /// Processes one symbol, threading the state from the previous step.
    fn step(&mut self) -> Result<String, CoreError> {
        let resume = self.state.and_then(|id| self.definition.state(id));
        let mut stepper =
            Stepper::resume(&self.definition, self.text.as_str(), self.next_index, resume);

        self.engine.observer_mut().0.clear();
        let result = stepper.step(&mut self.engine)?;
        self.next_index = stepper.next_index();
        self.state = stepper.state().map(|s| s.id);

        let mut lines = Vec::new();
        if result.restarted {
            lines.push(format!("Stepping \"{}\"", self.text).dimmed().to_string());
        }
        lines.extend(render::notification_lines(
            &self.engine.observer().0.notifications,
            true,
        ));
        if result.finished {
            lines.push("End of input; the next step starts over".dimmed().to_string());
        }
        Ok(lines.join("\n"))
    }

    fn describe(&self) -> String {
        let span = self.text.chars().count().max(1);
        match self.state.and_then(|id| self.definition.state(id)) {
            Some(state) if self.next_index < span => format!(
                "{}\nNext index: {}",
                render::state_line(&self.definition, state),
                self.next_index
            ),
            Some(state) => format!(
                "{}\n{}",
                render::state_line(&self.definition, state),
                "At end of input".dimmed()
            ),
            None => format!(
                "Not started; first step processes index 0 of \"{}\"",
                self.text
            ),
        }
    }
}

pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let definition = config.definition.load()?;

    println!("{}", "dfawalk".bold().cyan());
    println!(
        "Loaded {} ({} states)",
        definition.name().cyan(),
        definition.len()
    );

    // Create readline editor
    let editor_config = EditorConfig::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(editor_config)?;

    if let Some(path) = &config.repl.history_file {
        let _ = rl.load_history(path);
    }

    println!("Type 'help' for available commands.\n");

    let mut session = Session::new(definition);
    let prompt = format!("{} ", config.repl.prompt.cyan());

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut session, config, line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    if let Some(path) = &config.repl.history_file {
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("could not save history to {}: {}", path.display(), e);
        }
    }

    Ok(())
}

fn execute_repl_command(
    session: &mut Session,
    config: &Config,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let (cmd, rest) = line
        .split_once(char::is_whitespace)
        .map(|(cmd, rest)| (cmd, rest.trim_start()))
        .unwrap_or((line, ""));

    match cmd.to_lowercase().as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        "text" | "t" => {
            session.set_text(rest);
            Ok(Some(format!(
                "Text set ({} symbols)",
                session.text.chars().count()
            )))
        }

        "step" | "s" => {
            let count = if rest.is_empty() {
                1
            } else {
                match rest.parse::<usize>() {
                    Ok(n) if n > 0 && n <= MAX_STEP_COUNT => n,
                    _ => {
                        return Ok(Some(format!(
                            "Usage: step [count] (count between 1 and {})",
                            MAX_STEP_COUNT
                        )))
                    }
                }
            };
            let mut output = Vec::new();
            for _ in 0..count {
                output.push(session.step()?);
            }
            Ok(Some(output.join("\n")))
        }

        "run" | "r" => {
            if !rest.is_empty() {
                session.set_text(rest);
            }
            session.reset();
            Ok(Some(commands::run(config, &session.definition, &session.text)?))
        }

        "reset" => {
            session.reset();
            Ok(Some("Stepper reset".to_string()))
        }

        "state" => Ok(Some(session.describe())),

        "show" => Ok(Some(commands::show(
            config,
            &session.definition,
            rest == "raw",
        )?)),

        "load" => {
            if rest.is_empty() {
                return Ok(Some("Usage: load <file>".to_string()));
            }
            let definition = AutomatonDefinition::from_path(rest)?;
            let message = format!(
                "{} {} ({} states, checksum {})",
                "Loaded".green(),
                definition.name().cyan(),
                definition.len(),
                definition.checksum()
            );
            session.set_definition(definition);
            Ok(Some(message))
        }

        "preset" => {
            if rest.is_empty() {
                return Ok(Some("Usage: preset <name>".to_string()));
            }
            let definition = presets::by_name(rest)?;
            let message = format!("{} {}", "Switched to".green(), definition.name().cyan());
            session.set_definition(definition);
            Ok(Some(message))
        }

        "presets" => Ok(Some(presets::names().join("\n"))),

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        ))),
    }
}
