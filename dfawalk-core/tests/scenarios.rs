//! Men/women search automaton scenarios.

use dfawalk_core::{presets, AutomatonDefinition, Engine, Notification, Recorder, Symbol};

fn men_women() -> AutomatonDefinition {
    presets::men_women().unwrap()
}

/// Labels of `(from, to)` for each state change, with the triggering symbol.
fn transitions(def: &AutomatonDefinition, recorder: &Recorder) -> Vec<(String, char, String)> {
    recorder
        .notifications
        .iter()
        .filter_map(|n| match n {
            Notification::StateChange {
                symbol, from, to, ..
            } => Some((
                def.state(*from).unwrap().label.clone(),
                symbol.as_char().unwrap(),
                def.state(*to).unwrap().label.clone(),
            )),
            _ => None,
        })
        .collect()
}

fn t(from: &str, on: char, to: &str) -> (String, char, String) {
    (from.to_string(), on, to.to_string())
}

#[test]
fn men_is_accepted() {
    let def = men_women();
    let mut engine = Engine::new(Recorder::new());

    let last = engine.run("men", &def).unwrap();

    assert_eq!(last.label, "4");
    assert!(last.accepting);
    assert_eq!(
        transitions(&def, engine.observer()),
        vec![t("1", 'm', "2"), t("2", 'e', "3"), t("3", 'n', "4")]
    );
    assert_eq!(engine.observer().accept_positions(), vec![2]);
}

#[test]
fn women_is_accepted() {
    let def = men_women();
    let mut engine = Engine::new(Recorder::new());

    let last = engine.run("women", &def).unwrap();

    assert_eq!(last.label, "4");
    assert_eq!(
        transitions(&def, engine.observer()),
        vec![
            t("1", 'w', "5"),
            t("5", 'o', "6"),
            t("6", 'm', "2"),
            t("2", 'e', "3"),
            t("3", 'n', "4"),
        ]
    );
    assert_eq!(engine.observer().accept_positions(), vec![4]);
}

#[test]
fn unrelated_text_never_accepts() {
    let def = men_women();
    let mut engine = Engine::new(Recorder::new());

    let last = engine.run("xyz", &def).unwrap();

    assert_eq!(last.label, "1");
    assert!(engine.observer().accept_positions().is_empty());
    assert!(engine.observer().state_changes().is_empty());
    assert_eq!(
        engine
            .observer()
            .notifications
            .iter()
            .filter(|n| matches!(n, Notification::IndexChange { .. }))
            .count(),
        3
    );
}

#[test]
fn matches_inside_longer_text() {
    let def = men_women();
    let mut engine = Engine::new(Recorder::new());

    engine
        .run("Some MEN and some women met", &def)
        .unwrap();

    // "MEN" ends at 7, "women" ends at 22
    assert_eq!(engine.observer().accept_positions(), vec![7, 22]);
}

#[test]
fn single_step_resume_matches_full_run() {
    let def = men_women();

    let mut full = Engine::new(Recorder::new());
    let full_last = full.run("men", &def).unwrap();

    let mut stepped = Engine::new(Recorder::new());
    let mut state = None;
    for index in 0..3 {
        state = Some(stepped.step("men", &def, index, state).unwrap());
    }

    assert_eq!(state.map(|s| s.id), Some(full_last.id));
    assert_eq!(
        full.observer().steps().collect::<Vec<_>>(),
        stepped.observer().steps().collect::<Vec<_>>()
    );

    let starts = stepped
        .observer()
        .notifications
        .iter()
        .filter(|n| matches!(n, Notification::Start { single_step: true, .. }))
        .count();
    assert_eq!(starts, 3);
}

#[test]
fn epsilon_on_empty_input() {
    let def = men_women();
    let mut engine = Engine::new(Recorder::new());

    let last = engine.run("", &def).unwrap();

    assert_eq!(last.id, 0);
    assert!(engine.observer().notifications.iter().any(|n| matches!(
        n,
        Notification::IndexChange {
            symbol: Symbol::Epsilon,
            ..
        }
    )));
}
