//! Bundled automata.

use crate::definition::{AutomatonDefinition, State, START};
use crate::error::CoreError;
use std::collections::BTreeMap;

pub const MEN_WOMEN: &str = "men-women";
pub const SINGLE_STATE: &str = "single-state";

/// Names of all bundled presets.
pub fn names() -> &'static [&'static str] {
    &[MEN_WOMEN, SINGLE_STATE]
}

/// Looks up a preset by name.
pub fn by_name(name: &str) -> Result<AutomatonDefinition, CoreError> {
    match name {
        MEN_WOMEN => men_women(),
        SINGLE_STATE => Ok(AutomatonDefinition::single_state()),
        _ => Err(CoreError::UnknownPreset {
            name: name.to_string(),
        }),
    }
}

/// Searches a block of text for "men" or "women".
///
/// | id | name  | label | on                  | accepting |
/// |----|-------|-------|---------------------|-----------|
/// | 0  | start | 1     | w->w, m->m          | no        |
/// | 1  | m     | 2     | e->me, w->w         | no        |
/// | 2  | me    | 3     | n->men, m->m, w->w  | no        |
/// | 3  | men   | 4     | m->m, w->w          | yes       |
/// | 4  | w     | 5     | o->wo, m->m         | no        |
/// | 5  | wo    | 6     | m->m, w->w          | no        |
///
/// Every state falls back to `start`.
pub fn men_women() -> Result<AutomatonDefinition, CoreError> {
    const M: usize = 1;
    const ME: usize = 2;
    const MEN: usize = 3;
    const W: usize = 4;
    const WO: usize = 5;

    let names = BTreeMap::from([
        (START.to_string(), 0),
        ("m".to_string(), M),
        ("me".to_string(), ME),
        ("men".to_string(), MEN),
        ("w".to_string(), W),
        ("wo".to_string(), WO),
    ]);

    let states = vec![
        State::new(0, "1").on('w', W).on('m', M),
        State::new(M, "2").on('e', ME).on('w', W),
        State::new(ME, "3").on('n', MEN).on('m', M).on('w', W),
        State::new(MEN, "4").on('m', M).on('w', W).accepting(true),
        State::new(W, "5").on('o', WO).on('m', M),
        State::new(WO, "6").on('m', M).on('w', W),
    ];

    AutomatonDefinition::new(MEN_WOMEN, names, states)
}
