//! DFA minimisation by merging equivalent states

use std::collections::BTreeSet;

use hashbrown::HashMap;

use super::{
    Automaton, Label,
    equivalence::{self, EquivalenceError},
    product::Side,
};
use crate::{
    symbol,
    trace::{Step, Trace},
    worklist::Worklist,
};

/// Drop every state not reachable from the start state
#[must_use]
pub fn remove_unreachable_states(a: &Automaton) -> Automaton {
    let reachable = Worklist::new([a.starting().to_owned()]).solve(|s| {
        a.edges(s.as_str())
            .into_iter()
            .flat_map(|e| e.values().flatten().cloned())
            .collect::<Vec<_>>()
    });

    Automaton::from_parts(
        a.starting(),
        a.accepting().iter().filter(|s| reachable.contains(*s)),
        a.alphabet(),
        a.transitions()
            .iter()
            .filter(|(s, _)| reachable.contains(*s))
            .map(|(s, e)| (s.clone(), e.clone()))
            .collect(),
    )
}

/// Name of the merged state standing for `class`
fn class_name(class: &BTreeSet<String>) -> String { class.iter().map(String::as_str).collect() }

/// The smallest complete DFA accepting the same language as `a`.
///
/// Unreachable states are dropped, missing transitions are routed to a dead
/// state, and each class of equivalent states becomes one state named by
/// concatenating its members in order.  Emits a snapshot after pruning and
/// after merging.
///
/// # Errors
/// Fails if `a` is invalid or not deterministic.
pub fn minimise<R: Trace<Automaton>>(a: &Automaton, t: &mut R) -> Result<Automaton, EquivalenceError> {
    let _span = tracing::debug_span!("minimise", states = a.transitions().len()).entered();
    equivalence::require_dfa(a, Side::Left)?;

    let (a, sink) = remove_unreachable_states(a).completed();
    t.step(|| {
        Step::described(
            a.clone(),
            match sink {
                Some(ref s) => format!("Removed unreachable states and added the dead state {s}"),
                None => "Removed unreachable states".to_owned(),
            },
        )
    });

    let classes = equivalence::state_equivalence_table(&a, &mut ())?.classes();

    let mut used = BTreeSet::new();
    let mut names = HashMap::new();
    for class in &classes {
        let name = symbol::fresh_or_self(&class_name(class), |n| !used.contains(n));
        used.insert(name.clone());
        for state in class {
            names.insert(state.as_str(), name.clone());
        }
    }

    let name_of = |s: &str| names.get(s).cloned().unwrap_or_else(|| s.to_owned());

    let mut out = a
        .alphabet()
        .iter()
        .fold(Automaton::new(name_of(a.starting())), |o, s| {
            o.with_symbol(s.as_str())
        });

    for class in &classes {
        let Some(rep) = class.first() else { continue };
        let from = name_of(rep);
        out = out.with_state(from.as_str());

        if a.is_accepting(rep) {
            out = out.with_accepting(from.as_str());
        }

        for sym in a.alphabet() {
            let by = Label::sym(sym.as_str());
            if let Some(to) = a.targets(rep, &by).next() {
                out = out.with_transition(from.as_str(), by, name_of(to));
            }
        }
    }

    tracing::debug!(
        before = a.transitions().len(),
        after = out.transitions().len(),
        "Merged equivalent states"
    );
    t.step(|| Step::described(out.clone(), "Merged equivalent states"));

    Ok(out)
}
