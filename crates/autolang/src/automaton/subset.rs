//! Subset construction: NFA and ε-NFA to DFA

use std::collections::BTreeSet;

use hashbrown::{HashMap, HashSet};

use super::{Automaton, EMPTY_SET, Invalid};
use crate::{
    symbol,
    trace::{Step, Trace},
    worklist::Worklist,
};

/// Name of a DFA state standing for a set of source states
#[must_use]
pub fn subset_name<I: IntoIterator<Item: AsRef<str>>>(states: I) -> String {
    let sorted: BTreeSet<_> = states.into_iter().map(|s| s.as_ref().to_owned()).collect();
    sorted.into_iter().collect::<Vec<_>>().join(",")
}

/// Names handed out to subsets, unique even when a joined name collides with
/// one already taken (`{a, b}` against a source state called `a,b`)
struct SubsetNames {
    assigned: HashMap<BTreeSet<String>, String>,
    taken: HashSet<String>,
}

impl SubsetNames {
    fn new(sink: &str) -> Self {
        Self {
            assigned: HashMap::new(),
            taken: HashSet::from([sink.to_owned()]),
        }
    }

    fn get(&mut self, set: &BTreeSet<String>) -> String {
        if let Some(name) = self.assigned.get(set) {
            return name.clone();
        }

        let name = symbol::fresh_or_self(&subset_name(set), |n| !self.taken.contains(n));
        self.taken.insert(name.clone());
        self.assigned.insert(set.clone(), name.clone());
        name
    }
}

/// Build a complete DFA accepting the same language as `nfa`.
///
/// Every DFA state is an ε-closed set of source states, named by
/// [`subset_name`] and counted up if that name is already in use.
/// Transitions into the empty set lead to a sink named `∅` (counted up if
/// `nfa` already uses that name), which is only added if some subset needs
/// it.  Only subsets reachable from the start are built.
///
/// A snapshot of the partial DFA is emitted after each subset is expanded.
///
/// # Errors
/// Returns the validation errors of `nfa` if it is not well-formed.
pub fn subset_construction<R: Trace<Automaton>>(
    nfa: &Automaton,
    t: &mut R,
) -> Result<Automaton, Invalid> {
    let _span =
        tracing::debug_span!("subset_construction", states = nfa.transitions().len()).entered();
    nfa.validate()?;

    let sink = symbol::fresh_or_self(EMPTY_SET, |s| !nfa.transitions().contains_key(s));
    let mut names = SubsetNames::new(&sink);
    let start = nfa.epsilon_closure([nfa.starting()]);

    let mut dfa = nfa
        .alphabet()
        .iter()
        .fold(Automaton::new(names.get(&start)), |a, s| {
            a.with_symbol(s.as_str())
        });
    let mut work = Worklist::new([start]);
    let mut needs_sink = false;

    while let Some(set) = work.pop() {
        let from = names.get(&set);
        if set.iter().any(|s| nfa.is_accepting(s)) {
            dfa = dfa.with_accepting(from.as_str());
        }

        for sym in nfa.alphabet() {
            let to = nfa.step(&set, sym);

            if to.is_empty() {
                needs_sink = true;
                dfa = dfa.with_transition(from.as_str(), sym.as_str(), sink.as_str());
            } else {
                dfa = dfa.with_transition(from.as_str(), sym.as_str(), names.get(&to));
                work.push(to);
            }
        }

        tracing::trace!(subset = %from, "Expanded subset");
        t.step(|| Step::described(dfa.clone(), format!("Expanded {{{}}}", set_list(&set))));
    }

    if needs_sink {
        for sym in nfa.alphabet() {
            dfa = dfa.with_transition(sink.as_str(), sym.as_str(), sink.as_str());
        }

        t.step(|| {
            Step::described(
                dfa.clone(),
                format!("Missing transitions lead to the sink state {sink}"),
            )
        });
    }

    tracing::debug!(states = dfa.transitions().len(), "Subset construction done");

    Ok(dfa)
}

fn set_list(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
