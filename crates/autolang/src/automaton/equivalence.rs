//! Moore-style state equivalence: which states no input string can tell apart

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use super::{Automaton, Invalid, Label, product::Side};
use crate::trace::{Step, Trace};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquivalenceError {
    #[error("Invalid {0} automaton")]
    Invalid(Side, #[source] Invalid),
    #[error("The {0} automaton is not deterministic")]
    NotDfa(Side),
}

pub(super) fn require_dfa(a: &Automaton, side: Side) -> Result<(), EquivalenceError> {
    a.validate().map_err(|e| EquivalenceError::Invalid(side, e))?;

    if a.is_dfa() {
        Ok(())
    } else {
        Err(EquivalenceError::NotDfa(side))
    }
}

/// Pairwise state equivalence.  Rows are states of the first automaton,
/// columns states of the second (the same automaton for a
/// [`state_equivalence_table`]).  `true` means no distinguishing string has
/// been found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquivalenceTable {
    rows: BTreeMap<String, BTreeMap<String, bool>>,
}

impl EquivalenceTable {
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &BTreeMap<String, BTreeMap<String, bool>> { &self.rows }

    #[inline]
    #[must_use]
    pub fn get(&self, p: &str, q: &str) -> Option<bool> {
        self.rows.get(p).and_then(|r| r.get(q)).copied()
    }

    fn set(&mut self, p: &str, q: &str, value: bool) {
        if let Some(cell) = self.rows.get_mut(p).and_then(|r| r.get_mut(q)) {
            *cell = value;
        }
    }

    fn without(&self, row: Option<&str>, col: Option<&str>) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .filter(|(p, _)| Some(p.as_str()) != row)
                .map(|(p, r)| {
                    (
                        p.clone(),
                        r.iter()
                            .filter(|(q, _)| Some(q.as_str()) != col)
                            .map(|(q, &v)| (q.clone(), v))
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// Group the row states into equivalence classes, in row order.  Only
    /// meaningful for a table built over a single automaton.
    #[must_use]
    pub fn classes(&self) -> Vec<BTreeSet<String>> {
        let mut assigned = BTreeSet::new();
        let mut classes = vec![];

        for (state, row) in &self.rows {
            if assigned.contains(state) {
                continue;
            }

            let class: BTreeSet<_> = row
                .iter()
                .filter(|&(_, &eq)| eq)
                .map(|(q, _)| q.clone())
                .collect();
            assigned.extend(class.iter().cloned());
            classes.push(class);
        }

        classes
    }
}

impl fmt::Display for EquivalenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: BTreeSet<&str> = self
            .rows
            .values()
            .flat_map(BTreeMap::keys)
            .map(String::as_str)
            .collect();
        let w = self
            .rows
            .keys()
            .map(String::as_str)
            .chain(cols.iter().copied())
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0);

        write!(f, "{:w$}", "")?;
        for c in &cols {
            write!(f, "  {c:w$}")?;
        }

        for (p, row) in &self.rows {
            write!(f, "\n{p:w$}")?;
            for c in &cols {
                let cell = match row.get(*c) {
                    Some(true) => "=",
                    Some(false) => "×",
                    None => "",
                };
                write!(f, "  {cell:w$}")?;
            }
        }

        Ok(())
    }
}

/// Refine `table` to the greatest fixed point: a pair stays equivalent only
/// while, for every symbol, its targets are equivalent too
fn refine<R: Trace<EquivalenceTable>>(
    a: &Automaton,
    b: &Automaton,
    mut table: EquivalenceTable,
    symmetric: bool,
    hidden: (Option<&str>, Option<&str>),
    t: &mut R,
) -> EquivalenceTable {
    let alphabet = a.alphabet();

    t.step(|| {
        Step::described(
            table.without(hidden.0, hidden.1),
            "Accepting and non-accepting states are distinguishable",
        )
    });

    for round in 1.. {
        let pairs: Vec<(String, String)> = table
            .rows
            .iter()
            .flat_map(|(p, row)| {
                row.iter()
                    .filter(|&(_, &eq)| eq)
                    .map(move |(q, _)| (p.clone(), q.clone()))
            })
            .collect();
        let mut changed = 0_usize;

        for (p, q) in pairs {
            if table.get(&p, &q) != Some(true) {
                continue;
            }

            let Some((sym, p2, q2)) = alphabet.iter().find_map(|sym| {
                let by = Label::sym(sym.as_str());
                let p2 = a.targets(&p, &by).next()?;
                let q2 = b.targets(&q, &by).next()?;
                (table.get(p2, q2) == Some(false)).then_some((sym, p2, q2))
            }) else {
                continue;
            };

            table.set(&p, &q, false);
            if symmetric {
                table.set(&q, &p, false);
            }
            changed += 1;

            if hidden.0 != Some(p.as_str()) && hidden.1 != Some(q.as_str()) {
                t.step(|| {
                    Step::described(
                        table.without(hidden.0, hidden.1),
                        format!(
                            "{p} and {q} are distinguishable: on {sym} they go to {p2} and {q2}, \
                             which are distinguishable"
                        ),
                    )
                });
            }
        }

        tracing::trace!(round, changed, "Refinement round");
        if changed == 0 {
            break;
        }
    }

    table.without(hidden.0, hidden.1)
}

/// Equivalence of every pair of states of one DFA.  Missing transitions are
/// treated as leading to a dead state.
///
/// Emits the initial accepting/non-accepting split, then one snapshot per
/// pair proven distinguishable, naming the symbol and targets that prove it.
///
/// # Errors
/// Fails if `a` is invalid or not deterministic.
pub fn state_equivalence_table<R: Trace<EquivalenceTable>>(
    a: &Automaton,
    t: &mut R,
) -> Result<EquivalenceTable, EquivalenceError> {
    let _span = tracing::debug_span!("state_equivalence_table").entered();
    require_dfa(a, Side::Left)?;

    let (a, sink) = a.completed();
    let rows = a
        .states()
        .map(|p| {
            let row: BTreeMap<_, _> = a
                .states()
                .map(|q| {
                    let eq = p == q || a.is_accepting(p) == a.is_accepting(q);
                    (q.to_owned(), eq)
                })
                .collect();
            (p.to_owned(), row)
        })
        .collect();

    let sink = sink.as_deref();
    Ok(refine(
        &a,
        &a,
        EquivalenceTable { rows },
        true,
        (sink, sink),
        t,
    ))
}

/// Equivalence of every state of `a` against every state of `b`, over the
/// union of both alphabets
///
/// # Errors
/// Fails if either input is invalid or not deterministic.
pub fn cross_equivalence_table<R: Trace<EquivalenceTable>>(
    a: &Automaton,
    b: &Automaton,
    t: &mut R,
) -> Result<EquivalenceTable, EquivalenceError> {
    let _span = tracing::debug_span!("cross_equivalence_table").entered();
    require_dfa(a, Side::Left)?;
    require_dfa(b, Side::Right)?;

    let widen = |x: &Automaton, other: &Automaton| {
        other
            .alphabet()
            .iter()
            .fold(x.clone(), |x, s| x.with_symbol(s.as_str()))
            .completed()
    };
    let (a, sink_a) = widen(a, b);
    let (b, sink_b) = widen(b, &a);

    let rows = a
        .states()
        .map(|p| {
            let row: BTreeMap<_, _> = b
                .states()
                .map(|q| (q.to_owned(), a.is_accepting(p) == b.is_accepting(q)))
                .collect();
            (p.to_owned(), row)
        })
        .collect();

    Ok(refine(
        &a,
        &b,
        EquivalenceTable { rows },
        false,
        (sink_a.as_deref(), sink_b.as_deref()),
        t,
    ))
}

/// The states of `a` partitioned into classes of mutually equivalent
/// states, the class of the start state first
///
/// # Errors
/// Fails if `a` is invalid or not deterministic.
pub fn equivalence_classes(a: &Automaton) -> Result<Vec<BTreeSet<String>>, EquivalenceError> {
    let mut classes = state_equivalence_table(a, &mut ())?.classes();
    if let Some(i) = classes.iter().position(|c| c.contains(a.starting())) {
        classes[..=i].rotate_right(1);
    }

    Ok(classes)
}

/// Whether two DFAs accept the same language
///
/// # Errors
/// Fails if either input is invalid or not deterministic.
pub fn equivalent(a: &Automaton, b: &Automaton) -> Result<bool, EquivalenceError> {
    let table = cross_equivalence_table(a, b, &mut ())?;
    Ok(table.get(a.starting(), b.starting()).unwrap_or(false))
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::automaton::{binary_string, dfa, minimize::minimise, test::ends_in_one};

    /// Ends in one, with the accepting state split in two
    fn redundant() -> Automaton {
        Automaton::new("a")
            .with_accepting("b")
            .with_accepting("c")
            .with_transition("a", "0", "a")
            .with_transition("a", "1", "b")
            .with_transition("b", "0", "c")
            .with_transition("b", "1", "c")
            .with_transition("c", "0", "b")
            .with_transition("c", "1", "b")
    }

    #[test]
    fn finds_redundant_states() {
        let mut steps = vec![];
        let table = state_equivalence_table(&redundant(), &mut steps).unwrap();

        assert_eq!(table.get("b", "c"), Some(true));
        assert_eq!(table.get("c", "b"), Some(true));
        assert_eq!(table.get("a", "b"), Some(false));
        assert_eq!(table.get("a", "a"), Some(true));
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].snapshot, table);

        assert_eq!(
            equivalence_classes(&redundant()).unwrap(),
            [
                BTreeSet::from(["a".to_owned()]),
                BTreeSet::from(["b".to_owned(), "c".to_owned()]),
            ]
        );
    }

    #[test]
    fn describes_refinement() {
        let a = Automaton::new("x")
            .with_accepting("z")
            .with_transition("x", "a", "y")
            .with_transition("y", "a", "z")
            .with_transition("z", "a", "z");

        let mut steps = vec![];
        let table = state_equivalence_table(&a, &mut steps).unwrap();
        assert_eq!(table.get("x", "y"), Some(false));
        assert_eq!(
            steps[1].description.as_deref(),
            Some("x and y are distinguishable: on a they go to y and z, which are distinguishable")
        );
        assert!(table.to_string().contains('×'));
    }

    #[test]
    fn partial_dfas_get_a_dead_state() {
        let partial = Automaton::new("a")
            .with_transition("a", "x", "b")
            .with_transition("b", "x", "c")
            .with_accepting("b")
            .with_state("c");

        let table = state_equivalence_table(&partial, &mut ()).unwrap();
        assert!(!table.rows().contains_key(crate::automaton::EMPTY_SET));
        assert_eq!(table.get("a", "c"), Some(false));
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn cross_automaton() {
        assert!(equivalent(&ends_in_one(), &redundant()).unwrap());
        assert!(!equivalent(&ends_in_one(), &ends_in_one().with_accepting("s0")).unwrap());

        let nfa = ends_in_one().with_transition("s0", "1", "s0");
        assert_eq!(
            equivalent(&ends_in_one(), &nfa),
            Err(EquivalenceError::NotDfa(Side::Right))
        );

        let wider = ends_in_one().with_transition("s1", "2", "s1");
        assert!(!equivalent(&ends_in_one(), &wider).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

        #[test]
        fn equivalent_states_agree_on_inputs(a in dfa(5), inputs in prop::collection::vec(binary_string(6), 12)) {
            let table = state_equivalence_table(&a, &mut ()).unwrap();

            for (p, row) in table.rows() {
                for (q, &eq) in row {
                    if eq {
                        for s in &inputs {
                            let syms = a.split_input(s);
                            prop_assert_eq!(
                                a.run_from(p, &syms).iter().any(|r| a.is_accepting(r)),
                                a.run_from(q, &syms).iter().any(|r| a.is_accepting(r))
                            );
                        }
                    }
                }
            }
        }

        #[test]
        fn minimised_is_equivalent(a in dfa(5)) {
            let m = minimise(&a, &mut ()).unwrap();
            prop_assert!(equivalent(&a, &m).unwrap());
        }
    }
}
