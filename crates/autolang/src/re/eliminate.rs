//! Regular expression extraction by state elimination

use std::{collections::BTreeMap, fmt};

use super::Regex;
use crate::{
    automaton::{Automaton, Invalid, Label},
    trace::{Step, Trace},
};

/// Base name of the added start state
pub const SUPER_START: &str = "sₛ";
/// Base name of the added accepting state
pub const SUPER_ACCEPT: &str = "sₐ";

/// A generalized automaton whose edges carry regular expressions, with a
/// single start state and a single accepting state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    start: String,
    accept: String,
    edges: BTreeMap<(String, String), Regex>,
}

impl Elimination {
    #[inline]
    #[must_use]
    pub fn start(&self) -> &str { &self.start }

    #[inline]
    #[must_use]
    pub fn accept(&self) -> &str { &self.accept }

    #[inline]
    #[must_use]
    pub fn edges(&self) -> &BTreeMap<(String, String), Regex> { &self.edges }

    fn add(&mut self, from: &str, to: &str, re: Regex) {
        let key = (from.to_owned(), to.to_owned());
        let re = match self.edges.remove(&key) {
            Some(prev) => Regex::alt(prev, re).simplify(),
            None => re,
        };
        self.edges.insert(key, re);
    }

    fn degree(&self, state: &str) -> usize {
        self.edges
            .keys()
            .filter(|(f, t)| f == state || t == state)
            .count()
    }

    /// Remove `state`, routing every path through it along a direct edge
    fn remove(&mut self, state: &str) {
        let looped = self
            .edges
            .remove(&(state.to_owned(), state.to_owned()))
            .map_or(Regex::Nil, Regex::star);

        let (touching, rest): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|((f, t), _)| f == state || t == state);
        self.edges = rest;

        let incoming: Vec<_> = touching.iter().filter(|((_, t), _)| t == state).collect();
        let outgoing: Vec<_> = touching.iter().filter(|((f, _), _)| f == state).collect();

        for ((from, _), lhs) in &incoming {
            for ((_, to), rhs) in &outgoing {
                let path =
                    Regex::cat_all([(*lhs).clone(), looped.clone(), (*rhs).clone()]).simplify();
                self.add(from, to, path);
            }
        }
    }
}

impl fmt::Display for Elimination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start {}, accept {}", self.start, self.accept)?;

        for ((from, to), re) in &self.edges {
            writeln!(f, "{from} → {to}: {re}")?;
        }

        Ok(())
    }
}

fn super_name(base: &str, mark: char, a: &Automaton) -> String {
    let mut name = base.to_owned();
    while a.transitions().contains_key(&name) {
        name.push(mark);
    }
    name
}

/// Convert an automaton to an equivalent regular expression.
///
/// A new start state and a new accepting state are linked to the original
/// ones by ε-edges.  Then every original state is removed, fewest edges
/// first and by name among equals, replacing each path `u → q → v` with a
/// direct edge labelled `in·loop*·out`.  A snapshot follows each removal.
///
/// Returns `None` if no path joins the new start and accepting states, i.e.
/// the automaton accepts nothing.
///
/// # Errors
/// Fails if `a` is invalid.
pub fn extract<R: Trace<Elimination>>(
    a: &Automaton,
    t: &mut R,
) -> Result<Option<Regex>, Invalid> {
    let _span = tracing::debug_span!("extract", states = a.transitions().len()).entered();
    a.validate()?;

    let mut g = Elimination {
        start: super_name(SUPER_START, 'ₛ', a),
        accept: super_name(SUPER_ACCEPT, 'ₐ', a),
        edges: BTreeMap::new(),
    };

    for (from, edges) in a.transitions() {
        for (label, targets) in edges {
            let re = match label {
                Label::Epsilon => Regex::Nil,
                Label::Symbol(s) => Regex::sym(s.as_str()),
            };

            for to in targets {
                g.add(from, to, re.clone());
            }
        }
    }

    let (start, accept) = (g.start.clone(), g.accept.clone());
    g.add(&start, a.starting(), Regex::Nil);
    for state in a.accepting() {
        g.add(state, &accept, Regex::Nil);
    }

    t.step(|| {
        Step::described(
            g.clone(),
            format!("Added the start state {start} and the accepting state {accept}"),
        )
    });

    let mut remaining: Vec<&str> = a.states().collect();
    while !remaining.is_empty() {
        let Some((i, _)) = remaining
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (g.degree(s), **s))
        else {
            break;
        };
        let state = remaining.swap_remove(i);

        g.remove(state);
        tracing::trace!(state, edges = g.edges.len(), "Eliminated state");
        t.step(|| Step::described(g.clone(), format!("Eliminated {state}")));
    }

    let mut edges = g.edges.into_iter();
    Ok(match (edges.next(), edges.next()) {
        (Some(((from, to), re)), None) if from == start && to == accept => Some(re.simplify()),
        _ => None,
    })
}
