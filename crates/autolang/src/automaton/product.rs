//! Product (intersection) and sum (union) of two complete DFAs

use std::fmt;

use super::{Automaton, Invalid, Label};
use crate::{
    trace::{Step, Trace},
    worklist::Worklist,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Invalid {0} automaton")]
    Invalid(Side, #[source] Invalid),
    #[error("The {0} automaton is not a complete DFA")]
    NotCompleteDfa(Side),
    #[error("The automata have different alphabets")]
    AlphabetMismatch,
}

/// How the acceptance of a combined state follows from its components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combine {
    Intersection,
    Union,
}

impl Combine {
    #[inline]
    #[must_use]
    pub fn accepts(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Self::Intersection => lhs && rhs,
            Self::Union => lhs || rhs,
        }
    }
}

/// Name of the combined state for `p` in the left and `q` in the right
/// automaton
#[must_use]
pub fn pair_name(p: &str, q: &str) -> String { format!("({p},{q})") }

fn check(a: &Automaton, b: &Automaton) -> Result<(), ProductError> {
    for (side, x) in [(Side::Left, a), (Side::Right, b)] {
        x.validate().map_err(|e| ProductError::Invalid(side, e))?;

        if !x.is_complete_dfa() {
            return Err(ProductError::NotCompleteDfa(side));
        }
    }

    if a.alphabet() != b.alphabet() {
        return Err(ProductError::AlphabetMismatch);
    }

    Ok(())
}

/// Run two complete DFAs over the same alphabet in lockstep.
///
/// Only pairs reachable from the pair of start states are built.  A snapshot
/// is emitted each time a pair has all of its transitions added.
///
/// # Errors
/// Fails if either input is invalid or not a complete DFA, or if the two
/// alphabets differ.
pub fn combine<R: Trace<Automaton>>(
    a: &Automaton,
    b: &Automaton,
    how: Combine,
    t: &mut R,
) -> Result<Automaton, ProductError> {
    let _span = tracing::debug_span!("combine", ?how).entered();
    check(a, b)?;

    let mut out = a.alphabet().iter().fold(
        Automaton::new(pair_name(a.starting(), b.starting())),
        |o, s| o.with_symbol(s.as_str()),
    );
    let mut work = Worklist::new([(a.starting().to_owned(), b.starting().to_owned())]);

    while let Some((p, q)) = work.pop() {
        let from = pair_name(&p, &q);
        let accepting = how.accepts(a.is_accepting(&p), b.is_accepting(&q));
        if accepting {
            out = out.with_accepting(from.as_str());
        }

        for sym in a.alphabet() {
            let by = Label::sym(sym.as_str());
            let (Some(p2), Some(q2)) = (a.targets(&p, &by).next(), b.targets(&q, &by).next())
            else {
                continue;
            };

            out = out.with_transition(from.as_str(), by, pair_name(p2, q2));
            work.push((p2.to_owned(), q2.to_owned()));
        }

        tracing::trace!(state = %from, accepting, "Added pair");
        t.step(|| {
            Step::described(
                out.clone(),
                format!(
                    "{from} pairs {p} and {q}, {}",
                    if accepting {
                        "and accepts"
                    } else {
                        "and does not accept"
                    }
                ),
            )
        });
    }

    tracing::debug!(states = out.transitions().len(), "Combined automata");

    Ok(out)
}

/// An automaton accepting exactly the strings both inputs accept
///
/// # Errors
/// See [`combine`].
#[inline]
pub fn product<R: Trace<Automaton>>(
    a: &Automaton,
    b: &Automaton,
    t: &mut R,
) -> Result<Automaton, ProductError> {
    combine(a, b, Combine::Intersection, t)
}

/// An automaton accepting exactly the strings either input accepts
///
/// # Errors
/// See [`combine`].
#[inline]
pub fn sum<R: Trace<Automaton>>(
    a: &Automaton,
    b: &Automaton,
    t: &mut R,
) -> Result<Automaton, ProductError> {
    combine(a, b, Combine::Union, t)
}
