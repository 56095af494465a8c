//! Thompson-style synthesis of an ε-NFA from a regular expression

use std::mem;

use super::Regex;
use crate::{
    automaton::{Automaton, Label},
    symbol::Free,
    trace::{Step, Trace},
};

/// Prefix of every synthesized state name
pub const STATE_PREFIX: &str = "s";

struct NfaBuilder<'a, R> {
    nfa: Automaton,
    free: Free,
    trace: &'a mut R,
}

impl<R: Trace<Automaton>> NfaBuilder<'_, R> {
    fn push(&mut self) -> String {
        let state = self.free.fresh();
        self.nfa = mem::take(&mut self.nfa).with_state(state.as_str());
        state
    }

    #[inline]
    fn connect(&mut self, from: &str, to: &str, by: Label) {
        self.nfa = mem::take(&mut self.nfa).with_transition(from, by, to);
    }

    fn build_in(&mut self, re: &Regex, head: &str, tail: &str) {
        match re {
            Regex::Empty => (),
            Regex::Nil => self.connect(head, tail, Label::Epsilon),
            Regex::Symbol(s) | Regex::Reference(s) => {
                self.connect(head, tail, Label::sym(s.as_str()));
            },
            Regex::Alternative(..) => {
                for op in re.alternatives() {
                    let h = self.push();
                    let t = self.push();

                    self.build_in(op, &h, &t);
                    self.connect(head, &h, Label::Epsilon);
                    self.connect(&t, tail, Label::Epsilon);
                }
            },
            Regex::Sequence(..) => self.build_cat_in(&re.sequence(), head, tail),
            Regex::Star(inner) => {
                let h = self.push();
                let t = self.push();

                self.build_in(inner, &h, &t);
                self.connect(head, &h, Label::Epsilon);
                self.connect(&t, tail, Label::Epsilon);
                self.connect(head, tail, Label::Epsilon);
                self.connect(&t, &h, Label::Epsilon);
            },
        }

        tracing::trace!(%re, head, tail, "Wired fragment");
        self.trace
            .step(|| Step::described(self.nfa.clone(), format!("Wired {re}")));
    }

    fn build_cat_in(&mut self, ops: &[&Regex], head: &str, tail: &str) {
        let Some((last, init)) = ops.split_last() else {
            self.connect(head, tail, Label::Epsilon);
            return;
        };

        let mut h = head.to_owned();
        for op in init {
            let t = self.push();
            self.build_in(op, &h, &t);
            h = t;
        }

        self.build_in(last, &h, tail);
    }
}

/// Build an ε-NFA accepting the language of `re`.
///
/// States are `s₀` (start), `s₁` (the only accepting state), then `s₂`, `s₃`,
/// … in the order fragments need them.  References become ordinary symbol
/// edges.  A snapshot is emitted as each sub-expression's fragment is
/// finished, innermost first.
pub fn synthesize<R: Trace<Automaton>>(re: &Regex, t: &mut R) -> Automaton {
    let _span = tracing::debug_span!("synthesize", %re).entered();

    let mut free = Free::new(STATE_PREFIX);
    let start = free.fresh();
    let accept = free.fresh();

    let nfa = re.symbols().into_iter().fold(
        Automaton::new(start.as_str()).with_accepting(accept.as_str()),
        Automaton::with_symbol,
    );

    let mut me = NfaBuilder {
        nfa,
        free,
        trace: t,
    };
    me.build_in(re, &start, &accept);

    tracing::debug!(states = me.nfa.transitions().len(), "Synthesized ε-NFA");
    me.nfa
}
