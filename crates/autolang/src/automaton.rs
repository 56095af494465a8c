//! Finite automata: the shared DFA/NFA/ε-NFA model and its simulation

use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::{symbol, trace::natural_list, worklist::Worklist};

pub mod equivalence;
pub mod minimize;
pub mod product;
pub mod subset;
pub mod table;

/// Display name of the non-consuming transition label
pub const EPSILON: &str = "ε";
/// Reserved state name for the subset-construction sink and the table
/// format's "no transition" entry
pub const EMPTY_SET: &str = "∅";

/// A transition label: either ε or one alphabet symbol
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Epsilon,
    Symbol(String),
}

impl Label {
    #[inline]
    #[must_use]
    pub fn sym(s: impl Into<String>) -> Self { Self::Symbol(s.into()) }

    #[inline]
    #[must_use]
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Epsilon => None,
            Self::Symbol(s) => Some(s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        if s == EPSILON {
            Self::Epsilon
        } else {
            Self::Symbol(s.to_owned())
        }
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        if s == EPSILON {
            Self::Epsilon
        } else {
            Self::Symbol(s)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Epsilon => f.write_str(EPSILON),
            Self::Symbol(s) => f.write_str(s),
        }
    }
}

pub type Edges = BTreeMap<Label, BTreeSet<String>>;
pub type Transitions = BTreeMap<String, Edges>;

/// One structural problem found by [`Automaton::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", .location.join(" → "))]
pub struct ValidationError {
    pub location: Vec<String>,
    pub message: String,
}

impl ValidationError {
    fn new<L: IntoIterator<Item: Into<String>>>(location: L, message: String) -> Self {
        Self {
            location: location.into_iter().map(Into::into).collect(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid automaton: {}", natural_list(.0))]
pub struct Invalid(pub Vec<ValidationError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// No ε-edges and at most one target per state and symbol
    Dfa,
    /// No ε-edges
    Nfa,
    EpsilonNfa,
}

/// A finite automaton over string-named states and symbols.
///
/// This is a value type: every transformation in this crate returns a new
/// instance and never mutates its input.  Transitions map each state to its
/// labelled target sets; a missing label and an empty target set are the
/// same thing, and empty sets are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Automaton {
    starting: String,
    accepting: BTreeSet<String>,
    alphabet: BTreeSet<String>,
    transitions: Transitions,
}

impl Automaton {
    /// An automaton with a single, non-accepting state
    #[must_use]
    pub fn new(starting: impl Into<String>) -> Self {
        let starting = starting.into();
        Self {
            transitions: [(starting.clone(), Edges::new())].into_iter().collect(),
            starting,
            accepting: BTreeSet::new(),
            alphabet: BTreeSet::new(),
        }
    }

    /// Assemble an automaton from its raw parts without checking it.  Use
    /// [`validate`](Self::validate) before running any algorithm on the
    /// result.
    #[must_use]
    pub fn from_parts(
        starting: impl Into<String>,
        accepting: impl IntoIterator<Item: Into<String>>,
        alphabet: impl IntoIterator<Item: Into<String>>,
        mut transitions: Transitions,
    ) -> Self {
        for edges in transitions.values_mut() {
            edges.retain(|_, t| !t.is_empty());
        }

        Self {
            starting: starting.into(),
            accepting: accepting.into_iter().map(Into::into).collect(),
            alphabet: alphabet.into_iter().map(Into::into).collect(),
            transitions,
        }
    }

    #[must_use]
    pub fn with_starting(mut self, state: impl Into<String>) -> Self {
        self.starting = state.into();
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.transitions.entry(state.into()).or_default();
        self
    }

    #[must_use]
    pub fn with_accepting(mut self, state: impl Into<String>) -> Self {
        let state = state.into();
        self.transitions.entry(state.clone()).or_default();
        self.accepting.insert(state);
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.alphabet.insert(symbol.into());
        self
    }

    /// Add a transition, declaring both states and the label's symbol
    #[must_use]
    pub fn with_transition(
        mut self,
        from: impl Into<String>,
        by: impl Into<Label>,
        to: impl Into<String>,
    ) -> Self {
        let by = by.into();
        let to = to.into();

        if let Label::Symbol(ref s) = by {
            self.alphabet.insert(s.clone());
        }
        self.transitions.entry(to.clone()).or_default();
        self.transitions
            .entry(from.into())
            .or_default()
            .entry(by)
            .or_default()
            .insert(to);
        self
    }

    #[inline]
    #[must_use]
    pub fn starting(&self) -> &str { &self.starting }

    #[inline]
    #[must_use]
    pub fn accepting(&self) -> &BTreeSet<String> { &self.accepting }

    #[inline]
    #[must_use]
    pub fn alphabet(&self) -> &BTreeSet<String> { &self.alphabet }

    #[inline]
    #[must_use]
    pub fn transitions(&self) -> &Transitions { &self.transitions }

    #[inline]
    pub fn states(&self) -> impl Iterator<Item = &str> { self.transitions.keys().map(String::as_str) }

    #[inline]
    #[must_use]
    pub fn is_accepting<Q: Ord + ?Sized>(&self, state: &Q) -> bool
    where String: Borrow<Q> {
        self.accepting.contains(state)
    }

    #[inline]
    pub fn edges<Q: Ord + ?Sized>(&self, state: &Q) -> Option<&Edges>
    where String: Borrow<Q> {
        self.transitions.get(state)
    }

    /// All targets of `state` under `by`, empty if there are none
    pub fn targets<'a>(
        &'a self,
        state: &str,
        by: &Label,
    ) -> impl Iterator<Item = &'a str> + use<'a> {
        self.transitions
            .get(state)
            .and_then(|e| e.get(by))
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        let mut kind = Kind::Dfa;

        for (label, targets) in self.transitions.values().flatten() {
            if *label == Label::Epsilon {
                return Kind::EpsilonNfa;
            }

            if targets.len() > 1 {
                kind = Kind::Nfa;
            }
        }

        kind
    }

    #[inline]
    #[must_use]
    pub fn is_dfa(&self) -> bool { self.kind() == Kind::Dfa }

    #[inline]
    #[must_use]
    pub fn is_nfa(&self) -> bool { self.kind() != Kind::EpsilonNfa }

    /// A DFA with exactly one transition for every state and symbol
    #[must_use]
    pub fn is_complete_dfa(&self) -> bool {
        self.is_dfa()
            && self.transitions.values().all(|edges| {
                self.alphabet
                    .iter()
                    .all(|s| edges.get(&Label::sym(s.as_str())).is_some_and(|t| t.len() == 1))
            })
    }

    /// Check that every referenced state is declared and every transition
    /// symbol belongs to the alphabet
    ///
    /// # Errors
    /// Returns every problem found, never just the first one.
    pub fn validate(&self) -> Result<(), Invalid> {
        let mut errors = vec![];

        if !self.transitions.contains_key(&self.starting) {
            errors.push(ValidationError::new(
                ["start"],
                format!("no state named {:?} exists", self.starting),
            ));
        }

        for state in &self.accepting {
            if !self.transitions.contains_key(state) {
                errors.push(ValidationError::new(
                    ["accepting"],
                    format!("no state named {state:?} exists"),
                ));
            }
        }

        for (from, edges) in &self.transitions {
            for (label, targets) in edges {
                if let Label::Symbol(s) = label
                    && !self.alphabet.contains(s)
                {
                    errors.push(ValidationError::new(
                        ["states", from.as_str()],
                        format!("{s:?} is not part of the alphabet"),
                    ));
                }

                for to in targets {
                    if !self.transitions.contains_key(to) {
                        errors.push(ValidationError::new(
                            ["states".into(), from.clone(), label.to_string()],
                            format!("no state named {to:?} exists"),
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Invalid(errors))
        }
    }

    /// Every state reachable from `from` using only ε-edges, including the
    /// states of `from` themselves
    pub fn epsilon_closure<I: IntoIterator<Item: AsRef<str>>>(&self, from: I) -> BTreeSet<String> {
        Worklist::new(from.into_iter().map(|s| s.as_ref().to_owned()))
            .solve(|s| {
                self.targets(s, &Label::Epsilon)
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .into_iter()
            .collect()
    }

    /// States reachable from `from` by consuming exactly one `symbol`, with
    /// ε-edges followed freely before and after it.
    ///
    /// Both sides are expressed through [`epsilon_closure`](Self::epsilon_closure),
    /// the only place ε-edges are interpreted.
    pub fn step<I: IntoIterator<Item: AsRef<str>>>(&self, from: I, symbol: &str) -> BTreeSet<String> {
        let by = Label::sym(symbol);
        let moved: BTreeSet<_> = self
            .epsilon_closure(from)
            .iter()
            .flat_map(|s| self.targets(s, &by))
            .collect();

        self.epsilon_closure(moved)
    }

    /// States the automaton may be in after consuming `symbols` from `start`
    pub fn run_from<I: IntoIterator<Item: AsRef<str>>>(&self, start: &str, symbols: I) -> BTreeSet<String> {
        let mut current = self.epsilon_closure([start]);

        for sym in symbols {
            if current.is_empty() {
                break;
            }

            current = self.step(&current, sym.as_ref());
        }

        current
    }

    #[inline]
    pub fn run<I: IntoIterator<Item: AsRef<str>>>(&self, symbols: I) -> BTreeSet<String> {
        self.run_from(&self.starting, symbols)
    }

    /// Split `input` into alphabet symbols, longest match first.  Characters
    /// not covered by the alphabet become single-character symbols of their
    /// own, which no transition accepts.
    #[must_use]
    pub fn split_input<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let mut out = vec![];
        let mut rest = input;

        while let Some(c) = rest.chars().next() {
            let len = self
                .alphabet
                .iter()
                .filter(|s| !s.is_empty() && rest.starts_with(s.as_str()))
                .map(String::len)
                .max()
                .unwrap_or(c.len_utf8());

            let (sym, tail) = rest.split_at(len);
            out.push(sym);
            rest = tail;
        }

        out
    }

    /// Whether the automaton accepts the given symbol sequence
    pub fn test_symbols<I: IntoIterator<Item: AsRef<str>>>(&self, symbols: I) -> bool {
        self.run(symbols).iter().any(|s| self.accepting.contains(s))
    }

    /// Whether the automaton accepts `input`, split with
    /// [`split_input`](Self::split_input)
    #[must_use]
    pub fn test(&self, input: &str) -> bool { self.test_symbols(self.split_input(input)) }

    /// True iff no accepting state is reachable from the start over any edge,
    /// ε included
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let mut stack = vec![self.starting.as_str()];
        let mut visited = hashbrown::HashSet::new();

        while let Some(state) = stack.pop() {
            if !visited.insert(state) {
                continue;
            }

            if self.accepting.contains(state) {
                return false;
            }

            stack.extend(
                self.transitions
                    .get(state)
                    .into_iter()
                    .flat_map(BTreeMap::values)
                    .flatten()
                    .map(String::as_str)
                    .filter(|s| !visited.contains(s)),
            );
        }

        true
    }

    /// Rename every state through `f`.  `f` must be injective on the states
    /// of this automaton.
    #[must_use]
    pub fn rename_states(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            starting: f(&self.starting),
            accepting: self.accepting.iter().map(|s| f(s)).collect(),
            alphabet: self.alphabet.clone(),
            transitions: self
                .transitions
                .iter()
                .map(|(s, edges)| {
                    (
                        f(s),
                        edges
                            .iter()
                            .map(|(l, t)| (l.clone(), t.iter().map(|s| f(s)).collect()))
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    /// A copy in which every missing symbol transition leads to a new,
    /// non-accepting sink, paired with the sink's name if one was added
    #[must_use]
    pub fn completed(&self) -> (Self, Option<String>) {
        let missing = |edges: &Edges| {
            self.alphabet
                .iter()
                .any(|s| !edges.contains_key(&Label::sym(s.as_str())))
        };

        if !self.transitions.values().any(missing) {
            return (self.clone(), None);
        }

        let sink = symbol::fresh_or_self(EMPTY_SET, |s| !self.transitions.contains_key(s));
        let mut out = self.clone();
        out.transitions.insert(sink.clone(), Edges::new());

        for edges in out.transitions.values_mut() {
            for s in &self.alphabet {
                edges
                    .entry(Label::sym(s.as_str()))
                    .or_insert_with(|| BTreeSet::from([sink.clone()]));
            }
        }

        (out, Some(sink))
    }
}

#[cfg(any(test, feature = "proptest"))]
pub use prop::*;

#[cfg(any(test, feature = "proptest"))]
mod prop {
    use proptest::prelude::*;

    use super::Automaton;

    /// Complete DFAs over the alphabet `{0, 1}` with up to `max_states` states
    pub fn dfa(max_states: usize) -> impl Strategy<Value = Automaton> {
        (1..=max_states)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    prop::collection::vec((0..n, 0..n), n),
                    prop::collection::vec(any::<bool>(), n),
                )
            })
            .prop_map(|(_, edges, accept)| {
                let name = |i: usize| format!("q{i}");
                let mut a = Automaton::new(name(0)).with_symbol("0").with_symbol("1");

                for (i, ((zero, one), acc)) in edges.into_iter().zip(accept).enumerate() {
                    a = a
                        .with_transition(name(i), "0", name(zero))
                        .with_transition(name(i), "1", name(one));
                    if acc {
                        a = a.with_accepting(name(i));
                    }
                }

                a
            })
    }

    /// Arbitrary ε-NFAs over `{0, 1}` with up to `max_states` states
    pub fn enfa(max_states: usize) -> impl Strategy<Value = Automaton> {
        (1..=max_states)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    prop::collection::vec((0..n, 0..3_u8, 0..n), 0..=(3 * n)),
                    prop::collection::vec(any::<bool>(), n),
                )
            })
            .prop_map(|(n, edges, accept)| {
                let name = |i: usize| format!("p{i}");
                let mut a = (0..n).fold(
                    Automaton::new(name(0)).with_symbol("0").with_symbol("1"),
                    |a, i| a.with_state(name(i)),
                );

                for (from, by, to) in edges {
                    let by = match by {
                        0 => super::EPSILON,
                        1 => "0",
                        _ => "1",
                    };
                    a = a.with_transition(name(from), by, name(to));
                }

                for (i, acc) in accept.into_iter().enumerate() {
                    if acc {
                        a = a.with_accepting(name(i));
                    }
                }

                a
            })
    }

    /// Strings over `{0, 1}` up to `max_len` symbols long
    pub fn binary_string(max_len: usize) -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof![Just('0'), Just('1')], 0..=max_len)
            .prop_map(|v| v.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    pub(crate) fn ends_in_one() -> Automaton {
        Automaton::new("s0")
            .with_accepting("s1")
            .with_transition("s0", "0", "s0")
            .with_transition("s0", "1", "s1")
            .with_transition("s1", "0", "s1")
            .with_transition("s1", "1", "s1")
    }

    #[test]
    fn simulate_dfa() {
        let a = ends_in_one();
        assert!(a.validate().is_ok());
        assert!(a.is_complete_dfa());
        assert!(a.test("01"));
        assert!(!a.test("00"));
        assert!(!a.test(""));
        assert!(!a.is_empty());
    }

    #[test]
    fn validation_reports_everything() {
        let a = Automaton::from_parts(
            "x",
            ["y"],
            ["a"],
            Transitions::from([(
                "q".to_owned(),
                Edges::from([(Label::sym("b"), BTreeSet::from(["r".to_owned()]))]),
            )]),
        );

        let Err(Invalid(errs)) = a.validate() else {
            panic!("validation should fail");
        };

        assert_eq!(errs.len(), 4);
        assert_eq!(errs[0].location, ["start"]);
        assert_eq!(errs[1].location, ["accepting"]);
        assert_eq!(errs[2].message, "\"b\" is not part of the alphabet");
        assert_eq!(errs[3].location, ["states", "q", "b"]);
        assert_eq!(errs[3].to_string(), "states → q → b: no state named \"r\" exists");
    }

    #[test]
    fn epsilon_closure_handles_cycles() {
        let a = Automaton::new("a")
            .with_transition("a", EPSILON, "b")
            .with_transition("b", EPSILON, "a")
            .with_transition("b", EPSILON, "c")
            .with_transition("c", "x", "d");

        let c = a.epsilon_closure(["a"]);
        assert_eq!(c, BTreeSet::from(["a", "b", "c"].map(String::from)));
        assert_eq!(a.kind(), Kind::EpsilonNfa);
        assert_eq!(a.step(["a"], "x"), BTreeSet::from(["d".to_owned()]));
        assert!(a.step(["d"], "x").is_empty());
    }

    #[test]
    fn epsilon_after_last_symbol() {
        let a = Automaton::new("a")
            .with_transition("a", "x", "b")
            .with_transition("b", EPSILON, "c")
            .with_accepting("c");

        assert!(a.test("x"));
        assert!(!a.test(""));
        assert!(!a.test("xx"));
    }

    #[test]
    fn kinds() {
        assert_eq!(ends_in_one().kind(), Kind::Dfa);
        let n = ends_in_one().with_transition("s0", "0", "s1");
        assert_eq!(n.kind(), Kind::Nfa);
        assert!(n.is_nfa());
        assert!(!n.is_complete_dfa());
        assert!(!Automaton::new("a").with_transition("a", "x", "a").with_symbol("y").is_complete_dfa());
    }

    #[test]
    fn multi_character_symbols() {
        let a = Automaton::new("a")
            .with_transition("a", "ab", "b")
            .with_transition("b", "a", "c")
            .with_accepting("c");

        assert_eq!(a.split_input("aba"), ["ab", "a"]);
        assert!(a.test("aba"));
        assert!(!a.test("ba"));
    }

    #[test]
    fn completion() {
        let (same, none) = ends_in_one().completed();
        assert_eq!(same, ends_in_one());
        assert_eq!(none, None);

        let partial = Automaton::new("a").with_transition("a", "x", "b").with_accepting("b");
        let (full, sink) = partial.completed();
        assert_eq!(sink.as_deref(), Some(EMPTY_SET));
        assert!(full.is_complete_dfa());
        assert!(!full.is_accepting(EMPTY_SET));
        assert_eq!(full.targets("b", &Label::sym("x")).collect::<Vec<_>>(), [EMPTY_SET]);
        assert!(full.test("x"));
        assert!(!full.test("xx"));
    }

    #[test]
    fn emptiness() {
        let looped = Automaton::new("s0")
            .with_accepting("s5")
            .with_transition("s0", "0", "s1")
            .with_transition("s1", "0", "s2")
            .with_transition("s2", "0", "s3")
            .with_transition("s2", "0", "s4")
            .with_transition("s3", "0", "s4")
            .with_transition("s4", "0", "s0")
            .with_transition("s5", "0", "s5");
        assert!(looped.is_empty());

        let escaping = looped.with_transition("s4", "0", "s5");
        assert!(!escaping.is_empty());
    }
}
