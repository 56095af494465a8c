//! Context-free grammars

use std::{collections::BTreeSet, fmt};

use indexmap::{IndexMap, IndexSet};

pub mod cyk;
pub mod normal;
pub mod parse;
pub mod syntax;

/// Display form of the empty token
pub const EMPTY_STRING: &str = "ε";

/// One symbol on the right-hand side of a production
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    NonTerminal(String),
    Terminal(String),
    /// The empty string, written `ε`
    Empty,
}

impl Token {
    #[inline]
    #[must_use]
    pub fn nt(name: impl Into<String>) -> Self { Self::NonTerminal(name.into()) }

    #[inline]
    #[must_use]
    pub fn t(name: impl Into<String>) -> Self { Self::Terminal(name.into()) }

    #[inline]
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::NonTerminal(s) | Self::Terminal(s) => s,
            Self::Empty => EMPTY_STRING,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_non_terminal(&self) -> Option<&str> {
        match self {
            Self::NonTerminal(s) => Some(s),
            Self::Terminal(_) | Self::Empty => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.identifier()) }
}

/// One alternative of a production
pub type Alternative = Vec<Token>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    #[error("Production given for undeclared non-terminal {0:?}")]
    UnknownHead(String),
    #[error("Production of {0} uses undeclared non-terminal {1:?}")]
    UnknownNonTerminal(String, String),
    #[error("Production of {0} uses undeclared terminal {1:?}")]
    UnknownTerminal(String, String),
    #[error("Start symbol {0:?} is not a non-terminal")]
    UnknownStart(String),
}

/// A context-free grammar.
///
/// Like [`Automaton`](crate::Automaton) this is a value type: every mutator
/// returns a new grammar and leaves the original untouched.  Every grammar
/// that exists has passed validation, so each production belongs to a
/// declared non-terminal and only uses declared symbols.  Declaration order
/// is kept and used for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grammar {
    non_terminals: IndexSet<String>,
    terminals: IndexSet<String>,
    productions: IndexMap<String, Vec<Alternative>>,
    start: Option<String>,
}

impl Grammar {
    /// Assemble and validate a grammar
    ///
    /// # Errors
    /// Fails if a production or the start symbol mentions anything
    /// undeclared.
    pub fn new(
        non_terminals: impl IntoIterator<Item: Into<String>>,
        terminals: impl IntoIterator<Item: Into<String>>,
        productions: impl IntoIterator<Item = (String, Vec<Alternative>)>,
        start: Option<String>,
    ) -> Result<Self, GrammarError> {
        let me = Self {
            non_terminals: non_terminals.into_iter().map(Into::into).collect(),
            terminals: terminals.into_iter().map(Into::into).collect(),
            productions: productions.into_iter().collect(),
            start,
        };

        me.validate()?;
        Ok(me)
    }

    fn validate(&self) -> Result<(), GrammarError> {
        for (head, alts) in &self.productions {
            if !self.non_terminals.contains(head) {
                return Err(GrammarError::UnknownHead(head.clone()));
            }

            for tok in alts.iter().flatten() {
                match tok {
                    Token::NonTerminal(n) if !self.non_terminals.contains(n) => {
                        return Err(GrammarError::UnknownNonTerminal(head.clone(), n.clone()));
                    },
                    Token::Terminal(t) if !self.terminals.contains(t) => {
                        return Err(GrammarError::UnknownTerminal(head.clone(), t.clone()));
                    },
                    Token::NonTerminal(_) | Token::Terminal(_) | Token::Empty => (),
                }
            }
        }

        match self.start {
            Some(ref s) if !self.non_terminals.contains(s) => {
                Err(GrammarError::UnknownStart(s.clone()))
            },
            _ => Ok(()),
        }
    }

    fn rebuilt(&self, f: impl FnOnce(&mut Self)) -> Result<Self, GrammarError> {
        let mut next = self.clone();
        f(&mut next);
        next.validate()?;
        Ok(next)
    }

    #[inline]
    #[must_use]
    pub fn non_terminals(&self) -> &IndexSet<String> { &self.non_terminals }

    #[inline]
    #[must_use]
    pub fn terminals(&self) -> &IndexSet<String> { &self.terminals }

    #[inline]
    #[must_use]
    pub fn productions(&self) -> &IndexMap<String, Vec<Alternative>> { &self.productions }

    #[inline]
    #[must_use]
    pub fn start(&self) -> Option<&str> { self.start.as_deref() }

    /// The alternatives of `non_terminal`, empty if it has no production
    #[must_use]
    pub fn alternatives(&self, non_terminal: &str) -> &[Alternative] {
        self.productions
            .get(non_terminal)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn add_non_terminal(&self, non_terminal: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.non_terminals.insert(non_terminal.into());
        next
    }

    /// Drop a non-terminal along with its production
    ///
    /// # Errors
    /// Fails if another production or the start symbol still uses it.
    pub fn remove_non_terminal(&self, non_terminal: &str) -> Result<Self, GrammarError> {
        self.rebuilt(|g| {
            g.non_terminals.shift_remove(non_terminal);
            g.productions.shift_remove(non_terminal);
        })
    }

    #[must_use]
    pub fn add_terminal(&self, terminal: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.terminals.insert(terminal.into());
        next
    }

    /// # Errors
    /// Fails if a production still uses the terminal.
    pub fn remove_terminal(&self, terminal: &str) -> Result<Self, GrammarError> {
        self.rebuilt(|g| {
            g.terminals.shift_remove(terminal);
        })
    }

    /// Append an alternative to the production of `non_terminal`
    ///
    /// # Errors
    /// Fails if the non-terminal or any token of the alternative is
    /// undeclared.
    pub fn add_production(
        &self,
        non_terminal: impl Into<String>,
        alternative: Alternative,
    ) -> Result<Self, GrammarError> {
        self.rebuilt(|g| {
            g.productions
                .entry(non_terminal.into())
                .or_default()
                .push(alternative);
        })
    }

    #[must_use]
    pub fn clear_production(&self, non_terminal: &str) -> Self {
        let mut next = self.clone();
        next.productions.shift_remove(non_terminal);
        next
    }

    /// # Errors
    /// Fails if `start` is not a declared non-terminal.
    pub fn set_start(&self, start: Option<String>) -> Result<Self, GrammarError> {
        self.rebuilt(|g| g.start = start)
    }

    /// Least fixed point: a non-terminal joins once `admit` accepts its
    /// alternatives given the set found so far
    fn fixed_point(
        &self,
        mut admit: impl FnMut(&[Alternative], &BTreeSet<String>) -> bool,
    ) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        loop {
            let before = found.len();

            for nt in &self.non_terminals {
                if !found.contains(nt) && admit(self.alternatives(nt), &found) {
                    found.insert(nt.clone());
                }
            }

            if found.len() == before {
                break found;
            }
        }
    }

    /// Every terminal, plus every non-terminal deriving at least one string
    /// of terminals
    #[must_use]
    pub fn generating_symbols(&self) -> BTreeSet<Token> {
        let generating = self.fixed_point(|alts, found| {
            alts.iter().any(|alt| {
                alt.iter().all(|t| match t {
                    Token::NonTerminal(n) => found.contains(n),
                    Token::Terminal(_) | Token::Empty => true,
                })
            })
        });

        self.terminals
            .iter()
            .cloned()
            .map(Token::Terminal)
            .chain(generating.into_iter().map(Token::NonTerminal))
            .collect()
    }

    /// Non-terminals that can derive the empty string
    #[must_use]
    pub fn nullable_non_terminals(&self) -> BTreeSet<String> {
        self.fixed_point(|alts, found| alts.iter().any(|alt| derives_empty(alt, found)))
    }

    /// Non-terminals that derive the empty string and nothing else.
    ///
    /// This is the largest subset of the nullable non-terminals in which
    /// every alternative consists of ε and members of the subset, so
    /// `N → ε | NN` counts as null.
    #[must_use]
    pub fn null_non_terminals(&self) -> BTreeSet<String> {
        let mut null = self.nullable_non_terminals();

        loop {
            let next: BTreeSet<_> = null
                .iter()
                .filter(|n| {
                    self.alternatives(n)
                        .iter()
                        .all(|alt| derives_empty(alt, &null))
                })
                .cloned()
                .collect();

            if next.len() == null.len() {
                break null;
            }
            null = next;
        }
    }
}

/// Whether every token of `alt` is ε or a member of `nullable`
fn derives_empty(alt: &[Token], nullable: &BTreeSet<String>) -> bool {
    alt.iter().all(|t| match t {
        Token::NonTerminal(n) => nullable.contains(n),
        Token::Terminal(_) => false,
        Token::Empty => true,
    })
}

#[cfg(any(test, feature = "proptest"))]
pub use prop::*;

#[cfg(any(test, feature = "proptest"))]
mod prop {
    use proptest::prelude::*;

    use super::{Alternative, Grammar, Token};

    const NON_TERMINALS: [&str; 3] = ["S", "A", "B"];

    /// Grammars over `S`, `A`, `B` and the terminals `a`, `b`, with up to
    /// `max_alts` alternatives of up to `max_len` tokens per non-terminal
    pub fn grammar(max_alts: usize, max_len: usize) -> impl Strategy<Value = Grammar> {
        let token = prop_oneof![
            3 => prop::sample::select(NON_TERMINALS.to_vec()).prop_map(Token::nt),
            3 => prop_oneof![Just("a"), Just("b")].prop_map(Token::t),
            1 => Just(Token::Empty),
        ];
        let alt = prop::collection::vec(token, 1..=max_len);

        prop::collection::vec(prop::collection::vec(alt, 0..=max_alts), 3).prop_map(
            |prods: Vec<Vec<Alternative>>| Grammar {
                non_terminals: NON_TERMINALS.iter().map(|&n| n.to_owned()).collect(),
                terminals: ["a", "b"].into_iter().map(str::to_owned).collect(),
                productions: NON_TERMINALS
                    .iter()
                    .zip(prods)
                    .filter(|(_, alts)| !alts.is_empty())
                    .map(|(&n, alts)| (n.to_owned(), alts))
                    .collect(),
                start: Some("S".to_owned()),
            },
        )
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Exact membership test straight from the productions, ε and unit
    /// alternatives included
    pub(crate) fn recognizes(g: &Grammar, input: &str) -> bool {
        let s: Vec<String> = input.chars().map(String::from).collect();
        let n = s.len();
        let nullable = g.nullable_non_terminals();
        let mut spans = vec![vec![BTreeSet::<String>::new(); n + 1]; n + 1];

        fn tok(
            t: &Token,
            i: usize,
            k: usize,
            s: &[String],
            spans: &[Vec<BTreeSet<String>>],
            nullable: &BTreeSet<String>,
        ) -> bool {
            match t {
                Token::Terminal(x) => k == i + 1 && s[i] == *x,
                Token::Empty => i == k,
                Token::NonTerminal(x) if i == k => nullable.contains(x),
                Token::NonTerminal(x) => spans[i][k].contains(x),
            }
        }

        fn seq(
            alt: &[Token],
            i: usize,
            j: usize,
            s: &[String],
            spans: &[Vec<BTreeSet<String>>],
            nullable: &BTreeSet<String>,
        ) -> bool {
            match alt.split_first() {
                None => i == j,
                Some((t, rest)) => (i..=j).any(|k| {
                    tok(t, i, k, s, spans, nullable) && seq(rest, k, j, s, spans, nullable)
                }),
            }
        }

        for len in 1..=n {
            for i in 0..=n - len {
                let j = i + len;
                loop {
                    let found: Vec<String> = g
                        .productions()
                        .iter()
                        .filter(|(h, _)| !spans[i][j].contains(*h))
                        .filter(|(_, alts)| {
                            alts.iter().any(|a| seq(a, i, j, &s, &spans, &nullable))
                        })
                        .map(|(h, _)| h.clone())
                        .collect();

                    if found.is_empty() {
                        break;
                    }
                    spans[i][j].extend(found);
                }
            }
        }

        g.start().is_some_and(|st| {
            if n == 0 {
                nullable.contains(st)
            } else {
                spans[0][n].contains(st)
            }
        })
    }

    /// `S → AB | ε`, `A → a`, `B → b`
    pub(crate) fn ab() -> Grammar {
        Grammar::new(
            ["S", "A", "B"],
            ["a", "b"],
            [
                (
                    "S".to_owned(),
                    vec![vec![Token::nt("A"), Token::nt("B")], vec![Token::Empty]],
                ),
                ("A".to_owned(), vec![vec![Token::t("a")]]),
                ("B".to_owned(), vec![vec![Token::t("b")]]),
            ],
            Some("S".to_owned()),
        )
        .unwrap()
    }

    #[test]
    fn validation() {
        assert_eq!(
            Grammar::new(["S"], ["a"], [("T".to_owned(), vec![])], None),
            Err(GrammarError::UnknownHead("T".to_owned()))
        );
        assert_eq!(
            Grammar::new(["S"], [""; 0], [("S".to_owned(), vec![vec![Token::t("a")]])], None),
            Err(GrammarError::UnknownTerminal("S".to_owned(), "a".to_owned()))
        );
        assert_eq!(
            Grammar::new(["S"], [""; 0], [], Some("X".to_owned())),
            Err(GrammarError::UnknownStart("X".to_owned()))
        );
    }

    #[test]
    fn mutators() {
        let g = ab();
        assert_eq!(
            g.remove_non_terminal("A"),
            Err(GrammarError::UnknownNonTerminal("S".to_owned(), "A".to_owned()))
        );
        assert_eq!(
            g.remove_terminal("b"),
            Err(GrammarError::UnknownTerminal("B".to_owned(), "b".to_owned()))
        );

        let g2 = g
            .add_non_terminal("C")
            .add_terminal("c")
            .add_production("C", vec![Token::t("c")])
            .unwrap();
        assert_eq!(g2.alternatives("C"), [vec![Token::t("c")]]);
        assert!(g.alternatives("C").is_empty());

        let g3 = g2.clear_production("C").remove_non_terminal("C").unwrap();
        assert!(!g3.non_terminals().contains("C"));
        assert_eq!(g3.set_start(Some("A".to_owned())).unwrap().start(), Some("A"));
        assert!(g3.set_start(Some("Q".to_owned())).is_err());
        assert!(g.add_production("A", vec![Token::nt("Q")]).is_err());
    }

    #[test]
    fn analyses() {
        let g = ab()
            .add_non_terminal("N")
            .add_non_terminal("D")
            .add_production("N", vec![Token::Empty])
            .and_then(|g| g.add_production("N", vec![Token::nt("N"), Token::nt("N")]))
            .and_then(|g| g.add_production("D", vec![Token::nt("D"), Token::t("a")]))
            .unwrap();

        assert_eq!(
            g.nullable_non_terminals(),
            BTreeSet::from(["N".to_owned(), "S".to_owned()])
        );
        assert_eq!(g.null_non_terminals(), BTreeSet::from(["N".to_owned()]));

        let generating = g.generating_symbols();
        assert!(generating.contains(&Token::nt("S")));
        assert!(generating.contains(&Token::nt("N")));
        assert!(generating.contains(&Token::t("a")));
        assert!(!generating.contains(&Token::nt("D")));
    }
}
