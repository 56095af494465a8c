//! Plain-text transition tables.
//!
//! ```text
//! 0    1       # alphabet, optionally led by ε
//! → s0 s0 s1
//! * s1 s1 s1
//! ```
//!
//! `→` (or `->`) marks the start state and `*` an accepting one.  A DFA row
//! names bare targets, an NFA row brace-enclosed sets (`{a, b}`).  A bare `∅`
//! means "no transition"; a state actually named `∅` is written `{∅}`.
//! State names never contain whitespace or braces, and names listed inside
//! braces cannot contain commas either.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use super::{Automaton, EMPTY_SET, Edges, Kind, Label, Transitions};
use crate::symbol;

const COMMENT: char = '#';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("Table has no alphabet line")]
    MissingAlphabet,
    #[error("Line {0}: missing state name")]
    MissingState(usize),
    #[error("Line {0}: unclosed '{{'")]
    UnclosedBrace(usize),
    #[error("Line {0}: unexpected {1:?}")]
    Unexpected(usize, char),
    #[error("Line {line}: {found} columns given but the alphabet has {expected}")]
    TooManyColumns {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("Line {0}: state {1:?} is listed twice")]
    DuplicateState(usize, String),
    #[error("No state is marked as the start state")]
    MissingStart,
}

fn strip_comment(line: &str) -> &str { line.split_once(COMMENT).map_or(line, |(l, _)| l).trim() }

#[inline]
fn is_name_char(c: char) -> bool { !c.is_whitespace() && !matches!(c, '{' | '}') }

/// Split the transition columns of one row into target sets
fn parse_columns(line: usize, mut s: &str) -> Result<Vec<BTreeSet<String>>, TableError> {
    let mut cols = vec![];

    loop {
        s = s.trim_start();
        let Some(c) = s.chars().next() else { break Ok(cols) };

        if c == '{' {
            let Some((inner, rest)) = s[1..].split_once('}') else {
                break Err(TableError::UnclosedBrace(line));
            };

            cols.push(
                inner
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect(),
            );
            s = rest;
        } else if is_name_char(c) {
            let end = s.find(|c| !is_name_char(c)).unwrap_or(s.len());
            let (name, rest) = s.split_at(end);

            cols.push(if name == EMPTY_SET {
                BTreeSet::new()
            } else {
                [name.to_owned()].into()
            });
            s = rest;
        } else {
            break Err(TableError::Unexpected(line, c));
        }
    }
}

/// Parse a transition table.
///
/// # Errors
/// Fails on malformed rows; never returns a partially-read automaton.  The
/// result is not validated: undeclared targets are reported by
/// [`Automaton::validate`].
pub fn parse_table(text: &str) -> Result<Automaton, TableError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, strip_comment(l)))
        .filter(|(_, l)| !l.is_empty());

    let (_, header) = lines.next().ok_or(TableError::MissingAlphabet)?;
    let columns: Vec<Label> = header.split_whitespace().map(Label::from).collect();

    let mut starting = None;
    let mut accepting = BTreeSet::new();
    let mut transitions = Transitions::new();

    for (line, mut row) in lines {
        let mut is_start = false;
        if let Some(rest) = row.strip_prefix('→').or_else(|| row.strip_prefix("->")) {
            is_start = true;
            row = rest.trim_start();
        }

        let mut is_accept = false;
        if let Some(rest) = row.strip_prefix('*') {
            is_accept = true;
            row = rest.trim_start();
        }

        let end = row.find(char::is_whitespace).unwrap_or(row.len());
        let (name, rest) = row.split_at(end);
        if name.is_empty() {
            return Err(TableError::MissingState(line));
        }

        let cols = parse_columns(line, rest)?;
        if cols.len() > columns.len() {
            return Err(TableError::TooManyColumns {
                line,
                found: cols.len(),
                expected: columns.len(),
            });
        }

        let edges: Edges = columns.iter().cloned().zip(cols).collect();
        if transitions.insert(name.to_owned(), edges).is_some() {
            return Err(TableError::DuplicateState(line, name.to_owned()));
        }

        if is_start && starting.is_none() {
            starting = Some(name.to_owned());
        }
        if is_accept {
            accepting.insert(name.to_owned());
        }
    }

    let starting = starting.ok_or(TableError::MissingStart)?;
    let alphabet: Vec<_> = columns.iter().filter_map(Label::as_symbol).collect();

    tracing::trace!(
        states = transitions.len(),
        symbols = alphabet.len(),
        "Parsed transition table"
    );

    Ok(Automaton::from_parts(
        starting,
        accepting,
        alphabet,
        transitions,
    ))
}

fn format_targets(targets: Option<&BTreeSet<String>>, bare: bool) -> String {
    match targets {
        None => EMPTY_SET.to_owned(),
        Some(t) if bare && t.len() == 1 && !t.contains(EMPTY_SET) => {
            t.iter().next().cloned().unwrap_or_default()
        },
        Some(t) => format!(
            "{{{}}}",
            t.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Render an automaton in the format read by [`parse_table`], start state
/// first
#[must_use]
pub fn format_table(a: &Automaton) -> String {
    let kind = a.kind();
    let bare = kind == Kind::Dfa;

    let mut columns = vec![];
    if kind == Kind::EpsilonNfa {
        columns.push(Label::Epsilon);
    }
    columns.extend(a.alphabet().iter().map(|s| Label::sym(s.as_str())));

    let mut rows = vec![
        std::iter::once(String::new())
            .chain(columns.iter().map(ToString::to_string))
            .collect::<Vec<_>>(),
    ];

    let empty = BTreeMap::new();
    for state in symbol::start_first(a.states(), Some(a.starting())) {
        let mut head = String::new();
        if state == a.starting() {
            head.push_str("→ ");
        }
        if a.is_accepting(state) {
            head.push_str("* ");
        }
        head.push_str(state);

        let edges = a.edges(state).unwrap_or(&empty);
        rows.push(
            std::iter::once(head)
                .chain(columns.iter().map(|l| format_targets(edges.get(l), bare)))
                .collect(),
        );
    }

    let widths: Vec<usize> = (0..=columns.len())
        .map(|i| rows.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    rows.iter()
        .map(|r| {
            r.iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:w$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&format_table(self)) }
}

impl std::str::FromStr for Automaton {
    type Err = TableError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_table(s) }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::automaton::EPSILON;

    const DFA: &str = "
        # ends in a one
            0   1
        → s0  s0  s1
        * s1  s1  s1   # absorbing
    ";

    #[test]
    fn parse_dfa() {
        let a = parse_table(DFA).unwrap();
        assert_eq!(a, crate::automaton::test::ends_in_one());
        assert!(a.is_complete_dfa());
    }

    #[test]
    fn parse_enfa() {
        let a = parse_table(
            "ε a b
             -> *p {q} {p, q} ∅
             q {} ∅ {p,q}",
        )
        .unwrap();

        assert_eq!(a.kind(), Kind::EpsilonNfa);
        assert_eq!(a.starting(), "p");
        assert!(a.is_accepting("p"));
        assert_eq!(a.alphabet().len(), 2);
        assert_eq!(a.targets("p", &Label::Epsilon).collect::<Vec<_>>(), ["q"]);
        assert_eq!(a.targets("p", &Label::sym("a")).count(), 2);
        assert_eq!(a.targets("p", &Label::sym("b")).count(), 0);
        assert_eq!(a.targets("q", &Label::sym("b")).count(), 2);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn format_round_trips() {
        let dfa = parse_table(DFA).unwrap();
        let text = format_table(&dfa);
        assert!(text.contains("→ s0"));
        assert!(!text.contains('{'));
        assert_eq!(parse_table(&text).unwrap(), dfa);

        let nfa = dfa
            .clone()
            .with_transition("s0", EPSILON, "s1")
            .with_transition("s1", "0", EMPTY_SET);
        let text = format_table(&nfa);
        assert!(text.starts_with(&format!("{:4}", "")));
        assert!(text.contains("{s1, ∅}"));
        assert_eq!(parse_table(&text).unwrap(), nfa);
    }

    #[test]
    fn sink_state_is_braced() {
        let a = Automaton::new("a")
            .with_transition("a", "x", EMPTY_SET)
            .with_transition(EMPTY_SET, "x", EMPTY_SET);
        let text = format_table(&a);
        assert!(text.contains("{∅}"));
        assert_eq!(parse_table(&text).unwrap(), a);
    }

    #[test]
    fn errors() {
        assert_eq!(parse_table("  # nothing\n"), Err(TableError::MissingAlphabet));
        assert_eq!(parse_table("a\ns0 s1"), Err(TableError::MissingStart));
        assert_eq!(
            parse_table("a\n→ s0 {s1"),
            Err(TableError::UnclosedBrace(2))
        );
        assert_eq!(
            parse_table("a\n→ s0 s0 s0"),
            Err(TableError::TooManyColumns {
                line: 2,
                found: 2,
                expected: 1
            })
        );
        assert_eq!(parse_table("a\n→ s0 }"), Err(TableError::Unexpected(2, '}')));
        assert_eq!(parse_table("a\n→ *"), Err(TableError::MissingState(2)));
        assert_eq!(
            parse_table("a\n→ s0 s0\ns0 s0"),
            Err(TableError::DuplicateState(3, "s0".into()))
        );
    }
}
