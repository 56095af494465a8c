//! Text formats for grammars.
//!
//! The line format has one production per line:
//!
//! ```text
//! S→AB|
//! A→a
//! B→b
//! ```
//!
//! A non-terminal is an upper-case letter followed by any subscript digits or
//! primes, `ε` is the empty string, and every other character is a terminal
//! of its own.  An empty alternative (here after the final `|`) stands for
//! `ε`.  `->` may replace the arrow and whitespace is ignored.  The head of
//! the first line is the start symbol.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use super::{Alternative, EMPTY_STRING, Grammar, GrammarError, Token};
use crate::symbol::is_subscript;

pub const ARROW: char = '→';
pub const BAR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Line {0}: missing {ARROW:?}")]
    MissingArrow(usize),
    #[error("Line {0}: {1:?} is not a non-terminal")]
    BadHead(usize, String),
    #[error("Line {0}: unexpected {1:?}")]
    Unexpected(usize, char),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

#[inline]
fn is_mark(c: char) -> bool { is_subscript(c) || matches!(c, '\'' | '′') }

/// Whether `name` follows the non-terminal naming convention
#[must_use]
pub fn is_non_terminal_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.all(is_mark)
}

fn parse_alternative(line: usize, s: &str) -> Result<Alternative, ParseError> {
    let mut alt = vec![];
    let mut chars = s.chars().filter(|c| !c.is_whitespace()).peekable();

    while let Some(c) = chars.next() {
        if c.is_uppercase() {
            let mut name = String::from(c);
            while let Some(&m) = chars.peek()
                && is_mark(m)
            {
                name.push(m);
                chars.next();
            }
            alt.push(Token::NonTerminal(name));
        } else if is_mark(c) {
            return Err(ParseError::Unexpected(line, c));
        } else if EMPTY_STRING.starts_with(c) {
            alt.push(Token::Empty);
        } else {
            alt.push(Token::Terminal(c.to_string()));
        }
    }

    if alt.is_empty() {
        alt.push(Token::Empty);
    }

    Ok(alt)
}

/// Read a grammar in the line format.  Blank lines are skipped.
///
/// # Errors
/// Fails on a line without an arrow, a head that is not a non-terminal, or
/// a stray subscript or prime.
pub fn parse(text: &str) -> Result<Grammar, ParseError> {
    let mut non_terminals = IndexSet::new();
    let mut terminals = IndexSet::new();
    let mut productions: IndexMap<String, Vec<Alternative>> = IndexMap::new();
    let mut start = None;

    for (line, text) in text.lines().enumerate().map(|(i, l)| (i + 1, l.trim())) {
        if text.is_empty() {
            continue;
        }

        let (head, body) = text
            .split_once(ARROW)
            .or_else(|| text.split_once("->"))
            .ok_or(ParseError::MissingArrow(line))?;

        let head: String = head.chars().filter(|c| !c.is_whitespace()).collect();
        if !is_non_terminal_name(&head) {
            return Err(ParseError::BadHead(line, head));
        }

        non_terminals.insert(head.clone());
        start.get_or_insert_with(|| head.clone());

        for alt in body.split(BAR) {
            let alt = parse_alternative(line, alt)?;

            for tok in &alt {
                match tok {
                    Token::NonTerminal(n) => {
                        non_terminals.insert(n.clone());
                    },
                    Token::Terminal(t) => {
                        terminals.insert(t.clone());
                    },
                    Token::Empty => (),
                }
            }

            productions.entry(head.clone()).or_default().push(alt);
        }
    }

    tracing::trace!(productions = productions.len(), "Parsed grammar");
    Ok(Grammar::new(non_terminals, terminals, productions, start)?)
}

/// Render one alternative in the line format, `ε` as nothing
fn alternative(alt: &[Token]) -> String {
    alt.iter()
        .filter(|t| **t != Token::Empty)
        .map(Token::identifier)
        .collect()
}

/// One line of the line format per non-terminal with a production, start
/// first and the rest in declaration order
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start().filter(|s| self.productions.contains_key(*s));
        let rest = self
            .productions
            .keys()
            .map(String::as_str)
            .filter(|h| Some(*h) != start);

        for head in start.into_iter().chain(rest) {
            let alts: Vec<_> = self.alternatives(head).iter().map(|a| alternative(a)).collect();
            writeln!(f, "{head}{ARROW}{}", alts.join(&BAR.to_string()))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Render the grammar as a LaTeX 4-tuple followed by an aligned block of
    /// productions
    #[must_use]
    pub fn format_latex(&self) -> String {
        let join = |s: &IndexSet<String>| s.iter().map(String::as_str).collect::<Vec<_>>().join(", ");

        let productions = self
            .productions
            .iter()
            .map(|(nt, alts)| {
                let alts: Vec<String> = alts
                    .iter()
                    .map(|a| a.iter().map(Token::identifier).collect())
                    .collect();
                format!("{nt} &→ {}", alts.join(" \\mid "))
            })
            .collect::<Vec<_>>()
            .join(" \\\\\n\t");

        format!(
            "(\\{{{}\\}}, \\{{{}\\}}, P, {}) \\\\[0.5em]\n\\begin{{aligned}}\n\tP: \
             {productions}\n\\end{{aligned}}",
            join(&self.non_terminals),
            join(&self.terminals),
            self.start().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cfg::test::ab;

    #[test]
    fn reads_line_format() {
        let g = parse("S → AB |\nA→a\n\nB->b\n").unwrap();
        assert_eq!(g, ab());
        assert_eq!(g.start(), Some("S"));
    }

    #[test]
    fn writes_line_format() {
        assert_eq!(ab().to_string(), "S→AB|\nA→a\nB→b\n");
        assert_eq!(parse(&ab().to_string()).unwrap(), ab());
    }

    #[test]
    fn names() {
        let g = parse("S₁→S′a|ε\nS′→0").unwrap();
        assert_eq!(g.alternatives("S₁"), [
            vec![Token::nt("S′"), Token::t("a")],
            vec![Token::Empty]
        ]);
        assert_eq!(g.terminals().iter().collect::<Vec<_>>(), ["a", "0"]);
        assert!(is_non_terminal_name("X₁₂"));
        assert!(!is_non_terminal_name("x"));
        assert!(!is_non_terminal_name("XY"));
    }

    #[test]
    fn errors() {
        assert_eq!(parse("S AB"), Err(ParseError::MissingArrow(1)));
        assert_eq!(parse("\ns→a"), Err(ParseError::BadHead(2, "s".to_owned())));
        assert_eq!(parse("S→a₁"), Err(ParseError::Unexpected(1, '₁')));
    }

    #[test]
    fn latex() {
        assert_eq!(
            ab().format_latex(),
            "(\\{S, A, B\\}, \\{a, b\\}, P, S) \\\\[0.5em]\n\\begin{aligned}\n\tP: S &→ AB \
             \\mid ε \\\\\n\tA &→ a \\\\\n\tB &→ b\n\\end{aligned}"
        );
    }
}
