//! Text syntax for regular expressions
//!
//! ```text
//! alt  := cat ('+' cat)*
//! cat  := post post*
//! post := atom '*'*
//! atom := '(' alt ')' | '∅' | 'ε' | name
//! ```
//!
//! A name is one non-reserved character followed by any subscript digits.
//! A lone character is a [`Symbol`](Regex::Symbol), anything longer (`e₁`)
//! a [`Reference`](Regex::Reference).  Whitespace is ignored entirely, and
//! positions in errors count the remaining characters, not bytes.

use std::str::FromStr;

use super::{ALTERNATIVE, EMPTY, NIL, Regex, STAR};
use crate::symbol::is_subscript;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty regular expression")]
    Empty,
    #[error("Missing operand at position {0}")]
    MissingOperand(usize),
    #[error("Unexpected {1:?} at position {0}")]
    Unexpected(usize, char),
    #[error("Unclosed parenthesis opened at position {0}")]
    UnclosedParen(usize),
}

const LPAREN: char = '(';
const RPAREN: char = ')';

#[derive(Debug)]
enum StackSym {
    LParen(usize),
    Alt(Regex),
    Cat(Regex),
}

#[derive(Debug, Default)]
struct Stack(Vec<StackSym>);

impl Stack {
    /// Fold the operands above the nearest open parenthesis into one
    /// expression, or fail at `at` if there are none
    fn reduce(&mut self, at: usize) -> Result<Regex, ParseError> {
        let mut cat = vec![];
        while let Some(StackSym::Cat(_)) = self.0.last() {
            if let Some(StackSym::Cat(r)) = self.0.pop() {
                cat.push(r);
            }
        }

        if cat.is_empty() {
            return Err(ParseError::MissingOperand(at));
        }

        cat.reverse();
        let cat = Regex::cat_all(cat);

        if let Some(StackSym::Alt(_)) = self.0.last()
            && let Some(StackSym::Alt(prev)) = self.0.pop()
        {
            return Ok(Regex::alt(prev, cat));
        }

        Ok(cat)
    }

    fn shift_star(&mut self, at: usize) -> Result<(), ParseError> {
        match self.0.pop() {
            Some(StackSym::Cat(r)) => {
                self.0.push(StackSym::Cat(r.star()));
                Ok(())
            },
            other => {
                self.0.extend(other);
                Err(ParseError::MissingOperand(at))
            },
        }
    }

    fn shift_alt(&mut self, at: usize) -> Result<(), ParseError> {
        let lhs = self.reduce(at)?;
        self.0.push(StackSym::Alt(lhs));
        Ok(())
    }

    fn shift_rparen(&mut self, at: usize) -> Result<(), ParseError> {
        if !self.0.iter().any(|s| matches!(s, StackSym::LParen(_))) {
            return Err(ParseError::Unexpected(at, RPAREN));
        }

        let inner = self.reduce(at)?;
        match self.0.pop() {
            Some(StackSym::LParen(_)) => {
                self.0.push(StackSym::Cat(inner));
                Ok(())
            },
            _ => Err(ParseError::Unexpected(at, RPAREN)),
        }
    }

    fn finish(mut self, end: usize) -> Result<Regex, ParseError> {
        if self.0.is_empty() {
            return Err(ParseError::Empty);
        }

        let re = self.reduce(end)?;
        match self.0.pop() {
            None => Ok(re),
            Some(StackSym::LParen(at)) => Err(ParseError::UnclosedParen(at)),
            Some(StackSym::Alt(_) | StackSym::Cat(_)) => Err(ParseError::MissingOperand(end)),
        }
    }
}

/// Parse a regular expression from its text form
///
/// # Errors
/// Fails on empty input, unbalanced parentheses, and operators missing an
/// operand.
pub fn parse(text: &str) -> Result<Regex, ParseError> {
    let mut stack = Stack::default();
    let mut chars = text.chars().filter(|c| !c.is_whitespace()).enumerate().peekable();
    let mut end = 0;

    while let Some((i, c)) = chars.next() {
        end = i + 1;

        match c {
            ALTERNATIVE => stack.shift_alt(i)?,
            STAR => stack.shift_star(i)?,
            LPAREN => stack.0.push(StackSym::LParen(i)),
            RPAREN => stack.shift_rparen(i)?,
            EMPTY => stack.0.push(StackSym::Cat(Regex::Empty)),
            NIL => stack.0.push(StackSym::Cat(Regex::Nil)),
            c if is_subscript(c) => return Err(ParseError::Unexpected(i, c)),
            c => {
                let mut name = String::from(c);
                while let Some(&(j, s)) = chars.peek()
                    && is_subscript(s)
                {
                    name.push(s);
                    end = j + 1;
                    chars.next();
                }

                stack.0.push(StackSym::Cat(if name.chars().count() == 1 {
                    Regex::Symbol(name)
                } else {
                    Regex::Reference(name)
                }));
            },
        }
    }

    tracing::trace!(text, "Parsed regular expression");
    stack.finish(end)
}

impl FromStr for Regex {
    type Err = ParseError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::re::re;

    fn a() -> Regex { Regex::sym("a") }

    fn b() -> Regex { Regex::sym("b") }

    #[test]
    fn precedence() {
        assert_eq!(parse("ab*").unwrap(), Regex::seq(a(), b().star()));
        assert_eq!(parse("(ab)*").unwrap(), Regex::seq(a(), b()).star());
        assert_eq!(parse("a + b a").unwrap(), Regex::alt(a(), Regex::seq(b(), a())));
        assert_eq!(
            parse("(a + b)a").unwrap(),
            Regex::seq(Regex::alt(a(), b()), a())
        );
        assert_eq!(parse("a**").unwrap(), a().star().star());
        assert_eq!(parse("abc").unwrap(), Regex::cat_all(["a", "b", "c"].map(Regex::sym)));
    }

    #[test]
    fn names_and_constants() {
        assert_eq!(parse("∅").unwrap(), Regex::Empty);
        assert_eq!(parse("ε").unwrap(), Regex::Nil);
        assert_eq!(
            parse("e₁₂x").unwrap(),
            Regex::seq(Regex::reference("e₁₂"), Regex::sym("x"))
        );
        assert_eq!("0 + 1".parse::<Regex>().unwrap(), Regex::alt(Regex::sym("0"), Regex::sym("1")));
    }

    #[test]
    fn alternatives_nest_left() {
        let Regex::Alternative(l, r) = parse("a + b + ε").unwrap() else {
            panic!("expected an alternative");
        };
        assert_eq!(*l, Regex::alt(a(), b()));
        assert_eq!(*r, Regex::Nil);
    }

    #[test]
    fn errors() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("  "), Err(ParseError::Empty));
        assert_eq!(parse("*a"), Err(ParseError::MissingOperand(0)));
        assert_eq!(parse("a + *"), Err(ParseError::MissingOperand(2)));
        assert_eq!(parse("a +"), Err(ParseError::MissingOperand(2)));
        assert_eq!(parse("+a"), Err(ParseError::MissingOperand(0)));
        assert_eq!(parse("()"), Err(ParseError::MissingOperand(1)));
        assert_eq!(parse("a)"), Err(ParseError::Unexpected(1, ')')));
        assert_eq!(parse("(a(b)"), Err(ParseError::UnclosedParen(0)));
        assert_eq!(parse("₁"), Err(ParseError::Unexpected(0, '₁')));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn reads_back_simplified_output(e in re(4, 24)) {
            let s = e.simplify();
            let back = parse(&s.to_string()).unwrap();
            prop_assert_eq!(back.to_string(), s.to_string());
        }
    }
}
