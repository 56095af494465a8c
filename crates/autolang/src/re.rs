//! Regular expressions over string symbols

use std::{
    collections::BTreeSet,
    fmt::{self, Write},
};

use crate::worklist::Worklist;

pub mod eliminate;
pub mod nfa_builder;
mod simplify;
pub mod syntax;

pub const ALTERNATIVE: char = '+';
pub const STAR: char = '*';
pub const EMPTY: char = '∅';
pub const NIL: char = 'ε';

/// A regular expression.
///
/// Equality treats [`Alternative`](Self::Alternative) as an unordered
/// multiset of its flattened operands and everything else structurally, so
/// `a + (b + a)` equals `(a + a) + b` but `a(bc)` does not equal `(ab)c`.
#[derive(Debug, Clone)]
pub enum Regex {
    /// Matches nothing
    Empty,
    /// Matches only the empty string
    Nil,
    Symbol(String),
    /// A named placeholder, shown in per-state equations and never matched
    Reference(String),
    Sequence(Box<Regex>, Box<Regex>),
    Alternative(Box<Regex>, Box<Regex>),
    Star(Box<Regex>),
}

impl Regex {
    #[inline]
    #[must_use]
    pub fn sym(s: impl Into<String>) -> Self { Self::Symbol(s.into()) }

    #[inline]
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self { Self::Reference(name.into()) }

    #[inline]
    #[must_use]
    pub fn seq(lhs: Self, rhs: Self) -> Self { Self::Sequence(lhs.into(), rhs.into()) }

    #[inline]
    #[must_use]
    pub fn alt(lhs: Self, rhs: Self) -> Self { Self::Alternative(lhs.into(), rhs.into()) }

    #[inline]
    #[must_use]
    pub fn star(self) -> Self { Self::Star(self.into()) }

    /// Right-nested concatenation of `exps`, [`Nil`](Self::Nil) if there are
    /// none
    #[must_use]
    pub fn cat_all<I: IntoIterator<Item = Self>>(exps: I) -> Self {
        let exps: Vec<_> = exps.into_iter().collect();
        let mut it = exps.into_iter().rev();
        let Some(last) = it.next() else {
            return Self::Nil;
        };

        it.fold(last, |acc, e| Self::seq(e, acc))
    }

    /// Left-nested alternation of `exps`, [`Empty`](Self::Empty) if there are
    /// none
    #[must_use]
    pub fn alt_all<I: IntoIterator<Item = Self>>(exps: I) -> Self {
        exps.into_iter().reduce(Self::alt).unwrap_or(Self::Empty)
    }

    /// Binding strength used for parenthesization, higher binds tighter
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Alternative(..) => 1,
            Self::Sequence(..) => 2,
            Self::Star(_) => 3,
            Self::Symbol(_) | Self::Reference(_) => 4,
            Self::Nil => 5,
            Self::Empty => 6,
        }
    }

    /// The operands of nested sequences, in order.  Anything that is not a
    /// sequence is its own only operand.
    #[must_use]
    pub fn sequence(&self) -> Vec<&Self> {
        fn go<'a>(e: &'a Regex, out: &mut Vec<&'a Regex>) {
            if let Regex::Sequence(l, r) = e {
                go(l, out);
                go(r, out);
            } else {
                out.push(e);
            }
        }

        let mut out = vec![];
        go(self, &mut out);
        out
    }

    /// The operands of nested alternatives, in order
    #[must_use]
    pub fn alternatives(&self) -> Vec<&Self> {
        fn go<'a>(e: &'a Regex, out: &mut Vec<&'a Regex>) {
            if let Regex::Alternative(l, r) = e {
                go(l, out);
                go(r, out);
            } else {
                out.push(e);
            }
        }

        let mut out = vec![];
        go(self, &mut out);
        out
    }

    /// Every symbol and reference name occurring in the expression
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];

        while let Some(e) = stack.pop() {
            match e {
                Self::Empty | Self::Nil => (),
                Self::Symbol(s) | Self::Reference(s) => {
                    out.insert(s.clone());
                },
                Self::Sequence(l, r) | Self::Alternative(l, r) => stack.extend([&**l, &**r]),
                Self::Star(e) => stack.push(e),
            }
        }

        out
    }

    /// True iff the expression matches no string at all.  References are
    /// assumed to match something.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Nil | Self::Symbol(_) | Self::Reference(_) | Self::Star(_) => false,
            Self::Sequence(l, r) => l.is_empty() || r.is_empty(),
            Self::Alternative(l, r) => l.is_empty() && r.is_empty(),
        }
    }

    /// Substitute `with` for every reference to `name`
    #[must_use]
    pub fn replace(&self, name: &str, with: &Self) -> Self {
        match self {
            Self::Reference(n) if n == name => with.clone(),
            Self::Empty | Self::Nil | Self::Symbol(_) | Self::Reference(_) => self.clone(),
            Self::Sequence(l, r) => Self::seq(l.replace(name, with), r.replace(name, with)),
            Self::Alternative(l, r) => Self::alt(l.replace(name, with), r.replace(name, with)),
            Self::Star(e) => e.replace(name, with).star(),
        }
    }

    /// Every suffix of `input` left over after matching some prefix of it,
    /// longest first and without duplicates
    #[must_use]
    pub fn run<'a>(&self, input: &'a str) -> Vec<&'a str> {
        let mut out: Vec<&'a str> = match self {
            Self::Empty | Self::Reference(_) => vec![],
            Self::Nil => vec![input],
            Self::Symbol(s) => input.strip_prefix(s.as_str()).into_iter().collect(),
            Self::Sequence(l, r) => l
                .run(input)
                .into_iter()
                .flat_map(|rest| r.run(rest))
                .collect(),
            Self::Alternative(l, r) => {
                let mut v = l.run(input);
                v.extend(r.run(input));
                v
            },
            Self::Star(e) => Worklist::new([input])
                .solve(|s| e.run(*s))
                .into_iter()
                .collect(),
        };

        out.sort_unstable_by_key(|s| std::cmp::Reverse(s.len()));
        out.dedup();
        out
    }

    /// Whether the expression matches all of `input`
    #[must_use]
    pub fn test(&self, input: &str) -> bool { self.run(input).iter().any(|s| s.is_empty()) }
}

impl PartialEq for Regex {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) | (Self::Nil, Self::Nil) => true,
            (Self::Symbol(a), Self::Symbol(b)) | (Self::Reference(a), Self::Reference(b)) => a == b,
            (Self::Sequence(a, b), Self::Sequence(c, d)) => a == c && b == d,
            (Self::Star(a), Self::Star(b)) => a == b,
            (Self::Alternative(..), Self::Alternative(..)) => {
                let lhs = self.alternatives();
                let mut rhs = other.alternatives();

                lhs.len() == rhs.len()
                    && lhs.into_iter().all(|l| {
                        rhs.iter()
                            .position(|r| l == *r)
                            .map(|i| rhs.swap_remove(i))
                            .is_some()
                    })
            },
            _ => false,
        }
    }
}

impl Eq for Regex {}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn wrap(f: &mut fmt::Formatter<'_>, e: &Regex, parens: bool) -> fmt::Result {
            if parens {
                write!(f, "({e})")
            } else {
                write!(f, "{e}")
            }
        }

        let prec = self.precedence();
        match self {
            Self::Empty => f.write_char(EMPTY),
            Self::Nil => f.write_char(NIL),
            Self::Symbol(s) | Self::Reference(s) => f.write_str(s),
            Self::Sequence(l, r) => {
                wrap(f, l, l.precedence() < prec)?;
                wrap(f, r, r.precedence() < prec)
            },
            Self::Alternative(l, r) => {
                wrap(f, l, l.precedence() < prec)?;
                write!(f, " {ALTERNATIVE} ")?;
                wrap(f, r, r.precedence() <= prec)
            },
            Self::Star(e) => {
                wrap(f, e, e.precedence() < prec)?;
                f.write_char(STAR)
            },
        }
    }
}

#[cfg(any(test, feature = "proptest"))]
pub use prop::*;

#[cfg(any(test, feature = "proptest"))]
mod prop {
    use proptest::prelude::*;

    use super::Regex;

    /// Expressions over the symbols `a` and `b`, without references
    pub fn re(depth: u32, tree_size: u32) -> impl Strategy<Value = Regex> {
        prop_oneof![
            1 => Just(Regex::Empty),
            2 => Just(Regex::Nil),
            4 => prop_oneof![Just("a"), Just("b")].prop_map(Regex::sym),
        ]
        .prop_recursive(depth, tree_size, 2, |s| {
            prop_oneof![
                (s.clone(), s.clone()).prop_map(|(l, r)| Regex::seq(l, r)),
                (s.clone(), s.clone()).prop_map(|(l, r)| Regex::alt(l, r)),
                s.prop_map(Regex::star),
            ]
        })
    }

    /// Strings over `{a, b}` up to `max_len` characters long
    pub fn ab_string(max_len: usize) -> impl Strategy<Value = String> {
        prop::collection::vec(prop_oneof![Just('a'), Just('b')], 0..=max_len)
            .prop_map(|v| v.into_iter().collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn a() -> Regex { Regex::sym("a") }

    fn b() -> Regex { Regex::sym("b") }

    #[test]
    fn alternatives_are_unordered() {
        let l = Regex::alt(a(), Regex::alt(b(), a()));
        let r = Regex::alt(Regex::alt(a(), a()), b());
        assert_eq!(l, r);
        assert_ne!(l, Regex::alt(a(), b()));
        assert_ne!(Regex::seq(a(), b()), Regex::seq(b(), a()));
        assert_ne!(
            Regex::seq(a(), Regex::seq(b(), a())),
            Regex::seq(Regex::seq(a(), b()), a())
        );
    }

    #[test]
    fn formatting() {
        assert_eq!(Regex::seq(Regex::alt(a(), b()), a().star()).to_string(), "(a + b)a*");
        assert_eq!(Regex::alt(a(), Regex::alt(b(), Regex::Nil)).to_string(), "a + (b + ε)");
        assert_eq!(Regex::alt(Regex::alt(a(), b()), Regex::Nil).to_string(), "a + b + ε");
        assert_eq!(Regex::seq(a(), b()).star().to_string(), "(ab)*");
        assert_eq!(a().star().star().to_string(), "a**");
        assert_eq!("a**".parse::<Regex>().unwrap(), a().star().star());
        assert_eq!(Regex::seq(Regex::reference("e₁"), Regex::Empty).to_string(), "e₁∅");
        assert_eq!(Regex::cat_all([a(), b(), a()]).to_string(), "aba");
        assert_eq!(Regex::cat_all([]), Regex::Nil);
        assert_eq!(Regex::alt_all([]), Regex::Empty);
    }

    #[test]
    fn emptiness() {
        assert!(!Regex::alt(a(), a()).is_empty());
        assert!(!Regex::alt(a(), Regex::Empty).is_empty());
        assert!(!Regex::alt(Regex::Empty, a()).is_empty());
        assert!(Regex::alt(Regex::Empty, Regex::Empty).is_empty());

        assert!(!Regex::seq(a(), a()).is_empty());
        assert!(Regex::seq(a(), Regex::Empty).is_empty());
        assert!(Regex::seq(Regex::Empty, a()).is_empty());

        assert!(!a().star().is_empty());
        assert!(!Regex::Empty.star().is_empty());
    }

    #[test]
    fn matching() {
        let e = Regex::seq(a().star(), b());
        assert!(e.test("aaab"));
        assert!(e.test("b"));
        assert!(!e.test("b a"));
        assert!(!e.test("aa"));
        assert_eq!(e.run("abba"), ["ba"]);
        assert_eq!(a().star().run("aab"), ["aab", "ab", "b"]);

        assert!(Regex::Nil.star().test(""));
        assert!(!Regex::Empty.test(""));
        assert!(!Regex::reference("X").test("X"));
    }

    #[test]
    fn replacing() {
        let e = Regex::seq(Regex::reference("X"), Regex::alt(Regex::reference("X"), b()));
        let r = e.replace("X", &a().star());
        assert_eq!(r.to_string(), "a*(a* + b)");
        assert_eq!(e.symbols(), BTreeSet::from(["X".to_owned(), "b".to_owned()]));
    }
}
