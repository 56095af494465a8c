//! Parse trees read back from a chart of derivable spans

use std::{cmp::Reverse, fmt};

use hashbrown::HashMap;

use super::{
    EMPTY_STRING, Grammar, Token,
    cyk::{cyk, tokenize},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNode {
    Tree(ParseTree),
    /// A terminal, or `ε`
    Leaf(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    non_terminal: String,
    children: Vec<ParseNode>,
}

impl ParseTree {
    #[inline]
    #[must_use]
    pub fn non_terminal(&self) -> &str { &self.non_terminal }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ParseNode] { &self.children }

    /// The leaves read left to right, ε leaves contributing nothing
    #[must_use]
    pub fn yield_string(&self) -> String {
        fn walk(t: &ParseTree, out: &mut String) {
            for child in &t.children {
                match child {
                    ParseNode::Tree(t) => walk(t, out),
                    ParseNode::Leaf(s) if s == EMPTY_STRING => (),
                    ParseNode::Leaf(s) => out.push_str(s),
                }
            }
        }

        let mut out = String::new();
        walk(self, &mut out);
        out
    }
}

/// Bracketed form: `S(A(a) B(b))`
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.non_terminal)?;

        for (i, child) in self.children.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }

            match child {
                ParseNode::Tree(t) => write!(f, "{t}")?,
                ParseNode::Leaf(s) => f.write_str(s)?,
            }
        }

        f.write_str(")")
    }
}

/// Every `(non-terminal, start, end)` span of the input that the non-terminal
/// derives, with the alternative and token boundaries that first proved it.
///
/// A span is only ever proven from spans already in the chart, so following
/// the recorded boundaries back down always bottoms out.
#[derive(Debug)]
struct Chart<'g> {
    g: &'g Grammar,
    tokens: Vec<String>,
    derived: HashMap<(&'g str, usize, usize), (usize, Vec<usize>)>,
}

impl<'g> Chart<'g> {
    fn fill(g: &'g Grammar, tokens: Vec<String>) -> Self {
        let n = tokens.len();
        let mut chart = Self {
            g,
            tokens,
            derived: HashMap::new(),
        };

        let order: Vec<(&str, Vec<usize>)> = g
            .productions()
            .iter()
            .map(|(head, alts)| {
                let mut idx: Vec<usize> = (0..alts.len()).collect();
                idx.sort_by_key(|&i| Reverse(alts[i].len()));
                (head.as_str(), idx)
            })
            .collect();

        for len in 0..=n {
            for i in 0..=n - len {
                let j = i + len;

                loop {
                    let mut changed = false;

                    for (head, idx) in &order {
                        if chart.derived.contains_key(&(*head, i, j)) {
                            continue;
                        }

                        let alts = g.alternatives(head);
                        if let Some((a, ends)) = idx
                            .iter()
                            .find_map(|&a| chart.split(&alts[a], i, j).map(|e| (a, e)))
                        {
                            chart.derived.insert((*head, i, j), (a, ends));
                            changed = true;
                        }
                    }

                    if !changed {
                        break;
                    }
                }
            }
        }

        tracing::trace!(spans = chart.derived.len(), "Filled parse chart");
        chart
    }

    fn matches(&self, t: &Token, i: usize, k: usize) -> bool {
        match t {
            Token::Terminal(x) => k == i + 1 && self.tokens[i] == *x,
            Token::Empty => i == k,
            Token::NonTerminal(n) => self.derived.contains_key(&(n.as_str(), i, k)),
        }
    }

    /// End positions of each token of `alt` covering tokens `i..j`, the
    /// earliest split first
    fn split(&self, alt: &[Token], i: usize, j: usize) -> Option<Vec<usize>> {
        let Some((t, rest)) = alt.split_first() else {
            return (i == j).then(Vec::new);
        };

        (i..=j).find_map(|k| {
            if !self.matches(t, i, k) {
                return None;
            }

            let mut ends = self.split(rest, k, j)?;
            ends.insert(0, k);
            Some(ends)
        })
    }

    fn build(&self, head: &str, i: usize, j: usize) -> Option<ParseTree> {
        let (a, ends) = self.derived.get(&(head, i, j))?;
        let alt = self.g.alternatives(head).get(*a)?;

        let mut from = i;
        let mut children = Vec::with_capacity(alt.len());
        for (t, &to) in alt.iter().zip(ends) {
            children.push(match t {
                Token::NonTerminal(n) => ParseNode::Tree(self.build(n, from, to)?),
                Token::Terminal(x) => ParseNode::Leaf(x.clone()),
                Token::Empty => ParseNode::Leaf(EMPTY_STRING.to_owned()),
            });
            from = to;
        }

        Some(ParseTree {
            non_terminal: head.to_owned(),
            children,
        })
    }
}

/// Find a parse tree of `input` from the start symbol.
///
/// Any non-empty input is checked with [`cyk`] first.  The input is then
/// split into the same terminals and every span it derives is charted,
/// shortest spans first, each span to a fixed point so that ε and unit
/// alternatives are followed.  The tree is read back top-down, preferring
/// longer alternatives and earlier splits.  The empty input parses iff the
/// start symbol is nullable.
#[must_use]
pub fn parse(g: &Grammar, input: &str) -> Option<ParseTree> {
    let _span = tracing::debug_span!("parse", input).entered();
    let start = g.start()?;

    if !input.is_empty() && !cyk(g, input, &mut ()).derives(start) {
        tracing::trace!("Rejected by CYK");
        return None;
    }

    let chart = Chart::fill(g, tokenize(g, input));
    let tree = chart.build(start, 0, chart.tokens.len());
    tracing::debug!(found = tree.is_some(), "Read back parse tree");
    tree
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        cfg::{
            grammar,
            syntax::parse as read,
            test::{ab, recognizes},
        },
        re::ab_string,
    };

    #[test]
    fn ab_trees() {
        let tree = parse(&ab(), "ab").unwrap();
        assert_eq!(tree.to_string(), "S(A(a) B(b))");
        assert_eq!(tree.yield_string(), "ab");

        let empty = parse(&ab(), "").unwrap();
        assert_eq!(empty.to_string(), "S(ε)");
        assert_eq!(empty.yield_string(), "");

        assert_eq!(parse(&ab(), "a"), None);
        assert_eq!(parse(&ab(), "abab"), None);
    }

    #[test]
    fn prefers_long_alternatives() {
        let g = read("S→aSb|ab|SS").unwrap();
        let tree = parse(&g, "aabb").unwrap();
        assert_eq!(tree.to_string(), "S(a S(a b) b)");

        let tree = parse(&g, "abab").unwrap();
        assert_eq!(tree.to_string(), "S(S(a b) S(a b))");
    }

    #[test]
    fn nullable_padding() {
        let g = read("S→NSN|SS|a|b\nN→NN|ε|c").unwrap();
        let input = "a".repeat(14);
        assert!(cyk(&g, &input, &mut ()).derives("S"));

        let tree = parse(&g, &input).unwrap();
        assert_eq!(tree.yield_string(), input);
        assert!(parse(&g, "cac").is_some());
        assert!(parse(&g, "cc").is_none());
    }

    #[test]
    fn nullable_chains() {
        let g = read("S→AS|ε\nA→a|ε").unwrap();
        let tree = parse(&g, "aa").unwrap();
        assert_eq!(tree.yield_string(), "aa");
        assert!(parse(&g, "").is_some());
        assert!(parse(&g, "b").is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, ..ProptestConfig::default() })]

        #[test]
        fn trees_match_membership(g in grammar(3, 3), inputs in prop::collection::vec(ab_string(4), 8)) {
            for s in inputs {
                match parse(&g, &s) {
                    Some(tree) => {
                        prop_assert!(recognizes(&g, &s), "{:?}\n{}", s, g);
                        prop_assert_eq!(tree.non_terminal(), "S");
                        prop_assert_eq!(tree.yield_string(), s);
                    },
                    None => prop_assert!(!recognizes(&g, &s), "{:?}\n{}", s, g),
                }
            }
        }
    }
}
