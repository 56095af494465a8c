//! Chomsky normal form, one pass at a time
//!
//! Each pass is pure and can run on its own.  In observed mode a pass emits
//! one snapshot for every non-terminal whose production it changed.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::{Alternative, Grammar, Token};
use crate::{
    symbol,
    trace::{Step, Trace, natural_list},
    worklist::Worklist,
};

impl Grammar {
    /// Declare a new non-terminal named after `base` that clashes with no
    /// existing symbol
    fn fresh_non_terminal(&mut self, base: &str, count: bool) -> String {
        let available = |n: &str| !self.non_terminals.contains(n) && !self.terminals.contains(n);
        let name = if count {
            symbol::count_up(base, available)
        } else {
            symbol::fresh_or_self(base, available)
        };

        self.non_terminals.insert(name.clone());
        name
    }

    /// True if every alternative is `A → BC` or `A → a`, except that the
    /// start symbol may also derive ε
    #[must_use]
    pub fn is_cnf(&self) -> bool {
        self.productions.iter().all(|(head, alts)| {
            alts.iter().all(|alt| match alt.as_slice() {
                [Token::Terminal(_)] | [Token::NonTerminal(_), Token::NonTerminal(_)] => true,
                [Token::Empty] => self.start() == Some(head.as_str()),
                _ => false,
            })
        })
    }
}

fn heads(g: &Grammar) -> Vec<String> { g.productions.keys().cloned().collect() }

/// Split every alternative of three or more tokens into a right-branching
/// chain of two-token alternatives
pub fn bin<R: Trace<Grammar>>(g: &Grammar, t: &mut R) -> Grammar {
    let _span = tracing::debug_span!("bin").entered();
    let mut out = g.clone();

    for head in heads(g) {
        let mut alts = vec![];
        let mut introduced = vec![];

        for alt in g.alternatives(&head) {
            let mut rest = alt.as_slice();
            let mut into: Option<String> = None;

            while rest.len() > 2 {
                let next = out.fresh_non_terminal(&head, true);
                let pair = vec![rest[0].clone(), Token::NonTerminal(next.clone())];

                match into {
                    Some(ref n) => out.productions.entry(n.clone()).or_default().push(pair),
                    None => alts.push(pair),
                }

                introduced.push(next.clone());
                into = Some(next);
                rest = &rest[1..];
            }

            match into {
                Some(n) => out.productions.entry(n).or_default().push(rest.to_vec()),
                None => alts.push(rest.to_vec()),
            }
        }

        if introduced.is_empty() {
            continue;
        }

        out.productions.insert(head.clone(), alts);
        tracing::trace!(%head, introduced = introduced.len(), "Split alternatives");
        t.step(|| {
            Step::described(
                out.clone(),
                format!(
                    "Split the long alternatives of {head}, introducing {}",
                    natural_list(&introduced)
                ),
            )
        });
    }

    out
}

/// Every way of keeping or dropping the optional tokens of `alt`, the
/// variant keeping everything first
fn variants(alt: &[&Token], optional: impl Fn(&Token) -> bool) -> Vec<Alternative> {
    let mut out: Vec<Alternative> = vec![vec![]];

    for &tok in alt {
        if optional(tok) {
            out = out
                .into_iter()
                .flat_map(|without| {
                    let mut with = without.clone();
                    with.push(tok.clone());
                    [with, without]
                })
                .collect();
        } else {
            for v in &mut out {
                v.push(tok.clone());
            }
        }
    }

    out
}

/// Remove ε: drop ε tokens and non-terminals deriving only ε, and expand
/// each alternative into every combination of its nullable non-terminals
/// being present or absent.  If the start symbol is nullable it keeps an
/// ε alternative so the language is unchanged.
pub fn del<R: Trace<Grammar>>(g: &Grammar, t: &mut R) -> Grammar {
    let _span = tracing::debug_span!("del").entered();

    let nullable = g.nullable_non_terminals();
    let null = g.null_non_terminals();
    let start = g.start();
    let mut out = g.clone();

    let is_null = |tok: &Token| match tok {
        Token::NonTerminal(n) => null.contains(n),
        Token::Terminal(_) => false,
        Token::Empty => true,
    };
    let is_optional = |tok: &Token| tok.as_non_terminal().is_some_and(|n| nullable.contains(n));

    for head in heads(g) {
        let is_start = start == Some(head.as_str());
        if null.contains(&head) && !is_start {
            continue;
        }

        let mut alts: Vec<Alternative> = vec![];
        let mut expanded = BTreeSet::new();

        for alt in g.alternatives(&head) {
            let kept: Vec<&Token> = alt.iter().filter(|t| !is_null(t)).collect();
            expanded.extend(kept.iter().filter(|t| is_optional(t)).map(|t| t.identifier()));

            for v in variants(&kept, is_optional) {
                if !v.is_empty() && !alts.contains(&v) {
                    alts.push(v);
                }
            }
        }

        let empty = vec![Token::Empty];
        if is_start && nullable.contains(&head) && !alts.contains(&empty) {
            alts.push(empty);
        }

        if alts == g.alternatives(&head) {
            continue;
        }

        out.productions.insert(head.clone(), alts);
        t.step(|| {
            Step::described(
                out.clone(),
                if expanded.is_empty() {
                    format!("Removed ε from the alternatives of {head}")
                } else {
                    format!(
                        "Expanded the nullable {} in the alternatives of {head}",
                        natural_list(&expanded)
                    )
                },
            )
        });
    }

    let removed: Vec<&String> = null.iter().filter(|n| start != Some(n.as_str())).collect();
    if !removed.is_empty() {
        for n in &removed {
            out.non_terminals.shift_remove(n.as_str());
            out.productions.shift_remove(n.as_str());
        }

        tracing::trace!(removed = removed.len(), "Removed null non-terminals");
        t.step(|| {
            Step::described(
                out.clone(),
                format!(
                    "Removed {}, which only derive{} ε",
                    natural_list(&removed),
                    if removed.len() == 1 { "s" } else { "" }
                ),
            )
        });
    }

    out
}

fn unit_target(alt: &Alternative) -> Option<&str> {
    match alt.as_slice() {
        [Token::NonTerminal(n)] => Some(n),
        _ => None,
    }
}

/// Replace each unit alternative `A → B` with the alternatives of `B`.
/// Chains of unit alternatives are followed to their end; a chain leading
/// back to a non-terminal already on it adds nothing and is dropped.
pub fn unit<R: Trace<Grammar>>(g: &Grammar, t: &mut R) -> Grammar { inline_units(g, true, t) }

/// With `borrow_empty` unset, `A → ε` is never copied into another
/// non-terminal.  Only sound once [`del`] has left ε on the start symbol
/// alone.
fn inline_units<R: Trace<Grammar>>(g: &Grammar, borrow_empty: bool, t: &mut R) -> Grammar {
    let _span = tracing::debug_span!("unit", borrow_empty).entered();
    let mut out = g.clone();

    for head in heads(g) {
        let reach = Worklist::new([head.clone()]).solve(|n| {
            g.alternatives(n)
                .iter()
                .filter_map(unit_target)
                .map(str::to_owned)
                .collect::<Vec<_>>()
        });

        let inlined: Vec<&str> = g
            .productions
            .keys()
            .map(String::as_str)
            .filter(|n| *n != head && reach.contains(*n))
            .collect();

        let mut alts: Vec<Alternative> = vec![];
        for src in std::iter::once(head.as_str()).chain(inlined.iter().copied()) {
            for alt in g.alternatives(src) {
                let skipped = !borrow_empty && src != head && *alt == [Token::Empty];
                if unit_target(alt).is_none() && !skipped && !alts.contains(alt) {
                    alts.push(alt.clone());
                }
            }
        }

        if alts == g.alternatives(&head) {
            continue;
        }

        out.productions.insert(head.clone(), alts);
        t.step(|| {
            Step::described(
                out.clone(),
                if inlined.is_empty() {
                    format!("Removed {head} → {head}")
                } else {
                    format!("Inlined {} into {head}", natural_list(&inlined))
                },
            )
        });
    }

    out
}

/// Base name for the non-terminal standing for `terminal`: its upper-case
/// form if it is a single lower-case letter, `T` otherwise
fn term_base(terminal: &str) -> String {
    let mut chars = terminal.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => c.to_ascii_uppercase().to_string(),
        _ => "T".to_owned(),
    }
}

/// Replace every terminal in an alternative of two or more tokens with a
/// non-terminal deriving just that terminal.  An existing non-terminal whose
/// only alternative is the terminal is reused; otherwise one is introduced
/// per distinct terminal.
pub fn term<R: Trace<Grammar>>(g: &Grammar, t: &mut R) -> Grammar {
    let _span = tracing::debug_span!("term").entered();
    let mut out = g.clone();

    let mut standing: IndexMap<String, String> = g
        .productions
        .iter()
        .filter(|(n, _)| g.start() != Some(n.as_str()))
        .filter_map(|(n, alts)| match alts.as_slice() {
            [alt] => match alt.as_slice() {
                [Token::Terminal(x)] => Some((x.clone(), n.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect();

    for head in heads(g) {
        let mut introduced = vec![];
        let mut alts = vec![];

        for alt in g.alternatives(&head) {
            if alt.len() < 2 {
                alts.push(alt.clone());
                continue;
            }

            let mut next = Vec::with_capacity(alt.len());
            for tok in alt {
                let Token::Terminal(x) = tok else {
                    next.push(tok.clone());
                    continue;
                };

                let nt = if let Some(nt) = standing.get(x) {
                    nt.clone()
                } else {
                    let nt = out.fresh_non_terminal(&term_base(x), false);
                    out.productions
                        .insert(nt.clone(), vec![vec![Token::Terminal(x.clone())]]);
                    standing.insert(x.clone(), nt.clone());
                    introduced.push(nt.clone());
                    nt
                };
                next.push(Token::NonTerminal(nt));
            }
            alts.push(next);
        }

        if alts == g.alternatives(&head) {
            continue;
        }

        out.productions.insert(head.clone(), alts);
        t.step(|| {
            Step::described(
                out.clone(),
                if introduced.is_empty() {
                    format!("Replaced the terminals in the alternatives of {head}")
                } else {
                    format!(
                        "Replaced the terminals in the alternatives of {head}, introducing {}",
                        natural_list(&introduced)
                    )
                },
            )
        });
    }

    out
}

/// Chomsky normal form: `term(unit(del(bin(g))))`, with every pass reporting
/// to the same sink
pub fn cnf<R: Trace<Grammar>>(g: &Grammar, t: &mut R) -> Grammar {
    let _span = tracing::debug_span!("cnf", productions = g.productions.len()).entered();
    let out = term(&inline_units(&del(&bin(g, t), t), false, t), t);
    tracing::debug!(productions = out.productions.len(), "Normalized grammar");
    out
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::{
        cfg::{
            grammar,
            syntax::parse,
            test::{ab, recognizes},
        },
        re::ab_string,
    };

    fn read(text: &str) -> Grammar { parse(text).unwrap() }

    #[test]
    fn bin_splits_right() {
        let mut steps = vec![];
        let out = bin(&read("S→abcd|ab"), &mut steps);
        assert_eq!(out.to_string(), "S→aS₁|ab\nS₁→bS₂\nS₂→cd\n");
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].description.as_deref(),
            Some("Split the long alternatives of S, introducing S₁ and S₂")
        );
    }

    #[test]
    fn del_expands_nullable() {
        let mut steps = vec![];
        let out = del(&read("S→ANA|b\nA→a|\nN→ε"), &mut steps);
        assert_eq!(out.to_string(), "S→AA|A|b|\nA→a\n");
        assert!(!out.non_terminals().contains("N"));

        let descs: Vec<_> = steps.iter().filter_map(|s| s.description.as_deref()).collect();
        assert_eq!(descs, [
            "Expanded the nullable A in the alternatives of S",
            "Removed ε from the alternatives of A",
            "Removed N, which only derives ε",
        ]);
    }

    #[test]
    fn del_keeps_nullable_start() {
        let out = del(&read("S→AS|\nA→a"), &mut ());
        assert_eq!(out.to_string(), "S→AS|A|\nA→a\n");
        assert_eq!(del(&ab(), &mut ()), ab());
    }

    #[test]
    fn unit_follows_chains() {
        let mut steps = vec![];
        let out = unit(&read("S→A|b\nA→B|a\nB→S|c"), &mut steps);
        assert_eq!(out.to_string(), "S→b|a|c\nA→a|b|c\nB→c|b|a\n");
        assert_eq!(
            steps[0].description.as_deref(),
            Some("Inlined A and B into S")
        );
        assert_eq!(
            unit(&read("S→S|a"), &mut ()).to_string(),
            "S→a\n"
        );
    }

    #[test]
    fn unit_keeps_inherited_empty() {
        let g = read("S→A|b\nA→ε");
        let out = unit(&g, &mut ());
        assert!(out.alternatives("S").contains(&vec![Token::Empty]));
        for s in ["", "b", "a"] {
            assert_eq!(recognizes(&out, s), recognizes(&g, s), "{s:?}");
        }

        let chained = read("S→aA|A\nA→B\nB→ε|b");
        let out = unit(&chained, &mut ());
        for s in ["", "a", "b", "ab", "ba"] {
            assert_eq!(recognizes(&out, s), recognizes(&chained, s), "{s:?}");
        }
    }

    #[test]
    fn term_reuses_symbols() {
        let out = term(&read("S→aB|a\nB→b\nX→ab"), &mut ());
        assert_eq!(out.to_string(), "S→AB|a\nB→b\nX→AB\nA→a\n");
    }

    #[test]
    fn chomsky() {
        let out = cnf(&read("S→aSb|ε"), &mut ());
        assert!(out.is_cnf());
        assert!(!read("S→aSb|ε").is_cnf());
        assert!(ab().is_cnf());

        for s in ["", "ab", "aabb"] {
            assert!(recognizes(&out, s), "{s:?}");
        }
        for s in ["a", "ba", "abab"] {
            assert!(!recognizes(&out, s), "{s:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn preserves_language(g in grammar(3, 3), inputs in prop::collection::vec(ab_string(4), 12)) {
            let mut steps = vec![];
            let n = cnf(&g, &mut steps);
            prop_assert!(n.is_cnf(), "{}", n);
            prop_assert_eq!(&cnf(&g, &mut ()), &n);

            for s in inputs {
                prop_assert_eq!(recognizes(&n, &s), recognizes(&g, &s), "{:?}\n{}\n{}", s, g, n);
            }
        }

        #[test]
        fn passes_preserve_language_alone(
            g in grammar(3, 3),
            inputs in prop::collection::vec(ab_string(4), 12),
        ) {
            let passes: [(&str, fn(&Grammar, &mut ()) -> Grammar); 4] = [
                ("bin", bin),
                ("del", del),
                ("unit", unit),
                ("term", term),
            ];

            for (name, pass) in passes {
                let out = pass(&g, &mut ());
                for s in inputs.iter().map(String::as_str).chain([""]) {
                    prop_assert_eq!(
                        recognizes(&out, s),
                        recognizes(&g, s),
                        "{} on {:?}\n{}\n{}",
                        name,
                        s,
                        g,
                        out
                    );
                }
            }
        }
    }
}
