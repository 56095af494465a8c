//! Algebraic simplification of regular expressions
//!
//! Rules, each applied at a node after its children have been rewritten:
//!
//! ```text
//! ∅e = e∅ = ∅          εe = eε = e          (e₁e₂)e₃ = e₁(e₂e₃)
//! e*e = ee*            (e₁*e₂)*e₁* = (e₁ + e₂)*       (e₁e₂)*e₁ = e₁(e₂e₁)*
//! ∅ + e = e            e + e = e            ε + e* = ε + ee* = e*
//! e₁e₂ + e₁e₃ = e₁(e₂ + e₃)                 e₁e₃ + e₂e₃ = (e₁ + e₂)e₃
//! ∅* = ε* = ε          (e*)* = e*           (ε + e)* = e*
//! (e₁*e₂*)* = (e₁ + e₂)*
//! ```
//!
//! Sequences are kept right-nested and alternatives flattened and
//! left-nested.  The two factoring rules cover the common prefix or suffix
//! of the flattened sequences, so `e₁ + e₂e₁` becomes `(ε + e₂)e₁`.

use super::Regex;

/// Upper bound on whole-tree rewrite passes.  Every rule shrinks the tree or
/// moves a star rightwards, so this is never reached in practice.
const MAX_PASSES: usize = 256;

impl Regex {
    /// Rewrite with the identities listed in this module until none applies.
    ///
    /// The result describes the same language and simplifying it again
    /// returns an equal expression.  It is not a canonical form: two
    /// expressions for the same language may simplify differently.
    #[must_use]
    pub fn simplify(&self) -> Self {
        let mut cur = once(self);

        for _ in 0..MAX_PASSES {
            let next = once(&cur);
            if next == cur {
                break;
            }
            cur = next;
        }

        cur
    }
}

/// One bottom-up pass: rewrite the children, then try the rules at this node
fn once(e: &Regex) -> Regex {
    match e {
        Regex::Empty | Regex::Nil | Regex::Symbol(_) | Regex::Reference(_) => e.clone(),
        Regex::Sequence(l, r) => sequence(once(l), once(r)),
        Regex::Alternative(l, r) => alternative(once(l), once(r)),
        Regex::Star(inner) => star(once(inner)),
    }
}

/// Split off the first operand of a right-nested sequence
fn split_head(e: &Regex) -> (&Regex, Option<&Regex>) {
    match e {
        Regex::Sequence(h, t) => (&**h, Some(&**t)),
        e => (e, None),
    }
}

fn cat(head: Regex, mid: Regex, tail: Option<&Regex>) -> Regex {
    Regex::seq(head, match tail {
        Some(t) => Regex::seq(mid, t.clone()),
        None => mid,
    })
}

fn sequence(lhs: Regex, rhs: Regex) -> Regex {
    match (lhs, rhs) {
        (Regex::Empty, _) | (_, Regex::Empty) => Regex::Empty,
        (Regex::Nil, e) | (e, Regex::Nil) => e,
        (Regex::Sequence(a, b), r) => Regex::seq(*a, Regex::seq(*b, r)),
        (Regex::Star(x), r) => {
            let (head, tail) = split_head(&r);

            if *x == *head {
                return cat(head.clone(), Regex::Star(x), tail);
            }

            if let Regex::Sequence(..) = *x {
                let flat = x.sequence();
                if let Some((&first, rest)) = flat.split_first()
                    && first == head
                {
                    let rest = rest.iter().map(|&e| e.clone());

                    return if let Regex::Star(h) = head {
                        let merged = Regex::alt((**h).clone(), Regex::cat_all(rest)).star();
                        match tail {
                            Some(t) => Regex::seq(merged, t.clone()),
                            None => merged,
                        }
                    } else {
                        let rotated = Regex::cat_all(rest.chain([head.clone()])).star();
                        cat(head.clone(), rotated, tail)
                    };
                }
            }

            Regex::seq(Regex::Star(x), r)
        },
        (l, r) => Regex::seq(l, r),
    }
}

/// `ee*`, the operand of `ε + ee*`
fn plus_operand(e: &Regex) -> Option<&Regex> {
    match e {
        Regex::Sequence(h, t) => match &**t {
            Regex::Star(x) if **x == **h => Some(&**h),
            _ => None,
        },
        _ => None,
    }
}

fn alternative(lhs: Regex, rhs: Regex) -> Regex {
    let mut ops: Vec<Regex> = vec![];
    for op in lhs.alternatives().into_iter().chain(rhs.alternatives()) {
        if *op != Regex::Empty && !ops.contains(op) {
            ops.push(op.clone());
        }
    }

    if ops.contains(&Regex::Nil) {
        if ops.iter().any(|e| matches!(e, Regex::Star(_))) {
            ops.retain(|e| *e != Regex::Nil);
        } else if let Some((i, inner)) = ops
            .iter()
            .enumerate()
            .find_map(|(i, e)| plus_operand(e).map(|h| (i, h.clone())))
        {
            ops[i] = inner.star();
            ops.retain(|e| *e != Regex::Nil);
        }
    }

    if let [l, r] = ops.as_slice()
        && let Some(factored) = factor(l, r)
    {
        return factored;
    }

    if ops.len() == 1 {
        ops.pop().unwrap_or(Regex::Empty)
    } else {
        Regex::alt_all(ops)
    }
}

fn owned<'a, I: IntoIterator<Item = &'a &'a Regex>>(it: I) -> Vec<Regex> {
    it.into_iter().map(|&e| e.clone()).collect()
}

/// Pull out the longest common prefix, or failing that the longest common
/// suffix, of two flattened sequences
fn factor(lhs: &Regex, rhs: &Regex) -> Option<Regex> {
    let lf = lhs.sequence();
    let rf = rhs.sequence();

    let prefix = lf.iter().zip(&rf).take_while(|(l, r)| l == r).count();
    if prefix > 0 {
        let rest = Regex::alt(
            Regex::cat_all(owned(&lf[prefix..])),
            Regex::cat_all(owned(&rf[prefix..])),
        );
        return Some(Regex::cat_all(
            owned(&lf[..prefix]).into_iter().chain([rest]),
        ));
    }

    let suffix = lf
        .iter()
        .rev()
        .zip(rf.iter().rev())
        .take_while(|(l, r)| l == r)
        .count();
    if suffix > 0 {
        let (lp, ls) = lf.split_at(lf.len() - suffix);
        let rp = &rf[..rf.len() - suffix];
        let rest = Regex::alt(Regex::cat_all(owned(lp)), Regex::cat_all(owned(rp)));
        return Some(Regex::cat_all([rest].into_iter().chain(owned(ls))));
    }

    None
}

fn star(inner: Regex) -> Regex {
    match inner {
        Regex::Empty | Regex::Nil => Regex::Nil,
        Regex::Star(_) => inner,
        Regex::Alternative(..) if inner.alternatives().contains(&&Regex::Nil) => Regex::alt_all(
            inner
                .alternatives()
                .into_iter()
                .filter(|&e| *e != Regex::Nil)
                .cloned(),
        )
        .star(),
        Regex::Sequence(..) if inner.sequence().iter().all(|e| matches!(e, Regex::Star(_))) => {
            Regex::alt_all(inner.sequence().into_iter().map(|e| match e {
                Regex::Star(x) => (**x).clone(),
                e => e.clone(),
            }))
            .star()
        },
        e => e.star(),
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use crate::re::{ab_string, re, syntax::parse};

    fn same(a: &str, b: &str) {
        let sa = parse(a).unwrap().simplify();
        let sb = parse(b).unwrap().simplify();
        assert_eq!(sa, sb, "simplified: {sa} and {sb}");
    }

    #[test]
    fn alternative_rules() {
        same("∅ + e", "e");
        same("e + ∅", "e");
        same("e + e", "e");
        same("ε + e*", "e*");
        same("e* + ε", "e*");
        same("ε + ee*", "e*");
        same("e₁ + e₂e₁", "(ε + e₂)e₁");
        same("e₁ + e₂ + e₁", "e₁ + e₂");
        same("R + (S + T)", "(R + S) + T");
        same("RS + RT", "R(S + T)");
        same("RT + ST", "(R + S)T");
    }

    #[test]
    fn sequence_rules() {
        same("∅e", "∅");
        same("e∅", "∅");
        same("εe", "e");
        same("eε", "e");
        same("e*e", "ee*");
        same("R(ST)", "(RS)T");
        same("(R*S)*R*", "(R + S)*");
        same("(RST)*R", "R(STR)*");
    }

    #[test]
    fn star_rules() {
        same("∅*", "ε");
        same("ε*", "ε");
        same("(R*)*", "R*");
        same("(ε + R)*", "R*");
        same("(R*S*)*", "(R + S)*");
    }

    #[test]
    fn display_forms() {
        assert_eq!(parse("(RST)*R").unwrap().simplify().to_string(), "R(STR)*");
        assert_eq!(parse("a + ab").unwrap().simplify().to_string(), "a(ε + b)");
        assert_eq!(parse("(a + b)(a + b)*").unwrap().simplify().to_string(), "(a + b)(a + b)*");
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

        #[test]
        fn sound_and_idempotent(e in re(4, 24), inputs in prop::collection::vec(ab_string(5), 16)) {
            let s = e.simplify();
            prop_assert_eq!(s.simplify(), s.clone());

            for i in inputs {
                prop_assert_eq!(s.test(&i), e.test(&i), "{} vs {} on {:?}", s, e, i);
            }
        }
    }
}
