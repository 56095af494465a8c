//! Cocke-Younger-Kasami membership test

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use super::{Grammar, Token, normal::cnf};
use crate::{
    symbol::start_first,
    trace::{Step, Trace, natural_list},
};

/// The triangular CYK table.  Cell `(start, len)` holds the non-terminals
/// deriving the `len` input tokens beginning at `start`; a missing cell has
/// not been filled yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CykTable {
    input: Vec<String>,
    cells: BTreeMap<(usize, usize), BTreeSet<String>>,
}

impl CykTable {
    #[inline]
    #[must_use]
    pub fn input(&self) -> &[String] { &self.input }

    #[inline]
    #[must_use]
    pub fn get(&self, start: usize, len: usize) -> Option<&BTreeSet<String>> {
        self.cells.get(&(start, len))
    }

    /// The input tokens covered by a cell, concatenated
    #[must_use]
    pub fn substring(&self, start: usize, len: usize) -> String {
        self.input.iter().skip(start).take(len).map(String::as_str).collect()
    }

    /// Whether `non_terminal` derives the whole input
    #[must_use]
    pub fn derives(&self, non_terminal: &str) -> bool {
        self.get(0, self.input.len())
            .is_some_and(|c| c.contains(non_terminal))
    }

    /// Render the filled table as a LaTeX array, the longest spans on top and
    /// the input along the bottom.  Rows above `max_height` are left out.
    #[must_use]
    pub fn format_latex(&self, max_height: usize) -> String {
        let n = self.input.len();
        let mut out = String::from("\\begin{array}{c}\n");

        for len in (1..=max_height.min(n)).rev() {
            let row: Vec<String> = (0..=n - len)
                .map(|start| match self.get(start, len) {
                    Some(c) if !c.is_empty() => format!(
                        "\\{{{}\\}}",
                        c.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
                    ),
                    _ => "∅".to_owned(),
                })
                .collect();
            out.push_str(&format!("\t{} \\\\\n", row.join(" & ")));
        }

        let text: Vec<String> = self.input.iter().map(|c| format!("\\text{{{c}}}")).collect();
        out.push_str(&format!("\t\\hline\n\t{}\n\\end{{array}}", text.join(" & ")));
        out
    }
}

/// Rows of cells, longest spans first, then the input
impl fmt::Display for CykTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.input.len();

        for len in (1..=n).rev() {
            let row: Vec<String> = (0..=n - len)
                .map(|start| match self.get(start, len) {
                    Some(c) if !c.is_empty() => {
                        format!("{{{}}}", c.iter().map(String::as_str).collect::<Vec<_>>().join(","))
                    },
                    Some(_) => "∅".to_owned(),
                    None => "·".to_owned(),
                })
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }

        writeln!(f, "{}", self.input.join(" "))
    }
}

/// Split `input` into terminals, preferring the longest terminal that
/// matches at each position and falling back to single characters
pub(super) fn tokenize(g: &Grammar, input: &str) -> Vec<String> {
    let mut out = vec![];
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        let len = g
            .terminals()
            .iter()
            .filter(|t| !t.is_empty() && rest.starts_with(t.as_str()))
            .map(String::len)
            .max()
            .unwrap_or(c.len_utf8());

        out.push(rest[..len].to_owned());
        rest = &rest[len..];
    }

    out
}

/// Fill the CYK table of `input` for the Chomsky normal form of `g`.
///
/// The grammar is normalized quietly first.  Cells are filled bottom-up,
/// shortest spans first and left to right within a span length, with a
/// snapshot after each one.  The input is accepted iff the start symbol
/// ends up in the top cell; see [`CykTable::derives`].
pub fn cyk<R: Trace<CykTable>>(g: &Grammar, input: &str, t: &mut R) -> CykTable {
    let _span = tracing::debug_span!("cyk", input).entered();

    let g = cnf(g, &mut ());
    let mut table = CykTable {
        input: tokenize(&g, input),
        cells: BTreeMap::new(),
    };
    let n = table.input.len();

    let terminal_heads = |x: &str| -> BTreeSet<String> {
        g.productions()
            .iter()
            .filter(|(_, alts)| {
                alts.iter()
                    .any(|a| matches!(a.as_slice(), [Token::Terminal(y)] if y == x))
            })
            .map(|(h, _)| h.clone())
            .collect()
    };

    for len in 1..=n {
        for start in 0..=n - len {
            let cell = if len == 1 {
                terminal_heads(&table.input[start])
            } else {
                let mut cell = BTreeSet::new();

                for split in 1..len {
                    let (Some(lhs), Some(rhs)) =
                        (table.get(start, split), table.get(start + split, len - split))
                    else {
                        continue;
                    };

                    for (head, alts) in g.productions() {
                        let hit = alts.iter().any(|a| match a.as_slice() {
                            [Token::NonTerminal(b), Token::NonTerminal(c)] => {
                                lhs.contains(b) && rhs.contains(c)
                            },
                            _ => false,
                        });
                        if hit {
                            cell.insert(head.clone());
                        }
                    }
                }

                cell
            };

            tracing::trace!(start, len, found = cell.len(), "Filled cell");
            table.cells.insert((start, len), cell);

            t.step(|| {
                let cell = &table.cells[&(start, len)];
                let names = start_first(cell.iter().map(String::as_str), g.start());
                Step::described(
                    table.clone(),
                    format!(
                        "{}: {}",
                        table.substring(start, len),
                        if names.is_empty() {
                            "∅".to_owned()
                        } else {
                            natural_list(names)
                        }
                    ),
                )
            });
        }
    }

    tracing::debug!(accepted = g.start().is_some_and(|s| table.derives(s)), "Filled table");
    table
}
