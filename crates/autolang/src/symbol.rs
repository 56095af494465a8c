//! Fresh state and non-terminal names, and the start-first display order

use std::{cmp::Ordering, mem};

/// Distance from an ASCII digit to its Unicode subscript (`'0'` → `'₀'`)
const SUBSCRIPT_OFFSET: u32 = 0x2050;

#[inline]
pub(crate) fn is_subscript(c: char) -> bool { ('₀'..='₉').contains(&c) }

/// Render `n` as subscript digits
#[must_use]
pub fn subscript(n: u64) -> String {
    n.to_string()
        .chars()
        .filter_map(|c| char::from_u32(u32::from(c) + SUBSCRIPT_OFFSET))
        .collect()
}

/// Append the subscript rendering of `n` to `prefix`, e.g. `("s", 12)` → `s₁₂`
#[must_use]
pub fn generate(prefix: &str, n: u64) -> String {
    let mut s = String::from(prefix);
    s.push_str(&subscript(n));
    s
}

/// Split a name into its prefix and trailing subscript number, if it has one
#[must_use]
pub fn read_number(symbol: &str) -> Option<(&str, u64)> {
    let prefix = symbol.trim_end_matches(is_subscript);
    let digits = &symbol[prefix.len()..];

    if digits.is_empty() {
        return None;
    }

    let n = digits
        .chars()
        .filter_map(|c| char::from_u32(u32::from(c) - SUBSCRIPT_OFFSET))
        .collect::<String>()
        .parse()
        .ok()?;

    Some((prefix, n))
}

/// Find the next name after `symbol` in its subscript sequence for which
/// `is_available` holds.
///
/// `A` counts up to `A₁`, `A₁` to `A₂`, and so on.
pub fn count_up(symbol: &str, mut is_available: impl FnMut(&str) -> bool) -> String {
    let (prefix, mut n) = read_number(symbol).unwrap_or((symbol, 0));

    loop {
        n += 1;
        let name = generate(prefix, n);
        if is_available(&name) {
            break name;
        }
    }
}

/// Return `symbol` itself if it is available, otherwise count it up
pub fn fresh_or_self(symbol: &str, mut is_available: impl FnMut(&str) -> bool) -> String {
    if is_available(symbol) {
        symbol.to_owned()
    } else {
        count_up(symbol, is_available)
    }
}

/// Monotonic name supply: `prefix₀`, `prefix₁`, … with no reuse
#[derive(Debug)]
pub struct Free {
    prefix: String,
    next: u64,
}

impl Free {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    #[must_use]
    pub fn fresh(&mut self) -> String {
        let n = self.next + 1;
        generate(&self.prefix, mem::replace(&mut self.next, n))
    }
}

/// Total order placing `start` before everything else, then lexicographic
#[must_use]
pub fn cmp_start_first(start: Option<&str>, lhs: &str, rhs: &str) -> Ordering {
    match (Some(lhs) == start, Some(rhs) == start) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => lhs.cmp(rhs),
    }
}

/// Sort `symbols` so that `start` (if present) comes first
#[must_use]
pub fn start_first<'a, I: IntoIterator<Item = &'a str>>(
    symbols: I,
    start: Option<&str>,
) -> Vec<&'a str> {
    let mut v: Vec<_> = symbols.into_iter().collect();
    v.sort_by(|l, r| cmp_start_first(start, l, r));
    v
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn subscripts() {
        assert_eq!(generate("s", 0), "s₀");
        assert_eq!(generate("q", 105), "q₁₀₅");
        assert_eq!(read_number("q₁₀₅"), Some(("q", 105)));
        assert_eq!(read_number("q"), None);
        assert_eq!(read_number("₇"), Some(("", 7)));
    }

    #[test]
    fn counting_up() {
        assert_eq!(count_up("A", |_| true), "A₁");
        assert_eq!(count_up("A₁", |_| true), "A₂");
        assert_eq!(count_up("A", |s| s != "A₁" && s != "A₂"), "A₃");
        assert_eq!(fresh_or_self("B", |_| true), "B");
        assert_eq!(fresh_or_self("B", |s| s != "B"), "B₁");
    }

    #[test]
    fn free_never_repeats() {
        let mut free = Free::new("s");
        let names: Vec<_> = (0..12).map(|_| free.fresh()).collect();
        assert_eq!(names[0], "s₀");
        assert_eq!(names[11], "s₁₁");
        let mut dedup = names.clone();
        dedup.dedup();
        assert_eq!(dedup, names);
    }

    #[test]
    fn start_sorts_first() {
        assert_eq!(start_first(["B", "S", "A"], Some("S")), ["S", "A", "B"]);
        assert_eq!(start_first(["B", "S", "A"], None), ["A", "B", "S"]);
    }
}
