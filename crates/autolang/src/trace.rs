//! Observed execution: sinks for intermediate snapshots of an algorithm

use std::fmt;

/// One intermediate state of an algorithm, with an optional human-readable
/// justification of how it was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<T> {
    pub snapshot: T,
    pub description: Option<String>,
}

impl<T> Step<T> {
    #[inline]
    #[must_use]
    pub fn new(snapshot: T) -> Self {
        Self {
            snapshot,
            description: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn described(snapshot: T, description: impl Into<String>) -> Self {
        Self {
            snapshot,
            description: Some(description.into()),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref desc) = self.description {
            writeln!(f, "{desc}")?;
        }

        write!(f, "{}", self.snapshot)
    }
}

/// Receiver for the snapshots emitted by an algorithm in observed mode.
///
/// Snapshots are produced lazily: a sink that does not observe never runs the
/// closure, so the quiet `()` sink costs nothing.  Every snapshot is an owned
/// copy, never a view into the algorithm's working state.
pub trait Trace<T> {
    fn step<F: FnOnce() -> Step<T>>(&mut self, f: F);
}

impl<T> Trace<T> for () {
    #[inline]
    fn step<F: FnOnce() -> Step<T>>(&mut self, _: F) {}
}

impl<T> Trace<T> for Vec<Step<T>> {
    #[inline]
    fn step<F: FnOnce() -> Step<T>>(&mut self, f: F) { self.push(f()); }
}

impl<T, R: Trace<T> + ?Sized> Trace<T> for &mut R {
    #[inline]
    fn step<F: FnOnce() -> Step<T>>(&mut self, f: F) { R::step(self, f); }
}

/// Adapter turning a `(snapshot, description)` callback into a [`Trace`]
pub struct FnTrace<F>(pub F);

impl<F> fmt::Debug for FnTrace<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("FnTrace(..)") }
}

impl<T, F: FnMut(T, Option<String>)> Trace<T> for FnTrace<F> {
    #[inline]
    fn step<G: FnOnce() -> Step<T>>(&mut self, f: G) {
        let Step {
            snapshot,
            description,
        } = f();
        (self.0)(snapshot, description);
    }
}

/// Join items as an English list: `a`, `a and b`, `a, b, and c`
#[must_use]
pub fn natural_list<I: IntoIterator<Item: fmt::Display>>(items: I) -> String {
    let items: Vec<_> = items.into_iter().map(|i| i.to_string()).collect();

    match items.as_slice() {
        [] => String::new(),
        [a] => a.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn count_to<R: Trace<u32>>(n: u32, t: &mut R) -> u32 {
        let mut acc = 0;
        for i in 1..=n {
            acc += i;
            t.step(|| Step::described(acc, format!("added {i}")));
        }
        acc
    }

    #[test]
    fn quiet_and_observed_agree() {
        let mut steps = vec![];
        assert_eq!(count_to(4, &mut ()), count_to(4, &mut steps));
        assert_eq!(
            steps.iter().map(|s| s.snapshot).collect::<Vec<_>>(),
            [1, 3, 6, 10]
        );
        assert_eq!(steps[2].description.as_deref(), Some("added 3"));
    }

    #[test]
    fn callback_sink() {
        let mut seen = vec![];
        count_to(2, &mut FnTrace(|s: u32, d: Option<String>| {
            seen.push((s, d.unwrap_or_default()));
        }));
        assert_eq!(seen, [(1, "added 1".to_owned()), (3, "added 2".to_owned())]);
    }

    #[test]
    fn lists() {
        assert_eq!(natural_list::<[&str; 0]>([]), "");
        assert_eq!(natural_list(["A"]), "A");
        assert_eq!(natural_list(["A", "B"]), "A and B");
        assert_eq!(natural_list(["A", "B", "C"]), "A, B, and C");
    }
}
