//! Exact, deterministic algorithms over finite automata, regular expressions
//! and context-free grammars
//!
//! Every algorithm that a teaching front end may want to animate takes a
//! trailing [`Trace`](trace::Trace) sink.  Passing `&mut ()` runs it quietly;
//! passing a [`Vec<Step<T>>`](trace::Step) records every intermediate
//! snapshot.  The final result never depends on which sink was supplied.

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)] // TODO: document the cfg and automaton submodules

pub mod automaton;
pub mod cfg;
pub mod re;
pub mod symbol;
pub mod trace;
mod worklist;

pub use automaton::Automaton;
pub use cfg::Grammar;
pub use re::Regex;
