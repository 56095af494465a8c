#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

fn main() { entry::main(); }

mod entry {
    use std::{
        fmt, fs,
        path::{Path, PathBuf},
    };

    use anyhow::{Context, Result};
    use autolang::{
        Automaton, Grammar, Regex,
        automaton::{
            equivalence, minimize,
            product::{product, sum},
            subset::subset_construction,
            table::parse_table,
        },
        cfg::{cyk::cyk, normal::cnf, parse::parse, syntax},
        re::{eliminate::extract, nfa_builder::synthesize},
        trace::{Step, Trace},
    };
    use clap::{Parser, Subcommand};
    use tracing_subscriber::{filter::LevelFilter, prelude::*};

    #[derive(Debug, Parser)]
    #[command(version, author, about)]
    struct Opts {
        /// Print more verbose logs
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,

        /// Print every intermediate step before the result
        #[arg(long, global = true)]
        steps: bool,

        #[command(subcommand)]
        cmd: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Convert an NFA or ε-NFA transition table to a DFA
        Determinize { file: PathBuf },
        /// Minimise an automaton, determinizing it first if needed
        Minimize { file: PathBuf },
        /// Intersect two complete DFAs
        Product { lhs: PathBuf, rhs: PathBuf },
        /// Union two complete DFAs
        Sum { lhs: PathBuf, rhs: PathBuf },
        /// Check whether two DFAs accept the same language
        Equivalent { lhs: PathBuf, rhs: PathBuf },
        /// Convert an automaton to a regular expression
        ToRegex { file: PathBuf },
        /// Build an ε-NFA from a regular expression
        FromRegex { regex: String },
        /// Check whether a regular expression matches an input
        MatchRegex { regex: String, input: String },
        /// Convert a grammar to Chomsky normal form
        Cnf {
            file: PathBuf,

            /// Output format
            #[arg(long, default_value = "utf8")]
            format: Format,
        },
        /// Print the CYK table of an input
        Cyk {
            file: PathBuf,
            input: String,

            /// Leave out rows for spans longer than this
            #[arg(long)]
            max_height: Option<usize>,
        },
        /// Print a parse tree of an input
        Parse { file: PathBuf, input: String },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
    enum Format {
        Utf8,
        Latex,
    }

    /// Prints each step as it arrives, or nothing if disabled
    #[derive(Debug, Clone, Copy)]
    struct Printer {
        enabled: bool,
        count: usize,
    }

    impl<T: fmt::Display> Trace<T> for Printer {
        fn step<F: FnOnce() -> Step<T>>(&mut self, f: F) {
            if self.enabled {
                self.count += 1;
                println!("# Step {}\n{}\n", self.count, f());
            }
        }
    }

    #[inline]
    pub fn main() {
        let opts = Opts::parse();

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(match (cfg!(debug_assertions), opts.verbose) {
                (false, 0) => LevelFilter::INFO,
                (false, 1) | (true, 0) => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            })
            .init();

        tracing::debug!("{opts:#?}");

        std::process::exit(run(opts).map_or_else(
            |e| {
                tracing::error!("{e:?}");
                1
            },
            |()| 0,
        ));
    }

    fn read(path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("Error reading {}", path.display()))
    }

    fn read_table(path: &Path) -> Result<Automaton> {
        parse_table(&read(path)?)
            .with_context(|| format!("Error parsing transition table {}", path.display()))
    }

    fn read_grammar(path: &Path) -> Result<Grammar> {
        syntax::parse(&read(path)?)
            .with_context(|| format!("Error parsing grammar {}", path.display()))
    }

    fn read_regex(text: &str) -> Result<Regex> {
        text.parse()
            .with_context(|| format!("Error parsing regular expression {text:?}"))
    }

    #[inline]
    fn run(
        Opts {
            verbose: _,
            steps,
            cmd,
        }: Opts,
    ) -> Result<()> {
        let mut t = Printer {
            enabled: steps,
            count: 0,
        };

        match cmd {
            Command::Determinize { file } => {
                let dfa = subset_construction(&read_table(&file)?, &mut t)
                    .context("Error determinizing automaton")?;
                println!("{dfa}");
            },
            Command::Minimize { file } => {
                let mut a = read_table(&file)?;
                if !a.is_dfa() {
                    a = subset_construction(&a, &mut t).context("Error determinizing automaton")?;
                }

                let min = minimize::minimise(&a, &mut t).context("Error minimising automaton")?;
                println!("{min}");
            },
            Command::Product { lhs, rhs } => {
                let out = product(&read_table(&lhs)?, &read_table(&rhs)?, &mut t)
                    .context("Error intersecting automata")?;
                println!("{out}");
            },
            Command::Sum { lhs, rhs } => {
                let out = sum(&read_table(&lhs)?, &read_table(&rhs)?, &mut t)
                    .context("Error joining automata")?;
                println!("{out}");
            },
            Command::Equivalent { lhs, rhs } => {
                let (a, b) = (read_table(&lhs)?, read_table(&rhs)?);
                if steps {
                    let table = equivalence::cross_equivalence_table(&a, &b, &mut t)
                        .context("Error comparing automata")?;
                    println!("{table}");
                }

                let eq = equivalence::equivalent(&a, &b).context("Error comparing automata")?;
                println!("{eq}");
            },
            Command::ToRegex { file } => {
                let re = extract(&read_table(&file)?, &mut t)
                    .context("Error extracting regular expression")?;
                println!("{}", re.unwrap_or(Regex::Empty));
            },
            Command::FromRegex { regex } => {
                let nfa = synthesize(&read_regex(&regex)?, &mut t);
                println!("{nfa}");
            },
            Command::MatchRegex { regex, input } => {
                println!("{}", read_regex(&regex)?.test(&input));
            },
            Command::Cnf { file, format } => {
                let g = cnf(&read_grammar(&file)?, &mut t);
                match format {
                    Format::Utf8 => print!("{g}"),
                    Format::Latex => println!("{}", g.format_latex()),
                }
            },
            Command::Cyk {
                file,
                input,
                max_height,
            } => {
                let g = read_grammar(&file)?;
                let table = cyk(&g, &input, &mut t);
                let accepted = g.start().is_some_and(|s| table.derives(s));
                tracing::info!(accepted, "Filled CYK table");

                println!(
                    "{}",
                    table.format_latex(max_height.unwrap_or(table.input().len()))
                );
            },
            Command::Parse { file, input } => {
                let g = read_grammar(&file)?;
                let tree = parse(&g, &input)
                    .with_context(|| format!("{input:?} is not in the language of the grammar"))?;
                println!("{tree}");
            },
        }

        Ok(())
    }
}
