//! # lexgram
//!
//! A compiler course front-end toolkit built following the text
//! "Engineering a Compiler 2e" by Keith Cooper and Linda Torczan.
//!
//! This library provides functionality to:
//! - Convert regular expressions to postfix with the shunting yard algorithm
//! - Build NFAs from postfix expressions using Thompson construction
//! - Combine per-token NFAs into one tokenizer automaton
//! - Convert NFAs to DFAs using subset construction
//! - Minimize DFAs with the table-filling algorithm
//! - Scan input into a token stream with maximal munch
//! - Compute FIRST and FOLLOW sets of a context free grammar
//! - Visualize the automata state machines

// Re-export the modules
pub mod analyzer;
pub mod dfa;
pub mod fa;
pub mod grammar;
pub mod nfa;
pub mod regex;
pub mod scanner;
pub mod visualizer;

// Re-export commonly used items for convenience
pub use analyzer::StaticAnalyzer;
pub use dfa::{construct_dfa, construct_minimal_dfa};
pub use grammar::{read_grammar_file, Grammar, Production, Symbol, SymbolKind};
pub use nfa::construct_nfa;
pub use regex::{parse_microsyntax_list, read_microsyntax_file};
pub use scanner::{construct_scanner, Scanner, Token};
pub use visualizer::visualize;
