/* Context free grammar data model. Symbols compare by name and kind,
 * productions keep their declaration order, and the grammar validates its
 * own invariants at construction time. */

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

pub const EPSILON: &str = "ε";
pub const END_MARKER: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: String,
    kind: SymbolKind,
}

impl Symbol {
    pub fn terminal(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Terminal,
        }
    }

    pub fn non_terminal(name: &str) -> Self {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::NonTerminal,
        }
    }

    /// The reserved empty-string marker.
    pub fn epsilon() -> Self {
        Symbol::terminal(EPSILON)
    }

    /// The reserved end-of-input marker.
    pub fn end_marker() -> Self {
        Symbol::terminal(END_MARKER)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == SymbolKind::Terminal
    }

    pub fn is_non_terminal(&self) -> bool {
        self.kind == SymbolKind::NonTerminal
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    left: Symbol,
    right: Vec<Symbol>,
}

impl Production {
    pub fn new(left: Symbol, right: Vec<Symbol>) -> Self {
        Production { left, right }
    }

    pub fn get_left(&self) -> &Symbol {
        &self.left
    }

    pub fn get_right(&self) -> &Vec<Symbol> {
        &self.right
    }
}

#[derive(Debug)]
pub enum GrammarError {
    InvalidStartSymbolError(String),
    InvalidProductionError(String),
    UndeclaredSymbolError(String),
    MalformedProductionError(String),
    FileOpenError(String),
    FileReadError(String),
}

impl std::fmt::Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::InvalidStartSymbolError(name) => {
                write!(f, "Error: Start symbol {} is not a declared non-terminal", name)
            }
            GrammarError::InvalidProductionError(name) => write!(
                f,
                "Error: Production left-hand side {} is not a declared non-terminal",
                name
            ),
            GrammarError::UndeclaredSymbolError(name) => write!(
                f,
                "Error: Symbol {} is neither a declared terminal nor a non-terminal",
                name
            ),
            GrammarError::MalformedProductionError(line) => {
                write!(f, "Error: Malformed production detected: {}", line)
            }
            GrammarError::FileOpenError(err_line) => write!(f, "{}", err_line),
            GrammarError::FileReadError(err_line) => write!(f, "{}", err_line),
        }
    }
}

impl std::error::Error for GrammarError {}

#[derive(Debug, Clone)]
pub struct Grammar {
    productions: Vec<Production>,
    terminals: HashSet<Symbol>,
    non_terminals: HashSet<Symbol>,
    start_symbol: Symbol,
}

impl Grammar {
    /// Validates the grammar invariants: the start symbol and every
    /// production left must be declared non-terminals, and every symbol on
    /// a right-hand side must be declared or be the ε marker.
    pub fn new(
        productions: Vec<Production>,
        terminals: HashSet<Symbol>,
        non_terminals: HashSet<Symbol>,
        start_symbol: Symbol,
    ) -> Result<Self, GrammarError> {
        if !start_symbol.is_non_terminal() || !non_terminals.contains(&start_symbol) {
            return Err(GrammarError::InvalidStartSymbolError(
                start_symbol.get_name().to_string(),
            ));
        }

        let epsilon = Symbol::epsilon();

        for production in &productions {
            let left = production.get_left();
            if !left.is_non_terminal() || !non_terminals.contains(left) {
                return Err(GrammarError::InvalidProductionError(
                    left.get_name().to_string(),
                ));
            }

            for symbol in production.get_right() {
                if *symbol == epsilon {
                    continue;
                }
                if !terminals.contains(symbol) && !non_terminals.contains(symbol) {
                    return Err(GrammarError::UndeclaredSymbolError(
                        symbol.get_name().to_string(),
                    ));
                }
            }
        }

        Ok(Grammar {
            productions,
            terminals,
            non_terminals,
            start_symbol,
        })
    }

    pub fn get_productions(&self) -> &Vec<Production> {
        &self.productions
    }

    pub fn get_terminals(&self) -> &HashSet<Symbol> {
        &self.terminals
    }

    pub fn get_non_terminals(&self) -> &HashSet<Symbol> {
        &self.non_terminals
    }

    pub fn get_start_symbol(&self) -> &Symbol {
        &self.start_symbol
    }
}

/// Parse a grammar file with one `A -> X Y | Z` rule per line. Left-hand
/// sides become the non-terminal set, the first rule's left-hand side is
/// the start symbol, every other symbol is a terminal and `ε` denotes the
/// empty production.
pub fn read_grammar_file(file_path: &str) -> Result<Grammar, GrammarError> {
    let file_path = PathBuf::from(file_path);

    let file = File::open(file_path);
    let file = match file {
        Ok(file) => file,
        Err(error) => {
            let err_line = format!("Error: Failed to open the grammar file {}", error);
            return Err(GrammarError::FileOpenError(err_line));
        }
    };
    let reader = BufReader::new(file);

    let mut rules: Vec<(String, Vec<Vec<String>>)> = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                let err_line = format!(
                    "Error: Failed to read line number {} in grammar file {}",
                    line_number, error
                );
                return Err(GrammarError::FileReadError(err_line));
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let content: Vec<&str> = line.split("->").collect();
        if content.len() != 2 {
            return Err(GrammarError::MalformedProductionError(line.to_string()));
        }

        let left = content[0].trim();
        if left.is_empty() {
            return Err(GrammarError::MalformedProductionError(line.to_string()));
        }

        let mut alternatives: Vec<Vec<String>> = Vec::new();
        for alternative in content[1].split('|') {
            let symbols: Vec<String> = alternative
                .split_whitespace()
                .map(|name| name.to_string())
                .collect();
            if symbols.is_empty() {
                return Err(GrammarError::MalformedProductionError(line.to_string()));
            }
            alternatives.push(symbols);
        }

        rules.push((left.to_string(), alternatives));
    }

    if rules.is_empty() {
        return Err(GrammarError::MalformedProductionError(
            "grammar file contains no productions".to_string(),
        ));
    }

    let non_terminal_names: HashSet<String> =
        rules.iter().map(|(left, _)| left.clone()).collect();

    let mut productions: Vec<Production> = Vec::new();
    let mut terminals: HashSet<Symbol> = HashSet::new();
    let mut non_terminals: HashSet<Symbol> = HashSet::new();

    for name in &non_terminal_names {
        non_terminals.insert(Symbol::non_terminal(name));
    }

    for (left_name, alternatives) in &rules {
        let left = Symbol::non_terminal(left_name);
        for alternative in alternatives {
            let mut right: Vec<Symbol> = Vec::new();
            for name in alternative {
                let symbol = if name == EPSILON {
                    Symbol::epsilon()
                } else if non_terminal_names.contains(name) {
                    Symbol::non_terminal(name)
                } else {
                    let terminal = Symbol::terminal(name);
                    terminals.insert(terminal.clone());
                    terminal
                };
                right.push(symbol);
            }
            productions.push(Production::new(left.clone(), right));
        }
    }

    let start_symbol = Symbol::non_terminal(&rules[0].0);

    Grammar::new(productions, terminals, non_terminals, start_symbol)
}
