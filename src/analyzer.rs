/* FIRST and FOLLOW set computation over a context free grammar. Both sets
 * are grown to a fixed point; a pass terminates the iteration only when no
 * insertion anywhere in the pass changed a set, so the change flag is
 * OR-accumulated across every insertion. */

use std::collections::{HashMap, HashSet};

use crate::grammar::{Grammar, Symbol};

#[derive(Debug)]
pub struct StaticAnalyzer {
    grammar: Grammar,
    first_sets: Option<HashMap<Symbol, HashSet<Symbol>>>,
    follow_sets: Option<HashMap<Symbol, HashSet<Symbol>>>,
}

impl StaticAnalyzer {
    pub fn new(grammar: Grammar) -> Self {
        StaticAnalyzer {
            grammar,
            first_sets: None,
            follow_sets: None,
        }
    }

    pub fn get_grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// FIRST sets for every grammar symbol, computed once and cached.
    /// Terminals map to themselves, ε maps to {ε}, and non-terminal sets
    /// are grown production by production until nothing changes.
    pub fn get_first_sets(&mut self) -> &HashMap<Symbol, HashSet<Symbol>> {
        if self.first_sets.is_none() {
            let sets = self.compute_first_sets();
            self.first_sets = Some(sets);
        }
        match &self.first_sets {
            Some(sets) => sets,
            None => panic!("FIRST sets missing after computation"),
        }
    }

    /// FOLLOW sets for every non-terminal, computed once and cached.
    pub fn get_follow_sets(&mut self) -> &HashMap<Symbol, HashSet<Symbol>> {
        if self.follow_sets.is_none() {
            let first_sets = self.get_first_sets().clone();
            let sets = self.compute_follow_sets(&first_sets);
            self.follow_sets = Some(sets);
        }
        match &self.follow_sets {
            Some(sets) => sets,
            None => panic!("FOLLOW sets missing after computation"),
        }
    }

    fn compute_first_sets(&self) -> HashMap<Symbol, HashSet<Symbol>> {
        let epsilon = Symbol::epsilon();
        let mut first: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();

        for terminal in self.grammar.get_terminals() {
            first.insert(terminal.clone(), [terminal.clone()].into_iter().collect());
        }
        first.insert(epsilon.clone(), [epsilon.clone()].into_iter().collect());
        for non_terminal in self.grammar.get_non_terminals() {
            first.insert(non_terminal.clone(), HashSet::new());
        }

        let mut changed = true;
        while changed {
            changed = false;

            for production in self.grammar.get_productions() {
                let left = production.get_left();
                let mut all_epsilon = true;

                for symbol in production.get_right() {
                    let symbol_first = match first.get(symbol) {
                        Some(set) => set.clone(),
                        None => panic!("Symbol {} has no FIRST entry", symbol),
                    };
                    let has_epsilon = symbol_first.contains(&epsilon);

                    let left_first = first.entry(left.clone()).or_default();
                    for candidate in symbol_first {
                        if candidate != epsilon {
                            changed |= left_first.insert(candidate);
                        }
                    }

                    if !has_epsilon {
                        all_epsilon = false;
                        break;
                    }
                }

                if all_epsilon {
                    let left_first = first.entry(left.clone()).or_default();
                    changed |= left_first.insert(epsilon.clone());
                }
            }
        }

        first
    }

    fn compute_follow_sets(
        &self,
        first: &HashMap<Symbol, HashSet<Symbol>>,
    ) -> HashMap<Symbol, HashSet<Symbol>> {
        let epsilon = Symbol::epsilon();
        let mut follow: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();

        for non_terminal in self.grammar.get_non_terminals() {
            follow.insert(non_terminal.clone(), HashSet::new());
        }
        follow
            .entry(self.grammar.get_start_symbol().clone())
            .or_default()
            .insert(Symbol::end_marker());

        let mut changed = true;
        while changed {
            changed = false;

            for production in self.grammar.get_productions() {
                let left = production.get_left();
                let right = production.get_right();

                for (position, symbol) in right.iter().enumerate() {
                    if !symbol.is_non_terminal() {
                        continue;
                    }

                    // FIRST of the trailer that follows this occurrence
                    let mut trailer_vanishes = true;
                    for next_symbol in &right[position + 1..] {
                        let next_first = match first.get(next_symbol) {
                            Some(set) => set.clone(),
                            None => panic!("Symbol {} has no FIRST entry", next_symbol),
                        };
                        let has_epsilon = next_first.contains(&epsilon);

                        let follow_set = follow.entry(symbol.clone()).or_default();
                        for candidate in next_first {
                            if candidate != epsilon {
                                changed |= follow_set.insert(candidate);
                            }
                        }

                        if !has_epsilon {
                            trailer_vanishes = false;
                            break;
                        }
                    }

                    if trailer_vanishes {
                        let left_follow = match follow.get(left) {
                            Some(set) => set.clone(),
                            None => panic!("Non-terminal {} has no FOLLOW entry", left),
                        };
                        let follow_set = follow.entry(symbol.clone()).or_default();
                        for candidate in left_follow {
                            changed |= follow_set.insert(candidate);
                        }
                    }
                }
            }
        }

        follow
    }
}

#[cfg(test)]
mod analyzer_tests {
    use super::*;
    use crate::grammar::Production;

    fn terminal_set(names: &[&str]) -> HashSet<Symbol> {
        names.iter().map(|name| Symbol::terminal(name)).collect()
    }

    fn expected_set(names: &[&str]) -> HashSet<Symbol> {
        names
            .iter()
            .map(|&name| {
                if name == "ε" {
                    Symbol::epsilon()
                } else if name == "$" {
                    Symbol::end_marker()
                } else {
                    Symbol::terminal(name)
                }
            })
            .collect()
    }

    /// E -> T E'; E' -> + T E' | ε; T -> F T'; T' -> * F T' | ε;
    /// F -> ( E ) | id
    fn expression_grammar() -> Grammar {
        let e = Symbol::non_terminal("E");
        let ep = Symbol::non_terminal("E'");
        let t = Symbol::non_terminal("T");
        let tp = Symbol::non_terminal("T'");
        let f = Symbol::non_terminal("F");

        let plus = Symbol::terminal("+");
        let star = Symbol::terminal("*");
        let lparen = Symbol::terminal("(");
        let rparen = Symbol::terminal(")");
        let id = Symbol::terminal("id");

        let productions = vec![
            Production::new(e.clone(), vec![t.clone(), ep.clone()]),
            Production::new(ep.clone(), vec![plus.clone(), t.clone(), ep.clone()]),
            Production::new(ep.clone(), vec![Symbol::epsilon()]),
            Production::new(t.clone(), vec![f.clone(), tp.clone()]),
            Production::new(tp.clone(), vec![star.clone(), f.clone(), tp.clone()]),
            Production::new(tp.clone(), vec![Symbol::epsilon()]),
            Production::new(f.clone(), vec![lparen.clone(), e.clone(), rparen.clone()]),
            Production::new(f.clone(), vec![id.clone()]),
        ];

        let terminals = terminal_set(&["+", "*", "(", ")", "id"]);
        let non_terminals: HashSet<Symbol> =
            [e.clone(), ep, t, tp, f].into_iter().collect();

        Grammar::new(productions, terminals, non_terminals, e).unwrap()
    }

    #[test]
    fn test_first_sets_expression_grammar() {
        let mut analyzer = StaticAnalyzer::new(expression_grammar());
        let first = analyzer.get_first_sets();

        assert_eq!(
            first[&Symbol::non_terminal("E")],
            expected_set(&["(", "id"])
        );
        assert_eq!(
            first[&Symbol::non_terminal("T")],
            expected_set(&["(", "id"])
        );
        assert_eq!(
            first[&Symbol::non_terminal("F")],
            expected_set(&["(", "id"])
        );
        assert_eq!(
            first[&Symbol::non_terminal("E'")],
            expected_set(&["+", "ε"])
        );
        assert_eq!(
            first[&Symbol::non_terminal("T'")],
            expected_set(&["*", "ε"])
        );
    }

    #[test]
    fn test_first_sets_terminals_map_to_themselves() {
        let mut analyzer = StaticAnalyzer::new(expression_grammar());
        let first = analyzer.get_first_sets();

        assert_eq!(first[&Symbol::terminal("id")], expected_set(&["id"]));
        assert_eq!(first[&Symbol::epsilon()], expected_set(&["ε"]));
    }

    #[test]
    fn test_follow_sets_expression_grammar() {
        let mut analyzer = StaticAnalyzer::new(expression_grammar());
        let follow = analyzer.get_follow_sets();

        assert_eq!(
            follow[&Symbol::non_terminal("E")],
            expected_set(&[")", "$"])
        );
        assert_eq!(
            follow[&Symbol::non_terminal("E'")],
            expected_set(&[")", "$"])
        );
        assert_eq!(
            follow[&Symbol::non_terminal("T")],
            expected_set(&["+", ")", "$"])
        );
        assert_eq!(
            follow[&Symbol::non_terminal("T'")],
            expected_set(&["+", ")", "$"])
        );
        assert_eq!(
            follow[&Symbol::non_terminal("F")],
            expected_set(&["*", "+", ")", "$"])
        );
    }

    #[test]
    fn test_epsilon_production_grammar() {
        // A -> B a; B -> b | ε
        let a = Symbol::non_terminal("A");
        let b = Symbol::non_terminal("B");
        let term_a = Symbol::terminal("a");
        let term_b = Symbol::terminal("b");

        let productions = vec![
            Production::new(a.clone(), vec![b.clone(), term_a.clone()]),
            Production::new(b.clone(), vec![term_b.clone()]),
            Production::new(b.clone(), vec![Symbol::epsilon()]),
        ];
        let terminals = terminal_set(&["a", "b"]);
        let non_terminals: HashSet<Symbol> = [a.clone(), b.clone()].into_iter().collect();
        let grammar = Grammar::new(productions, terminals, non_terminals, a).unwrap();

        let mut analyzer = StaticAnalyzer::new(grammar);

        let first = analyzer.get_first_sets();
        assert_eq!(first[&Symbol::non_terminal("B")], expected_set(&["b", "ε"]));
        assert_eq!(first[&Symbol::non_terminal("A")], expected_set(&["b", "a"]));

        let follow = analyzer.get_follow_sets();
        assert_eq!(follow[&Symbol::non_terminal("B")], expected_set(&["a"]));
        assert_eq!(follow[&Symbol::non_terminal("A")], expected_set(&["$"]));
    }

    #[test]
    fn test_left_recursive_first() {
        // S -> S a | b
        let s = Symbol::non_terminal("S");
        let term_a = Symbol::terminal("a");
        let term_b = Symbol::terminal("b");

        let productions = vec![
            Production::new(s.clone(), vec![s.clone(), term_a.clone()]),
            Production::new(s.clone(), vec![term_b.clone()]),
        ];
        let terminals = terminal_set(&["a", "b"]);
        let non_terminals: HashSet<Symbol> = [s.clone()].into_iter().collect();
        let grammar = Grammar::new(productions, terminals, non_terminals, s).unwrap();

        let mut analyzer = StaticAnalyzer::new(grammar);
        let first = analyzer.get_first_sets();
        assert_eq!(first[&Symbol::non_terminal("S")], expected_set(&["b"]));

        let follow = analyzer.get_follow_sets();
        assert_eq!(
            follow[&Symbol::non_terminal("S")],
            expected_set(&["a", "$"])
        );
    }

    #[test]
    fn test_sets_are_cached() {
        let mut analyzer = StaticAnalyzer::new(expression_grammar());

        let first = analyzer.get_first_sets().clone();
        let again = analyzer.get_first_sets().clone();
        assert_eq!(first, again);

        let follow = analyzer.get_follow_sets().clone();
        let again = analyzer.get_follow_sets().clone();
        assert_eq!(follow, again);
    }
}
