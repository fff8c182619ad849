/* Thompson construction from postfix regular expressions. Every state of
 * every token lives in one arena owned by the NFA under construction, so
 * combining fragments never copies states and ids stay deterministic. */

use bitvec::prelude::*;
use color_eyre::eyre::{Report, Result};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::fa::{Symbol, FA};
use crate::regex::RegexError;

#[derive(Debug, Clone)]
pub struct NFAState {
    id: usize,
    transitions: HashMap<Symbol, HashSet<usize>>,
}

#[derive(Debug)]
pub struct NFA {
    states: Vec<NFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    token_tags: HashMap<usize, usize>, // accept state id -> priority index
    token_categories: Vec<String>,     // indexed by priority
    alphabet: HashSet<char>,
    regex: String,
}

impl NFAState {
    fn new(id: usize) -> Self {
        NFAState {
            id,
            transitions: HashMap::new(),
        }
    }

    fn add_transition(&mut self, symbol: Symbol, to: usize) {
        self.transitions.entry(symbol).or_default().insert(to);
    }

    pub fn get_transitions(&self) -> &HashMap<Symbol, HashSet<usize>> {
        &self.transitions
    }

    pub fn get_id(&self) -> usize {
        self.id
    }
}

impl FA for NFA {
    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)> {
        let mut transitions = Vec::new();
        for (symbol, targets) in self.get_state(state_id).get_transitions() {
            for target in targets {
                transitions.push((symbol.clone(), *target));
            }
        }
        transitions
    }

    fn get_regex(&self) -> &String {
        &self.regex
    }
}

/// One Thompson fragment: the entry and exit state of a partial automaton.
type Fragment = (usize, usize);

impl NFA {
    fn new() -> Self {
        NFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            token_tags: HashMap::new(),
            token_categories: Vec::new(),
            alphabet: HashSet::new(),
            regex: String::new(),
        }
    }

    fn add_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::new(state_id));
        self.accept_states.push(false);
        state_id
    }

    fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) {
        self.states[from].add_transition(symbol, to);
    }

    fn set_accept_state(&mut self, state_id: usize) {
        self.accept_states.set(state_id, true);
    }

    fn clear_accept_state(&mut self, state_id: usize) {
        self.accept_states.set(state_id, false);
    }

    pub fn get_state(&self, id: usize) -> &NFAState {
        match self.states.get(id) {
            Some(state) => state,
            None => panic!("Invalid state index provided"),
        }
    }

    pub fn get_alphabet(&self) -> &HashSet<char> {
        &self.alphabet
    }

    pub fn get_token_tags(&self) -> &HashMap<usize, usize> {
        &self.token_tags
    }

    pub fn get_token_categories(&self) -> &Vec<String> {
        &self.token_categories
    }

    /// Folds a postfix expression into the arena, one fragment per operand
    /// and one rewiring per operator, and returns the resulting fragment.
    fn build_fragment(&mut self, postfix: &str) -> Result<Fragment> {
        let mut stack: Vec<Fragment> = Vec::new();

        for ch in postfix.chars() {
            match ch {
                '.' => {
                    let right = pop_fragment(&mut stack, postfix)?;
                    let left = pop_fragment(&mut stack, postfix)?;
                    self.clear_accept_state(left.1);
                    self.add_transition(left.1, Symbol::Epsilon, right.0);
                    stack.push((left.0, right.1));
                }
                '|' => {
                    let left = pop_fragment(&mut stack, postfix)?;
                    let right = pop_fragment(&mut stack, postfix)?;
                    let new_start = self.add_state();
                    let new_end = self.add_state();
                    self.add_transition(new_start, Symbol::Epsilon, left.0);
                    self.add_transition(new_start, Symbol::Epsilon, right.0);
                    self.clear_accept_state(left.1);
                    self.clear_accept_state(right.1);
                    self.add_transition(left.1, Symbol::Epsilon, new_end);
                    self.add_transition(right.1, Symbol::Epsilon, new_end);
                    self.set_accept_state(new_end);
                    stack.push((new_start, new_end));
                }
                '*' => {
                    let top = pop_fragment(&mut stack, postfix)?;
                    let new_start = self.add_state();
                    let new_end = self.add_state();
                    self.add_transition(top.1, Symbol::Epsilon, top.0);
                    self.add_transition(top.1, Symbol::Epsilon, new_end);
                    self.add_transition(new_start, Symbol::Epsilon, new_end);
                    self.add_transition(new_start, Symbol::Epsilon, top.0);
                    self.clear_accept_state(top.1);
                    self.set_accept_state(new_end);
                    stack.push((new_start, new_end));
                }
                '+' => {
                    let top = pop_fragment(&mut stack, postfix)?;
                    let new_start = self.add_state();
                    let new_end = self.add_state();
                    self.add_transition(new_start, Symbol::Epsilon, top.0);
                    self.add_transition(top.1, Symbol::Epsilon, top.0);
                    self.add_transition(top.1, Symbol::Epsilon, new_end);
                    self.clear_accept_state(top.1);
                    self.set_accept_state(new_end);
                    stack.push((new_start, new_end));
                }
                '?' => {
                    let top = pop_fragment(&mut stack, postfix)?;
                    let new_start = self.add_state();
                    let new_end = self.add_state();
                    self.add_transition(new_start, Symbol::Epsilon, top.0);
                    self.add_transition(top.1, Symbol::Epsilon, new_end);
                    self.add_transition(new_start, Symbol::Epsilon, new_end);
                    self.clear_accept_state(top.1);
                    self.set_accept_state(new_end);
                    stack.push((new_start, new_end));
                }
                operand => {
                    let start = self.add_state();
                    let end = self.add_state();
                    self.alphabet.insert(operand);
                    self.add_transition(start, Symbol::Char(operand), end);
                    self.set_accept_state(end);
                    stack.push((start, end));
                }
            }
        }

        match stack.pop() {
            Some(fragment) if stack.is_empty() => Ok(fragment),
            _ => Err(Report::new(RegexError::MalformedPostfixError(
                postfix.to_string(),
            ))),
        }
    }

    /// Checks whether the NFA accepts the input by direct simulation,
    /// tracking the set of live states through epsilon closures.
    pub fn simulate(&self, input: &str) -> bool {
        let mut current_states: HashSet<usize> = HashSet::new();
        self.add_epsilon_closure(self.start_state, &mut current_states);

        for ch in input.chars() {
            let mut next_states: HashSet<usize> = HashSet::new();
            for &state_id in &current_states {
                let transitions = self.get_state(state_id).get_transitions();
                if let Some(targets) = transitions.get(&Symbol::Char(ch)) {
                    for &target in targets {
                        self.add_epsilon_closure(target, &mut next_states);
                    }
                }
            }
            current_states = next_states;
        }

        current_states
            .iter()
            .any(|&state_id| self.accept_states[state_id])
    }

    fn add_epsilon_closure(&self, start: usize, closure: &mut HashSet<usize>) {
        if !closure.insert(start) {
            return;
        }
        let transitions = self.get_state(start).get_transitions();
        if let Some(targets) = transitions.get(&Symbol::Epsilon) {
            for &target in targets {
                self.add_epsilon_closure(target, closure);
            }
        }
    }
}

fn pop_fragment(stack: &mut Vec<Fragment>, postfix: &str) -> Result<Fragment> {
    match stack.pop() {
        Some(fragment) => Ok(fragment),
        None => Err(Report::new(RegexError::MalformedPostfixError(
            postfix.to_string(),
        ))),
    }
}

/// Builds one NFA for the whole microsyntax list. Each entry's fragment is
/// built in a shared arena and its end state tagged with the entry's
/// priority; with more than one entry a fresh start state fans out to every
/// fragment with epsilon edges.
pub fn construct_nfa(syntax_list: VecDeque<(String, String, String)>) -> Result<NFA> {
    if syntax_list.is_empty() {
        return Err(Report::new(RegexError::EmptyRegexError));
    }

    let mut nfa = NFA::new();
    let mut entry_points: Vec<usize> = Vec::new();
    let mut regex_texts: Vec<String> = Vec::new();

    for (priority, (regex, postfix, category)) in syntax_list.into_iter().enumerate() {
        let (start, end) = nfa.build_fragment(&postfix)?;
        nfa.token_tags.insert(end, priority);
        nfa.token_categories.push(category);
        entry_points.push(start);
        regex_texts.push(regex);
    }

    if entry_points.len() == 1 {
        nfa.start_state = entry_points[0];
    } else {
        let shared_start = nfa.add_state();
        for entry in entry_points {
            nfa.add_transition(shared_start, Symbol::Epsilon, entry);
        }
        nfa.start_state = shared_start;
    }

    nfa.regex = regex_texts.join("|");
    Ok(nfa)
}
