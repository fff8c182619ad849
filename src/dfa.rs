/* Subset construction to convert an NFA into a DFA, then table-filling
 * minimization: mark distinguishable state pairs to a fixed point and
 * collapse the unmarked ones through a union-find partition. */

use bitvec::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::fa::{Symbol, FA};
use crate::nfa::NFA;

#[derive(Debug, Clone)]
pub struct DFAState {
    id: usize,
    nfa_states: BitVec<u8>, // the subset of NFA states this state represents
    transitions: HashMap<char, usize>,
    token: Option<usize>, // priority index of the winning token category
}

#[derive(Debug)]
pub struct DFA {
    states: Vec<DFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: HashSet<char>,
    token_categories: Vec<String>,
    regex: String,
}

impl DFAState {
    fn new(id: usize, nfa_states: BitVec<u8>) -> Self {
        DFAState {
            id,
            nfa_states,
            transitions: HashMap::new(),
            token: None,
        }
    }

    fn add_transition(&mut self, symbol: char, to: usize) {
        self.transitions.insert(symbol, to);
    }

    pub fn get_transition(&self, symbol: char) -> Option<usize> {
        self.transitions.get(&symbol).copied()
    }

    pub fn get_transitions(&self) -> &HashMap<char, usize> {
        &self.transitions
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    pub fn get_token_tag(&self) -> Option<usize> {
        self.token
    }

    pub fn get_nfa_states(&self) -> &BitVec<u8> {
        &self.nfa_states
    }
}

impl FA for DFA {
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
        self.get_state(state_id)
            .get_transitions()
            .iter()
            .map(|(&symbol, &target)| (Symbol::Char(symbol), target))
            .collect()
    }

    fn get_regex(&self) -> &String {
        &self.regex
    }
}

impl DFA {
    fn new() -> Self {
        DFA {
            states: Vec::new(),
            start_state: 0,
            accept_states: BitVec::new(),
            alphabet: HashSet::new(),
            token_categories: Vec::new(),
            regex: String::new(),
        }
    }

    fn add_state(&mut self, nfa_states: BitVec<u8>) -> usize {
        let state_id = self.states.len();
        self.states.push(DFAState::new(state_id, nfa_states));
        self.accept_states.push(false);
        state_id
    }

    /// Allocates a DFA state for an NFA subset, deriving finality and the
    /// winning token tag (lowest priority index) from the subset members.
    fn add_subset_state(&mut self, nfa: &NFA, nfa_states: BitVec<u8>) -> usize {
        let state_id = self.add_state(nfa_states);

        let mut token: Option<usize> = None;
        let mut is_final = false;

        for nfa_state in self.states[state_id].nfa_states.iter_ones() {
            if !nfa.get_acceptor_states()[nfa_state] {
                continue;
            }
            is_final = true;
            if let Some(&priority) = nfa.get_token_tags().get(&nfa_state) {
                token = Some(match token {
                    Some(best) => best.min(priority),
                    None => priority,
                });
            }
        }

        self.states[state_id].token = token;
        if is_final {
            self.set_accept_state(state_id);
        }
        state_id
    }

    fn add_transition(&mut self, from: usize, symbol: char, to: usize) {
        self.states[from].add_transition(symbol, to);
    }

    fn set_accept_state(&mut self, state_id: usize) {
        self.accept_states.set(state_id, true);
    }

    pub fn get_state(&self, id: usize) -> &DFAState {
        match self.states.get(id) {
            Some(state) => state,
            None => panic!("Invalid state index provided"),
        }
    }

    pub fn get_alphabet(&self) -> &HashSet<char> {
        &self.alphabet
    }

    pub fn get_token_categories(&self) -> &Vec<String> {
        &self.token_categories
    }

    pub fn get_category(&self, state_id: usize) -> Option<&String> {
        self.get_state(state_id)
            .token
            .map(|priority| &self.token_categories[priority])
    }

    /// Walks the transition table over the input and reports whether the
    /// walk ends in an accepting state.
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.start_state;
        for ch in input.chars() {
            match self.get_state(current).get_transition(ch) {
                Some(next) => current = next,
                None => return false,
            }
        }
        self.accept_states[current]
    }
}

/// Smallest superset of the seed closed under epsilon transitions.
fn get_epsilon_closure(nfa: &NFA, seed: BitVec<u8>) -> BitVec<u8> {
    let num_states = nfa.get_num_states();

    let mut closure: BitVec<u8> = BitVec::repeat(false, num_states);
    let mut work_list: VecDeque<usize> = VecDeque::new();

    for state_id in seed.iter_ones() {
        closure.set(state_id, true);
        work_list.push_back(state_id);
    }

    while let Some(state_id) = work_list.pop_front() {
        let transitions = nfa.get_state(state_id).get_transitions();
        if let Some(targets) = transitions.get(&Symbol::Epsilon) {
            for &target in targets {
                if !closure[target] {
                    closure.set(target, true);
                    work_list.push_back(target);
                }
            }
        }
    }
    closure
}

/// Set of NFA states reachable from the subset by one transition on `symbol`.
fn move_set(nfa: &NFA, subset: &BitVec<u8>, symbol: char) -> BitVec<u8> {
    let mut result: BitVec<u8> = BitVec::repeat(false, nfa.get_num_states());

    for state_id in subset.iter_ones() {
        let transitions = nfa.get_state(state_id).get_transitions();
        if let Some(targets) = transitions.get(&Symbol::Char(symbol)) {
            for &target in targets {
                result.set(target, true);
            }
        }
    }
    result
}

/// Subset construction. Transitions are materialized only for characters of
/// the supplied alphabet, and only where the move set is non-empty, so the
/// transition function is partial.
pub fn construct_dfa(nfa: &NFA, alphabet: &HashSet<char>) -> DFA {
    let mut dfa = DFA::new();
    dfa.alphabet = alphabet.clone();
    dfa.token_categories = nfa.get_token_categories().clone();
    dfa.regex = nfa.get_regex().clone();

    let mut sorted_alphabet: Vec<char> = alphabet.iter().copied().collect();
    sorted_alphabet.sort_unstable();

    let mut seed: BitVec<u8> = BitVec::repeat(false, nfa.get_num_states());
    seed.set(nfa.get_start_state(), true);
    let q0 = get_epsilon_closure(nfa, seed);

    let d0 = dfa.add_subset_state(nfa, q0.clone());
    dfa.start_state = d0;

    let mut subset_map: HashMap<BitVec<u8>, usize> = HashMap::new();
    let mut work_list: VecDeque<BitVec<u8>> = VecDeque::new();
    subset_map.insert(q0.clone(), d0);
    work_list.push_back(q0);

    while let Some(subset) = work_list.pop_front() {
        let dq = match subset_map.get(&subset) {
            Some(&dq) => dq,
            None => panic!("Pending subset missing from the subset map"),
        };

        for &symbol in &sorted_alphabet {
            let moved = move_set(nfa, &subset, symbol);
            if moved.not_any() {
                continue;
            }
            let target_subset = get_epsilon_closure(nfa, moved);

            let dt = match subset_map.get(&target_subset) {
                Some(&dt) => dt,
                None => {
                    let dt = dfa.add_subset_state(nfa, target_subset.clone());
                    subset_map.insert(target_subset.clone(), dt);
                    work_list.push_back(target_subset);
                    dt
                }
            };
            dfa.add_transition(dq, symbol, dt);
        }
    }

    dfa
}

/// Unordered pair of DFA state ids, stored smaller id first so that lookup
/// in the distinguishability table is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Pair {
    first: usize,
    second: usize,
}

impl Pair {
    fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Pair {
                first: a,
                second: b,
            }
        } else {
            Pair {
                first: b,
                second: a,
            }
        }
    }
}

fn find(parent: &mut Vec<usize>, state: usize) -> usize {
    if parent[state] == state {
        return state;
    }
    let root = find(parent, parent[state]);
    parent[state] = root;
    root
}

fn union(parent: &mut Vec<usize>, s1: usize, s2: usize) {
    let root1 = find(parent, s1);
    let root2 = find(parent, s2);
    if root1 != root2 {
        parent[root2] = root1;
    }
}

/// Table-filling minimization. The original DFA is consumed; the result is
/// a fresh automaton whose ids follow the partitions ordered by smallest
/// member id, keeping reconstruction deterministic.
pub fn construct_minimal_dfa(dfa: DFA) -> DFA {
    let num_states = dfa.get_num_states();

    let mut sorted_alphabet: Vec<char> = dfa.alphabet.iter().copied().collect();
    sorted_alphabet.sort_unstable();

    // A pair starts out distinguishable when finality differs, or when both
    // states accept but carry different token categories. Collapsing accept
    // states of different categories would corrupt the token stream.
    let mut table: HashMap<Pair, bool> = HashMap::new();
    for i in 0..num_states {
        for j in (i + 1)..num_states {
            let finality_differs = dfa.accept_states[i] != dfa.accept_states[j];
            let token_differs = dfa.states[i].token != dfa.states[j].token;
            table.insert(Pair::new(i, j), finality_differs || token_differs);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..num_states {
            for j in (i + 1)..num_states {
                let pair = Pair::new(i, j);
                if matches!(table.get(&pair), Some(true)) {
                    continue;
                }

                for &symbol in &sorted_alphabet {
                    let t1 = dfa.states[i].get_transition(symbol);
                    let t2 = dfa.states[j].get_transition(symbol);

                    let distinguishable = match (t1, t2) {
                        (None, None) => false,
                        (Some(_), None) | (None, Some(_)) => true,
                        (Some(t1), Some(t2)) => {
                            t1 != t2 && matches!(table.get(&Pair::new(t1, t2)), Some(true))
                        }
                    };

                    if distinguishable {
                        table.insert(pair, true);
                        changed = true;
                        break;
                    }
                }
            }
        }
    }

    let mut parent: Vec<usize> = (0..num_states).collect();
    for (pair, marked) in &table {
        if !*marked {
            union(&mut parent, pair.first, pair.second);
        }
    }

    // Scanning states in ascending id order groups each partition under its
    // smallest member, which fixes the id assignment of the rebuilt DFA.
    let mut partitions: Vec<Vec<usize>> = Vec::new();
    let mut root_to_partition: HashMap<usize, usize> = HashMap::new();
    for state_id in 0..num_states {
        let root = find(&mut parent, state_id);
        let partition_id = match root_to_partition.get(&root) {
            Some(&partition_id) => partition_id,
            None => {
                let partition_id = partitions.len();
                partitions.push(Vec::new());
                root_to_partition.insert(root, partition_id);
                partition_id
            }
        };
        partitions[partition_id].push(state_id);
    }

    let mut minimal = DFA::new();
    minimal.alphabet = dfa.alphabet.clone();
    minimal.token_categories = dfa.token_categories.clone();
    minimal.regex = dfa.regex.clone();

    let mut new_of: Vec<usize> = vec![0; num_states];
    for members in &partitions {
        let mut combined: BitVec<u8> = BitVec::new();
        let mut is_final = false;
        let mut token: Option<usize> = None;

        for &member in members {
            if combined.is_empty() {
                combined = dfa.states[member].nfa_states.clone();
            } else {
                for nfa_state in dfa.states[member].nfa_states.iter_ones() {
                    combined.set(nfa_state, true);
                }
            }
            if dfa.accept_states[member] {
                is_final = true;
            }
            if let Some(priority) = dfa.states[member].token {
                token = Some(match token {
                    Some(best) => best.min(priority),
                    None => priority,
                });
            }
        }

        let new_id = minimal.add_state(combined);
        minimal.states[new_id].token = token;
        if is_final {
            minimal.set_accept_state(new_id);
        }
        for &member in members {
            new_of[member] = new_id;
        }
    }

    // Duplicate insertions collapse to the same entry since equivalent old
    // states map to equivalent targets.
    for old_state in &dfa.states {
        for (&symbol, &old_target) in &old_state.transitions {
            minimal.add_transition(new_of[old_state.id], symbol, new_of[old_target]);
        }
    }

    minimal.start_state = new_of[dfa.start_state];
    minimal
}
