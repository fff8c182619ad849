use bitvec::prelude::BitVec;

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

/// Common read surface of the automata, consumed by the visualizer.
pub trait FA {
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    fn get_state_transitions(&self, state_id: usize) -> Vec<(Symbol, usize)>;
    fn get_regex(&self) -> &String;
}
