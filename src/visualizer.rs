use color_eyre::eyre::Result;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::process::Command;

use crate::fa::{Symbol, FA};

/// Renders the automaton to `<filename>.dot` and asks Graphviz for a
/// `<filename>.jpg` of it.
pub fn visualize<T: FA>(fa: &T, filename: &str) -> Result<()> {
    let mut graph = DiGraph::new();
    let mut node_map = HashMap::new();

    // Add nodes
    for state_id in 0..fa.get_num_states() {
        let node = graph.add_node(format!("State {}", state_id));
        node_map.insert(state_id, node);
    }

    // Add edges
    for state_id in 0..fa.get_num_states() {
        for (symbol, target) in fa.get_state_transitions(state_id) {
            let symbol_str = match symbol {
                Symbol::Char(c) => c.to_string(),
                Symbol::Epsilon => "𝛆".to_string(),
            };
            graph.add_edge(node_map[&state_id], node_map[&target], symbol_str);
        }
    }

    // Mark start and accept states
    let start_node = node_map[&fa.get_start_state()];
    graph[start_node] = format!("Start\nState {}", fa.get_start_state());

    for accept in fa.get_acceptor_states().iter_ones() {
        let accept_node = node_map[&accept];
        graph[accept_node] = graph[accept_node].clone() + &format!("\nAccept\nState {}", accept);
    }

    let dot = Dot::new(&graph);

    let dot_filename = format!("{}.dot", filename);
    let mut dot_file = File::create(&dot_filename)?;
    dot_file.write_all(dot.to_string().as_bytes())?;

    Command::new("dot")
        .args(["-Tjpg", &dot_filename, "-o", &format!("{}.jpg", filename)])
        .output()?;

    println!(
        "Visualization of the automaton for {} saved as {}.jpg",
        fa.get_regex(),
        filename
    );
    Ok(())
}
