use clap::{Arg, Command};
use color_eyre::eyre::Result;
use std::collections::HashSet;

use lexgram::grammar::Symbol;
use lexgram::{
    construct_dfa, read_grammar_file, read_microsyntax_file, visualize, Scanner, StaticAnalyzer,
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Command::new("lexgram")
        .version("0.1.0")
        .author("lexgram developers")
        .about("A compiler course front end: regex driven scanner generation and FIRST/FOLLOW grammar analysis")
        .arg(Arg::new("microsyntax").short('s').long("microsyntax").value_name("FILE")
            .help("File with REGEX::CATEGORY microsyntax entries, one per line"))
        .arg(Arg::new("alphabet").short('a').long("alphabet").value_name("CHARS")
            .help("Characters of the scanner alphabet, defaults to the regex operands"))
        .arg(Arg::new("input").short('i').long("input").value_name("TEXT")
            .help("Input text to scan"))
        .arg(Arg::new("save-nfa").short('n')
            .help("Save the NFA after Thompson construction of the microsyntax list")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("save-dfa").short('d')
            .help("Save the un-optimized DFA obtained after subset construction")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("save-minimal-dfa").short('m')
            .help("Save the minimal DFA after table-filling minimization")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("grammar").short('g').long("grammar").value_name("FILE")
            .help("Grammar file to compute FIRST and FOLLOW sets for"))
        .get_matches();

    if let Some(grammar_file) = args.get_one::<String>("grammar") {
        analyze_grammar(grammar_file)?;
    }

    if let Some(microsyntax_file) = args.get_one::<String>("microsyntax") {
        let regex_list = read_microsyntax_file(microsyntax_file)?;
        let mut scanner = Scanner::new(regex_list)?;

        let alphabet: HashSet<char> = match args.get_one::<String>("alphabet") {
            Some(chars) => chars.chars().collect(),
            None => scanner.get_nfa().get_alphabet().clone(),
        };

        if args.get_flag("save-nfa") {
            visualize(scanner.get_nfa(), "nfa")?;
        }

        if args.get_flag("save-dfa") {
            let dfa = construct_dfa(scanner.get_nfa(), &alphabet);
            visualize(&dfa, "dfa")?;
        }

        scanner.build_dfa(alphabet);

        if args.get_flag("save-minimal-dfa") {
            if let Some(dfa) = scanner.get_dfa() {
                visualize(dfa, "minimal_dfa")?;
            }
        }

        if let Some(input) = args.get_one::<String>("input") {
            let token_list = scanner.scan(input)?;
            for token in token_list {
                println!(
                    "The token is {:?} and the category is {}",
                    token.get_token(),
                    token.get_category()
                );
            }
        }
    }

    Ok(())
}

fn analyze_grammar(grammar_file: &str) -> Result<()> {
    let grammar = read_grammar_file(grammar_file)?;
    let mut analyzer = StaticAnalyzer::new(grammar);

    let mut names: Vec<String> = analyzer
        .get_grammar()
        .get_non_terminals()
        .iter()
        .map(|symbol| symbol.get_name().to_string())
        .collect();
    names.sort();

    let first_sets = analyzer.get_first_sets();
    for name in &names {
        if let Some(set) = first_sets.get(&Symbol::non_terminal(name)) {
            println!("FIRST({}) = {{ {} }}", name, format_set(set));
        }
    }

    let follow_sets = analyzer.get_follow_sets();
    for name in &names {
        if let Some(set) = follow_sets.get(&Symbol::non_terminal(name)) {
            println!("FOLLOW({}) = {{ {} }}", name, format_set(set));
        }
    }

    Ok(())
}

fn format_set(set: &HashSet<Symbol>) -> String {
    let mut names: Vec<&str> = set.iter().map(|symbol| symbol.get_name()).collect();
    names.sort_unstable();
    names.join(", ")
}
