/* Maximal munch scanner. The compiled DFA is walked from each input
 * position, remembering the last accepting state seen; the longest
 * accepting prefix wins and ties on length fall to the token category
 * registered earliest in the microsyntax list. */

use color_eyre::eyre::{Report, Result};
use std::collections::HashSet;

use crate::dfa::{construct_dfa, construct_minimal_dfa, DFA};
use crate::fa::FA;
use crate::nfa::{construct_nfa, NFA};
use crate::regex::parse_microsyntax_list;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    category: String,
    token: String,
}

impl Token {
    pub fn new(category: String, token: String) -> Self {
        Token { category, token }
    }

    pub fn get_token(&self) -> &String {
        &self.token
    }

    pub fn get_category(&self) -> &String {
        &self.category
    }
}

#[derive(Debug)]
pub enum ScannerError {
    ScannerNotReadyError,
    LexicalError { position: usize, character: char },
}

impl std::fmt::Display for ScannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScannerError::ScannerNotReadyError => {
                write!(
                    f,
                    "Error: No DFA has been built yet; call build_dfa before scanning"
                )
            }
            ScannerError::LexicalError {
                position,
                character,
            } => {
                write!(
                    f,
                    "Error: Lexical error at position {}: '{}'",
                    position, character
                )
            }
        }
    }
}

impl std::error::Error for ScannerError {}

#[derive(Debug)]
pub struct Scanner {
    nfa: NFA,
    dfa: Option<DFA>,
}

impl Scanner {
    /// Builds the combined NFA for the microsyntax list. The scanner is not
    /// ready to scan until `build_dfa` has been called with an alphabet.
    pub fn new(regex_list: Vec<(String, String)>) -> Result<Self> {
        let syntax_list = parse_microsyntax_list(regex_list)?;
        let nfa = construct_nfa(syntax_list)?;
        Ok(Scanner { nfa, dfa: None })
    }

    /// Runs subset construction and minimization over the given alphabet.
    pub fn build_dfa(&mut self, alphabet: HashSet<char>) {
        let dfa = construct_dfa(&self.nfa, &alphabet);
        self.dfa = Some(construct_minimal_dfa(dfa));
    }

    pub fn get_nfa(&self) -> &NFA {
        &self.nfa
    }

    pub fn get_dfa(&self) -> Option<&DFA> {
        self.dfa.as_ref()
    }

    /// Scans the input into a token stream with maximal munch. Fails on the
    /// first position from which no accepting state is reachable.
    pub fn scan(&self, input: &str) -> Result<Vec<Token>> {
        let dfa = match &self.dfa {
            Some(dfa) => dfa,
            None => return Err(Report::new(ScannerError::ScannerNotReadyError)),
        };

        let chars: Vec<char> = input.chars().collect();
        let mut tokens: Vec<Token> = Vec::new();
        let mut position = 0;

        while position < chars.len() {
            let mut walker = dfa.get_start_state();
            let mut last_accepting: Option<(usize, usize)> = None; // (state, end)

            let mut current = position;
            while current < chars.len() {
                let next = match dfa.get_state(walker).get_transition(chars[current]) {
                    Some(next) => next,
                    None => break,
                };
                walker = next;
                if dfa.get_acceptor_states()[walker] {
                    last_accepting = Some((walker, current));
                }
                current += 1;
            }

            let (accept_state, end) = match last_accepting {
                Some(found) => found,
                None => {
                    let err = ScannerError::LexicalError {
                        position,
                        character: chars[position],
                    };
                    return Err(Report::new(err));
                }
            };

            let lexeme: String = chars[position..=end].iter().collect();
            let category = match dfa.get_category(accept_state) {
                Some(category) => category.clone(),
                None => panic!("Accepting DFA state carries no token category"),
            };

            tokens.push(Token::new(category, lexeme));
            position = end + 1;
        }

        Ok(tokens)
    }
}

/// One-call construction of a ready scanner: parse the microsyntax list,
/// build the combined NFA and compile the minimal DFA over the alphabet.
pub fn construct_scanner(
    regex_list: Vec<(String, String)>,
    alphabet: HashSet<char>,
) -> Result<Scanner> {
    let mut scanner = Scanner::new(regex_list)?;
    scanner.build_dfa(alphabet);
    Ok(scanner)
}

#[cfg(test)]
mod scanner_tests {
    use super::*;

    fn keyword_scanner() -> Scanner {
        let regex_list = vec![
            ("if".to_string(), "IF".to_string()),
            ("(i|f|x)+".to_string(), "ID".to_string()),
        ];
        let alphabet: HashSet<char> = ['i', 'f', 'x'].into_iter().collect();
        construct_scanner(regex_list, alphabet).unwrap()
    }

    #[test]
    fn test_longest_match_wins() {
        let scanner = keyword_scanner();

        // ID accepts at length 3 while IF stops at length 2
        let tokens = scanner.scan("ifx").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].get_category(), "ID");
        assert_eq!(tokens[0].get_token(), "ifx");
    }

    #[test]
    fn test_priority_breaks_length_ties() {
        let scanner = keyword_scanner();

        let tokens = scanner.scan("if").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].get_category(), "IF");
    }

    #[test]
    fn test_earlier_registration_wins_exact_tie() {
        let regex_list = vec![
            ("if".to_string(), "KEYWORD".to_string()),
            ("if".to_string(), "SHADOWED".to_string()),
        ];
        let alphabet: HashSet<char> = ['i', 'f'].into_iter().collect();
        let scanner = construct_scanner(regex_list, alphabet).unwrap();

        let tokens = scanner.scan("if").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].get_category(), "KEYWORD");
    }

    #[test]
    fn test_token_stream_order() {
        let regex_list = vec![
            ("if".to_string(), "IF".to_string()),
            ("(0|1)+".to_string(), "NUM".to_string()),
        ];
        let alphabet: HashSet<char> = ['i', 'f', '0', '1'].into_iter().collect();
        let scanner = construct_scanner(regex_list, alphabet).unwrap();

        let tokens = scanner.scan("if01if").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::new("IF".to_string(), "if".to_string()));
        assert_eq!(tokens[1], Token::new("NUM".to_string(), "01".to_string()));
        assert_eq!(tokens[2], Token::new("IF".to_string(), "if".to_string()));
    }

    #[test]
    fn test_whitespace_category() {
        let regex_list = vec![
            ("if".to_string(), "IF".to_string()),
            (" +".to_string(), "WS".to_string()),
        ];
        let alphabet: HashSet<char> = ['i', 'f', ' '].into_iter().collect();
        let scanner = construct_scanner(regex_list, alphabet).unwrap();

        let tokens = scanner.scan("if  if").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].get_category(), "WS");
        assert_eq!(tokens[1].get_token(), "  ");
    }

    #[test]
    fn test_lexical_error_position() {
        let scanner = keyword_scanner();

        let result = scanner.scan("if ");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref().unwrap() {
            ScannerError::LexicalError {
                position,
                character,
            } => {
                assert_eq!(*position, 2);
                assert_eq!(*character, ' ');
            }
            err => panic!("Expected LexicalError, got {:?}", err),
        }
    }

    #[test]
    fn test_scan_before_build() {
        let regex_list = vec![("if".to_string(), "IF".to_string())];
        let scanner = Scanner::new(regex_list).unwrap();

        let result = scanner.scan("if");
        assert!(result.is_err());
        match result.unwrap_err().downcast_ref().unwrap() {
            ScannerError::ScannerNotReadyError => {}
            err => panic!("Expected ScannerNotReadyError, got {:?}", err),
        }
    }

    #[test]
    fn test_empty_input() {
        let scanner = keyword_scanner();
        let tokens = scanner.scan("").unwrap();
        assert!(tokens.is_empty());
    }
}
