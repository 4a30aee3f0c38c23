//! What to do after a report, kept apart from the terminal prompt itself.
use std::io::{self, BufRead, Write};

use crate::walker::Analysis;

pub const REDUCE_PROMPT: &str = "Would you like to attempt to reduce these deep structures? (yes/no)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing met the warning threshold.
    Clean,
    /// Offer to reduce `candidates` flagged nodes.
    OfferReduction { candidates: usize },
}

pub fn decide(analysis: &Analysis) -> Action {
    match analysis.problematic.len() {
        0 => Action::Clean,
        candidates => Action::OfferReduction { candidates },
    }
}

/// `yes`/`no` in any case; anything else is `None`.
pub fn parse_answer(raw: &str) -> Option<bool> {
    let answer = raw.trim();
    if answer.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if answer.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Ask until the answer parses. End of input counts as `no`.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<bool> {
    let mut line = String::new();
    loop {
        writeln!(output, "{prompt}")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match parse_answer(&line) {
            Some(answer) => return Ok(answer),
            None => writeln!(output, "Please answer 'yes' or 'no'.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::TagPath;
    use crate::walker::ProblematicNode;

    #[test]
    fn answers_are_case_insensitive() {
        assert_eq!(parse_answer("YES\n"), Some(true));
        assert_eq!(parse_answer("  No "), Some(false));
        assert_eq!(parse_answer("y"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn reprompts_until_a_valid_answer() {
        let mut input = "maybe\n\nYes\n".as_bytes();
        let mut output = Vec::new();
        assert!(confirm(&mut input, &mut output, REDUCE_PROMPT).unwrap());
        let shown = String::from_utf8(output).unwrap();
        assert_eq!(shown.matches(REDUCE_PROMPT).count(), 3);
    }

    #[test]
    fn end_of_input_declines() {
        let mut input = "what\n".as_bytes();
        let mut output = Vec::new();
        assert!(!confirm(&mut input, &mut output, REDUCE_PROMPT).unwrap());
    }

    #[test]
    fn decide_offers_only_when_something_is_flagged() {
        let mut analysis = Analysis::default();
        assert_eq!(decide(&analysis), Action::Clean);
        analysis.problematic.push(ProblematicNode { path: TagPath::root(), level: 1, max_depth: 120 });
        assert_eq!(decide(&analysis), Action::OfferReduction { candidates: 1 });
    }
}
