use std::io::{self, BufRead, Write};

/// The human watching the run. Both calls block until answered.
pub trait Operator {
    fn alert(&self, title: &str, message: &str);

    /// Returns the index of the chosen entry in `choices`.
    fn confirm(&self, title: &str, message: &str, choices: &[&str]) -> usize;
}

#[derive(Debug, Default)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn alert(&self, title: &str, message: &str) {
        println!("\n=== {} ===\n{}", title, message);
        print!("Press Enter to continue...");
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }

    fn confirm(&self, title: &str, message: &str, choices: &[&str]) -> usize {
        println!("\n=== {} ===\n{}", title, message);
        for (i, choice) in choices.iter().enumerate() {
            println!("  [{}] {}", i + 1, choice);
        }
        let stdin = io::stdin();
        loop {
            print!("Choose 1-{}: ", choices.len());
            let _ = io::stdout().flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                // EOF: nobody is there to answer, take the last (least intrusive) option
                Ok(0) | Err(_) => return choices.len().saturating_sub(1),
                Ok(_) => {}
            }
            if let Some(index) = parse_choice(&line, choices) {
                return index;
            }
            println!("Please enter a number between 1 and {}.", choices.len());
        }
    }
}

/// Accepts either the 1-based number or the choice text itself.
fn parse_choice(input: &str, choices: &[&str]) -> Option<usize> {
    let input = input.trim();
    if let Ok(n) = input.parse::<usize>() {
        return (1..=choices.len()).contains(&n).then(|| n - 1);
    }
    choices
        .iter()
        .position(|c| c.eq_ignore_ascii_case(input))
}
