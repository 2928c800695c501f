use std::io::{self, BufRead, Write};

use reschedule_cell::Confirmation;

/// Yes/no question on the terminal. `assume_yes` skips the question.
pub struct TerminalConfirmation {
    pub assume_yes: bool,
}

impl Confirmation for TerminalConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
