use std::io::{self, Write};

pub struct ShellPrompt {
    text: String,
    enabled: bool,
}

impl ShellPrompt {
    pub fn new(text: &str, enabled: bool) -> Self {
        ShellPrompt {
            text: text.to_string(),
            enabled,
        }
    }

    /// For scripts and `-c`: never print anything.
    pub fn disabled() -> Self {
        ShellPrompt::new("", false)
    }

    pub fn show(&self) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut stdout = io::stdout();
        write!(stdout, "{}", self.text)?;
        stdout.flush()
    }

    /// Move past the prompt line when input ends (e.g. Ctrl-D).
    pub fn finish(&self) {
        if self.enabled {
            println!();
        }
    }
}
