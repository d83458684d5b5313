use anyhow::{Context, Result, bail};
use std::io::{self, IsTerminal, Read};
use zeroize::Zeroizing;

/// How piped input is cleaned up before use.
#[derive(Debug, Clone, Copy)]
pub enum Trim {
    /// Drop a single trailing line ending, keep everything else.
    LineEnding,
    /// Drop all surrounding whitespace.
    Whitespace,
}

pub fn read_key() -> Result<Zeroizing<String>> {
    //  Environment Variable
    //  PASSLOCK_KEY="correct-horse" passlock encrypt "attack at dawn"
    //  An empty value is passed on so the empty-key check reports it.
    if let Ok(key) = std::env::var("PASSLOCK_KEY") {
        return Ok(Zeroizing::new(key));
    }

    //  Interactive, read from the controlling terminal even when stdin is piped
    match rpassword::prompt_password("Key: ") {
        Ok(key) => Ok(Zeroizing::new(key)),
        Err(_) => bail!("No key provided (set PASSLOCK_KEY or run from a terminal)"),
    }
}

pub fn read_input(arg: Option<String>, trim: Trim) -> Result<Zeroizing<String>> {
    if let Some(text) = arg {
        return Ok(Zeroizing::new(text));
    }

    //  stdin (Pipeline)
    //  echo "attack at dawn" | passlock encrypt
    if io::stdin().is_terminal() {
        bail!("No input provided (pass it as an argument or pipe it on stdin)");
    }

    let mut buf = Zeroizing::new(String::new());
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read input from stdin")?;

    match trim {
        Trim::LineEnding => {
            trim_newline(&mut buf);
            Ok(buf)
        }
        Trim::Whitespace => Ok(Zeroizing::new(buf.trim().to_string())),
    }
}

fn trim_newline(s: &mut String) {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
}
