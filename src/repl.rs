use crate::error::Result;
use crate::runner::{run, Host};

use std::io::{self, BufRead, Write};

use futures::executor::block_on;
use futures::future::{self, BoxFuture};

const PROMPT: &str = ">> ";
const INPUT_PROMPT: &str = "? ";
const QUIT: &str = "quit";

/// Host wired to the terminal: prints go to stdout, WILLE reads one line
/// from stdin.
pub struct StdioHost;

impl Host for StdioHost {
    fn output(&mut self, text: &str) {
        println!("{}", text);
    }

    fn input(&mut self) -> BoxFuture<'_, String> {
        // The machine is already suspended when this is called, so a
        // blocking terminal read before resolving is fine.
        print!("{}", INPUT_PROMPT);
        let _ = io::stdout().flush();

        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let line = line
            .trim_end_matches(|ch: char| ch == '\r' || ch == '\n')
            .to_string();

        Box::pin(future::ready(line))
    }
}

/// Run one program against the terminal.
pub fn run_source(source: &str) -> Result<()> {
    block_on(run(source, &mut StdioHost))
}

/// Accumulates lines until the closing VERNEINUNG arrives, then runs the
/// whole program. `quit` leaves.
pub fn repl() -> io::Result<()> {
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match line.trim() {
            QUIT => return Ok(()),
            trimmed => {
                buffer.push_str(&line);

                if trimmed.eq_ignore_ascii_case("VERNEINUNG") {
                    if let Err(error) = run_source(&buffer) {
                        println!("{}", error);
                    }
                    buffer.clear();
                }
            }
        }
    }
}
