//! Interactive question prompt.
//!
//! Each line is answered on its own; there is no conversation memory.

use super::connect;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What the prompt loop should do with a line of input.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Skip,
    Quit,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else {
        Input::Question(line)
    }
}

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = connect(settings).await?;
    let engine = orchestrator.engine(model.as_deref());

    println!("\n{}", style("Mort Q&A").bold().cyan());
    println!("{}\n", style("Type your question, or 'exit' to quit.").dim());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Question:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = match classify(&line) {
            Input::Skip => continue,
            Input::Quit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Question(q) => q,
        };

        let spinner = Output::spinner("Thinking...");
        let result = engine.ask(question).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Answer:").cyan().bold(), response.answer.trim());
                Output::sources(&response.sources);
            }
            // The failed question is reported and the prompt stays open.
            Err(e) => Output::error(&format!("Failed to answer: {}", e)),
        }
    }

    Ok(())
}
