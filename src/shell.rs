//! The interactive shell.
//!
//! Reads commands from stdin while applying planner events (finished
//! generation requests, remote household changes) as they arrive.

use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use chefgenie_core::{Planner, PlannerEvent};

use crate::commands::{print_plan, split_words, Flow, ShellLine};

const PROMPT: &str = "chefgenie> ";

pub async fn run(mut planner: Planner) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type `help` for commands, `quit` to exit.");
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if execute(&mut planner, &line).await == Flow::Quit {
                    break;
                }
                report(&mut planner);
                prompt();
            }
            Some(event) = planner.next_event() => {
                let is_result = matches!(event, PlannerEvent::Generated { .. });
                planner.handle_event(event);
                println!();
                if is_result && planner.state().error.is_none() && !planner.state().is_generating {
                    print_plan(planner.state());
                }
                report(&mut planner);
                prompt();
            }
        }
    }

    println!("Goodbye!");
    planner.shutdown().await;
    Ok(())
}

async fn execute(planner: &mut Planner, line: &str) -> Flow {
    let words = match split_words(line) {
        Ok(words) => words,
        Err(e) => {
            println!("Error: {}", e);
            return Flow::Continue;
        }
    };
    if words.is_empty() {
        return Flow::Continue;
    }

    let parsed = match ShellLine::try_parse_from(words) {
        Ok(parsed) => parsed,
        Err(e) => {
            // Help and usage errors both render through clap.
            let _ = e.print();
            return Flow::Continue;
        }
    };

    match parsed.command.run(planner).await {
        Ok(flow) => flow,
        Err(e) => {
            // Validation failures are also recorded on the state; show them once.
            planner.take_error();
            println!("Error: {}", e);
            Flow::Continue
        }
    }
}

/// Prints and clears any pending error or sync status.
fn report(planner: &mut Planner) {
    if let Some(error) = planner.take_error() {
        println!("Error: {}", error);
    }
    if let Some(status) = planner.take_status() {
        println!("[sync] {}", status);
    }
}

fn prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}
