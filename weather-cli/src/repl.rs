use std::{future::Future, io::Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use weather_core::{AgentMode, TraceKind, WeatherAgent};

const EXIT_COMMANDS: [&str; 3] = ["quit", "exit", "q"];

pub fn print_banner() {
    println!("Weather Agent with LLM Function Calling");
    println!("The LLM will decide when to call the weather tool!");
    println!();
}

fn print_instructions(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Ask me about the weather!")?;
    writeln!(out, "Examples:")?;
    writeln!(out, "  - 'What's the weather in London?'")?;
    writeln!(out, "  - 'How hot is it in Tokyo?'")?;
    writeln!(out, "  - 'Is it humid in New York?'")?;
    writeln!(out, "Type 'quit' to exit.\n")
}

fn is_exit(input: &str) -> bool {
    EXIT_COMMANDS.iter().any(|cmd| input.eq_ignore_ascii_case(cmd))
}

/// Chat until an exit command, end of input, or `interrupt` resolves.
pub async fn run<R, W>(
    agent: &WeatherAgent,
    input: R,
    out: &mut W,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();

    print_instructions(out)?;

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = &mut interrupt => break,
        };

        let question = match line {
            Ok(Some(line)) => line.trim().to_string(),
            Ok(None) => break,
            Err(err) => {
                writeln!(out, "Error: {err}\n")?;
                continue;
            }
        };

        if is_exit(&question) {
            writeln!(out, "Goodbye!")?;
            return Ok(());
        }
        if question.is_empty() {
            continue;
        }

        writeln!(out, "LLM is thinking...")?;
        out.flush()?;

        let answer = tokio::select! {
            answer = agent.answer(&question) => answer,
            _ = &mut interrupt => break,
        };

        if agent.mode() == AgentMode::Mock {
            for step in &answer.trace {
                let label = match step.kind {
                    TraceKind::ToolCall => "LLM is calling",
                    TraceKind::ToolResult => "Tool returned",
                    TraceKind::ModelResponse => "LLM generated response",
                };
                writeln!(out, "  [mock] {label}: {}", step.detail)?;
            }
        }

        writeln!(out, "Agent: {}\n", answer.text)?;
    }

    writeln!(out, "\nGoodbye!")?;
    Ok(())
}
