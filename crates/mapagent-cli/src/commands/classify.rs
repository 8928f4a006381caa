use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use mapagent_core::{SessionConfig, TraceEvent};
use mapagent_execution::TraceClassifier;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run(log_file: &Path, config: &SessionConfig, format: OutputFormat) -> Result<()> {
    let content = fs::read_to_string(log_file)
        .with_context(|| format!("Failed to read {}", log_file.display()))?;

    let classifier = TraceClassifier::from_config(config);
    let events = classifier.classify_lines(content.lines());
    tracing::debug!(
        lines = content.lines().count(),
        events = events.len(),
        "[classify] Classified {}",
        log_file.display()
    );

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text => {
            for event in &events {
                println!("{}", render_event(event));
            }
            println!(
                "{}",
                format!("{} events from {}", events.len(), log_file.display()).dimmed()
            );
        }
    }

    Ok(())
}

fn render_event(event: &TraceEvent) -> String {
    match event {
        TraceEvent::FunctionCallStarted { name } => {
            format!("{} {}", "call".yellow(), name.bold())
        }
        TraceEvent::FunctionCallResult { response_text } => {
            format!("{} {}", "  ->".cyan(), response_text)
        }
        TraceEvent::AssistantUtterance { text } => {
            format!("{} {}", "assistant:".green(), text)
        }
    }
}
