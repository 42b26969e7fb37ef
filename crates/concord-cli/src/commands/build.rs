//! Build command - classify the sentences of a document.

use chrono::SecondsFormat;
use colored::Colorize;
use concord::{SegmentView, SentenceState, Window};

use crate::cli::TargetArgs;

pub fn run(
    target: TargetArgs,
    window: Option<Window>,
    disagreements_only: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = super::open(&target, window)?;
    let mut state = session.state;
    let container = session.builder.build(&mut state)?;

    let shown: Vec<&SegmentView> = container
        .iter()
        .filter(|view| !disagreements_only || view.state().is_disagree())
        .collect();

    if json_output {
        let report = serde_json::json!({
            "document": state.document.to_string(),
            "mode": state.mode,
            "user": state.user,
            "segments": container.len(),
            "agreeing": container.agreeing(),
            "disagreeing": container.disagreeing(),
            "document_timestamp": state
                .document_timestamp
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            "sentences": shown,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Consensus for".cyan().bold(),
        state.document.to_string().white(),
        state.mode
    );
    println!();

    for view in &shown {
        let verdict = match view.state() {
            SentenceState::Agree => "AGREE   ".green(),
            SentenceState::Disagree => "DISAGREE".red().bold(),
        };
        let addresses: Vec<String> = view
            .source_addresses()
            .iter()
            .map(|(annotator, address)| format!("{}{}", annotator, address))
            .collect();
        println!(
            "  {:>4}  [{:>6}, {:>6})  {}  {}",
            view.sequence_number(),
            view.begin(),
            view.end(),
            verdict,
            addresses.join(" ").dimmed()
        );
    }
    if !shown.is_empty() {
        println!();
    }

    println!("{}", "Summary:".yellow().bold());
    println!("  Sentences:   {}", container.len().to_string().white());
    println!("  Agreeing:    {}", container.agreeing().to_string().green());
    println!("  Disagreeing: {}", container.disagreeing().to_string().red());

    if let Some(first) = container.iter().find(|view| view.state().is_disagree()) {
        println!();
        println!(
            "First disagreement at sentence {} (offset {}).",
            first.sequence_number().to_string().cyan().bold(),
            first.begin()
        );
    }

    Ok(())
}
