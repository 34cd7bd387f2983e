mod logging;
mod trace;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use logging::Logger;
use oromotor::{
    builtin_catalog, ChoiceOutcome, EngineEvent, GestureState, ProfileCatalog, RoundController,
    RoundResult,
};

#[derive(Debug, Parser)]
#[command(name = "round_replay")]
#[command(about = "Replay a face-tracker capture through a game round")]
struct Cli {
    /// CSV capture: ms,detecting,open_ratio,protrusion,roundness,elevation,x
    trace: PathBuf,
    #[arg(long)]
    game: String,
    /// Profile catalogue to load instead of the built-in one.
    #[arg(long)]
    profiles: Option<PathBuf>,
    /// Choice to submit as soon as a choice-mode pattern is waiting for one.
    #[arg(long)]
    choice: Option<String>,
    #[arg(long = "expect-correct")]
    expect_correct: Option<i32>,
    #[arg(long = "log-json")]
    log_json: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Logger::new(level, cli.log_json.clone())?.install()?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let catalog = match &cli.profiles {
        Some(path) => ProfileCatalog::from_path(path)?,
        None => builtin_catalog()?,
    };
    let profile = catalog.require(&cli.game)?.clone();
    let choice = cli
        .choice
        .as_deref()
        .map(|name| GestureState::parse(name).with_context(|| format!("unknown gesture `{name}`")))
        .transpose()?;

    let samples = trace::parse_trace(&cli.trace)?;
    log::info!(
        "replaying {} samples from {} as {}",
        samples.len(),
        cli.trace.display(),
        profile.game_type
    );

    let mut controller = RoundController::new(profile)?;
    let mut result: Option<RoundResult> = None;
    println!("event,ms,kind,detail");
    for sample in samples {
        if let Some(state) = choice.filter(|_| controller.awaiting_choice()) {
            let outcome = controller.set_choice(state);
            println!("event,{},choice,{}", sample.now_ms, choice_label(outcome));
        }
        let output = controller.tick(sample);
        for event in output.events.iter() {
            let (kind, detail) = describe(event);
            println!("event,{},{kind},{detail}", sample.now_ms);
        }
        if output.result.is_some() {
            result = output.result;
        }
    }

    let correct = match &result {
        Some(result) => {
            println!(
                "result,{},{},{},{:.1},{},{}",
                result.game_type,
                result.correct_count,
                result.total_possible,
                result.accuracy_pct,
                result.stars,
                result.xp_awarded
            );
            result.correct_count
        }
        None => {
            let state = controller.round_state();
            log::warn!(
                "trace ended in {} after {} ms; no result",
                state.phase.as_str(),
                state.elapsed_ms
            );
            i32::try_from(state.credited_count).unwrap_or(i32::MAX)
        }
    };

    if let Some(expected) = cli.expect_correct {
        if correct != expected {
            bail!("expected {expected} correct, replay produced {correct}");
        }
    }
    Ok(())
}

fn choice_label(outcome: ChoiceOutcome) -> &'static str {
    match outcome {
        ChoiceOutcome::Accepted => "accepted",
        ChoiceOutcome::Rejected => "rejected",
        ChoiceOutcome::NotAwaiting => "not_awaiting",
    }
}

fn describe(event: &EngineEvent) -> (&'static str, String) {
    match *event {
        EngineEvent::RoundPhaseChanged(phase) => ("phase", phase.as_str().to_owned()),
        EngineEvent::CalibrationPrompt => ("calibration_prompt", String::new()),
        EngineEvent::CountdownTick { remaining } => ("countdown", remaining.to_string()),
        EngineEvent::SignalLost => ("signal_lost", String::new()),
        EngineEvent::SignalRestored => ("signal_restored", String::new()),
        EngineEvent::StableStateChanged(state) => ("stable", state.as_str().to_owned()),
        EngineEvent::HoldProgress { state, progress } => {
            ("hold_progress", format!("{}:{progress:.2}", state.as_str()))
        }
        EngineEvent::EventCredited { kind, count } => {
            ("credited", format!("{}:{count}", kind.as_str()))
        }
        EngineEvent::PatternAdvanced { cursor } => ("pattern_advanced", cursor.to_string()),
        EngineEvent::PatternComplete => ("pattern_complete", String::new()),
        EngineEvent::PatternReset => ("pattern_reset", String::new()),
        EngineEvent::CueIssued {
            target,
            kind,
            window_ms,
        } => (
            "cue",
            format!("{:?}:{}:{window_ms}", kind, target.as_str()).to_lowercase(),
        ),
    }
}
