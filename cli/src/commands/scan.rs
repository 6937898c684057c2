use std::time::Duration;

use anyhow::bail;
use asnscope_common::config::{Config, OutputDestination, RunConfig};
use asnscope_common::event::Event;
use asnscope_common::network::target::TargetKind;
use asnscope_common::{success, warn};
use asnscope_core::report::EventReceiver;
use asnscope_core::{FinishReason, RunState, Scanner};
use colored::*;
use tracing::{Instrument, info_span};

use crate::aprint;
use crate::commands::ScanArgs;
use crate::terminal::input::{Command, InputHandle};
use crate::terminal::progress::{ProgressView, format_duration};
use crate::terminal::{colors, print};

const REFRESH_EVERY: Duration = Duration::from_secs(1);

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let (targets, _) = args.input.load()?;
    if targets.is_empty() {
        bail!("No input detected. Add ASNs/IPs (one per line).");
    }

    let run = RunConfig {
        proxies: args.load_proxies()?,
        threads: args.threads,
        output: args.destination(),
        base_url: args.base_url.clone(),
        targets,
    };

    print::header("starting scan", cfg.quiet);
    print_plan(&run, cfg);

    let (scanner, events) = Scanner::new();
    scanner.configure(run)?;
    scanner.start()?;

    let span = info_span!("scan", indicatif.pb_show = true);
    let view = ProgressView::new(span.clone());

    let final_state = drive(&scanner, events, view, cfg)
        .instrument(span)
        .await;

    print_summary(&scanner, final_state, cfg);
    Ok(())
}

/// Relays events and operator commands until the run ends.
async fn drive(
    scanner: &Scanner,
    mut events: EventReceiver,
    mut view: ProgressView,
    cfg: &Config,
) -> RunState {
    let mut input = (!cfg.disable_input).then(InputHandle::start);
    let mut interrupted = false;
    let mut ticker = tokio::time::interval(REFRESH_EVERY);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let state = loop {
        tokio::select! {
            Some(event) = events.recv() => show(&event, &mut view, cfg),
            command = next_command(&mut input) => match command {
                Some(Command::TogglePause) => {
                    scanner.toggle_pause();
                    view.set_paused(scanner.state() == RunState::Paused);
                    view.refresh(&scanner.snapshot());
                }
                Some(Command::Stop) => {
                    scanner.stop();
                }
                None => input = None,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                scanner.stop();
            }
            _ = ticker.tick() => view.refresh(&scanner.snapshot()),
            state = scanner.wait() => break state,
        }
    };

    // The run's last lines are already queued by the time it reports finished.
    while let Ok(event) = events.try_recv() {
        show(&event, &mut view, cfg);
    }
    view.refresh(&scanner.snapshot());

    state
}

async fn next_command(input: &mut Option<InputHandle>) -> Option<Command> {
    match input {
        Some(handle) => handle.recv().await,
        None => std::future::pending().await,
    }
}

fn show(event: &Event, view: &mut ProgressView, cfg: &Config) {
    match event {
        Event::Log { text } => {
            if cfg.quiet >= 2 && text.starts_with("[+] Found domain") {
                return;
            }
            print::event_line(text);
        }
        counter => view.apply(counter),
    }
}

fn print_plan(run: &RunConfig, cfg: &Config) {
    if cfg.quiet > 0 {
        return;
    }

    let asns = run.targets.count_of(TargetKind::Asn);
    let hosts = run.targets.count_of(TargetKind::Ipv4);
    print::aligned_line(
        "Targets",
        format!("{} ({asns} ASN, {hosts} IPv4)", run.targets.len()),
    );
    print::aligned_line("Workers", run.threads.to_string());
    print::aligned_line(
        "Proxies",
        match run.proxies.len() {
            0 => "none (direct)".to_string(),
            n => n.to_string(),
        },
    );
    match &run.output {
        OutputDestination::Single(paths) => {
            print::aligned_line("Domains", paths.domains_path.display().to_string());
            print::aligned_line("IPs", paths.ips_path.display().to_string());
        }
        OutputDestination::PerPrefix { dir } => {
            print::aligned_line("Output", format!("{}/ (per prefix)", dir.display()));
        }
    }
    if !cfg.disable_input {
        print::aligned_line("Controls", "p + Enter pause/resume, q + Enter stop");
    }
    aprint!();
}

fn print_summary(scanner: &Scanner, state: RunState, cfg: &Config) {
    let snapshot = scanner.snapshot();
    let counters = snapshot.counters;

    let targets = format!("{}/{}", counters.completed_targets, counters.total_targets);
    let prefixes = format!("{}/{}", counters.processed_prefixes, counters.total_prefixes);
    let elapsed = format_duration(snapshot.elapsed);

    let completed = state == RunState::Finished(FinishReason::Completed);
    let verdict: ColoredString = if completed {
        "Scan Complete".green().bold()
    } else {
        "Scan Stopped".color(colors::WARNING).bold()
    };
    let output: String = format!(
        "{verdict}: {} targets, {} prefixes in {}",
        targets.bold(),
        prefixes.bold(),
        elapsed.bold().yellow()
    );

    match cfg.quiet {
        0 => {
            aprint!();
            print::header("scan summary", cfg.quiet);
            print::aligned_line("State", state.to_string().color(colors::ACCENT));
            print::aligned_line("Targets", targets);
            print::aligned_line("Prefixes", prefixes);
            print::aligned_line("Elapsed", elapsed);
            print::fat_separator();
            print::centerln(&output);
        }
        _ if completed => success!("{output}"),
        _ => warn!("{output}"),
    }
}
