//! av-deck - bind MIDI controllers to a deck of virtual controls
//!
//! Loads a control layout from YAML, connects to a MIDI input port and
//! runs a REPL for driving controls and learning hardware bindings.

use anyhow::Result;
use clap::Parser;
use colored::*;
use serde_json::Value;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use av_deck::bus::SignalBus;
use av_deck::cli::{self, Command, PresetAction};
use av_deck::config::AppConfig;
use av_deck::control::Control;
use av_deck::deck::Deck;
use av_deck::mapping::{MappingRegistry, MidiSource};
use av_deck::signal::Signal;
use av_deck::transport::MidiTransport;

/// av-deck - Bind MIDI controllers to virtual decks of controls
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to layout file
    #[arg(short, long, default_value = "layout.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    if args.list_ports {
        print_ports()?;
        return Ok(());
    }

    info!("Starting av-deck...");
    info!("Layout file: {}", args.config);

    let config = AppConfig::load(&args.config).await?;
    let mut deck = Deck::from_specs(config.controls);
    info!("Deck initialized with {} top-level control(s)", deck.len());

    // Preset loads emit their snapshot through the on_update hook; the
    // event loop applies it to the deck from this channel.
    let (restore_tx, mut restore_rx) = mpsc::unbounded_channel::<Value>();
    wire_preset_hooks(&mut deck, restore_tx);

    let mut registry = MappingRegistry::new();

    // Hardware frames arrive on the midir callback thread; the bus
    // forwards decoded signals into the event loop over this channel.
    let (signal_tx, mut signal_rx) = mpsc::unbounded_channel::<Signal>();
    let bus = SignalBus::new();
    bus.subscribe(move |signal: &Signal| {
        let _ = signal_tx.send(signal.clone());
    });

    let _transport = if config.midi.input_port.is_empty() {
        info!("No MIDI input port configured, running without hardware");
        None
    } else {
        let transport = MidiTransport::connect(&config.midi.input_port, bus.clone())?;
        info!("MIDI input connected: {}", transport.port_name());
        Some(transport)
    };

    let mut cmd_rx = cli::spawn_repl();

    // `map` arms this; the next hardware signal becomes the pending
    // learn source.
    let mut capture_armed = false;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Ready. Type 'map' then touch a control to bind hardware.");

    loop {
        let disarm_deadline = deck.next_disarm_deadline();

        tokio::select! {
            Some(signal) = signal_rx.recv() => {
                debug!("signal: {}", signal);
                if capture_armed {
                    capture_armed = false;
                    registry.begin_learn(MidiSource::from_signal(&signal));
                    println!(
                        "Captured {}. Now 'touch' the control to bind it.",
                        signal.source_id().to_string().bold()
                    );
                } else {
                    registry.dispatch(&mut deck, &signal);
                }
            }

            Some(command) = cmd_rx.recv() => {
                if command == Command::Exit {
                    break;
                }
                if let Err(e) = handle_command(
                    command,
                    &mut deck,
                    &mut registry,
                    &mut capture_armed,
                ).await {
                    eprintln!("{} {}", "error:".red(), e);
                }
            }

            Some(snapshot) = restore_rx.recv() => {
                deck.restore(&snapshot);
            }

            _ = sleep_until_opt(disarm_deadline) => {
                deck.expire_disarms(Instant::now());
                debug!("confirm window expired");
            }

            _ = &mut shutdown => {
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

/// Sleep until `deadline`, or forever when no confirm control is armed
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending().await,
    }
}

/// Route preset button snapshot emissions into `tx`
fn wire_preset_hooks(deck: &mut Deck, tx: mpsc::UnboundedSender<Value>) {
    let ids: Vec<String> = deck.ids().map(str::to_string).collect();
    for id in ids {
        let path = [id.clone()];
        if let Some(control) = deck.control_mut(&path) {
            if matches!(control, Control::PresetButton(_)) {
                let tx = tx.clone();
                control.hooks_mut().set_on_update(move |snapshot: &Value| {
                    let _ = tx.send(snapshot.clone());
                });
                debug!("wired preset hook for '{}'", id);
            }
        }
    }
}

async fn handle_command(
    command: Command,
    deck: &mut Deck,
    registry: &mut MappingRegistry,
    capture_armed: &mut bool,
) -> Result<()> {
    match command {
        Command::Map => {
            *capture_armed = true;
            println!("Move a hardware control to capture it...");
        }
        Command::Unmap => {
            registry.arm_unbind();
            println!("Touch a control to remove its bindings...");
        }
        Command::Cancel => {
            *capture_armed = false;
            registry.cancel_learn();
            registry.cancel_unbind();
            println!("Cancelled.");
        }
        Command::Touch(path) => {
            registry.touch(deck, &path);
        }
        Command::Set(path, value) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::Fader(f)) => f.set_value(value),
                Some(_) => warn!("'{}' is not a fader", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Press(path) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::Pad(p)) => {
                    p.press(1.0);
                    p.release();
                }
                Some(Control::ConfirmButton(c)) => {
                    c.press();
                    if c.awaiting_confirmation() {
                        println!("Press again to confirm.");
                    }
                }
                Some(Control::ConfirmSwitch(c)) => {
                    c.press();
                    if c.awaiting_confirmation() {
                        println!("Press again to confirm.");
                    }
                }
                Some(_) => warn!("'{}' is not pressable", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Release(path) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::Pad(p)) => p.release(),
                Some(_) => warn!("'{}' is not a pad", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Toggle(path) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::Switch(s)) => s.toggle(),
                Some(_) => warn!("'{}' is not a switch", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Select(path, index) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::Selector(s)) => s.select(index),
                Some(_) => warn!("'{}' is not a selector", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Page(path, name) => {
            registry.touch(deck, &path);
            match deck.control_mut(&path) {
                Some(Control::TabbedPages(t)) => t.select_page(&name),
                Some(_) => warn!("'{}' is not a tabbed-pages control", path.join("/")),
                None => warn!("no control at '{}'", path.join("/")),
            }
        }
        Command::Preset(path, action) => {
            handle_preset(deck, &path, action).await?;
        }
        Command::State => {
            print_state(deck, registry);
        }
        Command::Ports => {
            print_ports()?;
        }
        Command::Exit => unreachable!("handled by the event loop"),
    }
    Ok(())
}

async fn handle_preset(deck: &mut Deck, path: &[String], action: PresetAction) -> Result<()> {
    // Snapshot before borrowing the button mutably; the button itself
    // contributes nothing to the snapshot.
    let snapshot = deck.snapshot();

    let Some(Control::PresetButton(button)) = deck.control_mut(path) else {
        warn!("no preset button at '{}'", path.join("/"));
        return Ok(());
    };

    match action {
        PresetAction::Save(id) => {
            button.save(&id, snapshot);
            println!("Saved preset '{}' ({} total)", id, button.len());
        }
        PresetAction::Load(id) => button.load(&id),
        PresetAction::Delete(id) => {
            button.delete(&id);
            println!("Deleted preset '{}' ({} left)", id, button.len());
        }
        PresetAction::Next => button.next_in_row(),
        PresetAction::Random => button.random(),
        PresetAction::Export(file) => {
            let document = serde_json::to_string_pretty(&button.export())?;
            tokio::fs::write(&file, document).await?;
            println!("Exported presets to {}", file.display());
        }
        PresetAction::Import(file) => {
            let contents = tokio::fs::read_to_string(&file).await?;
            let document: Value = serde_json::from_str(&contents)?;
            let count = deck
                .control_mut(path)
                .and_then(|c| match c {
                    Control::PresetButton(b) => Some(b),
                    _ => None,
                })
                .expect("checked above")
                .import(&document)?;
            println!("Imported {} preset(s) from {}", count, file.display());
        }
    }

    Ok(())
}

fn print_state(deck: &Deck, registry: &MappingRegistry) {
    println!("\n{}", "=== Deck state ===".bold().cyan());
    match serde_json::to_string_pretty(&deck.snapshot()) {
        Ok(s) => println!("{}", s),
        Err(e) => warn!("failed to render snapshot: {}", e),
    }

    println!("\n{}", "=== Mappings ===".bold().cyan());
    if registry.is_empty() {
        println!("  {}", "No mappings".dimmed());
    } else {
        for mapping in registry.mappings() {
            println!(
                "  {} {} {}",
                mapping.source.id.to_string().bright_white(),
                "->".dimmed(),
                mapping.target.join("/")
            );
        }
    }
    println!();
}

fn print_ports() -> Result<()> {
    println!("\n{}", "=== Available MIDI Input Ports ===".bold().cyan());
    let ports = MidiTransport::list_input_ports()?;
    if ports.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    } else {
        for port in ports {
            println!("  {}", port);
        }
    }
    println!();
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
