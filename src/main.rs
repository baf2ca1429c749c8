// navigator-demo - terminal embedder for the Navigator runtime
//
// This binary is not part of the core; it exists to exercise it end to end
// the way a real framework wrapper would:
// - Loads configuration (env > file > defaults, see `navigator_core::config`).
// - Builds a `NavigatorCore` and registers the built-in analyzer plugins
//   (`CognitiveModel`, `IntentPredictor`) plus one input plugin: the real
//   `KeyboardPlugin` against a TTY, or `MockPlugin` under `--demo`/non-TTY.
// - Subscribes to the bus's intent/cognitive-state namespaces and prints
//   them, standing in for a renderer this crate has no opinion about.
// - Runs until Ctrl-C, then tears the core down in lifecycle order.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use navigator_core::cognitive::CognitiveModel;
use navigator_core::config::NavigatorConfig;
use navigator_core::intent::IntentPredictor;
use navigator_core::plugins::{KeyboardPlugin, MockPlugin};
use navigator_core::store::actions::{set_total_cards, set_wrapping};
use navigator_core::{NavigatorCore, NavigatorCoreOptions, RegisterPluginOptions};
use std::io::IsTerminal;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Precedence: CLI flags > env vars > config file > built-in defaults.
    // `NavigatorConfig::from_env` already layers env-over-file-over-defaults;
    // `--debug` on the command line is the one override that wins over all
    // three, since a developer reaching for the flag wants it to take effect
    // immediately regardless of what's on disk.
    let mut config = if let Some(path) = &cli.config {
        NavigatorConfig::load_from(Some(path))
    } else {
        NavigatorConfig::from_env()
    };
    if cli.debug {
        config.debug_mode = true;
    }

    let log_buffer = navigator_core::logging::init(config.debug_mode);
    tracing::info!(history_max_size = config.history_max_size, "navigator-demo starting");

    let core = NavigatorCore::new(NavigatorCoreOptions {
        debug_mode: config.debug_mode,
        auto_start: false,
        initial_state: None,
        history_max_size: config.history_max_size,
        critical_priority_threshold: config.critical_priority_threshold,
    });

    register_input_plugin(&core, &cli)?;

    let cognitive = Arc::new(CognitiveModel::new(config.cognitive_interval_ms, config.cognitive_vote_threshold));
    core.register_plugin(cognitive, RegisterPluginOptions::default())
        .context("registering cognitive-model plugin")?;

    let intent = Arc::new(IntentPredictor::new(config.intent_buffer_size));
    core.register_plugin(intent, RegisterPluginOptions::default())
        .context("registering intent-predictor plugin")?;

    subscribe_demo_observers(&core);

    core.clone().init().await.context("core init failed")?;
    core.clone().start().await.context("core start failed")?;

    // Seed the deck shape the demo navigates over; an embedder with a real
    // UI would dispatch this once it knows its own card count.
    let _ = core.store.dispatch(set_total_cards(cli.total_cards));
    let _ = core.store.dispatch(set_wrapping(cli.wrapping));

    tracing::info!("navigator-demo running; press Ctrl-C to exit, Esc to stop keyboard capture");
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;

    core.clone().stop().await.context("core stop failed")?;
    core.clone().destroy().await.context("core destroy failed")?;

    tracing::info!(log_entries = log_buffer.get_all().len(), "navigator-demo exited cleanly");
    Ok(())
}

/// `--demo`, or stdin not a TTY (e.g. under CI), runs against `MockPlugin`
/// instead of reading the real keyboard.
fn register_input_plugin(core: &Arc<NavigatorCore>, cli: &cli::Cli) -> Result<()> {
    if cli.demo || !std::io::stdin().is_terminal() {
        tracing::info!("running with MockPlugin (no TTY or --demo passed)");
        core.register_plugin(Arc::new(MockPlugin::new()), RegisterPluginOptions::default())
            .context("registering mock input plugin")
    } else {
        core.register_plugin(Arc::new(KeyboardPlugin::new()), RegisterPluginOptions::default())
            .context("registering keyboard input plugin")
    }
}

/// Prints the event-stream observations a real renderer would otherwise
/// consume silently: intent predictions, cognitive-state transitions, and
/// anything the bus routes to `system:error`.
fn subscribe_demo_observers(core: &Arc<NavigatorCore>) {
    core.event_bus.on(
        "intent:stable",
        |evt| {
            println!("[intent] stable: {}", evt.payload);
        },
        Default::default(),
    );
    core.event_bus.on(
        "cognitive_state:change",
        |evt| {
            println!(
                "[cognitive] {} -> {} (confidence {})",
                evt.payload.get("from").and_then(|v| v.as_str()).unwrap_or("?"),
                evt.payload.get("to").and_then(|v| v.as_str()).unwrap_or("?"),
                evt.payload.get("confidence").and_then(|v| v.as_f64()).unwrap_or(0.0),
            );
        },
        Default::default(),
    );
    core.event_bus.on(
        "system:error",
        |evt| {
            tracing::warn!(payload = %evt.payload, "system:error");
        },
        Default::default(),
    );
}
