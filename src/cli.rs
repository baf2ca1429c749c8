//! `navigator-demo` CLI surface: a handful of flags, no subcommands — the
//! core itself has no CLI per the spec, this is just the embedder shipped
//! with this repo to exercise it.

use clap::Parser;

#[derive(Parser)]
#[command(name = "navigator-demo")]
#[command(version)]
#[command(about = "Terminal demo embedder for the Navigator runtime", long_about = None)]
pub struct Cli {
    /// Enable debug-level logging regardless of RUST_LOG/config.
    #[arg(long)]
    pub debug: bool,

    /// Path to a config TOML file (default: ~/.config/navigator/config.toml).
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Number of navigable cards the demo deck starts with.
    #[arg(long, default_value_t = 5)]
    pub total_cards: i64,

    /// Wrap navigation past the first/last card instead of clamping.
    #[arg(long)]
    pub wrapping: bool,

    /// Run with `MockPlugin` instead of reading the real keyboard (useful
    /// when stdin isn't a TTY, e.g. under CI).
    #[arg(long)]
    pub demo: bool,
}
