use clap::Parser;
use console::style;
use std::io;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod app;
mod chat;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod i18n;
mod input;
mod providers;
mod system;

use crate::app::Application;
use crate::cli::Args;
use crate::config::{Config, ConfigStore};
use crate::core::error::TchatError;
use crate::i18n::Messages;
use crate::system::SystemInfo;

fn init_logging() {
    // stdout carries the conversation
    let filter = EnvFilter::try_from_env("TCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<(), TchatError> {
    let system_info = SystemInfo::new();
    debug!(os = %system_info.os_info, locale = %system_info.locale, "starting");

    let messages = Messages::resolve(&system_info.locale);
    let store = ConfigStore::new(args.config.unwrap_or_else(Config::default_path));
    debug!(path = %store.path().display(), "using config file");

    let mut stdout = io::stdout();
    if !args.no_banner {
        display::display_banner(&mut stdout)?;
    }

    let prompter = input::create_prompter()?;
    let mut app = Application::new(
        store,
        messages,
        prompter,
        Box::new(stdout),
        providers::ollama_factory(),
    );
    app.run().await
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("{} {}", style("Error:").bold().red(), e);
        std::process::exit(1);
    }
}
