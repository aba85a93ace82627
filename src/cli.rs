use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal chat client for a local LLM server", long_about = None)]
pub struct Args {
    /// Path to the JSON config file (defaults to ~/.tchat/config.json)
    #[arg(short, long, env = "TCHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip the startup logo
    #[arg(long)]
    pub no_banner: bool,
}
