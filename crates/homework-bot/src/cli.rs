use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "homework-bot")]
#[command(author, version, about = "Reports Practicum homework review status changes to Telegram", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Poll the homework API and notify the chat (default)
    Run {
        /// Unix timestamp to start polling from (defaults to the epoch, i.e. full history)
        #[arg(long)]
        from_date: Option<i64>,

        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Validate configuration and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
