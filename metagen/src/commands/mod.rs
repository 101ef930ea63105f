mod generate;
mod list;

use clap::{Parser, Subcommand};
use eyre::Result;
use generate::GenerateCommand;
use list::ListCommand;

#[derive(Parser)]
#[command(name = "metagen")]
#[command(version)]
#[command(about = "Generate C# metadata reader/writer sources from the NativeFormat schema")]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Generate(cmd) => cmd.run(),
            Commands::List(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render the generated C# source files
    Generate(GenerateCommand),

    /// Show the records and enums the generators consume
    List(ListCommand),
}
