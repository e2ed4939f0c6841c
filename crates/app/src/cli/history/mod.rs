use clap::{Args, Subcommand};

mod list;
mod toggle;

#[derive(Debug, Args)]
pub(crate) struct HistoryCommand {
    #[command(subcommand)]
    command: HistorySubcommand,
}

#[derive(Debug, Subcommand)]
enum HistorySubcommand {
    /// List enabled redemption entries
    List(list::ListHistoryArgs),

    /// Flip an entry between enabled and voided
    Toggle(toggle::ToggleArgs),
}

pub(crate) async fn run(command: HistoryCommand) -> Result<(), String> {
    match command.command {
        HistorySubcommand::List(args) => list::run(args).await,
        HistorySubcommand::Toggle(args) => toggle::run(args).await,
    }
}
