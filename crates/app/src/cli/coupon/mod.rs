use clap::{Args, Subcommand};

mod check;
mod delete;
mod import;
mod show;

#[derive(Debug, Args)]
pub(crate) struct CouponCommand {
    #[command(subcommand)]
    command: CouponSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponSubcommand {
    /// Create coupons from a YAML file
    Import(import::ImportArgs),

    /// Print a coupon's rules and usage
    Show(show::ShowArgs),

    /// Check whether a coupon applies to an order
    Check(check::CheckArgs),

    /// Soft-delete a coupon
    Delete(delete::DeleteArgs),
}

pub(crate) async fn run(command: CouponCommand) -> Result<(), String> {
    match command.command {
        CouponSubcommand::Import(args) => import::run(args).await,
        CouponSubcommand::Show(args) => show::run(args).await,
        CouponSubcommand::Check(args) => check::run(args).await,
        CouponSubcommand::Delete(args) => delete::run(args).await,
    }
}
