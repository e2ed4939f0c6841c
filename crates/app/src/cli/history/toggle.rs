use clap::Args;
use coupons_app::domain::redemptions::records::RedemptionUuid;

#[derive(Debug, Args)]
pub(crate) struct ToggleArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Redemption entry UUID
    #[arg(long)]
    uuid: RedemptionUuid,
}

pub(crate) async fn run(args: ToggleArgs) -> Result<(), String> {
    let context = crate::cli::connect(&args.database_url).await?;

    let redemption = context
        .redemptions
        .toggle_status(args.uuid)
        .await
        .map_err(|error| format!("failed to toggle redemption {}: {error}", args.uuid))?;

    println!("redemption_uuid: {}", redemption.uuid);
    println!(
        "status: {}",
        if redemption.enabled { "enabled" } else { "voided" }
    );

    Ok(())
}
