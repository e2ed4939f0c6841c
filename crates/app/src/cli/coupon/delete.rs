use clap::Args;
use coupons_app::domain::coupons::records::CouponUuid;

#[derive(Debug, Args)]
pub(crate) struct DeleteArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Coupon UUID
    #[arg(long)]
    uuid: CouponUuid,
}

pub(crate) async fn run(args: DeleteArgs) -> Result<(), String> {
    let context = crate::cli::connect(&args.database_url).await?;

    context
        .coupons
        .delete_coupon(args.uuid)
        .await
        .map_err(|error| format!("failed to delete coupon {}: {error}", args.uuid))?;

    println!("deleted coupon {}", args.uuid);

    Ok(())
}
