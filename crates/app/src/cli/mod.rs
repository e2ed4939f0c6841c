use clap::{Parser, Subcommand};
use coupons_app::context::AppContext;

use crate::logging::LoggingConfig;

mod coupon;
mod db;
mod history;

#[derive(Debug, Parser)]
#[command(name = "coupons-app", about = "Coupons CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Coupon(coupon::CouponCommand),
    History(history::HistoryCommand),
}

impl Cli {
    pub(crate) const fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Coupon(command) => coupon::run(command).await,
            Commands::History(command) => history::run(command).await,
        }
    }
}

async fn connect(database_url: &str) -> Result<AppContext, String> {
    AppContext::from_database_url(database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))
}
