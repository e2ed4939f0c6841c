use clap::Args;
use coupons_app::domain::{
    listing::{DEFAULT_PAGE_LIMIT, Page, PageRequest},
    orders::{CustomerUuid, OrderUuid},
    redemptions::{data::HistoryListOptions, records::RedemptionRecord},
};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};

#[derive(Debug, Args)]
pub(crate) struct ListHistoryArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Only entries for this customer
    #[arg(long)]
    customer: Option<CustomerUuid>,

    /// Only entries for this order
    #[arg(long)]
    order: Option<OrderUuid>,

    /// Sort key, repeatable (date_used desc, date_used asc)
    #[arg(long, default_value = "date_used desc")]
    sort: Vec<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Entries per page
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    page_limit: u32,
}

pub(crate) async fn run(args: ListHistoryArgs) -> Result<(), String> {
    let context = crate::cli::connect(&args.database_url).await?;

    let page = context
        .redemptions
        .list_history(HistoryListOptions {
            page: PageRequest::new(args.page, args.page_limit),
            customer: args.customer,
            order: args.order,
            sort: args.sort,
        })
        .await
        .map_err(|error| format!("failed to list redemption history: {error}"))?;

    if page.items.is_empty() {
        println!("no redemptions found");
        return Ok(());
    }

    println!("{}", render_table(&page));
    println!(
        "page {} of {} ({} entries)",
        page.page,
        page.last_page(),
        page.total
    );

    Ok(())
}

fn render_table(page: &Page<RedemptionRecord>) -> String {
    let mut builder = Builder::default();

    builder.push_record([
        "Redemption",
        "Coupon",
        "Code",
        "Order",
        "Customer",
        "Amount",
        "Min Total",
        "Used At",
    ]);

    for redemption in &page.items {
        builder.push_record([
            redemption.uuid.to_string(),
            redemption.coupon_uuid.to_string(),
            redemption.code.clone(),
            redemption.order_uuid.to_string(),
            redemption
                .customer_uuid
                .map_or_else(|| "guest".to_string(), |customer| customer.to_string()),
            redemption.amount.to_string(),
            redemption.min_total.to_string(),
            redemption.used_at.to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Alignment::center());
    table.modify(Columns::new(5..7), Alignment::right());

    table.to_string()
}
