use clap::{Args, Subcommand};
use jiff::Timestamp;
use storefront::OrderStatus;
use storefront_app::domain::{
    orders::{OrderId, data::DEFAULT_TOP_SELLERS},
    users::UserId,
};

use super::{DatabaseArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Show one order with its items
    Show(ShowArgs),

    /// List orders, newest first
    List(ListArgs),

    /// Move an order to a new status
    Status(StatusArgs),

    /// Cancel an order and return its stock
    Cancel(CancelArgs),

    /// Summarise sales over a time range
    Report(ReportArgs),
}

#[derive(Debug, Args)]
struct ShowArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[arg(long)]
    order: OrderId,

    /// Only show the order if this user placed it
    #[arg(long)]
    user: Option<UserId>,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Only list this user's orders
    #[arg(long)]
    user: Option<UserId>,
}

#[derive(Debug, Args)]
struct StatusArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[arg(long)]
    order: OrderId,

    /// One of: pending, shipped, delivered, cancelled
    #[arg(long)]
    status: String,
}

#[derive(Debug, Args)]
struct CancelArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[arg(long)]
    order: OrderId,
}

#[derive(Debug, Args)]
struct ReportArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Inclusive range start, RFC 3339
    #[arg(long)]
    start: Timestamp,

    /// Inclusive range end, RFC 3339
    #[arg(long)]
    end: Timestamp,

    /// Number of top-selling products to include
    #[arg(long, default_value_t = DEFAULT_TOP_SELLERS)]
    top: u32,
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::Show(args) => show(args).await,
        OrdersSubcommand::List(args) => list(args).await,
        OrdersSubcommand::Status(args) => status(args).await,
        OrdersSubcommand::Cancel(args) => cancel(args).await,
        OrdersSubcommand::Report(args) => report(args).await,
    }
}

async fn show(args: ShowArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let order = ctx
        .orders
        .get_order(args.order)
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    if let Some(user) = args.user
        && !order.is_owned_by(user)
    {
        return Err(format!("order {} was not placed by user {user}", order.id));
    }

    print_json(&order)
}

async fn list(args: ListArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let orders = match args.user {
        Some(user) => ctx.orders.list_user_orders(user).await,
        None => ctx.orders.list_orders().await,
    }
    .map_err(|error| format!("failed to list orders: {error}"))?;

    print_json(&orders)
}

async fn status(args: StatusArgs) -> Result<(), String> {
    let status = args
        .status
        .parse::<OrderStatus>()
        .map_err(|error| error.to_string())?;

    let ctx = args.database.context().await?;

    let order = ctx
        .orders
        .update_order_status(args.order, status)
        .await
        .map_err(|error| format!("failed to update order status: {error}"))?;

    print_json(&order)
}

async fn cancel(args: CancelArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let order = ctx
        .orders
        .cancel_order(args.order)
        .await
        .map_err(|error| format!("failed to cancel order: {error}"))?;

    print_json(&order)
}

async fn report(args: ReportArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let report = ctx
        .orders
        .sales_report(args.start, args.end, args.top)
        .await
        .map_err(|error| format!("failed to build sales report: {error}"))?;

    print_json(&report)
}
