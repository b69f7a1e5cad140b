use clap::{Args, Subcommand};
use storefront::SearchOptions;
use storefront_app::domain::products::{DEFAULT_LOW_STOCK_THRESHOLD, data::ProductSearch};

use super::{DatabaseArgs, print_json};

#[derive(Debug, Args)]
pub(crate) struct ProductsCommand {
    #[command(subcommand)]
    command: ProductsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductsSubcommand {
    /// Rank products against a free-text query
    Search(SearchArgs),

    /// List in-stock products that are running low
    LowStock(LowStockArgs),

    /// List distinct product categories
    Categories(DatabaseArgs),
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Free-text query
    #[arg(long)]
    query: Option<String>,

    /// Inclusive minimum price in minor units
    #[arg(long)]
    min_price: Option<u64>,

    /// Inclusive maximum price in minor units
    #[arg(long)]
    max_price: Option<u64>,

    /// Exact category
    #[arg(long)]
    category: Option<String>,

    /// Rank the whole catalog rather than text matches only
    #[arg(long)]
    enhanced: bool,
}

#[derive(Debug, Args)]
struct LowStockArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Highest stock level still reported
    #[arg(long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
    threshold: u64,
}

pub(crate) async fn run(command: ProductsCommand) -> Result<(), String> {
    match command.command {
        ProductsSubcommand::Search(args) => search(args).await,
        ProductsSubcommand::LowStock(args) => low_stock(args).await,
        ProductsSubcommand::Categories(args) => categories(args).await,
    }
}

async fn search(args: SearchArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let results = ctx
        .products
        .search_products(ProductSearch {
            filter: SearchOptions {
                query: args.query,
                min_price: args.min_price,
                max_price: args.max_price,
                category: args.category,
            },
            enhanced: args.enhanced,
        })
        .await
        .map_err(|error| format!("search failed: {error}"))?;

    let hits: Vec<_> = results
        .into_iter()
        .map(|hit| {
            serde_json::json!({
                "product": hit.item,
                "score": hit.score,
            })
        })
        .collect();

    print_json(&hits)
}

async fn low_stock(args: LowStockArgs) -> Result<(), String> {
    let ctx = args.database.context().await?;

    let products = ctx
        .products
        .low_stock_products(args.threshold)
        .await
        .map_err(|error| format!("failed to list low-stock products: {error}"))?;

    print_json(&products)
}

async fn categories(args: DatabaseArgs) -> Result<(), String> {
    let ctx = args.context().await?;

    let categories = ctx
        .products
        .categories()
        .await
        .map_err(|error| format!("failed to list categories: {error}"))?;

    print_json(&categories)
}
