mod items;
mod orders;

pub(crate) use items::{PgOrderItemsRepository, PricedLine};
pub(crate) use orders::{PgOrdersRepository, SalesSummary};
