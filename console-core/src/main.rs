use console_core::orders::{ORDERS, OrderFilter, cancellation_breakdown, order_stats};
use console_core::{Config, ConsoleState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir.display(),
        "Console core starting"
    );
    if config.is_production() && config.bootstrap_admin_emails.is_empty() {
        tracing::warn!("No bootstrap admin emails configured; only the first sign-in becomes super admin");
    }

    let state = ConsoleState::initialize(&config)?;
    let orders = state.orders.list_orders(&OrderFilter::default())?;

    let stats = order_stats(&orders);
    tracing::info!(
        collection = ORDERS,
        total = stats.total,
        searching = stats.searching,
        active = stats.active,
        completed = stats.completed,
        cancelled = stats.cancelled,
        unknown = stats.unknown,
        completed_revenue = stats.completed_revenue,
        commission_total = stats.commission_total,
        average_rating = ?stats.average_rating,
        "Order statistics"
    );

    let breakdown = cancellation_breakdown(&orders);
    for (category, count) in &breakdown.by_category {
        tracing::info!(category = %category, count, "Cancelled orders by category");
    }
    for (failure, count) in &breakdown.search_failures {
        tracing::info!(failure = %failure, count, "Search timeouts by reason");
    }

    Ok(())
}
