//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use tracing::instrument;

use kinniku_core::{OrderStatus, PaymentMethod};

use crate::{
    db::OrderRepository,
    error::AppError,
    middleware::RequireAdminAuth,
    models::{IdentityRecord, Order, OrderStats},
    routes::Flash,
    services::{OrderActions, notifications::variables::group_thousands},
    state::AppState,
};

/// Orders listed under the metrics.
const RECENT_ORDER_LIMIT: usize = 20;

/// Signed-in admin as shown in the header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
}

impl From<&IdentityRecord> for AdminUserView {
    fn from(identity: &IdentityRecord) -> Self {
        Self {
            name: identity.display_name.clone(),
            email: identity.email.to_string(),
        }
    }
}

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub pending: String,
    pub processing: String,
    pub shipped: String,
    pub delivered: String,
    pub total_sales: String,
}

impl From<&OrderStats> for DashboardMetrics {
    fn from(stats: &OrderStats) -> Self {
        Self {
            pending: stats.pending.to_string(),
            processing: stats.processing.to_string(),
            shipped: stats.shipped.to_string(),
            delivered: stats.delivered.to_string(),
            total_sales: format_yen(stats.total_sales),
        }
    }
}

/// Recent order row with the actions it allows.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub number: String,
    pub customer_name: String,
    pub total: String,
    pub payment_method: &'static str,
    pub status: &'static str,
    pub can_confirm_payment: bool,
    pub can_ship: bool,
}

impl From<&Order> for RecentOrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.order_number.clone(),
            customer_name: order.customer.name.clone(),
            total: format_yen(order.total),
            payment_method: payment_method_display(order.payment_method),
            status: order.status.as_str(),
            can_confirm_payment: order.payment_method == PaymentMethod::BankTransfer
                && order.status == OrderStatus::Pending,
            can_ship: matches!(
                order.status,
                OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
            ),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Flash,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<RecentOrderView>,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an amount in yen, e.g. `¥12,800`.
fn format_yen(amount: i64) -> String {
    format!("¥{}", group_thousands(amount))
}

const fn payment_method_display(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CreditCard => "Credit card",
        PaymentMethod::BankTransfer => "Bank transfer",
    }
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state))]
async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<DashboardTemplate, AppError> {
    let actions = OrderActions::new(state.store(), state.mailer());
    let orders = OrderRepository::new(state.store());

    let (stats, recent) = tokio::join!(actions.order_stats(), orders.recent(RECENT_ORDER_LIMIT));
    let stats = stats?;
    let recent = recent?;

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash,
        metrics: DashboardMetrics::from(&stats),
        recent_orders: recent.iter().map(RecentOrderView::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use kinniku_core::{OrderId, PaymentStatus};

    use super::*;
    use crate::models::{Customer, ShippingAddress};

    fn order(method: PaymentMethod, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new("o1"),
            order_number: "KS-1".to_string(),
            customer: Customer {
                name: "山田 太郎".to_string(),
                email: "taro@example.com".to_string(),
            },
            shipping_address: ShippingAddress {
                zip_code: "150-0001".to_string(),
                prefecture: "東京都".to_string(),
                city: "渋谷区".to_string(),
                address: "神宮前1-2-3".to_string(),
                building: None,
            },
            items: Vec::new(),
            subtotal: 1_000_000,
            tax: 0,
            shipping: 0,
            total: 1_234_567,
            payment_method: method,
            payment_status: PaymentStatus::Pending,
            status,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_recent_order_view_actions() {
        let view = RecentOrderView::from(&order(PaymentMethod::BankTransfer, OrderStatus::Pending));
        assert!(view.can_confirm_payment);
        assert!(view.can_ship);
        assert_eq!(view.total, "¥1,234,567");

        let view = RecentOrderView::from(&order(PaymentMethod::CreditCard, OrderStatus::Pending));
        assert!(!view.can_confirm_payment);

        let view = RecentOrderView::from(&order(PaymentMethod::BankTransfer, OrderStatus::Shipped));
        assert!(!view.can_confirm_payment);
        assert!(!view.can_ship);
    }
}
