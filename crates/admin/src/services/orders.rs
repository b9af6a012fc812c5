//! Order notification actions.
//!
//! Each action sends the customer email first and only then moves the order
//! status forward. If the email cannot be sent the order is left as it was,
//! so the operator can simply run the action again.

use chrono::{Duration, NaiveDate, Utc};
use thiserror::Error;

use kinniku_core::{OrderId, OrderStatus, TemplateType};

use crate::db::{DocumentStore, OrderRepository, RepositoryError};
use crate::models::{Order, OrderStats};
use crate::services::email::MailTransport;
use crate::services::notifications::variables::group_thousands;
use crate::services::notifications::{NotificationDispatcher, NotificationError, Variables};

/// Days between payment confirmation and the promised shipping date.
const ESTIMATED_SHIPPING_DAYS: i64 = 3;

/// Shown in place of a tracking link for carriers without a known tracking page.
const TRACKING_FALLBACK: &str = "配送業者のサイトで追跡番号をご確認ください";

/// Errors that can occur while running an order action.
#[derive(Debug, Error)]
pub enum OrderActionError {
    /// The order does not exist.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// Operator input was missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The customer email could not be rendered or sent.
    #[error("notification failed: {0}")]
    Notification(#[from] NotificationError),

    /// The order could not be read or updated.
    #[error("order store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Tracking page for a parcel.
///
/// The carrier is matched by name as operators type it (Yamato, Sagawa or
/// Japan Post, in Japanese or English).
#[must_use]
pub fn tracking_url(carrier: &str, tracking_number: &str) -> String {
    let number = urlencoding::encode(tracking_number.trim());
    let lower = carrier.to_lowercase();

    if carrier.contains("ヤマト") || carrier.contains("クロネコ") || lower.contains("yamato") {
        format!("https://jizen.kuronekoyamato.co.jp/jizen/servlet/crjz.b.NQ0010?id={number}")
    } else if carrier.contains("佐川") || lower.contains("sagawa") {
        format!("https://k2k.sagawa-exp.co.jp/p/web/okurijosearch.do?okurijoNo={number}")
    } else if carrier.contains("郵便")
        || carrier.contains("ゆうパック")
        || lower.contains("japan post")
    {
        format!("https://trackings.post.japanpost.jp/services/srv/search/?requestNo1={number}")
    } else {
        TRACKING_FALLBACK.to_string()
    }
}

/// Long Japanese date, e.g. `2024年11月29日`.
#[must_use]
pub fn format_jp_date(date: NaiveDate) -> String {
    date.format("%Y年%-m月%-d日").to_string()
}

/// Today's date in Japan Standard Time.
#[must_use]
pub fn jst_today() -> NaiveDate {
    (Utc::now() + Duration::hours(9)).date_naive()
}

/// Variables for the `payment_confirmed` email.
#[must_use]
pub fn payment_confirmed_variables(order: &Order, today: NaiveDate) -> Variables {
    let estimated = today + Duration::days(ESTIMATED_SHIPPING_DAYS);
    Variables::from([
        ("customer_name".to_string(), order.customer.name.clone()),
        ("order_number".to_string(), order.order_number.clone()),
        ("payment_date".to_string(), format_jp_date(today)),
        ("total".to_string(), group_thousands(order.total)),
        ("estimated_shipping_date".to_string(), format_jp_date(estimated)),
    ])
}

/// Variables for the `shipping_complete` email.
#[must_use]
pub fn shipping_complete_variables(
    order: &Order,
    carrier: &str,
    tracking_number: &str,
    today: NaiveDate,
) -> Variables {
    Variables::from([
        ("customer_name".to_string(), order.customer.name.clone()),
        ("order_number".to_string(), order.order_number.clone()),
        ("shipping_date".to_string(), format_jp_date(today)),
        ("carrier".to_string(), carrier.to_string()),
        ("tracking_number".to_string(), tracking_number.to_string()),
        ("tracking_url".to_string(), tracking_url(carrier, tracking_number)),
        (
            "shipping_address".to_string(),
            order.shipping_address.to_multiline(&order.customer.name),
        ),
    ])
}

/// Order actions available from the console.
pub struct OrderActions<'a> {
    orders: OrderRepository<'a>,
    dispatcher: NotificationDispatcher<'a>,
}

impl<'a> OrderActions<'a> {
    /// Create the order actions service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, transport: &'a dyn MailTransport) -> Self {
        Self {
            orders: OrderRepository::new(store),
            dispatcher: NotificationDispatcher::new(store, transport),
        }
    }

    /// Email the payment confirmation, then mark the order confirmed.
    ///
    /// # Errors
    ///
    /// Returns `OrderActionError::NotFound` if the order does not exist.
    /// Returns `OrderActionError::Notification` if the email fails; the order is unchanged.
    pub async fn confirm_payment(&self, id: &OrderId) -> Result<Order, OrderActionError> {
        let mut order = self.load(id).await?;
        let variables = payment_confirmed_variables(&order, jst_today());

        self.dispatcher
            .dispatch(TemplateType::PaymentConfirmed, &order.customer.email, &variables)
            .await?;
        self.orders.set_status(id, OrderStatus::Confirmed).await?;

        tracing::info!(order_id = %id, order_number = %order.order_number, "Payment confirmed");
        order.status = OrderStatus::Confirmed;
        Ok(order)
    }

    /// Email the shipping notice, then mark the order shipped.
    ///
    /// # Errors
    ///
    /// Returns `OrderActionError::InvalidInput` if carrier or tracking number is blank.
    /// Returns `OrderActionError::NotFound` if the order does not exist.
    /// Returns `OrderActionError::Notification` if the email fails; the order is unchanged.
    pub async fn complete_shipping(
        &self,
        id: &OrderId,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<Order, OrderActionError> {
        let carrier = carrier.trim();
        let tracking_number = tracking_number.trim();
        if carrier.is_empty() {
            return Err(OrderActionError::InvalidInput("carrier is required".to_string()));
        }
        if tracking_number.is_empty() {
            return Err(OrderActionError::InvalidInput(
                "tracking number is required".to_string(),
            ));
        }

        let mut order = self.load(id).await?;
        let variables = shipping_complete_variables(&order, carrier, tracking_number, jst_today());

        self.dispatcher
            .dispatch(TemplateType::ShippingComplete, &order.customer.email, &variables)
            .await?;
        self.orders.set_status(id, OrderStatus::Shipped).await?;

        tracing::info!(
            order_id = %id,
            order_number = %order.order_number,
            carrier = %carrier,
            "Order shipped"
        );
        order.status = OrderStatus::Shipped;
        Ok(order)
    }

    /// Counts per status group and total sales.
    ///
    /// # Errors
    ///
    /// Returns `OrderActionError::Repository` if the store cannot be read.
    pub async fn order_stats(&self) -> Result<OrderStats, OrderActionError> {
        Ok(self.orders.stats().await?)
    }

    async fn load(&self, id: &OrderId) -> Result<Order, OrderActionError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| OrderActionError::NotFound(id.clone()))
    }
}
