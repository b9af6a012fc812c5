//! Order action handlers.
//!
//! Both actions email the customer before the status changes. A failed
//! email leaves the order as it was and the error is shown on the dashboard.

use axum::{
    Form, Router,
    extract::{Path, State},
    response::Redirect,
    routing::post,
};
use serde::Deserialize;
use tracing::instrument;

use kinniku_core::OrderId;

use crate::{
    error::AppError,
    middleware::RequireAdminAuth,
    routes::Flash,
    services::{NotificationError, OrderActionError, OrderActions},
    state::AppState,
};

const DASHBOARD: &str = "/";

/// Input for marking an order shipped.
#[derive(Debug, Deserialize)]
pub struct ShipInput {
    /// Carrier name as typed by the operator.
    pub carrier: String,
    /// Carrier tracking number.
    pub tracking_number: String,
}

/// Build the order action router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/confirm-payment", post(confirm_payment))
        .route("/orders/{id}/ship", post(ship))
}

/// Turn an action result into a dashboard redirect.
///
/// Operator-fixable failures become a flash message; store failures are errors.
fn action_outcome(
    result: Result<String, OrderActionError>,
) -> Result<Redirect, AppError> {
    match result {
        Ok(notice) => Ok(Flash::notice(DASHBOARD, &notice)),
        Err(OrderActionError::InvalidInput(msg)) => Ok(Flash::error(DASHBOARD, &msg)),
        Err(OrderActionError::Notification(e)) => {
            tracing::error!(error = %e, "Order notification failed");
            let msg = match e {
                NotificationError::TemplateNotFound(t) => {
                    format!("No {} template is stored; seed it first", t.label())
                }
                _ => "Failed to send email; the order was not changed".to_string(),
            };
            Ok(Flash::error(DASHBOARD, &msg))
        }
        Err(e) => Err(e.into()),
    }
}

/// Confirm a bank transfer and email the customer.
///
/// POST /orders/{id}/confirm-payment
#[instrument(skip(_admin, state))]
async fn confirm_payment(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Redirect, AppError> {
    let actions = OrderActions::new(state.store(), state.mailer());
    let result = actions
        .confirm_payment(&id)
        .await
        .map(|order| format!("Payment confirmed for {}", order.order_number));

    action_outcome(result)
}

/// Mark an order shipped and email the tracking details.
///
/// POST /orders/{id}/ship
#[instrument(skip(_admin, state))]
async fn ship(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(input): Form<ShipInput>,
) -> Result<Redirect, AppError> {
    let actions = OrderActions::new(state.store(), state.mailer());
    let result = actions
        .complete_shipping(&id, &input.carrier, &input.tracking_number)
        .await
        .map(|order| format!("{} marked as shipped", order.order_number));

    action_outcome(result)
}
