//! Email template management.
//!
//! One row per [`TemplateType`]. Types without a stored template can be
//! seeded individually; the bulk seed only creates missing templates.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::post,
};
use serde::Deserialize;
use tracing::instrument;

use kinniku_core::TemplateType;

use crate::{
    error::AppError,
    middleware::RequireAdminAuth,
    models::EmailTemplate,
    routes::{Flash, dashboard::AdminUserView},
    services::{NotificationDispatcher, NotificationError},
    state::AppState,
};

const PAGE: &str = "/email-templates";

/// One template type as listed on the page.
#[derive(Debug, Clone)]
pub struct TemplateRow {
    pub key: &'static str,
    pub label: &'static str,
    pub template: Option<TemplateView>,
}

/// A stored template.
#[derive(Debug, Clone)]
pub struct TemplateView {
    pub description: String,
    pub subject: String,
    pub body: String,
    pub variables: String,
    pub updated_at: String,
}

impl From<&EmailTemplate> for TemplateView {
    fn from(template: &EmailTemplate) -> Self {
        Self {
            description: template.description.clone(),
            subject: template.subject.clone(),
            body: template.body.clone(),
            variables: template
                .variables
                .iter()
                .map(|v| format!("{{{{{v}}}}}"))
                .collect::<Vec<_>>()
                .join(" "),
            updated_at: template.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Template management page.
#[derive(Template, WebTemplate)]
#[template(path = "email_templates.html")]
pub struct EmailTemplatesTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Flash,
    pub rows: Vec<TemplateRow>,
}

/// Edit form input.
#[derive(Debug, Deserialize)]
pub struct TemplateInput {
    pub subject: String,
    pub body: String,
}

/// Build the email template router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(PAGE, axum::routing::get(index))
        .route("/email-templates/seed", post(seed_all))
        .route("/email-templates/{template_type}/seed", post(seed_one))
        .route("/email-templates/{template_type}", post(update))
}

fn parse_type(raw: &str) -> Result<TemplateType, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("email template {raw}")))
}

fn rows(stored: &[EmailTemplate]) -> Vec<TemplateRow> {
    TemplateType::ALL
        .iter()
        .map(|&template_type| TemplateRow {
            key: template_type.as_str(),
            label: template_type.label(),
            template: stored
                .iter()
                .find(|t| t.template_type == template_type)
                .map(TemplateView::from),
        })
        .collect()
}

/// List templates.
///
/// GET /email-templates
#[instrument(skip(admin, state))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<EmailTemplatesTemplate, AppError> {
    let dispatcher = NotificationDispatcher::new(state.store(), state.mailer());
    let stored = dispatcher.list_templates().await?;

    Ok(EmailTemplatesTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: PAGE.to_string(),
        flash,
        rows: rows(&stored),
    })
}

/// Create every missing template from its default.
///
/// POST /email-templates/seed
#[instrument(skip(_admin, state))]
async fn seed_all(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let dispatcher = NotificationDispatcher::new(state.store(), state.mailer());
    let created = dispatcher.seed_defaults().await?;

    let notice = if created.is_empty() {
        "All templates already exist".to_string()
    } else {
        format!("Created {} template(s)", created.len())
    };
    Ok(Flash::notice(PAGE, &notice))
}

/// Reset one template to its default.
///
/// POST /email-templates/{type}/seed
#[instrument(skip(_admin, state))]
async fn seed_one(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(template_type): Path<String>,
) -> Result<Redirect, AppError> {
    let template_type = parse_type(&template_type)?;
    let dispatcher = NotificationDispatcher::new(state.store(), state.mailer());
    dispatcher.seed_template(template_type).await?;

    Ok(Flash::notice(
        PAGE,
        &format!("{} reset to default", template_type.label()),
    ))
}

/// Save subject and body of an existing template.
///
/// POST /email-templates/{type}
#[instrument(skip(_admin, state, input))]
async fn update(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(template_type): Path<String>,
    Form(input): Form<TemplateInput>,
) -> Result<Redirect, AppError> {
    let template_type = parse_type(&template_type)?;
    if input.subject.trim().is_empty() || input.body.trim().is_empty() {
        return Ok(Flash::error(PAGE, "Subject and body are required"));
    }

    let dispatcher = NotificationDispatcher::new(state.store(), state.mailer());
    match dispatcher
        .update_template(template_type, &input.subject, &input.body)
        .await
    {
        Ok(()) => Ok(Flash::notice(
            PAGE,
            &format!("{} saved", template_type.label()),
        )),
        Err(NotificationError::TemplateNotFound(_)) => Ok(Flash::error(
            PAGE,
            "Template does not exist yet; seed it first",
        )),
        Err(e) => Err(e.into()),
    }
}
