//! Request handlers for the bakery website

use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use bakery_common::{field_label, format_order_message, NewOrder, OrderForm, REQUIRED_FIELDS};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tera::{Context, Tera};
use tracing::{debug, error, info, warn};

use crate::{config::Config, notifier::WhatsAppNotifier, storage::Storage};

/// Served at /sitemap.xml when no sitemap file exists
pub const EMPTY_SITEMAP: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    "\n",
    r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#,
    "\n",
);

/// Served at /thank-you when the template is missing
pub const THANK_YOU_FALLBACK: &str = "<h2>Thank you! Your order has been received.</h2>\
     <p><a href='/'>Back to Home</a> | <a href='/order'>Place another order</a></p>";

const THANK_YOU_TEMPLATE: &str = "thank_you.html";

/// Shared application state
pub struct AppState {
    pub storage: Storage,
    pub notifier: WhatsAppNotifier,
    pub templates: Tera,
    pub sitemap_path: PathBuf,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Build state from configuration; does not touch the database
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let storage = Storage::new(config.database_path.clone(), config.db_busy_timeout);
        let notifier = WhatsAppNotifier::new(&config.notifier)?;
        let templates = load_templates(&config.templates_dir)?;

        if !notifier.is_configured() {
            info!("WhatsApp notifications disabled (missing or placeholder API key)");
        }

        Ok(Self {
            storage,
            notifier,
            templates,
            sitemap_path: config.sitemap_path.clone(),
            static_dir: config.static_dir.clone(),
        })
    }

    fn render(&self, name: &str, context: &Context) -> Result<Html<String>, ApiError> {
        self.templates.render(name, context).map(Html).map_err(|e| {
            error!("Failed to render {}: {:?}", name, e);
            ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "This page is not available right now.".to_string(),
            }
        })
    }

    fn has_template(&self, name: &str) -> bool {
        self.templates.get_template_names().any(|n| n == name)
    }
}

/// Load every `.html` template under `dir`
pub fn load_templates(dir: &std::path::Path) -> anyhow::Result<Tera> {
    let glob = format!("{}/**/*.html", dir.display());
    let tera = Tera::new(&glob)
        .map_err(|e| anyhow::anyhow!("Failed to load templates from {}: {}", dir.display(), e))?;

    debug!(
        "Loaded templates: {:?}",
        tera.get_template_names().collect::<Vec<_>>()
    );
    Ok(tera)
}

/// API Error type, rendered as an HTML page
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let title = self.status.canonical_reason().unwrap_or("Error");
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{status}</title></head><body>\
             <h2>{title}</h2><p>{message}</p>\
             <p><a href='/'>Back to Home</a> | <a href='/order'>Order form</a></p>\
             </body></html>",
            status = self.status.as_u16(),
            title = title,
            message = tera::escape_html(&self.message),
        );

        (self.status, Html(body)).into_response()
    }
}

impl From<bakery_common::Error> for ApiError {
    fn from(err: bakery_common::Error) -> Self {
        use bakery_common::Error;

        match err {
            Error::InvalidNumber { field, value } => {
                warn!("Rejected order: {} is not a number: {:?}", field, value);
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    message: format!("{} must be a number.", field_label(field)),
                }
            }
            Error::Constraint(detail) => {
                warn!("Order rejected by store: {}", detail);
                let required: Vec<String> =
                    REQUIRED_FIELDS.iter().map(|f| field_label(f)).collect();
                ApiError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    message: format!(
                        "Some required details are missing. Please fill in: {}.",
                        required.join(", ")
                    ),
                }
            }
            Error::Busy(detail) => {
                warn!("Order store busy: {}", detail);
                ApiError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "We are taking a lot of orders right now. Please try again in a moment."
                        .to_string(),
                }
            }
            other => {
                error!("Storage failure: {}", other);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "We could not save your order. Please try again.".to_string(),
                }
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        error!("Internal error: {:#}", err);
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Something went wrong on our side.".to_string(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        warn!("Unreadable order form: {}", rejection.body_text());
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "We could not read your order form. Please fill it in again.".to_string(),
        }
    }
}

/// Query string of the order listing
#[derive(Debug, Deserialize)]
pub struct ViewOrdersParams {
    pub admin: Option<String>,
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "order-service"
    }))
}

/// Home page
pub async fn home_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    state.render("index.html", &Context::new())
}

/// Cake gallery
pub async fn gallery_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    state.render("gallery.html", &Context::new())
}

/// Flavours and sizes on offer
pub async fn our_cakes_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    state.render("our-cakes.html", &Context::new())
}

/// Empty order form
pub async fn order_form_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    state.render("order.html", &Context::new())
}

/// Take an order: notify the bakery, store the order, redirect to /thank-you
///
/// The notification outcome never affects the rest of the request.
pub async fn submit_order_handler(
    State(state): State<Arc<AppState>>,
    form: Result<Form<OrderForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form?;
    info!("Received order from client: {}", form.client);

    let order = NewOrder::try_from(&form)?;

    let message = format_order_message(&form);
    let outcome = state.notifier.notify(&message).await;
    debug!("Notification outcome: {:?}", outcome);

    let id = state.storage.append(&order).await?;
    info!("Order {} placed for client: {}", id, order.client);

    Ok(Redirect::to("/thank-you"))
}

/// Confirmation page shown after an order is placed
pub async fn thank_you_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    if !state.has_template(THANK_YOU_TEMPLATE) {
        return Ok(Html(THANK_YOU_FALLBACK.to_string()));
    }

    state.render(THANK_YOU_TEMPLATE, &Context::new())
}

/// Order listing, gated by `admin=1`
pub async fn view_orders_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ViewOrdersParams>,
) -> Result<Html<String>, ApiError> {
    if params.admin.as_deref() != Some("1") {
        return Err(ApiError {
            status: StatusCode::FORBIDDEN,
            message: "You are not allowed to view this page.".to_string(),
        });
    }

    let orders = state.storage.list_all().await?;
    info!("Listing {} orders", orders.len());

    let mut context = Context::new();
    context.insert("orders", &orders);
    state.render("view_orders.html", &context)
}

/// Sitemap file, or an empty sitemap when the file is missing
pub async fn sitemap_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let xml = match tokio::fs::read_to_string(&state.sitemap_path).await {
        Ok(xml) => xml,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No sitemap at {}", state.sitemap_path.display());
            EMPTY_SITEMAP.to_string()
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read {}", state.sitemap_path.display()))
                .into())
        }
    };

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}
