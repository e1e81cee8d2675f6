//! Bakery order website
//!
//! Marketing pages, a cake order form, SQLite persistence of submitted orders
//! and a best-effort WhatsApp notification per order.
//!
//! ## Endpoints
//!
//! - `GET /`, `/gallery`, `/our-cakes` - Marketing pages
//! - `GET /order` - Order form
//! - `POST /order` - Submit an order, then redirect to `/thank-you`
//! - `GET /thank-you` - Confirmation page
//! - `GET /view-orders?admin=1` - Order listing (the flag is not a credential)
//! - `GET /sitemap.xml` - Sitemap
//! - `GET /health` - Health check
//! - `/static/*` - Stylesheets and images

pub mod config;
pub mod handlers;
pub mod notifier;
pub mod storage;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use config::Config;
pub use handlers::AppState;
pub use notifier::{NotifyOutcome, WhatsAppNotifier};
pub use storage::Storage;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/", get(handlers::home_handler))
        .route("/gallery", get(handlers::gallery_handler))
        .route("/our-cakes", get(handlers::our_cakes_handler))
        .route(
            "/order",
            get(handlers::order_form_handler).post(handlers::submit_order_handler),
        )
        .route("/thank-you", get(handlers::thank_you_handler))
        .route("/view-orders", get(handlers::view_orders_handler))
        .route("/sitemap.xml", get(handlers::sitemap_handler))
        .nest_service("/static", static_files)
        .with_state(shared_state)
        .layer(TraceLayer::new_for_http())
}
