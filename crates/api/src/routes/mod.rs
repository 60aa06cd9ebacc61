use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use arbor_domain::error::DomainError;
use arbor_domain::ports::graph::StoreError;

use crate::error::{ApiError, FieldError};
use crate::{middleware as app_middleware, observability, state::AppState};

mod categories;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/categories/:category_id",
            axum::routing::patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route_layer(middleware::from_fn(app_middleware::metrics_layer));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(api)
        .layer(app_middleware::timeout_layer(&state.config))
        .layer(app_middleware::catch_panic_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ))
        .layer(app_middleware::cors_layer(&state.config))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    graph_store: GraphStoreHealth,
}

#[derive(Serialize)]
struct GraphStoreHealth {
    backend: &'static str,
    status: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let graph_store = match &state.graph_store {
        None => GraphStoreHealth {
            backend: "memory",
            status: "ok",
        },
        Some(store) => match store.health_check().await {
            Ok(()) => GraphStoreHealth {
                backend: store.name(),
                status: "ok",
            },
            Err(err) => {
                tracing::warn!(
                    backend = store.name(),
                    error = %err,
                    "graph store health check failed"
                );
                GraphStoreHealth {
                    backend: store.name(),
                    status: "degraded",
                }
            }
        },
    };

    Json(HealthResponse {
        status: if graph_store.status == "ok" {
            "ok"
        } else {
            "degraded"
        },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
        graph_store,
    })
}

async fn metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

pub(crate) fn map_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { field, message } => ApiError::Validation {
            developer_message: Some(message.clone()),
            fields: vec![FieldError { field, message }],
        },
        DomainError::UserNotFound => ApiError::UserNotFound,
        DomainError::CategoryNotFound => ApiError::CategoryNotFound,
        DomainError::Store(err) => {
            observability::register_graph_store_error(store_error_kind(&err));
            tracing::error!(error = %err, "graph store operation failed");
            ApiError::Internal
        }
    }
}

fn store_error_kind(err: &StoreError) -> &'static str {
    match err {
        StoreError::Unavailable(_) => "unavailable",
        StoreError::Operation(_) => "operation",
        StoreError::Decode { .. } => "decode",
        StoreError::EmptyResult(_) => "empty_result",
    }
}
