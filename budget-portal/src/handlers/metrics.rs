use axum::response::IntoResponse;

pub async fn metrics() -> impl IntoResponse {
    portal_core::observability::metrics::gather()
}
