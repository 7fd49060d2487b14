use crate::{ApiError, AppState};
use api_shared::{validate_api_key, API_KEY_HEADER};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

pub(crate) async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if let Err(e) = validate_api_key(provided, &state.api_key) {
        tracing::warn!(path = %request.uri().path(), "rejected request: {}", e);
        return Err(e.into());
    }

    Ok(next.run(request).await)
}
