use axum::routing::get;
use axum::Router;

use crate::handlers::invoke;
use crate::state::AppState;

/// Live script endpoints, mounted at the root.
///
/// ```text
/// GET    /run/{principal}/{*file}     -> invoke_script
/// POST   /run/{principal}/{*file}     -> invoke_script (body -> stdin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/run/{principal}/{*file}",
        get(invoke::invoke_script).post(invoke::invoke_script),
    )
}
