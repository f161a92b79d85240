//! # Admin API
//!
//! Grant admin rights and query admin membership.
//!
//! | Method | Path | Access |
//! |---|---|---|
//! | `POST` | `/v1/admins` | admin |
//! | `GET` | `/v1/admins/{address}` | public |

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use certreg_core::Address;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path};
use crate::state::AppState;

/// Request body for `addAdmin`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAdminRequest {
    /// Account to grant admin rights to.
    pub address: String,
}

/// Admin membership of one account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatusResponse {
    pub address: String,
    pub is_admin: bool,
}

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/admins", post(add_admin))
        .route("/v1/admins/{address}", get(is_admin))
}

/// POST /v1/admins: grant admin rights. Re-adding an admin is a no-op.
#[utoipa::path(
    post,
    path = "/v1/admins",
    security(("bearer_auth" = [])),
    request_body = AddAdminRequest,
    responses(
        (status = 204, description = "Account is an admin"),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "admins"
)]
pub async fn add_admin(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<AddAdminRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let req = extract_json(body)?;

    state
        .commit(move |ledger| {
            ledger.admins().gate().check(&caller.address)?;
            let candidate = Address::new(req.address)?;
            ledger.prepare_add_admin(&caller.address, candidate)
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admins/{address}: whether `address` is currently an admin.
#[utoipa::path(
    get,
    path = "/v1/admins/{address}",
    params(("address" = String, Path, description = "Account address")),
    responses(
        (status = 200, description = "Membership", body = AdminStatusResponse),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "admins"
)]
pub async fn is_admin(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AdminStatusResponse>, AppError> {
    let address = Address::new(extract_path(path)?)?;
    let is_admin = state.read(|ledger| ledger.is_admin(&address));
    Ok(Json(AdminStatusResponse {
        address: address.to_string(),
        is_admin,
    }))
}
