//! # Certificate API
//!
//! Issuance and revocation (admin only), plus the public verification and
//! lookup queries.
//!
//! | Method | Path | Access |
//! |---|---|---|
//! | `POST` | `/v1/certificates` | admin |
//! | `POST` | `/v1/certificates/{id}/revoke` | admin |
//! | `GET` | `/v1/certificates/verify` | public |
//! | `GET` | `/v1/certificates/{id}` | public |
//! | `GET` | `/v1/students/{address}/certificates` | public |

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use certreg_core::{check_integer_range, Address, Certificate, CertificateDraft, CertificateId};
use certreg_ledger::{issued_id, LedgerError};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query};
use crate::state::AppState;

// -- DTOs ----------------------------------------------------------------------

/// Request body for `newCertificate`.
///
/// `year` and `score` are any JSON integer here; the range check runs with
/// the other field validation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificateRequest {
    pub student_name: String,
    pub certificate_name: String,
    #[schema(value_type = i64)]
    pub year: serde_json::Number,
    #[schema(value_type = i64)]
    pub score: serde_json::Number,
    /// The student's account address.
    pub student_address: String,
}

/// Identifier of a newly issued certificate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCertificateResponse {
    pub id: u64,
}

/// A certificate record as returned by the queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub id: u64,
    pub student_name: String,
    pub certificate_name: String,
    pub year: u64,
    pub score: u64,
    /// Student address.
    pub student: String,
    /// Admin that issued the certificate.
    pub issuer: String,
    /// `false` once revoked.
    pub valid: bool,
}

impl From<&Certificate> for CertificateResponse {
    fn from(cert: &Certificate) -> Self {
        Self {
            id: cert.id().value(),
            student_name: cert.student_name().to_string(),
            certificate_name: cert.certificate_name().to_string(),
            year: cert.year(),
            score: cert.score(),
            student: cert.student().to_string(),
            issuer: cert.issuer().to_string(),
            valid: cert.is_valid(),
        }
    }
}

/// Query parameters for `verifyCertificate`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    pub student_name: String,
    pub certificate_name: String,
}

/// Outcome of `verifyCertificate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    pub valid: bool,
}

// -- Router --------------------------------------------------------------------

/// Build the certificate router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/certificates", post(new_certificate))
        .route("/v1/certificates/verify", get(verify_certificate))
        .route("/v1/certificates/{id}", get(get_certificate))
        .route("/v1/certificates/{id}/revoke", post(revoke_certificate))
        .route(
            "/v1/students/{address}/certificates",
            get(certificates_by_address),
        )
}

// -- Handlers ------------------------------------------------------------------

/// POST /v1/certificates: issue a certificate.
#[utoipa::path(
    post,
    path = "/v1/certificates",
    security(("bearer_auth" = [])),
    request_body = NewCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = NewCertificateResponse),
        (status = 400, description = "Malformed JSON", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid field or out-of-range number", body = crate::error::ErrorBody),
        (status = 409, description = "Identifier space exhausted", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn new_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<NewCertificateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<NewCertificateResponse>), AppError> {
    let req = extract_json(body)?;
    let year = wire_integer("year", &req.year)?;
    let score = wire_integer("score", &req.score)?;

    let entry = state
        .commit(move |ledger| {
            ledger.admins().gate().check(&caller.address)?;
            let draft = CertificateDraft::new(
                req.student_name,
                req.certificate_name,
                check_integer_range("year", year)?,
                check_integer_range("score", score)?,
                Address::new(req.student_address)?,
            )?;
            ledger.prepare_new_certificate(&caller.address, draft).map(Some)
        })
        .await?;

    let id = entry
        .as_ref()
        .and_then(issued_id)
        .ok_or_else(|| AppError::Internal("issuance committed without an identifier".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(NewCertificateResponse { id: id.value() }),
    ))
}

/// Integer value of a JSON number. Fractions, and integers beyond the 64-bit
/// range (which the decoder turns into floats), are malformed input.
fn wire_integer(field: &str, value: &serde_json::Number) -> Result<i128, AppError> {
    value
        .as_u64()
        .map(i128::from)
        .or_else(|| value.as_i64().map(i128::from))
        .ok_or_else(|| AppError::BadRequest(format!("{field} must be an integer")))
}

/// POST /v1/certificates/{id}/revoke: invalidate a certificate.
/// Revoking an already revoked certificate succeeds without change.
#[utoipa::path(
    post,
    path = "/v1/certificates/{id}/revoke",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Certificate identifier")),
    responses(
        (status = 204, description = "Certificate is revoked"),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = crate::error::ErrorBody),
        (status = 404, description = "No such certificate", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn revoke_certificate(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let raw = extract_path(path)?;

    state
        .commit(move |ledger| {
            ledger.admins().gate().check(&caller.address)?;
            let id = CertificateId::new(raw).map_err(LedgerError::from)?;
            ledger.prepare_revoke_certificate(&caller.address, id)
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/certificates/verify: whether a valid certificate with exactly
/// these names exists.
#[utoipa::path(
    get,
    path = "/v1/certificates/verify",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse),
        (status = 400, description = "Missing query parameter", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn verify_certificate(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let query = extract_query(query)?;
    let valid = state.read(|ledger| {
        ledger.verify_certificate(&query.student_name, &query.certificate_name)
    });
    Ok(Json(VerifyResponse { valid }))
}

/// GET /v1/certificates/{id}: one certificate record.
#[utoipa::path(
    get,
    path = "/v1/certificates/{id}",
    params(("id" = u64, Path, description = "Certificate identifier")),
    responses(
        (status = 200, description = "Certificate found", body = CertificateResponse),
        (status = 404, description = "No such certificate", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<CertificateResponse>, AppError> {
    let id = CertificateId::new(extract_path(path)?)?;
    let cert = state.read(|ledger| ledger.certificate(id).map(CertificateResponse::from))?;
    Ok(Json(cert))
}

/// GET /v1/students/{address}/certificates: every certificate of a student,
/// valid or revoked, in ascending id order.
#[utoipa::path(
    get,
    path = "/v1/students/{address}/certificates",
    params(("address" = String, Path, description = "Student address")),
    responses(
        (status = 200, description = "Certificates of the student", body = Vec<CertificateResponse>),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn certificates_by_address(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<CertificateResponse>>, AppError> {
    let student = Address::new(extract_path(path)?)?;
    let records = state.read(|ledger| {
        ledger
            .certificates_by_address(&student)
            .iter()
            .map(CertificateResponse::from)
            .collect::<Vec<_>>()
    });
    Ok(Json(records))
}
