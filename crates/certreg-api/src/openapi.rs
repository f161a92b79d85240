//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Per-account API token. Configure via CERTREG_API_KEYS as address=token pairs.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI document for the registry service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certificate Registry API",
        description = "Admin-gated certificate ledger.\n\nAdmins issue and revoke certificates for student addresses. Anyone can verify a certificate by student and certificate name, or list the certificates of a student.\n\nMutations require `Authorization: Bearer <token>`; the token identifies the calling address, which must be an admin. Reads are public.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        // -- Admins ----------------------------------------------------------
        crate::routes::admins::add_admin,
        crate::routes::admins::is_admin,
        // -- Certificates ----------------------------------------------------
        crate::routes::certificates::new_certificate,
        crate::routes::certificates::revoke_certificate,
        crate::routes::certificates::verify_certificate,
        crate::routes::certificates::get_certificate,
        crate::routes::certificates::certificates_by_address,
        // -- Journal ---------------------------------------------------------
        crate::routes::journal::list_journal,
        crate::routes::journal::verify_journal,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::admins::AddAdminRequest,
            crate::routes::admins::AdminStatusResponse,
            crate::routes::certificates::NewCertificateRequest,
            crate::routes::certificates::NewCertificateResponse,
            crate::routes::certificates::CertificateResponse,
            crate::routes::certificates::VerifyResponse,
            crate::routes::journal::JournalEntryView,
            crate::routes::journal::JournalPage,
            crate::routes::journal::ChainIntegrityResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "admins", description = "Admin set: grant rights and query membership"),
        (name = "certificates", description = "Issuance, revocation, verification, and lookup"),
        (name = "journal", description = "Hash-chained record of every committed mutation"),
    )
)]
pub struct ApiDoc;

/// Serve the document at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_with_title() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Certificate Registry API");
    }

    #[test]
    fn spec_has_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/v1/admins",
            "/v1/admins/{address}",
            "/v1/certificates",
            "/v1/certificates/{id}/revoke",
            "/v1/certificates/verify",
            "/v1/certificates/{id}",
            "/v1/students/{address}/certificates",
            "/v1/journal",
            "/v1/journal/verify",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_declares_bearer_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
