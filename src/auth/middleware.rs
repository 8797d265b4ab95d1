use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::{debug, warn};

use crate::auth::auth::{Session, authenticate};
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;

/// Guards the admin scope: every request must carry a valid admin token.
/// The verified [`Session`] is stored in request extensions for handlers.
pub async fn admin_guard(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let verified: Result<Session, AppError> = match req.app_data::<Data<Config>>() {
        Some(config) => authenticate(req.headers(), config)
            .and_then(|session| session.require(&[Role::Admin]).map(|_| session)),
        None => Err(AppError::ServerMisconfigured("App config missing".into())),
    };

    let session = match verified {
        Ok(session) => session,
        Err(e) => {
            warn!(path = %req.path(), error = %e, "Rejected admin request");
            let resp = e.error_response();
            return Ok(req.into_response(resp));
        }
    };

    debug!(jti = %session.token_id, exp = session.expires_at, "Admin session verified");
    req.extensions_mut().insert(session);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::generate_token;
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test as actix_test, web};

    async fn whoami(session: Session) -> HttpResponse {
        HttpResponse::Ok().body(session.role.to_string())
    }

    fn token(role: Role) -> String {
        generate_token(role, "test-secret", 60).unwrap().0
    }

    #[actix_web::test]
    async fn admin_token_passes_and_session_reaches_handler() {
        let app = actix_test::init_service(
            App::new().app_data(Data::new(Config::for_tests())).service(
                web::scope("/admin")
                    .wrap(from_fn(admin_guard))
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/admin/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Admin))))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(resp).await, "admin");
    }

    #[actix_web::test]
    async fn scan_token_and_missing_token_are_unauthorized() {
        let app = actix_test::init_service(
            App::new().app_data(Data::new(Config::for_tests())).service(
                web::scope("/admin")
                    .wrap(from_fn(admin_guard))
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/admin/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token(Role::Scan))))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = actix_test::TestRequest::get().uri("/admin/whoami").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["error"], "Unauthorized");
    }
}
