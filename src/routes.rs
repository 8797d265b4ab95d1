use crate::{
    api::{admin, attendance, media, settings, staff},
    auth::{handlers, middleware::admin_guard},
    config::Config,
    error::{json_error_handler, query_error_handler},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> LimiterConfig {
    let requests_per_min = requests_per_min.clamp(1, 60_000);
    let per_ms = 60_000 / u64::from(requests_per_min);

    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let auth_limiter = build_limiter(config.rate_auth_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let checkin_limiter = build_limiter(config.rate_checkin_per_min);
    let admin_limiter = build_limiter(config.rate_admin_per_min);
    let upload_limiter = build_limiter(config.rate_upload_per_min);

    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler));

    // Token issuance
    cfg.service(
        web::scope("/auth")
            .wrap(Governor::new(&auth_limiter))
            .route("/admin", web::post().to(handlers::admin_login))
            .route("/scan", web::post().to(handlers::scan_login)),
    );

    // Public registration and lookup
    cfg.service(
        web::scope("/staff")
            .service(
                web::resource("")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(staff::register)),
            )
            // /staff/{staff_id}
            .service(web::resource("/{staff_id}").route(web::get().to(staff::get_staff))),
    );
    cfg.route("/departments", web::get().to(staff::list_departments));

    // Kiosk; the handler checks for a scan or admin session
    cfg.service(
        web::resource("/attendance/checkin")
            .wrap(Governor::new(&checkin_limiter))
            .route(web::post().to(attendance::check_in)),
    );

    // Admin dashboard
    cfg.service(
        web::scope("/admin")
            .wrap(from_fn(admin_guard)) // authentication
            .wrap(Governor::new(&admin_limiter)) // rate limiting
            .route("/staff", web::get().to(staff::list_staff))
            .service(
                web::scope("/logs")
                    .route("", web::get().to(admin::list_logs))
                    .route("/grouped", web::get().to(admin::grouped_logs))
                    .route("/export", web::get().to(admin::export_logs)),
            )
            .route("/current-staff", web::get().to(admin::current_staff))
            .route("/absent-staff", web::get().to(admin::absent_staff_list))
            .route("/stats", web::get().to(admin::stats))
            .service(
                web::resource("/settings")
                    .route(web::get().to(settings::get_settings))
                    .route(web::post().to(settings::update_settings)),
            ),
    );

    // Check-in photos
    cfg.service(
        web::scope("/media")
            .service(
                // Size is enforced while streaming the body
                web::resource("/upload")
                    .wrap(Governor::new(&upload_limiter))
                    .route(web::post().to(media::upload_photo)),
            )
            .service(actix_files::Files::new("/files", &config.media_dir)),
    );
}
