use std::sync::Arc;

use actix_middleware::JwtAuthMiddleware;
use actix_web::web;
use crypto_core::JwtCodec;

use crate::error::{json_config, query_config};
use crate::handlers::{appointments, auth, files, health, method_not_allowed, owners, pets};
use crate::metrics;

/// Register every route. Resource routes sit behind bearer authentication;
/// login, files, health and metrics are public.
pub fn configure(codec: Arc<JwtCodec>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(json_config())
            .app_data(query_config())
            .route("/health", web::get().to(health::health_check))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(
                web::resource("/login")
                    .route(web::post().to(auth::login))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/upload")
                    .route(web::post().to(files::upload))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/download")
                    .route(web::get().to(files::download))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/pets")
                    .route(web::get().to(pets::get_pets))
                    .route(web::post().to(pets::create_pet))
                    .route(web::put().to(pets::update_pet))
                    .route(web::delete().to(pets::delete_pet))
                    .default_service(web::to(method_not_allowed))
                    .wrap(JwtAuthMiddleware::new(codec.clone())),
            )
            .service(
                web::resource("/owners")
                    .route(web::get().to(owners::get_owners))
                    .route(web::post().to(owners::create_owner))
                    .route(web::put().to(owners::update_owner))
                    .route(web::delete().to(owners::delete_owner))
                    .default_service(web::to(method_not_allowed))
                    .wrap(JwtAuthMiddleware::new(codec.clone())),
            )
            .service(
                web::resource("/appointments")
                    .route(web::get().to(appointments::get_appointments))
                    .route(web::post().to(appointments::create_appointment))
                    .route(web::put().to(appointments::update_appointment))
                    .route(web::delete().to(appointments::delete_appointment))
                    .default_service(web::to(method_not_allowed))
                    .wrap(JwtAuthMiddleware::new(codec)),
            );
    }
}
