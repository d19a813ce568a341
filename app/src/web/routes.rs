// app/src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/auth")
          .route(
            "/signup",
            web::post().to(crate::web::handlers::auth_handlers::signup_handler),
          )
          .route(
            "/signin",
            web::post().to(crate::web::handlers::auth_handlers::signin_handler),
          ),
      )
      .service(
        web::scope("/campaigns")
          .route(
            "",
            web::post().to(crate::web::handlers::campaign_handlers::create_campaign_handler),
          )
          .route(
            "/{campaign_id}",
            web::get().to(crate::web::handlers::campaign_handlers::get_campaign_handler),
          ),
      )
      .service(web::scope("/webhooks").route(
        "/payments",
        web::post().to(crate::web::handlers::webhook_handlers::payment_webhook_handler),
      )),
  );
}
