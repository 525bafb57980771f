use actix_web::{guard, web};

use crate::error::json_error_handler;
use crate::handlers;

/// Register every route. Shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(handlers::health))
        .route("/ready", web::get().to(handlers::ready))
        .route("/metrics", web::get().to(handlers::metrics))
        .route("/", web::get().to(handlers::index))
        .route("/group/{slug}/", web::get().to(handlers::group_posts))
        .service(
            web::resource("/create/")
                .route(web::get().to(handlers::create_post_form))
                .route(
                    web::post()
                        .guard(guard::fn_guard(handlers::is_multipart))
                        .to(handlers::create_post_upload),
                )
                .route(web::post().to(handlers::create_post)),
        )
        .route("/follow/", web::get().to(handlers::follow_index))
        .service(
            web::scope("/profile/{username}")
                .route("/", web::get().to(handlers::profile))
                .route("/follow/", web::get().to(handlers::profile_follow))
                .route("/unfollow/", web::get().to(handlers::profile_unfollow)),
        )
        .service(
            web::scope("/posts/{post_id}")
                .route("/", web::get().to(handlers::post_detail))
                .service(
                    web::resource("/edit/")
                        .route(web::get().to(handlers::edit_post_form))
                        .route(
                            web::post()
                                .guard(guard::fn_guard(handlers::is_multipart))
                                .to(handlers::edit_post_upload),
                        )
                        .route(web::post().to(handlers::edit_post)),
                )
                .service(
                    web::resource("/comment/")
                        .route(web::get().to(handlers::comment_form))
                        .route(web::post().to(handlers::add_comment)),
                ),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(handlers::signup_form))
                        .route(web::post().to(handlers::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(handlers::login_form))
                        .route(web::post().to(handlers::login)),
                ),
        )
        .route("/media/{key:.+}", web::get().to(handlers::media_file))
        .route("/admin/groups/", web::post().to(handlers::create_group))
        .default_service(web::to(handlers::not_found));
}
