use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use actix_web::dev::Server;

use crate::logger::LoggerMiddleware;
use crate::routes::{
    create_user, health_check, login, polka_webhook, refresh, revoke, update_user,
};
use crate::session::SessionService;

pub fn run(listener: TcpListener, session: SessionService) -> Result<Server, std::io::Error> {
    let session = web::Data::new(session);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())      // Standard logging
            .wrap(LoggerMiddleware)       // Custom logging

            // Shared state
            .app_data(session.clone())

            .route("/api/healthz", web::get().to(health_check))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/api/polka/webhooks", web::post().to(polka_webhook))

            // PUT is gated by the AuthenticatedUser extractor
            .service(
                web::resource("/api/users")
                    .route(web::post().to(create_user))
                    .route(web::put().to(update_user))
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
