use actix_web::{App, HttpServer, middleware};

use crate::api::routes;
use crate::runtime::startup::StartupContext;

pub async fn run_server(ctx: StartupContext) -> std::io::Result<()> {
    let bind_addr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port);

    tracing::info!("Starting HTTP server on {}", bind_addr);

    let storage = ctx.storage.clone();
    let jwt_manager = ctx.jwt_manager.clone();
    let auth = ctx.config.auth.clone();

    HttpServer::new(move || {
        let (storage, jwt_manager, auth) = (storage.clone(), jwt_manager.clone(), auth.clone());

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::DefaultHeaders::new().add(("X-Version", env!("CARGO_PKG_VERSION"))))
            .configure(move |cfg| routes::configure(cfg, storage, jwt_manager, auth))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
