use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use fieldlog::init::{init_from_env, init_tracing_bridge};
use fieldlog::middleware::RequestLoggerLayer;
use fieldlog::{args, Level, LineFormatter, Logger};
use tokio::net::TcpListener;

async fn hello(logger: Logger) -> &'static str {
    logger.with("user", "guest").info("greeting %s", &args!["guest"]);
    "hello\n"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_from_env()?;
    init_tracing_bridge()?;
    fieldlog::set_formatter(Arc::new(LineFormatter::new()));
    fieldlog::set_level(Level::Debug);

    let app = Router::new()
        .route("/hello", get(hello))
        .layer(RequestLoggerLayer::new().with_default_request_id());

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
