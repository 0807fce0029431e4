use std::net::SocketAddr;

use interview_coach_backend::{
    config::{get_config, init_config},
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_json);

    let app_state = AppState::from_config(config).await?;
    let mut app = routes::app(app_state, config.api_rps);

    if let Some(dir) = &config.static_dir {
        let index = std::path::Path::new(dir).join("index.html");
        if index.exists() {
            info!("Serving static files from: {}", dir);
            app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
        } else {
            tracing::warn!("STATIC_DIR {} has no index.html; static serving disabled", dir);
        }
    }

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
