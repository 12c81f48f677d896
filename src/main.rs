mod config;
mod oob;
mod render;
mod routes;
mod services;
mod state;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cfg = config::ServerConfig::from_env();
    let state = state::AppState::new(
        services::board::BoardStore::seeded(),
        cfg.coalesce_window,
        cfg.stream_queue_capacity,
    );

    let app = routes::app(state, &cfg.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cfg.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = cfg.port, "meshboard listening");
    axum::serve(listener, app).await.expect("server failed");
}
