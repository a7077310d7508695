#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Info by default, keep sqlx quiet; RUST_LOG overrides both
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info,sqlx=warn"))
        .init();

    log::info!("GPS tracker: device and location API");

    gps_tracker::run_server().await
}
