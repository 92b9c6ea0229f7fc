use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .init();

    if let Err(err) = bus_alert_bot::run().await {
        tracing::error!("Error: {err}");
        std::process::exit(1);
    }
}
