use mock_server::{router, AppState, Credentials, Tool};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    init_logging();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    let state = AppState::new(Credentials::from_env(), vec![demo_tool()]);
    mock_server::run(listener, router(state)).await
}

/// `RUST_LOG` wins; otherwise `MOCK_LOG_LEVEL`, defaulting to info.
fn init_logging() {
    let level = std::env::var("MOCK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn demo_tool() -> Tool {
    Tool {
        id: 42,
        name: "Demo".to_string(),
        url: "https://example.com".to_string(),
        logo: String::new(),
        desc: "Seeded entry".to_string(),
        catelog: "demo".to_string(),
        content: "# Demo\n\nEdit me from the admin area.".to_string(),
        sort: 0,
        hide: false,
    }
}
