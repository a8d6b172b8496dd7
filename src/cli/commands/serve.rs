use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::{AppConfig, initialize_app_state};
use crate::router::create_router;

pub async fn serve() -> Result<()> {
    info!("Cardfolio application starting up");

    let config = AppConfig::from_env();
    debug!("Database URL: {}", config.database_url);
    debug!("Bind address: {}", config.bind_address);

    // Initialize application state
    let state = match initialize_app_state(&config).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", config.bind_address);
    let listener = match TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", config.bind_address, e);
            return Err(e.into());
        }
    };

    info!("Cardfolio API server running on http://{}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
