use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::services::AnalysisService;

/// Running application: the HTTP server task
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build the analysis service and spawn the HTTP server
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let analysis_service = AnalysisService::from_config(&config);
        info!(
            "Date column '{}', rainfall column '{}', preview {} rows, upload limit {} bytes",
            config.date_column, config.rainfall_column, config.preview_rows, config.max_upload_bytes
        );

        let app_state = AppState {
            analysis_service,
            max_upload_bytes: config.max_upload_bytes,
        };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        // Bind before spawning so address errors surface from build()
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
