use service_core::config::Config as CoreConfig;
use solver_service::config::{HttpConfig, ProviderConfig, SolverConfig};
use solver_service::services::providers::{VisionModel, DEFAULT_MODEL};
use solver_service::startup::Application;
use std::sync::Arc;

/// Upload ceiling used by tests, small enough to exercise the limit cheaply.
pub const TEST_MAX_UPLOAD_BYTES: usize = 8 * 1024;

pub fn test_config() -> SolverConfig {
    SolverConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            debug: false,
        },
        provider: ProviderConfig {
            api_key: None,
            base_url: "http://127.0.0.1:1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
        },
        http: HttpConfig {
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
            cors_allowed_origins: vec!["*".to_string()],
        },
        otlp_endpoint: None,
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(model: Arc<dyn VisionModel>) -> Self {
        Self::spawn_with_config(test_config(), model).await
    }

    pub async fn spawn_with_config(config: SolverConfig, model: Arc<dyn VisionModel>) -> Self {
        let app = Application::build_with_model(config, model)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/api/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub async fn post_solve(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/api/solve", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A few bytes that start like a JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F']
}
