use s3proxy::config::DEFAULT_REGION;
use s3proxy::{
    AppState, BackendKind, BucketConfig, Config, InMemoryStorage, Mount, ObjectStore,
    PathResolver, S3Backend, create_app,
};

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Server configuration
const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

/// s3proxy: serve S3 bucket contents as a static file tree over HTTP
#[derive(Parser, Debug)]
#[command(name = "s3proxy")]
#[command(about = "Serve objects from S3-compatible buckets as files and directories over HTTP", long_about = None)]
struct Cli {
    /// Path to a YAML (or .json) configuration file listing the buckets to serve
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = PORT)]
    port: u16,

    /// Bucket to serve at / when no configuration file is given
    #[arg(long, env = "S3PROXY_BUCKET")]
    bucket: Option<String>,

    /// Bucket region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Custom S3-compatible endpoint URL
    #[arg(long, env = "S3PROXY_ENDPOINT")]
    endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    force_path_style: bool,
}

impl Cli {
    fn load_config(&self) -> Result<Config, String> {
        if let Some(path) = &self.config {
            let config = Config::from_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?;
            tracing::info!("Loaded configuration from {}", path);
            return Ok(config);
        }

        let Some(bucket) = &self.bucket else {
            return Err("No bucket configured. Use --config <path> or --bucket <name>.".to_string());
        };

        let mut bucket_config = BucketConfig::new(bucket.clone(), self.region.clone());
        bucket_config.endpoint = self.endpoint.clone();
        bucket_config.force_path_style = self.force_path_style;
        Ok(Config::single(bucket_config))
    }
}

async fn build_store(bucket: &BucketConfig) -> Result<Arc<dyn ObjectStore>, String> {
    match bucket.backend {
        BackendKind::S3 => {
            let backend = S3Backend::new(
                bucket.name.clone(),
                bucket.name.clone(),
                bucket.region.clone(),
                bucket.endpoint.clone(),
                bucket.force_path_style,
                bucket.access_key_id.clone(),
                bucket.secret_access_key.clone(),
            )
            .await
            .map_err(|e| e.to_string())?;
            tracing::info!(
                "✓ S3 backend '{}' initialized ({})",
                backend.name(),
                bucket.region
            );
            Ok(Arc::new(backend))
        }
        BackendKind::Memory => {
            tracing::warn!(
                "In-memory backend '{}' starts empty; every path will return 404",
                bucket.name
            );
            Ok(Arc::new(InMemoryStorage::new()))
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(1);
    }

    // One store client per bucket, shared by every request
    let mut mounts = Vec::new();
    for bucket in &config.buckets {
        let store = match build_store(bucket).await {
            Ok(store) => store,
            Err(e) => {
                tracing::error!("✗ Failed to initialize bucket '{}': {}", bucket.name, e);
                std::process::exit(1);
            }
        };

        let resolver = PathResolver::new(store)
            .with_listing_mode(bucket.listing)
            .with_page_size(bucket.page_size);
        let mount = Mount::new(&bucket.path, bucket.name.clone(), resolver);

        tracing::info!(
            "Serving bucket '{}' at {} (listing: {:?}, page size: {})",
            mount.bucket,
            mount.path,
            mount.resolver.listing_mode(),
            mount.resolver.page_size()
        );
        mounts.push(mount);
    }

    let app = create_app(AppState::new(mounts));

    // Start server
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("File server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
