use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub tracker: TrackerConfig,
    pub report: ReportConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    /// Externally visible base URL used for attachment links.
    /// When unset, the base is derived from the request's Host header.
    pub public_base_url: Option<String>,
    /// Secret used to sign flash-message cookies
    pub secret_key: String,
}

/// Local attachment storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
}

/// GitHub issue tracker configuration
///
/// Ticket filing is attempted only when both `token` and `repo` are present.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub token: Option<String>,
    /// Repository in "owner/name" form
    pub repo: Option<String>,
    pub api_base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Logo stamped on every page; skipped when the file is absent
    pub logo_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            tracker: TrackerConfig::from_env()?,
            report: ReportConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

/// Read an optional variable, treating an empty value as unset
fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 100 * 1024 * 1024; // 100MB, videos are allowed
    const DEFAULT_SECRET_KEY: &'static str = "devsecret";

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        let public_base_url =
            optional_var("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string());

        let secret_key =
            optional_var("APP_SECRET").unwrap_or_else(|| Self::DEFAULT_SECRET_KEY.to_string());

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            public_base_url,
            secret_key,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            upload_dir: PathBuf::from(upload_dir),
        })
    }
}

impl TrackerConfig {
    const DEFAULT_API_BASE_URL: &'static str = "https://api.github.com";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env() -> Result<Self, String> {
        let token = optional_var("GITHUB_TOKEN");
        let repo = optional_var("GITHUB_REPO");

        if let Some(ref repo) = repo {
            if !repo.contains('/') {
                return Err(format!(
                    "GITHUB_REPO must be in 'owner/name' form, got '{}'",
                    repo
                ));
            }
        }

        let api_base_url = optional_var("GITHUB_API_URL")
            .unwrap_or_else(|| Self::DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = env::var("GITHUB_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "GITHUB_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            token,
            repo,
            api_base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns (token, repo) when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.token, &self.repo) {
            (Some(token), Some(repo)) => Some((token, repo)),
            _ => None,
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, String> {
        let logo_path = env::var("LOGO_PATH").unwrap_or_else(|_| "static/logo.jpeg".to_string());

        Ok(Self {
            logo_path: PathBuf::from(logo_path),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "RCA Report API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Root-cause-analysis report submission and PDF generation".to_string()
        });

        Ok(Self {
            title,
            version,
            description,
        })
    }
}
