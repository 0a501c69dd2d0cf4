use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub stripe: StripeConfig,
    pub generation: GenerationConfig,
    pub minio: MinIOConfig,
    pub cleanup: CleanupConfig,
    pub retry: RetryConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    pub frontend_url: String,
    /// Whether the session cookie carries the Secure attribute
    pub cookie_secure: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Stripe checkout configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base_url: String,
    /// Price of one generation in minor units (cents)
    pub price_cents: i64,
    /// ISO currency code, lowercase
    pub currency: String,
    pub request_timeout_secs: u64,
}

/// External image-generation API configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

/// MinIO/S3 storage configuration for session blobs
///
/// Every object in the bucket is private; access goes through presigned URLs.
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing session blobs
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Presigned URL expiry time in seconds
    pub presigned_url_expiry_secs: u32,
}

/// Background cleanup sweeper configuration
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Bearer token guarding the manual cleanup trigger endpoint
    pub bearer_token: String,
    /// Interval between automatic sweeps
    pub interval: Duration,
}

/// Retry policy applied to every outbound provider call
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            stripe: StripeConfig::from_env()?,
            generation: GenerationConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            cleanup: CleanupConfig::from_env()?,
            retry: RetryConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
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

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let cookie_secure = env::var("COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .map_err(|_| "COOKIE_SECURE must be true or false".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            frontend_url,
            cookie_secure,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl StripeConfig {
    const DEFAULT_API_BASE_URL: &'static str = "https://api.stripe.com";
    const DEFAULT_PRICE_CENTS: i64 = 500; // EUR 5.00
    const DEFAULT_CURRENCY: &'static str = "eur";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

    pub fn from_env() -> Result<Self, String> {
        let secret_key = env::var("STRIPE_SECRET_KEY")
            .map_err(|_| "STRIPE_SECRET_KEY environment variable is required".to_string())?;

        let webhook_secret = env::var("STRIPE_WEBHOOK_SECRET")
            .map_err(|_| "STRIPE_WEBHOOK_SECRET environment variable is required".to_string())?;

        let api_base_url = env::var("STRIPE_API_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE_URL.to_string());

        let price_cents = env::var("SELFIE_PRICE_CENTS")
            .unwrap_or_else(|_| Self::DEFAULT_PRICE_CENTS.to_string())
            .parse::<i64>()
            .map_err(|_| "SELFIE_PRICE_CENTS must be a valid number".to_string())?;

        if price_cents <= 0 {
            return Err("SELFIE_PRICE_CENTS must be positive".to_string());
        }

        let currency = env::var("SELFIE_CURRENCY")
            .unwrap_or_else(|_| Self::DEFAULT_CURRENCY.to_string())
            .to_lowercase();

        let request_timeout_secs = env::var("STRIPE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "STRIPE_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            secret_key,
            webhook_secret,
            api_base_url,
            price_cents,
            currency,
            request_timeout_secs,
        })
    }
}

impl GenerationConfig {
    const DEFAULT_BASE_URL: &'static str = "https://fal.ai/api";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("FAL_KEY")
            .map_err(|_| "FAL_KEY environment variable is required".to_string())?;

        let base_url =
            env::var("FAL_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());

        let request_timeout_secs = env::var("FAL_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "FAL_REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            api_key,
            base_url,
            request_timeout_secs,
        })
    }
}

impl MinIOConfig {
    const DEFAULT_PRESIGNED_URL_EXPIRY_SECS: u32 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "lumishot-sessions".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let presigned_url_expiry_secs = env::var("MINIO_PRESIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_PRESIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| "MINIO_PRESIGNED_URL_EXPIRY_SECS must be a valid number".to_string())?;

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            presigned_url_expiry_secs,
        })
    }
}

impl CleanupConfig {
    const DEFAULT_INTERVAL_SECS: u64 = 7200; // 2 hours

    pub fn from_env() -> Result<Self, String> {
        let bearer_token = env::var("CLEANUP_BEARER_TOKEN")
            .map_err(|_| "CLEANUP_BEARER_TOKEN environment variable is required".to_string())?;

        if bearer_token.is_empty() {
            return Err("CLEANUP_BEARER_TOKEN must not be empty".to_string());
        }

        let interval_secs = env::var("CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "CLEANUP_INTERVAL_SECS must be a valid number".to_string())?;

        Ok(Self {
            bearer_token,
            interval: Duration::from_secs(interval_secs),
        })
    }
}

impl RetryConfig {
    const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    const DEFAULT_BASE_DELAY_MS: u64 = 500;
    const DEFAULT_MAX_DELAY_MS: u64 = 5000;

    pub fn from_env() -> Result<Self, String> {
        let max_attempts = env::var("RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_ATTEMPTS.to_string())
            .parse::<u32>()
            .map_err(|_| "RETRY_MAX_ATTEMPTS must be a valid number".to_string())?;

        if max_attempts == 0 {
            return Err("RETRY_MAX_ATTEMPTS must be at least 1".to_string());
        }

        let base_delay_ms = env::var("RETRY_BASE_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "RETRY_BASE_DELAY_MS must be a valid number".to_string())?;

        let max_delay_ms = env::var("RETRY_MAX_DELAY_MS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_DELAY_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "RETRY_MAX_DELAY_MS must be a valid number".to_string())?;

        Ok(Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Lumishot API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "GDPR-compliant AI selfie generation backend".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}
