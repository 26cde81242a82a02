use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub max_file_size: u64,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub app_url: String,
    pub reset_token_ttl_minutes: i64,
    #[serde(default, deserialize_with = "comma_separated")]
    pub cors_origins: Vec<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_secure: bool,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_url", "")? // empty: in-memory store
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000_i64)?
            .set_default("upload_dir", "./uploads")?
            .set_default("max_file_size", 104_857_600_i64)? // 100MB
            .set_default("jwt_secret", "your-secret-key")?
            .set_default("session_ttl_hours", 720_i64)? // 30 days
            .set_default("app_url", "http://localhost:3000")?
            .set_default("reset_token_ttl_minutes", 60_i64)?
            .set_default("cors_origins", "")?
            .set_default("smtp_port", 587_i64)?
            .set_default("smtp_secure", false)?
            .set_default("smtp_from", "noreply@localhost")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Configuration for tests and local tooling: no database, uploads under `upload_dir`.
    pub fn for_upload_dir(upload_dir: impl Into<String>) -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: upload_dir.into(),
            max_file_size: 104_857_600,
            jwt_secret: "test-secret".to_string(),
            session_ttl_hours: 1,
            app_url: "http://localhost:3000".to_string(),
            reset_token_ttl_minutes: 60,
            cors_origins: Vec::new(),
            smtp_host: None,
            smtp_port: 587,
            smtp_secure: false,
            smtp_user: None,
            smtp_password: None,
            smtp_from: "noreply@localhost".to_string(),
        }
    }

    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|host| !host.is_empty())
    }
}

fn comma_separated<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
