use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
    /// Directory with the web client, served at `/` when set
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub ttl_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub media: Media,
    pub session: Session,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // 1. Try to load from settings.toml (optional for deployment)
        let config_file_name = "settings.toml";

        let current_dir_path = PathBuf::from(config_file_name);
        if current_dir_path.exists() {
            builder = builder.add_source(File::from(current_dir_path).required(false));
        }

        // Check in luno-server directory (for development)
        let dev_path = PathBuf::from("luno-server").join(config_file_name);
        if dev_path.exists() {
            builder = builder.add_source(File::from(dev_path).required(false));
        }

        builder = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("database.path", "luno.db")?
            .set_default("media.upload_dir", "uploads")?
            .set_default("media.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("session.ttl_days", 7)?;

        // 2. Override with environment variables (highest priority)
        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("database.path", db_path)?;
        }
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }
        if let Ok(host) = std::env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Ok(upload_dir) = std::env::var("UPLOAD_DIR") {
            builder = builder.set_override("media.upload_dir", upload_dir)?;
        }
        if let Ok(static_dir) = std::env::var("STATIC_DIR") {
            builder = builder.set_override("server.static_dir", static_dir)?;
        }

        let s = builder.build()?;
        s.try_deserialize()
    }
}
