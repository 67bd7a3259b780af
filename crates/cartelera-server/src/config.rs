use std::path::PathBuf;

/// Server configuration, read from `CARTELERA_*` environment variables
/// (a `.env` file is honored when present).
pub struct Config {
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub admin_emails: Vec<String>,
    pub media_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("CARTELERA_JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-me".into());
        let db_path = std::env::var("CARTELERA_DB_PATH").unwrap_or_else(|_| "cartelera.db".into());
        let host = std::env::var("CARTELERA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("CARTELERA_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;
        let media_dir = std::env::var("CARTELERA_MEDIA_DIR").unwrap_or_else(|_| "media".into());

        // Comma-separated allow-list; these accounts get the admin role
        let admin_emails = std::env::var("CARTELERA_ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Ok(Config {
            db_path: PathBuf::from(db_path),
            jwt_secret,
            host,
            port,
            admin_emails,
            media_dir: PathBuf::from(media_dir),
        })
    }
}
