use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(alias = "WACAST_SHEET_ID")]
    pub sheet_id: Option<String>,

    #[serde(alias = "WACAST_CREDENTIALS_FILE")]
    pub credentials_file: String,

    #[serde(alias = "WACAST_CONTACTS_FILE")]
    pub contacts_file: String,

    #[serde(alias = "WACAST_TEMPLATE_FILE")]
    pub template_file: String,

    #[serde(alias = "WACAST_BROWSER")]
    pub browser_type: Option<String>,

    #[serde(alias = "WACAST_HEADLESS")]
    pub headless: bool,

    #[serde(alias = "WACAST_CDP_PORT")]
    pub cdp_port: u16,

    #[serde(alias = "WACAST_MESSAGE_DELAY_SECS")]
    pub message_delay_secs: u64,

    #[serde(skip)]
    pub project_root: std::path::PathBuf,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // 1. Try standard dotenv discovery from current dir
        if let Err(_) = dotenvy::dotenv() {
            // 2. Fallback: Try explicitly from resolved WACAST_ROOT
            let root = crate::path_utils::get_app_root();
            let path = root.join(".env");
            if path.exists() {
                let _ = dotenvy::from_path(&path);
            }
        }

        let builder = Config::builder()
            .set_default("credentials_file", "credentials.json")?
            .set_default("contacts_file", "contacts.csv")?
            .set_default("template_file", "templates/message.txt")?
            .set_default("headless", false)?
            .set_default("cdp_port", 9222)?
            .set_default("message_delay_secs", 5)?
            .add_source(File::with_name("wacast").required(false))
            .add_source(Environment::with_prefix("WACAST"));

        let mut config: Self = builder.build()?.try_deserialize()?;

        // Set project_root
        config.project_root = crate::path_utils::get_app_root();

        Ok(config)
    }
}
