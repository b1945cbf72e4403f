//! Loads the message template from the configured file chain.
//!
//! First existing file wins: the configured template path, then the
//! emoji-free fallback, then a built-in default so a run never starts
//! with an empty message.

use std::fs;

use tracing::{info, warn};
use wacast_core::config::AppConfig;
use wacast_core::path_utils;

use crate::sanitize::sanitize;

const FALLBACK_TEMPLATE_FILE: &str = "templates/message_no_emoji.txt";

const DEFAULT_MESSAGE: &str = "Hello {Name}!\nThis is an automated message.\n\nBest regards";

pub fn load_message_template(config: &AppConfig) -> String {
    for candidate in [config.template_file.as_str(), FALLBACK_TEMPLATE_FILE] {
        let Some(path) = path_utils::resolve_input_path(candidate) else {
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(content) => {
                info!("Message template loaded from {:?}", path);
                return sanitize(&content);
            }
            Err(e) => warn!("Could not read template {:?}: {}", path, e),
        }
    }

    warn!("No template file found, using the built-in default message");
    DEFAULT_MESSAGE.to_string()
}
