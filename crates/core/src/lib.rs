pub mod config;
pub mod path_utils;

use tracing::info;

pub fn init() {
    let root = path_utils::get_app_root();
    if let Err(e) = std::fs::create_dir_all(&root) {
        tracing::warn!("Could not create app root {:?}: {}", root, e);
    }
    info!("📨 wacast core initialized (root: {:?})", root);
}
