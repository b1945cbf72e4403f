//! Locates an installed Chromium-family browser and launches it with a
//! persistent profile and the CDP port open.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserType {
    Chrome,
    Brave,
    Edge,
    Chromium,
}

impl BrowserType {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserType::Chrome => "Google Chrome",
            BrowserType::Brave => "Brave",
            BrowserType::Edge => "Microsoft Edge",
            BrowserType::Chromium => "Chromium",
        }
    }
}

impl FromStr for BrowserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chrome" | "google-chrome" => Ok(BrowserType::Chrome),
            "brave" | "brave-browser" => Ok(BrowserType::Brave),
            "edge" | "microsoft-edge" => Ok(BrowserType::Edge),
            "chromium" => Ok(BrowserType::Chromium),
            _ => Err(anyhow!("Unknown browser type: {}", s)),
        }
    }
}

#[cfg(target_os = "macos")]
fn browser_candidates() -> Vec<(BrowserType, Vec<&'static str>)> {
    vec![
        (
            BrowserType::Chrome,
            vec![
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            ],
        ),
        (
            BrowserType::Brave,
            vec![
                "/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
                "~/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
            ],
        ),
        (
            BrowserType::Edge,
            vec!["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"],
        ),
        (
            BrowserType::Chromium,
            vec!["/Applications/Chromium.app/Contents/MacOS/Chromium"],
        ),
    ]
}

#[cfg(target_os = "linux")]
fn browser_candidates() -> Vec<(BrowserType, Vec<&'static str>)> {
    vec![
        (
            BrowserType::Chrome,
            vec![
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/opt/google/chrome/google-chrome",
            ],
        ),
        (
            BrowserType::Brave,
            vec!["/usr/bin/brave-browser", "/usr/bin/brave"],
        ),
        (
            BrowserType::Edge,
            vec!["/usr/bin/microsoft-edge", "/usr/bin/microsoft-edge-stable"],
        ),
        (
            BrowserType::Chromium,
            vec![
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
            ],
        ),
    ]
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn browser_candidates() -> Vec<(BrowserType, Vec<&'static str>)> {
    vec![]
}

pub fn discover_browser(preferred: Option<BrowserType>) -> Result<(BrowserType, PathBuf)> {
    let mut found = Vec::new();
    for (browser_type, paths) in browser_candidates() {
        for raw in paths {
            let path = wacast_core::path_utils::get_path(raw);
            if path.exists() {
                found.push((browser_type, path));
                break;
            }
        }
    }
    tracing::info!(
        "Installed browsers: {:?}",
        found.iter().map(|(t, _)| *t).collect::<Vec<_>>()
    );

    if let Some(pref) = preferred {
        if let Some(hit) = found.iter().find(|(t, _)| *t == pref) {
            return Ok(hit.clone());
        }
        tracing::warn!("Preferred browser {:?} not installed, falling back", pref);
    }

    found
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No supported browser found"))
}

pub struct BrowserLauncher {
    pub browser: BrowserType,
    pub binary: PathBuf,
    pub user_data_dir: PathBuf,
    pub cdp_port: u16,
    pub headless: bool,
}

impl BrowserLauncher {
    pub fn new(preferred: Option<BrowserType>, cdp_port: u16, headless: bool) -> Result<Self> {
        let (browser, binary) = discover_browser(preferred)?;
        let user_data_dir = wacast_core::path_utils::get_app_root().join("browser_profile");

        Ok(Self {
            browser,
            binary,
            user_data_dir,
            cdp_port,
            headless,
        })
    }

    pub fn launch(&self) -> Result<Child> {
        std::fs::create_dir_all(&self.user_data_dir)?;
        tracing::info!(
            "Launching {} with profile {:?}",
            self.browser.name(),
            self.user_data_dir
        );

        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--window-size=1280,900".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
        }

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| anyhow!("Failed to launch {}: {}", self.browser.name(), e))
    }

    pub async fn wait_for_cdp(&self) -> Result<String> {
        let url = format!("http://127.0.0.1:{}/json/version", self.cdp_port);
        let client = reqwest::Client::builder().no_proxy().build()?;

        for _ in 0..20 {
            sleep(Duration::from_millis(500)).await;
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    let json: Value = resp.json().await?;
                    if let Some(ws_url) = json.get("webSocketDebuggerUrl").and_then(|v| v.as_str())
                    {
                        return Ok(ws_url.to_string());
                    }
                }
            }
        }
        Err(anyhow!("Timeout waiting for CDP"))
    }

    pub async fn launch_and_wait(&self) -> Result<(Child, String)> {
        let child = self.launch()?;
        let ws_url = self.wait_for_cdp().await?;
        Ok((child, ws_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_type_parses_common_spellings() {
        assert_eq!(BrowserType::from_str("chrome").unwrap(), BrowserType::Chrome);
        assert_eq!(
            BrowserType::from_str("brave-browser").unwrap(),
            BrowserType::Brave
        );
        assert_eq!(BrowserType::from_str("EDGE").unwrap(), BrowserType::Edge);
        assert!(BrowserType::from_str("netscape").is_err());
    }
}
