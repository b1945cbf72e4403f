//! Owns the chromiumoxide connection to a WhatsApp Web tab.
//!
//! The browser runs with a persistent profile so the QR-code login
//! survives across runs; a session-state file lets a later run reattach
//! to a still-living browser instead of launching a second one.

use std::path::{Path, PathBuf};
use std::process::Child;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::element::Element;
use chromiumoxide::handler::Handler;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, info, warn};
use wacast_core::config::AppConfig;
use wacast_core::path_utils;

use crate::launcher::{BrowserLauncher, BrowserType};

pub const WHATSAPP_URL: &str = "https://web.whatsapp.com";

/// Any hit on one of these means the application shell has rendered.
const LOADED_MARKERS: &[&str] = &[
    "div[contenteditable='true'][data-tab='3']",
    "div[data-testid='chat-list']",
    "div[aria-label='Chat list']",
    "#side",
];

const LOAD_CEILING: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_secs(1);
const SHIFT_MODIFIER: i64 = 8;

#[derive(Debug, Serialize, Deserialize)]
struct SessionState {
    cdp_port: u16,
    cdp_url: String,
}

pub struct WhatsAppSession {
    page: Page,
    browser: Browser,
    child: Option<Child>,
    state_file: PathBuf,
}

impl WhatsAppSession {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let state_file = path_utils::get_app_root().join("browser_session.json");

        // Reattach to a browser left over from an interrupted run.
        if let Some(state) = load_session_state(&state_file) {
            if cdp_alive(state.cdp_port).await {
                if let Ok((browser, handler)) = Browser::connect(&state.cdp_url).await {
                    info!("Reattached to running browser on port {}", state.cdp_port);
                    return Self::finish_connect(browser, handler, None, state_file).await;
                }
            }
            let _ = std::fs::remove_file(&state_file);
        }

        let preferred = config
            .browser_type
            .as_deref()
            .and_then(|s| BrowserType::from_str(s).ok());
        let launcher = BrowserLauncher::new(preferred, config.cdp_port, config.headless)?;
        let (child, cdp_url) = launcher.launch_and_wait().await?;

        save_session_state(
            &state_file,
            &SessionState {
                cdp_port: launcher.cdp_port,
                cdp_url: cdp_url.clone(),
            },
        )?;

        let (browser, handler) = Browser::connect(&cdp_url)
            .await
            .map_err(|e| anyhow!("Failed to connect to browser: {}", e))?;
        Self::finish_connect(browser, handler, Some(child), state_file).await
    }

    async fn finish_connect(
        browser: Browser,
        mut handler: Handler,
        child: Option<Child>,
        state_file: PathBuf,
    ) -> Result<Self> {
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("Browser handler error: {}", e);
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("opening a page")?;

        Ok(Self {
            page,
            browser,
            child,
            state_file,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        Ok(())
    }

    pub async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    pub async fn find_all(&self, selector: &str) -> Vec<Element> {
        self.page.find_elements(selector).await.unwrap_or_default()
    }

    /// Opens WhatsApp Web and waits for the application shell. Logging in
    /// (QR scan) is the user's job; after the ceiling we warn and proceed
    /// best-effort.
    pub async fn open_whatsapp(&self) -> Result<()> {
        info!("Opening WhatsApp Web...");
        self.navigate(WHATSAPP_URL).await?;

        let start = std::time::Instant::now();
        while start.elapsed() < LOAD_CEILING {
            for marker in LOADED_MARKERS {
                if !self.find_all(marker).await.is_empty() {
                    info!("WhatsApp Web loaded");
                    return Ok(());
                }
            }
            sleep(LOAD_POLL).await;
        }

        warn!(
            "WhatsApp Web did not report loaded within {:?}; make sure the QR code is scanned. Continuing anyway",
            LOAD_CEILING
        );
        Ok(())
    }

    pub async fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.attribute(name).await.ok().flatten()
    }

    pub async fn is_visible(&self, element: &Element) -> bool {
        self.js_bool(
            element,
            "function() { \
               if (this.hidden || this.getAttribute('aria-hidden') === 'true') return false; \
               const style = getComputedStyle(this); \
               if (style.display === 'none' || style.visibility === 'hidden') return false; \
               const rect = this.getBoundingClientRect(); \
               return rect.width > 0 && rect.height > 0; \
             }",
        )
        .await
    }

    pub async fn is_enabled(&self, element: &Element) -> bool {
        self.js_bool(
            element,
            "function() { return !this.disabled && this.getAttribute('aria-disabled') !== 'true'; }",
        )
        .await
    }

    pub async fn clear(&self, element: &Element) -> Result<()> {
        element
            .call_js_fn("function() { this.innerHTML = ''; this.value = ''; }", false)
            .await?;
        Ok(())
    }

    pub async fn click(&self, element: &Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    /// Types line-oriented text into the composer. Line breaks are sent as
    /// Shift+Enter so WhatsApp keeps them inside one message.
    pub async fn type_multiline(&self, element: &Element, text: &str) -> Result<()> {
        element.focus().await?;

        let lines: Vec<&str> = text.split('\n').collect();
        for (i, line) in lines.iter().enumerate() {
            if !line.trim().is_empty() {
                element.type_str(*line).await?;
            }
            if i < lines.len() - 1 {
                self.press_enter(true).await?;
            }
        }
        Ok(())
    }

    /// Enter submits the composer.
    pub async fn submit(&self) -> Result<()> {
        self.press_enter(false).await
    }

    async fn press_enter(&self, shift: bool) -> Result<()> {
        let modifiers = if shift { SHIFT_MODIFIER } else { 0 };

        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .modifiers(modifiers)
            .key("Enter")
            .code("Enter")
            .text("\r")
            .windows_virtual_key_code(13)
            .native_virtual_key_code(13)
            .build()
            .map_err(|e| anyhow!("building key event: {e}"))?;
        self.page.execute(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .modifiers(modifiers)
            .key("Enter")
            .code("Enter")
            .windows_virtual_key_code(13)
            .native_virtual_key_code(13)
            .build()
            .map_err(|e| anyhow!("building key event: {e}"))?;
        self.page.execute(up).await?;

        Ok(())
    }

    async fn js_bool(&self, element: &Element, function: &str) -> bool {
        match element.call_js_fn(function, false).await {
            Ok(res) => res.result.value.and_then(|v| v.as_bool()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Closes the browser, reaps the launched child, and removes the
    /// session-state file. Runs at the end of every run, error or not.
    pub async fn shutdown(mut self) {
        info!("Closing browser session");
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
            if let Some(child) = self.child.as_mut() {
                let _ = child.kill();
            }
        }
        if let Some(child) = self.child.as_mut() {
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.state_file);
    }
}

fn load_session_state(path: &Path) -> Option<SessionState> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_session_state(path: &Path, state: &SessionState) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(state)?;
    std::fs::write(path, content)?;
    Ok(())
}

async fn cdp_alive(port: u16) -> bool {
    let url = format!("http://127.0.0.1:{}/json/version", port);
    let Ok(client) = reqwest::Client::builder().no_proxy().build() else {
        return false;
    };
    client.get(&url).send().await.is_ok()
}
