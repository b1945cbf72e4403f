//! `ChatTransport` implementation that drives the WhatsApp Web composer.

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use tracing::{debug, info};
use wacast_dispatch::ChatTransport;

use crate::locator::{
    COMPOSER_STRATEGIES, Candidate, RetryPolicy, locate_with_retry, select_candidate,
};
use crate::session::{WHATSAPP_URL, WhatsAppSession};

/// Pause after the send?phone= navigation before probing starts.
const PAGE_SETTLE: Duration = Duration::from_secs(8);
/// Pause between finding the composer and touching it.
const PRE_INPUT_SETTLE: Duration = Duration::from_secs(3);
const FOCUS_SETTLE: Duration = Duration::from_secs(1);
/// Pause after Enter so the message leaves before the next navigation.
const POST_SEND: Duration = Duration::from_secs(3);

pub struct WhatsAppTransport<'a> {
    session: &'a WhatsAppSession,
    policy: RetryPolicy,
}

impl<'a> WhatsAppTransport<'a> {
    pub fn new(session: &'a WhatsAppSession) -> Self {
        Self {
            session,
            policy: RetryPolicy::default(),
        }
    }

    /// One probing round over the whole strategy list.
    async fn find_composer(&self) -> Option<Element> {
        for strategy in COMPOSER_STRATEGIES {
            let mut elements = self.session.find_all(strategy.selector).await;
            if elements.is_empty() {
                continue;
            }

            let mut candidates = Vec::with_capacity(elements.len());
            for element in &elements {
                candidates.push(Candidate {
                    data_tab: self.session.attribute(element, "data-tab").await,
                    visible: self.session.is_visible(element).await,
                    enabled: self.session.is_enabled(element).await,
                });
            }

            if let Some(index) = select_candidate(&candidates, strategy) {
                debug!(
                    "Composer matched by {} (data-tab: {:?})",
                    strategy.selector, candidates[index].data_tab
                );
                return Some(elements.swap_remove(index));
            }
        }
        None
    }
}

#[async_trait]
impl ChatTransport for WhatsAppTransport<'_> {
    async fn send_message(&self, phone: &str, message: &str) -> Result<()> {
        let url = format!("{}/send?phone={}", WHATSAPP_URL, urlencoding::encode(phone));
        self.session.navigate(&url).await?;
        info!("Opening chat with {}, waiting for it to load", phone);
        tokio::time::sleep(PAGE_SETTLE).await;

        // A malformed phone bounces off the chat view entirely.
        if let Some(current) = self.session.current_url().await {
            if !current.contains("web.whatsapp.com") {
                bail!("redirected away from WhatsApp: {}", current);
            }
        }

        let composer = locate_with_retry(&self.policy, |attempt| {
            if attempt > 1 {
                info!(
                    "Attempt {}/{}: waiting for the chat interface",
                    attempt, self.policy.attempts
                );
            }
            self.find_composer()
        })
        .await
        .ok_or_else(|| anyhow!("no interactive message box found for {}", phone))?;

        tokio::time::sleep(PRE_INPUT_SETTLE).await;
        self.session.clear(&composer).await?;
        self.session.click(&composer).await?;
        tokio::time::sleep(FOCUS_SETTLE).await;

        self.session.type_multiline(&composer, message).await?;
        self.session.submit().await?;
        tokio::time::sleep(POST_SEND).await;

        Ok(())
    }
}
