//! Composer location: the message input box has no stable identifying
//! attribute across WhatsApp Web releases, so a ranked list of selectors
//! is probed, most specific first. The generic expressions can also match
//! the chat search box, which carries `data-tab="3"`; those carry an
//! exclusion for it.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Marker attribute value of the search box, the known false positive.
pub const SEARCH_BOX_TAB: &str = "3";

pub struct LocatorStrategy {
    pub selector: &'static str,
    /// `data-tab` value that disqualifies a candidate.
    pub reject_data_tab: Option<&'static str>,
}

/// Probe order for the message composer, most specific first.
pub const COMPOSER_STRATEGIES: &[LocatorStrategy] = &[
    LocatorStrategy {
        selector: "div[contenteditable='true'][data-tab='10']",
        reject_data_tab: None,
    },
    LocatorStrategy {
        selector: "div.selectable-text[contenteditable='true'][data-tab='10']",
        reject_data_tab: None,
    },
    LocatorStrategy {
        selector: "div[data-testid='conversation-compose-box-input']",
        reject_data_tab: None,
    },
    LocatorStrategy {
        selector: "div[aria-label*='Type a message'][contenteditable='true']",
        reject_data_tab: Some(SEARCH_BOX_TAB),
    },
    LocatorStrategy {
        selector: "div[title='Type a message'][contenteditable='true']",
        reject_data_tab: Some(SEARCH_BOX_TAB),
    },
    LocatorStrategy {
        selector: "div[data-lexical-editor='true'][contenteditable='true']",
        reject_data_tab: Some(SEARCH_BOX_TAB),
    },
    // Last resort: anything editable that is not the search box.
    LocatorStrategy {
        selector: "div[contenteditable='true'][role='textbox']",
        reject_data_tab: Some(SEARCH_BOX_TAB),
    },
];

/// What a probe learned about one DOM match.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub data_tab: Option<String>,
    pub visible: bool,
    pub enabled: bool,
}

/// Applies one strategy's acceptance rule to its matches: drop excluded
/// candidates, then take the first that is visible and enabled.
pub fn select_candidate(candidates: &[Candidate], strategy: &LocatorStrategy) -> Option<usize> {
    candidates.iter().position(|candidate| {
        if let Some(rejected) = strategy.reject_data_tab {
            if candidate.data_tab.as_deref() == Some(rejected) {
                return false;
            }
        }
        candidate.visible && candidate.enabled
    })
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(4),
        }
    }
}

/// Runs `probe` up to `policy.attempts` times with a fixed pause between
/// rounds. Exhaustion returns `None`; the caller decides whether that is
/// fatal.
pub async fn locate_with_retry<T, P, Fut>(policy: &RetryPolicy, mut probe: P) -> Option<T>
where
    P: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.attempts {
        if let Some(found) = probe(attempt).await {
            return Some(found);
        }
        if attempt < policy.attempts {
            debug!(
                "Attempt {}/{}: no interactive target yet, waiting",
                attempt, policy.attempts
            );
            tokio::time::sleep(policy.backoff).await;
        }
    }
    None
}
