//! The dispatch loop: iterates contact rows in source order, renders and
//! sanitizes the message for each contact, and hands it to the chat
//! transport one contact at a time.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use wacast_message::sanitize::sanitize;
use wacast_message::template;
use wacast_sources::ContactRecord;

/// Seam between the loop and the browser; scripted in tests.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, phone: &str, message: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

impl Contact {
    /// Extracts a usable contact from a source row. `None` means the row
    /// must be skipped: missing columns, blank values, or the literal
    /// "nan" some spreadsheet exports put in empty cells.
    pub fn from_record(record: &ContactRecord) -> Option<Self> {
        let name = record.get("name")?.trim();
        let phone = record.get("phone")?.trim();
        if name.is_empty() || phone.is_empty() || phone.eq_ignore_ascii_case("nan") {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub contact: Contact,
    pub succeeded: bool,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub sent: usize,
    pub attempted: usize,
    pub skipped: usize,
    pub outcomes: Vec<SendOutcome>,
}

pub struct Dispatcher<'a, T: ChatTransport> {
    transport: &'a T,
    template: &'a str,
    /// Fixed pause between contacts, applied regardless of outcome.
    contact_delay: Duration,
}

impl<'a, T: ChatTransport> Dispatcher<'a, T> {
    pub fn new(transport: &'a T, template: &'a str, contact_delay: Duration) -> Self {
        Self {
            transport,
            template,
            contact_delay,
        }
    }

    pub async fn run(&self, records: &[ContactRecord]) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = records.len();

        for (index, record) in records.iter().enumerate() {
            let Some(contact) = Contact::from_record(record) else {
                warn!("Skipping row {}: missing usable name or phone", index + 1);
                summary.skipped += 1;
                continue;
            };

            info!(
                "Sending message {}/{} to {} ({})",
                index + 1,
                total,
                contact.name,
                contact.phone
            );

            let message = sanitize(&template::render(
                self.template,
                &contact.name,
                &contact.phone,
            ));

            summary.attempted += 1;
            let succeeded = match self.transport.send_message(&contact.phone, &message).await {
                Ok(()) => {
                    info!("Message sent to {}", contact.name);
                    true
                }
                Err(e) => {
                    warn!("Failed to send to {} ({}): {}", contact.name, contact.phone, e);
                    false
                }
            };
            if succeeded {
                summary.sent += 1;
            }
            summary.outcomes.push(SendOutcome { contact, succeeded });

            // Rate-limit pause, not backpressure.
            tokio::time::sleep(self.contact_delay).await;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct MockTransport {
        fail_phones: Vec<&'static str>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl MockTransport {
        fn new(fail_phones: Vec<&'static str>) -> Self {
            Self {
                fail_phones,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for MockTransport {
        async fn send_message(&self, phone: &str, message: &str) -> anyhow::Result<()> {
            if self.fail_phones.contains(&phone) {
                return Err(anyhow!("no interactive message box found"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn row(name: &str, phone: &str) -> ContactRecord {
        ContactRecord::new(vec![
            ("Name".to_string(), name.to_string()),
            ("Phone".to_string(), phone.to_string()),
        ])
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_run() {
        let transport = MockTransport::new(vec!["2"]);
        let dispatcher = Dispatcher::new(&transport, "Hi {name}", Duration::ZERO);

        let records = vec![row("Ana", "1"), row("Bruno", "2"), row("Carla", "3")];
        let summary = dispatcher.run(&records).await;

        assert_eq!(summary.sent, 2);
        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.skipped, 0);

        let failed: Vec<&str> = summary
            .outcomes
            .iter()
            .filter(|o| !o.succeeded)
            .map(|o| o.contact.name.as_str())
            .collect();
        assert_eq!(failed, vec!["Bruno"]);
    }

    #[tokio::test]
    async fn unusable_rows_are_skipped_not_attempted() {
        let transport = MockTransport::new(vec![]);
        let dispatcher = Dispatcher::new(&transport, "Hi {name}", Duration::ZERO);

        let records = vec![
            row("Ana", "1"),
            row("", "2"),
            row("Carla", ""),
            row("Dan", "nan"),
            ContactRecord::new(vec![("Email".to_string(), "x@y.z".to_string())]),
        ];
        let summary = dispatcher.run(&records).await;

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.skipped, 4);
    }

    #[tokio::test]
    async fn messages_are_personalized_per_contact() {
        let transport = MockTransport::new(vec![]);
        let dispatcher = Dispatcher::new(&transport, "Hi {name} ({phone})", Duration::ZERO);

        let records = vec![row("Ana", "1"), row("Bruno", "2")];
        dispatcher.run(&records).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0], ("1".to_string(), "Hi Ana (1)".to_string()));
        assert_eq!(sent[1], ("2".to_string(), "Hi Bruno (2)".to_string()));
    }

    #[test]
    fn contact_extraction_trims_whitespace() {
        let contact = Contact::from_record(&row(" Ana ", " 123 ")).unwrap();
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.phone, "123");
    }
}
