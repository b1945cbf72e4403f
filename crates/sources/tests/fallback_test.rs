use async_trait::async_trait;
use wacast_sources::{ContactRecord, ContactSource, SourceError, resolve_contacts};

struct StaticSource {
    label: &'static str,
    rows: Vec<ContactRecord>,
}

struct FailingSource {
    label: &'static str,
}

#[async_trait]
impl ContactSource for StaticSource {
    fn describe(&self) -> String {
        self.label.to_string()
    }

    async fn fetch(&self) -> Result<Vec<ContactRecord>, SourceError> {
        Ok(self.rows.clone())
    }
}

#[async_trait]
impl ContactSource for FailingSource {
    fn describe(&self) -> String {
        self.label.to_string()
    }

    async fn fetch(&self) -> Result<Vec<ContactRecord>, SourceError> {
        Err(SourceError::Credentials {
            message: "no key file".to_string(),
        })
    }
}

fn row(name: &str, phone: &str) -> ContactRecord {
    ContactRecord::new(vec![
        ("Name".to_string(), name.to_string()),
        ("Phone".to_string(), phone.to_string()),
    ])
}

#[tokio::test]
async fn first_working_source_wins() {
    let sources: Vec<Box<dyn ContactSource>> = vec![
        Box::new(StaticSource {
            label: "primary",
            rows: vec![row("Ana", "1")],
        }),
        Box::new(StaticSource {
            label: "secondary",
            rows: vec![row("Bruno", "2")],
        }),
    ];

    let (label, rows) = resolve_contacts(&sources).await.unwrap();
    assert_eq!(label, "primary");
    assert_eq!(rows[0].get("name"), Some("Ana"));
}

#[tokio::test]
async fn failure_falls_through_with_rows_unchanged() {
    let expected = vec![row("Bruno", "2"), row("Carla", "3")];
    let sources: Vec<Box<dyn ContactSource>> = vec![
        Box::new(FailingSource { label: "primary" }),
        Box::new(StaticSource {
            label: "secondary",
            rows: expected.clone(),
        }),
    ];

    let (label, rows) = resolve_contacts(&sources).await.unwrap();
    assert_eq!(label, "secondary");
    assert_eq!(rows, expected);
}

#[tokio::test]
async fn empty_result_also_falls_through() {
    let sources: Vec<Box<dyn ContactSource>> = vec![
        Box::new(StaticSource {
            label: "primary",
            rows: vec![],
        }),
        Box::new(StaticSource {
            label: "secondary",
            rows: vec![row("Bruno", "2")],
        }),
    ];

    let (label, _) = resolve_contacts(&sources).await.unwrap();
    assert_eq!(label, "secondary");
}

#[tokio::test]
async fn all_sources_failing_yields_none() {
    let sources: Vec<Box<dyn ContactSource>> = vec![
        Box::new(FailingSource { label: "primary" }),
        Box::new(FailingSource { label: "secondary" }),
    ];

    assert!(resolve_contacts(&sources).await.is_none());
}
