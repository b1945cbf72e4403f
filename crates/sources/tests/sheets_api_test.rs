use httpmock::prelude::*;
use tempfile::TempDir;
use wacast_sources::ContactSource;
use wacast_sources::sheets::SheetsSource;

#[tokio::test]
async fn fetch_values_maps_the_first_worksheet() {
    let server = MockServer::start();
    let values_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-123/values/A1:ZZ100000")
            .header("authorization", "Bearer test-token");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "range": "Sheet1!A1:ZZ100000",
                "majorDimension": "ROWS",
                "values": [
                    ["Name", "Phone"],
                    ["Ana", "5215512345678"],
                    ["Bruno", 919876543210u64]
                ]
            }));
    });

    let source =
        SheetsSource::new("sheet-123", "/unused/credentials.json").with_api_base(server.url(""));
    let rows = source.fetch_values("test-token").await.unwrap();

    values_mock.assert();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some("Ana"));
    assert_eq!(rows[1].get("phone"), Some("919876543210"));
}

#[tokio::test]
async fn api_error_status_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/sheet-123/values/A1:ZZ100000");
        then.status(403);
    });

    let source =
        SheetsSource::new("sheet-123", "/unused/credentials.json").with_api_base(server.url(""));
    assert!(source.fetch_values("test-token").await.is_err());
}

#[tokio::test]
async fn missing_key_file_is_a_reported_error() {
    let source = SheetsSource::new("sheet-123", "/nonexistent/credentials.json");
    assert!(source.fetch().await.is_err());
}

#[tokio::test]
async fn malformed_key_file_is_a_reported_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, "not json at all").unwrap();

    let source = SheetsSource::new("sheet-123", path);
    assert!(source.fetch().await.is_err());
}
