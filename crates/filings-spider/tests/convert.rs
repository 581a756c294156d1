mod common;

use common::{config, text, xlsx};
use filings_spider::filings::convert;
use filings_spider::{SpiderError, Summary};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM: &str = r#"<html><body><form method="post" action="./" id="form1">
<input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="state123" />
<input type="hidden" name="__VIEWSTATEGENERATOR" id="__VIEWSTATEGENERATOR" value="CA0B0334" />
<input type="hidden" name="__EVENTVALIDATION" id="__EVENTVALIDATION" value="valid456" />
<input type="file" name="FileUploadControl" id="FileUploadControl" />
<input type="submit" name="Button1" value="Validate" id="Button1" />
</form></body></html>"#;

const XLSX_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[tokio::test]
async fn converts_documents_through_the_upload_form() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.converter_url = format!("{}/", server.uri());
    let paths = config.entity("INFY");
    let workbook = xlsx(&[("Sheet1", vec![vec![text("converted")]])]);

    // -- MOCKS --
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("good.xml"))
        .and(body_string_contains("state123"))
        .and(body_string_contains("valid456"))
        .and(body_string_contains("FileUploadControl"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(workbook.clone(), XLSX_TYPE),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("bad.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>Validation failed</html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // -- DOCUMENTS --
    std::fs::create_dir_all(&paths.documents).unwrap();
    std::fs::write(paths.documents.join("03Jun2020_1145_good.xml"), "<xbrl/>").unwrap();
    std::fs::write(paths.documents.join("15Mar2020_0930_bad.xml"), "<xbrl/>").unwrap();
    std::fs::write(paths.documents.join("01Jan2021_1000_done.xml"), "<xbrl/>").unwrap();
    std::fs::write(paths.documents.join("notes.txt"), "ignored").unwrap();
    std::fs::create_dir_all(&paths.spreadsheets).unwrap();
    std::fs::write(paths.spreadsheets.join("01Jan2021_1000_done.xlsx"), "kept").unwrap();

    // -- CONVERT --
    let summary = convert::scrape(&config, "INFY", false).await.unwrap();
    assert_eq!(
        summary,
        Summary {
            succeeded: 1,
            skipped: 1,
            failed: 1
        }
    );

    assert_eq!(
        std::fs::read(paths.spreadsheets.join("03Jun2020_1145_good.xlsx")).unwrap(),
        workbook
    );
    assert!(!paths.spreadsheets.join("15Mar2020_0930_bad.xlsx").exists());
    assert_eq!(
        std::fs::read_to_string(paths.spreadsheets.join("01Jan2021_1000_done.xlsx")).unwrap(),
        "kept"
    );
}

#[tokio::test]
async fn rejected_conversion_reports_the_response() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.converter_url = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>again</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let document = dir.path().join("report.xml");
    std::fs::write(&document, "<xbrl/>").unwrap();

    let converter = convert::Converter::new(&config).unwrap();
    let err = converter.convert(&document).await.unwrap_err();
    match err.downcast_ref::<SpiderError>() {
        Some(SpiderError::ConversionRejected {
            file,
            status,
            content_type,
            len,
        }) => {
            assert_eq!(file, "report.xml");
            assert_eq!(*status, 200);
            assert!(content_type.starts_with("text/html"));
            assert_eq!(*len, "<html>again</html>".len());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn failed_form_load_fails_the_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.converter_url = format!("{}/", server.uri());
    let paths = config.entity("INFY");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    std::fs::create_dir_all(&paths.documents).unwrap();
    std::fs::write(paths.documents.join("03Jun2020_1145_a.xml"), "<xbrl/>").unwrap();

    let summary = convert::scrape(&config, "INFY", false).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(!paths.spreadsheets.join("03Jun2020_1145_a.xlsx").exists());
}
