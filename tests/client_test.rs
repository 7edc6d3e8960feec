// Tests for JmaClient against a mock portal
// Uses mockito for HTTP mocking; CSV fixtures are Shift_JIS encoded like
// the real portal's responses

use chrono::NaiveDate;
use mockito::{Matcher, Server};

use jma_irradiation::client::JmaClient;
use jma_irradiation::fetch_error::FetchError;
use jma_irradiation::response::BadCsvKind;
use jma_irradiation::stations::Station;

const SESSION_PAGE: &str = r#"
<html>
<head><title>download</title></head>
<body>
<form name="downloadForm" action="">
<input type="hidden" id="sid" value="testsid1234567890" />
</form>
</body>
</html>
"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Helper to mock the handshake page and open a session against it
async fn open_client(server: &mut Server, convert_to_kwh: bool) -> JmaClient {
    server
        .mock("GET", "/index.php")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(SESSION_PAGE)
        .create_async()
        .await;

    let mut client = JmaClient::with_base_url(server.url(), convert_to_kwh);
    client.open_session().await.unwrap();
    client
}

#[tokio::test]
async fn test_open_session_scrapes_session_id() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/index.php")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(SESSION_PAGE)
        .create_async()
        .await;

    let mut client = JmaClient::with_base_url(server.url(), false);
    let result = client.open_session().await;

    assert!(result.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_open_session_without_sid_fails() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/index.php")
        .with_status(200)
        .with_body("<html><head></head><body>under maintenance</body></html>")
        .create_async()
        .await;

    let mut client = JmaClient::with_base_url(server.url(), false);
    let result = client.open_session().await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::MissingSessionId => {}
        e => panic!("Expected MissingSessionId, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_open_session_http_error() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/index.php")
        .with_status(503)
        .create_async()
        .await;

    let mut client = JmaClient::with_base_url(server.url(), false);
    let result = client.open_session().await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::Status(status, url) => {
            assert_eq!(status.as_u16(), 503);
            assert!(url.ends_with("/index.php"));
        }
        e => panic!("Expected Status error, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_requires_open_session() {
    // No server needed; the client must refuse before any request
    let client = JmaClient::with_base_url("http://127.0.0.1:9", false);
    let result = client
        .fetch_daily_irradiation(date(2021, 1, 1), date(2021, 1, 6), &[Station::Fukuoka], false)
        .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::SessionNotOpened => {}
        e => panic!("Expected SessionNotOpened, got: {e:?}"),
    }
}

#[tokio::test]
async fn test_fetch_daily_irradiation() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let mock = server
        .mock("POST", "/show/table.html")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "stationNumList".into(),
                r#"["s47807", "s47813", "s47817"]"#.into(),
            ),
            Matcher::UrlEncoded("aggrgPeriod".into(), "1".into()),
            Matcher::UrlEncoded("elementNumList".into(), r#"[["610",""]]"#.into()),
            Matcher::UrlEncoded("interAnnualFlag".into(), "1".into()),
            Matcher::UrlEncoded(
                "ymdList".into(),
                r#"["2021", "2021", "1", "1", "1", "6"]"#.into(),
            ),
            Matcher::UrlEncoded("downloadFlag".into(), "true".into()),
            Matcher::UrlEncoded("PHPSESSID".into(), "testsid1234567890".into()),
        ]))
        .with_status(200)
        .with_body(include_bytes!("fixtures/daily_kyushu.csv"))
        .create_async()
        .await;

    let table = client
        .fetch_daily_irradiation(
            date(2021, 1, 1),
            date(2021, 1, 6),
            &[Station::Fukuoka, Station::Saga, Station::Nagasaki],
            false,
        )
        .await
        .unwrap();

    assert_eq!(table.headers, vec!["Date", "Fukuoka", "Saga", "Nagasaki"]);
    assert_eq!(table.rows.len(), 6);
    assert_eq!(table.rows[0].timestamp, "2021-01-01");
    assert_eq!(table.rows[5].timestamp, "2021-01-06");
    assert_eq!(table.value(0, "Fukuoka"), Some(2.53));
    assert_eq!(table.value(5, "Nagasaki"), Some(5.04));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_daily_with_long_term_average() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let mock = server
        .mock("POST", "/show/table.html")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "stationNumList".into(),
                r#"["s47584", "s47582"]"#.into(),
            ),
            Matcher::UrlEncoded("optionNumList".into(), r#"[["op1",0]]"#.into()),
        ]))
        .with_status(200)
        .with_body(include_bytes!("fixtures/daily_tohoku_lta.csv"))
        .create_async()
        .await;

    let table = client
        .fetch_daily_irradiation(
            date(2021, 1, 1),
            date(2021, 1, 2),
            &[Station::Morioka, Station::Akita],
            true,
        )
        .await
        .unwrap();

    assert_eq!(
        table.headers,
        vec!["Date", "Morioka", "Morioka_LT", "Akita", "Akita_LT"]
    );
    assert_eq!(table.value(0, "Morioka"), Some(4.01));
    assert_eq!(table.value(0, "Morioka_LT"), Some(5.9));
    assert_eq!(table.value(1, "Akita"), Some(2.44));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_daily_kwh_conversion() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, true).await;

    server
        .mock("POST", "/show/table.html")
        .with_status(200)
        .with_body(include_bytes!("fixtures/daily_kyushu.csv"))
        .create_async()
        .await;

    let table = client
        .fetch_daily_irradiation(
            date(2021, 1, 1),
            date(2021, 1, 6),
            &[Station::Fukuoka, Station::Saga, Station::Nagasaki],
            false,
        )
        .await
        .unwrap();

    let fukuoka = table.value(0, "Fukuoka").unwrap();
    assert!((fukuoka - 0.70277).abs() < 1e-3, "got {fukuoka}");
    let saga = table.value(2, "Saga").unwrap();
    assert!((saga - 3.24444).abs() < 1e-3, "got {saga}");
}

#[tokio::test]
async fn test_fetch_hourly_irradiation() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let mock = server
        .mock("POST", "/show/table.html")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("stationNumList".into(), r#"["s47575"]"#.into()),
            Matcher::UrlEncoded("aggrgPeriod".into(), "9".into()),
            Matcher::UrlEncoded("PHPSESSID".into(), "testsid1234567890".into()),
        ]))
        .with_status(200)
        .with_body(include_bytes!("fixtures/hourly_aomori.csv"))
        .create_async()
        .await;

    let table = client
        .fetch_hourly_irradiation(date(2021, 3, 22), date(2021, 3, 22), &[Station::Aomori])
        .await
        .unwrap();

    assert_eq!(table.headers, vec!["Date", "Aomori"]);
    assert_eq!(table.rows.len(), 24);
    // Stated hours 1..=24 come back shifted to a 00..23 window
    assert_eq!(table.rows[0].timestamp, "2021-03-22 00:00");
    assert_eq!(table.rows[23].timestamp, "2021-03-22 23:00");
    assert_eq!(table.value(0, "Aomori"), None);
    assert_eq!(table.value(8, "Aomori"), Some(0.70));
    assert_eq!(table.value(23, "Aomori"), None);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_rejects_html_response() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    // An expired session gets the regular page back with HTTP 200
    let mock = server
        .mock("POST", "/show/table.html")
        .with_status(200)
        .with_body("<html><head></head><body>session expired</body></html>")
        .create_async()
        .await;

    let result = client
        .fetch_daily_irradiation(date(2021, 1, 1), date(2021, 1, 6), &[Station::Fukuoka], false)
        .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::HtmlResponse => {}
        e => panic!("Expected HtmlResponse, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_propagates_http_error() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let mock = server
        .mock("POST", "/show/table.html")
        .with_status(500)
        .create_async()
        .await;

    let result = client
        .fetch_daily_irradiation(date(2021, 1, 1), date(2021, 1, 6), &[Station::Fukuoka], false)
        .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::Status(status, url) => {
            assert_eq!(status.as_u16(), 500);
            assert!(url.ends_with("/show/table.html"));
        }
        e => panic!("Expected Status error, got: {e:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_bad_csv_carries_raw_text() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let body = "unexpected maintenance notice";
    server
        .mock("POST", "/show/table.html")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let result = client
        .fetch_daily_irradiation(date(2021, 1, 1), date(2021, 1, 6), &[Station::Fukuoka], false)
        .await;

    assert!(result.is_err());
    match result.unwrap_err() {
        FetchError::BadCsv(err) => {
            assert_eq!(err.kind, BadCsvKind::MissingBanner);
            assert_eq!(err.raw, body);
        }
        e => panic!("Expected BadCsv error, got: {e:?}"),
    }
}

#[tokio::test]
async fn test_session_reused_across_fetches() {
    let mut server = Server::new_async().await;
    let client = open_client(&mut server, false).await;

    let mock = server
        .mock("POST", "/show/table.html")
        .match_body(Matcher::UrlEncoded(
            "PHPSESSID".into(),
            "testsid1234567890".into(),
        ))
        .with_status(200)
        .with_body(include_bytes!("fixtures/daily_kyushu.csv"))
        .expect(2)
        .create_async()
        .await;

    let stations = [Station::Fukuoka, Station::Saga, Station::Nagasaki];
    for _ in 0..2 {
        let table = client
            .fetch_daily_irradiation(date(2021, 1, 1), date(2021, 1, 6), &stations, false)
            .await
            .unwrap();
        assert_eq!(table.rows.len(), 6);
    }

    mock.assert_async().await;
}
