use chrono::{Datelike, NaiveDate};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::fetch_error::FetchError;
use crate::response::{IrradiationTable, Resolution};
use crate::stations::Station;

const DEFAULT_BASE_URL: &str = "https://www.data.jma.go.jp/gmd/risk/obsdl";

/// The portal rejects requests without a browser-looking user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:84.0) Gecko/20100101 Firefox/84.0";

/// Element number for global solar irradiation in the portal's download form.
const IRRADIATION_ELEMENT: &str = "610";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the observation-data download portal.
///
/// The portal has no API: downloads go through the same PHP form the
/// website uses. A session id must be scraped from the download page
/// first (`open_session`), then each download POSTs a bespoke form and
/// gets Shift_JIS CSV back.
pub struct JmaClient {
    client: reqwest::Client,
    base_url: String,
    session_id: Option<String>,
    convert_to_kwh: bool,
}

impl JmaClient {
    /// `convert_to_kwh` converts downloaded values from MJ/m² to kWh/m².
    pub fn new(convert_to_kwh: bool) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, convert_to_kwh)
    }

    /// Point the client at a different portal root, e.g. a test server.
    pub fn with_base_url(base_url: impl Into<String>, convert_to_kwh: bool) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            session_id: None,
            convert_to_kwh,
        }
    }

    /// Fetch the download page and scrape the PHP session id out of it.
    /// Must succeed before any download call.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn open_session(&mut self) -> Result<(), FetchError> {
        let url = format!("{}/index.php", self.base_url);
        debug!("Requesting download page to open a session");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        debug!("Received HTTP response with status: {status}");
        if !status.is_success() {
            return Err(FetchError::Status(status, url));
        }

        let html = response.text().await?;
        let session_id = extract_session_id(&html)?;
        debug!("Opened portal session");
        self.session_id = Some(session_id);
        Ok(())
    }

    /// Download daily irradiation totals for `stations` over the closed
    /// date range. `long_term_average` adds each station's normal-year
    /// column (`_LT` suffixed) next to its measurement column.
    #[instrument(skip(self, stations), fields(start = %start, end = %end, station_count = stations.len()))]
    pub async fn fetch_daily_irradiation(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        stations: &[Station],
        long_term_average: bool,
    ) -> Result<IrradiationTable, FetchError> {
        self.fetch_table(start, end, stations, Resolution::Daily, long_term_average)
            .await
    }

    /// Download hourly irradiation for `stations` over the closed date
    /// range. The portal offers no long-term-average option at hourly
    /// resolution.
    #[instrument(skip(self, stations), fields(start = %start, end = %end, station_count = stations.len()))]
    pub async fn fetch_hourly_irradiation(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        stations: &[Station],
    ) -> Result<IrradiationTable, FetchError> {
        self.fetch_table(start, end, stations, Resolution::Hourly, false)
            .await
    }

    async fn fetch_table(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        stations: &[Station],
        resolution: Resolution,
        long_term_average: bool,
    ) -> Result<IrradiationTable, FetchError> {
        let session_id = self
            .session_id
            .as_deref()
            .ok_or(FetchError::SessionNotOpened)?;

        let url = format!("{}/show/table.html", self.base_url);
        let form = build_download_form(
            session_id,
            start,
            end,
            stations,
            resolution,
            long_term_average,
        );

        debug!("Posting download form to {url}");
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/html, */*; q=0.01")
            .header(reqwest::header::REFERER, format!("{}/index.php", self.base_url))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        debug!("Received HTTP response with status: {status}");
        if !status.is_success() {
            warn!("Download request rejected with status {status}");
            return Err(FetchError::Status(status, url));
        }

        // The portal serves Shift_JIS and does not always declare it.
        let text = response.text_with_charset("shift-jis").await?;
        debug!("Retrieved CSV content, size: {} bytes", text.len());

        // An expired or unknown session comes back as the regular HTML
        // page with HTTP 200, never as an error status.
        if is_html_page(&text) {
            warn!("Portal returned an HTML page instead of CSV");
            return Err(FetchError::HtmlResponse);
        }

        Ok(IrradiationTable::parse(&text, resolution, self.convert_to_kwh)?)
    }
}

impl Default for JmaClient {
    fn default() -> Self {
        Self::new(false)
    }
}

/// The download page carries the PHP session id in a hidden input:
/// `<input type="hidden" id="sid" value="xxx" />`
fn extract_session_id(html: &str) -> Result<String, FetchError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("input#sid").unwrap();

    let session_id = document
        .select(&selector)
        .find_map(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            error!("No session id field found in the download page");
            debug!(
                "HTML preview (first 500 chars): {}",
                &html.chars().take(500).collect::<String>()
            );
            FetchError::MissingSessionId
        })?;

    Ok(session_id.to_string())
}

fn is_html_page(text: &str) -> bool {
    text.contains("<head>") || text.contains("<body")
}

/// Form body for one download, in the field order the portal's own
/// frontend submits. `optionNumList` appears only when the long-term
/// average is requested; the portal treats an absent field and an empty
/// list the same way.
fn build_download_form(
    session_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    stations: &[Station],
    resolution: Resolution,
    long_term_average: bool,
) -> Vec<(&'static str, String)> {
    let station_codes = encode_quoted_list(stations.iter().map(|station| station.code()));
    // Interleaved bounds: start/end year, start/end month, start/end day.
    let ymd = encode_quoted_list([
        start.year().to_string(),
        end.year().to_string(),
        start.month().to_string(),
        end.month().to_string(),
        start.day().to_string(),
        end.day().to_string(),
    ]);

    let mut form = vec![
        ("stationNumList", station_codes),
        ("aggrgPeriod", resolution.aggregation_code().to_string()),
        (
            "elementNumList",
            format!(r#"[["{IRRADIATION_ELEMENT}",""]]"#),
        ),
        ("interAnnualFlag", "1".to_string()),
        ("ymdList", ymd),
    ];
    if long_term_average {
        form.push(("optionNumList", r#"[["op1",0]]"#.to_string()));
    }
    form.extend([
        ("downloadFlag", "true".to_string()),
        ("rmkFlag", "0".to_string()),
        ("disconnectFlag", "0".to_string()),
        ("youbiFlag", "0".to_string()),
        ("fukenFlag", "0".to_string()),
        ("kijiFlag", "0".to_string()),
        ("huukouFlag", "0".to_string()),
        ("csvFlag", "0".to_string()),
        ("jikantaiFlag", "0".to_string()),
        ("ymdLiteral", "1".to_string()),
        ("PHPSESSID", session_id.to_string()),
    ]);
    form
}

/// Quoted JSON-ish list with a comma-space separator, exactly as the
/// portal's frontend encodes it: `["s47807", "s47813"]`.
fn encode_quoted_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let quoted: Vec<String> = items
        .into_iter()
        .map(|item| format!("\"{item}\""))
        .collect();
    format!("[{}]", quoted.join(", "))
}
