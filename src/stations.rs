//! Station tables for the JMA observation-data download portal.
//!
//! Two lookups live here: the `Station` enum maps canonical station names
//! to the portal's station-number codes (used when building download
//! requests), and `canonical_station_name` translates the Japanese station
//! names found in response headers to their English equivalents (used by
//! the response parser).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

/// Japanese station name -> canonical English name.
///
/// Response headers label columns with native-script names. Names missing
/// from this table pass through `canonical_station_name` unchanged, so an
/// unlisted station never breaks a parse.
static STATION_NAMES_EN: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("秋田", "Akita"),
        ("青森", "Aomori"),
        ("福岡", "Fukuoka"),
        ("彦根", "Hikone"),
        ("広島", "Hiroshima"),
        ("鹿児島", "Kagoshima"),
        ("熊本", "Kumamoto"),
        ("松江", "Matsue"),
        ("宮崎", "Miyazaki"),
        ("盛岡", "Morioka"),
        ("長野", "Nagano"),
        ("長崎", "Nagasaki"),
        ("名古屋", "Nagoya"),
        ("那覇", "Naha"),
        ("新潟", "Niigata"),
        ("大分", "Oita"),
        ("佐賀", "Saga"),
        ("札幌", "Sapporo"),
        ("仙台", "Sendai"),
        ("静岡", "Shizuoka"),
        ("富山", "Toyama"),
        ("山形", "Yamagata"),
    ])
});

/// Translate a native-script station name to its canonical English name.
///
/// Total function: unknown names are returned verbatim rather than
/// failing, which keeps the parser forward-compatible with stations that
/// have not been added to the table yet.
pub fn canonical_station_name(native: &str) -> &str {
    STATION_NAMES_EN.get(native).copied().unwrap_or(native)
}

/// Observation stations known to the download portal.
///
/// Codes are the portal's station numbers (`s…` for staffed sites, `a…`
/// for automated ones). Stations below the irradiation group are listed
/// for completeness but do not report irradiation data; requesting them
/// yields empty columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Station {
    Akita,
    Aomori,
    Fukuoka,
    Hikone,
    Hiroshima,
    Kagoshima,
    Kumamoto,
    Matsue,
    Miyazaki,
    Morioka,
    Nagano,
    Nagasaki,
    Nagoya,
    Naha,
    Niigata,
    Oita,
    Saga,
    Sapporo,
    Sendai,
    Shizuoka,
    Toyama,
    Yamagata,

    // No irradiation data at these sites.
    Aburatsu,
    Fuji,
    Fujisan,
    Fukaura,
    Fukuyama,
    Gifu,
    Hachinohe,
    Hamada,
    Hamamatsu,
    Himeji,
    Hitoyoshi,
    Ibukisan,
    Ishinomaki,
    Kobe,
    Maibara,
    Nago,
    Nobeoka,
    Okayama,
    Owase,
    Sakata,
    Sumoto,
    Takayama,
    Tottori,
    Toyooka,
    Tsu,
    Tsuyama,
    Ueno,
    Yamaguchi,
    Yokkaichi,
}

impl Station {
    /// The portal's station-number code, as sent in `stationNumList`.
    pub fn code(&self) -> &'static str {
        match self {
            Station::Akita => "s47582",
            Station::Aomori => "s47575",
            Station::Fukuoka => "s47807",
            Station::Hikone => "s47761",
            Station::Hiroshima => "s47765",
            Station::Kagoshima => "s47827",
            Station::Kumamoto => "s47819",
            Station::Matsue => "s47741",
            Station::Miyazaki => "s47830",
            Station::Morioka => "s47584",
            Station::Nagano => "s47610",
            Station::Nagasaki => "s47817",
            Station::Nagoya => "s47636",
            Station::Naha => "s47936",
            Station::Niigata => "s47604",
            Station::Oita => "s47815",
            Station::Saga => "s47813",
            Station::Sapporo => "s47412",
            Station::Sendai => "s47590",
            Station::Shizuoka => "s47656",
            Station::Toyama => "s47607",
            Station::Yamagata => "s47588",
            Station::Aburatsu => "s47835",
            Station::Fuji => "a0442",
            Station::Fujisan => "s47639",
            Station::Fukaura => "s47574",
            Station::Fukuyama => "s47767",
            Station::Gifu => "s47632",
            Station::Hachinohe => "s47581",
            Station::Hamada => "s47755",
            Station::Hamamatsu => "s47654",
            Station::Himeji => "s47769",
            Station::Hitoyoshi => "s47824",
            Station::Ibukisan => "s47751",
            Station::Ishinomaki => "s47592",
            Station::Kobe => "s47770",
            Station::Maibara => "a1524",
            Station::Nago => "s47940",
            Station::Nobeoka => "s47822",
            Station::Okayama => "s47768",
            Station::Owase => "s47663",
            Station::Sakata => "s47587",
            Station::Sumoto => "s47776",
            Station::Takayama => "s47617",
            Station::Tottori => "s47746",
            Station::Toyooka => "s47747",
            Station::Tsu => "s47651",
            Station::Tsuyama => "s47756",
            Station::Ueno => "s47649",
            Station::Yamaguchi => "s47784",
            Station::Yokkaichi => "s47684",
        }
    }

    /// Whether the portal publishes irradiation measurements for this site.
    pub fn has_irradiation_data(&self) -> bool {
        matches!(
            self,
            Station::Akita
                | Station::Aomori
                | Station::Fukuoka
                | Station::Hikone
                | Station::Hiroshima
                | Station::Kagoshima
                | Station::Kumamoto
                | Station::Matsue
                | Station::Miyazaki
                | Station::Morioka
                | Station::Nagano
                | Station::Nagasaki
                | Station::Nagoya
                | Station::Naha
                | Station::Niigata
                | Station::Oita
                | Station::Saga
                | Station::Sapporo
                | Station::Sendai
                | Station::Shizuoka
                | Station::Toyama
                | Station::Yamagata
        )
    }

    /// Canonical English name, matching the response parser's column names.
    pub fn name(&self) -> &'static str {
        match self {
            Station::Akita => "Akita",
            Station::Aomori => "Aomori",
            Station::Fukuoka => "Fukuoka",
            Station::Hikone => "Hikone",
            Station::Hiroshima => "Hiroshima",
            Station::Kagoshima => "Kagoshima",
            Station::Kumamoto => "Kumamoto",
            Station::Matsue => "Matsue",
            Station::Miyazaki => "Miyazaki",
            Station::Morioka => "Morioka",
            Station::Nagano => "Nagano",
            Station::Nagasaki => "Nagasaki",
            Station::Nagoya => "Nagoya",
            Station::Naha => "Naha",
            Station::Niigata => "Niigata",
            Station::Oita => "Oita",
            Station::Saga => "Saga",
            Station::Sapporo => "Sapporo",
            Station::Sendai => "Sendai",
            Station::Shizuoka => "Shizuoka",
            Station::Toyama => "Toyama",
            Station::Yamagata => "Yamagata",
            Station::Aburatsu => "Aburatsu",
            Station::Fuji => "Fuji",
            Station::Fujisan => "Fujisan",
            Station::Fukaura => "Fukaura",
            Station::Fukuyama => "Fukuyama",
            Station::Gifu => "Gifu",
            Station::Hachinohe => "Hachinohe",
            Station::Hamada => "Hamada",
            Station::Hamamatsu => "Hamamatsu",
            Station::Himeji => "Himeji",
            Station::Hitoyoshi => "Hitoyoshi",
            Station::Ibukisan => "Ibukisan",
            Station::Ishinomaki => "Ishinomaki",
            Station::Kobe => "Kobe",
            Station::Maibara => "Maibara",
            Station::Nago => "Nago",
            Station::Nobeoka => "Nobeoka",
            Station::Okayama => "Okayama",
            Station::Owase => "Owase",
            Station::Sakata => "Sakata",
            Station::Sumoto => "Sumoto",
            Station::Takayama => "Takayama",
            Station::Tottori => "Tottori",
            Station::Toyooka => "Toyooka",
            Station::Tsu => "Tsu",
            Station::Tsuyama => "Tsuyama",
            Station::Ueno => "Ueno",
            Station::Yamaguchi => "Yamaguchi",
            Station::Yokkaichi => "Yokkaichi",
        }
    }

    /// All stations that report irradiation data.
    pub fn irradiation_stations() -> impl Iterator<Item = Station> {
        ALL_STATIONS
            .iter()
            .copied()
            .filter(Station::has_irradiation_data)
    }
}

const ALL_STATIONS: &[Station] = &[
    Station::Akita,
    Station::Aomori,
    Station::Fukuoka,
    Station::Hikone,
    Station::Hiroshima,
    Station::Kagoshima,
    Station::Kumamoto,
    Station::Matsue,
    Station::Miyazaki,
    Station::Morioka,
    Station::Nagano,
    Station::Nagasaki,
    Station::Nagoya,
    Station::Naha,
    Station::Niigata,
    Station::Oita,
    Station::Saga,
    Station::Sapporo,
    Station::Sendai,
    Station::Shizuoka,
    Station::Toyama,
    Station::Yamagata,
    Station::Aburatsu,
    Station::Fuji,
    Station::Fujisan,
    Station::Fukaura,
    Station::Fukuyama,
    Station::Gifu,
    Station::Hachinohe,
    Station::Hamada,
    Station::Hamamatsu,
    Station::Himeji,
    Station::Hitoyoshi,
    Station::Ibukisan,
    Station::Ishinomaki,
    Station::Kobe,
    Station::Maibara,
    Station::Nago,
    Station::Nobeoka,
    Station::Okayama,
    Station::Owase,
    Station::Sakata,
    Station::Sumoto,
    Station::Takayama,
    Station::Tottori,
    Station::Toyooka,
    Station::Tsu,
    Station::Tsuyama,
    Station::Ueno,
    Station::Yamaguchi,
    Station::Yokkaichi,
];

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Station {
    type Err = String;

    /// Case-insensitive lookup by English name, for CLI arguments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_STATIONS
            .iter()
            .copied()
            .find(|station| station.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown station name '{s}'"))
    }
}
