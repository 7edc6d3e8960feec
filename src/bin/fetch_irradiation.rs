use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jma_irradiation::client::JmaClient;
use jma_irradiation::response::IrradiationTable;
use jma_irradiation::stations::Station;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Period {
    Daily,
    Hourly,
}

#[derive(Parser)]
#[command(name = "fetch-irradiation")]
#[command(about = "Download solar irradiation data from the JMA portal", long_about = None)]
struct Cli {
    /// Stations to download, by name (e.g. fukuoka aomori)
    #[arg(required = true)]
    stations: Vec<Station>,

    /// First date of the range (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last date of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Aggregation period
    #[arg(long, value_enum, default_value_t = Period::Daily)]
    period: Period,

    /// Include each station's long-term average column (daily only)
    #[arg(long)]
    long_term_average: bool,

    /// Convert values from MJ/m2 to kWh/m2
    #[arg(long)]
    kwh: bool,

    /// Print the table as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,jma_irradiation=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    if matches!(cli.period, Period::Hourly) && cli.long_term_average {
        return Err("--long-term-average is only available with --period daily".into());
    }

    let mut client = JmaClient::new(cli.kwh);
    info!("Opening portal session");
    client.open_session().await?;

    let table = match cli.period {
        Period::Daily => {
            client
                .fetch_daily_irradiation(cli.start, cli.end, &cli.stations, cli.long_term_average)
                .await?
        }
        Period::Hourly => {
            client
                .fetch_hourly_irradiation(cli.start, cli.end, &cli.stations)
                .await?
        }
    };
    info!(
        "Downloaded {} rows across {} columns",
        table.rows.len(),
        table.headers.len()
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&table_to_json(&table))?);
    } else {
        print_table(&table);
    }

    Ok(())
}

/// One JSON object per row, keyed by header name, missing cells as null.
fn table_to_json(table: &IrradiationTable) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            if let Some(date_header) = table.headers.first() {
                object.insert(date_header.clone(), row.timestamp.clone().into());
            }
            for (header, value) in table.headers.iter().skip(1).zip(&row.values) {
                let cell = match value {
                    Some(v) => serde_json::Value::from(*v),
                    None => serde_json::Value::Null,
                };
                object.insert(header.clone(), cell);
            }
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

fn print_table(table: &IrradiationTable) {
    println!("{}", table.headers.join(","));
    for row in &table.rows {
        let cells: Vec<String> = row
            .values
            .iter()
            .map(|value| match value {
                Some(v) => format!("{v:.3}"),
                None => "--".to_string(),
            })
            .collect();
        println!("{},{}", row.timestamp, cells.join(","));
    }
}
