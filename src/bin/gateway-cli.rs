use clap::{Parser, Subcommand};
use serde_json::Value;

use ride_gateway::model::{ReservationRequest, SearchRequest, TripMode};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client for the ride booking gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9876")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Mode {
    OneWay,
    RoundTrip,
}

impl From<Mode> for TripMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::OneWay => TripMode::OneWay,
            Mode::RoundTrip => TripMode::RoundTrip,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start a search
    Search {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_enum, default_value = "one-way")]
        mode: Mode,
        /// Pickup time as "YYYY-MM-DD HH:mm"
        #[arg(long)]
        pickup: String,
        #[arg(long, default_value_t = 1)]
        passengers: u32,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Poll search results
    PollSearch { search_id: String },
    /// Book a search result
    Reserve {
        #[arg(long)]
        search_id: Option<String>,
        #[arg(long)]
        result_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        airline: String,
        #[arg(long)]
        flight_number: String,
    },
    /// Poll reservation status for a search
    PollReservation { search_id: String },
    /// Cancel a reservation
    Cancel { reservation_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Search {
            from,
            to,
            mode,
            pickup,
            passengers,
            currency,
        } => {
            let body = SearchRequest {
                start_address: from,
                end_address: to,
                mode: mode.into(),
                pickup_datetime: pickup,
                num_passengers: passengers,
                currency,
            };
            client.post(format!("{base}/search/")).json(&body).send().await?
        }
        Commands::PollSearch { search_id } => {
            client.get(format!("{base}/search/{search_id}/poll/")).send().await?
        }
        Commands::Reserve {
            search_id,
            result_id,
            email,
            phone,
            first_name,
            last_name,
            airline,
            flight_number,
        } => {
            let body = ReservationRequest {
                search_id,
                result_id,
                email,
                phone_number: phone,
                first_name,
                last_name,
                airline,
                flight_number,
            };
            client.post(format!("{base}/reservations/")).json(&body).send().await?
        }
        Commands::PollReservation { search_id } => {
            client.get(format!("{base}/reservations/{search_id}/poll/")).send().await?
        }
        Commands::Cancel { reservation_id } => {
            client.delete(format!("{base}/reservations/{reservation_id}/")).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            if json.get("status").and_then(Value::as_str) != Some("success") {
                eprintln!("Gateway reported a failure (HTTP {})", status);
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            eprintln!("Error: gateway returned HTTP {} with a non-JSON body", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
