//! cli used by restaurant owners and staff to interact with the server

use clap::{ArgAction, Args, Parser, Subcommand};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const HOST: &str = "http://localhost:8080";

#[derive(Parser, Debug)]
#[command(name = "tablebook")]
#[command(about = "client cli used by restaurant owners and staff to manage floor plans and bookings", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// floor-plan table ops
    #[command(arg_required_else_help = true)]
    Table(TableArgs),
    /// booking ops
    #[command(arg_required_else_help = true)]
    Booking(BookingArgs),
}

#[derive(Debug, Args)]
struct TableArgs {
    #[command(subcommand)]
    command: TableCmds,
}

#[derive(Debug, Subcommand)]
enum TableCmds {
    /// list every table of a restaurant
    List {
        #[arg(short, long)]
        restaurant: i64,
    },
    /// bulk-create tables from one capacity/count pair
    Create {
        #[arg(short, long)]
        restaurant: i64,
        #[arg(long, help = "Owner user id recorded on the new tables")]
        owner: i64,
        #[arg(long, value_parser = clap::value_parser!(i16).range(1..))]
        capacity: i16,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i16).range(1..))]
        count: i16,
    },
    /// nudge a table by a relative offset and persist the result
    Move {
        id: i64,
        #[arg(short, long)]
        restaurant: i64,
        #[arg(long, allow_hyphen_values = true)]
        dx: f64,
        #[arg(long, allow_hyphen_values = true)]
        dy: f64,
    },
    /// open or close a table
    Availability {
        id: i64,
        #[arg(long, action = ArgAction::Set)]
        open: bool,
    },
    /// remove a table from the floor plan
    Remove { id: i64 },
}

#[derive(Debug, Args)]
struct BookingArgs {
    #[command(subcommand)]
    command: BookingCmds,
}

#[derive(Debug, Subcommand)]
enum BookingCmds {
    /// book a table for a party
    Create {
        table: i64,
        #[arg(short, long)]
        restaurant: i64,
        #[arg(short, long)]
        user: i64,
        #[arg(short, long, value_parser = clap::value_parser!(i16).range(1..))]
        party_size: i16,
    },
    /// list bookings of a restaurant
    List {
        #[arg(short, long)]
        restaurant: i64,
    },
    /// approve a booking request
    Approve { id: i64 },
    /// turn down a booking request
    Reject { id: i64 },
}

#[derive(Debug, Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct TableView {
    id: i64,
    position: Position,
    capacity: i16,
    is_available: bool,
}

#[derive(Debug, Deserialize)]
struct GetTablesResponse {
    tables: Vec<TableView>,
}

#[derive(Debug, Deserialize)]
struct CreateTablesResponse {
    created: u64,
}

#[derive(Debug, Deserialize)]
struct CreateBookingResponse {
    booking_id: Option<i64>,
    hold_minutes: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BookingView {
    id: i64,
    user_id: i64,
    table_id: i64,
    party_size: i16,
    booked_at: String,
    is_approved: bool,
    is_expired: bool,
}

#[derive(Debug, Deserialize)]
struct GetBookingsResponse {
    bookings: Vec<BookingView>,
}

async fn set_approval(client: &Client, id: i64, approve: bool) -> Result<(), anyhow::Error> {
    let res = client
        .patch(format!("{HOST}/v1/booking/{id}"))
        .json(&serde_json::json!({ "approve": approve }))
        .send()
        .await?;
    match res.status() {
        StatusCode::OK => {
            println!("booking {} {}", id, if approve { "approved" } else { "rejected" });
        }
        StatusCode::NOT_FOUND => println!("no such booking"),
        unexpected => println!("got unexpected status code, {}", unexpected),
    }
    Ok(())
}

async fn fetch_tables(client: &Client, restaurant: i64) -> Result<Vec<TableView>, anyhow::Error> {
    let res = client
        .get(format!("{HOST}/v1/restaurant/{restaurant}/tables"))
        .send()
        .await?;
    if res.status() != StatusCode::OK {
        anyhow::bail!("failed to list tables, got {}", res.status());
    }
    Ok(res.json::<GetTablesResponse>().await?.tables)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();
    let client = Client::new();

    match args.command {
        Commands::Table(table) => match table.command {
            TableCmds::List { restaurant } => {
                for t in fetch_tables(&client, restaurant).await? {
                    println!(
                        "table {:>4}  capacity {:>2}  at ({:.0}, {:.0})  {}",
                        t.id,
                        t.capacity,
                        t.position.x,
                        t.position.y,
                        if t.is_available { "open" } else { "closed" }
                    );
                }
            }
            TableCmds::Create {
                restaurant,
                owner,
                capacity,
                count,
            } => {
                let res = client
                    .post(format!("{HOST}/v1/restaurant/{restaurant}/tables"))
                    .json(&serde_json::json!({
                        "created_by": owner,
                        "specs": [{ "capacity": capacity, "count": count }],
                    }))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => {
                        let res = res.json::<CreateTablesResponse>().await?;
                        println!("created {} tables for restaurant {}", res.created, restaurant);
                    }
                    StatusCode::BAD_REQUEST => {
                        println!("invalid capacity/count pair");
                    }
                    unexpected => {
                        println!("got unexpected status code, {}", unexpected);
                    }
                }
            }
            TableCmds::Move {
                id,
                restaurant,
                dx,
                dy,
            } => {
                let tables = fetch_tables(&client, restaurant).await?;
                let Some(t) = tables.into_iter().find(|t| t.id == id) else {
                    println!("table {} not found in restaurant {}", id, restaurant);
                    return Ok(());
                };
                let (x, y) = (t.position.x + dx, t.position.y + dy);
                let res = client
                    .patch(format!("{HOST}/v1/table/{id}/position"))
                    .json(&serde_json::json!({ "x": x, "y": y }))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => println!("table {} moved to ({:.0}, {:.0})", id, x, y),
                    unexpected => println!("failed to move table, got {}", unexpected),
                }
            }
            TableCmds::Availability { id, open } => {
                let res = client
                    .patch(format!("{HOST}/v1/table/{id}/availability"))
                    .json(&serde_json::json!({ "is_available": open }))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => {
                        println!("table {} is now {}", id, if open { "open" } else { "closed" });
                    }
                    unexpected => println!("failed to update table, got {}", unexpected),
                }
            }
            TableCmds::Remove { id } => {
                let res = client
                    .delete(format!("{HOST}/v1/table/{id}"))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => println!("table {} removed", id),
                    StatusCode::NOT_FOUND => println!("no such table"),
                    unexpected => println!("got unexpected status code, {}", unexpected),
                }
            }
        },
        Commands::Booking(booking) => match booking.command {
            BookingCmds::Create {
                table,
                restaurant,
                user,
                party_size,
            } => {
                let res = client
                    .post(format!("{HOST}/v1/table/{table}/bookings"))
                    .json(&serde_json::json!({
                        "user_id": user,
                        "restaurant_id": restaurant,
                        "party_size": party_size,
                    }))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => {
                        let res = res.json::<CreateBookingResponse>().await?;
                        match (res.booking_id, res.hold_minutes) {
                            (Some(id), Some(hold)) => {
                                println!("booking {} confirmed, table held for {} minutes", id, hold);
                            }
                            _ => println!("booking declined: {}", res.message),
                        }
                    }
                    StatusCode::CONFLICT => {
                        println!("table {} was just taken, please pick another one", table);
                    }
                    StatusCode::NOT_FOUND => println!("no such table"),
                    StatusCode::BAD_REQUEST => println!("invalid party size"),
                    unexpected => println!("got unexpected status code, {}", unexpected),
                }
            }
            BookingCmds::List { restaurant } => {
                let res = client
                    .get(format!("{HOST}/v1/restaurant/{restaurant}/bookings"))
                    .send()
                    .await?;
                match res.status() {
                    StatusCode::OK => {
                        for b in res.json::<GetBookingsResponse>().await?.bookings {
                            println!(
                                "booking {:>4}  table {:>4}  party {:>2}  user {:>6}  at {}  {}{}",
                                b.id,
                                b.table_id,
                                b.party_size,
                                b.user_id,
                                b.booked_at,
                                if b.is_approved { "approved" } else { "pending" },
                                if b.is_expired { " (expired)" } else { "" },
                            );
                        }
                    }
                    unexpected => println!("got unexpected status code, {}", unexpected),
                }
            }
            BookingCmds::Approve { id } => set_approval(&client, id, true).await?,
            BookingCmds::Reject { id } => set_approval(&client, id, false).await?,
        },
    };
    Ok(())
}
