use std::str::FromStr;

use courier_core::{search_deliveries, DeliverySearchParams};
use courier_domain::ChannelType;
use uuid::Uuid;

fn main() {
    // Cargar .env si existe para obtener DATABASE_URL
    let _ = dotenvy::dotenv();
    // CLI mínima: `courier search --workspace <UUID> [--user <ID>] [--journey <UUID>]
    //              [--message <UUID>] [--broadcast <UUID>] [--channel <NAME>]
    //              [--limit <N>] [--cursor <TOK>]`
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "search" {
        let mut workspace: Option<Uuid> = None;
        let mut user: Option<String> = None;
        let mut journey: Option<Uuid> = None;
        let mut message: Option<Uuid> = None;
        let mut broadcast: Option<Uuid> = None;
        let mut channel: Option<ChannelType> = None;
        let mut limit: Option<usize> = None;
        let mut cursor: Option<String> = None;
        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--workspace" => {
                    i += 1;
                    if i < args.len() { workspace = Some(parse_uuid_flag("--workspace", &args[i])); }
                }
                "--user" => {
                    i += 1;
                    if i < args.len() { user = Some(args[i].clone()); }
                }
                "--journey" => {
                    i += 1;
                    if i < args.len() { journey = Some(parse_uuid_flag("--journey", &args[i])); }
                }
                "--message" => {
                    i += 1;
                    if i < args.len() { message = Some(parse_uuid_flag("--message", &args[i])); }
                }
                "--broadcast" => {
                    i += 1;
                    if i < args.len() { broadcast = Some(parse_uuid_flag("--broadcast", &args[i])); }
                }
                "--channel" => {
                    i += 1;
                    if i < args.len() {
                        channel = match ChannelType::from_str(&args[i]) {
                            Ok(c) => Some(c),
                            Err(e) => { eprintln!("[courier search] {e}"); std::process::exit(3); }
                        };
                    }
                }
                "--limit" => {
                    i += 1;
                    if i < args.len() {
                        limit = match args[i].parse::<usize>() {
                            Ok(n) => Some(n),
                            Err(e) => { eprintln!("[courier search] --limit: {e}"); std::process::exit(3); }
                        };
                    }
                }
                "--cursor" => {
                    i += 1;
                    if i < args.len() { cursor = Some(args[i].clone()); }
                }
                _ => {}
            }
            i += 1;
        }

        let Some(workspace_id) = workspace else {
            eprintln!("Uso: courier search --workspace <UUID> [--user <ID>] [--journey <UUID>] [--message <UUID>] [--broadcast <UUID>] [--channel <NAME>] [--limit <N>] [--cursor <TOK>]");
            std::process::exit(2);
        };

        if std::env::var("DATABASE_URL").is_err() {
            eprintln!("[courier search] requiere DATABASE_URL para consultar el log persistente");
            std::process::exit(4);
        }
        let pool = match courier_persistence::build_dev_pool_from_env() {
            Ok(p) => p,
            Err(e) => { eprintln!("[courier search] pool error: {e}"); std::process::exit(5); }
        };
        let store = courier_persistence::PgEventLog::new(courier_persistence::PoolProvider { pool });

        let mut params = DeliverySearchParams::for_workspace(workspace_id);
        params.user_id = user;
        params.journey_id = journey;
        params.message_id = message;
        params.broadcast_id = broadcast;
        params.channel = channel;
        if let Some(limit) = limit {
            params.limit = limit;
        }
        params.cursor = cursor;

        match search_deliveries(&store, &params) {
            Ok(page) => {
                for item in &page.items {
                    println!("{}", serde_json::to_string(item).expect("serialize delivery"));
                }
                if let Some(token) = &page.cursor {
                    eprintln!("cursor: {token}");
                }
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(5);
            }
        }
    } else {
        println!("courier-cli: use the 'search' subcommand");
    }
}

/// Parsea el valor UUID de un flag; un valor inválido aborta con código 3
/// señalando el flag culpable, igual que `--channel`.
fn parse_uuid_flag(flag: &str, raw: &str) -> Uuid {
    match Uuid::parse_str(raw) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("[courier search] {flag}: {e}");
            std::process::exit(3);
        }
    }
}
