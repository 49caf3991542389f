//! Terminal front end for the ProGear agent API.

mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use progear_chat::inventory::BulkReceiveItem;
use progear_chat::{
    AlertQuery, AlertSeverity, ChatClient, ChatError, ChatRequest, ClientConfig, MovementType,
    ProductCategory, ProductQuery, StaticToken, StockAdjustment, StockStatus,
};

#[derive(Parser, Debug)]
#[command(name = "progear", version, about = "Chat with the ProGear sales and inventory agents")]
struct Cli {
    /// Identity token sent as the bearer credential.
    #[arg(long, global = true, env = "PROGEAR_ID_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API origin. Overrides `PROGEAR_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream a reply. Starts an interactive session when no message is given.
    Chat {
        message: Option<String>,
        #[arg(long)]
        conversation_id: Option<String>,
        /// Print each stream event as a JSON line.
        #[arg(long)]
        json: bool,
    },
    /// Send one message and print the full reply when it is ready.
    Ask {
        message: String,
        #[arg(long)]
        conversation_id: Option<String>,
        /// Use the model-backed route instead of the keyword router.
        #[arg(long)]
        ai: bool,
    },
    /// Show which backends the signed-in user may use.
    Access,
    /// Show the signed-in user.
    Me,
    /// Show group membership and the access it grants.
    Groups,
    /// Manage the Salesforce account link.
    Salesforce {
        #[command(subcommand)]
        action: SalesforceAction,
    },
    /// Query and adjust warehouse stock.
    Inventory {
        #[command(subcommand)]
        action: InventoryAction,
    },
    /// Print the stored messages of a conversation.
    History { conversation_id: String },
    /// Check that the API is up.
    Health,
    /// Decode a captured stream body from a file.
    Replay {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum InventoryAction {
    /// List products.
    Products {
        #[arg(long)]
        category: Option<ProductCategory>,
        #[arg(long)]
        status: Option<StockStatus>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one product.
    Show { sku: String },
    /// Change a stock level by a signed amount.
    Adjust {
        sku: String,
        #[arg(allow_negative_numbers = true)]
        change: i64,
        #[arg(long)]
        reason: String,
        #[arg(long, default_value = "adjustment")]
        movement: MovementType,
    },
    /// Request a reorder.
    Reorder { sku: String, quantity: u32 },
    /// Recent stock movements of a product.
    Movements {
        sku: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Receive several products at once, given as SKU=QTY pairs.
    Receive {
        #[arg(required = true, value_parser = parse_receipt)]
        items: Vec<BulkReceiveItem>,
    },
    /// List stock alerts.
    Alerts {
        #[arg(long)]
        severity: Option<AlertSeverity>,
        /// Only unacknowledged alerts.
        #[arg(long)]
        open: bool,
    },
    /// Acknowledge an alert.
    Ack { alert_id: String },
    /// Stock totals across the catalogue.
    Summary,
    /// Totals for one category.
    Category { category: ProductCategory },
    /// Products at or below a threshold.
    LowStock {
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Whether cross-app access is configured.
    XaaStatus,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum SalesforceAction {
    Connect,
    Disconnect,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    progear_chat::init_observability();

    dispatch(Cli::parse()).await
}

/// Runs the parsed command. Offline commands never build a client, so a
/// bad API setting cannot break them.
async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Replay { file, json } => ui::replay(&file, json).await,
        command => {
            let client = build_client(cli.token.as_deref(), cli.api_url.as_deref())?;
            run(&client, command).await
        }
    }
}

fn build_client(token: Option<&str>, api_url: Option<&str>) -> Result<ChatClient, ChatError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config = config.base_url(url);
    }
    let auth = match token {
        Some(token) => StaticToken::new(token),
        None => StaticToken::none(),
    };
    ChatClient::new(config, Arc::new(auth))
}

async fn run(client: &ChatClient, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Chat {
            message: Some(message),
            conversation_id,
            json,
        } => {
            let request = with_conversation(ChatRequest::new(message), conversation_id);
            request.validate()?;
            ui::single_message(client, &request, json).await?;
        }
        Command::Chat {
            message: None,
            conversation_id,
            json,
        } => ui::interactive_chat(client, conversation_id, json).await?,
        Command::Ask {
            message,
            conversation_id,
            ai,
        } => {
            let request = with_conversation(ChatRequest::new(message), conversation_id);
            request.validate()?;
            let response = if ai {
                client.chat_ai(&request).await?
            } else {
                client.chat(&request).await?
            };
            for call in &response.tool_calls {
                eprintln!("[{}] {:?}", call.effective_name(), call.status);
            }
            println!("{}", response.message);
            eprintln!("-- {} · conversation {}", response.agent.name, response.conversation_id);
        }
        Command::Access => {
            let access = client.user_access().await?;
            let sf = &access.salesforce;
            println!(
                "salesforce: {} {}",
                if sf.connected { "connected" } else { "not connected" },
                sf.scopes.join(" ")
            );
            if let Some(instance) = &sf.instance_url {
                println!("  instance: {instance}");
            }
            let inv = &access.inventory;
            println!(
                "inventory:  {} {}",
                if inv.authorized { "authorized" } else { "not authorized" },
                inv.scopes.join(" ")
            );
        }
        Command::Me => {
            let me = client.user_info().await?;
            println!("{} <{}>", me.display_name(), me.email);
            if !me.groups.is_empty() {
                println!("groups: {}", me.groups.join(", "));
            }
        }
        Command::Groups => {
            let groups = client.user_groups().await?;
            println!("groups: {}", groups.groups.join(", "));
            println!(
                "sales: {}  warehouse: {}  admin: {}",
                yes_no(groups.has_sales_access),
                yes_no(groups.has_warehouse_access),
                yes_no(groups.is_admin)
            );
        }
        Command::Inventory { action } => run_inventory(client, action).await?,
        Command::Salesforce { action } => match action {
            SalesforceAction::Connect => {
                let url = client.connect_salesforce().await?;
                println!("Open this URL to link your Salesforce account:\n{url}");
            }
            SalesforceAction::Disconnect => {
                client.disconnect_salesforce().await?;
                println!("Salesforce disconnected");
            }
            SalesforceAction::Status => {
                let status = client.salesforce_status().await?;
                match (status.connected, &status.instance_url) {
                    (true, Some(url)) => println!("connected to {url}"),
                    (true, None) => println!("connected"),
                    (false, _) => println!("not connected"),
                }
                if let Some(err) = status.error.or(status.message) {
                    println!("{err}");
                }
            }
        },
        Command::History { conversation_id } => {
            for message in client.conversation_messages(&conversation_id).await? {
                let speaker = match message.agent {
                    Some(agent) => format!("{:?} ({})", message.role, agent.as_str()),
                    None => format!("{:?}", message.role),
                };
                println!("{speaker}: {}", message.content);
            }
        }
        Command::Health => {
            let health = client.health().await?;
            println!("{} {} {}", health.status, health.app, health.version);
            if !health.is_healthy() {
                return Err(format!("API reported status {:?}", health.status).into());
            }
        }
        Command::Replay { file, json } => ui::replay(&file, json).await?,
    }
    Ok(())
}

async fn run_inventory(client: &ChatClient, action: InventoryAction) -> Result<(), ChatError> {
    match action {
        InventoryAction::Products {
            category,
            status,
            search,
            limit,
        } => {
            let mut query = ProductQuery::new();
            query.category = category;
            query.status = status;
            if let Some(search) = search {
                query = query.search(search);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            for product in client.list_products(&query).await? {
                println!(
                    "{:<14} {:>5}  {:<12} {}",
                    product.sku, product.quantity, product.status, product.name
                );
            }
        }
        InventoryAction::Show { sku } => {
            let product = client.product(&sku).await?;
            println!("{} ({})", product.name, product.sku);
            println!("  category: {}  price: {:.2}", product.category, product.price);
            println!(
                "  on hand: {}  reorder at: {}  status: {}",
                product.quantity, product.reorder_point, product.status
            );
            if let Some(location) = &product.location {
                println!("  location: {location}");
            }
        }
        InventoryAction::Adjust {
            sku,
            change,
            reason,
            movement,
        } => {
            let adjustment = StockAdjustment::new(change, reason).movement_type(movement);
            let result = client.update_stock(&sku, &adjustment).await?;
            println!(
                "{}: {} -> {}",
                result.sku, result.old_quantity, result.new_quantity
            );
        }
        InventoryAction::Reorder { sku, quantity } => {
            let order = client.create_reorder(&sku, quantity).await?;
            println!(
                "{} {} x{} ({:.2}) {}",
                order.reorder_id, order.sku, order.quantity, order.estimated_cost, order.status
            );
        }
        InventoryAction::Movements { sku, limit } => {
            for movement in client.stock_movements(&sku, limit).await? {
                println!(
                    "{:<10} {:>+5}  {}",
                    movement.movement_type,
                    movement.quantity_change,
                    movement.reason.as_deref().unwrap_or("")
                );
            }
        }
        InventoryAction::Receive { items } => {
            let report = client.bulk_receive(&items).await?;
            for line in &report.results {
                match &line.error {
                    Some(err) => println!("{}: failed: {err}", line.sku),
                    None => println!("{}: received", line.sku),
                }
            }
            println!("{} of {} received", report.successful, report.total_items);
        }
        InventoryAction::Alerts { severity, open } => {
            let mut query = AlertQuery::new();
            query.severity = severity;
            if open {
                query = query.acknowledged(false);
            }
            for alert in client.inventory_alerts(&query).await? {
                let severity = alert.severity.map_or("-", AlertSeverity::as_str);
                println!(
                    "{} [{severity}] {} {}: {} of {}",
                    alert.id, alert.sku, alert.alert_type, alert.current_quantity, alert.threshold
                );
            }
        }
        InventoryAction::Ack { alert_id } => {
            let ack = client.acknowledge_alert(&alert_id).await?;
            println!("{}", ack.message.unwrap_or_else(|| format!("{} acknowledged", ack.alert_id)));
        }
        InventoryAction::Summary => {
            let summary = client.inventory_summary().await?;
            println!(
                "{} products, {} units, value {:.2}",
                summary.total_products, summary.total_units, summary.total_value
            );
            println!(
                "in stock {}  low {}  out {}",
                summary.in_stock_count, summary.low_stock_count, summary.out_of_stock_count
            );
        }
        InventoryAction::Category { category } => {
            let analytics = client.category_analytics(category).await?;
            println!(
                "{}: {} products, {} units, value {:.2}, avg price {:.2}",
                analytics.category,
                analytics.product_count,
                analytics.total_units,
                analytics.total_value,
                analytics.average_price
            );
        }
        InventoryAction::LowStock { threshold } => {
            let report = client.low_stock_report(threshold).await?;
            for item in &report.items {
                println!("{:<14} {:>5}  {}", item.sku, item.quantity, item.name);
            }
            println!("{} at or below {}", report.count, report.threshold);
        }
        InventoryAction::XaaStatus => {
            let status = client.xaa_status().await?;
            println!("xaa: {}", if status.xaa_enabled { "enabled" } else { "disabled" });
            if let Some(reason) = status.reason.or(status.message).or(status.error) {
                println!("{reason}");
            }
        }
    }
    Ok(())
}

/// Parses a `SKU=QTY` receipt line.
fn parse_receipt(raw: &str) -> Result<BulkReceiveItem, String> {
    let (sku, quantity) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SKU=QTY, got {raw:?}"))?;
    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("quantity in {raw:?} is not a whole number"))?;
    if sku.trim().is_empty() || quantity <= 0 {
        return Err(format!("{raw:?} needs a SKU and a positive quantity"));
    }
    Ok(BulkReceiveItem::new(sku.trim(), quantity))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn with_conversation(request: ChatRequest, conversation_id: Option<String>) -> ChatRequest {
    match conversation_id {
        Some(id) => request.conversation_id(id),
        None => request,
    }
}
