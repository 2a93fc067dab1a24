use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use stockroom_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    events::{Event, EventSender},
    services::{
        dashboard::{DashboardService, LowStockItem},
        import::{ImportReport, ImportService},
        products::ProductService,
    },
};
use tokio::sync::mpsc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Import(args) => handle_import(&context, args, cli.json).await?,
        Commands::NextSku(args) => handle_next_sku(&context, args, cli.json).await?,
        Commands::LowStock => handle_low_stock(&context, cli.json).await?,
        Commands::Migrate => handle_migrate(&context, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "stockroom",
    about = "Stockroom CLI for imports and inventory checks",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import products from a CSV file
    Import(ImportArgs),
    /// Show the SKU the next product in a category would get
    NextSku(NextSkuArgs),
    /// List products with fewer than three available units
    LowStock,
    /// Apply pending database migrations
    Migrate,
}

#[derive(Args)]
struct ImportArgs {
    #[arg(help = "CSV file with a name,category,brand,model,price,unit,quantity,... header")]
    file: PathBuf,
    #[arg(long, help = "Recorded as the author of the imported rows")]
    actor: Option<String>,
}

#[derive(Args)]
struct NextSkuArgs {
    #[arg(help = "Category label, e.g. \"เฟอร์นิเจอร์ (FR)\"")]
    category: String,
}

#[derive(Serialize)]
struct NextSkuOutput<'a> {
    category: &'a str,
    p_id: String,
}

async fn handle_import(context: &CliContext, args: ImportArgs, json: bool) -> Result<()> {
    let body = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let report = context
        .import_service()
        .import_csv(&body, args.actor.as_deref())
        .await
        .context("import failed")?;

    if json {
        print_json(&report)?;
    } else {
        render_import(&report);
    }
    Ok(())
}

async fn handle_next_sku(context: &CliContext, args: NextSkuArgs, json: bool) -> Result<()> {
    let p_id = context
        .product_service()
        .next_sku(&args.category)
        .await
        .context("failed to compute next SKU")?;

    if json {
        print_json(&NextSkuOutput {
            category: &args.category,
            p_id,
        })?;
    } else {
        println!("{}", p_id);
    }
    Ok(())
}

async fn handle_low_stock(context: &CliContext, json: bool) -> Result<()> {
    let items = context
        .dashboard_service()
        .low_stock()
        .await
        .context("failed to load stock")?;

    if json {
        print_json(&items)?;
    } else if items.is_empty() {
        println!("No products are low on stock.");
    } else {
        items.iter().for_each(render_low_stock);
    }
    Ok(())
}

async fn handle_migrate(context: &CliContext, json: bool) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("migrations failed")?;

    if json {
        print_json(&serde_json::json!({ "migrated": true }))?;
    } else {
        println!("Migrations applied.");
    }
    Ok(())
}

struct CliContext {
    _config: AppConfig,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let (event_tx, mut event_rx) = mpsc::channel::<Event>(config.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(event_tx));

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                debug!(target: "stockroom_cli", event = ?event, "received async event");
            }
        });

        Ok(Self {
            _config: config,
            db,
            event_sender,
        })
    }

    fn product_service(&self) -> ProductService {
        ProductService::new(self.db.clone(), self.event_sender.clone())
    }

    fn import_service(&self) -> ImportService {
        ImportService::new(self.product_service(), self.event_sender.clone())
    }

    fn dashboard_service(&self) -> DashboardService {
        DashboardService::new(self.db.clone())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_import(report: &ImportReport) {
    println!("Imported {} product(s)", report.success);
    if !report.errors.is_empty() {
        println!("{} row(s) rejected:", report.errors.len());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
}

fn render_low_stock(item: &LowStockItem) {
    println!(
        "- {} {} • {} of {} available",
        item.p_id, item.name, item.current, item.total
    );
}
