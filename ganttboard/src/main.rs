//! `Ganttboard` — command-line client for the scheduling board.
//!
//! Loads the board from a `ganttboard-server` instance, applies one
//! command and prints the result. Configuration via CLI flags,
//! environment variables, or config file
//! (`~/.config/ganttboard/config.toml`).
//!
//! ```bash
//! ganttboard --server-url http://127.0.0.1:8080 add --row 2
//! ganttboard order <TASK_ID> Apple=5 Box=2
//! ganttboard allocate <TASK_ID> North Box=1
//! GANTTBOARD_USER=olena ganttboard move <TASK_ID> 3
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use ganttboard::backend::{BackendError, GoodsCatalog, HttpBackend, WarehouseDirectory};
use ganttboard::board::{Board, BoardError, BoardWarning, CommitOutcome};
use ganttboard::config::{CliArgs, ClientConfig, Command};
use ganttboard::geometry::end_date;
use ganttboard::reconcile::OrderView;
use ganttboard::warehouse::WarehouseSummary;
use ganttboard_proto::catalog::find_item;
use ganttboard_proto::codec::{self, CodecError};
use ganttboard_proto::palette::StatusColor;
use ganttboard_proto::task::TaskId;

type HttpBoard = Board<HttpBackend, HttpBackend>;

/// Errors that end a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid task id {0:?}")]
    InvalidId(String),

    #[error("{0:?} is not in the goods catalog")]
    UnknownItem(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = init_logging(config.log_filter(&cli.log_level), cli.log_file.as_deref());
    tracing::info!(server = %config.server_url, "ganttboard starting");

    let backend = match HttpBackend::new(&config.server_url) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let today = Local::now().date_naive();
    let (mut board, mut warnings) =
        Board::new(config.board_settings(), today, backend.clone(), backend.clone());

    let command = cli.command.clone().unwrap_or(Command::List);
    let result = match board.load().await {
        Ok(_) => run(&mut board, &backend, command, today).await,
        Err(e) => Err(e.into()),
    };
    report_warnings(&mut warnings);

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initialize file-based logging.
///
/// Logs go to a file so stdout only carries command output. Returns a
/// [`WorkerGuard`] that must be held until shutdown to flush buffered
/// entries.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("ganttboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn report_warnings(rx: &mut mpsc::Receiver<BoardWarning>) {
    while let Ok(warning) = rx.try_recv() {
        match warning {
            BoardWarning::SaveFailed { task_id, reason } => {
                eprintln!("warning: task {task_id} changed locally but was not saved ({reason})");
            }
            BoardWarning::DeleteFailed { task_id, reason } => {
                eprintln!("warning: task {task_id} could not be deleted on the server ({reason})");
            }
            BoardWarning::LogFailed { task_id, reason } => {
                eprintln!("warning: change history entry for {task_id} was lost ({reason})");
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<TaskId, CliError> {
    raw.parse().map_err(|_| CliError::InvalidId(raw.to_string()))
}

fn describe(outcome: CommitOutcome) -> &'static str {
    match outcome {
        CommitOutcome::Unchanged => "unchanged",
        CommitOutcome::Persisted => "saved",
        CommitOutcome::Failed => "not saved",
    }
}

#[allow(clippy::too_many_lines)]
async fn run(
    board: &mut HttpBoard,
    backend: &HttpBackend,
    command: Command,
    today: chrono::NaiveDate,
) -> Result<(), CliError> {
    match command {
        Command::List => {
            for task in board.tasks() {
                let end = end_date(task.start, task.visible_days());
                println!(
                    "{}  row {:>2}  {} → {}  {:.2}d  {}",
                    task.id,
                    task.row,
                    task.start,
                    end,
                    task.visible_days(),
                    task.comment
                );
            }
        }
        Command::Add { row, start } => {
            let id = board.create_task(row, start.unwrap_or(today)).await?;
            println!("{id}");
        }
        Command::Move { id, days } => {
            let id = parse_id(&id)?;
            #[allow(clippy::cast_precision_loss)]
            let dx = days as f64 * board.timeline().column_width();
            board.begin_drag(&id)?;
            board.drag_by(&id, dx)?;
            let outcome = board.end_gesture(&id).await?;
            println!("{}: start {} ({})", id, board.task(&id)?.start, describe(outcome));
        }
        Command::Resize { id, days } => {
            let id = parse_id(&id)?;
            let width = board.timeline().days_to_width(days);
            board.begin_resize(&id)?;
            let preview = board.resize_to(&id, width)?;
            let outcome = board.end_gesture(&id).await?;
            println!(
                "{}: {:.2} days, delta {:+.2} ({})",
                id,
                preview.visible_days,
                preview.pending_delta,
                describe(outcome)
            );
        }
        Command::Comment { id, text } => {
            let id = parse_id(&id)?;
            let outcome = board.edit_comment(&id, &text).await?;
            println!("{id}: comment {}", describe(outcome));
        }
        Command::Order { id, items } => {
            let id = parse_id(&id)?;
            board.begin_order_edit(&id)?;
            for (item, qty) in &items {
                board.set_item_quantity(&id, item, *qty)?;
            }
            let outcome = board.save_order(&id).await?;
            if outcome.established_baseline {
                println!("baseline order recorded");
            }
            print_order(board.order_view(&id)?);
        }
        Command::CatalogOrder { id, items } => {
            let id = parse_id(&id)?;
            let catalog = backend.list_categorized().await?;
            let selection = items
                .into_iter()
                .map(|(name, qty)| {
                    find_item(&catalog, &name)
                        .cloned()
                        .map(|goods| (goods, qty))
                        .ok_or(CliError::UnknownItem(name))
                })
                .collect::<Result<Vec<_>, _>>()?;
            board.apply_catalog_order(&id, &selection).await?;
            print_order(board.order_view(&id)?);
            println!("total weight: {:.2}", board.task(&id)?.total_weight);
        }
        Command::ShowOrder { id } => {
            let id = parse_id(&id)?;
            print_order(board.order_view(&id)?);
        }
        Command::ItemStatus { id, item } => {
            let id = parse_id(&id)?;
            let color = board.cycle_item_status(&id, &item).await?;
            println!("{item}: {color}");
        }
        Command::Allocate { id, warehouse, items } => {
            let id = parse_id(&id)?;
            board.open_allocation(&id, &warehouse).await?;
            for (item, requested) in &items {
                let stored = board.allocate(&id, item, *requested)?;
                if i64::from(stored) != *requested {
                    println!("{item}: {requested} requested, {stored} available");
                }
            }
            let saved = board.save_allocation(&id, false).await?;
            for (item, old, new) in &saved.changes {
                println!("{}: {item} {old} → {new}", saved.warehouse);
            }
            print_summary(&board.warehouse_summary(&id)?);
        }
        Command::WarehouseStatus { id, warehouse } => {
            let id = parse_id(&id)?;
            let color = board.cycle_warehouse_status(&id, &warehouse).await?;
            println!("{warehouse}: {color}");
        }
        Command::Summary { id } => {
            let id = parse_id(&id)?;
            print_summary(&board.warehouse_summary(&id)?);
        }
        Command::Catalog => {
            for (category, goods) in backend.list_categorized().await? {
                println!("{category}");
                for item in goods {
                    println!("  {}  {:.2} kg  {}%", item.name, item.weight, item.pallet_coef);
                }
            }
            println!("warehouses: {}", backend.list_warehouses().await?.join(", "));
        }
        Command::History => {
            for entry in backend.change_history().await? {
                let event = entry.event;
                println!(
                    "{}  {:<6}  {}  {}  {} → {}  {}",
                    entry.date_time,
                    event.kind.to_string(),
                    event.user.as_deref().unwrap_or("-"),
                    event.item_name.or(event.warehouse_name).unwrap_or_default(),
                    event.old_value.unwrap_or_default(),
                    event.new_value.unwrap_or_default(),
                    event.comment.unwrap_or_default()
                );
            }
        }
        Command::Delete { id } => {
            let id = parse_id(&id)?;
            board.delete_task(&id).await?;
            println!("{id} deleted");
        }
        Command::Export { path } => {
            let bytes = codec::encode(&board.export_snapshot())?;
            std::fs::write(&path, bytes).map_err(|source| CliError::Io { path, source })?;
        }
        Command::Import { path } => {
            let bytes = std::fs::read(&path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            let snapshot = codec::decode(&bytes)?;
            let total = snapshot.tasks.len();
            let saved = board.import_snapshot(snapshot).await;
            println!("{saved} of {total} tasks saved");
        }
    }
    Ok(())
}

fn print_order(view: Option<OrderView>) {
    let Some(view) = view else {
        println!("no order");
        return;
    };
    if view.empty {
        println!("order empty");
    }
    for line in &view.lines {
        if line.status == StatusColor::Neutral {
            println!("  {line}");
        } else {
            println!("  {line}  [{}]", line.status);
        }
    }
}

fn print_summary(summary: &WarehouseSummary) {
    for tab in &summary.warehouses {
        println!(
            "{} [{}]: {} units, {} kg, {} pallets",
            tab.name,
            tab.status,
            tab.quantity,
            tab.weight_label(),
            tab.pallets_label()
        );
    }
    let totals = &summary.totals;
    println!(
        "total: {} units, {} kg, {} pallets",
        totals.quantity_label(),
        totals.weight_label(),
        totals.pallets_label()
    );
    for item in summary.items.iter().filter(|i| i.over_allocated) {
        println!(
            "warning: {} has {} allocated but only {} ordered",
            item.item, item.allocated, item.ordered
        );
    }
}
