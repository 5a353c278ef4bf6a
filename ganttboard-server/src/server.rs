//! HTTP routes and server startup.
//!
//! | Route | Effect |
//! |-------|--------|
//! | `GET /api/tasks` | tasks inside the retention window |
//! | `POST /api/tasks` | store a task |
//! | `PUT /api/tasks` | replace a known task |
//! | `DELETE /api/tasks/{id}` | delete a known task |
//! | `GET /api/goods` | categorised goods catalog |
//! | `GET /api/warehouses` | warehouse names |
//! | `GET /api/goods_management` | categorised goods catalog |
//! | `POST /api/goods_management` | add an item to a category |
//! | `PUT /api/goods_management` | rename, move or reweigh an item |
//! | `DELETE /api/goods_management` | remove an item |
//! | `GET /api/goods_export` | flat goods list as a download |
//! | `POST /api/goods_import` | replace the goods list |
//! | `GET /api/warehouses_management` | warehouse names |
//! | `POST /api/warehouses_management` | add a warehouse |
//! | `PUT /api/warehouses_management` | rename a warehouse |
//! | `DELETE /api/warehouses_management` | remove a warehouse |
//! | `POST /api/log_event` | append to the change history |
//! | `GET /api/change_history` | change history, newest first |
//! | `GET /health` | liveness and task count |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use chrono::{Days, Local};
use ganttboard_proto::catalog::{Catalog, CatalogEntry, GoodsItem};
use ganttboard_proto::event::{HistoryEntry, LogRequest};
use ganttboard_proto::task::{Task, TaskId};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::StoreError;
use crate::catalog::{DirectoryError, GOODS_FILE, GoodsDb, WAREHOUSES_FILE, WarehouseDb};
use crate::config::ServerConfig;
use crate::history::{ChangeHistory, Recorded};
use crate::tasks::TaskDb;

/// File holding the task table inside the data directory.
pub const TASKS_FILE: &str = "tasks.json";

/// File holding the change history inside the data directory.
pub const HISTORY_FILE: &str = "changes_log.json";

/// Shared server state.
pub struct AppState {
    /// Task table.
    pub tasks: TaskDb,
    /// Change history.
    pub history: ChangeHistory,
    /// Goods catalog.
    pub goods: GoodsDb,
    /// Warehouse names.
    pub warehouses: WarehouseDb,
    /// Tasks starting more than this many days ago are pruned.
    pub retention_days: u32,
}

impl AppState {
    /// State whose stores are never written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        let defaults = ServerConfig::default();
        Self {
            tasks: TaskDb::in_memory(),
            history: ChangeHistory::in_memory(defaults.history_limit),
            goods: GoodsDb::in_memory(),
            warehouses: WarehouseDb::in_memory(),
            retention_days: defaults.retention_days,
        }
    }

    /// Opens the file-backed stores described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if an existing data file cannot be read.
    pub async fn open(config: &ServerConfig) -> Result<Self, StoreError> {
        Ok(Self {
            tasks: TaskDb::open(config.data_dir.join(TASKS_FILE)).await?,
            history: ChangeHistory::open(config.data_dir.join(HISTORY_FILE), config.history_limit)
                .await?,
            goods: GoodsDb::open(config.data_dir.join(GOODS_FILE)).await?,
            warehouses: WarehouseDb::open(config.data_dir.join(WAREHOUSES_FILE)).await?,
            retention_days: config.retention_days,
        })
    }
}

/// Errors returned by handlers, rendered as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The addressed task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Export was asked for before any goods were stored.
    #[error("goods catalog is empty")]
    NoGoods,

    /// A catalog or warehouse edit was rejected.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// A data file could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_)
            | Self::NoGoods
            | Self::Directory(
                DirectoryError::UnknownGoods { .. } | DirectoryError::UnknownWarehouse(_),
            ) => StatusCode::NOT_FOUND,
            Self::Directory(DirectoryError::Missing(_)) => StatusCode::BAD_REQUEST,
            Self::Directory(
                DirectoryError::DuplicateGoods { .. } | DirectoryError::DuplicateWarehouse(_),
            ) => StatusCode::CONFLICT,
            Self::Store(e) | Self::Directory(DirectoryError::Store(e)) => {
                tracing::error!(error = %e, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type Shared = State<Arc<AppState>>;

/// Builds the router over `state`.
pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task).put(update_task))
        .route("/api/tasks/{id}", delete(delete_task))
        .route("/api/goods", get(goods))
        .route("/api/warehouses", get(warehouses))
        .route(
            "/api/goods_management",
            get(goods).post(add_goods).put(update_goods).delete(delete_goods),
        )
        .route("/api/goods_export", get(export_goods))
        .route("/api/goods_import", post(import_goods))
        .route(
            "/api/warehouses_management",
            get(warehouses)
                .post(add_warehouse)
                .put(rename_warehouse)
                .delete(delete_warehouse),
        )
        .route("/api/log_event", post(log_event))
        .route("/api/change_history", get(change_history))
        .route("/health", get(health))
        .with_state(state)
}

async fn list_tasks(State(state): Shared) -> Result<Json<Vec<Task>>, ApiError> {
    let today = Local::now().date_naive();
    let cutoff = today
        .checked_sub_days(Days::new(u64::from(state.retention_days)))
        .unwrap_or(today);
    Ok(Json(state.tasks.list(cutoff).await?))
}

async fn create_task(
    State(state): Shared,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.tasks.insert(task).await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "created" }))))
}

async fn update_task(State(state): Shared, Json(task): Json<Task>) -> Result<Json<Value>, ApiError> {
    let id = task.id.clone();
    if !state.tasks.replace(task).await? {
        return Err(ApiError::NotFound(id));
    }
    Ok(Json(json!({ "status": "updated" })))
}

async fn delete_task(
    State(state): Shared,
    Path(id): Path<TaskId>,
) -> Result<Json<Value>, ApiError> {
    if !state.tasks.remove(&id).await? {
        return Err(ApiError::NotFound(id));
    }
    Ok(Json(json!({ "status": "deleted" })))
}

async fn goods(State(state): Shared) -> Json<Catalog> {
    Json(state.goods.catalog().await)
}

async fn warehouses(State(state): Shared) -> Json<Vec<String>> {
    Json(state.warehouses.list().await)
}

const fn one() -> f64 {
    1.0
}

/// Item fields of a goods edit. Weight defaults to zero.
#[derive(Debug, Deserialize)]
struct GoodsForm {
    #[serde(default)]
    category: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    weight: f64,
    #[serde(default = "one")]
    pallet_coef: f64,
}

impl GoodsForm {
    fn item(&self) -> GoodsItem {
        GoodsItem::new(&self.name, self.weight, self.pallet_coef)
    }
}

#[derive(Debug, Deserialize)]
struct GoodsUpdate {
    #[serde(default)]
    old_category: String,
    #[serde(default)]
    old_name: String,
    #[serde(flatten)]
    goods: GoodsForm,
}

#[derive(Debug, Deserialize)]
struct GoodsKey {
    #[serde(default)]
    category: String,
    #[serde(default)]
    name: String,
}

async fn add_goods(
    State(state): Shared,
    Json(form): Json<GoodsForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.goods.add(&form.category, form.item()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "created" }))))
}

async fn update_goods(
    State(state): Shared,
    Json(update): Json<GoodsUpdate>,
) -> Result<Json<Value>, ApiError> {
    state
        .goods
        .replace(
            &update.old_category,
            &update.old_name,
            &update.goods.category,
            update.goods.item(),
        )
        .await?;
    Ok(Json(json!({ "status": "updated" })))
}

async fn delete_goods(
    State(state): Shared,
    Json(key): Json<GoodsKey>,
) -> Result<Json<Value>, ApiError> {
    state.goods.remove(&key.category, &key.name).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

async fn export_goods(State(state): Shared) -> Result<impl IntoResponse, ApiError> {
    let entries = state.goods.entries().await;
    if entries.is_empty() {
        return Err(ApiError::NoGoods);
    }
    let disposition = format!("attachment; filename=\"{GOODS_FILE}\"");
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(entries)))
}

async fn import_goods(
    State(state): Shared,
    Json(rows): Json<Vec<CatalogEntry>>,
) -> Result<Json<Value>, ApiError> {
    let count = state.goods.import(rows).await?;
    Ok(Json(json!({ "status": "imported", "goods": count })))
}

#[derive(Debug, Deserialize)]
struct WarehouseForm {
    #[serde(default)]
    old_name: String,
    #[serde(default)]
    name: String,
}

async fn add_warehouse(
    State(state): Shared,
    Json(form): Json<WarehouseForm>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.warehouses.add(&form.name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "status": "created" }))))
}

async fn rename_warehouse(
    State(state): Shared,
    Json(form): Json<WarehouseForm>,
) -> Result<Json<Value>, ApiError> {
    state.warehouses.rename(&form.old_name, &form.name).await?;
    Ok(Json(json!({ "status": "updated" })))
}

async fn delete_warehouse(
    State(state): Shared,
    Json(form): Json<WarehouseForm>,
) -> Result<Json<Value>, ApiError> {
    state.warehouses.remove(&form.name).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

async fn log_event(
    State(state): Shared,
    Json(request): Json<LogRequest>,
) -> Result<Json<Value>, ApiError> {
    let status = match state.history.record(request).await? {
        Recorded::Stored => "ok",
        Recorded::Skipped => "skipped",
    };
    Ok(Json(json!({ "status": status })))
}

async fn change_history(State(state): Shared) -> Json<Vec<HistoryEntry>> {
    Json(state.history.entries().await)
}

async fn health(State(state): Shared) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "tasks": state.tasks.len().await,
        "timestamp": Local::now().to_rfc3339(),
    }))
}

/// Starts the server with the given state.
///
/// Binds to `addr` and returns the bound address and a
/// [`tokio::task::JoinHandle`] for the serving task. Pass `127.0.0.1:0` to
/// get an OS-assigned port.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "board server error");
        }
    });

    Ok((bound_addr, handle))
}
