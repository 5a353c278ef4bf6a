//! End-to-end tests: a board driven over HTTP against a live
//! `ganttboard-server` bound to an OS-assigned port.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use ganttboard::backend::{GoodsCatalog, HttpBackend, WarehouseDirectory};
use ganttboard::board::{Board, BoardSettings, CommitOutcome};
use ganttboard::geometry::add_days;
use ganttboard_proto::catalog::{CatalogEntry, GoodsItem, find_item};
use ganttboard_proto::event::EventKind;
use ganttboard_server::config::ServerConfig;
use ganttboard_server::server::{AppState, start_server_with_state};

type HttpBoard = Board<HttpBackend, HttpBackend>;

fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ganttboard-it-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Starts a server over `state` and returns its base URL.
async fn start_server(state: AppState) -> String {
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", Arc::new(state))
        .await
        .expect("server should bind");
    format!("http://{addr}")
}

async fn in_memory_backend() -> HttpBackend {
    HttpBackend::new(&start_server(AppState::in_memory()).await).unwrap()
}

fn board(backend: &HttpBackend) -> HttpBoard {
    let settings = BoardSettings {
        user: Some("olena".to_string()),
        ..BoardSettings::default()
    };
    let (board, _warnings) = Board::new(
        settings,
        Local::now().date_naive(),
        backend.clone(),
        backend.clone(),
    );
    board
}

#[tokio::test]
async fn tasks_survive_a_reload() {
    let backend = in_memory_backend().await;
    let today = Local::now().date_naive();

    let mut first = board(&backend);
    assert_eq!(first.load().await.unwrap(), 0);
    let id = first.create_task(3, today).await.unwrap();
    let width = first.timeline().column_width();
    first.begin_drag(&id).unwrap();
    first.drag_by(&id, 2.0 * width).unwrap();
    assert_eq!(first.end_gesture(&id).await.unwrap(), CommitOutcome::Persisted);
    first.edit_comment(&id, "truck 7").await.unwrap();

    let mut second = board(&backend);
    assert_eq!(second.load().await.unwrap(), 1);
    let task = second.task(&id).unwrap();
    assert_eq!(task.row, 3);
    assert_eq!(task.start, add_days(today, 2));
    assert_eq!(task.comment, "truck 7");
    assert!(second.record(&id).unwrap().stored);

    second.delete_task(&id).await.unwrap();
    let mut third = board(&backend);
    assert_eq!(third.load().await.unwrap(), 0);
}

#[tokio::test]
async fn change_history_is_newest_first_without_view_events() {
    let backend = in_memory_backend().await;
    let mut board = board(&backend);
    let id = board
        .create_task(0, Local::now().date_naive())
        .await
        .unwrap();

    board.begin_order_edit(&id).unwrap();
    board.set_item_quantity(&id, "Apple", 5).unwrap();
    board.save_order(&id).await.unwrap();
    board.open_allocation(&id, "North").await.unwrap();
    board.close_allocation(&id).unwrap();

    let history = backend.change_history().await.unwrap();
    let kinds: Vec<EventKind> = history.iter().map(|e| e.event.kind).collect();
    assert_eq!(kinds, vec![EventKind::Edit, EventKind::Create, EventKind::Create]);
    assert_eq!(history[0].event.item_name.as_deref(), Some("Apple"));
    assert_eq!(history[0].event.new_value.as_deref(), Some("5"));
    assert_eq!(history[1].event.comment.as_deref(), Some("order created"));
    assert_eq!(history[2].event.comment.as_deref(), Some("task created"));
    assert!(history.iter().all(|e| e.event.user.as_deref() == Some("olena")));
    assert!(history.iter().all(|e| e.date_time.len() == "2026.10.19 12:00:00".len()));
}

#[tokio::test]
async fn catalog_and_warehouses_come_from_data_files() {
    let dir = data_dir("catalog");
    let goods = vec![
        CatalogEntry {
            item: GoodsItem::new("Apple", 0.2, 0.5),
            category: Some("Fruit".to_string()),
        },
        CatalogEntry {
            item: GoodsItem::new("Box", 1.5, 25.0),
            category: None,
        },
        CatalogEntry {
            item: GoodsItem::new("  ", 1.0, 1.0),
            category: None,
        },
    ];
    std::fs::write(dir.join("goods.json"), serde_json::to_vec(&goods).unwrap()).unwrap();
    std::fs::write(
        dir.join("warehouses.json"),
        serde_json::to_vec(&["North", " ", "South "]).unwrap(),
    )
    .unwrap();
    let config = ServerConfig {
        data_dir: dir.clone(),
        ..ServerConfig::default()
    };
    let base = start_server(AppState::open(&config).await.unwrap()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let catalog = backend.list_categorized().await.unwrap();
    assert_eq!(catalog.keys().collect::<Vec<_>>(), vec!["Fruit", "Other"]);
    assert_eq!(catalog["Other"].len(), 1);
    assert_eq!(
        backend.list_warehouses().await.unwrap(),
        vec!["North".to_string(), "South".to_string()]
    );

    let response = reqwest::Client::new()
        .put(format!("{base}/api/warehouses_management"))
        .json(&serde_json::json!({"old_name": "South", "name": "Harbour"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        backend.list_warehouses().await.unwrap(),
        vec!["North".to_string(), "Harbour".to_string()]
    );
    let stored: Vec<String> =
        serde_json::from_slice(&std::fs::read(dir.join("warehouses.json")).unwrap()).unwrap();
    assert_eq!(stored, vec!["North", "Harbour"]);

    let mut board = board(&backend);
    let id = board
        .create_task(1, Local::now().date_naive())
        .await
        .unwrap();
    let boxes = find_item(&catalog, "Box").cloned().unwrap();
    board.apply_catalog_order(&id, &[(boxes, 4)]).await.unwrap();

    let mut reloaded = self::board(&backend);
    reloaded.load().await.unwrap();
    let task = reloaded.task(&id).unwrap();
    assert_eq!(task.ordered("Box"), 4);
    assert!((task.total_weight - 6.0).abs() < 1e-9);
    assert!((task.item_pallet_coefs["Box"] - 25.0).abs() < f64::EPSILON);
}
