//! Integration tests for the PostgreSQL store against a real database.
//!
//! - Matrix reconciliation and quantity writes
//! - Cascade delete of cells with their option
//! - Option saves and quantity writes reconciling in one transaction
//! - Unique option names per SKU
//! - Atomic template plans
//! - Cascade settings scoping

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use sqlx::PgPool;
use stockgrid_core::cascade::{SettingsMap, SettingsTarget, KEY_CASCADE_ORDER};
use stockgrid_core::error::CoreError;
use stockgrid_core::locks::SkuLocks;
use stockgrid_core::matrix::{CellKey, CellQuantity, ReconcileCounts};
use stockgrid_core::options::{ColorInput, OptionAxis, OptionDraft, SizeInput};
use stockgrid_core::services::{OptionService, StockSynchronizer};
use stockgrid_core::store::{CascadeSettingsStore, CascadeSource, InventoryStore};
use stockgrid_core::templates::AxisPlan;
use stockgrid_db::models::item::CreateItem;
use stockgrid_db::repositories::{CategoryRepo, ColorRepo, ItemRepo};
use stockgrid_db::PgInventoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_item(pool: &PgPool, sku: &str, category_id: Option<i64>) {
    ItemRepo::create(
        pool,
        &CreateItem {
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            category_id,
        },
    )
    .await
    .unwrap();
}

fn draft(name: &str, sort_order: i32) -> OptionDraft {
    OptionDraft {
        name: name.to_string(),
        swatch: None,
        sort_order,
    }
}

fn color(name: &str, sort_order: i32) -> ColorInput {
    ColorInput {
        name: name.to_string(),
        sort_order: Some(sort_order),
        ..Default::default()
    }
}

fn size(label: &str, sort_order: i32) -> SizeInput {
    SizeInput {
        label: label.to_string(),
        sort_order: Some(sort_order),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_distribute_over_two_by_two(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = Arc::new(PgInventoryStore::new(pool.clone()));
    let locks = SkuLocks::new();
    let options = OptionService::new(store.clone(), locks.clone());
    let stock = StockSynchronizer::new(store.clone(), locks);

    let red = options.save_color("SKU-1", color("Red", 0)).await.unwrap();
    let blue = options.save_color("SKU-1", color("Blue", 1)).await.unwrap();
    let s = options.save_size("SKU-1", size("S", 0)).await.unwrap();
    let m = options.save_size("SKU-1", size("M", 1)).await.unwrap();
    assert_eq!(store.list_cells("SKU-1").await.unwrap().len(), 4);

    let report = stock.distribute_evenly("SKU-1", 10).await.unwrap();
    let qty = |c: i64, sz: i64| {
        report
            .cells
            .iter()
            .find(|cell| cell.key() == CellKey::new(Some(c), Some(sz)))
            .map(|cell| cell.quantity)
    };
    assert_eq!(qty(red.option.id, s.option.id), Some(3));
    assert_eq!(qty(red.option.id, m.option.id), Some(3));
    assert_eq!(qty(blue.option.id, s.option.id), Some(2));
    assert_eq!(qty(blue.option.id, m.option.id), Some(2));

    let item = store.find_item("SKU-1").await.unwrap().unwrap();
    assert_eq!(item.stock_level, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ensure_matrix_is_idempotent(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = Arc::new(PgInventoryStore::new(pool));
    let locks = SkuLocks::new();
    let options = OptionService::new(store.clone(), locks.clone());
    let stock = StockSynchronizer::new(store, locks);

    options.save_color("SKU-1", color("Red", 0)).await.unwrap();
    options.save_size("SKU-1", size("S", 0)).await.unwrap();

    let first = stock.ensure_matrix("SKU-1").await.unwrap();
    let second = stock.ensure_matrix("SKU-1").await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.removed, 0);
    assert_eq!(first.cells, second.cells);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_option_cascades_to_cells(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = PgInventoryStore::new(pool);

    let (red, created) = store.save_color("SKU-1", None, &draft("Red", 0)).await.unwrap();
    assert_eq!(created, ReconcileCounts { created: 1, removed: 0 });
    let (s, _) = store.save_size("SKU-1", None, &draft("S", 0)).await.unwrap();
    let (m, _) = store.save_size("SKU-1", None, &draft("M", 1)).await.unwrap();
    assert_eq!(store.list_cells("SKU-1").await.unwrap().len(), 2);

    let quantities = [
        CellQuantity {
            key: CellKey::new(Some(red.id), Some(s.id)),
            quantity: 7,
        },
        CellQuantity {
            key: CellKey::new(Some(red.id), Some(m.id)),
            quantity: 5,
        },
    ];
    store.write_quantities("SKU-1", &quantities).await.unwrap();

    let reconciled = store
        .delete_option("SKU-1", OptionAxis::Size, m.id)
        .await
        .unwrap();
    assert_eq!(reconciled, Some(ReconcileCounts::default()));
    let cells = store.list_cells("SKU-1").await.unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].key(), CellKey::new(Some(red.id), Some(s.id)));
    assert_eq!(cells[0].quantity, 7);
    let item = store.find_item("SKU-1").await.unwrap().unwrap();
    assert_eq!(item.stock_level, 7);

    // Already gone.
    assert_eq!(
        store
            .delete_option("SKU-1", OptionAxis::Size, m.id)
            .await
            .unwrap(),
        None
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_last_size_collapses_to_colours(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = PgInventoryStore::new(pool);

    let (red, _) = store.save_color("SKU-1", None, &draft("Red", 0)).await.unwrap();
    let (s, _) = store.save_size("SKU-1", None, &draft("S", 0)).await.unwrap();

    let reconciled = store
        .delete_option("SKU-1", OptionAxis::Size, s.id)
        .await
        .unwrap();
    assert_eq!(reconciled, Some(ReconcileCounts { created: 1, removed: 0 }));
    let cells = store.list_cells("SKU-1").await.unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].key(), CellKey::new(Some(red.id), None));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rejected_quantity_write_rolls_back_reconcile(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    // An option written without reconciliation leaves its cell pending.
    let red = {
        let mut conn = pool.acquire().await.unwrap();
        ColorRepo::insert(&mut conn, "SKU-1", &draft("Red", 0))
            .await
            .unwrap()
    };
    let store = PgInventoryStore::new(pool);

    let outside = CellQuantity {
        key: CellKey::new(Some(red.id), Some(red.id + 1000)),
        quantity: 3,
    };
    assert_matches!(
        store.write_quantities("SKU-1", &[outside]).await,
        Err(CoreError::NotFound { entity: "StockCell", .. })
    );
    assert!(store.list_cells("SKU-1").await.unwrap().is_empty());

    let inside = CellQuantity {
        key: CellKey::new(Some(red.id), None),
        quantity: 3,
    };
    let reconciled = store.write_quantities("SKU-1", &[inside]).await.unwrap();
    assert_eq!(reconciled.created, 1);
    let cells = store.list_cells("SKU-1").await.unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].quantity, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_option_names_unique_per_sku(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    seed_item(&pool, "SKU-2", None).await;
    let store = PgInventoryStore::new(pool);

    store.save_color("SKU-1", None, &draft("Red", 0)).await.unwrap();
    let dup = store.save_color("SKU-1", None, &draft("RED", 0)).await;
    assert_matches!(dup, Err(CoreError::Conflict(_)));

    // Another SKU may reuse the name.
    assert!(store.save_color("SKU-2", None, &draft("Red", 0)).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_axis_plan_rolls_back(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = PgInventoryStore::new(pool);
    let (s, _) = store.save_size("SKU-1", None, &draft("S", 0)).await.unwrap();

    let plan = AxisPlan {
        upserts: vec![(None, draft("M", 1)), (Some(s.id + 1000), draft("L", 2))],
        removals: vec![s.id],
    };
    let result = store.apply_axis_plan("SKU-1", OptionAxis::Size, &plan).await;
    assert_matches!(result, Err(CoreError::NotFound { .. }));

    let sizes = store.list_sizes("SKU-1").await.unwrap();
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].label, "S");
    let cells = store.list_cells("SKU-1").await.unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].size_id, Some(s.id));
}

// ---------------------------------------------------------------------------
// Cascade settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_scoped_settings_by_sku_and_category(pool: PgPool) {
    let category = CategoryRepo::create(&pool, "Shirts").await.unwrap();
    seed_item(&pool, "SKU-1", Some(category.id)).await;
    let store = PgInventoryStore::new(pool);

    let mut settings = SettingsMap::new();
    settings.insert(KEY_CASCADE_ORDER.to_string(), json!(["size"]));
    store
        .upsert_settings(
            &SettingsTarget::Category {
                category_id: category.id,
            },
            &settings,
        )
        .await
        .unwrap();

    let scoped = store.scoped_settings("SKU-1").await.unwrap();
    assert!(scoped.explicit.is_none());
    let (category_id, category_settings) = scoped.category.unwrap();
    assert_eq!(category_id, category.id);
    assert_eq!(category_settings[KEY_CASCADE_ORDER], json!(["size"]));

    assert_matches!(
        store.scoped_settings("GHOST").await,
        Err(CoreError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_settings_upsert_replaces_active_row(pool: PgPool) {
    seed_item(&pool, "SKU-1", None).await;
    let store = PgInventoryStore::new(pool);
    let target = SettingsTarget::Sku {
        item_sku: "SKU-1".into(),
    };

    let mut settings = SettingsMap::new();
    settings.insert(KEY_CASCADE_ORDER.to_string(), json!(["color"]));
    let first = store.upsert_settings(&target, &settings).await.unwrap();
    settings.insert(KEY_CASCADE_ORDER.to_string(), json!(["size", "color"]));
    let second = store.upsert_settings(&target, &settings).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(store.list_settings().await.unwrap().len(), 1);

    assert!(store.deactivate_settings(second.id).await.unwrap());
    assert!(store.list_settings().await.unwrap().is_empty());
    assert!(!store.deactivate_settings(second.id).await.unwrap());

    // A fresh row is created after deactivation.
    let third = store.upsert_settings(&target, &settings).await.unwrap();
    assert_ne!(third.id, second.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_settings_for_unknown_scope_not_found(pool: PgPool) {
    let store = PgInventoryStore::new(pool);
    let result = store
        .upsert_settings(
            &SettingsTarget::Category { category_id: 4242 },
            &SettingsMap::new(),
        )
        .await;
    assert_matches!(result, Err(CoreError::NotFound { entity: "Category", .. }));
}
