//! Order engine properties against a real Postgres.
//!
//! Runs only when `DATABASE_URL` is set; otherwise every test returns early.
//! Each test seeds its own customer and products, so runs do not interfere.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use stockorder_core::{CustomerId, Money, ProductId, TaxRate};
use stockorder_infra::{
    CatalogProvider, DatabaseConfig, OrderHistoryReader, OrderService, OrderWriter,
    PlaceOrderError, PostgresCatalog, PostgresOrderHistory, PostgresOrderWriter, StoreError,
    WriteStep, db,
};
use stockorder_inventory::{InventoryError, InventoryPolicy};
use stockorder_sales::distinct_orders;

type PgService = OrderService<PostgresCatalog, PostgresOrderWriter, PostgresOrderHistory>;

static MIGRATED: tokio::sync::Mutex<bool> = tokio::sync::Mutex::const_new(false);

async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = db::connect(&DatabaseConfig::new(url)).await.unwrap();

    let mut migrated = MIGRATED.lock().await;
    if !*migrated {
        db::migrate(&pool).await.unwrap();
        *migrated = true;
    }
    Some(pool)
}

fn service(pool: &PgPool, policy: InventoryPolicy) -> PgService {
    OrderService::new(
        PostgresCatalog::new(pool.clone()),
        PostgresOrderWriter::new(pool.clone(), policy),
        PostgresOrderHistory::new(pool.clone()),
        TaxRate::STANDARD,
    )
}

async fn seed_customer(pool: &PgPool) -> CustomerId {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO customers (customer_name, email) VALUES ('test customer', 'test@example.com') RETURNING customer_id",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    CustomerId::new(id)
}

async fn seed_product(pool: &PgPool, name: &str, cents: i64, stock: Option<i64>) -> ProductId {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products (product_name, price, category) VALUES ($1, $2, 'test') RETURNING product_id",
    )
    .bind(name)
    .bind(cents)
    .fetch_one(pool)
    .await
    .unwrap();

    if let Some(stock) = stock {
        sqlx::query("INSERT INTO inventory (product_id, quantity_in_stock) VALUES ($1, $2)")
            .bind(id)
            .bind(stock)
            .execute(pool)
            .await
            .unwrap();
    }
    ProductId::new(id)
}

async fn stock_of(pool: &PgPool, product_id: ProductId) -> Option<i64> {
    sqlx::query_scalar("SELECT quantity_in_stock FROM inventory WHERE product_id = $1")
        .bind(product_id.get())
        .fetch_optional(pool)
        .await
        .unwrap()
}

async fn order_count(pool: &PgPool, customer_id: CustomerId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE customer_id = $1")
        .bind(customer_id.get())
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn line_count(pool: &PgPool, customer_id: CustomerId) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM orderlines ol JOIN orders o ON o.order_id = ol.order_id WHERE o.customer_id = $1",
    )
    .bind(customer_id.get())
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn round_trip_two_lines() {
    let Some(pool) = pool().await else { return };
    let svc = service(&pool, InventoryPolicy::Strict);
    let customer = seed_customer(&pool).await;
    let a = seed_product(&pool, "A", 1_000, Some(10)).await;
    let b = seed_product(&pool, "B", 500, Some(10)).await;

    let placed = svc.place_order(customer, &[(a, 2), (b, 3)]).await.unwrap();
    assert_eq!(placed.totals.net_amount, Money::from_minor(3_500));
    assert_eq!(placed.totals.tax, Money::from_minor(700));
    assert_eq!(placed.totals.total_amount, Money::from_minor(4_200));

    let rows = svc.order_history(customer).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.order_id == placed.order_id));
    assert!(rows.iter().all(|r| r.total_amount == Money::from_minor(4_200)));
    assert_eq!((rows[0].product_name.as_str(), rows[0].quantity.get()), ("A", 2));
    assert_eq!((rows[1].product_name.as_str(), rows[1].quantity.get()), ("B", 3));

    assert_eq!(stock_of(&pool, a).await, Some(8));
    assert_eq!(stock_of(&pool, b).await, Some(7));
}

#[tokio::test]
async fn failed_decrement_rolls_back_header_and_lines() {
    let Some(pool) = pool().await else { return };
    let svc = service(&pool, InventoryPolicy::Strict);
    let customer = seed_customer(&pool).await;
    let plenty = seed_product(&pool, "plenty", 100, Some(50)).await;
    let scarce = seed_product(&pool, "scarce", 100, Some(1)).await;

    let err = svc
        .place_order(customer, &[(plenty, 5), (scarce, 2)])
        .await
        .unwrap_err();
    let PlaceOrderError::Write(err) = err else {
        panic!("expected a write failure, got {err:?}");
    };
    assert_eq!(err.step, WriteStep::AdjustInventory);
    assert!(matches!(
        err.source,
        StoreError::Inventory(InventoryError::StockExhausted { requested: 2, available: 1, .. })
    ));

    assert_eq!(order_count(&pool, customer).await, 0);
    assert_eq!(line_count(&pool, customer).await, 0);
    assert_eq!(stock_of(&pool, plenty).await, Some(50));
    assert_eq!(stock_of(&pool, scarce).await, Some(1));
}

#[tokio::test]
async fn missing_inventory_record_depends_on_policy() {
    let Some(pool) = pool().await else { return };
    let customer = seed_customer(&pool).await;
    let untracked = seed_product(&pool, "untracked", 100, None).await;

    let err = service(&pool, InventoryPolicy::Strict)
        .place_order(customer, &[(untracked, 1)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PlaceOrderError::Write(ref e)
            if matches!(e.source, StoreError::Inventory(InventoryError::MissingRecord { .. }))
    ));
    assert_eq!(order_count(&pool, customer).await, 0);

    service(&pool, InventoryPolicy::WarnAndContinue)
        .place_order(customer, &[(untracked, 1)])
        .await
        .unwrap();
    assert_eq!(order_count(&pool, customer).await, 1);
    assert_eq!(stock_of(&pool, untracked).await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let Some(pool) = pool().await else { return };
    let customer = seed_customer(&pool).await;
    let widget = seed_product(&pool, "widget", 250, Some(10)).await;
    // Shared by every order; they lock it second, after `widget`.
    let gadget = seed_product(&pool, "gadget", 250, Some(1_000)).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let svc = service(&pool, InventoryPolicy::Strict);
        handles.push(tokio::spawn(async move {
            svc.place_order(customer, &[(gadget, 1), (widget, 3)]).await
        }));
    }

    let mut committed = 0i64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(PlaceOrderError::Write(e)) => assert_eq!(e.step, WriteStep::AdjustInventory),
            Err(other) => panic!("unexpected failure: {other:?}"),
        }
    }

    assert_eq!(committed, 3);
    assert_eq!(stock_of(&pool, widget).await, Some(1));
    assert_eq!(stock_of(&pool, gadget).await, Some(1_000 - committed));
    assert_eq!(order_count(&pool, customer).await, committed);
}

#[tokio::test]
async fn history_is_newest_first_then_by_product_name() {
    let Some(pool) = pool().await else { return };
    let svc = service(&pool, InventoryPolicy::Strict);
    let customer = seed_customer(&pool).await;
    let apple = seed_product(&pool, "apple", 100, Some(100)).await;
    let banana = seed_product(&pool, "banana", 100, Some(100)).await;

    let mut ids = Vec::new();
    for (year, month, day) in [(2024, 1, 1), (2024, 3, 1), (2024, 2, 1)] {
        let placed = svc.place_order(customer, &[(banana, 1), (apple, 1)]).await.unwrap();
        sqlx::query("UPDATE orders SET order_date = $1 WHERE order_id = $2")
            .bind(Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap())
            .bind(placed.order_id.get())
            .execute(&pool)
            .await
            .unwrap();
        ids.push(placed.order_id);
    }

    let rows = svc.order_history(customer).await.unwrap();
    assert_eq!(distinct_orders(&rows), vec![ids[1], ids[2], ids[0]]);
    for pair in rows.chunks(2) {
        assert_eq!(pair[0].product_name, "apple");
        assert_eq!(pair[1].product_name, "banana");
    }
}

#[tokio::test]
async fn history_for_customer_without_orders_is_empty() {
    let Some(pool) = pool().await else { return };
    let customer = seed_customer(&pool).await;
    let rows = PostgresOrderHistory::new(pool.clone())
        .order_history(customer)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn writer_rejects_orders_for_unknown_customers() {
    let Some(pool) = pool().await else { return };
    let product = seed_product(&pool, "orphaned", 100, Some(5)).await;
    let resolved = PostgresCatalog::new(pool.clone())
        .resolve_product(product)
        .await
        .unwrap();

    let mut order = stockorder_sales::Order::new(CustomerId::new(i64::MAX), TaxRate::STANDARD);
    order
        .add_line(resolved, stockorder_core::Quantity::new(1).unwrap())
        .unwrap();

    let err = PostgresOrderWriter::strict(pool.clone())
        .create_order(&order)
        .await
        .unwrap_err();
    assert_eq!(err.step, WriteStep::InsertHeader);
    assert!(matches!(err.source, StoreError::Integrity(_)));
    assert!(!err.is_retryable());
    assert_eq!(stock_of(&pool, product).await, Some(5));
}

#[tokio::test]
async fn low_stock_listing_uses_a_strict_threshold() {
    let Some(pool) = pool().await else { return };
    let catalog = PostgresCatalog::new(pool.clone());
    let low = seed_product(&pool, "low", 100, Some(2)).await;
    let edge = seed_product(&pool, "edge", 100, Some(3)).await;

    let listed: Vec<ProductId> = catalog
        .low_stock_products(3)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.product.id_typed())
        .collect();
    assert!(listed.contains(&low));
    assert!(!listed.contains(&edge));
    assert!(catalog.list_categories().await.unwrap().contains(&"test".to_string()));
}
