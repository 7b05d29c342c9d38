#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use storefront_insights::{
    app,
    common::FixedClock,
    config::AppConfig,
    db,
    entities::{category, customer, order, order::OrderStatus, order_item, organization, product, user},
    repositories::InMemoryReportStore,
    AppState, Stores,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str =
    "integration-test-secret-that-is-definitely-longer-than-sixty-four-characters";

/// Instant the application clock is pinned to.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        SECRET.to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg.cors_allow_any_origin = true;
    cfg
}

/// Drives the real router with `oneshot` requests.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub db: Option<Arc<DatabaseConnection>>,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    token: String,
}

impl TestApp {
    /// Application over a migrated in-memory SQLite database holding one
    /// organization and a member user.
    pub async fn new() -> Self {
        let cfg = test_config();
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let pool = Arc::new(pool);

        let organization_id = insert_organization(&pool, "Acme").await;
        let user_id = insert_user(&pool, Some(organization_id)).await;

        let state = AppState::new(
            cfg,
            Stores::from_database(pool.clone()),
            Arc::new(FixedClock(now())),
        );
        Self::assemble(state, Some(pool), organization_id, user_id)
    }

    /// Application over an in-memory report store the test controls.
    pub fn with_store(store: Arc<InMemoryReportStore>) -> Self {
        let organization_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        store.add_organization(organization_id);
        store.add_user(user_id, Some(organization_id));

        let mut stores = Stores::from_database(Arc::new(DatabaseConnection::Disconnected));
        stores.reports = store.clone();
        stores.tenants = store;

        let state = AppState::new(test_config(), stores, Arc::new(FixedClock(now())));
        Self::assemble(state, None, organization_id, user_id)
    }

    fn assemble(
        state: AppState,
        db: Option<Arc<DatabaseConnection>>,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Self {
        let token = state
            .auth
            .issue_token(user_id, Some("owner@acme.test".to_string()))
            .expect("issue token");
        Self {
            router: app(state.clone()),
            state,
            db,
            organization_id,
            user_id,
            token,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_deref().expect("database-backed test app")
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state.auth.issue_token(user_id, None).expect("issue token")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, Some(&self.token)).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), Some(&self.token)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body), Some(&self.token)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None, Some(&self.token)).await
    }

    /// Raw response bytes, for byte-level comparisons.
    pub async fn get_bytes(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(self.build(Method::GET, uri, None, Some(&self.token)))
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        (status, bytes.to_vec())
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(self.build(method, uri, body, token))
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    fn build(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }
}

/// Sorted top-level keys of a JSON object.
pub fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

pub fn sorted(keys: &[&str]) -> Vec<String> {
    let mut keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    keys.sort();
    keys
}

pub async fn insert_organization(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    organization::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        slug: Set(format!("{}-{}", name.to_lowercase(), id.simple())),
        created_at: Set(now() - Duration::days(365)),
    }
    .insert(db)
    .await
    .expect("insert organization");
    id
}

pub async fn insert_user(db: &DatabaseConnection, organization_id: Option<Uuid>) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@acme.test", id.simple())),
        name: Set("Store Owner".to_string()),
        organization_id: Set(organization_id),
        created_at: Set(now() - Duration::days(100)),
    }
    .insert(db)
    .await
    .expect("insert user");
    id
}

pub async fn insert_category(db: &DatabaseConnection, organization_id: Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    category::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        name: Set(name.to_string()),
        created_at: Set(now() - Duration::days(200)),
    }
    .insert(db)
    .await
    .expect("insert category");
    id
}

pub async fn insert_product(
    db: &DatabaseConnection,
    organization_id: Uuid,
    category_id: Option<Uuid>,
    name: &str,
    price: Decimal,
    stock: i32,
) -> Uuid {
    let id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        sku: Set(format!("SKU-{}", &id.simple().to_string()[..8])),
        price: Set(price),
        stock: Set(stock),
        is_active: Set(true),
        created_at: Set(now() - Duration::days(200)),
    }
    .insert(db)
    .await
    .expect("insert product");
    id
}

pub async fn insert_customer(
    db: &DatabaseConnection,
    organization_id: Uuid,
    first_name: &str,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    customer::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        email: Set(format!("{}@example.com", first_name.to_lowercase())),
        first_name: Set(first_name.to_string()),
        last_name: Set("Tester".to_string()),
        created_at: Set(created_at),
    }
    .insert(db)
    .await
    .expect("insert customer");
    id
}

pub async fn insert_order(
    db: &DatabaseConnection,
    organization_id: Uuid,
    customer_id: Option<Uuid>,
    status: OrderStatus,
    total: Decimal,
    created_at: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    order::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        customer_id: Set(customer_id),
        order_number: Set(format!("ORD-{}", &id.simple().to_string()[..8])),
        status: Set(status),
        total: Set(total),
        created_at: Set(created_at),
    }
    .insert(db)
    .await
    .expect("insert order");
    id
}

pub async fn insert_order_item(
    db: &DatabaseConnection,
    order_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    price: Decimal,
) {
    order_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        price: Set(price),
    }
    .insert(db)
    .await
    .expect("insert order item");
}

/// Ids of the storefront seeded by [`seed_storefront`].
pub struct Storefront {
    pub customer_id: Uuid,
    pub hoodie_id: Uuid,
    pub tshirt_id: Uuid,
    pub mug_id: Uuid,
}

/// One delivered order of 150.00 and one cancelled order of 20.00 inside the
/// last 30 days, one delivered order of 500.00 sixty days back, and an
/// unrelated organization with its own order.
pub async fn seed_storefront(app: &TestApp) -> Storefront {
    let db = app.db();
    let org = app.organization_id;

    let apparel = insert_category(db, org, "Apparel").await;
    let tshirt_id = insert_product(db, org, Some(apparel), "T-Shirt", dec!(25.00), 5).await;
    let hoodie_id = insert_product(db, org, Some(apparel), "Hoodie", dec!(50.00), 40).await;
    let mug_id = insert_product(db, org, None, "Mug", dec!(10.00), 0).await;

    let customer_id = insert_customer(db, org, "Alice", now() - Duration::days(10)).await;

    let delivered = insert_order(
        db,
        org,
        Some(customer_id),
        OrderStatus::Delivered,
        dec!(150.00),
        now() - Duration::days(1),
    )
    .await;
    insert_order_item(db, delivered, hoodie_id, 2, dec!(50.00)).await;
    insert_order_item(db, delivered, tshirt_id, 2, dec!(25.00)).await;

    let cancelled = insert_order(
        db,
        org,
        Some(customer_id),
        OrderStatus::Cancelled,
        dec!(20.00),
        now() - Duration::days(2),
    )
    .await;
    insert_order_item(db, cancelled, mug_id, 2, dec!(10.00)).await;

    insert_order(
        db,
        org,
        Some(customer_id),
        OrderStatus::Delivered,
        dec!(500.00),
        now() - Duration::days(60),
    )
    .await;

    let other = insert_organization(db, "Globex").await;
    insert_order(
        db,
        other,
        None,
        OrderStatus::Delivered,
        dec!(999.00),
        now() - Duration::days(1),
    )
    .await;

    Storefront {
        customer_id,
        hoodie_id,
        tshirt_id,
        mug_id,
    }
}
