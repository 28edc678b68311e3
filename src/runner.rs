use anyhow::Result;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};

use crate::client::ApiClient;
use crate::report::ResponseLog;

/// Renders an opaque id into a URL path segment. String ids go in as-is,
/// numeric ids without quotes.
fn path_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Exercises the full endpoint sequence against a live server, recording
/// every response. Individual call failures are captured in the log and
/// never abort the run; steps whose prerequisite id is missing are skipped.
pub async fn run(client: &ApiClient, log: &mut ResponseLog) -> Result<()> {
    let suffix = Utc::now().timestamp();

    // Try the seeded users first, then fall back to a fresh registration.
    let admin_token = client.login("admin", "Admin@123").await;
    let waiter_token = client.login("waiter_rahul", "Waiter@123").await;

    let reg_payload = json!({
        "username": format!("tester_{suffix}"),
        "password": "Password@123",
        "email": format!("tester_{suffix}@example.com"),
        "phoneNumber": "1234567890",
        "fullName": "Tester User",
    });
    let register = client
        .call(Method::POST, "/auth/register", None, Some(&reg_payload))
        .await;
    println!("Registration status: {}", register.status);

    let mut tester_token = None;
    if register.is_created() {
        tester_token = register.token();
        println!("Obtained token from registration.");
    }

    if admin_token.is_none() && tester_token.is_some() {
        println!("Using tester token as fallback for admin (will fail on restricted endpoints)");
    }
    let token = admin_token.or(tester_token).or(waiter_token);
    match &token {
        Some(token) => {
            println!("Starting tests with token: {}...", &token[..token.len().min(10)]);
        }
        None => println!("Starting tests without a token..."),
    }
    let token = token.as_deref();

    // Auth (the register call itself is the first logged block)
    log.record("POST", "/auth/register", &register)?;

    // Users
    let users = client.call(Method::GET, "/users", token, None).await;
    log.record("GET", "/users", &users)?;

    // Categories
    let cat_payload = json!({
        "name": format!("Test Category {suffix}"),
        "description": "Test Description",
        "active": true,
    });
    let created = client
        .call(Method::POST, "/categories", token, Some(&cat_payload))
        .await;
    log.record("POST", "/categories", &created)?;
    let mut category_id = if created.is_created() { created.id() } else { None };

    let listed = client.call(Method::GET, "/categories", token, None).await;
    log.record("GET", "/categories", &listed)?;
    if category_id.is_none() && listed.is_ok() {
        category_id = listed.first_id();
    }

    // Tables
    let table_payload = json!({
        "name": format!("T-{}", suffix % 1000),
        "capacity": 4,
        "status": "AVAILABLE",
    });
    let created = client
        .call(Method::POST, "/tables", token, Some(&table_payload))
        .await;
    log.record("POST", "/tables", &created)?;
    let mut table_id = if created.is_created() { created.id() } else { None };

    let listed = client.call(Method::GET, "/tables", token, None).await;
    log.record("GET", "/tables", &listed)?;
    if table_id.is_none() && listed.is_ok() {
        table_id = listed.first_id();
    }

    if let Some(id) = &table_id {
        let endpoint = format!("/tables/{}", path_id(id));
        let fetched = client.call(Method::GET, &endpoint, token, None).await;
        log.record("GET", &endpoint, &fetched)?;
    }

    // Menu items
    let mut menu_item_id = None;
    if let Some(cat) = &category_id {
        let menu_payload = json!({
            "name": format!("Chicken Wings {suffix}"),
            "description": "Spicy wings",
            "price": 12.99,
            "imageUrl": "http://example.com/wings.jpg",
            "available": true,
            "category": { "id": cat },
        });
        let created = client
            .call(Method::POST, "/menu-items", token, Some(&menu_payload))
            .await;
        log.record("POST", "/menu-items", &created)?;

        if created.is_created() {
            menu_item_id = created.id();
            if let Some(id) = &menu_item_id {
                let endpoint = format!("/menu-items/{}", path_id(id));
                let fetched = client.call(Method::GET, &endpoint, token, None).await;
                log.record("GET", &endpoint, &fetched)?;
            }
        }
    }

    let listed = client.call(Method::GET, "/menu-items", token, None).await;
    log.record("GET", "/menu-items", &listed)?;
    if menu_item_id.is_none() && listed.is_ok() {
        menu_item_id = listed.first_id();
    }

    // Bookings (needs a table)
    if let Some(table) = &table_id {
        let booking_payload = json!({
            "customerName": "John Doe",
            "customerPhone": "9876543210",
            "bookingDateTime": "2026-12-31T20:00:00",
            "partySize": 2,
            "tableId": table,
        });
        let created = client
            .call(Method::POST, "/bookings", token, Some(&booking_payload))
            .await;
        log.record("POST", "/bookings", &created)?;

        let listed = client.call(Method::GET, "/bookings", token, None).await;
        log.record("GET", "/bookings", &listed)?;
    }

    // Orders (needs a table and a menu item)
    let mut order_id = None;
    if let (Some(table), Some(item)) = (&table_id, &menu_item_id) {
        let order_payload = json!({
            "orderType": "DINE_IN",
            "tableId": table,
            "items": [{ "menuItemId": item, "quantity": 2 }],
            "customerPhone": "9876543210",
        });
        let created = client
            .call(Method::POST, "/orders", token, Some(&order_payload))
            .await;
        log.record("POST", "/orders", &created)?;
        if created.is_created() {
            order_id = created.id();
        }

        let listed = client.call(Method::GET, "/orders", token, None).await;
        log.record("GET", "/orders", &listed)?;
    }

    // Kitchen
    let pending = client
        .call(Method::GET, "/kitchen/orders/pending", token, None)
        .await;
    log.record("GET", "/kitchen/orders/pending", &pending)?;

    let active = client
        .call(Method::GET, "/kitchen/orders/active", token, None)
        .await;
    log.record("GET", "/kitchen/orders/active", &active)?;

    if let Some(id) = &order_id {
        let endpoint = format!("/kitchen/orders/{}/ready", path_id(id));
        let ready = client.call(Method::PUT, &endpoint, token, None).await;
        log.record("PUT", &endpoint, &ready)?;
    }

    // Reports
    let by_status = client
        .call(Method::GET, "/reports/order-status-count", token, None)
        .await;
    log.record("GET", "/reports/order-status-count", &by_status)?;

    let by_type = client
        .call(Method::GET, "/reports/order-type-count", token, None)
        .await;
    log.record("GET", "/reports/order-type-count", &by_type)?;

    Ok(())
}
