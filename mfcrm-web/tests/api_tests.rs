//! Integration tests for mfcrm-web pages and form handlers
//!
//! Each test drives the full router against a fresh in-memory database.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method
use mfcrm_web::{build_router, AppState};

/// Test helper: fresh schema in an in-memory database
async fn setup() -> (Router, SqlitePool) {
    let pool = mfcrm_common::db::init_database("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    (build_router(AppState::new(pool.clone())), pool)
}

async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8_lossy(&bytes).to_string()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Decoded flash message set by a redirect
fn flash_message(response: &Response) -> String {
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let value = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("mfcrm_flash="))
        .expect("Should set flash cookie");
    mfcrm_web::flash::decode(value)
        .expect("Should decode flash cookie")
        .message
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql).execute(pool).await.unwrap();
}

/// Contact 1, property 1, deal 1 on property 1
async fn seed_deal(pool: &SqlitePool) {
    exec(pool, "INSERT INTO contacts (id, name) VALUES (1, 'Dana Broker')").await;
    exec(pool, "INSERT INTO properties (id, name, address, city, units) VALUES (1, 'Elm Gardens', '12 Elm St', 'Austin', 24)").await;
    exec(pool, "INSERT INTO deals (id, deal_name, property_id) VALUES (1, 'Elm Gardens Acquisition', 1)").await;
}

// =============================================================================
// Operational endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = setup().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mfcrm-web");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_stylesheet_served() {
    let (app, _pool) = setup().await;

    let response = get(&app, "/static/crm.css").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
}

#[tokio::test]
async fn test_dashboard_lists_open_tasks() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO tasks (description, due_date, priority) VALUES ('Call the lender', '2000-01-01', 'High')").await;
    exec(&pool, "INSERT INTO tasks (description, due_date, status) VALUES ('Already done', '2000-01-01', 'Done')").await;

    let response = get(&app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Call the lender"));
    assert!(html.contains("Overdue"));
    assert!(!html.contains("Already done"));
}

// =============================================================================
// Contacts
// =============================================================================

#[tokio::test]
async fn test_create_contact_then_read() {
    let (app, pool) = setup().await;

    let response = post_form(
        &app,
        "/contacts/create",
        "name=Dana+Broker&company=Acme+Realty&email=dana%40example.com&tags=austin%2C+broker",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/contacts/1");
    assert_eq!(flash_message(&response), "Contact created successfully.");
    assert_eq!(count(&pool, "contacts").await, 1);

    let html = body_text(get(&app, "/contacts/1").await).await;
    assert!(html.contains("Dana Broker"));
    assert!(html.contains("Acme Realty"));
    assert!(html.contains(r#"<span class="tag">broker</span>"#));

    let list = body_text(get(&app, "/contacts/").await).await;
    assert!(list.contains(r#"<a href="/contacts/1">Dana Broker</a>"#));
}

#[tokio::test]
async fn test_contact_without_name_creates_nothing() {
    let (app, pool) = setup().await;

    let response = post_form(&app, "/contacts/create", "name=+++&company=Acme").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/contacts/create");
    assert_eq!(flash_message(&response), "Name is required.");
    assert_eq!(count(&pool, "contacts").await, 0);
}

#[tokio::test]
async fn test_update_contact() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO contacts (id, name) VALUES (1, 'Dana')").await;

    let response = post_form(&app, "/contacts/1/edit", "name=Dana+Lee&phone=555-0100").await;
    assert_eq!(location(&response), "/contacts/1");
    assert_eq!(flash_message(&response), "Contact updated successfully.");

    let phone: Option<String> = sqlx::query_scalar("SELECT phone FROM contacts WHERE id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(phone.as_deref(), Some("555-0100"));
}

#[tokio::test]
async fn test_delete_contact_blocked_by_deal_role() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(&pool, "INSERT INTO deal_contact_roles (deal_id, contact_id, role) VALUES (1, 1, 'Owner')").await;

    let response = post_form(&app, "/contacts/1/delete", "").await;
    assert_eq!(location(&response), "/contacts/1");
    assert_eq!(
        flash_message(&response),
        "Cannot delete contact that is linked to deals. Remove relationships first."
    );
    assert_eq!(count(&pool, "contacts").await, 1);
}

#[tokio::test]
async fn test_delete_contact_removes_dependents() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(&pool, "INSERT INTO property_owners (property_id, contact_id) VALUES (1, 1)").await;
    exec(&pool, "INSERT INTO touchpoints (contact_id, touchpoint_type, occurred_at, summary) VALUES (1, 'Call', '2024-01-01 10:00:00', 'Intro')").await;
    exec(&pool, "INSERT INTO tasks (description, due_date, contact_id) VALUES ('Follow up', '2024-01-05', 1)").await;

    let response = post_form(&app, "/contacts/1/delete", "").await;
    assert_eq!(location(&response), "/contacts/");
    assert_eq!(flash_message(&response), "Contact deleted.");

    assert_eq!(count(&pool, "contacts").await, 0);
    assert_eq!(count(&pool, "property_owners").await, 0);
    assert_eq!(count(&pool, "touchpoints").await, 0);
    assert_eq!(count(&pool, "tasks").await, 0);
}

#[tokio::test]
async fn test_missing_records_are_404() {
    let (app, _pool) = setup().await;

    for uri in ["/contacts/42", "/properties/42", "/deals/42", "/deals/42/edit"] {
        let response = get(&app, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    let response = post_form(&app, "/deals/42/delete", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_create_property_defaults_name_and_returns() {
    let (app, pool) = setup().await;

    let response = post_form(
        &app,
        "/properties/create",
        "address=12+Elm+St&city=Austin&units=24&estimated_value_min=%241%2C000%2C000",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/deals/create");
    assert_eq!(flash_message(&response), "Property created successfully.");

    let (name, value_min): (Option<String>, Option<f64>) =
        sqlx::query_as("SELECT name, estimated_value_min FROM properties")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(name.as_deref(), Some("12 Elm St"));
    assert_eq!(value_min, Some(1_000_000.0));
}

#[tokio::test]
async fn test_create_property_returns_to_referer() {
    let (app, _pool) = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/properties/create")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::REFERER, "http://localhost:5001/properties/")
        .body(Body::from("address=5+Oak+Ave"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(location(&response), "/properties/");
}

#[tokio::test]
async fn test_property_validation() {
    let (app, pool) = setup().await;

    let response = post_form(&app, "/properties/create", "city=Austin").await;
    assert_eq!(flash_message(&response), "Address is required.");

    let response = post_form(&app, "/properties/create", "address=1+A+St&units=many").await;
    assert_eq!(flash_message(&response), "Invalid units format.");

    let response = post_form(
        &app,
        "/properties/create",
        "address=1+A+St&estimated_value_min=900&estimated_value_max=100",
    )
    .await;
    assert_eq!(
        flash_message(&response),
        "Estimated value min must be less than or equal to max."
    );

    let response = post_form(&app, "/properties/create", "address=1+A+St&buyer_interest=11").await;
    assert_eq!(flash_message(&response), "Buyer interest must be between 1 and 10.");

    assert_eq!(count(&pool, "properties").await, 0);
}

#[tokio::test]
async fn test_property_list_filters() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO properties (address, city, units) VALUES ('1 Big St', 'Austin', 200)").await;
    exec(&pool, "INSERT INTO properties (address, city, units) VALUES ('2 Small St', 'austin', 8)").await;
    exec(&pool, "INSERT INTO properties (address, city, units) VALUES ('3 Far St', 'Dallas', 50)").await;

    let html = body_text(get(&app, "/properties/?city=AUST&min_units=10").await).await;
    assert!(html.contains("1 Big St"));
    assert!(!html.contains("2 Small St"));
    assert!(!html.contains("3 Far St"));

    let html = body_text(get(&app, "/properties/?min_units=100&max_units=10").await).await;
    assert!(html.contains("Max units must be greater than or equal to min units."));
    assert!(html.contains("1 Big St"));
    assert!(html.contains("2 Small St"));

    let html = body_text(get(&app, "/properties/?max_units=lots").await).await;
    assert!(html.contains("Max units must be a number."));
}

#[tokio::test]
async fn test_delete_property_blocked_by_deal() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = post_form(&app, "/properties/1/delete", "").await;
    assert_eq!(location(&response), "/properties/1");
    assert_eq!(
        flash_message(&response),
        "Cannot delete property that has associated deals."
    );
    assert_eq!(count(&pool, "properties").await, 1);
}

#[tokio::test]
async fn test_delete_property_detaches_tasks() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO contacts (id, name) VALUES (1, 'Dana')").await;
    exec(&pool, "INSERT INTO properties (id, address) VALUES (1, '9 Pine St')").await;
    exec(&pool, "INSERT INTO property_owners (property_id, contact_id) VALUES (1, 1)").await;
    exec(&pool, "INSERT INTO tasks (id, description, due_date, property_id) VALUES (1, 'Drive by', '2024-01-05', 1)").await;

    let response = post_form(&app, "/properties/1/delete", "").await;
    assert_eq!(location(&response), "/properties/");
    assert_eq!(flash_message(&response), "Property deleted successfully.");

    assert_eq!(count(&pool, "properties").await, 0);
    assert_eq!(count(&pool, "property_owners").await, 0);
    let property_id: Option<i64> = sqlx::query_scalar("SELECT property_id FROM tasks WHERE id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(property_id, None);
}

#[tokio::test]
async fn test_owner_add_and_remove() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = post_form(&app, "/properties/1/add_owner", "contact_id=").await;
    assert_eq!(flash_message(&response), "Please select a contact.");

    let response = post_form(&app, "/properties/1/add_owner", "contact_id=1&ownership_percentage=half").await;
    assert_eq!(flash_message(&response), "Invalid ownership percentage format.");

    let response = post_form(&app, "/properties/1/add_owner", "contact_id=1&ownership_percentage=150").await;
    assert_eq!(
        flash_message(&response),
        "Ownership percentage must be between 0 and 100."
    );

    let response = post_form(&app, "/properties/1/add_owner", "contact_id=1&ownership_percentage=50").await;
    assert_eq!(location(&response), "/properties/1");
    assert_eq!(flash_message(&response), "Owner added successfully.");

    let response = post_form(&app, "/properties/1/add_owner", "contact_id=1").await;
    assert_eq!(
        flash_message(&response),
        "This contact is already an owner of this property."
    );
    assert_eq!(count(&pool, "property_owners").await, 1);

    let html = body_text(get(&app, "/properties/1").await).await;
    assert!(html.contains("50%"));

    let owner_id: i64 = sqlx::query_scalar("SELECT id FROM property_owners")
        .fetch_one(&pool)
        .await
        .unwrap();
    let response = post_form(&app, &format!("/properties/1/remove_owner/{}", owner_id), "").await;
    assert_eq!(flash_message(&response), "Owner removed successfully.");
    assert_eq!(count(&pool, "property_owners").await, 0);
}

// =============================================================================
// Deals
// =============================================================================

#[tokio::test]
async fn test_create_deal_then_read() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO properties (id, name, address) VALUES (1, 'Elm Gardens', '12 Elm St')").await;

    let response = post_form(
        &app,
        "/deals/create",
        "deal_name=Elm+Gardens+Acquisition&property_id=1&stage=LOI_Sent&target_close_date=2025-06-30&asking_price=%242%2C450%2C000",
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/deals/1");
    assert_eq!(flash_message(&response), "Deal created successfully.");

    let html = body_text(get(&app, "/deals/1").await).await;
    assert!(html.contains("Elm Gardens Acquisition"));
    assert!(html.contains("LOI Sent"));
    assert!(html.contains("$2,450,000"));
    assert!(html.contains("2025-06-30"));
}

#[tokio::test]
async fn test_deal_links_only_anchor_web_urls() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(
        &pool,
        "UPDATE deals SET links = 'https://loopnet.com/elm, javascript:alert(1)' WHERE id = 1",
    )
    .await;

    let html = body_text(get(&app, "/deals/1").await).await;
    assert!(html.contains(r#"<a href="https://loopnet.com/elm""#));
    assert!(html.contains("<li>javascript:alert(1)</li>"));
    assert!(!html.contains(r#"href="javascript:"#));
}

#[tokio::test]
async fn test_deal_validation_creates_nothing() {
    let (app, pool) = setup().await;
    exec(&pool, "INSERT INTO properties (id, address) VALUES (1, '12 Elm St')").await;

    let cases = [
        ("property_id=1", "Deal name is required."),
        ("property_id=1&target_close_date=soon", "Deal name is required."),
        ("deal_name=Elm&asking_price=lots", "Property is required."),
        ("deal_name=Elm", "Property is required."),
        ("deal_name=Elm&property_id=99", "Invalid property selected."),
        ("deal_name=Elm&property_id=1&target_close_date=soon", "Invalid target close date format."),
        ("deal_name=Elm&property_id=1&asking_price=lots", "Invalid asking price format."),
    ];
    for (form, message) in cases {
        let response = post_form(&app, "/deals/create", form).await;
        assert_eq!(location(&response), "/deals/create", "{}", form);
        assert_eq!(flash_message(&response), message, "{}", form);
    }
    assert_eq!(count(&pool, "deals").await, 0);
}

#[tokio::test]
async fn test_deal_list_stage_filter() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(&pool, "INSERT INTO deals (deal_name, property_id, stage) VALUES ('Oak Portfolio', 1, 'PSA')").await;

    let html = body_text(get(&app, "/deals/?stage=PSA").await).await;
    assert!(html.contains("Oak Portfolio"));
    assert!(!html.contains("Elm Gardens Acquisition"));

    let html = body_text(get(&app, "/deals/?stage=Signed").await).await;
    assert!(html.contains("Unknown deal stage: Signed"));
    assert!(html.contains("Oak Portfolio"));
    assert!(html.contains("Elm Gardens Acquisition"));
}

#[tokio::test]
async fn test_deal_contact_roles() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = post_form(&app, "/deals/1/add_contact", "role=Lender").await;
    assert_eq!(flash_message(&response), "Contact is required.");

    let response = post_form(&app, "/deals/1/add_contact", "contact_id=1").await;
    assert_eq!(flash_message(&response), "Role is required.");

    let response = post_form(&app, "/deals/1/add_contact", "contact_id=7&role=Lender").await;
    assert_eq!(flash_message(&response), "Invalid contact selected.");

    let response = post_form(&app, "/deals/1/add_contact", "contact_id=1&role=Listing_Broker").await;
    assert_eq!(location(&response), "/deals/1");
    assert_eq!(flash_message(&response), "Contact added to deal.");

    let response = post_form(&app, "/deals/1/add_contact", "contact_id=1&role=Listing_Broker").await;
    assert_eq!(
        flash_message(&response),
        "This contact is already linked with this role."
    );

    // Same contact in a different role is allowed
    let response = post_form(&app, "/deals/1/add_contact", "contact_id=1&role=Owner").await;
    assert_eq!(flash_message(&response), "Contact added to deal.");
    assert_eq!(count(&pool, "deal_contact_roles").await, 2);

    let role_id: i64 = sqlx::query_scalar("SELECT id FROM deal_contact_roles WHERE role = 'Owner'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let response = post_form(&app, &format!("/deals/1/remove_contact/{}", role_id), "").await;
    assert_eq!(flash_message(&response), "Contact removed from deal.");
    assert_eq!(count(&pool, "deal_contact_roles").await, 1);
}

#[tokio::test]
async fn test_delete_deal_cascades() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(&pool, "INSERT INTO deal_contact_roles (deal_id, contact_id, role) VALUES (1, 1, 'Owner')").await;
    exec(&pool, "INSERT INTO touchpoints (deal_id, contact_id, touchpoint_type, occurred_at, summary) VALUES (1, 1, 'Call', '2024-01-01 10:00:00', 'Intro')").await;
    exec(&pool, "INSERT INTO tasks (description, due_date, deal_id) VALUES ('Send LOI', '2024-01-05', 1)").await;

    let response = post_form(&app, "/deals/1/delete", "").await;
    assert_eq!(location(&response), "/deals/");
    assert_eq!(flash_message(&response), "Deal deleted.");

    assert_eq!(count(&pool, "deals").await, 0);
    assert_eq!(count(&pool, "deal_contact_roles").await, 0);
    assert_eq!(count(&pool, "touchpoints").await, 0);
    assert_eq!(count(&pool, "tasks").await, 0);
    assert_eq!(count(&pool, "contacts").await, 1);
    assert_eq!(count(&pool, "properties").await, 1);
}

// =============================================================================
// Tasks and touchpoints
// =============================================================================

#[tokio::test]
async fn test_task_lifecycle() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let html = body_text(get(&app, "/tasks/create?deal_id=1").await).await;
    assert!(html.contains(r#"<option value="1" selected>Elm Gardens Acquisition</option>"#));

    let response = post_form(&app, "/tasks/create", "description=Send+LOI&due_date=2025-01-15&deal_id=1").await;
    assert_eq!(location(&response), "/");
    assert_eq!(flash_message(&response), "Task created successfully.");

    let response = post_form(&app, "/tasks/create", "description=Send+LOI").await;
    assert_eq!(flash_message(&response), "Due date is required.");
    assert_eq!(count(&pool, "tasks").await, 1);

    let response = post_form(&app, "/tasks/1/complete", "").await;
    assert_eq!(flash_message(&response), "Task marked as complete.");
    let (status, completed): (String, Option<String>) =
        sqlx::query_as("SELECT status, completed_at FROM tasks WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "Done");
    assert!(completed.is_some());

    let response = post_form(&app, "/tasks/1/reopen", "").await;
    assert_eq!(flash_message(&response), "Task reopened.");
    let completed: Option<String> = sqlx::query_scalar("SELECT completed_at FROM tasks WHERE id = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(completed, None);

    let response = post_form(&app, "/tasks/1/snooze", "").await;
    assert_eq!(flash_message(&response), "Task snoozed.");

    // Snoozed tasks stay reachable from the dashboard
    let html = body_text(get(&app, "/").await).await;
    assert!(html.contains("Snoozed (1)"));
    assert!(html.contains(r#"action="/tasks/1/reopen""#));
    assert!(!html.contains(r#"action="/tasks/1/snooze""#));

    let response = post_form(&app, "/tasks/1/delete", "").await;
    assert_eq!(flash_message(&response), "Task deleted.");
    assert_eq!(count(&pool, "tasks").await, 0);
}

#[tokio::test]
async fn test_touchpoint_with_follow_up() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = post_form(
        &app,
        "/touchpoints/create",
        "contact_id=1&deal_id=1&touchpoint_type=Call&occurred_at=2024-04-03T14%3A05&summary=Discussed+pricing&next_step=Send+rent+roll&create_task=yes&task_due_date=2024-04-10",
    )
    .await;
    assert_eq!(location(&response), "/");
    assert_eq!(
        flash_message(&response),
        "Touchpoint logged successfully. Follow-up task created."
    );

    let (description, contact_id, deal_id): (String, Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT description, contact_id, deal_id FROM tasks")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(description, "Send rent roll");
    assert_eq!(contact_id, Some(1));
    assert_eq!(deal_id, Some(1));

    let html = body_text(get(&app, "/touchpoints/").await).await;
    assert!(html.contains("Discussed pricing"));
    assert!(html.contains("2024-04-03 14:05"));
}

#[tokio::test]
async fn test_touchpoint_follow_up_needs_due_date() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = post_form(
        &app,
        "/touchpoints/create",
        "contact_id=1&touchpoint_type=Email&summary=Sent+OM&create_task=yes",
    )
    .await;
    assert_eq!(
        flash_message(&response),
        "Task due date is required when creating a task."
    );
    assert_eq!(count(&pool, "touchpoints").await, 0);
    assert_eq!(count(&pool, "tasks").await, 0);

    let response = post_form(&app, "/touchpoints/create", "contact_id=1&touchpoint_type=Email").await;
    assert_eq!(flash_message(&response), "Summary is required.");
}

// =============================================================================
// Search, flash and exports
// =============================================================================

#[tokio::test]
async fn test_search() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let html = body_text(get(&app, "/search/?q=elm").await).await;
    assert!(html.contains(r#"<a href="/properties/1">Elm Gardens</a>"#));
    assert!(html.contains(r#"<a href="/deals/1">Elm Gardens Acquisition</a>"#));

    let html = body_text(get(&app, "/search/?q=%25").await).await;
    assert!(html.contains("No results"));

    let response = get(&app, "/search/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flash_shown_once() {
    let (app, _pool) = setup().await;

    let response = post_form(&app, "/contacts/create", "name=Dana").await;
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method("GET")
        .uri("/contacts/1")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let clear = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(clear.contains("Max-Age=0"));
    assert!(body_text(response).await.contains("Contact created successfully."));
}

#[tokio::test]
async fn test_csv_exports() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;
    exec(&pool, "UPDATE contacts SET company = 'Acme, Inc.' WHERE id = 1").await;

    let response = get(&app, "/backup/export_contacts").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=contacts_export.csv"
    );
    let text = body_text(response).await;
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ID,Name,Company,Role,Phone,Email,Tags,Created"));
    assert!(lines.next().unwrap().starts_with("1,Dana Broker,\"Acme, Inc.\",,,,,"));

    let text = body_text(get(&app, "/backup/export_properties").await).await;
    assert!(text.starts_with(
        "ID,Name,Address,City,State,Zip,Units,Year Built,Class,Est. Value Min,Est. Value Max,Created\n"
    ));
    assert!(text.contains("1,Elm Gardens,12 Elm St,Austin,,,24,,,,,"));

    let text = body_text(get(&app, "/backup/export_deals").await).await;
    assert!(text.starts_with("ID,Deal Name,Property,Stage,Target Close,Asking Price,Created\n"));
    assert!(text.contains("1,Elm Gardens Acquisition,Elm Gardens,Lead,,,"));
}

#[tokio::test]
async fn test_backup_download() {
    let (app, pool) = setup().await;
    seed_deal(&pool).await;

    let response = get(&app, "/backup/download_db").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=crm_backup.db"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"SQLite format 3"));
}
