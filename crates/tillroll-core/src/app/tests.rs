//! Application context tests, driven against the mock backend

use super::*;
use crate::models::{Category, PaymentMethod, Role};
use crate::test_utils::{
    draft, MockApiServer, ADMIN_EMAIL, ADMIN_PASSWORD, USER_EMAIL, USER_PASSWORD,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn config_for(server: &MockApiServer) -> Config {
    Config {
        api_url: server.url(),
        page_size: 2,
        ..Config::default()
    }
}

async fn logged_in(server: &MockApiServer, email: &str, password: &str) -> AppContext {
    let mut app = AppContext::new(config_for(server), LocalStorage::in_memory()).unwrap();
    app.login(email, password).await.unwrap();
    app
}

#[tokio::test]
async fn test_login_establishes_session() {
    let server = MockApiServer::start().await;
    let mut app = AppContext::new(config_for(&server), LocalStorage::in_memory()).unwrap();
    assert!(!app.session().is_authenticated());

    let user = app.login(USER_EMAIL, USER_PASSWORD).await.unwrap();
    assert_eq!(user.email, USER_EMAIL);
    assert_eq!(user.role, Role::User);
    assert!(app.session().is_authenticated());
    assert!(!app.session().is_admin());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let server = MockApiServer::start().await;
    let mut app = AppContext::new(config_for(&server), LocalStorage::in_memory()).unwrap();

    let err = app.login("  ", "secret").await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter both email and password");
    let err = app.login(USER_EMAIL, "").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let server = MockApiServer::start().await;
    let mut app = AppContext::new(config_for(&server), LocalStorage::in_memory()).unwrap();

    let err = app.login(USER_EMAIL, "nope").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(!app.session().is_authenticated());
}

#[tokio::test]
async fn test_load_receipts_follows_every_page() {
    let server = MockApiServer::start().await;
    for day in 1..=5 {
        server.seed_receipt(
            USER_EMAIL,
            draft("Store", 10.0 * day as f64, date(2024, 3, day), Category::Food),
        );
    }
    server.seed_receipt(ADMIN_EMAIL, draft("Other owner", 1.0, date(2024, 3, 1), Category::Food));

    // page_size = 2, so five receipts take three requests
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    let count = app.load_receipts().await.unwrap();

    assert_eq!(count, 5);
    assert!(app.store().is_loaded());
    assert_eq!(app.store().all().len(), 5);
    assert_eq!(app.filtered().len(), 5);
}

#[tokio::test]
async fn test_load_requires_login() {
    let server = MockApiServer::start().await;
    let mut app = AppContext::new(config_for(&server), LocalStorage::in_memory()).unwrap();
    assert!(matches!(
        app.load_receipts().await,
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_unauthorized_response_ends_session() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("Cafe", 5.0, date(2024, 2, 2), Category::Dining));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();
    assert_eq!(app.store().all().len(), 1);

    server.revoke_tokens();
    let err = app.load_receipts().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(!app.session().is_authenticated());
    assert!(app.session().token().is_none());
    assert!(!app.store().is_loaded());
    assert!(app.store().all().is_empty());
}

#[tokio::test]
async fn test_create_with_attachment_reloads_collection() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();
    assert!(app.store().all().is_empty());

    let new = ReceiptDraft {
        store_name: "Big Bazaar".into(),
        purchase_date: date(2024, 4, 10),
        total_amount: 1250.0,
        category: Category::Groceries,
        payment_method: PaymentMethod::Upi,
    };
    let attachment = Attachment::new("bill.jpg", vec![0xFF, 0xD8, 0xFF]);

    let saved = app.save_receipt(None, &new, Some(&attachment)).await.unwrap();

    assert_eq!(saved.store_name, "Big Bazaar");
    assert!(saved.has_attachment());
    assert_eq!(server.uploads(), vec!["bill.jpg".to_string()]);
    assert_eq!(app.store().all().len(), 1);
    assert_eq!(app.store().all()[0].payment_method, PaymentMethod::Upi);
}

#[tokio::test]
async fn test_update_via_edit_draft() {
    let server = MockApiServer::start().await;
    let id = server.seed_receipt(USER_EMAIL, draft("Typo Mart", 40.0, date(2024, 1, 3), Category::Shopping));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();

    let mut edit = app.edit_draft(id).unwrap();
    assert_eq!(edit.store_name, "Typo Mart");
    edit.store_name = "Tipo Mart".into();
    edit.total_amount = 45.5;

    app.save_receipt(Some(id), &edit, None).await.unwrap();

    let reloaded = app.store().find(id).unwrap();
    assert_eq!(reloaded.store_name, "Tipo Mart");
    assert_eq!(reloaded.total_amount, 45.5);
    assert!(matches!(app.edit_draft(999), Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_delete_is_reflected_after_reload() {
    let server = MockApiServer::start().await;
    let keep = server.seed_receipt(USER_EMAIL, draft("Keep", 10.0, date(2024, 1, 1), Category::Food));
    let gone = server.seed_receipt(USER_EMAIL, draft("Gone", 20.0, date(2024, 1, 2), Category::Food));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();
    app.delete_receipt(gone).await.unwrap();

    assert_eq!(app.store().all().len(), 1);
    assert!(app.store().find(keep).is_some());
    assert!(app.store().find(gone).is_none());
    assert_eq!(server.receipt_count(), 1);
}

#[tokio::test]
async fn test_save_succeeds_when_refresh_fails() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();

    server.fail_reads(true);
    let new = draft("Corner Store", 75.0, date(2024, 4, 1), Category::Groceries);
    let saved = app.save_receipt(None, &new, None).await.unwrap();

    assert_eq!(saved.store_name, "Corner Store");
    assert_eq!(server.receipt_count(), 1);
    assert!(app.session().is_authenticated());

    let notices = app.take_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].contains("refreshing receipts failed"));
    assert!(app.take_notices().is_empty());

    // The next successful load catches up
    server.fail_reads(false);
    assert_eq!(app.load_receipts().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_succeeds_when_refresh_fails() {
    let server = MockApiServer::start().await;
    let id = server.seed_receipt(USER_EMAIL, draft("Gone", 20.0, date(2024, 1, 2), Category::Food));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();

    server.fail_reads(true);
    app.delete_receipt(id).await.unwrap();

    assert_eq!(server.receipt_count(), 0);
    assert_eq!(app.take_notices().len(), 1);
}

#[tokio::test]
async fn test_stale_load_reports_applied_collection() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("A", 10.0, date(2024, 1, 1), Category::Food));
    server.seed_receipt(USER_EMAIL, draft("B", 20.0, date(2024, 1, 2), Category::Food));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    assert_eq!(app.load_receipts().await.unwrap(), 2);
    let fetched = app.store().all().to_vec();

    let stale = app.receipts.begin_load();
    let fresh = app.receipts.begin_load();
    assert_eq!(app.apply_load(fresh, fetched[..1].to_vec()), 1);

    // The late response is dropped and the count reflects what the store kept
    assert_eq!(app.apply_load(stale, fetched), 1);
    assert_eq!(app.store().all().len(), 1);
}

#[tokio::test]
async fn test_delete_missing_receipt_reports_server_message() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;

    let err = app.delete_receipt(404).await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Receipt not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Non-401 failures keep the session
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_server() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;

    let blank = draft("   ", 10.0, date(2024, 1, 1), Category::Food);
    let err = app.save_receipt(None, &blank, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Store name is required");

    let free = draft("Shop", 0.0, date(2024, 1, 1), Category::Food);
    let err = app.save_receipt(None, &free, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Total amount must be positive");

    let huge = Attachment::new("scan.pdf", vec![0; crate::models::MAX_ATTACHMENT_BYTES + 1]);
    let ok = draft("Shop", 5.0, date(2024, 1, 1), Category::Food);
    assert!(app.save_receipt(None, &ok, Some(&huge)).await.is_err());

    assert_eq!(server.receipt_count(), 0);
}

#[tokio::test]
async fn test_filter_over_loaded_collection() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("Dominos", 300.0, date(2024, 5, 1), Category::Dining));
    server.seed_receipt(USER_EMAIL, draft("Metro", 50.0, date(2024, 5, 2), Category::Transportation));
    server.seed_receipt(USER_EMAIL, draft("D-Mart", 900.0, date(2024, 5, 3), Category::Groceries));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();

    let hits = app.apply_filter(FilterCriteria::new().search(Some("d")).date_from(Some("2024-05-02")));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].store_name, "D-Mart");
    assert_eq!(app.store().active_filter_count(), 2);

    app.clear_filters();
    assert_eq!(app.filtered().len(), 3);
}

#[tokio::test]
async fn test_dashboard_uses_full_collection() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("A", 100.0, date(2024, 6, 10), Category::Food));
    server.seed_receipt(USER_EMAIL, draft("B", 200.0, date(2024, 6, 12), Category::Dining));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    app.load_receipts().await.unwrap();
    app.apply_filter(FilterCriteria::new().category(Some(Category::Food)));

    let now = date(2024, 6, 15).and_hms_opt(12, 0, 0).unwrap();
    let stats = app.dashboard(now);
    assert_eq!(stats.total_receipts, 2);
    assert_eq!(stats.total_spent, 300.0);
    assert_eq!(stats.average_receipt, 150.0);
    assert_eq!(stats.top_category, Some(Category::Dining));
    assert_eq!(stats.remaining_budget, 50_000.0 - 300.0);
}

#[tokio::test]
async fn test_server_side_search() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("Amazon", 999.0, date(2024, 7, 1), Category::Electronics));
    server.seed_receipt(USER_EMAIL, draft("Zomato", 250.0, date(2024, 7, 2), Category::Dining));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    let query = SearchQuery {
        store_name: Some("amaz".into()),
        ..SearchQuery::default()
    };
    let page = app.search_receipts(&query).await.unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].store_name, "Amazon");
    // Search leaves the loaded collection alone
    assert!(!app.store().is_loaded());
}

#[tokio::test]
async fn test_fetch_single_receipt() {
    let server = MockApiServer::start().await;
    let id = server.seed_receipt(USER_EMAIL, draft("Chemist", 80.0, date(2024, 8, 8), Category::Healthcare));

    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;
    let receipt = app.fetch_receipt(id).await.unwrap();
    assert_eq!(receipt.category, Category::Healthcare);
    assert_eq!(receipt.user.unwrap().email, USER_EMAIL);
}

#[tokio::test]
async fn test_admin_operations_denied_for_regular_user() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, USER_EMAIL, USER_PASSWORD).await;

    assert!(matches!(app.load_users().await, Err(Error::AccessDenied(_))));
    assert!(matches!(app.load_analytics().await, Err(Error::AccessDenied(_))));
    assert!(matches!(app.delete_user(1).await, Err(Error::AccessDenied(_))));
    assert_eq!(server.user_count(), 2);
}

#[tokio::test]
async fn test_admin_delete_user_reloads_users_and_analytics() {
    let server = MockApiServer::start().await;
    server.seed_receipt(USER_EMAIL, draft("Shop", 400.0, date(2024, 3, 5), Category::Shopping));
    server.seed_receipt(ADMIN_EMAIL, draft("Cafe", 100.0, date(2024, 3, 6), Category::Dining));

    let mut app = logged_in(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    app.load_initial_data().await.unwrap();

    let analytics = app.analytics().unwrap();
    assert_eq!(analytics.total_users, 2);
    assert_eq!(analytics.total_spending, 500.0);
    assert_eq!(analytics.top_spenders[0].email, USER_EMAIL);

    let users = app.load_users().await.unwrap().to_vec();
    let victim = users.iter().find(|u| u.email == USER_EMAIL).unwrap().id;
    app.delete_user(victim).await.unwrap();

    assert_eq!(app.users().len(), 1);
    let analytics = app.analytics().unwrap();
    assert_eq!(analytics.total_users, 1);
    assert_eq!(analytics.total_spending, 100.0);
    assert_eq!(analytics.average_per_user(), 100.0);
}

#[tokio::test]
async fn test_admin_delete_user_survives_failed_refresh() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let victim = app
        .load_users()
        .await
        .unwrap()
        .iter()
        .find(|u| u.email == USER_EMAIL)
        .unwrap()
        .id;

    server.fail_reads(true);
    app.delete_user(victim).await.unwrap();

    assert_eq!(server.user_count(), 1);
    let notices = app.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices[0].contains("users"));
    assert!(notices[1].contains("analytics"));
}

#[tokio::test]
async fn test_register_validation_and_friendly_errors() {
    let server = MockApiServer::start().await;
    let mut app = AppContext::new(config_for(&server), LocalStorage::in_memory()).unwrap();

    let err = app.register("A", "a@example.com", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Name must be at least 2 characters long");
    let err = app.register("Asha", "not-an-email", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Please enter a valid email address");
    let err = app.register("Asha", "asha@example.com", "123").await.unwrap_err();
    assert_eq!(err.to_string(), "Password must be at least 6 characters long");

    let err = app.register("Dup", USER_EMAIL, "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "This email is already registered or invalid");

    let user = app.register("Asha", "asha@example.com", "secret1").await.unwrap();
    assert_eq!(user.role, Role::User);
    // Registering does not log in
    assert!(!app.session().is_authenticated());
    app.login("asha@example.com", "secret1").await.unwrap();
}

#[tokio::test]
async fn test_refresh_profile_and_logout() {
    let server = MockApiServer::start().await;
    let mut app = logged_in(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let user = app.refresh_profile().await.unwrap();
    assert!(user.is_admin());

    app.logout().unwrap();
    assert!(app.current_user().is_none());
    assert!(matches!(app.refresh_profile().await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_session_persists_across_contexts() {
    let server = MockApiServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server).with_data_dir(dir.path().to_path_buf());

    {
        let mut app = AppContext::open(config.clone()).unwrap();
        app.login(USER_EMAIL, USER_PASSWORD).await.unwrap();
        app.set_theme(Theme::Dark).unwrap();
    }

    let mut app = AppContext::open(config).unwrap();
    assert!(app.session().is_authenticated());
    assert_eq!(app.theme(), Theme::Dark);
    assert_eq!(app.load_receipts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = Config {
        api_url: "http://127.0.0.1:9/api".into(),
        ..Config::default()
    };
    let mut app = AppContext::new(config, LocalStorage::in_memory()).unwrap();

    let err = app.login(USER_EMAIL, USER_PASSWORD).await.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}
