//! Test utilities for tillroll-core
//!
//! This module provides an in-memory mock of the receipt backend's REST API,
//! used by the application context tests and the CLI tests.
//!
//! Seeded accounts:
//! - `admin@example.com` / `admin123` (ADMIN)
//! - `user@example.com` / `password` (USER)

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::models::{Category, PaymentMethod, Receipt, ReceiptDraft, Role, User, UserSummary};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "password";

struct Account {
    user: User,
    password: String,
}

struct StoredReceipt {
    receipt: Receipt,
    owner_id: i64,
}

#[derive(Default)]
struct MockState {
    accounts: Vec<Account>,
    receipts: Vec<StoredReceipt>,
    tokens: HashMap<String, i64>,
    uploads: Vec<String>,
    fail_reads: bool,
    next_user_id: i64,
    next_receipt_id: i64,
    next_token: u64,
}

type SharedState = Arc<Mutex<MockState>>;

impl MockState {
    fn seeded() -> Self {
        let mut state = Self {
            next_user_id: 1,
            next_receipt_id: 1,
            ..Self::default()
        };
        state.add_account("Admin", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin);
        state.add_account("Test User", USER_EMAIL, USER_PASSWORD, Role::User);
        state
    }

    fn add_account(&mut self, name: &str, email: &str, password: &str, role: Role) -> User {
        let user = User {
            id: self.next_user_id,
            name: name.to_string(),
            email: email.to_string(),
            role,
            created_at: Some(Utc::now().naive_utc()),
        };
        self.next_user_id += 1;
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email))
    }

    fn insert_receipt(&mut self, owner: &User, draft: &ReceiptDraft, file_url: Option<String>) -> Receipt {
        let now = Utc::now().naive_utc();
        let receipt = Receipt {
            id: self.next_receipt_id,
            store_name: draft.store_name.clone(),
            purchase_date: draft.purchase_date,
            total_amount: draft.total_amount,
            category: draft.category,
            payment_method: draft.payment_method,
            file_url,
            created_at: Some(now),
            updated_at: Some(now),
            user: Some(UserSummary {
                id: owner.id,
                name: owner.name.clone(),
                email: owner.email.clone(),
            }),
        };
        self.next_receipt_id += 1;
        self.receipts.push(StoredReceipt {
            receipt: receipt.clone(),
            owner_id: owner.id,
        });
        receipt
    }

    /// Receipts of one owner, newest purchase first
    fn owned(&self, owner_id: i64) -> Vec<Receipt> {
        let mut receipts: Vec<Receipt> = self
            .receipts
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| r.receipt.clone())
            .collect();
        receipts.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        receipts
    }
}

/// Mock receipt backend for testing
pub struct MockApiServer {
    addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockApiServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MockState::seeded()));

        let app = Router::new()
            .route("/api/auth/login", post(handle_login))
            .route("/api/auth/register", post(handle_register))
            .route("/api/users/me", get(handle_me))
            .route("/api/receipts", get(handle_list_receipts).post(handle_create_receipt))
            .route("/api/receipts/search", get(handle_search_receipts))
            .route(
                "/api/receipts/:id",
                get(handle_get_receipt)
                    .put(handle_update_receipt)
                    .delete(handle_delete_receipt),
            )
            .route("/api/admin/users", get(handle_admin_users))
            .route(
                "/api/admin/users/:id",
                axum::routing::delete(handle_admin_delete_user),
            )
            .route("/api/admin/analytics", get(handle_admin_analytics))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for the API, including the `/api` prefix
    pub fn url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Insert a receipt directly for the account with `owner_email`
    pub fn seed_receipt(&self, owner_email: &str, draft: ReceiptDraft) -> i64 {
        let mut state = self.state.lock().unwrap();
        let owner = state
            .account_by_email(owner_email)
            .map(|a| a.user.clone())
            .unwrap_or_else(|| panic!("no mock account {}", owner_email));
        state.insert_receipt(&owner, &draft, None).id
    }

    /// Invalidate every issued token (simulates expiry)
    pub fn revoke_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    /// Make the collection endpoints (receipt list, admin users, analytics)
    /// answer 500 while writes keep working
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn receipt_count(&self) -> usize {
        self.state.lock().unwrap().receipts.len()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().accounts.len()
    }

    /// File names received through multipart uploads, in order
    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A draft for seeding, with sensible defaults
pub fn draft(store: &str, amount: f64, date: NaiveDate, category: Category) -> ReceiptDraft {
    ReceiptDraft {
        store_name: store.to_string(),
        purchase_date: date,
        total_amount: amount,
        category,
        payment_method: PaymentMethod::Cash,
    }
}

// ========== Error responses ==========

struct MockError {
    status: StatusCode,
    body: Value,
}

impl MockError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn unavailable() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Service temporarily unavailable")
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Access denied")
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, &format!("{} not found", what))
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn validation(errors: Vec<&str>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "errors": errors }),
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type MockResult<T> = std::result::Result<T, MockError>;

fn authenticate(state: &MockState, headers: &HeaderMap) -> MockResult<User> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(MockError::unauthorized)?;
    let user_id = state
        .tokens
        .get(token)
        .copied()
        .ok_or_else(MockError::unauthorized)?;
    state
        .accounts
        .iter()
        .find(|a| a.user.id == user_id)
        .map(|a| a.user.clone())
        .ok_or_else(MockError::unauthorized)
}

fn require_admin(state: &MockState, headers: &HeaderMap) -> MockResult<User> {
    let user = authenticate(state, headers)?;
    if user.role != Role::Admin {
        return Err(MockError::forbidden());
    }
    Ok(user)
}

fn page_json(receipts: Vec<Receipt>, page: u32, size: u32) -> Value {
    let size = size.max(1);
    let total = receipts.len();
    let total_pages = total.div_ceil(size as usize);
    let content: Vec<Receipt> = receipts
        .into_iter()
        .skip(page as usize * size as usize)
        .take(size as usize)
        .collect();
    json!({
        "content": content,
        "totalElements": total,
        "totalPages": total_pages,
        "number": page,
        "size": size,
        "first": page == 0,
        "last": (page as usize + 1) >= total_pages,
    })
}

// ========== Auth ==========

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn handle_login(
    State(state): State<SharedState>,
    Json(body): Json<LoginBody>,
) -> MockResult<Json<Value>> {
    let mut state = state.lock().unwrap();
    let user = match state.account_by_email(&body.email) {
        Some(account) if account.password == body.password => account.user.clone(),
        _ => {
            return Err(MockError::new(
                StatusCode::UNAUTHORIZED,
                "Invalid email or password",
            ))
        }
    };
    state.next_token += 1;
    let token = format!("mock-token-{}", state.next_token);
    state.tokens.insert(token.clone(), user.id);
    Ok(Json(json!({ "token": token, "user": user })))
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    role: Role,
}

async fn handle_register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterBody>,
) -> MockResult<(StatusCode, Json<User>)> {
    let mut state = state.lock().unwrap();
    if state.account_by_email(&body.email).is_some() {
        return Err(MockError::bad_request("Email is already registered"));
    }
    if body.password.len() < 6 {
        return Err(MockError::validation(vec![
            "Password must be at least 6 characters",
        ]));
    }
    let user = state.add_account(&body.name, &body.email, &body.password, body.role);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn handle_me(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> MockResult<Json<User>> {
    let state = state.lock().unwrap();
    authenticate(&state, &headers).map(Json)
}

// ========== Receipts ==========

#[derive(Deserialize)]
struct PageParams {
    page: Option<u32>,
    size: Option<u32>,
}

async fn handle_list_receipts(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> MockResult<Json<Value>> {
    let state = state.lock().unwrap();
    let user = authenticate(&state, &headers)?;
    if state.fail_reads {
        return Err(MockError::unavailable());
    }
    let receipts = state.owned(user.id);
    Ok(Json(page_json(
        receipts,
        params.page.unwrap_or(0),
        params.size.unwrap_or(10),
    )))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    store_name: Option<String>,
    category: Option<Category>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    page: Option<u32>,
    size: Option<u32>,
}

async fn handle_search_receipts(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> MockResult<Json<Value>> {
    let state = state.lock().unwrap();
    let user = authenticate(&state, &headers)?;
    let needle = params.store_name.as_deref().map(str::to_lowercase);
    let receipts: Vec<Receipt> = state
        .owned(user.id)
        .into_iter()
        .filter(|r| {
            needle
                .as_deref()
                .map_or(true, |n| r.store_name.to_lowercase().contains(n))
        })
        .filter(|r| params.category.map_or(true, |c| r.category == c))
        .filter(|r| params.start_date.map_or(true, |d| r.purchase_date >= d))
        .filter(|r| params.end_date.map_or(true, |d| r.purchase_date <= d))
        .collect();
    Ok(Json(page_json(
        receipts,
        params.page.unwrap_or(0),
        params.size.unwrap_or(10),
    )))
}

async fn handle_get_receipt(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> MockResult<Json<Receipt>> {
    let state = state.lock().unwrap();
    let user = authenticate(&state, &headers)?;
    state
        .receipts
        .iter()
        .find(|r| r.receipt.id == id && r.owner_id == user.id)
        .map(|r| Json(r.receipt.clone()))
        .ok_or_else(|| MockError::not_found("Receipt"))
}

/// Read the `receipt` JSON part and optional `file` part
async fn read_receipt_form(
    mut multipart: Multipart,
) -> MockResult<(ReceiptDraft, Option<(String, Vec<u8>)>)> {
    let mut draft: Option<ReceiptDraft> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MockError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "receipt" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| MockError::bad_request("Failed to read receipt"))?;
                let value: Value = serde_json::from_str(&text)
                    .map_err(|_| MockError::bad_request("Invalid receipt JSON"))?;
                draft = Some(validate_draft(&value)?);
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| MockError::bad_request("Failed to read file data"))?;
                file = Some((file_name, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let draft = draft.ok_or_else(|| MockError::bad_request("Missing receipt part"))?;
    Ok((draft, file))
}

/// Server-side bean validation on the receipt payload
fn validate_draft(value: &Value) -> MockResult<ReceiptDraft> {
    let mut errors = Vec::new();
    let store_blank = value
        .get("storeName")
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty());
    if store_blank {
        errors.push("Store name is required");
    }
    let amount_ok = value
        .get("totalAmount")
        .and_then(Value::as_f64)
        .is_some_and(|a| a > 0.0);
    if !amount_ok {
        errors.push("Total amount must be positive");
    }
    if !errors.is_empty() {
        return Err(MockError::validation(errors));
    }
    serde_json::from_value(value.clone())
        .map_err(|e| MockError::bad_request(&format!("Invalid receipt: {}", e)))
}

async fn handle_create_receipt(
    State(state): State<SharedState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> MockResult<(StatusCode, Json<Receipt>)> {
    let user = {
        let state = state.lock().unwrap();
        authenticate(&state, &headers)?
    };
    let (draft, file) = read_receipt_form(multipart).await?;

    let mut state = state.lock().unwrap();
    let file_url = file.map(|(name, _)| {
        state.uploads.push(name.clone());
        format!("/uploads/{}", name)
    });
    let receipt = state.insert_receipt(&user, &draft, file_url);
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn handle_update_receipt(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> MockResult<Json<Receipt>> {
    let user = {
        let state = state.lock().unwrap();
        authenticate(&state, &headers)?
    };
    let (draft, file) = read_receipt_form(multipart).await?;

    let mut state = state.lock().unwrap();
    if let Some((name, _)) = &file {
        state.uploads.push(name.clone());
    }
    let stored = state
        .receipts
        .iter_mut()
        .find(|r| r.receipt.id == id && r.owner_id == user.id)
        .ok_or_else(|| MockError::not_found("Receipt"))?;

    let receipt = &mut stored.receipt;
    receipt.store_name = draft.store_name;
    receipt.purchase_date = draft.purchase_date;
    receipt.total_amount = draft.total_amount;
    receipt.category = draft.category;
    receipt.payment_method = draft.payment_method;
    if let Some((name, _)) = file {
        receipt.file_url = Some(format!("/uploads/{}", name));
    }
    receipt.updated_at = Some(Utc::now().naive_utc());
    Ok(Json(receipt.clone()))
}

async fn handle_delete_receipt(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> MockResult<Json<Value>> {
    let mut state = state.lock().unwrap();
    let user = authenticate(&state, &headers)?;
    let before = state.receipts.len();
    state
        .receipts
        .retain(|r| !(r.receipt.id == id && r.owner_id == user.id));
    if state.receipts.len() == before {
        return Err(MockError::not_found("Receipt"));
    }
    Ok(Json(json!({ "message": "Receipt deleted successfully" })))
}

// ========== Admin ==========

async fn handle_admin_users(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> MockResult<Json<Vec<User>>> {
    let state = state.lock().unwrap();
    require_admin(&state, &headers)?;
    if state.fail_reads {
        return Err(MockError::unavailable());
    }
    Ok(Json(state.accounts.iter().map(|a| a.user.clone()).collect()))
}

async fn handle_admin_delete_user(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> MockResult<Json<Value>> {
    let mut state = state.lock().unwrap();
    let admin = require_admin(&state, &headers)?;
    if admin.id == id {
        return Err(MockError::bad_request("Cannot delete your own account"));
    }
    let before = state.accounts.len();
    state.accounts.retain(|a| a.user.id != id);
    if state.accounts.len() == before {
        return Err(MockError::not_found("User"));
    }
    state.receipts.retain(|r| r.owner_id != id);
    state.tokens.retain(|_, user_id| *user_id != id);
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

async fn handle_admin_analytics(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> MockResult<Json<Value>> {
    let state = state.lock().unwrap();
    require_admin(&state, &headers)?;
    if state.fail_reads {
        return Err(MockError::unavailable());
    }

    let mut spending_by_category: BTreeMap<&str, f64> = BTreeMap::new();
    let mut receipts_by_category: BTreeMap<&str, u64> = BTreeMap::new();
    let mut receipts_by_payment: BTreeMap<&str, u64> = BTreeMap::new();
    let mut monthly_count: BTreeMap<String, u64> = BTreeMap::new();
    let mut monthly_spending: BTreeMap<String, f64> = BTreeMap::new();
    let mut per_user: HashMap<i64, (f64, u64)> = HashMap::new();
    let mut total = 0.0;

    for stored in &state.receipts {
        let r = &stored.receipt;
        let month = format!("{:04}-{:02}", r.purchase_date.year(), r.purchase_date.month());
        total += r.total_amount;
        *spending_by_category.entry(r.category.as_str()).or_default() += r.total_amount;
        *receipts_by_category.entry(r.category.as_str()).or_default() += 1;
        *receipts_by_payment.entry(r.payment_method.as_str()).or_default() += 1;
        *monthly_count.entry(month.clone()).or_default() += 1;
        *monthly_spending.entry(month).or_default() += r.total_amount;
        let entry = per_user.entry(stored.owner_id).or_default();
        entry.0 += r.total_amount;
        entry.1 += 1;
    }

    let mut top_spenders: Vec<Value> = state
        .accounts
        .iter()
        .filter_map(|a| {
            per_user.get(&a.user.id).map(|(spent, count)| {
                json!({
                    "username": a.user.name,
                    "email": a.user.email,
                    "totalSpent": spent,
                    "receiptCount": count,
                })
            })
        })
        .collect();
    top_spenders.sort_by(|a, b| {
        let a = a["totalSpent"].as_f64().unwrap_or(0.0);
        let b = b["totalSpent"].as_f64().unwrap_or(0.0);
        b.total_cmp(&a)
    });
    top_spenders.truncate(5);

    Ok(Json(json!({
        "totalUsers": state.accounts.len(),
        "totalReceipts": state.receipts.len(),
        "totalSpending": total,
        "spendingByCategory": spending_by_category,
        "receiptsByCategory": receipts_by_category,
        "receiptsByPaymentMethod": receipts_by_payment,
        "monthlyReceiptCount": monthly_count,
        "monthlySpending": monthly_spending,
        "topSpenders": top_spenders,
    })))
}
