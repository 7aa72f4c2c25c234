//! End-to-end tests for the HONOR loyalty client.
//!
//! [`MockBackend`] is an in-memory stand-in for the loyalty REST API, served
//! by axum on an ephemeral port. It follows the real backend's status codes
//! and `{"detail": ...}` error bodies, records every request it receives,
//! and exposes hooks for changing server-side state behind the client's back
//! (another staff member redeeming, a token being revoked).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p honor-loyalty-integration-tests
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDateTime, Utc};
use honor_loyalty_client::session::claims::encode_unsigned;
use honor_loyalty_client::{
    ClientConfig, LoyaltyClient, MemorySessionStore, SessionManager, SessionStore,
};
use honor_loyalty_core::{
    Customer, CustomerId, DashboardStats, Gift, GiftId, PointTransaction, Redemption,
    RedemptionId, RedemptionRequest, StaffId, StaffMember, StaffRole, TransactionId,
    TransactionKind,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Seeded administrator account.
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Seeded non-admin account.
pub const CASHIER_USERNAME: &str = "cashier";
pub const CASHIER_PASSWORD: &str = "cashier123";

type Shared = Arc<Mutex<BackendState>>;
type Rejection = (StatusCode, Json<Value>);

struct StaffAccount {
    member: StaffMember,
    password: String,
}

#[derive(Default)]
struct BackendState {
    staff: Vec<StaffAccount>,
    tokens: HashMap<String, StaffId>,
    issued: i64,
    customers: Vec<Customer>,
    gifts: Vec<Gift>,
    transactions: Vec<PointTransaction>,
    redemptions: Vec<Redemption>,
    requests: Vec<String>,
    customer_list_down: bool,
}

impl BackendState {
    fn authorize(&self, headers: &HeaderMap) -> Result<StaffId, Rejection> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token).copied())
            .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    fn customer_mut(&mut self, id: CustomerId) -> Result<&mut Customer, Rejection> {
        self.customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Customer not found"))
    }

    fn gift_mut(&mut self, id: GiftId) -> Result<&mut Gift, Rejection> {
        self.gifts
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Gift not found"))
    }

    fn record_transaction(
        &mut self,
        customer_id: CustomerId,
        staff_id: StaffId,
        kind: TransactionKind,
        amount: i64,
        description: String,
    ) {
        self.transactions.push(PointTransaction {
            id: TransactionId::random(),
            customer_id,
            staff_id,
            kind,
            amount,
            description,
            created_at: now(),
        });
    }
}

fn reject(status: StatusCode, detail: &str) -> Rejection {
    (status, Json(json!({ "detail": detail })))
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running mock backend. Stops when dropped.
pub struct MockBackend {
    url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start on `127.0.0.1` with an ephemeral port and the two seeded staff
    /// accounts.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let mut state = BackendState::default();
        for (username, password, role) in [
            (ADMIN_USERNAME, ADMIN_PASSWORD, StaffRole::Admin),
            (CASHIER_USERNAME, CASHIER_PASSWORD, StaffRole::Staff),
        ] {
            state.staff.push(StaffAccount {
                member: StaffMember {
                    id: StaffId::random(),
                    username: username.to_owned(),
                    role,
                    created_at: now(),
                },
                password: password.to_owned(),
            });
        }
        let state = Arc::new(Mutex::new(state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = router(Arc::clone(&state));

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock backend stopped: {e}");
            }
        });

        Self {
            url: format!("http://{addr}"),
            state,
            server,
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice: the URL is always well formed.
    #[must_use]
    pub fn config(&self, session_path: PathBuf) -> ClientConfig {
        ClientConfig::for_api_url(&self.url, session_path).expect("Mock URL is valid")
    }

    /// A client with a fresh in-memory session.
    #[must_use]
    pub fn client(&self) -> LoyaltyClient {
        self.client_with_store(MemorySessionStore::new())
    }

    /// A client whose session is restored from `store`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client_with_store(&self, store: impl SessionStore + 'static) -> LoyaltyClient {
        let session = Arc::new(SessionManager::restore(store));
        LoyaltyClient::new(&self.config(PathBuf::from("unused.json")), session)
            .expect("Failed to build client")
    }

    /// A client logged in as the seeded administrator.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn admin_client(&self) -> LoyaltyClient {
        let client = self.client();
        client
            .login(ADMIN_USERNAME, &SecretString::from(ADMIN_PASSWORD.to_owned()))
            .await
            .expect("Admin login failed");
        client
    }

    /// Insert a customer directly, as if registered elsewhere.
    pub fn seed_customer(&self, full_name: &str, phone_number: &str, total_points: u32) -> Customer {
        let customer = Customer {
            id: CustomerId::random(),
            full_name: full_name.to_owned(),
            phone_number: phone_number.to_owned(),
            email: None,
            total_points,
            created_at: now(),
        };
        lock(&self.state).customers.push(customer.clone());
        customer
    }

    /// Insert a gift directly.
    pub fn seed_gift(&self, name: &str, points_required: u32, stock: u32) -> Gift {
        let gift = Gift {
            id: GiftId::random(),
            name: name.to_owned(),
            description: None,
            points_required,
            stock,
            created_at: now(),
        };
        lock(&self.state).gifts.push(gift.clone());
        gift
    }

    /// Change a balance behind the client's back.
    pub fn set_points(&self, id: CustomerId, total_points: u32) {
        if let Ok(customer) = lock(&self.state).customer_mut(id) {
            customer.total_points = total_points;
        }
    }

    /// Change stock behind the client's back.
    pub fn set_stock(&self, id: GiftId, stock: u32) {
        if let Ok(gift) = lock(&self.state).gift_mut(id) {
            gift.stock = stock;
        }
    }

    /// Make `GET /customers` answer 500 until switched back.
    pub fn set_customer_list_down(&self, down: bool) {
        lock(&self.state).customer_list_down = down;
    }

    /// Invalidate every issued token. The next protected call gets a 401.
    pub fn revoke_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    #[must_use]
    pub fn customer(&self, id: CustomerId) -> Option<Customer> {
        lock(&self.state).customers.iter().find(|c| c.id == id).cloned()
    }

    #[must_use]
    pub fn gift(&self, id: GiftId) -> Option<Gift> {
        lock(&self.state).gifts.iter().find(|g| g.id == id).cloned()
    }

    /// Every request received so far, as `"METHOD /path?query"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state).requests.clone()
    }

    /// Requests whose line starts with `prefix`.
    #[must_use]
    pub fn requests_matching(&self, prefix: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.starts_with(prefix))
            .collect()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/add-points", post(add_points))
        .route("/customers/{id}/deduct-points", post(deduct_points))
        .route("/customers/{id}/transactions", get(list_transactions))
        .route("/gifts", get(list_gifts).post(create_gift))
        .route("/gifts/{id}", axum::routing::put(update_gift).delete(delete_gift))
        .route("/redeem", post(redeem))
        .route("/redemptions", get(list_redemptions))
        .route("/dashboard/stats", get(stats))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let line = format!(
        "{} {}",
        request.method(),
        request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_owned(), ToString::to_string)
    );
    lock(&state).requests.push(line);
    next.run(request).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(State(state): State<Shared>, Form(form): Form<LoginForm>) -> Response {
    let mut state = lock(&state);
    let Some(account) = state
        .staff
        .iter()
        .find(|a| a.member.username == form.username && a.password == form.password)
    else {
        return reject(StatusCode::UNAUTHORIZED, "Incorrect username or password").into_response();
    };

    let staff_id = account.member.id;
    let username = account.member.username.clone();
    let role = account.member.role;

    // Vary the expiry so every login yields a distinct token
    state.issued += 1;
    let exp = Utc::now().timestamp() + 3600 + state.issued;
    let token = encode_unsigned(&username, role, Some(exp));
    state.tokens.insert(token.clone(), staff_id);

    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Result<Json<StaffMember>, Rejection> {
    let state = lock(&state);
    let staff_id = state.authorize(&headers)?;
    state
        .staff
        .iter()
        .find(|a| a.member.id == staff_id)
        .map(|a| Json(a.member.clone()))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Deserialize)]
struct SearchParams {
    search: Option<String>,
}

#[derive(Deserialize)]
struct CustomerIn {
    full_name: String,
    phone_number: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct CustomerPatch {
    full_name: Option<String>,
    phone_number: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct PointsIn {
    amount: i64,
    description: String,
}

async fn list_customers(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Customer>>, Rejection> {
    let state = lock(&state);
    state.authorize(&headers)?;
    if state.customer_list_down {
        return Err(reject(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"));
    }
    let search = params.search.unwrap_or_default().to_lowercase();
    let customers = state
        .customers
        .iter()
        .rev()
        .filter(|c| {
            search.is_empty()
                || c.full_name.to_lowercase().contains(&search)
                || c.phone_number.to_lowercase().contains(&search)
        })
        .cloned()
        .collect();
    Ok(Json(customers))
}

async fn create_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CustomerIn>,
) -> Result<(StatusCode, Json<Customer>), Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    if state.customers.iter().any(|c| c.phone_number == body.phone_number) {
        return Err(reject(StatusCode::BAD_REQUEST, "Phone number already registered"));
    }
    let customer = Customer {
        id: CustomerId::random(),
        full_name: body.full_name,
        phone_number: body.phone_number,
        email: body.email,
        total_points: 0,
        created_at: now(),
    };
    state.customers.push(customer.clone());
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
) -> Result<Json<Customer>, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    Ok(Json(state.customer_mut(id)?.clone()))
}

async fn update_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
    Json(patch): Json<CustomerPatch>,
) -> Result<Json<Customer>, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    let customer = state.customer_mut(id)?;
    if let Some(full_name) = patch.full_name {
        customer.full_name = full_name;
    }
    if let Some(phone_number) = patch.phone_number {
        customer.phone_number = phone_number;
    }
    if let Some(email) = patch.email {
        customer.email = Some(email);
    }
    Ok(Json(customer.clone()))
}

async fn delete_customer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    state.customer_mut(id)?;
    state.customers.retain(|c| c.id != id);
    state.transactions.retain(|t| t.customer_id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn add_points(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
    Json(body): Json<PointsIn>,
) -> Result<Json<Customer>, Rejection> {
    let mut state = lock(&state);
    let staff_id = state.authorize(&headers)?;
    let customer = state.customer_mut(id)?;
    let amount = u32::try_from(body.amount)
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Amount must be positive"))?;
    customer.total_points += amount;
    let updated = customer.clone();
    state.record_transaction(id, staff_id, TransactionKind::Earn, body.amount, body.description);
    Ok(Json(updated))
}

async fn deduct_points(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
    Json(body): Json<PointsIn>,
) -> Result<Json<Customer>, Rejection> {
    let mut state = lock(&state);
    let staff_id = state.authorize(&headers)?;
    let customer = state.customer_mut(id)?;
    let amount = u32::try_from(body.amount)
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| reject(StatusCode::BAD_REQUEST, "Amount must be positive"))?;
    if customer.total_points < amount {
        return Err(reject(StatusCode::BAD_REQUEST, "Insufficient points"));
    }
    customer.total_points -= amount;
    let updated = customer.clone();
    state.record_transaction(
        id,
        staff_id,
        TransactionKind::ManualAdjust,
        -body.amount,
        body.description,
    );
    Ok(Json(updated))
}

async fn list_transactions(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<CustomerId>,
) -> Result<Json<Vec<PointTransaction>>, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    state.customer_mut(id)?;
    let transactions = state
        .transactions
        .iter()
        .rev()
        .filter(|t| t.customer_id == id)
        .cloned()
        .collect();
    Ok(Json(transactions))
}

// =============================================================================
// Gifts
// =============================================================================

#[derive(Deserialize)]
struct GiftIn {
    name: String,
    description: Option<String>,
    points_required: u32,
    stock: u32,
}

#[derive(Deserialize)]
struct GiftPatch {
    name: Option<String>,
    description: Option<String>,
    points_required: Option<u32>,
    stock: Option<u32>,
}

async fn list_gifts(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<Gift>>, Rejection> {
    let state = lock(&state);
    state.authorize(&headers)?;
    Ok(Json(state.gifts.iter().rev().cloned().collect()))
}

async fn create_gift(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<GiftIn>,
) -> Result<(StatusCode, Json<Gift>), Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    let gift = Gift {
        id: GiftId::random(),
        name: body.name,
        description: body.description,
        points_required: body.points_required,
        stock: body.stock,
        created_at: now(),
    };
    state.gifts.push(gift.clone());
    Ok((StatusCode::CREATED, Json(gift)))
}

async fn update_gift(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<GiftId>,
    Json(patch): Json<GiftPatch>,
) -> Result<Json<Gift>, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    let gift = state.gift_mut(id)?;
    if let Some(name) = patch.name {
        gift.name = name;
    }
    if let Some(description) = patch.description {
        gift.description = Some(description);
    }
    if let Some(points_required) = patch.points_required {
        gift.points_required = points_required;
    }
    if let Some(stock) = patch.stock {
        gift.stock = stock;
    }
    Ok(Json(gift.clone()))
}

async fn delete_gift(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<GiftId>,
) -> Result<StatusCode, Rejection> {
    let mut state = lock(&state);
    state.authorize(&headers)?;
    state.gift_mut(id)?;
    state.gifts.retain(|g| g.id != id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Redemptions and dashboard
// =============================================================================

async fn redeem(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<RedemptionRequest>,
) -> Result<(StatusCode, Json<Redemption>), Rejection> {
    let mut state = lock(&state);
    let staff_id = state.authorize(&headers)?;
    let points = state.customer_mut(body.customer_id)?.total_points;
    let gift = state.gift_mut(body.gift_id)?.clone();

    if gift.stock == 0 {
        return Err(reject(StatusCode::BAD_REQUEST, "Gift is out of stock"));
    }
    if points < gift.points_required {
        return Err(reject(StatusCode::BAD_REQUEST, "Insufficient points for this gift"));
    }

    state.customer_mut(body.customer_id)?.total_points -= gift.points_required;
    state.gift_mut(body.gift_id)?.stock -= 1;

    let redemption = Redemption {
        id: RedemptionId::random(),
        customer_id: body.customer_id,
        gift_id: body.gift_id,
        staff_id,
        points_used: gift.points_required,
        created_at: now(),
    };
    state.redemptions.push(redemption.clone());
    state.record_transaction(
        body.customer_id,
        staff_id,
        TransactionKind::Redeem,
        -i64::from(gift.points_required),
        format!("Redeemed: {}", gift.name),
    );

    Ok((StatusCode::CREATED, Json(redemption)))
}

async fn list_redemptions(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<Vec<Redemption>>, Rejection> {
    let state = lock(&state);
    state.authorize(&headers)?;
    Ok(Json(state.redemptions.iter().rev().cloned().collect()))
}

async fn stats(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, Rejection> {
    let state = lock(&state);
    state.authorize(&headers)?;
    Ok(Json(DashboardStats {
        total_customers: state.customers.len() as u64,
        total_points_issued: state
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Earn)
            .map(|t| t.amount)
            .sum(),
        total_redemptions: state.redemptions.len() as u64,
        active_gifts: state.gifts.iter().filter(|g| g.in_stock()).count() as u64,
    }))
}
