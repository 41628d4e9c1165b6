//! In-process stand-in for the portfolio backend.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;

use portfolio_client::{ClientConfig, KeyValueStore, MemoryStore, PortfolioClient};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// Decoded body of a create/update/upload request.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub path: String,
    pub multipart: bool,
    pub json: Option<Value>,
    pub fields: Vec<(String, String)>,
    /// `(field, filename)` per file part.
    pub files: Vec<(String, String)>,
}

impl Submission {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct Account {
    email: String,
    password: String,
    user: Value,
}

#[derive(Default)]
struct Data {
    projects: Vec<Value>,
    certificates: Vec<Value>,
    reviews: Vec<Value>,
    accounts: Vec<Account>,
    tokens: HashMap<String, Value>,
    failing: HashSet<&'static str>,
    requests: Vec<RecordedRequest>,
    submissions: Vec<Submission>,
    next_id: u64,
}

impl Data {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    data: Arc<Mutex<Data>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_project(&self, id: &str, title: &str, featured: bool, main: &str, additional: &[&str]) {
        self.lock().projects.push(json!({
            "_id": id,
            "title": title,
            "description": format!("{title} description"),
            "technologies": ["Rust"],
            "imageUrl": main,
            "additionalImages": additional,
            "featured": featured,
            "order": 0,
        }));
    }

    pub fn seed_certificate(&self, id: &str, title: &str, issuer: &str) {
        self.lock().certificates.push(json!({
            "_id": id,
            "title": title,
            "issuer": issuer,
            "issueDate": "2023-04-01T00:00:00Z",
            "featured": false,
        }));
    }

    pub fn seed_account(&self, email: &str, password: &str, name: &str, role: &str) {
        let mut data = self.lock();
        let id = data.next_id("u");
        data.accounts.push(Account {
            email: email.to_string(),
            password: password.to_string(),
            user: json!({
                "_id": id,
                "name": name,
                "email": email,
                "role": role,
                "isAdmin": role == "admin" || role == "superadmin",
                "isSuperAdmin": role == "superadmin",
                "isAdminApproved": role != "user",
            }),
        });
    }

    /// Make the named operation answer with a 500 until [`FakeBackend::recover`].
    pub fn fail(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.lock().failing.remove(operation);
    }

    /// Invalidate every issued token.
    pub fn revoke_tokens(&self) {
        self.lock().tokens.clear();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path_prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.path.starts_with(path_prefix))
            .collect()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    pub fn project(&self, id: &str) -> Option<Value> {
        self.lock()
            .projects
            .iter()
            .find(|project| project["_id"] == id)
            .cloned()
    }

    pub fn additional_images(&self, id: &str) -> Vec<String> {
        self.project(id)
            .and_then(|project| serde_json::from_value(project["additionalImages"].clone()).ok())
            .unwrap_or_default()
    }

    pub fn reviews(&self) -> Vec<Value> {
        self.lock().reviews.clone()
    }

    fn failing(&self, operation: &str) -> bool {
        self.lock().failing.contains(operation)
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/profile", get(profile))
            .route("/api/projects", get(list_projects).post(create_project))
            .route(
                "/api/projects/:id",
                get(get_project).put(update_project).delete(delete_project),
            )
            .route("/api/projects/:id/images", post(upload_images))
            .route("/api/projects/:id/images/reorder", put(reorder_images))
            .route("/api/projects/:id/images/:index", delete(remove_image))
            .route("/api/certificates", get(list_certificates))
            .route("/api/certificates/:id", get(get_certificate))
            .route("/api/reviews", get(list_reviews).post(create_review))
            .route("/api/reviews/:id", delete(delete_review))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone())
    }

    /// Serve on an ephemeral localhost port and return the API base URL.
    pub async fn spawn(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }
}

/// Start `backend` and build a client against it with the given store.
pub async fn client_with_store(
    backend: &FakeBackend,
    store: Arc<dyn KeyValueStore>,
) -> PortfolioClient {
    let api_url = backend.spawn().await;
    PortfolioClient::new(ClientConfig::default().with_api_url(api_url), store).unwrap()
}

pub async fn client(backend: &FakeBackend) -> PortfolioClient {
    client_with_store(backend, Arc::new(MemoryStore::new())).await
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn single(value: Value) -> Response {
    Json(json!({ "success": true, "data": value })).into_response()
}

fn page(items: Vec<Value>) -> Response {
    let total = items.len();
    Json(json!({
        "success": true,
        "data": items,
        "pagination": { "page": 1, "pages": 1, "total": total },
    }))
    .into_response()
}

async fn record(State(backend): State<FakeBackend>, req: Request, next: Next) -> Response {
    let recorded = RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        query: req.uri().query().map(str::to_string),
        authorization: req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    backend.lock().requests.push(recorded);
    next.run(req).await
}

async fn read_body(backend: &FakeBackend, req: Request) -> Result<Submission, Response> {
    let path = req.uri().path().to_string();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let submission = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, backend)
            .await
            .map_err(IntoResponse::into_response)?;
        let mut submission = Submission {
            path,
            multipart: true,
            ..Submission::default()
        };
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| failure(StatusCode::BAD_REQUEST, &err.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    field
                        .bytes()
                        .await
                        .map_err(|err| failure(StatusCode::BAD_REQUEST, &err.to_string()))?;
                    submission.files.push((name, filename));
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|err| failure(StatusCode::BAD_REQUEST, &err.to_string()))?;
                    submission.fields.push((name, value));
                }
            }
        }
        submission
    } else {
        let Json(value) = Json::<Value>::from_request(req, backend)
            .await
            .map_err(IntoResponse::into_response)?;
        Submission {
            path,
            json: Some(value),
            ..Submission::default()
        }
    };

    backend.lock().submissions.push(submission.clone());
    Ok(submission)
}

/// Rebuild a JSON object from form fields, undoing `key[i]` flattening.
fn fields_to_object(fields: &[(String, String)]) -> Map<String, Value> {
    let mut object = Map::new();
    for (key, value) in fields {
        if let Some((base, _)) = key.split_once('[') {
            let entry = object
                .entry(base.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(Value::String(value.clone()));
            }
            continue;
        }
        let parsed = match (key.as_str(), value.as_str()) {
            (_, "true") => Value::Bool(true),
            (_, "false") => Value::Bool(false),
            ("order", raw) => raw.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            (_, raw) => Value::String(raw.to_string()),
        };
        object.insert(key.clone(), parsed);
    }
    object
}

fn submission_object(submission: &Submission) -> Map<String, Value> {
    let mut object = match &submission.json {
        Some(Value::Object(map)) => map.clone(),
        _ => fields_to_object(&submission.fields),
    };
    for (field, filename) in &submission.files {
        let url = Value::String(format!("/uploads/{filename}"));
        if field == "additionalImages" {
            let entry = object
                .entry("additionalImages".to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(url);
            }
        } else {
            object.insert("imageUrl".to_string(), url);
        }
    }
    object
}

fn bearer(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

async fn login(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut data = backend.lock();
    let Some(user) = data
        .accounts
        .iter()
        .find(|account| account.email == email && account.password == password)
        .map(|account| account.user.clone())
    else {
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };
    let token = data.next_id("token-");
    data.tokens.insert(token.clone(), user.clone());
    Json(json!({ "success": true, "token": token, "user": user })).into_response()
}

async fn register(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if backend.lock().accounts.iter().any(|account| account.email == email) {
        return failure(StatusCode::BAD_REQUEST, "User already exists");
    }
    backend.seed_account(&email, &password, &name, "user");
    login(
        State(backend),
        Json(json!({ "email": email, "password": password })),
    )
    .await
}

async fn profile(State(backend): State<FakeBackend>, req: Request) -> Response {
    let user = bearer(&req).and_then(|token| backend.lock().tokens.get(&token).cloned());
    match user {
        Some(user) => Json(json!({ "success": true, "user": user })).into_response(),
        None => failure(StatusCode::UNAUTHORIZED, "Token is not valid"),
    }
}

async fn list_projects(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    // `limit` is ignored here; the client caps lists itself.
    let featured_only = query.get("featured").is_some_and(|value| value == "true");
    let items = backend
        .lock()
        .projects
        .iter()
        .filter(|project| !featured_only || project["featured"] == true)
        .cloned()
        .collect();
    page(items)
}

async fn get_project(State(backend): State<FakeBackend>, Path(id): Path<String>) -> Response {
    if backend.failing("get") {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not load project");
    }
    match backend.project(&id) {
        Some(project) => single(project),
        None => failure(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn create_project(State(backend): State<FakeBackend>, req: Request) -> Response {
    if backend.failing("create") {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not create project");
    }
    let submission = match read_body(&backend, req).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    let mut object = submission_object(&submission);
    if object.get("title").and_then(Value::as_str).is_none_or(str::is_empty) {
        return failure(StatusCode::BAD_REQUEST, "Title is required");
    }

    let mut data = backend.lock();
    let id = data.next_id("p");
    object.insert("_id".to_string(), Value::String(id));
    let project = Value::Object(object);
    data.projects.push(project.clone());
    drop(data);
    single(project)
}

async fn update_project(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    req: Request,
) -> Response {
    let submission = match read_body(&backend, req).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };
    let changes = submission_object(&submission);

    let mut data = backend.lock();
    let Some(Value::Object(project)) = data.projects.iter_mut().find(|project| project["_id"] == id.as_str())
    else {
        return failure(StatusCode::NOT_FOUND, "Project not found");
    };
    project.extend(changes);
    let updated = Value::Object(project.clone());
    drop(data);
    single(updated)
}

async fn delete_project(State(backend): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let mut data = backend.lock();
    let before = data.projects.len();
    data.projects.retain(|project| project["_id"] != id.as_str());
    if data.projects.len() == before {
        return failure(StatusCode::NOT_FOUND, "Project not found");
    }
    Json(json!({ "success": true, "message": "Project deleted" })).into_response()
}

async fn upload_images(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    req: Request,
) -> Response {
    if backend.failing("upload") {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Image upload failed");
    }
    let submission = match read_body(&backend, req).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    let mut data = backend.lock();
    let Some(project) = data.projects.iter_mut().find(|project| project["_id"] == id.as_str()) else {
        return failure(StatusCode::NOT_FOUND, "Project not found");
    };
    if project["additionalImages"].is_null() {
        project["additionalImages"] = json!([]);
    }
    let Some(images) = project["additionalImages"].as_array_mut() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt project");
    };
    for (_, filename) in &submission.files {
        images.push(Value::String(format!("/uploads/{filename}")));
    }
    let updated = project.clone();
    drop(data);
    single(updated)
}

async fn remove_image(
    State(backend): State<FakeBackend>,
    Path((id, index)): Path<(String, usize)>,
) -> Response {
    if index == 0 {
        return failure(StatusCode::BAD_REQUEST, "Cannot remove the main image");
    }
    let mut data = backend.lock();
    let Some(project) = data.projects.iter_mut().find(|project| project["_id"] == id.as_str()) else {
        return failure(StatusCode::NOT_FOUND, "Project not found");
    };
    let Some(images) = project["additionalImages"].as_array_mut() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt project");
    };
    if index > images.len() {
        return failure(StatusCode::BAD_REQUEST, "Invalid image index");
    }
    images.remove(index - 1);
    let updated = project.clone();
    drop(data);
    single(updated)
}

async fn reorder_images(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if backend.failing("reorder") {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to reorder images");
    }
    let order: Vec<usize> = match serde_json::from_value(body["imageOrder"].clone()) {
        Ok(order) => order,
        Err(_) => return failure(StatusCode::BAD_REQUEST, "imageOrder must be a list of indices"),
    };

    let mut data = backend.lock();
    let Some(project) = data.projects.iter_mut().find(|project| project["_id"] == id.as_str()) else {
        return failure(StatusCode::NOT_FOUND, "Project not found");
    };
    let Some(images) = project["additionalImages"].as_array_mut() else {
        return failure(StatusCode::INTERNAL_SERVER_ERROR, "Corrupt project");
    };

    let mut seen = HashSet::new();
    let valid = order.len() == images.len()
        && order
            .iter()
            .all(|&index| index >= 1 && index <= images.len() && seen.insert(index));
    if !valid {
        return failure(StatusCode::BAD_REQUEST, "Invalid image order");
    }
    let reordered: Vec<Value> = order.iter().map(|&index| images[index - 1].clone()).collect();
    *images = reordered;
    let updated = project.clone();
    drop(data);
    single(updated)
}

async fn list_certificates(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let issuer = query.get("issuer").cloned();
    let items = backend
        .lock()
        .certificates
        .iter()
        .filter(|certificate| {
            issuer
                .as_deref()
                .is_none_or(|issuer| certificate["issuer"] == issuer)
        })
        .cloned()
        .collect();
    page(items)
}

async fn get_certificate(State(backend): State<FakeBackend>, Path(id): Path<String>) -> Response {
    let certificate = backend
        .lock()
        .certificates
        .iter()
        .find(|certificate| certificate["_id"] == id.as_str())
        .cloned();
    match certificate {
        Some(certificate) => single(certificate),
        None => failure(StatusCode::NOT_FOUND, "Certificate not found"),
    }
}

async fn list_reviews(
    State(backend): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let project_id = query.get("projectId").cloned();
    let items = backend
        .lock()
        .reviews
        .iter()
        .filter(|review| {
            project_id
                .as_deref()
                .is_none_or(|project_id| review["project"] == project_id)
        })
        .cloned()
        .collect();
    page(items)
}

async fn create_review(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> Response {
    let Some(project_id) = body["projectId"].as_str().map(str::to_string) else {
        return failure(StatusCode::BAD_REQUEST, "Project is required");
    };
    let mut data = backend.lock();
    let id = data.next_id("r");
    let review = json!({
        "_id": id,
        "project": project_id,
        "name": body["name"],
        "rating": body["rating"],
        "comment": body["comment"],
    });
    data.reviews.push(review.clone());
    drop(data);
    single(review)
}

async fn delete_review(
    State(backend): State<FakeBackend>,
    Path(id): Path<String>,
    req: Request,
) -> Response {
    if bearer(&req).is_none_or(|token| !backend.lock().tokens.contains_key(&token)) {
        return failure(StatusCode::UNAUTHORIZED, "No token, authorization denied");
    }
    let mut data = backend.lock();
    let before = data.reviews.len();
    data.reviews.retain(|review| review["_id"] != id.as_str());
    if data.reviews.len() == before {
        return failure(StatusCode::NOT_FOUND, "Review not found");
    }
    Json(json!({ "success": true, "message": "Review deleted" })).into_response()
}
