use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::{json, Value};
use siraaj::auth::TokenVerifier;
use siraaj::backend::{Backend, Credentials, LocalBackend, Session, SharedBackend};
use siraaj::models::{
    Application, ApplicationStatus, Job, JobStatus, NewApplication, NewJob, NewProfile, Profile,
    ProfileUpdate,
};
use siraaj::BackendResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn verifier() -> TokenVerifier {
    TokenVerifier::new("integration-test-secret", 3600)
}

async fn local_store(verifier: &TokenVerifier) -> LocalBackend {
    LocalBackend::in_memory(verifier.clone())
        .await
        .expect("in-memory store")
}

fn rocket_with(backend: SharedBackend, verifier: TokenVerifier) -> rocket::Rocket<rocket::Build> {
    let figment = rocket::Config::figment().merge(("log_level", "off"));
    siraaj::build_rocket(figment, backend, verifier)
}

async fn rocket() -> rocket::Rocket<rocket::Build> {
    let verifier = verifier();
    let backend: SharedBackend = Arc::new(local_store(&verifier).await);
    rocket_with(backend, verifier)
}

async fn client() -> Client {
    Client::untracked(rocket().await)
        .await
        .expect("valid rocket instance")
}

/// Delegates to the local store and counts the application rows written.
struct CountingBackend {
    inner: LocalBackend,
    application_inserts: AtomicUsize,
}

#[rocket::async_trait]
impl Backend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn ping(&self) -> BackendResult<()> {
        self.inner.ping().await
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &NewProfile,
    ) -> BackendResult<Session> {
        self.inner.sign_up(credentials, profile).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> BackendResult<Session> {
        self.inner.sign_in(credentials).await
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        self.inner.sign_out(access_token).await
    }

    async fn get_profile(&self, id: Uuid) -> BackendResult<Option<Profile>> {
        self.inner.get_profile(id).await
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> BackendResult<Profile> {
        self.inner.update_profile(id, update).await
    }

    async fn list_open_jobs(&self) -> BackendResult<Vec<Job>> {
        self.inner.list_open_jobs().await
    }

    async fn list_jobs_by_employer(&self, employer_id: Uuid) -> BackendResult<Vec<Job>> {
        self.inner.list_jobs_by_employer(employer_id).await
    }

    async fn get_job(&self, id: Uuid) -> BackendResult<Option<Job>> {
        self.inner.get_job(id).await
    }

    async fn insert_job(&self, employer_id: Uuid, job: &NewJob) -> BackendResult<Job> {
        self.inner.insert_job(employer_id, job).await
    }

    async fn update_job_status(&self, id: Uuid, status: JobStatus) -> BackendResult<Job> {
        self.inner.update_job_status(id, status).await
    }

    async fn insert_application(
        &self,
        graduate_id: Uuid,
        application: &NewApplication,
    ) -> BackendResult<Application> {
        self.application_inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_application(graduate_id, application).await
    }

    async fn list_applications_for_graduate(
        &self,
        graduate_id: Uuid,
    ) -> BackendResult<Vec<Application>> {
        self.inner.list_applications_for_graduate(graduate_id).await
    }

    async fn list_applications_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> BackendResult<Vec<Application>> {
        self.inner.list_applications_for_jobs(job_ids).await
    }

    async fn get_application(&self, id: Uuid) -> BackendResult<Option<Application>> {
        self.inner.get_application(id).await
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        current: ApplicationStatus,
        next: ApplicationStatus,
    ) -> BackendResult<Application> {
        self.inner.update_application_status(id, current, next).await
    }
}

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {}", token))
}

async fn body(response: LocalResponse<'_>) -> (Status, Value) {
    let status = response.status();
    let value = response.into_json::<Value>().await.unwrap_or(Value::Null);
    (status, value)
}

async fn get(client: &Client, uri: &str, token: &str) -> (Status, Value) {
    body(client.get(uri.to_string()).header(bearer(token)).dispatch().await).await
}

async fn post(client: &Client, uri: &str, token: &str, payload: Value) -> (Status, Value) {
    body(
        client
            .post(uri.to_string())
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(payload.to_string())
            .dispatch()
            .await,
    )
    .await
}

async fn patch(client: &Client, uri: &str, token: &str, payload: Value) -> (Status, Value) {
    body(
        client
            .patch(uri.to_string())
            .header(ContentType::JSON)
            .header(bearer(token))
            .body(payload.to_string())
            .dispatch()
            .await,
    )
    .await
}

async fn sign_up(client: &Client, payload: Value) -> (Status, Value) {
    body(
        client
            .post("/api/auth/signup")
            .header(ContentType::JSON)
            .body(payload.to_string())
            .dispatch()
            .await,
    )
    .await
}

async fn graduate(client: &Client, email: &str) -> String {
    let (status, value) = sign_up(
        client,
        json!({
            "email": email,
            "password": "graduate-pass",
            "full_name": "Amal Haddad",
            "user_type": "graduate",
            "location": "Beirut"
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", value);
    value["data"]["access_token"].as_str().unwrap().to_string()
}

async fn employer(client: &Client, email: &str, company: &str) -> String {
    let (status, value) = sign_up(
        client,
        json!({
            "email": email,
            "password": "employer-pass",
            "full_name": "Rana Aziz",
            "user_type": "employer",
            "company_name": company
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", value);
    assert_eq!(value["data"]["home_view"], "employer_dashboard");
    value["data"]["access_token"].as_str().unwrap().to_string()
}

async fn post_job(client: &Client, token: &str, title: &str) -> String {
    let (status, value) = post(
        client,
        "/api/jobs",
        token,
        json!({
            "title": title,
            "description": "Turn raw data into weekly reports",
            "requirements": "SQL\nExcel\n\nPower BI\nEnglish and Arabic\n",
            "location": "Beirut, Lebanon",
            "salary_range": "",
            "job_type": "full-time"
        }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", value);
    value["data"]["id"].as_str().unwrap().to_string()
}

#[rocket::async_test]
async fn landing_is_public() {
    let client = client().await;
    let (status, value) = body(client.get("/api/landing").dispatch().await).await;

    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["product"], "Siraaj");
    assert_eq!(value["data"]["home_view"], "landing");
    assert_eq!(value["data"]["features"].as_array().unwrap().len(), 3);
}

#[rocket::async_test]
async fn health_reports_backend() {
    let client = client().await;
    let (status, value) = body(client.get("/api/health").dispatch().await).await;

    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["status"], "ok");
    assert_eq!(value["data"]["backend"], "sqlite");
}

#[rocket::async_test]
async fn sign_up_validation() {
    let client = client().await;

    let (status, value) = sign_up(
        &client,
        json!({
            "email": "hr@cedar.example",
            "password": "employer-pass",
            "full_name": "Rana Aziz",
            "user_type": "employer"
        }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(value["error_code"], "VALIDATION_ERROR");
    assert_eq!(value["success"], false);

    let (status, _) = sign_up(
        &client,
        json!({
            "email": "amal@example.com",
            "password": "123",
            "full_name": "Amal Haddad",
            "user_type": "graduate"
        }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);

    graduate(&client, "amal@example.com").await;
    let (status, value) = sign_up(
        &client,
        json!({
            "email": "amal@example.com",
            "password": "another-pass",
            "full_name": "Amal Again",
            "user_type": "graduate"
        }),
    )
    .await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(value["error_code"], "CONFLICT");
}

#[rocket::async_test]
async fn sign_in_checks_credentials() {
    let client = client().await;
    graduate(&client, "amal@example.com").await;

    let sign_in = |password: &'static str| {
        client
            .post("/api/auth/signin")
            .header(ContentType::JSON)
            .body(json!({ "email": "amal@example.com", "password": password }).to_string())
            .dispatch()
    };

    let (status, value) = body(sign_in("graduate-pass").await).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["home_view"], "jobs");
    assert_eq!(value["data"]["profile"]["user_type"], "graduate");

    let (status, value) = body(sign_in("wrong-pass").await).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(value["error_code"], "UNAUTHORIZED");
}

#[rocket::async_test]
async fn jobs_require_a_session() {
    let client = client().await;

    let (status, value) = body(client.get("/api/jobs").dispatch().await).await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(value["error_code"], "MISSING_TOKEN");

    let (status, value) = get(&client, "/api/jobs", "not-a-jwt").await;
    assert_eq!(status, Status::Unauthorized);
    assert_eq!(value["error_code"], "TOKEN_VERIFICATION_FAILED");
}

#[rocket::async_test]
async fn roles_are_enforced() {
    let client = client().await;
    let grad = graduate(&client, "amal@example.com").await;
    let boss = employer(&client, "hr@cedar.example", "Cedar Analytics").await;
    let job_id = post_job(&client, &boss, "Junior Data Analyst").await;

    let (status, value) = post(
        &client,
        "/api/jobs",
        &grad,
        json!({ "title": "x", "description": "y", "location": "z" }),
    )
    .await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(value["error_code"], "WRONG_ROLE");

    let (status, _) = post(&client, &format!("/api/jobs/{}/apply", job_id), &boss, json!({})).await;
    assert_eq!(status, Status::Forbidden);

    let (status, _) = get(&client, "/api/dashboard/employer", &grad).await;
    assert_eq!(status, Status::Forbidden);
    let (status, _) = get(&client, "/api/dashboard/graduate", &boss).await;
    assert_eq!(status, Status::Forbidden);
}

#[rocket::async_test]
async fn post_job_validation() {
    let client = client().await;
    let boss = employer(&client, "hr@cedar.example", "Cedar Analytics").await;

    let (status, value) = post(
        &client,
        "/api/jobs",
        &boss,
        json!({ "title": "Analyst", "description": "  ", "location": "Beirut" }),
    )
    .await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(value["error"], "Job description is required");
}

#[rocket::async_test]
async fn apply_and_review_flow() {
    let client = client().await;
    let grad = graduate(&client, "amal@example.com").await;
    let boss = employer(&client, "hr@cedar.example", "Cedar Analytics").await;
    let job_id = post_job(&client, &boss, "Junior Data Analyst").await;
    post_job(&client, &boss, "Marketing Intern").await;

    // Listing and search
    let (status, value) = get(&client, "/api/jobs?search=ANALYST&location=beirut", &grad).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["total"], 1);
    let card = &value["data"]["jobs"][0];
    assert_eq!(card["company_name"], "Cedar Analytics");
    assert_eq!(card["requirements"].as_array().unwrap().len(), 3);
    assert_eq!(card["more_requirements"], 1);
    assert!(card.get("salary_range").map_or(true, Value::is_null));

    let (_, value) = get(&client, "/api/jobs?location=Tripoli", &grad).await;
    assert_eq!(value["data"]["total"], 0);

    // Detail and apply
    let detail_uri = format!("/api/jobs/{}", job_id);
    let (_, value) = get(&client, &detail_uri, &grad).await;
    assert_eq!(value["data"]["can_apply"], true);

    let apply_uri = format!("/api/jobs/{}/apply", job_id);
    let (status, value) = post(
        &client,
        &apply_uri,
        &grad,
        json!({ "cover_letter": "I build dashboards for fun" }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", value);
    assert_eq!(value["data"]["status"], "pending");

    let (status, _) = post(&client, &apply_uri, &grad, json!({})).await;
    assert_eq!(status, Status::Conflict);

    let (_, value) = get(&client, &detail_uri, &grad).await;
    assert_eq!(value["data"]["can_apply"], false);
    assert_eq!(value["data"]["already_applied"], true);

    // Graduate dashboard
    let (status, value) = get(&client, "/api/dashboard/graduate", &grad).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["counts"]["total"], 1);
    assert_eq!(value["data"]["counts"]["pending"], 1);
    assert_eq!(
        value["data"]["applications"][0]["job"]["employer"]["company_name"],
        "Cedar Analytics"
    );

    // Employer side
    let (_, value) = get(&client, "/api/dashboard/employer", &boss).await;
    assert_eq!(value["data"]["total_jobs"], 2);
    assert_eq!(value["data"]["open_jobs"], 2);
    assert_eq!(value["data"]["total_applications"], 1);
    assert_eq!(value["data"]["pending_applications"], 1);

    let (status, value) = get(&client, &format!("/api/jobs/{}/applications", job_id), &boss).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["counts"]["total"], 1);
    let review = &value["data"]["applications"][0];
    assert_eq!(review["application"]["graduate"]["full_name"], "Amal Haddad");
    assert_eq!(
        review["allowed_actions"],
        json!(["reviewed", "accepted", "rejected"])
    );
    let application_id = review["application"]["id"].as_str().unwrap().to_string();

    // Status moves
    let status_uri = format!("/api/applications/{}/status", application_id);
    let (status, value) = patch(&client, &status_uri, &boss, json!({ "status": "reviewed" })).await;
    assert_eq!(status, Status::Ok, "{}", value);
    assert_eq!(value["data"]["allowed_actions"], json!(["accepted", "rejected"]));

    let (status, _) = patch(&client, &status_uri, &boss, json!({ "status": "pending" })).await;
    assert_eq!(status, Status::Conflict);

    let (status, _) = patch(&client, &status_uri, &boss, json!({ "status": "accepted" })).await;
    assert_eq!(status, Status::Ok);

    let (_, value) = get(&client, "/api/dashboard/graduate", &grad).await;
    assert_eq!(value["data"]["counts"]["accepted"], 1);
}

#[rocket::async_test]
async fn employers_only_manage_their_own_jobs() {
    let client = client().await;
    let grad = graduate(&client, "amal@example.com").await;
    let owner = employer(&client, "hr@cedar.example", "Cedar Analytics").await;
    let rival = employer(&client, "jobs@pine.example", "Pine Labs").await;
    let job_id = post_job(&client, &owner, "Junior Data Analyst").await;

    post(&client, &format!("/api/jobs/{}/apply", job_id), &grad, json!({})).await;
    let (_, value) = get(&client, &format!("/api/jobs/{}/applications", job_id), &owner).await;
    let application_id = value["data"]["applications"][0]["application"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, value) = get(&client, &format!("/api/jobs/{}/applications", job_id), &rival).await;
    assert_eq!(status, Status::Forbidden);
    assert_eq!(value["error_code"], "FORBIDDEN");

    let (status, _) = patch(
        &client,
        &format!("/api/jobs/{}/status", job_id),
        &rival,
        json!({ "status": "closed" }),
    )
    .await;
    assert_eq!(status, Status::Forbidden);

    let (status, _) = patch(
        &client,
        &format!("/api/applications/{}/status", application_id),
        &rival,
        json!({ "status": "rejected" }),
    )
    .await;
    assert_eq!(status, Status::Forbidden);
}

#[rocket::async_test]
async fn closed_jobs_stop_taking_applications() {
    let client = client().await;
    let grad = graduate(&client, "amal@example.com").await;
    let boss = employer(&client, "hr@cedar.example", "Cedar Analytics").await;
    let job_id = post_job(&client, &boss, "Junior Data Analyst").await;

    let (status, value) = patch(
        &client,
        &format!("/api/jobs/{}/status", job_id),
        &boss,
        json!({ "status": "closed" }),
    )
    .await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["status"], "closed");

    let (_, value) = get(&client, "/api/jobs", &grad).await;
    assert_eq!(value["data"]["total"], 0);

    let (status, _) = post(&client, &format!("/api/jobs/{}/apply", job_id), &grad, json!({})).await;
    assert_eq!(status, Status::Conflict);

    let (status, _) = get(&client, &format!("/api/jobs/{}", job_id), &grad).await;
    assert_eq!(status, Status::NotFound);
    let (status, _) = get(&client, &format!("/api/jobs/{}", job_id), &boss).await;
    assert_eq!(status, Status::Ok);
}

#[rocket::async_test]
async fn profile_can_be_edited() {
    let client = client().await;
    let grad = graduate(&client, "amal@example.com").await;

    let (status, value) = patch(
        &client,
        "/api/profile",
        &grad,
        json!({ "bio": "Statistics graduate", "skills": ["R", "Python"] }),
    )
    .await;
    assert_eq!(status, Status::Ok, "{}", value);

    let (_, value) = get(&client, "/api/profile", &grad).await;
    assert_eq!(value["data"]["bio"], "Statistics graduate");
    assert_eq!(value["data"]["skills"], json!(["R", "Python"]));
    assert_eq!(value["data"]["location"], "Beirut");
}

#[rocket::async_test]
async fn cookie_session_round_trip() {
    let client = Client::tracked(rocket().await)
        .await
        .expect("valid rocket instance");

    let response = client
        .post("/api/auth/signup")
        .header(ContentType::JSON)
        .body(
            json!({
                "email": "omar@example.com",
                "password": "graduate-pass",
                "full_name": "Omar Saleh",
                "user_type": "graduate"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let (status, value) = body(client.get("/api/me").dispatch().await).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(value["data"]["profile"]["email"], "omar@example.com");

    let (status, _) = body(client.post("/api/auth/signout").dispatch().await).await;
    assert_eq!(status, Status::Ok);

    let (status, _) = body(client.get("/api/me").dispatch().await).await;
    assert_eq!(status, Status::Unauthorized);
}

#[rocket::async_test]
async fn second_application_is_refused_before_reaching_the_store() {
    let verifier = verifier();
    let store = Arc::new(CountingBackend {
        inner: local_store(&verifier).await,
        application_inserts: AtomicUsize::new(0),
    });
    let client = Client::untracked(rocket_with(store.clone(), verifier))
        .await
        .expect("valid rocket instance");

    let grad = graduate(&client, "amal@example.com").await;
    let boss = employer(&client, "hr@cedar.example", "Cedar Analytics").await;
    let job_id = post_job(&client, &boss, "Junior Data Analyst").await;
    let apply_uri = format!("/api/jobs/{}/apply", job_id);

    let (status, value) = post(&client, &apply_uri, &grad, json!({})).await;
    assert_eq!(status, Status::Ok, "{}", value);

    let again = json!({ "cover_letter": "Again" });
    let (status, value) = post(&client, &apply_uri, &grad, again).await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(value["error"], "You have already applied to this job");
    assert_eq!(store.application_inserts.load(Ordering::SeqCst), 1);
}
