//! Routes logical paths to the backend, the override cache or the mock store.
//!
//! Reads prefer the backend when a session token exists, then the locally
//! saved override, then mock seed data. Writes prefer the backend and fall
//! back to the mock store; either way the post-mutation collection is
//! written to the override cache.

use chrono::{Datelike, Local, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::api_types::{id_string, ApiAuthResponse, ApiLoginRequest};
use super::client::{Backend, BackendError, HttpMethod};
use super::mock::{MockData, MockStore};
use super::policy_buddy;
use super::remote::Remote;
use super::types::{
  Announcement, AnnouncementList, Decision, HrIdentity, HrSummary, Intern, InternStatus, Invoice,
  InvoiceRequest, Leave, LeaveDecision, LeaveRequest, LeaveStatus, NewIntern, PolicyAnswer,
  PolicyBundle, PolicyQuestion, Profile, ProfileUpdate, SummaryCounts,
};
use crate::cache::{KvStore, OverrideCache, Sourced, StorageKey};
use crate::calc;
use crate::routes::{self, Method, Route};
use crate::session::{AuthSession, Identity, Role};

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("unknown {method} path: {path}{hint}")]
  UnknownPath {
    method: Method,
    path: String,
    hint: String,
  },
  #[error("invalid body for {path}: {message}")]
  InvalidBody {
    path: &'static str,
    message: String,
  },
  #[error("{0}")]
  NotFound(String),
  #[error("failed to encode response: {0}")]
  Encode(#[source] serde_json::Error),
  #[error(transparent)]
  Backend(#[from] BackendError),
}

impl ApiError {
  fn unknown_path(method: Method, path: &str) -> Self {
    let suggestions: Vec<&str> = routes::get_suggestions(path)
      .into_iter()
      .filter(|r| r.supports(method))
      .take(3)
      .map(|r| r.path)
      .collect();
    let hint = if suggestions.is_empty() || path.trim().is_empty() {
      String::new()
    } else {
      format!(" (did you mean {}?)", suggestions.join(", "))
    };

    ApiError::UnknownPath {
      method,
      path: path.to_string(),
      hint,
    }
  }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(ApiError::Encode)
}

fn parse_body<T: DeserializeOwned>(route: Route, body: Value) -> Result<T, ApiError> {
  serde_json::from_value(body).map_err(|e| ApiError::InvalidBody {
    path: route.path(),
    message: e.to_string(),
  })
}

/// Invoice periods are calendar months; anything else is rejected before
/// it reaches the calculators.
fn parse_invoice_request(route: Route, body: Value) -> Result<InvoiceRequest, ApiError> {
  let request: InvoiceRequest = parse_body(route, body)?;
  if !(1..=12).contains(&request.month) {
    return Err(ApiError::InvalidBody {
      path: route.path(),
      message: format!("month must be 1-12, got {}", request.month),
    });
  }
  Ok(request)
}

/// Seed data with every persisted override laid on top, so local
/// mutations continue from what the previous session saved.
fn hydrate<S: KvStore>(mut data: MockData, cache: &OverrideCache<S>) -> MockData {
  if let Some(profile) = cache.get::<Profile>(StorageKey::Profile) {
    data.profile = profile;
  }
  if let Some(all) = cache.get::<Vec<Leave>>(StorageKey::HrLeaves) {
    data.leaves = all;
  }
  if let Some(own) = cache.get::<Vec<Leave>>(StorageKey::Leaves) {
    let intern_id = data.profile.id.clone();
    data.leaves.retain(|l| l.intern_id != intern_id);
    let own = own.into_iter().map(|mut l| {
      if l.intern_id.is_empty() {
        l.intern_id = intern_id.clone();
      }
      l
    });
    data.leaves.splice(0..0, own);
  }
  if let Some(announcements) = cache.get(StorageKey::Announcements) {
    data.announcements = announcements;
  }
  if let Some(interns) = cache.get(StorageKey::Interns) {
    data.interns = interns;
  }
  if let Some(policies) = cache.get(StorageKey::Policies) {
    data.policies = policies;
  }
  if let Some(invoices) = cache.get(StorageKey::Invoices) {
    data.invoices = invoices;
  }
  if let Some(invoices) = cache.get(StorageKey::HrInvoices) {
    data.hr_invoices = invoices;
  }
  data
}

pub struct ApiRouter<B: Backend, S: KvStore> {
  backend: Arc<B>,
  cache: OverrideCache<S>,
  mock: MockStore,
}

impl<B: Backend, S: KvStore> ApiRouter<B, S> {
  /// Build a router whose mock store starts from the seed plus any
  /// overrides already in `cache`.
  pub fn new(backend: B, cache: OverrideCache<S>) -> Self {
    let mock = MockStore::new(hydrate(MockData::seed(), &cache));
    Self::with_mock(backend, cache, mock)
  }

  pub fn with_mock(backend: B, cache: OverrideCache<S>, mock: MockStore) -> Self {
    Self {
      backend: Arc::new(backend),
      cache,
      mock,
    }
  }

  pub fn backend(&self) -> &B {
    &self.backend
  }

  pub fn cache(&self) -> &OverrideCache<S> {
    &self.cache
  }

  pub fn is_authenticated(&self) -> bool {
    self.cache.token().is_some()
  }

  // ==========================================================================
  // Path dispatch
  // ==========================================================================

  fn resolve(method: Method, path: &str) -> Result<Route, ApiError> {
    match routes::find(path) {
      Some(info) if info.supports(method) => Ok(info.route),
      _ => Err(ApiError::unknown_path(method, path)),
    }
  }

  pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
    match Self::resolve(Method::Get, path)? {
      Route::InternProfile => to_json(self.profile().await.data),
      Route::InternLeaves => to_json(self.leaves().await.data),
      Route::InternAnnouncements | Route::HrAnnouncements => {
        to_json(self.announcements().await.data)
      }
      Route::InternInvoices => to_json(self.invoices().await.data),
      Route::HrSummary => to_json(self.hr_summary().await),
      Route::HrInterns => to_json(self.interns().await.data),
      Route::HrLeaves => to_json(self.hr_leaves().await.data),
      Route::HrInvoices => to_json(self.hr_invoices().await.data),
      Route::HrPolicies => to_json(self.policies().await.data),
      Route::HrLeaveDecision | Route::PolicyBuddy => Err(ApiError::unknown_path(Method::Get, path)),
    }
  }

  pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
    let route = Self::resolve(Method::Post, path)?;
    match route {
      Route::InternProfile => to_json(self.save_profile(parse_body(route, body)?).await),
      Route::InternLeaves => to_json(self.request_leave(parse_body(route, body)?).await),
      Route::InternInvoices => {
        let request = parse_invoice_request(route, body)?;
        to_json(self.generate_invoice(request.month, request.year).await)
      }
      Route::HrInterns => to_json(self.create_intern(parse_body(route, body)?).await?),
      Route::HrLeaveDecision => {
        let decision: LeaveDecision = parse_body(route, body)?;
        to_json(self.decide_leave(&decision.id, decision.decision).await)
      }
      Route::HrInvoices => {
        let request = parse_invoice_request(route, body)?;
        to_json(self.generate_hr_invoice(request).await?)
      }
      Route::HrPolicies => to_json(self.save_policies(parse_body(route, body)?).await),
      Route::HrAnnouncements => {
        let list: AnnouncementList = parse_body(route, body)?;
        to_json(self.save_announcements(list.announcements).await)
      }
      Route::PolicyBuddy => {
        let question: PolicyQuestion = parse_body(route, body)?;
        to_json(self.ask_policy_buddy(&question.question).await)
      }
      Route::InternAnnouncements | Route::HrSummary | Route::HrLeaves => {
        Err(ApiError::unknown_path(Method::Post, path))
      }
    }
  }

  // ==========================================================================
  // Fallback plumbing
  // ==========================================================================

  /// Run `op` against the backend when a session token exists.
  ///
  /// `None` means "use local data": either there is no session or the call
  /// failed (logged).
  async fn try_remote<T, F, Fut>(&self, what: &'static str, op: F) -> Option<T>
  where
    F: FnOnce(Remote<B>) -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
  {
    let token = self.cache.token()?;
    match op(Remote::new(Arc::clone(&self.backend), token)).await {
      Ok(value) => Some(value),
      Err(e) => {
        warn!(what, error = %e, "backend call failed, using local data");
        None
      }
    }
  }

  /// Backend, then override, then mock seed.
  async fn read_through<T, F, Fut, M>(&self, key: StorageKey, what: &'static str, op: F, seed: M) -> Sourced<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(Remote<B>) -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
    M: Future<Output = T>,
  {
    if let Some(data) = self.try_remote(what, op).await {
      self.cache.set(key, &data);
      return Sourced::backend(data);
    }

    if let Some(data) = self.cache.get(key) {
      return Sourced::cached(data);
    }

    Sourced::mock(seed.await)
  }

  async fn local_intern_id(&self) -> String {
    self.mock.profile().await.id
  }

  // ==========================================================================
  // Intern
  // ==========================================================================

  pub async fn profile(&self) -> Sourced<Profile> {
    self
      .read_through(
        StorageKey::Profile,
        "profile",
        |r| async move { r.profile().await },
        self.mock.profile(),
      )
      .await
  }

  pub async fn save_profile(&self, update: ProfileUpdate) -> Profile {
    let remote_update = update.clone();
    if let Some(saved) = self
      .try_remote("save profile", |r| async move {
        r.save_profile(&remote_update).await
      })
      .await
    {
      self.cache.set(StorageKey::Profile, &saved);
      return saved;
    }

    let (saved, refused) = self.mock.save_profile(update).await;
    if !refused.is_empty() {
      warn!(fields = ?refused, "ignored updates to locked profile fields");
    }
    self.cache.set(StorageKey::Profile, &saved);
    saved
  }

  pub async fn leaves(&self) -> Sourced<Vec<Leave>> {
    self
      .read_through(
        StorageKey::Leaves,
        "leaves",
        |r| async move { r.my_leaves().await },
        async {
          let intern_id = self.local_intern_id().await;
          self.mock.leaves_for(&intern_id).await
        },
      )
      .await
  }

  /// Create a leave request and cache the full post-mutation list.
  pub async fn request_leave(&self, request: LeaveRequest) -> Leave {
    let remote_request = request.clone();
    if let Some((created, all)) = self
      .try_remote("request leave", |r| async move {
        let created = r.apply_leave(&remote_request).await?;
        let all = r.my_leaves().await?;
        Ok::<_, BackendError>((created, all))
      })
      .await
    {
      self.cache.set(StorageKey::Leaves, &all);
      return created;
    }

    let intern_id = self.local_intern_id().await;
    let created = self.mock.request_leave(&intern_id, request).await;
    let all = self.mock.leaves_for(&intern_id).await;
    self.cache.set(StorageKey::Leaves, &all);
    info!(id = %created.id, "leave requested locally");
    created
  }

  pub async fn announcements(&self) -> Sourced<Vec<Announcement>> {
    self
      .read_through(
        StorageKey::Announcements,
        "announcements",
        |r| async move { r.announcements().await },
        self.mock.announcements(),
      )
      .await
  }

  pub async fn invoices(&self) -> Sourced<Vec<Invoice>> {
    self
      .read_through(
        StorageKey::Invoices,
        "invoices",
        |r| async move { r.my_invoices().await },
        self.mock.invoices(),
      )
      .await
  }

  /// Generate an invoice for the signed-in intern.
  ///
  /// Profile and leaves are fetched concurrently, then the invoice is
  /// computed and prepended to the history. Calling this twice for the same
  /// period yields two entries.
  pub async fn generate_invoice(&self, month: u32, year: i32) -> Invoice {
    let (profile, leaves) = tokio::join!(self.profile(), self.leaves());
    let invoice = calc::generate_invoice(&profile.data, &leaves.data, month, year, Utc::now());

    let mut history = self.invoices().await.data;
    history.insert(0, invoice.clone());
    self.mock.record_invoice(invoice.clone()).await;
    self.cache.set(StorageKey::Invoices, &history);

    info!(number = %invoice.invoice_number, final_stipend = invoice.final_stipend, "invoice generated");
    invoice
  }

  pub async fn ask_policy_buddy(&self, question: &str) -> PolicyAnswer {
    let remote_question = question.to_string();
    if let Some(answer) = self
      .try_remote("policy buddy", |r| async move {
        r.ask_policy_buddy(&remote_question).await
      })
      .await
    {
      return answer;
    }

    let policies = self.policies().await.data;
    policy_buddy::answer(question, &policies)
  }

  // ==========================================================================
  // HR
  // ==========================================================================

  pub async fn interns(&self) -> Sourced<Vec<Intern>> {
    self
      .read_through(
        StorageKey::Interns,
        "interns",
        |r| async move { r.interns().await },
        self.mock.interns(),
      )
      .await
  }

  /// Onboard an intern. After a backend onboarding the directory is re-read
  /// and the new entry looked up by email; if it is missing there is no id
  /// to address it by, so that is an error.
  pub async fn create_intern(&self, new: NewIntern) -> Result<Intern, ApiError> {
    let remote_new = new.clone();
    if let Some(all) = self
      .try_remote("onboard intern", |r| async move {
        r.onboard(&remote_new).await?;
        r.interns().await
      })
      .await
    {
      self.cache.set(StorageKey::Interns, &all);
      let email = new.email.to_lowercase();
      return all
        .into_iter()
        .find(|i| i.email.to_lowercase() == email)
        .ok_or_else(|| {
          warn!(email = %new.email, "onboarded intern missing from directory");
          ApiError::NotFound(format!(
            "{} was onboarded but is not in the intern directory",
            new.email
          ))
        });
    }

    let created = self.mock.create_intern(new).await;
    self.cache.set(StorageKey::Interns, &self.mock.interns().await);
    Ok(created)
  }

  pub async fn hr_leaves(&self) -> Sourced<Vec<Leave>> {
    self
      .read_through(
        StorageKey::HrLeaves,
        "hr leaves",
        |r| async move { r.pending_leaves().await },
        self.mock.all_leaves(),
      )
      .await
  }

  /// Approve or reject a pending leave.
  ///
  /// Unknown or already-decided ids resolve to `None` and leave every store
  /// untouched.
  pub async fn decide_leave(&self, id: &str, decision: Decision) -> Option<Leave> {
    let remote_id = id.to_string();
    if let Some((decided, pending)) = self
      .try_remote("decide leave", |r| async move {
        let decided = r.decide_leave(&remote_id, decision).await?;
        let pending = r.pending_leaves().await?;
        Ok::<_, BackendError>((decided, pending))
      })
      .await
    {
      self.cache.set(StorageKey::HrLeaves, &pending);
      return decided;
    }

    let decided = self.mock.decide_leave(id, decision).await?;
    info!(id = %decided.id, status = ?decided.status, "leave decided locally");

    self.cache.set(StorageKey::HrLeaves, &self.mock.all_leaves().await);
    let intern_id = self.local_intern_id().await;
    if decided.intern_id == intern_id {
      self
        .cache
        .set(StorageKey::Leaves, &self.mock.leaves_for(&intern_id).await);
    }
    Some(decided)
  }

  pub async fn hr_invoices(&self) -> Sourced<Vec<Invoice>> {
    self
      .read_through(
        StorageKey::HrInvoices,
        "hr invoices",
        |r| async move { r.all_invoices().await },
        self.mock.hr_invoices(),
      )
      .await
  }

  /// Generate an invoice for any intern. Without `internId` the first
  /// intern in the directory is used.
  pub async fn generate_hr_invoice(&self, request: InvoiceRequest) -> Result<Invoice, ApiError> {
    let (interns, leaves) = tokio::join!(self.interns(), self.hr_leaves());

    let intern = match request.intern_id.as_deref() {
      Some(id) => interns.data.into_iter().find(|i| i.id == id),
      None => interns.data.into_iter().next(),
    }
    .ok_or_else(|| match &request.intern_id {
      Some(id) => ApiError::NotFound(format!("no intern {} in the directory", id)),
      None => ApiError::NotFound("the intern directory is empty".to_string()),
    })?;

    let own: Vec<Leave> = leaves
      .data
      .into_iter()
      .filter(|l| l.intern_id == intern.id)
      .collect();
    let profile = Profile::from(intern);
    let invoice = calc::generate_invoice(&profile, &own, request.month, request.year, Utc::now());

    let mut history = self.hr_invoices().await.data;
    history.insert(0, invoice.clone());
    self.mock.record_hr_invoice(invoice.clone()).await;
    self.cache.set(StorageKey::HrInvoices, &history);

    info!(number = %invoice.invoice_number, intern = %profile.name, "hr invoice generated");
    Ok(invoice)
  }

  pub async fn policies(&self) -> Sourced<PolicyBundle> {
    self
      .read_through(
        StorageKey::Policies,
        "policies",
        |r| async move { r.policies().await },
        self.mock.policies(),
      )
      .await
  }

  pub async fn save_policies(&self, bundle: PolicyBundle) -> PolicyBundle {
    let remote_bundle = bundle.clone();
    let saved = match self
      .try_remote("save policies", |r| async move {
        r.save_policies(&remote_bundle).await
      })
      .await
    {
      Some(saved) => saved,
      None => self.mock.save_policies(bundle).await,
    };
    self.cache.set(StorageKey::Policies, &saved);
    saved
  }

  /// Save the full announcement list.
  ///
  /// The backend only supports creation, so entries without an id are
  /// posted concurrently and the list is re-read. The mock store replaces
  /// the list wholesale.
  pub async fn save_announcements(&self, announcements: Vec<Announcement>) -> Vec<Announcement> {
    let new_items: Vec<Announcement> = announcements
      .iter()
      .filter(|a| a.id.is_empty())
      .cloned()
      .collect();
    if let Some(all) = self
      .try_remote("save announcements", |r| async move {
        futures::future::try_join_all(new_items.iter().map(|item| r.create_announcement(item)))
          .await?;
        r.announcements().await
      })
      .await
    {
      self.cache.set(StorageKey::Announcements, &all);
      return all;
    }

    let saved = self.mock.replace_announcements(announcements).await;
    self.cache.set(StorageKey::Announcements, &saved);
    saved
  }

  pub async fn hr_summary(&self) -> HrSummary {
    let (interns, leaves, invoices) =
      tokio::join!(self.interns(), self.hr_leaves(), self.hr_invoices());
    let today = Local::now().date_naive();

    let counts = SummaryCounts {
      active_interns: interns
        .data
        .iter()
        .filter(|i| i.status == InternStatus::Active)
        .count(),
      pending_leaves: leaves
        .data
        .iter()
        .filter(|l| l.status == LeaveStatus::Pending)
        .count(),
      invoices_this_month: invoices
        .data
        .iter()
        .filter(|inv| inv.month == today.month() && inv.year == today.year())
        .count(),
    };

    let name = self
      .cache
      .current_hr()
      .map(|hr| hr.name)
      .filter(|name| !name.is_empty())
      .unwrap_or_else(|| "HR Admin".to_string());

    HrSummary {
      hr: HrIdentity { name },
      counts,
      activity: self.mock.activity().await,
    }
  }

  // ==========================================================================
  // Session
  // ==========================================================================

  /// Sign in against the backend.
  ///
  /// Interns fall back to a directory lookup by email when the backend
  /// rejects them or cannot be reached; HR sign-in has no fallback.
  pub async fn login(&self, role: Role, email: &str, password: &str) -> Result<Identity, ApiError> {
    let email = email.trim().to_lowercase();
    let body = serde_json::to_value(ApiLoginRequest {
      email: &email,
      password,
    })
    .map_err(ApiError::Encode)?;

    let auth = match self
      .backend
      .request(HttpMethod::Post, role.login_path(), None, Some(body))
      .await
    {
      Ok(value) => serde_json::from_value::<ApiAuthResponse>(value).map_err(BackendError::from),
      Err(e) => Err(e),
    };

    match auth {
      Ok(auth) => {
        let session = AuthSession {
          token: auth.token,
          user_id: id_string(&auth.user_id),
          name: auth.name,
          email: auth.email.or_else(|| Some(email.clone())),
          role: auth.role,
        };
        self.cache.set_auth_session(&session);

        let identity = Identity {
          id: session.user_id.clone(),
          name: session.name.clone().unwrap_or_else(|| match role {
            Role::Intern => "Intern".to_string(),
            Role::Hr => "HR Manager".to_string(),
          }),
          email: session.email.clone().unwrap_or_default(),
          role: session.role.clone(),
        };
        match role {
          Role::Intern => self.cache.set_current_intern(&identity),
          Role::Hr => self.cache.set_current_hr(&identity),
        }
        info!(role = ?role, email = %identity.email, "signed in");
        Ok(identity)
      }
      Err(e) if role == Role::Intern => {
        warn!(error = %e, "backend intern login failed, checking local directory");
        let interns = self.interns().await.data;
        let intern = interns
          .into_iter()
          .find(|i| i.email.to_lowercase() == email)
          .ok_or_else(|| {
            ApiError::NotFound(format!(
              "{} is not onboarded yet or the credentials are invalid",
              email
            ))
          })?;

        let identity = Identity {
          id: intern.id,
          name: intern.name,
          email: intern.email,
          role: intern.role,
        };
        self.cache.set_current_intern(&identity);
        Ok(identity)
      }
      Err(e) => Err(e.into()),
    }
  }

  pub fn logout(&self) {
    self.cache.clear_session();
  }
}
