//! Typed backend endpoints, translated into canonical records.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

use super::api_types::{
  ApiInternDetails, ApiInvoice, ApiLeave, ApiLeaveRequest, ApiOnboardRequest, ApiProfileUpdate,
};
use super::client::{Backend, BackendError, HttpMethod};
use super::types::{
  Announcement, Decision, Intern, Invoice, Leave, LeaveRequest, NewIntern, PolicyAnswer,
  PolicyBundle, Profile, ProfileUpdate,
};

/// Approver name sent with approvals.
const APPROVER: &str = "HR Manager";

/// An authenticated handle on the backend.
pub struct Remote<B: Backend> {
  backend: Arc<B>,
  token: String,
}

impl<B: Backend> Remote<B> {
  pub fn new(backend: Arc<B>, token: String) -> Self {
    Self { backend, token }
  }

  async fn call<T: DeserializeOwned>(
    &self,
    method: HttpMethod,
    path: &str,
    body: Option<Value>,
  ) -> Result<T, BackendError> {
    let value = self
      .backend
      .request(method, path, Some(&self.token), body)
      .await?;
    Ok(serde_json::from_value(value)?)
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
    self.call(HttpMethod::Get, path, None).await
  }

  async fn send<T: DeserializeOwned>(
    &self,
    method: HttpMethod,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T, BackendError> {
    let body = serde_json::to_value(body)?;
    self.call(method, path, Some(body)).await
  }

  // Intern

  pub async fn profile(&self) -> Result<Profile, BackendError> {
    let details: ApiInternDetails = self.get("/interns/me").await?;
    Ok(details.into_profile())
  }

  pub async fn save_profile(&self, update: &ProfileUpdate) -> Result<Profile, BackendError> {
    let details: ApiInternDetails = self
      .send(HttpMethod::Put, "/interns/me", &ApiProfileUpdate::from(update))
      .await?;
    Ok(details.into_profile())
  }

  pub async fn my_leaves(&self) -> Result<Vec<Leave>, BackendError> {
    let leaves: Vec<ApiLeave> = self.get("/leaves/my").await?;
    Ok(leaves.into_iter().map(ApiLeave::into_leave).collect())
  }

  pub async fn apply_leave(&self, request: &LeaveRequest) -> Result<Leave, BackendError> {
    let leave: ApiLeave = self
      .send(HttpMethod::Post, "/leaves/apply", &ApiLeaveRequest::from(request))
      .await?;
    Ok(leave.into_leave())
  }

  pub async fn my_invoices(&self) -> Result<Vec<Invoice>, BackendError> {
    let invoices: Vec<ApiInvoice> = self.get("/invoices/my").await?;
    Ok(invoices.into_iter().map(ApiInvoice::into_invoice).collect())
  }

  pub async fn announcements(&self) -> Result<Vec<Announcement>, BackendError> {
    let announcements: Vec<Announcement> = self.get("/announcements").await?;
    Ok(announcements)
  }

  pub async fn ask_policy_buddy(&self, question: &str) -> Result<PolicyAnswer, BackendError> {
    self
      .send(
        HttpMethod::Post,
        "/ai/policy-buddy",
        &serde_json::json!({ "question": question }),
      )
      .await
  }

  // HR

  pub async fn interns(&self) -> Result<Vec<Intern>, BackendError> {
    let interns: Vec<ApiInternDetails> = self.get("/interns/all").await?;
    Ok(
      interns
        .into_iter()
        .map(ApiInternDetails::into_intern)
        .collect(),
    )
  }

  pub async fn onboard(&self, intern: &NewIntern) -> Result<(), BackendError> {
    let _: Value = self
      .send(HttpMethod::Post, "/interns/onboard", &ApiOnboardRequest::from(intern))
      .await?;
    Ok(())
  }

  pub async fn pending_leaves(&self) -> Result<Vec<Leave>, BackendError> {
    let leaves: Vec<ApiLeave> = self.get("/leaves/pending").await?;
    Ok(leaves.into_iter().map(ApiLeave::into_leave).collect())
  }

  /// The backend may echo the decided leave; an empty reply yields `None`.
  pub async fn decide_leave(&self, id: &str, decision: Decision) -> Result<Option<Leave>, BackendError> {
    let id: String = form_urlencoded::byte_serialize(id.as_bytes()).collect();
    let path = match decision {
      Decision::Approved => {
        let approver: String = form_urlencoded::byte_serialize(APPROVER.as_bytes()).collect();
        format!("/leaves/{}/approve?approvedBy={}", id, approver)
      }
      Decision::Rejected => format!("/leaves/{}/reject", id),
    };
    let value: Value = self.call(HttpMethod::Put, &path, None).await?;
    if !value.is_object() {
      return Ok(None);
    }
    let leave: ApiLeave = serde_json::from_value(value)?;
    Ok(Some(leave.into_leave()))
  }

  pub async fn all_invoices(&self) -> Result<Vec<Invoice>, BackendError> {
    let invoices: Vec<ApiInvoice> = self.get("/invoices/all").await?;
    Ok(invoices.into_iter().map(ApiInvoice::into_invoice).collect())
  }

  pub async fn policies(&self) -> Result<PolicyBundle, BackendError> {
    self.get("/policies").await
  }

  pub async fn save_policies(&self, bundle: &PolicyBundle) -> Result<PolicyBundle, BackendError> {
    self.send(HttpMethod::Put, "/policies", bundle).await
  }

  pub async fn create_announcement(
    &self,
    announcement: &Announcement,
  ) -> Result<Announcement, BackendError> {
    self
      .send(
        HttpMethod::Post,
        "/announcements",
        &serde_json::json!({
          "title": announcement.title,
          "body": announcement.body,
          "tag": announcement.tag,
        }),
      )
      .await
  }
}
