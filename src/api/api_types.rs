//! Serde types matching backend responses.
//!
//! These types are separate from the canonical records so field renames and
//! enum translation live in one place.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{
  Intern, InternStatus, Invoice, InvoiceStatus, Leave, LeaveRequest, LeaveStatus, LeaveType,
  NewIntern, Profile, ProfileUpdate,
};
use crate::calc::{parse_date, INVOICE_NUMBER_SENTINEL};

/// Backend ids arrive as numbers or strings.
pub fn id_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Keep only the last four characters, as shown in the UI.
fn last4(value: &str) -> String {
  let chars: Vec<char> = value.chars().collect();
  chars[chars.len().saturating_sub(4)..].iter().collect()
}

fn mask_aadhaar(value: &str) -> String {
  format!("XXXX-XXXX-{}", last4(value))
}

/// RFC 3339, or a zone-less `LocalDateTime` taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(value)
    .map(|dt| dt.with_timezone(&Utc))
    .ok()
    .or_else(|| {
      NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
    })
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub email: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAuthResponse {
  pub token: String,
  #[serde(default)]
  pub user_id: Value,
  pub name: Option<String>,
  pub email: Option<String>,
  pub role: Option<String>,
}

// ============================================================================
// Interns
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiUser {
  pub name: Option<String>,
  pub email: Option<String>,
}

/// `InternDetails` as returned by `/interns/all` and `/interns/me`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiInternDetails {
  pub id: Value,
  pub user: Option<ApiUser>,
  pub joining_date: Option<String>,
  pub internship_end_date: Option<String>,
  pub stipend_amount: Option<f64>,
  pub pan_number: Option<String>,
  pub aadhaar_number: Option<String>,
  pub bank_account_number: Option<String>,
  pub bank_ifsc_code: Option<String>,
  pub bank_name: Option<String>,
  pub address: Option<String>,
  pub phone_number: Option<String>,
  pub kyc_verified: Option<bool>,
}

impl ApiInternDetails {
  fn user_name(&self) -> String {
    self
      .user
      .as_ref()
      .and_then(|u| u.name.clone())
      .unwrap_or_else(|| "Intern".to_string())
  }

  fn user_email(&self) -> String {
    self
      .user
      .as_ref()
      .and_then(|u| u.email.clone())
      .unwrap_or_default()
  }

  /// End date falls back to the joining date when the backend omits it.
  fn end_date(&self) -> Option<String> {
    self
      .internship_end_date
      .clone()
      .or_else(|| self.joining_date.clone())
  }

  pub fn into_intern(self) -> Intern {
    Intern {
      id: id_string(&self.id),
      name: self.user_name(),
      email: self.user_email(),
      role: Some("Intern".to_string()),
      manager: None,
      internship_start: self.joining_date.clone(),
      internship_end: self.end_date(),
      stipend_per_month: self.stipend_amount,
      status: InternStatus::Active,
    }
  }

  pub fn into_profile(self) -> Profile {
    Profile {
      id: id_string(&self.id),
      name: self.user_name(),
      email: self.user_email(),
      role: Some("Intern".to_string()),
      manager: None,
      internship_start: self.joining_date.clone(),
      internship_end: self.end_date(),
      stipend_per_month: self.stipend_amount,
      pan: self.pan_number,
      aadhaar_masked: self.aadhaar_number.as_deref().map(mask_aadhaar),
      bank_account_last4: self.bank_account_number.as_deref().map(last4),
      bank_ifsc: self.bank_ifsc_code,
      bank_name: self.bank_name,
      address: self.address,
      phone: self.phone_number,
      kyc_verified: self.kyc_verified.unwrap_or(false),
    }
  }
}

/// Fields an intern may send to `PUT /interns/me`.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pan_number: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_ifsc_code: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone_number: Option<String>,
}

impl From<&ProfileUpdate> for ApiProfileUpdate {
  fn from(update: &ProfileUpdate) -> Self {
    Self {
      name: update.name.clone(),
      pan_number: update.pan.clone(),
      bank_ifsc_code: update.bank_ifsc.clone(),
      bank_name: update.bank_name.clone(),
      address: update.address.clone(),
      phone_number: update.phone.clone(),
    }
  }
}

/// Body of `POST /interns/onboard`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOnboardRequest {
  pub email: String,
  pub password: String,
  pub name: String,
  pub joining_date: String,
  pub internship_duration_months: u32,
  pub stipend_type: &'static str,
  pub stipend_amount: f64,
}

impl From<&NewIntern> for ApiOnboardRequest {
  fn from(intern: &NewIntern) -> Self {
    Self {
      email: intern.email.clone(),
      password: intern.password.clone().unwrap_or_default(),
      name: intern.name.clone(),
      joining_date: intern.internship_start.clone().unwrap_or_default(),
      internship_duration_months: intern.duration_months.unwrap_or(6),
      stipend_type: "MONTHLY",
      stipend_amount: intern.stipend_per_month.unwrap_or(0.0),
    }
  }
}

// ============================================================================
// Leaves
// ============================================================================

/// `LeaveResponse` from the leave endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiLeave {
  pub id: Value,
  pub leave_date: String,
  pub leave_type: Option<LeaveType>,
  pub reason: Option<String>,
  pub status: Option<String>,
  pub intern_id: Value,
  pub intern_name: Option<String>,
}

impl ApiLeave {
  pub fn into_leave(self) -> Leave {
    Leave {
      id: id_string(&self.id),
      date: self.leave_date,
      leave_type: self.leave_type.unwrap_or_default(),
      status: self
        .status
        .as_deref()
        .map(LeaveStatus::from_backend)
        .unwrap_or_default(),
      reason: self.reason.unwrap_or_default(),
      intern_id: id_string(&self.intern_id),
      intern_name: self.intern_name.or_else(|| Some("Intern".to_string())),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLeaveRequest<'a> {
  pub leave_date: &'a str,
  pub leave_type: LeaveType,
  pub reason: &'a str,
}

impl<'a> From<&'a LeaveRequest> for ApiLeaveRequest<'a> {
  fn from(request: &'a LeaveRequest) -> Self {
    Self {
      leave_date: &request.date,
      leave_type: request.leave_type,
      reason: &request.reason,
    }
  }
}

// ============================================================================
// Invoices
// ============================================================================

/// Invoice as stored by the backend.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiInvoice {
  pub invoice_number: Option<String>,
  pub intern_id: Value,
  pub intern_name: Option<String>,
  pub intern_email: Option<String>,
  pub billing_period_from: Option<String>,
  pub invoice_date: Option<String>,
  pub working_days: Option<u32>,
  pub paid_leaves: Option<u32>,
  pub unpaid_leaves: Option<u32>,
  pub base_stipend: Option<f64>,
  pub unpaid_deduction: Option<f64>,
  pub stipend_amount: Option<f64>,
  pub status: Option<String>,
  pub created_at: Option<String>,
}

impl ApiInvoice {
  pub fn into_invoice(self) -> Invoice {
    let period = self
      .billing_period_from
      .as_deref()
      .or(self.invoice_date.as_deref())
      .and_then(parse_date);
    let intern_id = Some(id_string(&self.intern_id)).filter(|id| !id.is_empty());
    let final_stipend = self.stipend_amount.unwrap_or(0.0);

    Invoice {
      invoice_number: self
        .invoice_number
        .unwrap_or_else(|| INVOICE_NUMBER_SENTINEL.to_string()),
      intern_id,
      intern_name: self.intern_name.or(self.intern_email),
      month: period.map(|d| d.month()).unwrap_or(0),
      year: period.map(|d| d.year()).unwrap_or(0),
      working_days: self.working_days.unwrap_or(0),
      paid_leaves: self.paid_leaves.unwrap_or(0),
      unpaid_leaves: self.unpaid_leaves.unwrap_or(0),
      base_stipend: self.base_stipend.unwrap_or(final_stipend),
      unpaid_deduction: self.unpaid_deduction.unwrap_or(0.0),
      final_stipend,
      status: match self.status.as_deref() {
        Some("PAID") | Some("Paid") => InvoiceStatus::Paid,
        _ => InvoiceStatus::Generated,
      },
      generated_at: self
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now),
    }
  }
}
