//! Canonical records shared by the router, the mock store and the calculators.
//!
//! Field names serialize in camelCase, the shape every consumer of the
//! logical paths sees regardless of which tier answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intern identity and contract terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Option<String>,
  pub manager: Option<String>,
  pub internship_start: Option<String>,
  pub internship_end: Option<String>,
  pub stipend_per_month: Option<f64>,
  pub pan: Option<String>,
  pub aadhaar_masked: Option<String>,
  pub bank_account_last4: Option<String>,
  pub bank_ifsc: Option<String>,
  pub bank_name: Option<String>,
  pub address: Option<String>,
  pub phone: Option<String>,
  pub kyc_verified: bool,
}

/// Partial profile; only provided fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub manager: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub internship_start: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub internship_end: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stipend_per_month: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pan: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub aadhaar_masked: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_account_last4: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_ifsc: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub address: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

/// Assign `value` to `slot` unless the field is locked.
///
/// Returns the field name when the update was refused.
fn assign<T>(
  slot: &mut Option<T>,
  value: Option<T>,
  locked: bool,
  field: &'static str,
) -> Option<&'static str> {
  let value = value?;
  if locked {
    return Some(field);
  }
  *slot = Some(value);
  None
}

impl Profile {
  /// Apply an update coming from the intern themself.
  ///
  /// HR-owned fields may only be filled while still empty. KYC fields are
  /// frozen once HR has verified them. Returns the refused field names.
  pub fn apply_intern_update(&mut self, update: ProfileUpdate) -> Vec<&'static str> {
    let kyc = self.kyc_verified;
    let is_set = |s: &Option<String>| s.as_deref().is_some_and(|v| !v.is_empty());

    let role_set = is_set(&self.role);
    let manager_set = is_set(&self.manager);
    let start_set = is_set(&self.internship_start);
    let end_set = is_set(&self.internship_end);
    let stipend_set = self.stipend_per_month.is_some_and(|s| s > 0.0);

    if let Some(name) = update.name {
      self.name = name;
    }
    if let Some(email) = update.email {
      self.email = email;
    }

    [
      assign(&mut self.role, update.role, role_set, "role"),
      assign(&mut self.manager, update.manager, manager_set, "manager"),
      assign(
        &mut self.internship_start,
        update.internship_start,
        start_set,
        "internshipStart",
      ),
      assign(
        &mut self.internship_end,
        update.internship_end,
        end_set,
        "internshipEnd",
      ),
      assign(
        &mut self.stipend_per_month,
        update.stipend_per_month,
        stipend_set,
        "stipendPerMonth",
      ),
      assign(&mut self.pan, update.pan, kyc, "pan"),
      assign(&mut self.aadhaar_masked, update.aadhaar_masked, kyc, "aadhaarMasked"),
      assign(
        &mut self.bank_account_last4,
        update.bank_account_last4,
        kyc,
        "bankAccountLast4",
      ),
      assign(&mut self.bank_ifsc, update.bank_ifsc, kyc, "bankIfsc"),
      assign(&mut self.bank_name, update.bank_name, kyc, "bankName"),
      assign(&mut self.address, update.address, false, "address"),
      assign(&mut self.phone, update.phone, false, "phone"),
    ]
    .into_iter()
    .flatten()
    .collect()
  }
}

/// Entry in the HR intern directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intern {
  pub id: String,
  pub name: String,
  pub email: String,
  pub role: Option<String>,
  pub manager: Option<String>,
  pub internship_start: Option<String>,
  pub internship_end: Option<String>,
  pub stipend_per_month: Option<f64>,
  pub status: InternStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternStatus {
  #[default]
  Active,
  Completed,
}

impl From<Intern> for Profile {
  fn from(intern: Intern) -> Self {
    Profile {
      id: intern.id,
      name: intern.name,
      email: intern.email,
      role: intern.role,
      manager: intern.manager,
      internship_start: intern.internship_start,
      internship_end: intern.internship_end,
      stipend_per_month: intern.stipend_per_month,
      ..Profile::default()
    }
  }
}

/// HR onboarding request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewIntern {
  pub name: String,
  pub email: String,
  /// Only forwarded to the backend; the mock store never keeps it.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
  pub role: Option<String>,
  pub manager: Option<String>,
  pub internship_start: Option<String>,
  pub internship_end: Option<String>,
  /// Backend onboarding needs a duration; defaults to 6 months.
  pub duration_months: Option<u32>,
  pub stipend_per_month: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaveType {
  #[default]
  Paid,
  Unpaid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl LeaveStatus {
  /// Translate backend enum values. Anything unrecognised is `Pending`.
  pub fn from_backend(value: &str) -> Self {
    match value {
      "APPROVED" => LeaveStatus::Approved,
      "REJECTED" => LeaveStatus::Rejected,
      _ => LeaveStatus::Pending,
    }
  }
}

/// HR decision on a pending leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
  Approved,
  Rejected,
}

impl From<Decision> for LeaveStatus {
  fn from(decision: Decision) -> Self {
    match decision {
      Decision::Approved => LeaveStatus::Approved,
      Decision::Rejected => LeaveStatus::Rejected,
    }
  }
}

/// A single day of leave.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Leave {
  pub id: String,
  pub date: String,
  #[serde(rename = "type")]
  pub leave_type: LeaveType,
  pub status: LeaveStatus,
  pub reason: String,
  pub intern_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub intern_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeaveRequest {
  pub date: String,
  #[serde(rename = "type")]
  pub leave_type: LeaveType,
  pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDecision {
  pub id: String,
  pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
  #[default]
  Generated,
  Paid,
}

/// Monthly stipend statement. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
  pub invoice_number: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub intern_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub intern_name: Option<String>,
  pub month: u32,
  pub year: i32,
  pub working_days: u32,
  pub paid_leaves: u32,
  pub unpaid_leaves: u32,
  pub base_stipend: f64,
  pub unpaid_deduction: f64,
  pub final_stipend: f64,
  #[serde(default)]
  pub status: InvoiceStatus,
  pub generated_at: DateTime<Utc>,
}

/// Body of `/intern/invoices` and `/hr/invoices` POSTs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
  #[serde(default)]
  pub intern_id: Option<String>,
  pub month: u32,
  pub year: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Announcement {
  pub id: String,
  pub title: String,
  pub body: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementList {
  #[serde(default)]
  pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faq {
  pub id: String,
  pub question: String,
  pub answer: String,
}

/// Policy statements plus the FAQ knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyBundle {
  pub leaves: String,
  pub stipend: String,
  pub general: String,
  pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyQuestion {
  #[serde(default)]
  pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAnswer {
  pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
  pub active_interns: usize,
  pub pending_leaves: usize,
  pub invoices_this_month: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrIdentity {
  pub name: String,
}

/// HR dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrSummary {
  pub hr: HrIdentity,
  pub counts: SummaryCounts,
  pub activity: Vec<ActivityItem>,
}

/// Paid-leave entitlement as of a given day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
  pub entitled: u32,
  pub paid_used: u32,
  pub unpaid: u32,
  pub remaining: u32,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seeded() -> Profile {
    Profile {
      id: "intern-001".into(),
      name: "Demo Intern".into(),
      role: Some("Product Intern".into()),
      internship_start: Some("2025-01-01".into()),
      stipend_per_month: Some(15000.0),
      pan: Some("ABCDE1234F".into()),
      ..Profile::default()
    }
  }

  #[test]
  fn test_intern_cannot_change_hr_owned_fields_once_set() {
    let mut profile = seeded();
    let refused = profile.apply_intern_update(ProfileUpdate {
      role: Some("CEO".into()),
      stipend_per_month: Some(99999.0),
      manager: Some("Mentor Name".into()),
      address: Some("Pune".into()),
      ..ProfileUpdate::default()
    });

    assert_eq!(refused, vec!["role", "stipendPerMonth"]);
    assert_eq!(profile.role.as_deref(), Some("Product Intern"));
    assert_eq!(profile.stipend_per_month, Some(15000.0));
    // Manager was empty, so the intern may fill it in
    assert_eq!(profile.manager.as_deref(), Some("Mentor Name"));
    assert_eq!(profile.address.as_deref(), Some("Pune"));
  }

  #[test]
  fn test_kyc_locks_after_verification() {
    let mut profile = seeded();
    assert!(profile
      .apply_intern_update(ProfileUpdate {
        pan: Some("ZZZZZ9999Z".into()),
        ..ProfileUpdate::default()
      })
      .is_empty());
    assert_eq!(profile.pan.as_deref(), Some("ZZZZZ9999Z"));

    profile.kyc_verified = true;
    let refused = profile.apply_intern_update(ProfileUpdate {
      pan: Some("AAAAA0000A".into()),
      bank_name: Some("Other Bank".into()),
      ..ProfileUpdate::default()
    });
    assert_eq!(refused, vec!["pan", "bankName"]);
    assert_eq!(profile.pan.as_deref(), Some("ZZZZZ9999Z"));
    assert_eq!(profile.bank_name, None);
  }

  #[test]
  fn test_leave_uses_ui_field_names() {
    let leave: Leave = serde_json::from_str(
      r#"{"id":"L-001","date":"2025-01-15","type":"UNPAID","status":"Approved","reason":"Travel"}"#,
    )
    .unwrap();
    assert_eq!(leave.leave_type, LeaveType::Unpaid);
    assert_eq!(leave.status, LeaveStatus::Approved);
    assert_eq!(leave.intern_id, "");

    let json = serde_json::to_value(&leave).unwrap();
    assert_eq!(json["type"], "UNPAID");
    assert_eq!(json["internId"], "");
  }

  #[test]
  fn test_backend_status_translation() {
    assert_eq!(LeaveStatus::from_backend("APPROVED"), LeaveStatus::Approved);
    assert_eq!(LeaveStatus::from_backend("REJECTED"), LeaveStatus::Rejected);
    assert_eq!(LeaveStatus::from_backend("PENDING"), LeaveStatus::Pending);
    assert_eq!(LeaveStatus::from_backend("whatever"), LeaveStatus::Pending);
  }
}
