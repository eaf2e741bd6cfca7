//! In-memory stand-in for the backend.
//!
//! The store is an explicit object owned by the router. Every operation is
//! `async` so callers treat it exactly like a remote source.

use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::types::{
  ActivityItem, Announcement, Decision, Faq, Intern, InternStatus, Invoice, Leave, LeaveRequest,
  LeaveStatus, LeaveType, NewIntern, PolicyBundle, Profile, ProfileUpdate,
};

/// Cap on the activity log shown on the HR dashboard.
const ACTIVITY_LIMIT: usize = 20;

pub struct MockData {
  pub profile: Profile,
  pub leaves: Vec<Leave>,
  pub announcements: Vec<Announcement>,
  pub invoices: Vec<Invoice>,
  pub hr_invoices: Vec<Invoice>,
  pub interns: Vec<Intern>,
  pub policies: PolicyBundle,
  pub activity: Vec<ActivityItem>,
}

fn seq_id(prefix: &str, n: usize) -> String {
  format!("{}-{:03}", prefix, n)
}

/// Next id after the highest `<prefix>-<n>` in use. Ids from other sources
/// (backend numbers) are skipped, so gaps never lead to reuse.
fn next_seq_id<'a>(prefix: &str, ids: impl Iterator<Item = &'a str>) -> String {
  let tag = format!("{}-", prefix);
  let max = ids
    .filter_map(|id| id.strip_prefix(tag.as_str()).and_then(|n| n.parse::<usize>().ok()))
    .max()
    .unwrap_or(0);
  seq_id(prefix, max + 1)
}

fn leave(id: &str, intern_id: &str, date: &str, leave_type: LeaveType, status: LeaveStatus, reason: &str) -> Leave {
  Leave {
    id: id.to_string(),
    date: date.to_string(),
    leave_type,
    status,
    reason: reason.to_string(),
    intern_id: intern_id.to_string(),
    intern_name: None,
  }
}

fn announcement(id: &str, title: &str, body: &str, tag: &str) -> Announcement {
  Announcement {
    id: id.to_string(),
    title: title.to_string(),
    body: body.to_string(),
    tag: Some(tag.to_string()),
  }
}

fn intern(id: &str, name: &str, email: &str, role: &str, start: &str, end: &str, stipend: f64) -> Intern {
  Intern {
    id: id.to_string(),
    name: name.to_string(),
    email: email.to_string(),
    role: Some(role.to_string()),
    manager: Some("Mentor Name".to_string()),
    internship_start: Some(start.to_string()),
    internship_end: Some(end.to_string()),
    stipend_per_month: Some(stipend),
    status: InternStatus::Active,
  }
}

impl MockData {
  /// Demo data set.
  pub fn seed() -> Self {
    let profile = Profile {
      id: "intern-001".to_string(),
      name: "Demo Intern".to_string(),
      email: "demo.intern@example.com".to_string(),
      role: Some("Product Intern".to_string()),
      manager: Some("Mentor Name".to_string()),
      internship_start: Some("2025-01-01".to_string()),
      internship_end: Some("2025-06-30".to_string()),
      stipend_per_month: Some(15000.0),
      pan: Some("ABCDE1234F".to_string()),
      aadhaar_masked: Some("XXXX-XXXX-1234".to_string()),
      bank_account_last4: Some("1234".to_string()),
      address: Some("Bangalore, India".to_string()),
      ..Profile::default()
    };

    Self {
      profile,
      leaves: vec![
        leave("L-001", "intern-001", "2025-01-15", LeaveType::Paid, LeaveStatus::Approved, "Family event"),
        leave("L-002", "intern-001", "2025-02-03", LeaveType::Unpaid, LeaveStatus::Approved, "Travel"),
        leave("L-003", "intern-001", "2025-03-10", LeaveType::Paid, LeaveStatus::Pending, "Medical"),
        leave("L-004", "intern-002", "2025-03-12", LeaveType::Unpaid, LeaveStatus::Pending, "University exam"),
      ],
      announcements: vec![
        announcement(
          "A-001",
          "Intern townhall on Friday",
          "Join us at 4 PM for a quick sync and Q&A with mentors.",
          "Event",
        ),
        announcement(
          "A-002",
          "Timesheet reminder",
          "Please update your weekly log by Monday 10 AM.",
          "Reminder",
        ),
        announcement(
          "A-003",
          "Policy update: Leaves",
          "You earn 1 paid leave per month. Unused days carry forward.",
          "Policy",
        ),
      ],
      invoices: Vec::new(),
      hr_invoices: Vec::new(),
      interns: vec![
        intern(
          "intern-001",
          "Demo Intern",
          "demo.intern@example.com",
          "Product Intern",
          "2025-01-01",
          "2025-06-30",
          15000.0,
        ),
        intern(
          "intern-002",
          "Riya Sharma",
          "riya.sharma@example.com",
          "Design Intern",
          "2025-02-01",
          "2025-07-31",
          12000.0,
        ),
        intern(
          "intern-003",
          "Arjun Mehta",
          "arjun.mehta@example.com",
          "Engineering Intern",
          "2024-12-01",
          "2025-05-31",
          18000.0,
        ),
      ],
      policies: PolicyBundle {
        leaves: "Interns earn 1 paid leave per month. Unused paid leaves carry forward during the internship. Unpaid leaves reduce your invoice amount.".to_string(),
        stipend: "Your monthly stipend is calculated as a base stipend minus any unpaid leave deductions. Paid leaves do not reduce your stipend.".to_string(),
        general: "Reach out to your manager or HR for anything not covered here.".to_string(),
        faqs: vec![
          Faq {
            id: "FAQ-001".to_string(),
            question: "How many working days are in a month?".to_string(),
            answer: "Invoices assume 22 working days per month, minus any unpaid leave days.".to_string(),
          },
          Faq {
            id: "FAQ-002".to_string(),
            question: "When are invoices generated?".to_string(),
            answer: "You can generate an invoice for any month of your internship from the Invoices page.".to_string(),
          },
        ],
      },
      activity: vec![ActivityItem {
        message: "Riya Sharma requested an unpaid leave for 2025-03-12".to_string(),
      }],
    }
  }
}

pub struct MockStore {
  data: Mutex<MockData>,
}

impl Default for MockStore {
  fn default() -> Self {
    Self::new(MockData::seed())
  }
}

impl MockStore {
  pub fn new(data: MockData) -> Self {
    Self {
      data: Mutex::new(data),
    }
  }

  fn data(&self) -> MutexGuard<'_, MockData> {
    // No invariant spans a panic here, so a poisoned lock is still usable
    self.data.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn log(data: &mut MockData, message: String) {
    info!(%message, "mock store");
    data.activity.insert(0, ActivityItem { message });
    data.activity.truncate(ACTIVITY_LIMIT);
  }

  // Profile

  pub async fn profile(&self) -> Profile {
    self.data().profile.clone()
  }

  /// Apply an intern's update. Returns the saved profile and refused fields.
  pub async fn save_profile(&self, update: ProfileUpdate) -> (Profile, Vec<&'static str>) {
    let mut data = self.data();
    let refused = data.profile.apply_intern_update(update);
    (data.profile.clone(), refused)
  }

  // Leaves

  pub async fn leaves_for(&self, intern_id: &str) -> Vec<Leave> {
    self
      .data()
      .leaves
      .iter()
      .filter(|l| l.intern_id == intern_id)
      .cloned()
      .collect()
  }

  /// Every leave, annotated with the intern's name for HR views.
  pub async fn all_leaves(&self) -> Vec<Leave> {
    let data = self.data();
    data
      .leaves
      .iter()
      .map(|l| {
        let mut leave = l.clone();
        leave.intern_name = data
          .interns
          .iter()
          .find(|i| i.id == l.intern_id)
          .map(|i| i.name.clone());
        leave
      })
      .collect()
  }

  /// New leaves start `Pending` and are prepended.
  pub async fn request_leave(&self, intern_id: &str, request: LeaveRequest) -> Leave {
    let mut data = self.data();
    let leave = Leave {
      id: next_seq_id("L", data.leaves.iter().map(|l| l.id.as_str())),
      date: request.date,
      leave_type: request.leave_type,
      status: LeaveStatus::Pending,
      reason: request.reason,
      intern_id: intern_id.to_string(),
      intern_name: None,
    };
    data.leaves.insert(0, leave.clone());
    let message = format!("{} requested a leave for {}", intern_id, leave.date);
    Self::log(&mut data, message);
    leave
  }

  /// Decide a pending leave. Unknown ids and already-decided leaves are left
  /// untouched and yield `None`.
  pub async fn decide_leave(&self, id: &str, decision: Decision) -> Option<Leave> {
    let mut data = self.data();
    let leave = data
      .leaves
      .iter_mut()
      .find(|l| l.id == id && l.status == LeaveStatus::Pending)?;
    leave.status = decision.into();
    let decided = leave.clone();
    Self::log(&mut data, format!("Leave {} marked {:?}", decided.id, decided.status));
    Some(decided)
  }

  // Announcements

  pub async fn announcements(&self) -> Vec<Announcement> {
    self.data().announcements.clone()
  }

  /// Replace the full list. Entries without an id get the next `A-<n>`.
  pub async fn replace_announcements(&self, announcements: Vec<Announcement>) -> Vec<Announcement> {
    let mut data = self.data();
    let mut next = announcements
      .iter()
      .filter_map(|a| a.id.strip_prefix("A-").and_then(|n| n.parse::<usize>().ok()))
      .max()
      .unwrap_or(0);

    data.announcements = announcements
      .into_iter()
      .map(|mut a| {
        if a.id.is_empty() {
          next += 1;
          a.id = seq_id("A", next);
        }
        a
      })
      .collect();
    let message = format!("Announcements updated ({} total)", data.announcements.len());
    Self::log(&mut data, message);
    data.announcements.clone()
  }

  // Interns

  pub async fn interns(&self) -> Vec<Intern> {
    self.data().interns.clone()
  }

  pub async fn create_intern(&self, new: NewIntern) -> Intern {
    let mut data = self.data();
    let intern = Intern {
      id: next_seq_id("intern", data.interns.iter().map(|i| i.id.as_str())),
      name: new.name,
      email: new.email,
      role: new.role.or_else(|| Some("Intern".to_string())),
      manager: new.manager,
      internship_start: new.internship_start,
      internship_end: new.internship_end,
      stipend_per_month: new.stipend_per_month,
      status: InternStatus::Active,
    };
    data.interns.push(intern.clone());
    Self::log(&mut data, format!("{} onboarded", intern.name));
    intern
  }

  // Policies

  pub async fn policies(&self) -> PolicyBundle {
    self.data().policies.clone()
  }

  pub async fn save_policies(&self, bundle: PolicyBundle) -> PolicyBundle {
    let mut data = self.data();
    data.policies = bundle;
    Self::log(&mut data, "Policies updated".to_string());
    data.policies.clone()
  }

  // Invoices

  pub async fn invoices(&self) -> Vec<Invoice> {
    self.data().invoices.clone()
  }

  pub async fn hr_invoices(&self) -> Vec<Invoice> {
    self.data().hr_invoices.clone()
  }

  /// Prepend to the intern's history. No de-duplication by period.
  pub async fn record_invoice(&self, invoice: Invoice) {
    let mut data = self.data();
    data.invoices.insert(0, invoice);
  }

  /// Prepend to the HR history. No de-duplication by period.
  pub async fn record_hr_invoice(&self, invoice: Invoice) {
    let mut data = self.data();
    let message = format!(
      "Invoice {} generated for {}",
      invoice.invoice_number,
      invoice.intern_name.as_deref().unwrap_or("intern")
    );
    data.hr_invoices.insert(0, invoice);
    Self::log(&mut data, message);
  }

  pub async fn activity(&self) -> Vec<ActivityItem> {
    self.data().activity.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_request_leave_starts_pending_and_prepends() {
    let store = MockStore::default();
    let created = store
      .request_leave(
        "intern-001",
        LeaveRequest {
          date: "2025-04-02".into(),
          leave_type: LeaveType::Unpaid,
          reason: "Moving house".into(),
        },
      )
      .await;

    assert_eq!(created.id, "L-005");
    assert_eq!(created.status, LeaveStatus::Pending);

    let leaves = store.leaves_for("intern-001").await;
    assert_eq!(leaves.len(), 4);
    assert_eq!(leaves[0].id, "L-005");
  }

  #[tokio::test]
  async fn test_leave_ids_stay_unique_with_gaps() {
    let mut data = MockData::seed();
    // Backend ids for the demo intern, plus Riya's seed L-004
    data.leaves.retain(|l| l.intern_id != "intern-001");
    for id in ["11", "12"] {
      data.leaves.push(leave(id, "intern-001", "2025-04-01", LeaveType::Paid, LeaveStatus::Approved, "x"));
    }
    let store = MockStore::new(data);

    let created = store
      .request_leave(
        "intern-001",
        LeaveRequest {
          date: "2025-04-20".into(),
          leave_type: LeaveType::Paid,
          reason: "Trip".into(),
        },
      )
      .await;
    assert_eq!(created.id, "L-005");

    let all = store.all_leaves().await;
    assert_eq!(all.iter().filter(|l| l.id == created.id).count(), 1);
  }

  #[tokio::test]
  async fn test_intern_ids_stay_unique_with_gaps() {
    let mut data = MockData::seed();
    data.interns.remove(0);
    let store = MockStore::new(data);

    let created = store.create_intern(NewIntern::default()).await;
    assert_eq!(created.id, "intern-004");
  }

  #[tokio::test]
  async fn test_decision_is_one_way() {
    let store = MockStore::default();
    let approved = store.decide_leave("L-003", Decision::Approved).await.unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);

    // Already decided: no re-opening
    assert!(store.decide_leave("L-003", Decision::Rejected).await.is_none());
    let leaves = store.leaves_for("intern-001").await;
    let l3 = leaves.iter().find(|l| l.id == "L-003").unwrap();
    assert_eq!(l3.status, LeaveStatus::Approved);
  }

  #[tokio::test]
  async fn test_unknown_decision_changes_nothing() {
    let store = MockStore::default();
    let before = store.all_leaves().await;
    let activity_before = store.activity().await;

    assert!(store.decide_leave("L-999", Decision::Approved).await.is_none());

    assert_eq!(store.all_leaves().await, before);
    assert_eq!(store.activity().await, activity_before);
  }

  #[tokio::test]
  async fn test_hr_leaves_carry_intern_names() {
    let store = MockStore::default();
    let leaves = store.all_leaves().await;
    let l4 = leaves.iter().find(|l| l.id == "L-004").unwrap();
    assert_eq!(l4.intern_name.as_deref(), Some("Riya Sharma"));
  }

  #[tokio::test]
  async fn test_replace_announcements_assigns_ids() {
    let store = MockStore::default();
    let mut list = store.announcements().await;
    list.remove(1);
    list.push(Announcement {
      title: "Hackathon".into(),
      body: "Saturday, 10 AM".into(),
      ..Announcement::default()
    });

    let saved = store.replace_announcements(list).await;
    let ids: Vec<&str> = saved.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["A-001", "A-003", "A-004"]);
    assert_eq!(store.announcements().await, saved);
  }

  #[tokio::test]
  async fn test_create_intern_gets_sequential_id() {
    let store = MockStore::default();
    let created = store
      .create_intern(NewIntern {
        name: "Kavya Rao".into(),
        email: "kavya@example.com".into(),
        ..NewIntern::default()
      })
      .await;
    assert_eq!(created.id, "intern-004");
    assert_eq!(created.role.as_deref(), Some("Intern"));
    assert_eq!(store.interns().await.len(), 4);
  }

  #[tokio::test]
  async fn test_save_profile_applies_intern_rules() {
    let store = MockStore::default();
    let (saved, refused) = store
      .save_profile(ProfileUpdate {
        phone: Some("+91 90000 00000".into()),
        stipend_per_month: Some(50000.0),
        ..ProfileUpdate::default()
      })
      .await;
    assert_eq!(refused, vec!["stipendPerMonth"]);
    assert_eq!(saved.phone.as_deref(), Some("+91 90000 00000"));
    assert_eq!(store.profile().await.stipend_per_month, Some(15000.0));
  }
}
