//! Invoice and leave arithmetic.
//!
//! Everything here is pure and infallible: malformed dates degrade to
//! sentinel values instead of errors.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::api::types::{Invoice, InvoiceStatus, Leave, LeaveBalance, LeaveType, Profile};

/// Assumed working days in every month.
pub const BASE_WORKING_DAYS: u32 = 22;

/// Returned when an invoice number cannot be derived.
pub const INVOICE_NUMBER_SENTINEL: &str = "INV-000";

fn count_type(leaves: &[Leave], leave_type: LeaveType) -> u32 {
  leaves.iter().filter(|l| l.leave_type == leave_type).count() as u32
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
  let value = value.trim();
  NaiveDate::parse_from_str(value, "%Y-%m-%d")
    .ok()
    .or_else(|| {
      DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.date_naive())
    })
}

/// Working days for a month: 22 minus every UNPAID leave in `leaves`.
///
/// `leaves` is not filtered by `month`/`year`; the whole set counts.
pub fn working_days(_month: u32, _year: i32, leaves: &[Leave]) -> u32 {
  BASE_WORKING_DAYS.saturating_sub(count_type(leaves, LeaveType::Unpaid))
}

/// Whole months from `from` to `to` (may be negative).
fn month_diff(from: NaiveDate, to: NaiveDate) -> i64 {
  (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

/// Sequential invoice number: `INT-<year>-<seq>` where seq is the 1-based
/// month index since the internship started.
pub fn invoice_number(internship_start: &str, month: u32, year: i32) -> String {
  let (Some(start), Some(target)) = (
    parse_date(internship_start),
    NaiveDate::from_ymd_opt(year, month, 1),
  ) else {
    return INVOICE_NUMBER_SENTINEL.to_string();
  };

  let seq = month_diff(start, target).max(0) + 1;
  format!("INT-{}-{:03}", target.year(), seq)
}

/// Build the invoice for `profile` from the full leave set.
pub fn generate_invoice(
  profile: &Profile,
  leaves: &[Leave],
  month: u32,
  year: i32,
  generated_at: DateTime<Utc>,
) -> Invoice {
  let working_days = working_days(month, year, leaves);
  let paid_leaves = count_type(leaves, LeaveType::Paid);
  let unpaid_leaves = count_type(leaves, LeaveType::Unpaid);

  let base_stipend = profile.stipend_per_month.unwrap_or(0.0);
  let per_day = if working_days > 0 {
    base_stipend / working_days as f64
  } else {
    0.0
  };
  let unpaid_deduction = (per_day * unpaid_leaves as f64).round();
  let final_stipend = (base_stipend - unpaid_deduction).round().max(0.0);

  let invoice_number = invoice_number(
    profile.internship_start.as_deref().unwrap_or_default(),
    month,
    year,
  );

  Invoice {
    invoice_number,
    intern_id: Some(profile.id.clone()).filter(|id| !id.is_empty()),
    intern_name: Some(profile.name.clone()).filter(|name| !name.is_empty()),
    month,
    year,
    working_days,
    paid_leaves,
    unpaid_leaves,
    base_stipend,
    unpaid_deduction,
    final_stipend,
    status: InvoiceStatus::Generated,
    generated_at,
  }
}

/// Paid-leave balance: one paid leave is earned per month since the start
/// month (inclusive).
pub fn leave_balance(internship_start: Option<&str>, today: NaiveDate, leaves: &[Leave]) -> LeaveBalance {
  let entitled = internship_start
    .and_then(parse_date)
    .map(|start| (month_diff(start, today) + 1).max(0) as u32)
    .unwrap_or(0);
  let paid_used = count_type(leaves, LeaveType::Paid);
  let unpaid = count_type(leaves, LeaveType::Unpaid);

  LeaveBalance {
    entitled,
    paid_used,
    unpaid,
    remaining: entitled.saturating_sub(paid_used),
  }
}

/// "March 2025". Falls back to `month/year` for an invalid month.
pub fn month_label(month: u32, year: i32) -> String {
  NaiveDate::from_ymd_opt(year, month, 1)
    .map(|d| d.format("%B %Y").to_string())
    .unwrap_or_else(|| format!("{}/{}", month, year))
}

/// "15 Jan 2025". Unparseable input is returned as-is, empty input as "-".
pub fn format_date_human(value: Option<&str>) -> String {
  match value.map(str::trim) {
    None | Some("") => "-".to_string(),
    Some(raw) => parse_date(raw)
      .map(|d| d.format("%d %b %Y").to_string())
      .unwrap_or_else(|| raw.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leave(leave_type: LeaveType) -> Leave {
    Leave {
      leave_type,
      ..Leave::default()
    }
  }

  fn profile(stipend: f64, start: &str) -> Profile {
    Profile {
      id: "intern-001".into(),
      name: "Demo Intern".into(),
      internship_start: Some(start.into()),
      stipend_per_month: Some(stipend),
      ..Profile::default()
    }
  }

  #[test]
  fn test_working_days_subtracts_unpaid_only() {
    let leaves = vec![
      leave(LeaveType::Unpaid),
      leave(LeaveType::Paid),
      leave(LeaveType::Unpaid),
    ];
    for month in 1..=12 {
      assert_eq!(working_days(month, 2025, &leaves), 20);
    }
    assert_eq!(working_days(3, 2025, &[]), 22);
  }

  #[test]
  fn test_working_days_floors_at_zero() {
    let leaves: Vec<Leave> = (0..30).map(|_| leave(LeaveType::Unpaid)).collect();
    assert_eq!(working_days(6, 2025, &leaves), 0);
  }

  #[test]
  fn test_invoice_number_sequence() {
    assert_eq!(invoice_number("2025-01-01", 1, 2025), "INT-2025-001");
    assert_eq!(invoice_number("2025-01-01", 3, 2025), "INT-2025-003");
    assert_eq!(invoice_number("2025-11-15", 2, 2026), "INT-2026-004");
    assert_eq!(
      invoice_number("2025-01-01T09:30:00Z", 12, 2025),
      "INT-2025-012"
    );
  }

  #[test]
  fn test_invoice_number_clamps_before_start() {
    assert_eq!(invoice_number("2025-06-01", 1, 2025), "INT-2025-001");
    assert_eq!(invoice_number("2025-06-01", 6, 2024), "INT-2024-001");
  }

  #[test]
  fn test_invoice_number_is_monotonic() {
    let mut last = 0;
    for offset in 0..30 {
      let month = (offset % 12) + 1;
      let year = 2024 + (offset / 12) as i32;
      let number = invoice_number("2025-01-01", month, year);
      let seq: u32 = number.rsplit('-').next().unwrap().parse().unwrap();
      assert!(seq >= last, "{} went backwards", number);
      assert!(seq >= 1);
      last = seq;
    }
  }

  #[test]
  fn test_invoice_number_sentinel() {
    assert_eq!(invoice_number("not a date", 3, 2025), "INV-000");
    assert_eq!(invoice_number("", 3, 2025), "INV-000");
    assert_eq!(invoice_number("2025-01-01", 13, 2025), "INV-000");
    assert_eq!(invoice_number("2025-01-01", 0, 2025), "INV-000");
  }

  #[test]
  fn test_generate_invoice_scenario() {
    let invoice = generate_invoice(
      &profile(15000.0, "2025-01-01"),
      &[leave(LeaveType::Unpaid)],
      3,
      2025,
      Utc::now(),
    );

    assert_eq!(invoice.working_days, 21);
    assert_eq!(invoice.invoice_number, "INT-2025-003");
    assert_eq!(invoice.unpaid_leaves, 1);
    assert_eq!(invoice.paid_leaves, 0);
    assert_eq!(invoice.unpaid_deduction, 714.0);
    assert_eq!(invoice.final_stipend, 14286.0);
    assert_eq!(invoice.intern_id.as_deref(), Some("intern-001"));
  }

  #[test]
  fn test_final_stipend_invariant() {
    for unpaid in 0..30 {
      for stipend in [0.0, 999.0, 15000.0, 22001.0] {
        let leaves: Vec<Leave> = (0..unpaid).map(|_| leave(LeaveType::Unpaid)).collect();
        let invoice = generate_invoice(&profile(stipend, "2025-01-01"), &leaves, 5, 2025, Utc::now());

        let expected = (invoice.base_stipend - invoice.unpaid_deduction).round().max(0.0);
        assert_eq!(invoice.final_stipend, expected);
        assert!(invoice.final_stipend >= 0.0);
        assert!(invoice.unpaid_deduction >= 0.0);
        assert!(invoice.final_stipend <= invoice.base_stipend);
      }
    }
  }

  #[test]
  fn test_zero_working_days_means_no_deduction() {
    let leaves: Vec<Leave> = (0..22).map(|_| leave(LeaveType::Unpaid)).collect();
    let invoice = generate_invoice(&profile(15000.0, "2025-01-01"), &leaves, 5, 2025, Utc::now());
    assert_eq!(invoice.working_days, 0);
    assert_eq!(invoice.unpaid_deduction, 0.0);
    assert_eq!(invoice.final_stipend, 15000.0);
  }

  #[test]
  fn test_missing_stipend_and_start() {
    let invoice = generate_invoice(&Profile::default(), &[], 4, 2025, Utc::now());
    assert_eq!(invoice.base_stipend, 0.0);
    assert_eq!(invoice.final_stipend, 0.0);
    assert_eq!(invoice.invoice_number, "INV-000");
    assert_eq!(invoice.intern_id, None);
  }

  #[test]
  fn test_leave_balance() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
    let leaves = vec![
      leave(LeaveType::Paid),
      leave(LeaveType::Unpaid),
      leave(LeaveType::Paid),
    ];
    let balance = leave_balance(Some("2025-01-01"), today, &leaves);
    assert_eq!(
      balance,
      LeaveBalance {
        entitled: 3,
        paid_used: 2,
        unpaid: 1,
        remaining: 1,
      }
    );

    let none = leave_balance(Some("garbage"), today, &leaves);
    assert_eq!(none.entitled, 0);
    assert_eq!(none.remaining, 0);

    let future = leave_balance(Some("2025-08-01"), today, &[]);
    assert_eq!(future.entitled, 0);
  }

  #[test]
  fn test_labels() {
    assert_eq!(month_label(3, 2025), "March 2025");
    assert_eq!(month_label(13, 2025), "13/2025");
    assert_eq!(format_date_human(Some("2025-01-15")), "15 Jan 2025");
    assert_eq!(format_date_human(Some("soon")), "soon");
    assert_eq!(format_date_human(None), "-");
    assert_eq!(format_date_human(Some("")), "-");
  }
}
