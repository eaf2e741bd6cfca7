use chrono::{Local, NaiveDate};
use clap::{Subcommand, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::fmt::Write;
use tracing::info;

use crate::api::client::{Backend, BackendClient};
use crate::api::router::ApiRouter;
use crate::api::types::{
  Announcement, Decision, HrSummary, Invoice, Leave, LeaveRequest, LeaveType, Profile,
};
use crate::cache::{KvStore, OverrideCache, Sourced};
use crate::calc;
use crate::config::Config;
use crate::routes::{self, ROUTES};
use crate::session::{AuthSession, Role};

/// How many leaves and announcements the dashboard lists
const DASHBOARD_ITEMS: usize = 5;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Sign in against the backend
  Login {
    #[arg(value_enum)]
    role: Role,
    email: String,
    #[arg(short, long)]
    password: String,
  },
  /// Forget the stored session
  Logout,
  /// Show the stored session
  Whoami,
  /// GET a logical path (or alias) and print the JSON
  Get { path: String },
  /// POST a JSON body to a logical path (or alias)
  Post { path: String, body: String },
  /// Profile, leave balance and announcements (HR summary when signed in as HR)
  Dashboard,
  /// Request a leave for YYYY-MM-DD
  Leave {
    date: String,
    #[arg(long)]
    unpaid: bool,
    #[arg(required = true, num_args = 1..)]
    reason: Vec<String>,
  },
  /// Generate the invoice for a month
  Invoice {
    #[arg(value_parser = clap::value_parser!(u32).range(1..=12))]
    month: u32,
    year: i32,
  },
  /// Ask the policy buddy
  Ask {
    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
  },
  /// Approve or reject a pending leave
  Decide {
    id: String,
    #[arg(value_enum)]
    decision: DecisionArg,
  },
  /// List logical paths and their aliases
  Routes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecisionArg {
  Approve,
  Reject,
}

impl From<DecisionArg> for Decision {
  fn from(arg: DecisionArg) -> Self {
    match arg {
      DecisionArg::Approve => Decision::Approved,
      DecisionArg::Reject => Decision::Rejected,
    }
  }
}

/// Main application state
pub struct App<B: Backend, S: KvStore> {
  router: ApiRouter<B, S>,
}

impl<S: KvStore> App<BackendClient, S> {
  pub fn new(config: &Config, store: S) -> Result<Self> {
    let backend = BackendClient::new(config)?;
    let cache = OverrideCache::new(store, config.storage.namespace.clone());

    // A token from the environment replaces whatever session was stored
    if let Some(token) = Config::get_api_token() {
      if cache.token().as_deref() != Some(token.as_str()) {
        info!("using session token from ZYNK_TOKEN");
        cache.set_auth_session(&AuthSession {
          token,
          user_id: String::new(),
          name: None,
          email: None,
          role: None,
        });
      }
    }

    Ok(Self::from_router(ApiRouter::new(backend, cache)))
  }
}

impl<B: Backend, S: KvStore> App<B, S> {
  pub fn from_router(router: ApiRouter<B, S>) -> Self {
    Self { router }
  }

  /// Run one command and return what should be printed.
  pub async fn execute(&self, command: Command) -> Result<String> {
    match command {
      Command::Login {
        role,
        email,
        password,
      } => {
        let identity = self.router.login(role, &email, &password).await?;
        let mode = if self.router.is_authenticated() {
          "backend"
        } else {
          "offline"
        };
        Ok(format!(
          "Signed in as {} <{}> ({})",
          identity.name, identity.email, mode
        ))
      }
      Command::Logout => {
        self.router.logout();
        Ok("Signed out".to_string())
      }
      Command::Whoami => self.whoami(),
      Command::Get { path } => {
        let value = self.router.get(&resolve_path(&path)).await?;
        pretty(&value)
      }
      Command::Post { path, body } => {
        let body: Value =
          serde_json::from_str(&body).map_err(|e| eyre!("Body is not valid JSON: {}", e))?;
        let value = self.router.post(&resolve_path(&path), body).await?;
        pretty(&value)
      }
      Command::Dashboard => self.dashboard().await,
      Command::Leave {
        date,
        unpaid,
        reason,
      } => {
        if calc::parse_date(&date).is_none() {
          return Err(eyre!("Invalid date '{}', expected YYYY-MM-DD", date));
        }
        let leave = self
          .router
          .request_leave(LeaveRequest {
            date,
            leave_type: if unpaid {
              LeaveType::Unpaid
            } else {
              LeaveType::Paid
            },
            reason: reason.join(" "),
          })
          .await;
        Ok(format!(
          "Leave {} requested for {} ({}), status {:?}",
          leave.id,
          calc::format_date_human(Some(&leave.date)),
          leave_type_label(leave.leave_type),
          leave.status
        ))
      }
      Command::Invoice { month, year } => {
        let invoice = self.router.generate_invoice(month, year).await;
        render_invoice(&invoice)
      }
      Command::Ask { question } => {
        let answer = self.router.ask_policy_buddy(&question.join(" ")).await;
        Ok(answer.answer)
      }
      Command::Decide { id, decision } => {
        let decision = Decision::from(decision);
        match self.router.decide_leave(&id, decision).await {
          Some(leave) => Ok(format!("Leave {} is now {:?}", leave.id, leave.status)),
          None if self.router.is_authenticated() => Ok(format!("Decision for leave {} sent", id)),
          None => Ok(format!("No pending leave with id {}", id)),
        }
      }
      Command::Routes => render_routes(),
    }
  }

  fn whoami(&self) -> Result<String> {
    let cache = self.router.cache();
    let mut out = String::new();

    match cache.auth_session() {
      Some(session) => writeln!(
        out,
        "Session: {} ({})",
        session.name.as_deref().unwrap_or("signed in"),
        session.role.as_deref().unwrap_or("unknown role")
      )?,
      None => writeln!(out, "Session: none (offline data)")?,
    }
    if let Some(intern) = cache.current_intern() {
      writeln!(out, "Intern: {} <{}>", intern.name, intern.email)?;
    }
    if let Some(hr) = cache.current_hr() {
      writeln!(out, "HR: {} <{}>", hr.name, hr.email)?;
    }
    Ok(out.trim_end().to_string())
  }

  async fn dashboard(&self) -> Result<String> {
    if self.router.cache().current_hr().is_some() {
      let summary = self.router.hr_summary().await;
      return render_hr_dashboard(&summary);
    }

    let (profile, leaves, announcements) = tokio::join!(
      self.router.profile(),
      self.router.leaves(),
      self.router.announcements()
    );
    render_intern_dashboard(&profile, &leaves, &announcements, Local::now().date_naive())
  }
}

/// Accept aliases such as `leaves` as well as full paths.
fn resolve_path(input: &str) -> String {
  routes::resolve(input)
    .map(|info| info.path.to_string())
    .unwrap_or_else(|| input.trim().to_string())
}

fn pretty(value: &Value) -> Result<String> {
  Ok(serde_json::to_string_pretty(value)?)
}

fn leave_type_label(leave_type: LeaveType) -> &'static str {
  match leave_type {
    LeaveType::Paid => "paid",
    LeaveType::Unpaid => "unpaid",
  }
}

fn render_routes() -> Result<String> {
  let mut out = String::new();
  for info in ROUTES {
    let methods = match (info.get, info.post) {
      (true, true) => "GET POST",
      (true, false) => "GET",
      (false, true) => "POST",
      (false, false) => "-",
    };
    writeln!(
      out,
      "{:<22} {:<9} {:<28} {}",
      info.path,
      methods,
      info.aliases.join(", "),
      info.description
    )?;
  }
  Ok(out.trim_end().to_string())
}

fn render_invoice(invoice: &Invoice) -> Result<String> {
  let mut out = String::new();
  writeln!(
    out,
    "Invoice {} for {}",
    invoice.invoice_number,
    calc::month_label(invoice.month, invoice.year)
  )?;
  if let Some(name) = &invoice.intern_name {
    writeln!(out, "  Intern:        {}", name)?;
  }
  writeln!(out, "  Working days:  {}", invoice.working_days)?;
  writeln!(
    out,
    "  Leaves:        {} paid, {} unpaid",
    invoice.paid_leaves, invoice.unpaid_leaves
  )?;
  writeln!(out, "  Base stipend:  {:.0}", invoice.base_stipend)?;
  writeln!(out, "  Deduction:     {:.0}", invoice.unpaid_deduction)?;
  writeln!(out, "  Final stipend: {:.0}", invoice.final_stipend)?;
  Ok(out.trim_end().to_string())
}

fn render_intern_dashboard(
  profile: &Sourced<Profile>,
  leaves: &Sourced<Vec<Leave>>,
  announcements: &Sourced<Vec<Announcement>>,
  today: NaiveDate,
) -> Result<String> {
  let p = &profile.data;
  let mut out = String::new();

  writeln!(out, "{} ({})", p.name, profile.source.label())?;
  writeln!(out, "  Role:       {}", p.role.as_deref().unwrap_or("-"))?;
  writeln!(out, "  Manager:    {}", p.manager.as_deref().unwrap_or("-"))?;
  writeln!(
    out,
    "  Internship: {} to {}",
    calc::format_date_human(p.internship_start.as_deref()),
    calc::format_date_human(p.internship_end.as_deref())
  )?;
  if let Some(stipend) = p.stipend_per_month {
    writeln!(out, "  Stipend:    {:.0} / month", stipend)?;
  }

  let balance = calc::leave_balance(p.internship_start.as_deref(), today, &leaves.data);
  writeln!(out)?;
  writeln!(
    out,
    "Paid leave balance: {} of {} left ({} unpaid taken)",
    balance.remaining, balance.entitled, balance.unpaid
  )?;

  writeln!(out)?;
  writeln!(out, "Recent leaves ({})", leaves.source.label())?;
  if leaves.data.is_empty() {
    writeln!(out, "  none")?;
  }
  for leave in leaves.data.iter().take(DASHBOARD_ITEMS) {
    writeln!(
      out,
      "  {:<6} {:<12} {:<7} {:<9} {}",
      leave.id,
      calc::format_date_human(Some(&leave.date)),
      leave_type_label(leave.leave_type),
      format!("{:?}", leave.status),
      leave.reason
    )?;
  }

  writeln!(out)?;
  writeln!(out, "Announcements ({})", announcements.source.label())?;
  for a in announcements.data.iter().take(DASHBOARD_ITEMS) {
    match &a.tag {
      Some(tag) => writeln!(out, "  [{}] {}", tag, a.title)?,
      None => writeln!(out, "  {}", a.title)?,
    }
  }

  Ok(out.trim_end().to_string())
}

fn render_hr_dashboard(summary: &HrSummary) -> Result<String> {
  let mut out = String::new();
  writeln!(out, "Welcome, {}", summary.hr.name)?;
  writeln!(out, "  Active interns:      {}", summary.counts.active_interns)?;
  writeln!(out, "  Pending leaves:      {}", summary.counts.pending_leaves)?;
  writeln!(out, "  Invoices this month: {}", summary.counts.invoices_this_month)?;
  writeln!(out)?;
  writeln!(out, "Recent activity")?;
  for item in summary.activity.iter().take(DASHBOARD_ITEMS) {
    writeln!(out, "  - {}", item.message)?;
  }
  Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::client::BackendError;
  use crate::cache::MemoryStore;
  use crate::session::Identity;

  /// Backend that is never reachable.
  struct Offline;

  impl Backend for Offline {
    fn request(
      &self,
      _method: crate::api::client::HttpMethod,
      _path: &str,
      _token: Option<&str>,
      _body: Option<Value>,
    ) -> impl std::future::Future<Output = std::result::Result<Value, BackendError>> + Send {
      std::future::ready(Err(BackendError::Server {
        status: 502,
        body: "Bad Gateway".to_string(),
      }))
    }
  }

  fn app() -> App<Offline, MemoryStore> {
    App::from_router(ApiRouter::new(
      Offline,
      OverrideCache::new(MemoryStore::new(), "internflow"),
    ))
  }

  #[tokio::test]
  async fn test_get_accepts_alias() {
    let out = app()
      .execute(Command::Get {
        path: "profile".into(),
      })
      .await
      .unwrap();
    assert!(out.contains("\"name\": \"Demo Intern\""));
  }

  #[tokio::test]
  async fn test_get_unknown_path_fails() {
    let err = app()
      .execute(Command::Get {
        path: "/nope".into(),
      })
      .await
      .unwrap_err();
    assert!(err.to_string().contains("unknown GET path"));
  }

  #[tokio::test]
  async fn test_post_rejects_malformed_json() {
    let err = app()
      .execute(Command::Post {
        path: "leaves".into(),
        body: "{not json".into(),
      })
      .await
      .unwrap_err();
    assert!(err.to_string().contains("not valid JSON"));
  }

  #[tokio::test]
  async fn test_leave_then_decide() {
    let app = app();
    let out = app
      .execute(Command::Leave {
        date: "2025-04-02".into(),
        unpaid: true,
        reason: vec!["Moving".into(), "house".into()],
      })
      .await
      .unwrap();
    assert_eq!(out, "Leave L-005 requested for 02 Apr 2025 (unpaid), status Pending");

    let out = app
      .execute(Command::Decide {
        id: "L-005".into(),
        decision: DecisionArg::Approve,
      })
      .await
      .unwrap();
    assert_eq!(out, "Leave L-005 is now Approved");

    let out = app
      .execute(Command::Decide {
        id: "L-005".into(),
        decision: DecisionArg::Reject,
      })
      .await
      .unwrap();
    assert_eq!(out, "No pending leave with id L-005");
  }

  #[tokio::test]
  async fn test_leave_rejects_bad_date() {
    let err = app()
      .execute(Command::Leave {
        date: "tomorrow".into(),
        unpaid: false,
        reason: vec!["x".into()],
      })
      .await
      .unwrap_err();
    assert!(err.to_string().contains("expected YYYY-MM-DD"));
  }

  #[tokio::test]
  async fn test_invoice_render() {
    let out = app()
      .execute(Command::Invoice {
        month: 3,
        year: 2025,
      })
      .await
      .unwrap();
    // Seed: one unpaid leave for the demo intern
    assert!(out.starts_with("Invoice INT-2025-003 for March 2025"));
    assert!(out.contains("Working days:  21"));
    assert!(out.contains("Final stipend: 14286"));
  }

  #[tokio::test]
  async fn test_intern_dashboard() {
    let out = app().execute(Command::Dashboard).await.unwrap();
    assert!(out.starts_with("Demo Intern (offline: demo data)"));
    assert!(out.contains("Internship: 01 Jan 2025 to 30 Jun 2025"));
    assert!(out.contains("Paid leave balance:"));
    assert!(out.contains("[Event] Intern townhall on Friday"));
  }

  #[tokio::test]
  async fn test_hr_dashboard_when_hr_identity_stored() {
    let app = app();
    app.router.cache().set_current_hr(&Identity {
      name: "Meera".into(),
      ..Identity::default()
    });
    let out = app.execute(Command::Dashboard).await.unwrap();
    assert!(out.starts_with("Welcome, Meera"));
    assert!(out.contains("Pending leaves:      2"));
  }

  #[tokio::test]
  async fn test_login_offline_then_whoami() {
    let app = app();
    let out = app
      .execute(Command::Login {
        role: Role::Intern,
        email: "arjun.mehta@example.com".into(),
        password: "pw".into(),
      })
      .await
      .unwrap();
    assert_eq!(out, "Signed in as Arjun Mehta <arjun.mehta@example.com> (offline)");

    let out = app.execute(Command::Whoami).await.unwrap();
    assert!(out.contains("Session: none"));
    assert!(out.contains("Intern: Arjun Mehta"));

    app.execute(Command::Logout).await.unwrap();
    let out = app.execute(Command::Whoami).await.unwrap();
    assert_eq!(out, "Session: none (offline data)");
  }

  #[tokio::test]
  async fn test_ask() {
    let out = app()
      .execute(Command::Ask {
        question: vec!["How".into(), "do".into(), "leaves".into(), "work?".into()],
      })
      .await
      .unwrap();
    assert!(out.starts_with("Interns earn 1 paid leave per month."));
  }

  #[test]
  fn test_invoice_month_is_range_checked() {
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
      #[command(subcommand)]
      command: Command,
    }

    assert!(Cli::try_parse_from(["zynk", "invoice", "13", "2025"]).is_err());
    assert!(Cli::try_parse_from(["zynk", "invoice", "0", "2025"]).is_err());
    assert!(matches!(
      Cli::try_parse_from(["zynk", "invoice", "12", "2025"]).unwrap().command,
      Command::Invoice { month: 12, year: 2025 }
    ));
  }

  #[test]
  fn test_routes_listing_has_every_path() {
    let out = render_routes().unwrap();
    for info in ROUTES {
      assert!(out.contains(info.path));
    }
    assert_eq!(out.lines().count(), ROUTES.len());
  }
}
