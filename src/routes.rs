//! Logical resource paths and alias lookup

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Method::Get => write!(f, "GET"),
      Method::Post => write!(f, "POST"),
    }
  }
}

/// Every logical path the router answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
  InternProfile,
  InternLeaves,
  InternAnnouncements,
  InternInvoices,
  HrSummary,
  HrInterns,
  HrLeaves,
  HrLeaveDecision,
  HrInvoices,
  HrPolicies,
  HrAnnouncements,
  PolicyBuddy,
}

#[derive(Debug, Clone)]
pub struct RouteInfo {
  pub route: Route,
  pub path: &'static str,
  pub aliases: &'static [&'static str],
  pub get: bool,
  pub post: bool,
  pub description: &'static str,
}

/// The closed routing table
pub const ROUTES: &[RouteInfo] = &[
  RouteInfo {
    route: Route::InternProfile,
    path: "/intern/profile",
    aliases: &["profile", "me"],
    get: true,
    post: true,
    description: "Intern profile and KYC details",
  },
  RouteInfo {
    route: Route::InternLeaves,
    path: "/intern/leaves",
    aliases: &["leaves", "l"],
    get: true,
    post: true,
    description: "Own leave history / request a leave",
  },
  RouteInfo {
    route: Route::InternAnnouncements,
    path: "/intern/announcements",
    aliases: &["announcements", "news"],
    get: true,
    post: false,
    description: "Announcements feed",
  },
  RouteInfo {
    route: Route::InternInvoices,
    path: "/intern/invoices",
    aliases: &["invoices", "inv"],
    get: true,
    post: true,
    description: "Invoice history / generate {month, year}",
  },
  RouteInfo {
    route: Route::HrSummary,
    path: "/hr/summary",
    aliases: &["summary", "hr"],
    get: true,
    post: false,
    description: "HR dashboard counts and activity",
  },
  RouteInfo {
    route: Route::HrInterns,
    path: "/hr/interns",
    aliases: &["interns"],
    get: true,
    post: true,
    description: "Intern directory / onboard an intern",
  },
  RouteInfo {
    route: Route::HrLeaves,
    path: "/hr/leaves",
    aliases: &["hr-leaves"],
    get: true,
    post: false,
    description: "All leave requests",
  },
  RouteInfo {
    route: Route::HrLeaveDecision,
    path: "/hr/leaves/decision",
    aliases: &["decision", "decide"],
    get: false,
    post: true,
    description: "Approve or reject {id, decision}",
  },
  RouteInfo {
    route: Route::HrInvoices,
    path: "/hr/invoices",
    aliases: &["hr-invoices"],
    get: true,
    post: true,
    description: "All invoices / generate {internId, month, year}",
  },
  RouteInfo {
    route: Route::HrPolicies,
    path: "/hr/policies",
    aliases: &["policies", "policy"],
    get: true,
    post: true,
    description: "Policy texts and FAQs",
  },
  RouteInfo {
    route: Route::HrAnnouncements,
    path: "/hr/announcements",
    aliases: &["hr-announcements"],
    get: true,
    post: true,
    description: "Edit announcements {announcements: [...]}",
  },
  RouteInfo {
    route: Route::PolicyBuddy,
    path: "/api/ai/policy-buddy",
    aliases: &["ask", "buddy"],
    get: false,
    post: true,
    description: "Ask the policy chatbot {question}",
  },
];

impl RouteInfo {
  pub fn supports(&self, method: Method) -> bool {
    match method {
      Method::Get => self.get,
      Method::Post => self.post,
    }
  }
}

impl Route {
  pub fn info(self) -> &'static RouteInfo {
    ROUTES
      .iter()
      .find(|r| r.route == self)
      .unwrap_or(&ROUTES[0])
  }

  pub fn path(self) -> &'static str {
    self.info().path
  }
}

/// Exact path lookup, ignoring a trailing slash.
pub fn find(path: &str) -> Option<&'static RouteInfo> {
  let path = path.trim();
  let path = if path.len() > 1 {
    path.trim_end_matches('/')
  } else {
    path
  };
  ROUTES.iter().find(|r| r.path == path)
}

/// Resolve a path or an alias (CLI convenience).
pub fn resolve(input: &str) -> Option<&'static RouteInfo> {
  find(input).or_else(|| {
    let input = input.trim().to_lowercase();
    ROUTES
      .iter()
      .find(|r| r.aliases.contains(&input.as_str()))
  })
}

/// Get suggestions for an unknown path or alias
pub fn get_suggestions(input: &str) -> Vec<&'static RouteInfo> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return ROUTES.iter().collect();
  }

  let mut matches: Vec<(&RouteInfo, u32)> = Vec::new();

  for route in ROUTES {
    // Exact match on alias
    if route.aliases.contains(&input_lower.as_str()) {
      matches.push((route, 0));
      continue;
    }

    // Prefix match on path
    if route.path.starts_with(&input_lower) {
      matches.push((route, 1));
      continue;
    }

    // Prefix match on alias
    if route.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((route, 2));
      continue;
    }

    // Path contains the input, or the input ends with this path's last segment
    let last_segment = route.path.rsplit('/').next().unwrap_or_default();
    if route.path.contains(&input_lower) || input_lower.ends_with(last_segment) {
      matches.push((route, 3));
      continue;
    }

    // Fuzzy match on alias
    if route.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((route, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(route, _)| route).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_every_route_in_table_once() {
    for info in ROUTES {
      assert_eq!(info.route.info().path, info.path);
      assert!(info.get || info.post);
    }
    assert_eq!(ROUTES.len(), 12);
  }

  #[test]
  fn test_find_exact_path() {
    assert_eq!(find("/intern/profile").unwrap().route, Route::InternProfile);
    assert_eq!(find("/hr/leaves/").unwrap().route, Route::HrLeaves);
    assert!(find("/nope").is_none());
    assert!(find("intern/profile").is_none());
  }

  #[test]
  fn test_resolve_alias() {
    assert_eq!(resolve("profile").unwrap().route, Route::InternProfile);
    assert_eq!(resolve("ASK").unwrap().route, Route::PolicyBuddy);
    assert!(resolve("nope").is_none());
  }

  #[test]
  fn test_suggestions_for_typo() {
    let suggestions = get_suggestions("/intern/leave");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].route, Route::InternLeaves);

    let suggestions = get_suggestions("/v1/invoices");
    assert!(suggestions.iter().any(|r| r.route == Route::InternInvoices));
  }

  #[test]
  fn test_empty_input_returns_all() {
    assert_eq!(get_suggestions("").len(), ROUTES.len());
  }

  #[test]
  fn test_method_support() {
    assert!(!find("/hr/leaves/decision").unwrap().supports(Method::Get));
    assert!(find("/hr/leaves/decision").unwrap().supports(Method::Post));
    assert!(!find("/intern/announcements").unwrap().supports(Method::Post));
  }
}
