//! Offline answers for the policy chatbot.
//!
//! The policy bundle doubles as a tiny knowledge base: FAQ questions are
//! matched by substring, then a few keywords route to the policy texts.

use super::types::{PolicyAnswer, PolicyBundle};

const LEAVE_ANSWER: &str = "Interns earn 1 paid leave per month. Unused paid leaves carry forward during the internship. Unpaid leaves reduce your invoice amount.";

const STIPEND_ANSWER: &str = "Your monthly stipend is calculated as a base stipend minus any unpaid leave deductions. Paid leaves do not reduce your stipend.";

const GREETING: &str = "I'm your Policy Buddy! Ask me about leaves, invoices, working days, or stipend rules and I'll explain them in simple language.";

/// Shorter FAQ questions match too loosely.
const MIN_MATCH_LEN: usize = 4;

fn normalize(text: &str) -> String {
  text
    .to_lowercase()
    .chars()
    .filter(|c| c.is_alphanumeric() || c.is_whitespace())
    .collect::<String>()
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

fn non_empty_or(text: &str, fallback: &str) -> String {
  if text.trim().is_empty() {
    fallback.to_string()
  } else {
    text.to_string()
  }
}

/// Answer `question` from the policy bundle.
pub fn answer(question: &str, policies: &PolicyBundle) -> PolicyAnswer {
  let q = normalize(question);

  if q.len() >= MIN_MATCH_LEN {
    let faq_hit = policies.faqs.iter().find(|faq| {
      let fq = normalize(&faq.question);
      fq.len() >= MIN_MATCH_LEN
        && !faq.answer.trim().is_empty()
        && (q.contains(&fq) || fq.contains(&q))
    });
    if let Some(faq) = faq_hit {
      return PolicyAnswer {
        answer: faq.answer.clone(),
      };
    }
  }

  let answer = if q.contains("leave") {
    non_empty_or(&policies.leaves, LEAVE_ANSWER)
  } else if q.contains("stipend") || q.contains("invoice") {
    non_empty_or(&policies.stipend, STIPEND_ANSWER)
  } else {
    GREETING.to_string()
  };

  PolicyAnswer { answer }
}
