//! Email normalization for club request forms and invites.
//!
//! Addresses are trimmed and lowercased; anything that does not look like
//! `local@domain.tld` is dropped rather than rejected, so a stray blank row in
//! the officer list never fails a submission on its own.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{BobcatsError, Result};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^\S+@\S+\.\S+$").unwrap();
    static ref INVITE_EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Normalized contact email plus the officer list derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEmails {
    pub contact_email: String,
    pub officer_emails: Vec<String>,
}

/// Trim and lowercase an address. Returns `None` when it is blank or malformed.
pub fn normalize_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !EMAIL_RE.is_match(trimmed) {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Normalize a list, dropping invalid entries, duplicates and the contact
/// address. First occurrence wins, so the caller's ordering is kept.
pub fn normalize_email_list<S: AsRef<str>>(emails: &[S], contact_email: Option<&str>) -> Vec<String> {
    let contact = contact_email.and_then(normalize_email);
    let mut result: Vec<String> = Vec::with_capacity(emails.len());

    for email in emails {
        let Some(normalized) = normalize_email(email.as_ref()) else { continue };
        if contact.as_deref() == Some(normalized.as_str()) {
            continue;
        }
        if !result.contains(&normalized) {
            result.push(normalized);
        }
    }

    result
}

/// Normalize the contact email and officer list of a club request together.
pub fn normalize_club_request_emails<S: AsRef<str>>(
    contact_email: &str,
    officer_emails: &[S],
) -> Result<NormalizedEmails> {
    let contact_email = normalize_email(contact_email)
        .ok_or_else(|| BobcatsError::validation("Contact email is required and must be valid"))?;
    let officer_emails = normalize_email_list(officer_emails, Some(&contact_email));
    Ok(NormalizedEmails { contact_email, officer_emails })
}

/// Normalize an invite address, which uses the stricter single-`@` shape.
pub fn normalize_invite_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(BobcatsError::validation("Please enter an email address."));
    }
    if !INVITE_EMAIL_RE.is_match(trimmed) {
        return Err(BobcatsError::validation("Please enter a valid email address."));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Pres@UCMerced.EDU "), Some("pres@ucmerced.edu".to_string()));
        assert_eq!(normalize_email(""), None);
        assert_eq!(normalize_email("   "), None);
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email("a@b"), None);
    }

    #[test]
    fn test_list_excludes_contact_case_insensitively() {
        let officers = ["Lead@ucm.edu", "vp@ucm.edu", "LEAD@UCM.EDU", "treasurer@ucm.edu"];
        let out = normalize_email_list(&officers, Some("lead@ucm.edu"));
        assert_eq!(out, vec!["vp@ucm.edu", "treasurer@ucm.edu"]);
    }

    #[test]
    fn test_list_dedupes_keeping_first_order() {
        let officers = ["b@ucm.edu", "a@ucm.edu", " B@ucm.edu", "junk", "a@UCM.edu"];
        let out = normalize_email_list(&officers, None);
        assert_eq!(out, vec!["b@ucm.edu", "a@ucm.edu"]);
    }

    #[test]
    fn test_normalized_list_never_contains_contact_or_duplicates() {
        let contacts = ["x@ucm.edu", "X@UCM.EDU", " y@ucm.edu "];
        let lists: [&[&str]; 4] = [
            &["x@ucm.edu", "X@ucm.edu", "y@ucm.edu"],
            &["Y@UCM.EDU", "y@ucm.edu", "z@ucm.edu", "z@ucm.edu"],
            &[],
            &["bad", "x@ucm.edu"],
        ];
        for contact in contacts {
            for list in lists {
                let normalized = normalize_club_request_emails(contact, list).unwrap();
                assert!(!normalized.officer_emails.contains(&normalized.contact_email));
                let mut sorted = normalized.officer_emails.clone();
                sorted.sort();
                sorted.dedup();
                assert_eq!(sorted.len(), normalized.officer_emails.len());
            }
        }
    }

    #[test]
    fn test_invalid_contact_is_rejected() {
        let err = normalize_club_request_emails("nope", &["a@ucm.edu"]).unwrap_err();
        assert_eq!(err.to_string(), "Contact email is required and must be valid");
    }

    #[test]
    fn test_invite_email_rules() {
        assert_eq!(normalize_invite_email(" New@UCM.edu ").unwrap(), "new@ucm.edu");
        assert!(normalize_invite_email("").is_err());
        assert!(normalize_invite_email("a@@b.com").is_err());
        assert!(normalize_invite_email("a b@c.com").is_err());
    }
}
