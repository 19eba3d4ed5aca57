//! Club request form validation and normalization.

use std::collections::BTreeMap;

use bobcats_common::email::{normalize_club_request_emails, NormalizedEmails};
use bobcats_common::{BobcatsError, Result};
use serde::Deserialize;
use uuid::Uuid;

/// Raw submission or edit payload as posted by the request form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClubRequestForm {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub slug_candidate: Option<String>,
    pub contact_email: String,
    pub officer_emails: Vec<String>,
    pub officer_phones: Vec<String>,
    /// Ignored on edit; images are replaced through the upload action.
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: BTreeMap<Uuid, String>,
}

/// A form that passed validation, with every field in stored shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedForm {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub slug_candidate: Option<String>,
    pub emails: NormalizedEmails,
    pub officer_phones: Vec<String>,
    pub logo_url: Option<String>,
    pub banner_url: Option<String>,
    pub tags: Vec<String>,
    pub major_ids: Vec<Uuid>,
    pub major_notes: Vec<(Uuid, String)>,
}

/// Trimmed, lowercased, blanks and repeats dropped, first occurrence kept.
pub(crate) fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

pub(crate) fn distinct_ids(raw: &[Uuid]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(raw.len());
    for id in raw {
        if !ids.contains(id) {
            ids.push(*id);
        }
    }
    ids
}

/// Non-blank notes, trimmed.
pub(crate) fn normalize_notes(raw: &BTreeMap<Uuid, String>) -> Vec<(Uuid, String)> {
    raw.iter()
        .filter_map(|(id, note)| {
            let note = note.trim();
            (!note.is_empty()).then(|| (*id, note.to_string()))
        })
        .collect()
}

pub(crate) fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ClubRequestForm {
    /// Check required fields in form order, then normalize.
    pub fn validate(&self) -> Result<ValidatedForm> {
        if self.name.trim().is_empty() {
            return Err(BobcatsError::validation("Club name is required"));
        }
        if self.description.trim().is_empty() {
            return Err(BobcatsError::validation("Description is required"));
        }
        if self.contact_email.trim().is_empty() {
            return Err(BobcatsError::validation("Contact email is required"));
        }
        if self.officer_emails.is_empty() {
            return Err(BobcatsError::validation("At least one officer email is required"));
        }

        let emails = normalize_club_request_emails(&self.contact_email, &self.officer_emails)?;
        if emails.officer_emails.is_empty() {
            return Err(BobcatsError::validation(
                "At least one officer email is required (after removing duplicates and the contact email)",
            ));
        }

        let tags = normalize_tags(&self.tags);
        let major_ids = distinct_ids(&self.major_ids);
        let major_notes = normalize_notes(&self.major_notes);

        Ok(ValidatedForm {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            website: blank_to_none(&self.website),
            slug_candidate: blank_to_none(&self.slug_candidate),
            emails,
            officer_phones: self
                .officer_phones
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            logo_url: blank_to_none(&self.logo_url),
            banner_url: blank_to_none(&self.banner_url),
            tags,
            major_ids,
            major_notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ClubRequestForm {
        ClubRequestForm {
            name: "  Robotics Club ".into(),
            description: "Build robots".into(),
            contact_email: "Lead@UCMerced.edu".into(),
            officer_emails: vec!["vp@ucmerced.edu".into()],
            ..Default::default()
        }
    }

    fn message(form: &ClubRequestForm) -> String {
        form.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_required_fields_checked_in_order() {
        let mut form = ClubRequestForm::default();
        assert_eq!(message(&form), "Club name is required");
        form.name = "Chess".into();
        assert_eq!(message(&form), "Description is required");
        form.description = "Games".into();
        assert_eq!(message(&form), "Contact email is required");
        form.contact_email = "lead@ucmerced.edu".into();
        assert_eq!(message(&form), "At least one officer email is required");
    }

    #[test]
    fn test_officer_list_equal_to_contact_fails() {
        let mut form = valid_form();
        form.officer_emails = vec!["LEAD@ucmerced.edu".into(), " lead@ucmerced.edu".into(), "junk".into()];
        assert_eq!(
            message(&form),
            "At least one officer email is required (after removing duplicates and the contact email)"
        );
    }

    #[test]
    fn test_invalid_contact_email() {
        let mut form = valid_form();
        form.contact_email = "lead-at-ucmerced".into();
        assert_eq!(message(&form), "Contact email is required and must be valid");
    }

    #[test]
    fn test_normalizes_optional_fields_and_children() {
        let mut form = valid_form();
        form.website = Some("   ".into());
        form.slug_candidate = Some(" robotics ".into());
        form.officer_phones = vec![" 555-0100 ".into(), "  ".into()];
        form.tags = vec![" STEM ".into(), "".into(), "stem".into(), "Hardware".into()];
        let keep = Uuid::new_v4();
        let blank = Uuid::new_v4();
        form.major_ids = vec![keep, keep, blank];
        form.major_notes = BTreeMap::from([(keep, " core ".to_string()), (blank, "   ".to_string())]);

        let v = form.validate().unwrap();
        assert_eq!(v.name, "Robotics Club");
        assert_eq!(v.website, None);
        assert_eq!(v.slug_candidate.as_deref(), Some("robotics"));
        assert_eq!(v.emails.contact_email, "lead@ucmerced.edu");
        assert_eq!(v.officer_phones, vec!["555-0100"]);
        assert_eq!(v.tags, vec!["stem", "hardware"]);
        assert_eq!(v.major_ids, vec![keep, blank]);
        assert_eq!(v.major_notes, vec![(keep, "core".to_string())]);
    }

    #[test]
    fn test_form_deserializes_with_missing_fields() {
        let form: ClubRequestForm = serde_json::from_str(r#"{"name":"Chess"}"#).unwrap();
        assert_eq!(form.name, "Chess");
        assert!(form.officer_emails.is_empty());
    }
}
