//! Core contact types for contactbook.
//!
//! A [`Contact`] is identified by its `name`; there is no surrogate id.

use serde::{Deserialize, Serialize};

/// A single entry in the contact book.
///
/// Field names are the persisted contract: the backing file holds an array of
/// objects with exactly these keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// Display name, also the natural key of the collection.
    pub name: String,

    /// Email address.
    pub email: String,

    /// Mobile phone number in the configured regional format.
    pub phone: String,
}

impl Contact {
    /// Create a new contact.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Exact, case-sensitive name comparison.
    ///
    /// Used for uniqueness checks and for picking the entry to remove.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    /// Case-insensitive name comparison, used for lookups from URLs.
    #[must_use]
    pub fn name_matches_ignore_case(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// The full, ordered set of contacts persisted as one unit.
pub type Collection = Vec<Contact>;

/// Contact fields as submitted through the add and edit forms.
///
/// Missing fields deserialize as empty strings so that they surface as
/// validation messages instead of request rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    /// Submitted name.
    pub name: String,
    /// Submitted email address.
    pub email: String,
    /// Submitted phone number.
    pub phone: String,
}

impl ContactForm {
    /// Copy of the form with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// Convert into a contact without further checks.
    #[must_use]
    pub fn into_contact(self) -> Contact {
        Contact::new(self.name, self.email, self.phone)
    }
}

impl From<&Contact> for ContactForm {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contact() {
        let contact = Contact::new("Amy", "amy@x.com", "081234567890");
        assert_eq!(contact.name, "Amy");
        assert_eq!(contact.email, "amy@x.com");
        assert_eq!(contact.phone, "081234567890");
    }

    #[test]
    fn test_has_name_is_case_sensitive() {
        let contact = Contact::new("Amy", "amy@x.com", "081234567890");
        assert!(contact.has_name("Amy"));
        assert!(!contact.has_name("amy"));
        assert!(!contact.has_name("Amy "));
    }

    #[test]
    fn test_name_matches_ignore_case() {
        let contact = Contact::new("Amy", "amy@x.com", "081234567890");
        assert!(contact.name_matches_ignore_case("AMY"));
        assert!(contact.name_matches_ignore_case("amy"));
        assert!(!contact.name_matches_ignore_case("Amelia"));
    }

    #[test]
    fn test_serialized_field_names() {
        let contact = Contact::new("Amy", "amy@x.com", "081234567890");
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["name"], "Amy");
        assert_eq!(json["email"], "amy@x.com");
        assert_eq!(json["phone"], "081234567890");
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_form_trimmed() {
        let form = ContactForm {
            name: "  Amy ".to_string(),
            email: "amy@x.com\n".to_string(),
            phone: "\t081234567890".to_string(),
        };
        assert_eq!(
            form.trimmed().into_contact(),
            Contact::new("Amy", "amy@x.com", "081234567890")
        );
    }

    #[test]
    fn test_form_missing_fields_default_to_empty() {
        let form: ContactForm = serde_json::from_str(r#"{"name": "Amy"}"#).unwrap();
        assert_eq!(form.name, "Amy");
        assert!(form.email.is_empty());
        assert!(form.phone.is_empty());
    }

    #[test]
    fn test_form_from_contact() {
        let contact = Contact::new("Amy", "amy@x.com", "081234567890");
        assert_eq!(ContactForm::from(&contact).into_contact(), contact);
    }

    #[test]
    fn test_deserialize_rejects_missing_field() {
        let result: std::result::Result<Contact, _> =
            serde_json::from_str(r#"{"name": "Amy", "email": "amy@x.com"}"#);
        assert!(result.is_err());
    }
}
