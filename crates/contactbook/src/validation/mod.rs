//! Form validation for contacts.
//!
//! Validation is a pure check that produces a list of [`FieldError`]s; an
//! empty list means the form may be saved. Whether the submitted name is
//! already taken is decided by the caller (it needs the repository) and passed
//! in as a [`NameCheck`].
//!
//! # Example
//!
//! ```
//! use contactbook::contact::ContactForm;
//! use contactbook::validation::{NameCheck, Validator};
//!
//! let validator = Validator::new("id-ID").unwrap();
//! let form = ContactForm {
//!     name: "Amy".to_string(),
//!     email: "bad-email".to_string(),
//!     phone: "081234567890".to_string(),
//! };
//!
//! let errors = validator.validate(&form, NameCheck::Available);
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].field, "email");
//! ```

mod patterns;

use regex::Regex;
use serde::Serialize;

use crate::contact::ContactForm;
use crate::error::{Error, Result};

pub use patterns::{
    phone_pattern, supported_regions, PhonePattern, DEFAULT_PHONE_REGION, EMAIL_PATTERN,
    PHONE_PATTERNS,
};

/// Message shown when the name is empty.
pub const MSG_NAME_REQUIRED: &str = "name is required";
/// Message shown when the name is already used by another contact.
pub const MSG_NAME_TAKEN: &str = "contact already exists";
/// Message shown for a malformed email address.
pub const MSG_INVALID_EMAIL: &str = "invalid email";
/// Message shown for a malformed phone number.
pub const MSG_INVALID_PHONE: &str = "invalid phone number";

/// A problem with one submitted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Form field name (`name`, `email` or `phone`).
    pub field: &'static str,
    /// Message for the user.
    pub message: String,
}

impl FieldError {
    /// Attach `message` to `field`.
    #[must_use]
    pub fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Outcome of the caller's uniqueness lookup for the submitted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCheck {
    /// No other contact uses the name (or it is the contact's own name).
    Available,
    /// Another contact already uses the name.
    Taken,
}

impl From<bool> for NameCheck {
    fn from(taken: bool) -> Self {
        if taken {
            Self::Taken
        } else {
            Self::Available
        }
    }
}

/// Compiled field grammars for one phone region.
#[derive(Debug, Clone)]
pub struct Validator {
    region: &'static str,
    email: Regex,
    phone: Regex,
}

impl Validator {
    /// Build a validator for the given phone region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the region is not supported.
    pub fn new(region: &str) -> Result<Self> {
        let pattern = phone_pattern(region).ok_or_else(|| {
            Error::config_validation(format!(
                "unknown phone region: {region} (supported: {})",
                supported_regions().join(", ")
            ))
        })?;

        Ok(Self {
            region: pattern.region,
            email: compile(EMAIL_PATTERN)?,
            phone: compile(pattern.pattern)?,
        })
    }

    /// The phone region this validator checks against.
    #[must_use]
    pub fn region(&self) -> &'static str {
        self.region
    }

    /// Check an email address.
    #[must_use]
    pub fn is_valid_email(&self, email: &str) -> bool {
        let Some((local, _)) = email.rsplit_once('@') else {
            return false;
        };
        email.len() <= patterns::EMAIL_MAX_LEN
            && local.len() <= patterns::EMAIL_LOCAL_MAX_LEN
            && self.email.is_match(email)
    }

    /// Check a phone number against the configured region.
    #[must_use]
    pub fn is_valid_phone(&self, phone: &str) -> bool {
        self.phone.is_match(phone)
    }

    /// Validate a submitted form.
    ///
    /// Errors are reported in field order: name, email, phone. The name is
    /// only reported as taken when it is non-empty.
    #[must_use]
    pub fn validate(&self, form: &ContactForm, name: NameCheck) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if form.name.is_empty() {
            errors.push(FieldError::new("name", MSG_NAME_REQUIRED));
        } else if name == NameCheck::Taken {
            errors.push(FieldError::new("name", MSG_NAME_TAKEN));
        }

        if !self.is_valid_email(&form.email) {
            errors.push(FieldError::new("email", MSG_INVALID_EMAIL));
        }

        if !self.is_valid_phone(&form.phone) {
            errors.push(FieldError::new("phone", MSG_INVALID_PHONE));
        }

        errors
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::internal(format!("invalid built-in pattern: {e}")))
}
