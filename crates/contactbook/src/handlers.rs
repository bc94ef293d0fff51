//! Per-route request logic.
//!
//! Each handler validates its input, talks to the repository and decides what
//! happens next, returning an [`Outcome`]. Turning an outcome into an HTTP
//! response (rendering, cookies, flash storage) is the server's job.

use axum::http::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::contact::ContactForm;
use crate::error::Result;
use crate::render::View;
use crate::repository::{ContactRepository, GuardedWrite};
use crate::validation::{FieldError, NameCheck, Validator, MSG_NAME_TAKEN};

/// Flash text after a successful add.
pub const FLASH_ADDED: &str = "contact added";
/// Flash text after a successful update.
pub const FLASH_UPDATED: &str = "contact updated";
/// Flash text after a successful delete.
pub const FLASH_DELETED: &str = "contact deleted";

/// Where every successful mutation sends the browser.
pub const LIST_PATH: &str = "/contact";

/// What a handler decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Render a page with the given status.
    Page {
        /// HTTP status of the response.
        status: StatusCode,
        /// What to render.
        view: View,
    },
    /// Redirect, optionally leaving a flash message for the next render.
    Redirect {
        /// Target path.
        location: &'static str,
        /// Message for the target page.
        flash: Option<&'static str>,
    },
}

impl Outcome {
    /// A page with status 200.
    #[must_use]
    pub fn page(view: View) -> Self {
        Self::Page {
            status: StatusCode::OK,
            view,
        }
    }

    /// The Not-Found page with status 404.
    #[must_use]
    pub fn not_found() -> Self {
        Self::Page {
            status: StatusCode::NOT_FOUND,
            view: View::NotFound,
        }
    }

    /// Redirect to the contact list with a flash message.
    #[must_use]
    pub fn to_list(flash: &'static str) -> Self {
        Self::Redirect {
            location: LIST_PATH,
            flash: Some(flash),
        }
    }
}

/// Fields posted by the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateForm {
    /// Stored name of the contact being edited.
    pub old_name: String,
    /// New name.
    pub name: String,
    /// New email address.
    pub email: String,
    /// New phone number.
    pub phone: String,
}

impl UpdateForm {
    /// The new values, trimmed.
    #[must_use]
    pub fn contact_form(&self) -> ContactForm {
        ContactForm {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
        .trimmed()
    }
}

/// Route handlers over a repository and a validator.
#[derive(Debug)]
pub struct ContactHandlers {
    repository: ContactRepository,
    validator: Validator,
}

impl ContactHandlers {
    /// Create the handlers.
    #[must_use]
    pub fn new(repository: ContactRepository, validator: Validator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    /// The repository the handlers operate on.
    #[must_use]
    pub fn repository(&self) -> &ContactRepository {
        &self.repository
    }

    /// `GET /contact`: every contact plus the pending flash message.
    ///
    /// `take_flash` runs only after the contacts have loaded, so a message is
    /// never consumed by a request that ends in an error page.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or `take_flash` fails.
    pub fn list<F>(&self, take_flash: F) -> Result<Outcome>
    where
        F: FnOnce() -> Result<Option<String>>,
    {
        let contacts = self.repository.all()?;
        let msg = take_flash()?;
        Ok(Outcome::page(View::List { contacts, msg }))
    }

    /// `GET /contact/add`: an empty form.
    #[must_use]
    pub fn add_form(&self) -> Outcome {
        Outcome::page(View::AddForm {
            form: ContactForm::default(),
            errors: Vec::new(),
        })
    }

    /// `POST /contact`: validate and append a new contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn add(&self, form: &ContactForm) -> Result<Outcome> {
        let form = form.trimmed();
        let taken = !form.name.is_empty() && self.repository.exists_by_name(&form.name)?;
        let errors = self.validator.validate(&form, NameCheck::from(taken));
        if !errors.is_empty() {
            debug!("Rejected new contact {:?}: {} error(s)", form.name, errors.len());
            return Ok(Outcome::page(View::AddForm { form, errors }));
        }

        match self.repository.add_if_absent(form.clone().into_contact())? {
            GuardedWrite::Written => Ok(Outcome::to_list(FLASH_ADDED)),
            GuardedWrite::NameTaken | GuardedWrite::Missing => Ok(Outcome::page(View::AddForm {
                form,
                errors: vec![FieldError::new("name", MSG_NAME_TAKEN)],
            })),
        }
    }

    /// `GET /contact/edit/:name`: the edit form, prefilled.
    ///
    /// The lookup ignores case; the form carries the stored name so the update
    /// hits the right entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn edit_form(&self, name: &str) -> Result<Outcome> {
        let Some(contact) = self.repository.find_by_name(name)? else {
            debug!("No contact {name:?} to edit");
            return Ok(Outcome::not_found());
        };
        Ok(Outcome::page(View::EditForm {
            old_name: contact.name.clone(),
            form: ContactForm::from(&contact),
            errors: Vec::new(),
        }))
    }

    /// `POST /contact/update`: validate and replace a contact.
    ///
    /// Keeping the same name is always allowed; a new name must be unused.
    /// Responds Not-Found if no contact is stored under `old_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn update(&self, submitted: &UpdateForm) -> Result<Outcome> {
        let old_name = submitted.old_name.as_str();
        if self.repository.find_exact(old_name)?.is_none() {
            debug!("No contact {old_name:?} to update");
            return Ok(Outcome::not_found());
        }

        let form = submitted.contact_form();
        let taken = !form.name.is_empty()
            && form.name != old_name
            && self.repository.exists_by_name(&form.name)?;
        let errors = self.validator.validate(&form, NameCheck::from(taken));
        if !errors.is_empty() {
            debug!("Rejected update of {old_name:?}: {} error(s)", errors.len());
            return Ok(Outcome::page(View::EditForm {
                old_name: old_name.to_string(),
                form,
                errors,
            }));
        }

        match self
            .repository
            .update_if_available(old_name, form.clone().into_contact())?
        {
            GuardedWrite::Written => Ok(Outcome::to_list(FLASH_UPDATED)),
            GuardedWrite::Missing => Ok(Outcome::not_found()),
            GuardedWrite::NameTaken => Ok(Outcome::page(View::EditForm {
                old_name: old_name.to_string(),
                form,
                errors: vec![FieldError::new("name", MSG_NAME_TAKEN)],
            })),
        }
    }

    /// `GET /contact/delete/:name`: remove a contact by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn delete(&self, name: &str) -> Result<Outcome> {
        if self.repository.find_exact(name)?.is_none() {
            debug!("No contact {name:?} to delete");
            return Ok(Outcome::not_found());
        }
        self.repository.delete(name)?;
        Ok(Outcome::to_list(FLASH_DELETED))
    }

    /// `GET /contact/:name`: one contact, looked up ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn detail(&self, name: &str) -> Result<Outcome> {
        Ok(match self.repository.find_by_name(name)? {
            Some(contact) => Outcome::page(View::Detail { contact }),
            None => Outcome::not_found(),
        })
    }
}
