//! Page rendering.
//!
//! Handlers describe what to show as a [`View`]; a [`Renderer`] turns it into
//! an HTML document. [`HtmlRenderer`] is the built-in implementation: one
//! shared layout, all values escaped.

use std::fmt::{self, Write as _};

use crate::contact::{Collection, Contact, ContactForm};
use crate::validation::FieldError;

/// A page to be rendered, with everything it displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Landing page.
    Home,
    /// About page.
    About,
    /// Every contact, plus the pending flash message if any.
    List {
        /// Contacts in stored order.
        contacts: Collection,
        /// Flash message consumed for this render.
        msg: Option<String>,
    },
    /// Form for a new contact.
    AddForm {
        /// Values to prefill.
        form: ContactForm,
        /// Problems with a previous submission.
        errors: Vec<FieldError>,
    },
    /// Form for changing an existing contact.
    EditForm {
        /// The stored name the edit applies to.
        old_name: String,
        /// Values to prefill.
        form: ContactForm,
        /// Problems with a previous submission.
        errors: Vec<FieldError>,
    },
    /// A single contact.
    Detail {
        /// The contact shown.
        contact: Contact,
    },
    /// Minimal page for a missing route or contact.
    NotFound,
    /// Minimal page for a server fault.
    ServerError,
}

impl View {
    /// Page title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About",
            Self::List { .. } => "Contacts",
            Self::AddForm { .. } => "Add Contact",
            Self::EditForm { .. } => "Edit Contact",
            Self::Detail { .. } => "Contact Detail",
            Self::NotFound => "Not Found",
            Self::ServerError => "Server Error",
        }
    }
}

/// Turns a [`View`] into a complete HTML document.
pub trait Renderer: Send + Sync + fmt::Debug {
    /// Render the view.
    fn render(&self, view: &View) -> String;
}

/// Built-in HTML renderer.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, view: &View) -> String {
        let body = match view {
            View::Home => home(),
            View::About => about(),
            View::List { contacts, msg } => list(contacts, msg.as_deref()),
            View::AddForm { form, errors } => contact_form("/contact", None, form, errors),
            View::EditForm {
                old_name,
                form,
                errors,
            } => contact_form("/contact/update", Some(old_name), form, errors),
            View::Detail { contact } => detail(contact),
            View::NotFound => "<h1>404</h1>\n<p>Page not found.</p>\n".to_string(),
            View::ServerError => "<h1>500</h1>\n<p>Something went wrong.</p>\n".to_string(),
        };
        layout(view.title(), &body)
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encode a name for use as a path segment.
#[must_use]
pub fn encode_segment(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n\
         <nav><a href=\"/\">Home</a> | <a href=\"/about\">About</a> | <a href=\"/contact\">Contacts</a></nav>\n\
         <main>\n{body}</main>\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn home() -> String {
    "<h1>Contact Book</h1>\n<p><a href=\"/contact\">Browse contacts</a></p>\n".to_string()
}

fn about() -> String {
    "<h1>About</h1>\n<p>A small contact book: names, email addresses and phone numbers.</p>\n"
        .to_string()
}

fn list(contacts: &[Contact], msg: Option<&str>) -> String {
    let mut out = String::from("<h1>Contacts</h1>\n");
    if let Some(msg) = msg {
        let _ = writeln!(out, "<p class=\"flash\">{}</p>", escape(msg));
    }
    out.push_str("<p><a href=\"/contact/add\">Add contact</a></p>\n");
    if contacts.is_empty() {
        out.push_str("<p class=\"empty\">No contacts yet.</p>\n");
        return out;
    }
    out.push_str("<table>\n<tr><th>#</th><th>Name</th><th>Phone</th><th></th></tr>\n");
    for (i, contact) in contacts.iter().enumerate() {
        let _ = writeln!(
            out,
            "<tr class=\"contact\"><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/contact/{}\">detail</a></td></tr>",
            i + 1,
            escape(&contact.name),
            escape(&contact.phone),
            encode_segment(&contact.name),
        );
    }
    out.push_str("</table>\n");
    out
}

fn contact_form(
    action: &str,
    old_name: Option<&str>,
    form: &ContactForm,
    errors: &[FieldError],
) -> String {
    let mut out = String::new();
    if !errors.is_empty() {
        out.push_str("<ul class=\"errors\">\n");
        for err in errors {
            let _ = writeln!(
                out,
                "<li data-field=\"{}\">{}</li>",
                err.field,
                escape(&err.message)
            );
        }
        out.push_str("</ul>\n");
    }
    let _ = writeln!(out, "<form method=\"post\" action=\"{action}\">");
    if let Some(old_name) = old_name {
        let _ = writeln!(
            out,
            "<input type=\"hidden\" name=\"old_name\" value=\"{}\">",
            escape(old_name)
        );
    }
    for (field, label, value, kind) in [
        ("name", "Name", &form.name, "text"),
        ("email", "Email", &form.email, "email"),
        ("phone", "Phone", &form.phone, "tel"),
    ] {
        let _ = writeln!(
            out,
            "<label>{label} <input type=\"{kind}\" name=\"{field}\" value=\"{}\" required></label>",
            escape(value)
        );
    }
    let submit = if old_name.is_some() { "Save" } else { "Add" };
    let _ = writeln!(out, "<button type=\"submit\">{submit}</button>\n</form>");
    out
}

fn detail(contact: &Contact) -> String {
    let segment = encode_segment(&contact.name);
    format!(
        "<h1>{name}</h1>\n<dl>\n<dt>Email</dt><dd>{email}</dd>\n<dt>Phone</dt><dd>{phone}</dd>\n</dl>\n\
         <p><a href=\"/contact/edit/{segment}\">Edit</a> | \
         <a href=\"/contact/delete/{segment}\">Delete</a> | \
         <a href=\"/contact\">Back</a></p>\n",
        name = escape(&contact.name),
        email = escape(&contact.email),
        phone = escape(&contact.phone),
    )
}
