//! HTTP surface.
//!
//! Routes map onto [`ContactHandlers`]; this module owns everything that is
//! about HTTP itself: extracting input, the session cookie, storing and
//! consuming flash messages, rendering, and the error boundary that turns any
//! [`Error`] into a 500 page.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use tracing::{error, info};

use crate::config::Config;
use crate::contact::ContactForm;
use crate::error::{Error, Result};
use crate::handlers::{ContactHandlers, Outcome, UpdateForm};
use crate::logging::log_requests;
use crate::render::{HtmlRenderer, Renderer, View};
use crate::repository::ContactRepository;
use crate::session::{FlashStore, SessionId, FLASH_MSG};
use crate::storage::RecordStore;
use crate::validation::Validator;

/// Shared state behind every route.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    handlers: ContactHandlers,
    flash: FlashStore,
    renderer: Box<dyn Renderer>,
    cookie_name: String,
    cookie_max_age: Duration,
}

impl AppState {
    /// Assemble state from its parts.
    #[must_use]
    pub fn new(
        handlers: ContactHandlers,
        flash: FlashStore,
        renderer: Box<dyn Renderer>,
        cookie_name: impl Into<String>,
        cookie_max_age: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                handlers,
                flash,
                renderer,
                cookie_name: cookie_name.into(),
                cookie_max_age,
            }),
        }
    }

    /// Open the store and build state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be initialised or the phone
    /// region is unknown.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = RecordStore::open(config.store_path())?;
        let validator = Validator::new(&config.validation.phone_region)?;
        info!("Checking phone numbers against the {} format", validator.region());
        Ok(Self::new(
            ContactHandlers::new(ContactRepository::new(store), validator),
            FlashStore::new(config.session_max_age()),
            Box::new(HtmlRenderer),
            config.session.cookie_name.clone(),
            config.session_max_age(),
        ))
    }

    /// The route handlers.
    #[must_use]
    pub fn handlers(&self) -> &ContactHandlers {
        &self.inner.handlers
    }

    fn session(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.inner.cookie_name)
            .and_then(|(_, value)| SessionId::parse(value))
    }

    fn session_cookie(&self, session: &SessionId) -> Result<HeaderValue> {
        let max_age = self.inner.cookie_max_age.as_secs().max(1);
        let cookie = format!(
            "{}={session}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
            self.inner.cookie_name
        );
        HeaderValue::from_str(&cookie)
            .map_err(|e| Error::internal(format!("invalid session cookie: {e}")))
    }

    fn render(&self, status: StatusCode, view: &View) -> Response {
        (status, Html(self.inner.renderer.render(view))).into_response()
    }

    /// Turn a handler result into a response. This is the error boundary.
    fn respond(&self, session: Option<SessionId>, result: Result<Outcome>) -> Response {
        match result.and_then(|outcome| self.finish(session, outcome)) {
            Ok(response) => response,
            Err(err) => {
                error!("Request failed: {err}");
                self.render(StatusCode::INTERNAL_SERVER_ERROR, &View::ServerError)
            }
        }
    }

    fn finish(&self, session: Option<SessionId>, outcome: Outcome) -> Result<Response> {
        match outcome {
            Outcome::Page { status, view } => Ok(self.render(status, &view)),
            Outcome::Redirect {
                location,
                flash: None,
            } => Ok(Redirect::to(location).into_response()),
            Outcome::Redirect {
                location,
                flash: Some(msg),
            } => {
                let session = session.unwrap_or_else(SessionId::generate);
                self.inner.flash.set(&session, FLASH_MSG, msg)?;
                let mut response = Redirect::to(location).into_response();
                response
                    .headers_mut()
                    .append(header::SET_COOKIE, self.session_cookie(&session)?);
                Ok(response)
            }
        }
    }
}

/// Build the router with every route.
///
/// Unknown paths and unrouted methods on known paths both get the Not-Found
/// page.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home).fallback(not_found))
        .route("/about", get(about).fallback(not_found))
        .route(
            "/contact",
            get(list_contacts).post(add_contact).fallback(not_found),
        )
        .route("/contact/add", get(add_contact_form).fallback(not_found))
        .route("/contact/update", post(update_contact).fallback(not_found))
        .route(
            "/contact/edit/:name",
            get(edit_contact_form).fallback(not_found),
        )
        .route(
            "/contact/delete/:name",
            get(delete_contact).fallback(not_found),
        )
        .route("/contact/:name", get(contact_detail).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Initialise the store, bind and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the store cannot be initialised, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let state = AppState::from_config(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    info!(
        "Serving contacts from {} on http://{addr}",
        config.store_path().display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}

async fn home(State(state): State<AppState>) -> Response {
    state.respond(None, Ok(Outcome::page(View::Home)))
}

async fn about(State(state): State<AppState>) -> Response {
    state.respond(None, Ok(Outcome::page(View::About)))
}

async fn list_contacts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.session(&headers);
    let result = state.handlers().list(|| match &session {
        Some(id) => state.inner.flash.consume(id, FLASH_MSG),
        None => Ok(None),
    });
    state.respond(session, result)
}

async fn add_contact_form(State(state): State<AppState>) -> Response {
    state.respond(None, Ok(state.handlers().add_form()))
}

async fn add_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ContactForm>,
) -> Response {
    let session = state.session(&headers);
    let result = state.handlers().add(&form);
    state.respond(session, result)
}

async fn edit_contact_form(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let result = state.handlers().edit_form(&name);
    state.respond(None, result)
}

async fn update_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<UpdateForm>,
) -> Response {
    let session = state.session(&headers);
    let result = state.handlers().update(&form);
    state.respond(session, result)
}

async fn delete_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    let session = state.session(&headers);
    let result = state.handlers().delete(&name);
    state.respond(session, result)
}

async fn contact_detail(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let result = state.handlers().detail(&name);
    state.respond(None, result)
}

async fn not_found(State(state): State<AppState>) -> Response {
    state.respond(None, Ok(Outcome::not_found()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn test_state() -> (TempDir, AppState) {
        let dir = tempdir().expect("temp dir");
        let mut config = Config::default();
        config.storage.path = Some(dir.path().join("contacts.json"));
        let state = AppState::from_config(&config).expect("state");
        (dir, state)
    }

    #[test]
    fn test_session_from_cookie_header() {
        let (_dir, state) = test_state();
        let id = SessionId::generate();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; contactbook_session={id}")).unwrap(),
        );
        assert_eq!(state.session(&headers), Some(id));
    }

    #[test]
    fn test_session_ignores_other_cookies() {
        let (_dir, state) = test_state();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("other=abc"));
        assert!(state.session(&headers).is_none());
        assert!(state.session(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let (_dir, state) = test_state();
        let id = SessionId::generate();
        let cookie = state.session_cookie(&id).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("contactbook_session={id}")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=6"));
    }

    #[test]
    fn test_redirect_with_flash_sets_cookie() {
        let (_dir, state) = test_state();
        let response = state.respond(None, Ok(Outcome::to_list("contact added")));

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/contact");
        assert!(response.headers().contains_key(header::SET_COOKIE));
        assert_eq!(state.inner.flash.len().unwrap(), 1);
    }

    #[test]
    fn test_error_becomes_500() {
        let (_dir, state) = test_state();
        let response = state.respond(None, Err(Error::internal("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_flash_kept_until_list_renders() {
        let (dir, state) = test_state();
        let id = SessionId::generate();
        state.inner.flash.set(&id, FLASH_MSG, "contact deleted").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("contactbook_session={id}")).unwrap(),
        );

        std::fs::write(dir.path().join("contacts.json"), "not json").unwrap();
        let response = list_contacts(State(state.clone()), headers).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            state.inner.flash.consume(&id, FLASH_MSG).unwrap().as_deref(),
            Some("contact deleted")
        );
    }

    #[test]
    fn test_not_found_page_status() {
        let (_dir, state) = test_state();
        let response = state.respond(None, Ok(Outcome::not_found()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
