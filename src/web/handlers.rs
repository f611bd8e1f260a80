use crate::utils::error::MarktError;
use crate::web::query::PageParams;
use crate::web::view::{NotFoundPage, WeekPage};
use crate::web::AppState;
use askama::Template;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "markt_session";

impl IntoResponse for MarktError {
    fn into_response(self) -> Response {
        tracing::error!(
            category = ?self.category(),
            severity = ?self.severity(),
            "❌ Request failed: {}",
            self
        );
        (StatusCode::INTERNAL_SERVER_ERROR, self.user_friendly_message()).into_response()
    }
}

/// Session id from the `Cookie` header, if it looks like one we issued.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| {
            !value.is_empty() && value.len() <= 64 && value.bytes().all(|b| b.is_ascii_alphanumeric())
        })
        .map(str::to_string)
}

fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub async fn week_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response, MarktError> {
    let params = match pairs {
        Ok(Query(pairs)) => PageParams::from_pairs(pairs),
        Err(rejection) => {
            tracing::warn!("Unreadable query string, showing the current week: {}", rejection);
            PageParams::default()
        }
    };
    let request = params.into_request();

    let (overview, new_session) = state.overview(&headers, &request).await?;
    let page = WeekPage::new(&state.title, &overview, state.service.directory());
    let body = page.render()?;

    let mut response = ([(CACHE_CONTROL, "no-store")], Html(body)).into_response();
    if let Some(id) = new_session {
        match HeaderValue::from_str(&session_cookie(&id)) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Session cookie not set: {}", e),
        }
    }
    Ok(response)
}

pub async fn not_found(State(state): State<Arc<AppState>>) -> Result<Response, MarktError> {
    let page = NotFoundPage {
        title: state.title.clone(),
    };
    Ok((StatusCode::NOT_FOUND, Html(page.render()?)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; markt_session=abc123DEF; other=1"),
        );
        assert_eq!(session_id(&headers).as_deref(), Some("abc123DEF"));
    }

    #[test]
    fn foreign_or_odd_session_values_are_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("markt_session=../../etc"));
        assert_eq!(session_id(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("markt_session="));
        assert_eq!(session_id(&headers), None);
    }
}
