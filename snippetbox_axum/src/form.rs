use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};

use snippetbox::FormData;

use crate::error::WebError;

/// Extracts an `application/x-www-form-urlencoded` request body as [`FormData`].
///
/// Any other content type, an unreadable body, or an undecodable body is a 400.
#[derive(Debug, Clone)]
pub struct PostForm(pub FormData);

impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| {
                mime.trim()
                    .eq_ignore_ascii_case("application/x-www-form-urlencoded")
            });
        if !is_form {
            return Err(WebError::BadRequest(
                "expected a urlencoded form body".to_string(),
            ));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| WebError::BadRequest(e.body_text()))?;

        Ok(PostForm(FormData::parse_urlencoded(&body)?))
    }
}
