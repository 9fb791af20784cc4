use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::BookingError;

/// Bearer-токен пользователя. Сам сервис его не проверяет - он просто
/// передаётся backend-у, который и отвечает за аутентификацию.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Bearer auth extractor
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Получаем заголовок Authorization
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(BookingError::Unauthorized)?;

        // Проверяем что это Bearer и токен не пустой
        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(BookingError::Unauthorized)?;

        Ok(AuthToken::new(token))
    }
}
