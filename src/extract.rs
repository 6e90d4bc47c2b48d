//! Request extractors that decode into typed models and reject with [`ApiError`].
//!
//! `ValidatedJson<T>` works like `axum::Json<T>` but also runs
//! `validator::Validate::validate()`. Field rule violations become a 422
//! with `field: rule` detail; undecodable bodies become a 400.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError::bad_request(format!("Invalid JSON: {}", rejection.body_text()))
        })?;

        value
            .validate()
            .map_err(|errors| ApiError::unprocessable(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// `axum::extract::Query` with a JSON `{message}` rejection.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut field_errors: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    field_errors.sort();

    if field_errors.is_empty() {
        "Validation failed".to_string()
    } else {
        field_errors.join("; ")
    }
}

/// `deserialize_with` helper: surrounding whitespace is stripped before validation.
pub fn trimmed<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(String::deserialize(d)?.trim().to_string())
}

/// [`trimmed`] for optional fields. Pair with `#[serde(default)]`.
pub fn trimmed_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(|s| s.trim().to_string()))
}

/// Trimmed and lowercased, the form emails are stored and looked up in.
pub fn email<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(crate::users::normalize_email(&String::deserialize(d)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Signup {
        #[serde(deserialize_with = "trimmed")]
        #[validate(length(min = 2))]
        name: String,
        #[serde(deserialize_with = "email")]
        #[validate(email)]
        email: String,
        #[serde(default, deserialize_with = "trimmed_opt")]
        #[validate(length(min = 2))]
        nickname: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: Option<i64>,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/body",
                post(|ValidatedJson(b): ValidatedJson<Signup>| async move {
                    format!("{}|{}", b.name, b.email)
                }),
            )
            .route(
                "/query",
                get(|QueryParams(p): QueryParams<Paging>| async move {
                    p.page.unwrap_or(1).to_string().into_response()
                }),
            )
    }

    fn json_post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/body")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let res = app()
            .oneshot(json_post(r#"{"name":"Ann","email":"ann@school.test"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn broken_json_is_400() {
        let res = app().oneshot(json_post("{nope")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rule_violations_are_422_with_fields() {
        let res = app()
            .oneshot(json_post(r#"{"name":"A","email":"not-an-email"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let msg = v["message"].as_str().unwrap();
        assert!(msg.contains("email"));
        assert!(msg.contains("name"));
    }

    #[tokio::test]
    async fn bad_query_is_400() {
        let req = Request::builder()
            .uri("/query?page=abc")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fields_are_normalized_before_rules_run() {
        let res = app()
            .oneshot(json_post(
                r#"{"name":"  Ann ","email":"  Ann@School.TEST ","nickname":" Annie "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Ann|ann@school.test");

        for body in [
            r#"{"name":" a ","email":"ann@school.test"}"#,
            r#"{"name":"Ann","email":"ann@school.test","nickname":"  x  "}"#,
        ] {
            let res = app().oneshot(json_post(body)).await.unwrap();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        }
    }
}
