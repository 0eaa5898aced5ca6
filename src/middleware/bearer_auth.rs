/// Bearer Access Token Middleware
///
/// Validates the access token in the `Authorization` header and injects the
/// caller's identity into request extensions for use by route handlers.
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::{bearer_token, validate_access_token};
use crate::error::{AuthError, CredentialError};

/// Identity of the caller, available to handlers as `web::ReqData<AuthenticatedUser>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

/// Middleware for protecting routes
///
/// Requests without a valid `Bearer` access token are answered with `401`
/// and never reach the wrapped service.
pub struct BearerAuth {
    signing_secret: Rc<str>,
}

impl BearerAuth {
    pub fn new(signing_secret: &str) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(BearerAuthService {
            service: Rc::new(service),
            signing_secret: self.signing_secret.clone(),
        }))
    }
}

pub struct BearerAuthService<S> {
    service: Rc<S>,
    signing_secret: Rc<str>,
}

fn authenticate(req: &ServiceRequest, signing_secret: &str) -> Result<Uuid, AuthError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| CredentialError::MalformedHeader)?,
        ),
        None => None,
    };

    let token = bearer_token(header)?;
    Ok(validate_access_token(token, signing_secret)?)
}

impl<S, B> Service<ServiceRequest> for BearerAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req, &self.signing_secret) {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                tracing::debug!(user_id = %user_id, path = %req.path(), "Request authenticated");

                let service = self.service.clone();
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            Err(e) => {
                let response = HttpResponse::from_error(e);
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
