/// JWT Authentication Middleware
///
/// Validates the bearer access token from the Authorization header and
/// injects its `AccessClaims` into request extensions for route handlers
/// (read them with `web::ReqData<AccessClaims>`).

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{AccessClaims, TokenIssuer};
use crate::domain::Role;
use crate::error::{AppError, AuthError};

/// JWT middleware for protecting routes
///
/// With no allowed roles any valid access token passes. Otherwise the
/// token's role must be one of them, or the request fails with 403.
#[derive(Clone)]
pub struct JwtMiddleware {
    tokens: TokenIssuer,
    roles: Vec<Role>,
}

impl JwtMiddleware {
    pub fn new(tokens: TokenIssuer) -> Self {
        Self {
            tokens,
            roles: Vec::new(),
        }
    }

    /// Admit tokens carrying `role`
    pub fn allow(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }
}

/// Extract the token from an `Authorization: Bearer <jwt>` header value
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
            roles: self.roles.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenIssuer,
    roles: Vec<Role>,
}

impl<S> JwtMiddlewareService<S> {
    fn authenticate(&self, req: &ServiceRequest) -> Result<AccessClaims, AppError> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Auth(AuthError::MissingToken))?;

        let claims = self.tokens.validate_access_token(token)?;

        if !self.roles.is_empty() && !self.roles.contains(&claims.role) {
            tracing::warn!(
                account_id = %claims.sub,
                role = %claims.role,
                path = %req.path(),
                "Access token role not permitted for route"
            );
            return Err(AppError::Auth(AuthError::Forbidden));
        }

        Ok(claims)
    }
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.authenticate(&req) {
            Ok(claims) => {
                tracing::debug!(
                    account_id = %claims.sub,
                    role = %claims.role,
                    "JWT validated successfully"
                );
                req.extensions_mut().insert(claims);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }
}
