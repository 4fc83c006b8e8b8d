use std::future::Future;

use anyhow::Context;
use reqwest::{Client, Method, StatusCode, Url};
use taskdeck_shared::{CreateUserRequest, CreateUserResponse, USERS_PATH, UserResponse};
use tracing::{info, instrument, warn};

use crate::error::{RepositoryError, UserError};
use crate::repository::{endpoint, execute, parse_base_url, with_json};
use crate::session::Session;

const CREATE_USER_FALLBACK: &str = "No se pudo crear el usuario";

pub trait UserRepository {
    fn lookup(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<UserResponse, RepositoryError>> + Send;

    fn create(
        &self,
        request: &CreateUserRequest,
    ) -> impl Future<Output = Result<CreateUserResponse, RepositoryError>> + Send;
}

/// `/users` endpoints. These are unauthenticated.
#[derive(Debug, Clone)]
pub struct HttpUserRepository {
    client: Client,
    base: Url,
}

impl HttpUserRepository {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = parse_base_url(base_url)?;
        let client = Client::builder()
            .build()
            .context("failed building HTTP client for user API")?;
        Ok(Self { client, base })
    }
}

impl UserRepository for HttpUserRepository {
    #[instrument(skip(self))]
    async fn lookup(&self, email: &str) -> Result<UserResponse, RepositoryError> {
        let url = endpoint(&self.base, &[USERS_PATH, email]);
        execute(self.client.get(url.clone()), &Method::GET, &url).await
    }

    #[instrument(skip(self, request))]
    async fn create(
        &self,
        request: &CreateUserRequest,
    ) -> Result<CreateUserResponse, RepositoryError> {
        let url = endpoint(&self.base, &[USERS_PATH]);
        let builder = with_json(self.client.post(url.clone()), request, &url)?;
        execute(builder, &Method::POST, &url).await
    }
}

/// Resolves the account for `email`, provisioning it on first login, and
/// stores the resulting token in `session`.
#[instrument(skip(users, session))]
pub async fn login<U: UserRepository>(
    users: &U,
    session: &Session,
    email: &str,
) -> Result<String, UserError> {
    let token = resolve_account(users, email).await?;
    session.set_token(token.clone());
    Ok(token)
}

pub async fn resolve_account<U: UserRepository>(
    users: &U,
    email: &str,
) -> Result<String, UserError> {
    match users.lookup(email).await {
        Ok(found) if found.exists => {
            if let Some(token) = found.token.filter(|token| !token.is_empty()) {
                info!("existing account resolved");
                return Ok(token);
            }
            warn!("lookup reported an existing user without token; provisioning");
        }
        Ok(_) => info!("no account for email; provisioning"),
        Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => {
            info!("lookup returned 404; provisioning")
        }
        Err(err) => return Err(err.into()),
    }

    let created = users
        .create(&CreateUserRequest {
            mail: email.to_string(),
        })
        .await?;

    match created.token.filter(|token| !token.is_empty()) {
        Some(token) if created.success => Ok(token),
        _ => Err(UserError::Rejected(
            created
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| CREATE_USER_FALLBACK.to_string()),
        )),
    }
}
