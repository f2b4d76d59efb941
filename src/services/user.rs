use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::{Authority, NewUser, User},
    repositories::UserRepository,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .filter(|user| !user.is_deleted())
            .ok_or(AppError::NoSuchUser)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<User, AppError> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::BadRequest("a valid email is required".into()));
        }
        if request.password.len() < 8 {
            return Err(AppError::BadRequest(
                "password must be at least 8 characters".into(),
            ));
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("name must not be empty".into()));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let user = self
            .users
            .insert(&NewUser {
                email,
                name: name.to_string(),
                password_hash: hash_password(&request.password)?,
                authority: Authority::User,
            })
            .await?;
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password both map to `Unauthorized`.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<User, AppError> {
        let email = request.email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .filter(|user| !user.is_deleted())
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| AppError::Other(anyhow::anyhow!("salt encoding failed: {err}")))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| AppError::Other(anyhow::anyhow!("stored hash is invalid: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
