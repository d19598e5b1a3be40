use std::sync::Arc;

use domain::{DomainError, RepositoryError, User, UserEmail, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock, error::ApplicationError, password::PasswordHasher, repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<User, ApplicationError> {
        let email = UserEmail::parse(request.email)?;
        if request.password.is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            email,
            password_hash,
            self.deps.clock.now(),
        );

        // 并发注册时由唯一索引兜底
        match self.deps.user_repository.create(user).await {
            Ok(stored) => {
                tracing::info!(user_id = %stored.id, "user signed up");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => Err(DomainError::UserAlreadyExists.into()),
            Err(err) => Err(err.into()),
        }
    }

    /// 未知邮箱与密码错误返回同一个错误
    pub async fn authenticate(
        &self,
        email: String,
        password: String,
    ) -> Result<User, ApplicationError> {
        let email = UserEmail::parse(email).map_err(|_| ApplicationError::Authentication)?;
        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(user)
    }

    pub async fn find_user(&self, id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }
}
