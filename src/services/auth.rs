//! Authentication and per-event authorization of scanning staff.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::Role;
use crate::repository::AccessRepository;
use crate::services::identity::{AuthUser, IdentityError, IdentityProvider};
use crate::utils::error::AppError;

/// Why the caller may check in tickets for the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    GlobalRole(Role),
    StaffAssignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedStaff {
    pub user: AuthUser,
    pub authority: Authority,
}

impl AuthorizedStaff {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub struct AuthResolver {
    identity: Arc<dyn IdentityProvider>,
    access: Arc<dyn AccessRepository>,
}

impl AuthResolver {
    pub fn new(identity: Arc<dyn IdentityProvider>, access: Arc<dyn AccessRepository>) -> Self {
        Self { identity, access }
    }

    /// Exchanges the bearer credential for a user. An expired session gets
    /// exactly one refresh attempt, and only when the caller supplied a
    /// refresh token; every other rejection fails immediately.
    pub async fn authenticate(
        &self,
        credential: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<AuthUser, AppError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;

        match self.identity.verify(credential).await {
            Ok(user) => Ok(user),
            Err(IdentityError::Expired) => {
                let refresh_token = refresh_token
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| AppError::Unauthenticated("Session expired".to_string()))?;

                let user = self.identity.refresh(refresh_token).await.map_err(|e| match e {
                    IdentityError::Unavailable(msg) => AppError::ExternalServiceError(msg),
                    IdentityError::Expired | IdentityError::Invalid => {
                        AppError::Unauthenticated("Session expired".to_string())
                    }
                })?;
                debug!(user_id = %user.id, "Session refreshed");
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Admins and organizers may check in for any event; everyone else needs a
    /// staff assignment for this one.
    pub async fn authorize(&self, user: AuthUser, event_id: Uuid) -> Result<AuthorizedStaff, AppError> {
        if let Some(role) = self.access.role_for(user.id).await? {
            if role.is_privileged() {
                // Organizers are not scoped to their own events.
                debug!(user_id = %user.id, role = role.as_str(), %event_id, "Authorized by global role");
                return Ok(AuthorizedStaff {
                    user,
                    authority: Authority::GlobalRole(role),
                });
            }
        }

        match self.access.find_staff_assignment(event_id, user.id).await? {
            Some(_) => {
                debug!(user_id = %user.id, %event_id, "Authorized by staff assignment");
                Ok(AuthorizedStaff {
                    user,
                    authority: Authority::StaffAssignment,
                })
            }
            None => Err(AppError::Forbidden(
                "Not authorized to check in tickets for this event".to_string(),
            )),
        }
    }

    pub async fn resolve(
        &self,
        credential: Option<&str>,
        refresh_token: Option<&str>,
        event_id: Uuid,
    ) -> Result<AuthorizedStaff, AppError> {
        let user = self.authenticate(credential, refresh_token).await?;
        self.authorize(user, event_id).await
    }
}
