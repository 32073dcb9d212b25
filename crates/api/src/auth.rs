// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use brokerage_audit::Actor;
use brokerage_persistence::{Persistence, PersistenceError, SessionData, UserData, parse_timestamp};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// User roles for authorization.
///
/// Staff and superusers review applications; everyone else is an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A user applying for a brokerage account.
    Applicant,
    /// A reviewer who may approve, reject or request documents.
    Staff,
    /// A reviewer with full administrative rights.
    Superuser,
}

impl Role {
    /// Derives the role from a stored user.
    #[must_use]
    pub const fn from_user(user: &UserData) -> Self {
        if user.is_superuser {
            Self::Superuser
        } else if user.is_staff {
            Self::Staff
        } else {
            Self::Applicant
        }
    }

    /// Returns true if this role may review applications.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Staff | Self::Superuser)
    }

    /// Returns the string representation used in responses and audit records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "user",
            Self::Staff => "staff",
            Self::Superuser => "superuser",
        }
    }
}

/// The authenticated user making a request.
///
/// Every handler receives this explicitly; there is no ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The user's identifier.
    pub user_id: i64,
    /// The user's login name.
    pub username: String,
    /// The role assigned to this user.
    pub role: Role,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's identifier
    /// * `username` - The user's login name
    /// * `role` - The role assigned to this user
    #[must_use]
    pub fn new(user_id: i64, username: &str, role: Role) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            role,
        }
    }

    /// Creates an authenticated user from a stored user.
    #[must_use]
    pub fn from_user(user: &UserData) -> Self {
        Self::new(user.user_id, &user.username, Role::from_user(user))
    }

    /// Returns true if this user may review applications.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// Converts this user into an audit Actor.
    ///
    /// This is used when recording audit events to attribute changes
    /// to the user who made them.
    #[must_use]
    pub fn to_audit_actor(&self) -> Actor {
        Actor::with_user(self.user_id, &self.username, self.role.as_str())
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks if a user may review an application.
    ///
    /// Only staff and superusers may review.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is an applicant.
    pub fn authorize_review(user: &AuthenticatedUser) -> Result<(), AuthError> {
        Self::require_privileged(user, "review_account")
    }

    /// Checks if a user may bulk-approve applications.
    ///
    /// Only staff and superusers may bulk-approve.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is an applicant.
    pub fn authorize_bulk_approve(user: &AuthenticatedUser) -> Result<(), AuthError> {
        Self::require_privileged(user, "bulk_approve")
    }

    /// Checks if a user may browse the admin account list and audit history.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is an applicant.
    pub fn authorize_view_accounts(user: &AuthenticatedUser) -> Result<(), AuthError> {
        Self::require_privileged(user, "view_accounts")
    }

    fn require_privileged(user: &AuthenticatedUser, action: &str) -> Result<(), AuthError> {
        if user.is_privileged() {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                action: action.to_string(),
                required_role: String::from("Staff"),
            })
        }
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// How long a session stays valid after login.
    pub const SESSION_LIFETIME: Duration = Duration::days(14);

    /// Authenticates a user by password and creates a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `username` - The login name
    /// * `password` - The plain-text password
    /// * `now` - The time of the request
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_user`, `user_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong or the user is inactive.
    pub fn login(
        persistence: &mut Persistence,
        username: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<(String, AuthenticatedUser, UserData), AuthError> {
        let invalid_credentials = || AuthError::AuthenticationFailed {
            reason: String::from(
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            ),
        };

        let user: UserData = persistence
            .get_user_by_username(username)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(invalid_credentials)?;

        let password_ok: bool = brokerage_persistence::verify_password(password, &user.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_ok {
            warn!(username, "Rejected login with wrong password");
            return Err(invalid_credentials());
        }

        if !user.is_active {
            warn!(username, "Rejected login for inactive user");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("This account is inactive."),
            });
        }

        let session_token: String = Self::start_session(persistence, &user, now)?;
        let authenticated_user: AuthenticatedUser = AuthenticatedUser::from_user(&user);

        Ok((session_token, authenticated_user, user))
    }

    /// Opens a session for a user who has already been verified.
    ///
    /// Registration uses this to log the new user in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    pub fn start_session(
        persistence: &mut Persistence,
        user: &UserData,
        now: OffsetDateTime,
    ) -> Result<String, AuthError> {
        let session_token: String = Self::generate_session_token();
        let expires_at: OffsetDateTime = now + Self::SESSION_LIFETIME;

        persistence
            .create_session(&session_token, user.user_id, expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        persistence
            .update_last_login(user.user_id, now)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to update last login: {e}"),
            })?;

        info!(user_id = user.user_id, username = %user.username, "Session started");
        Ok(session_token)
    }

    /// Validates a session token and returns the authenticated user.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `session_token` - The session token to validate
    /// * `now` - The time of the request
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_user`, `user_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the user
    /// has been deactivated.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
        now: OffsetDateTime,
    ) -> Result<(AuthenticatedUser, UserData), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                warn!("Rejected unknown session token");
                AuthError::AuthenticationFailed {
                    reason: String::from("Invalid session token"),
                }
            })?;

        let expires_at: OffsetDateTime =
            parse_timestamp(&session.expires_at).map_err(Self::map_persistence_error)?;

        if now > expires_at {
            warn!(session_id = session.session_id, "Rejected expired session");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: UserData = persistence
            .get_user_by_id(session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("User not found"),
            })?;

        if !user.is_active {
            warn!(user_id = user.user_id, "Rejected session for inactive user");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("This account is inactive."),
            });
        }

        persistence
            .update_session_activity(session.session_id, now)
            .map_err(Self::map_persistence_error)?;

        debug!(user_id = user.user_id, "Session validated");
        Ok((AuthenticatedUser::from_user(&user), user))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })?;

        Ok(())
    }

    /// Generates an unguessable session token.
    fn generate_session_token() -> String {
        format!(
            "session_{:032x}{:032x}",
            rand::random::<u128>(),
            rand::random::<u128>()
        )
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}
