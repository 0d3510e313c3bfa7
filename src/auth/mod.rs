mod password;

use std::fmt;

use log::{error, info, warn};

use crate::db::Database;
use crate::user::{LoginCredentials, Role, SignupData, User};
use crate::util::next_id;

pub(crate) use password::{password_strength, strength_label, MIN_PASSWORD_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AuthError {
    EmptyUsername,
    PasswordMismatch,
    PasswordTooShort,
    UsernameTaken,
    InvalidCredentials,
    NotLoggedIn,
    AdminOnly,
    Storage(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::EmptyUsername => write!(f, "Username must not be empty"),
            AuthError::PasswordMismatch => write!(f, "Passwords do not match"),
            AuthError::PasswordTooShort => write!(f, "Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
            AuthError::UsernameTaken => write!(f, "Username already exists"),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::NotLoggedIn => write!(f, "Please log in first"),
            AuthError::AdminOnly => write!(f, "Only admins can do this"),
            AuthError::Storage(e) => write!(f, "An error occurred while saving: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Result of checking the session copy against the users list
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SessionStatus {
    /// Nobody is logged in
    Anonymous,
    Unchanged,
    /// The user record changed, the session copy was refreshed
    Refreshed,
    /// The user no longer exists, the session was ended
    Expired,
}

/// Who is logged in. The user is also copied to the store so the session survives restarts.
#[derive(Debug, Default)]
pub(crate) struct Auth {
    user: Option<User>,
}

impl Auth {
    /// Pick up the session left in the store. An unreadable session record is removed.
    pub(crate) fn restore(db: &mut Database) -> Auth {
        match db.load_session() {
            Ok(user) => {
                if let Some(user) = &user {
                    info!("Restored session of {}", user.username);
                }
                Auth { user }
            }
            Err(e) => {
                error!("Error parsing stored user: {e}");
                if let Err(e) = db.clear_session() {
                    error!("Error clearing stored user: {e}");
                }
                Auth::default()
            }
        }
    }

    pub(crate) fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The logged in user, or `NotLoggedIn`
    pub(crate) fn require_user(&self) -> Result<&User, AuthError> {
        self.user.as_ref().ok_or(AuthError::NotLoggedIn)
    }

    pub(crate) fn require_admin(&self) -> Result<&User, AuthError> {
        let user = self.require_user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(AuthError::AdminOnly)
        }
    }

    /// Log in on an exact, case sensitive match of username and password
    pub(crate) fn login(&mut self, db: &mut Database, credentials: &LoginCredentials) -> Result<&User, AuthError> {
        let user = db.load_users()
            .into_iter()
            .find(|u| u.username == credentials.username && u.password == credentials.password);

        match user {
            Some(user) => {
                info!("User {} logged in", user.username);
                self.start_session(db, user)
            }
            None => {
                warn!("Failed login for {}", credentials.username);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Register a new user with role `user` and log them in
    pub(crate) fn signup(&mut self, db: &mut Database, data: &SignupData) -> Result<&User, AuthError> {
        let username = data.username.trim();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }
        if data.password != data.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if data.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooShort);
        }

        let mut users = db.load_users();
        if users.iter().any(|u| u.username == username) {
            return Err(AuthError::UsernameTaken);
        }

        let id = next_id(users.iter().map(|u| u.id.as_str()));
        let user = User::new(id, username, &data.password, Role::User);
        users.push(user.clone());
        db.save_users(&users).map_err(|e| AuthError::Storage(e.to_string()))?;
        info!("User {} signed up", user.username);

        self.start_session(db, user)
    }

    pub(crate) fn logout(&mut self, db: &mut Database) {
        if let Some(user) = self.user.take() {
            info!("User {} logged out", user.username);
        }
        if let Err(e) = db.clear_session() {
            error!("Error clearing stored user: {e}");
        }
    }

    /// Compare the session copy with the canonical user record and fix any drift
    pub(crate) fn revalidate(&mut self, db: &mut Database) -> SessionStatus {
        // Another process may have logged in or out
        match db.load_session() {
            Ok(stored) => {
                if stored.as_ref().map(|u| &u.id) != self.user.as_ref().map(|u| &u.id) {
                    self.user = stored;
                }
            }
            Err(e) => {
                warn!("Stored session is unreadable: {e}");
            }
        }

        let session_user = match &self.user {
            None => return SessionStatus::Anonymous,
            Some(user) => user.clone(),
        };

        match db.find_user(&session_user.id) {
            None => {
                warn!("User {} no longer exists, ending session", session_user.username);
                self.logout(db);
                SessionStatus::Expired
            }
            Some(user) if user != session_user => {
                info!("User {} changed, refreshing session", user.username);
                if let Err(e) = db.save_session(&user) {
                    error!("Error saving session: {e}");
                }
                self.user = Some(user);
                SessionStatus::Refreshed
            }
            Some(_) => SessionStatus::Unchanged,
        }
    }

    fn start_session(&mut self, db: &mut Database, user: User) -> Result<&User, AuthError> {
        db.save_session(&user).map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(self.user.insert(user))
    }
}
