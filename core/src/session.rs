//! Bearer credential and the current-identity lifecycle.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::api::NutritionApi;
use crate::error::ClientError;
use crate::lifecycle::{RequestLifecycle, RequestStatus};
use crate::lock;
use crate::models::{User, UserProfile, validate_profile};

pub const NO_TOKEN: &str = "No token found";

pub struct Session<A> {
    api: Arc<A>,
    credential: Mutex<Option<String>>,
    identity: Mutex<RequestLifecycle<User>>,
}

impl<A: NutritionApi> Session<A> {
    /// A signed-out session.
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            credential: Mutex::new(None),
            identity: Mutex::new(RequestLifecycle::new()),
        }
    }

    /// A session resuming from a stored token. The token is installed on the client.
    pub fn with_credential(api: Arc<A>, token: impl Into<String>) -> Self {
        let token = token.into();
        api.set_credential(Some(&token));
        Self {
            api,
            credential: Mutex::new(Some(token)),
            identity: Mutex::new(RequestLifecycle::new()),
        }
    }

    /// Exchange email and password for a token, then load the identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let token = self.api.login(email, password).await?;
        debug!(token_type = %token.token_type, "login accepted");
        self.api.set_credential(Some(&token.access_token));
        *lock(&self.credential) = Some(token.access_token);
        self.fetch_identity().await
    }

    /// Load the current user. A rejection ends the session.
    pub async fn fetch_identity(&self) -> Result<User, ClientError> {
        let ticket = lock(&self.identity).begin();
        let has_credential = lock(&self.credential).is_some();

        let result = if has_credential {
            self.api.current_user().await
        } else {
            Err(ClientError::Auth(NO_TOKEN.to_string()))
        };

        match result {
            Ok(user) => {
                lock(&self.identity).fulfill(ticket, user.clone());
                Ok(user)
            }
            Err(err) => {
                lock(&self.identity).reject(ticket, err.clone());
                self.clear_credential();
                info!(error = %err, "identity rejected, session ended");
                Err(err)
            }
        }
    }

    /// Create the user's profile, then reload the identity so it carries it.
    pub async fn setup_profile(&self, profile: &UserProfile) -> Result<User, ClientError> {
        validate_profile(profile)?;
        let created = self.api.create_profile(profile).await?;
        debug!(goal = ?created.goal, "profile created");
        self.fetch_identity().await
    }

    /// Forget the credential and the identity.
    pub fn logout(&self) {
        self.clear_credential();
        *lock(&self.identity) = RequestLifecycle::new();
    }

    /// Route an operation failure through the session. Returns true when the
    /// failure was an authentication error and the session was ended.
    pub fn handle_failure(&self, error: &ClientError) -> bool {
        if !error.is_auth() {
            return false;
        }
        info!(error = %error, "authentication rejected, session ended");
        self.logout();
        true
    }

    pub fn credential(&self) -> Option<String> {
        lock(&self.credential).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.credential).is_some()
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.identity).data().cloned()
    }

    pub fn identity_status(&self) -> RequestStatus {
        lock(&self.identity).status()
    }

    pub fn identity_error(&self) -> Option<ClientError> {
        lock(&self.identity).error().cloned()
    }

    fn clear_credential(&self) {
        lock(&self.credential).take();
        self.api.set_credential(None);
    }
}
