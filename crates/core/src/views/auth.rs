//! Login and account creation forms bound to a [`Session`].

use tracing::{info, warn};

use crate::{
    api::ClubApi,
    contact::is_valid_email,
    error::{ClientError, ClientResult},
    models::{AuthResponse, Credentials, Registration, User},
    session::Session,
};

const MISSING_FIELDS: &str = "Veuillez remplir tous les champs";
const INVALID_EMAIL: &str = "Veuillez entrer une adresse email valide";
const LOGIN_FAILED: &str = "Identifiants invalides";
const REGISTER_FAILED: &str = "Erreur lors de la création du compte";

/// Whether the form logs in or creates an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Exchange existing credentials.
    #[default]
    Login,
    /// Create an account, then log in with it.
    Register,
}

/// Editable fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    /// Display name, only used when registering.
    Name,
    /// Account email.
    Email,
    /// Account password.
    Password,
}

impl AuthField {
    /// Label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Nom",
            Self::Email => "Email",
            Self::Password => "Mot de passe",
        }
    }
}

/// A validated credential exchange ready to run.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    /// `POST /auth/login`.
    Login(Credentials),
    /// `POST /auth/register`.
    Register(Registration),
}

impl AuthRequest {
    /// Run the exchange against `api`.
    pub async fn execute<A: ClubApi + ?Sized>(self, api: &A) -> ClientResult<AuthResponse> {
        match self {
            Self::Login(credentials) => api.login(&credentials).await,
            Self::Register(registration) => api.register_account(&registration).await,
        }
    }

    fn mode(&self) -> AuthMode {
        match self {
            Self::Login(_) => AuthMode::Login,
            Self::Register(_) => AuthMode::Register,
        }
    }
}

/// Form state plus the profile of the logged-in user.
#[derive(Debug, Clone, Default)]
pub struct AuthController {
    /// Current mode.
    pub mode: AuthMode,
    /// Display name input.
    pub name: String,
    /// Email input.
    pub email: String,
    /// Password input.
    pub password: String,
    user: Option<User>,
    error: Option<String>,
    pending: bool,
}

impl AuthController {
    /// Empty login form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields shown for the current mode, in tab order.
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Register => &[AuthField::Name, AuthField::Email, AuthField::Password],
        }
    }

    /// Mutable access to one field.
    pub fn field_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    /// Current value of one field.
    pub fn field(&self, field: AuthField) -> &str {
        match field {
            AuthField::Name => &self.name,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
        }
    }

    /// Switch between login and registration.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.error = None;
    }

    /// Profile of the logged-in user, when known.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Error from the last attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while an exchange is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Validate the inputs and build the exchange, or record the validation
    /// error and return `None`.
    pub fn prepare(&mut self) -> Option<AuthRequest> {
        match self.validate() {
            Ok(request) => {
                self.error = None;
                self.pending = true;
                Some(request)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    /// Store the token of a successful exchange in `session`.
    pub fn finish(
        &mut self,
        session: &Session,
        request: &AuthRequest,
        result: ClientResult<AuthResponse>,
    ) -> ClientResult<()> {
        self.pending = false;
        let fallback = match request.mode() {
            AuthMode::Login => LOGIN_FAILED,
            AuthMode::Register => REGISTER_FAILED,
        };
        let outcome = result.and_then(|auth| {
            session.login(auth.token)?;
            Ok(auth.user)
        });
        match outcome {
            Ok(user) => {
                info!(mode = ?request.mode(), "authenticated");
                self.user = user;
                self.password.clear();
                self.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("authentication failed: {err}");
                self.error = Some(err.user_message(fallback));
                Err(err)
            }
        }
    }

    /// Remember the profile returned by `/auth/profile`.
    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Validate, exchange and store the token.
    pub async fn submit<A: ClubApi + ?Sized>(&mut self, api: &A, session: &Session) -> ClientResult<()> {
        let Some(request) = self.prepare() else {
            return Err(ClientError::Validation(
                self.error.clone().unwrap_or_default(),
            ));
        };
        let result = request.clone().execute(api).await;
        self.finish(session, &request, result)
    }

    /// Forget the token and the profile.
    pub fn logout(&mut self, session: &Session) -> ClientResult<()> {
        session.logout()?;
        self.user = None;
        self.password.clear();
        Ok(())
    }

    fn validate(&self) -> ClientResult<AuthRequest> {
        let email = self.email.trim();
        let name = self.name.trim();
        let missing = email.is_empty()
            || self.password.is_empty()
            || (self.mode == AuthMode::Register && name.is_empty());
        if missing {
            return Err(ClientError::Validation(MISSING_FIELDS.to_string()));
        }
        if !is_valid_email(email) {
            return Err(ClientError::Validation(INVALID_EMAIL.to_string()));
        }
        Ok(match self.mode {
            AuthMode::Login => AuthRequest::Login(Credentials {
                email: email.to_string(),
                password: self.password.clone(),
            }),
            AuthMode::Register => AuthRequest::Register(Registration {
                name: name.to_string(),
                email: email.to_string(),
                password: self.password.clone(),
            }),
        })
    }
}
