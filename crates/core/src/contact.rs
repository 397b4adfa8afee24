//! Contact form state, validation and submission.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    api::ClubApi,
    error::{ClientError, ClientResult},
    models::ContactMessage,
};

/// How long the confirmation stays visible after a successful send.
pub const CONFIRMATION_SECS: i64 = 5;

const MISSING_FIELDS: &str = "Veuillez remplir tous les champs obligatoires";
const INVALID_EMAIL: &str = "Veuillez entrer une adresse email valide";
const SEND_FAILED: &str = "Erreur lors de l'envoi du message";

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Editable fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    /// Sender name (required).
    Name,
    /// Reply address (required).
    Email,
    /// Phone number (optional).
    Phone,
    /// Subject line (required).
    Subject,
    /// Message body (required).
    Message,
}

impl ContactField {
    /// Fields in tab order.
    pub const ALL: [ContactField; 5] = [
        ContactField::Name,
        ContactField::Email,
        ContactField::Phone,
        ContactField::Subject,
        ContactField::Message,
    ];

    /// Label shown next to the input.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Nom *",
            Self::Email => "Email *",
            Self::Phone => "Téléphone",
            Self::Subject => "Sujet *",
            Self::Message => "Message *",
        }
    }
}

/// Raw form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    /// Sender name.
    pub name: String,
    /// Reply address.
    pub email: String,
    /// Phone number, may be blank.
    pub phone: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub message: String,
}

impl ContactForm {
    /// Mutable access to one field.
    pub fn field_mut(&mut self, field: ContactField) -> &mut String {
        match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
            ContactField::Subject => &mut self.subject,
            ContactField::Message => &mut self.message,
        }
    }

    /// Current value of one field.
    pub fn field(&self, field: ContactField) -> &str {
        match field {
            ContactField::Name => &self.name,
            ContactField::Email => &self.email,
            ContactField::Phone => &self.phone,
            ContactField::Subject => &self.subject,
            ContactField::Message => &self.message,
        }
    }

    /// Check required fields and the email shape.
    pub fn validate(&self) -> ClientResult<()> {
        let required = [&self.name, &self.email, &self.subject, &self.message];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(ClientError::Validation(MISSING_FIELDS.to_string()));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ClientError::Validation(INVALID_EMAIL.to_string()));
        }
        Ok(())
    }

    /// Wire payload; the phone is omitted when blank.
    pub fn to_message(&self) -> ContactMessage {
        let phone = self.phone.trim();
        ContactMessage {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// Basic `local@domain.tld` check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Form plus submission feedback.
#[derive(Debug, Clone, Default)]
pub struct ContactController {
    /// Current input.
    pub form: ContactForm,
    error: Option<String>,
    confirmed_until: Option<DateTime<Utc>>,
    sending: bool,
}

impl ContactController {
    /// Empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Error from the last validation or submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a submission is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// True while the success confirmation should be displayed.
    pub fn confirmation_visible(&self, now: DateTime<Utc>) -> bool {
        self.confirmed_until.is_some_and(|until| now < until)
    }

    /// Hide an expired confirmation.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.confirmed_until.is_some_and(|until| now >= until) {
            self.confirmed_until = None;
        }
    }

    /// Validate and return the payload to send, or record the validation
    /// error and return `None`. Nothing reaches the network on failure.
    pub fn prepare(&mut self) -> Option<ContactMessage> {
        match self.form.validate() {
            Ok(()) => {
                self.error = None;
                self.sending = true;
                Some(self.form.to_message())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    /// Record the outcome of a submission started with [`prepare`](Self::prepare).
    pub fn finish(&mut self, result: ClientResult<Option<String>>, now: DateTime<Utc>) {
        self.sending = false;
        match result {
            Ok(_) => {
                info!("contact message sent");
                self.form = ContactForm::default();
                self.error = None;
                self.confirmed_until = Some(now + Duration::seconds(CONFIRMATION_SECS));
            }
            Err(err) => {
                warn!("contact message failed: {err}");
                self.error = Some(err.user_message(SEND_FAILED));
            }
        }
    }

    /// Validate, send and record the outcome.
    pub async fn submit<A: ClubApi + ?Sized>(&mut self, api: &A) -> bool {
        let Some(message) = self.prepare() else {
            return false;
        };
        let result = api.send_contact(&message).await;
        let sent = result.is_ok();
        self.finish(result, Utc::now());
        sent
    }
}
