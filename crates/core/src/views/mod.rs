//! Screen controllers driving the frontend.
//!
//! Each list controller hands out a request object from `begin_reload` and
//! only accepts the response of the latest one in `apply`.

pub mod auth;
pub mod equipment;
pub mod events;
pub mod news;

pub use auth::{AuthController, AuthField, AuthMode, AuthRequest};
pub use equipment::{EquipmentController, EquipmentRequest, EquipmentResponse};
pub use events::{
    registration_failure_message, sample_events, EventStatus, EventsController, EventsRequest,
    EventsResponse, RegistrationAction, DEMO_ADVISORY, SPORTS,
};
pub use news::{NewsController, NewsRequest, NewsResponse};
