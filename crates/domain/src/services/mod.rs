//! Domain services for private registration.
//!
//! Services hold the business rules and only reach storage and mail through
//! the traits in [`crate::stores`] and [`notification::Mailer`].

pub mod audit;
pub mod invitation;
pub mod notification;
pub mod registration;
pub mod settings;

pub use audit::{RegistrationAuditEntry, RegistrationEvent, AUDIT_TARGET};
pub use invitation::{
    export_csv, export_filename, import_csv, validate_csv, ImportBatch, InvitationError,
};
pub use notification::{
    invitation_text, send_invitation_to_all, send_invitation_to_one, InvitationContext, Mailer,
    RecordingMailer, SendSummary, SentMail, SentMailKind,
};
pub use registration::{NextStep, RegistrationGate, RegistrationResult};
