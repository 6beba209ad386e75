//! Domain models for private registration.

pub mod invited_team;
pub mod registration;
pub mod team;

pub use invited_team::{
    ImportOutcome, InvitedTeam, InvitedTeamListResponse, InvitedTeamSummary, NewInvitedTeam,
};
pub use registration::{
    FormValues, RegistrationForm, RegistrationMode, UnknownRegistrationMode,
    REGISTRATION_OPTION_KEY,
};
pub use team::{NewTeam, Team};
