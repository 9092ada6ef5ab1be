//! Business logic services.

pub mod access;
pub mod self_enrolment;
pub mod settings_test;
pub mod unenrolment;
pub mod user;

pub use access::AccessService;
pub use self_enrolment::{EnrolUserInput, SelfEnrolmentService};
pub use settings_test::{MANAGE_METHODS_URL, SettingsTestOutcome, SettingsTestService, TestableMethod};
pub use unenrolment::{
    UNENROL_PATH, UnenrolConfirmation, UnenrolOutcome, UnenrolRequest, UnenrolmentService,
    participants_url,
};
pub use user::UserService;
