//! Enrolment methods and the self-enrolment policy.

pub mod manual;
pub mod method;
pub mod policy;
pub mod registry;
pub mod self_enrol;

pub use manual::{MANUAL_METHOD, ManualEnrolMethod};
pub use method::{
    CheckStatus, ENROL_PASSWORD_LABEL, EnrolInfo, EnrolMethod, EnrolmentStore, SettingsCheck,
    SettingsReport,
};
pub use policy::{
    Acceptance, CandidateInstance, EnrolmentAttempt, EnrolmentPolicyEvaluator, EnrolmentResult,
    EnrolmentWarning, GroupKeyCheck, GroupKeys, Ineligibility, PolicyDecision, WarningCode,
    check_eligibility,
};
pub use registry::{EnrolRegistry, is_valid_method_name};
pub use self_enrol::{SELF_METHOD, SelfEnrolMethod};
