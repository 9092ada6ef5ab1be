//! Database repositories.

mod course;
mod course_group;
mod enrol_instance;
mod role_assignment;
mod user;
mod user_enrolment;

pub use course::CourseRepository;
pub use course_group::CourseGroupRepository;
pub use enrol_instance::EnrolInstanceRepository;
pub use role_assignment::RoleAssignmentRepository;
pub use user::UserRepository;
pub use user_enrolment::UserEnrolmentRepository;
