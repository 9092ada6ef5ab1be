//! Database entities.

#![allow(missing_docs)]

pub mod course;
pub mod course_group;
pub mod course_group_member;
pub mod enrol_instance;
pub mod role_assignment;
pub mod user;
pub mod user_enrolment;

pub use course::Entity as Course;
pub use course_group::Entity as CourseGroup;
pub use course_group_member::Entity as CourseGroupMember;
pub use enrol_instance::Entity as EnrolInstance;
pub use role_assignment::Entity as RoleAssignment;
pub use user::Entity as User;
pub use user_enrolment::Entity as UserEnrolment;
