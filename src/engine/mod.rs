pub mod diff;
pub mod grader;
pub mod normalize;
pub mod question;
pub mod selector;
