pub mod application;
pub mod posting;

pub use application::ApplicationResult;
pub use posting::{filter_jobs_by_age, parse_published, JobPosting, JobQuery};
