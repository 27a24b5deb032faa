pub mod java;
pub mod walk;

pub use java::{count_loc, parse_java_source};
pub use walk::{count_repo_loc, scan_repo_java};
