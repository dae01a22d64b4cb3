pub mod jobseeker;

pub use jobseeker::{fold_case, Gender, Jobseeker, JobseekerFilter, JobseekerPatch, NewJobseeker};
