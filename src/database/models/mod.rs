pub mod organization;

pub use organization::{Organization, OrganizationSummary, RenameJournal, RenamePhase};
