pub mod control;
pub mod fill_result;
pub mod loaders;
pub mod profile;

pub use control::{ControlKind, ControlRef, DomEvent, Element, ElementHandle, ResumeFile, SelectOption};
pub use fill_result::FillResult;
pub use loaders::{load_profile, parse_profile};
pub use profile::{ApplicationDetails, CandidateProfile, EduEntry, FieldSource, FieldValue, WorkEntry};
