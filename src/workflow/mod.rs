pub mod basic_info;
pub mod entry_ctx;
pub mod repeated_section;
pub mod settle;

pub use basic_info::{BasicInfoFiller, SectionReport};
pub use entry_ctx::EntryCtx;
pub use repeated_section::{RepeatedSection, RepeatedSectionController, SectionOutcome};
pub use settle::SettleDelays;
