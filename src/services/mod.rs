pub mod field_aliases;
pub mod field_resolver;
pub mod resume_upload;
pub mod value_setter;

pub use field_aliases::{
    indexed_aliases, plain_aliases, FieldAliasTable, BASIC_INFO_ALIASES, EDUCATION_ALIASES,
    EXPERIENCE_ALIASES,
};
pub use field_resolver::{FieldRequest, FieldResolver, LookupPlan, Strategy};
pub use resume_upload::{ResumeSource, ResumeUploader};
pub use value_setter::{Applied, ValueSetter};
