//! Identity resolution and field-level services

pub mod bank_holidays;
pub mod field_validator;
pub mod person_resolver;
pub mod project_resolver;
pub mod similar_codes;

pub use bank_holidays::BankHolidayCalendar;
pub use field_validator::{CodeCheck, CodeOutcome, FieldValidation, FieldValidator, ValidatedHours};
pub use person_resolver::PersonResolver;
pub use project_resolver::{
    extract_code_from_name, fix_project_name_format, CodeClass, CodeGrammar, ProjectResolver,
};
pub use similar_codes::{find_similar_code_pairs, SimilarCodePair};
