pub mod config;
pub mod logger;

use validator::ValidationErrors;

pub use config::AssessmentConfig;

/// Flattens every field error message into a single `; `-separated string.
///
/// Field errors without a message fall back to their validator code so that
/// nothing is silently dropped from the report.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(m) => m.to_string(),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
