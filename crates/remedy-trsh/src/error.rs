use miette::Diagnostic;
use remedy_core::TroubleshootingHistory;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum TrshError {
    /// The species definition itself is wrong; resubmitting cannot help.
    #[error("Species {label} is inconsistent: {message}")]
    #[diagnostic(
        code(remedy::trsh::species_error),
        help("check the multiplicity and charge of the species")
    )]
    SpeciesError { label: String, message: String },

    #[error("Job of {label} needs manual attention: {reason}")]
    #[diagnostic(
        code(remedy::trsh::user_action_required),
        help("the basis set is probably not defined for every element in the species")
    )]
    UserActionRequired {
        label: String,
        reason: String,
        /// History including the category that triggered this error
        history: TroubleshootingHistory,
    },
}
