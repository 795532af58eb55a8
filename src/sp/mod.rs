pub mod decimate;
pub mod survey;

pub use decimate::Outcome;
pub use survey::{SpParams, SpResult, SurveyPropagation, VariableBias};
