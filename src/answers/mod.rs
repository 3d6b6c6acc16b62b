pub mod classifier;
pub mod form;
pub mod options;
pub mod profile;

pub use classifier::FieldClassifier;
pub use form::FormAnswerer;
pub use profile::Profile;
