pub mod binding;
pub mod instances;
pub mod navigation;
pub mod preferences;
