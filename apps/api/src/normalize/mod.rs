// Document Model Normalizer
// Keeps the Record in its canonical shape no matter what enters from storage or import.
// Every operation takes a Record by reference and returns a new one.

pub mod edit;
pub mod merge;
pub mod migrate;

pub use edit::{add_list_entry, remove_list_entry, update_field, EditError, FieldPath, ListSection};
pub use merge::initialize;
