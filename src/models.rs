pub mod forms;
pub mod settings;
pub mod submission;
