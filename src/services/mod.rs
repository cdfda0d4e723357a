pub mod attempt_registry;
pub mod attempt_service;
pub mod deadline_scheduler;
pub mod scoring_service;
pub mod test_service;
