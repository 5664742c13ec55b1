pub mod evaluation_service;
pub mod grading_service;
pub mod media_service;
pub mod randomizer;
pub mod scoring_service;
pub mod submission_service;
pub mod test_service;
