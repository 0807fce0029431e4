pub mod ai_service;
pub mod interview_service;
pub mod job_service;
pub mod llm_provider;
pub mod resume_service;
pub mod speech_service;
pub mod user_service;
