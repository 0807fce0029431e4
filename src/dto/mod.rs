pub mod audio_dto;
pub mod interview_dto;
pub mod resume_dto;
pub mod user_dto;
