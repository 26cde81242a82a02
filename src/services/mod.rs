pub mod email;
pub mod file_service;
pub mod folder_service;
pub mod image_processor;
pub mod media_manager;

pub use email::{create_mailer, password_reset_email, EmailMessage, LogMailer, Mailer, SmtpMailer};
pub use file_service::{FileService, UploadFileCommand};
pub use folder_service::FolderService;
pub use image_processor::*;
pub use media_manager::{FolderContents, MediaManager};
