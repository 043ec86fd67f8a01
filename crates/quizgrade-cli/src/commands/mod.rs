pub mod grade;
pub mod init;
pub mod sections;
pub mod validate;
