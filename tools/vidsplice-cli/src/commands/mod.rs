pub mod check;
pub mod edit;
pub mod export;
pub mod info;
pub mod init;
