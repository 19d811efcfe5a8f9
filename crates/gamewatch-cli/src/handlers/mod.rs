pub mod games;
pub mod guidance;
pub mod history;
pub mod init;
pub mod probe;
pub mod run;
pub mod sessions;
pub mod status;
