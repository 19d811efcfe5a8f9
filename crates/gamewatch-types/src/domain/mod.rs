pub mod alert;
pub mod server;
pub mod session;
pub mod status;

pub use alert::*;
pub use server::*;
pub use session::*;
pub use status::*;
