pub mod http;
mod records;
pub mod session_file;

pub use http::ReqwestForumAdapter;
pub use session_file::FileSessionStore;
