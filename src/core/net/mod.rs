pub mod http;
pub mod sntp;
pub mod url;
