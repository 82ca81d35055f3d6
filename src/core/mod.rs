pub mod debounce;
pub mod flash;
pub mod net;
pub mod topic;
