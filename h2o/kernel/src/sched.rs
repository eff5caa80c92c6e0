pub mod ipc;
pub mod task;
pub mod wait;

pub use self::task::Task;
