pub mod space;

pub use self::space::{Flags, Space};
