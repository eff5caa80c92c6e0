pub mod port;

pub use self::port::{
    listen::{classify, guard, listen, Receive, Verdict},
    Message, Port, Timed,
};
