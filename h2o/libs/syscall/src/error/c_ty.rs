use crate::{Error, Handle, Result, SerdeReg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Status(Error);

impl SerdeReg for Status {
    fn encode(self) -> usize {
        Error::encode(self.into_res().map(|_| 0))
    }

    fn decode(val: usize) -> Self {
        Self(Error::try_decode(val).unwrap_or(Error::OK))
    }
}

impl Status {
    #[inline]
    pub fn into_res(self) -> Result {
        if self.0 == Error::OK {
            Ok(())
        } else {
            Err(self.0)
        }
    }

    #[inline]
    pub fn from_res(res: Result) -> Self {
        match res {
            Ok(()) => Status(Error::OK),
            Err(err) => Status(err),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status(Error::OK)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOrHandle {
    Handle(Handle),
    Error(Error),
}

impl SerdeReg for StatusOrHandle {
    fn encode(self) -> usize {
        match self {
            StatusOrHandle::Handle(hdl) => hdl.encode(),
            StatusOrHandle::Error(err) => Error::encode(Err(err)),
        }
    }

    fn decode(value: usize) -> Self {
        match Error::decode(value) {
            Ok(val) => StatusOrHandle::Handle(Handle::decode(val)),
            Err(err) => StatusOrHandle::Error(err),
        }
    }
}

impl StatusOrHandle {
    #[inline]
    pub fn into_res(self) -> Result<Handle> {
        match self {
            StatusOrHandle::Handle(hdl) => Ok(hdl),
            StatusOrHandle::Error(err) => Err(err),
        }
    }

    #[inline]
    pub fn from_res(res: Result<Handle>) -> Self {
        match res {
            Ok(hdl) => StatusOrHandle::Handle(hdl),
            Err(err) => StatusOrHandle::Error(err),
        }
    }
}
