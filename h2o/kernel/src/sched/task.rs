pub mod hdl;

use alloc::sync::Arc;
use core::{
    any::Any,
    sync::atomic::{AtomicU32, Ordering::SeqCst},
};

use kargs::KernelArgs;
use lpc_call::{ipc::ClientId, Feature, Handle, Result};
use spin::RwLock;

pub use self::hdl::HandleMap;
use crate::mem::Space;

static NEXT_TASK_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1);

std::thread_local! {
    static THREAD_ID: u32 = NEXT_THREAD_ID.fetch_add(1, SeqCst);
}

/// The id of the calling thread, unique across all tasks.
#[inline]
pub fn thread_id() -> u32 {
    THREAD_ID.with(|id| *id)
}

/// A task: an address space plus the handles its threads share.
#[derive(Debug)]
pub struct Task {
    id: u32,
    args: KernelArgs,
    space: Space,
    handles: RwLock<HandleMap>,
}

impl Task {
    pub fn new(args: &KernelArgs) -> Self {
        let id = NEXT_TASK_ID.fetch_add(1, SeqCst);
        log::debug!("Creating task #{}", id);
        Task {
            id,
            args: *args,
            space: Space::new(),
            handles: RwLock::new(HandleMap::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn args(&self) -> &KernelArgs {
        &self.args
    }

    #[inline]
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The identity the calling thread carries in messages it posts.
    #[inline]
    pub fn client_id(&self) -> ClientId {
        ClientId {
            process: self.id,
            thread: thread_id(),
        }
    }

    #[inline]
    pub fn handles(&self) -> &RwLock<HandleMap> {
        &self.handles
    }

    /// # Errors
    ///
    /// See [`HandleMap::get`].
    #[inline]
    pub fn get<T: Any + Send + Sync>(&self, hdl: Handle, need: Feature) -> Result<Arc<T>> {
        self.handles.read().get(hdl, need)
    }

    /// Duplicate `hdl` into the handle space of `to`, keeping only `feat`.
    ///
    /// # Errors
    ///
    /// Returns `EPERM` if `feat` exceeds the rights of `hdl`.
    pub fn share(&self, hdl: Handle, to: &Task, feat: Feature) -> Result<Handle> {
        let obj = self.handles.read().duplicate(hdl, feat)?;
        to.handles.write().insert_object(obj)
    }
}

impl Default for Task {
    fn default() -> Self {
        Task::new(&KernelArgs::default())
    }
}
