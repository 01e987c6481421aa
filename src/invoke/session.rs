//! Per-call session: scratch buffers and deferred copy-back

use crate::error::Result;
use crate::logging::log_copy_back_error;
use crate::memory::{BufferPool, NativeBuffer};
use crate::runtime::NativeRuntime;
use std::fmt;

/// Handle to a scratch buffer held by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchId(usize);

type PostInvokeFn<'a> = Box<dyn FnOnce(&NativeRuntime, &NativeBuffer) -> Result<()> + 'a>;

struct PostInvoke<'a> {
    buffer: ScratchId,
    action: PostInvokeFn<'a>,
}

/// State of one native call
///
/// Created fresh for every call. `finish` consumes the session, so it can
/// never run its actions twice or serve a second call.
#[derive(Default)]
pub struct InvocationSession<'a> {
    scratch: Vec<NativeBuffer>,
    post_invoke: Vec<PostInvoke<'a>>,
}

impl<'a> InvocationSession<'a> {
    pub fn new() -> Self {
        Self {
            scratch: Vec::new(),
            post_invoke: Vec::new(),
        }
    }

    /// Keep a scratch buffer alive until the session ends
    pub fn hold(&mut self, buffer: NativeBuffer) -> ScratchId {
        self.scratch.push(buffer);
        ScratchId(self.scratch.len() - 1)
    }

    pub fn buffer(&self, id: ScratchId) -> Option<&NativeBuffer> {
        self.scratch.get(id.0)
    }

    /// Run `action` against a held buffer once the native call returns
    pub fn add_post_invoke<F>(&mut self, buffer: ScratchId, action: F)
    where
        F: FnOnce(&NativeRuntime, &NativeBuffer) -> Result<()> + 'a,
    {
        self.post_invoke.push(PostInvoke {
            buffer,
            action: Box::new(action),
        });
    }

    /// Deferred actions registered so far
    #[inline]
    pub fn deferred(&self) -> usize {
        self.post_invoke.len()
    }

    #[inline]
    pub fn scratch_count(&self) -> usize {
        self.scratch.len()
    }

    /// Run every deferred action in registration order, then return the
    /// scratch buffers to `pool`
    ///
    /// Every action runs even if an earlier one fails; the first failure is
    /// returned.
    pub fn finish(self, runtime: &NativeRuntime, pool: &mut dyn BufferPool) -> Result<()> {
        let Self {
            scratch,
            post_invoke,
        } = self;

        let mut first_error = None;
        for PostInvoke { buffer, action } in post_invoke {
            let outcome = match scratch.get(buffer.0) {
                Some(memory) => action(runtime, memory),
                None => Ok(()),
            };
            if let Err(err) = outcome {
                log_copy_back_error(&err.to_string());
                first_error.get_or_insert(err);
            }
        }

        pool.put_all(scratch);
        first_error.map_or(Ok(()), Err)
    }

    /// Return scratch buffers without running any deferred action
    ///
    /// Used when marshalling fails before the native call is made.
    pub fn abandon(self, pool: &mut dyn BufferPool) {
        pool.put_all(self.scratch);
    }
}

impl fmt::Debug for InvocationSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationSession")
            .field("scratch", &self.scratch)
            .field("deferred", &self.post_invoke.len())
            .finish()
    }
}
