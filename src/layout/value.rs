//! Records bound to native memory

use super::StructLayout;
use crate::byref::ByReference;
use crate::error::Result;
use crate::memory::{NativeBuffer, NativeMemory};
use crate::runtime::NativeRuntime;
use std::sync::Arc;

/// A finalized layout bound to its own zeroed native memory
#[derive(Debug)]
pub struct StructValue {
    layout: Arc<StructLayout>,
    memory: NativeBuffer,
}

impl StructValue {
    /// Allocate memory for a sealed layout
    pub fn new(layout: Arc<StructLayout>) -> Result<Self> {
        let size = layout.size()?;
        let memory = NativeBuffer::new(size)?;
        Ok(Self { layout, memory })
    }

    #[inline]
    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    /// Copy into freshly allocated memory
    pub fn try_clone(&self) -> Result<Self> {
        let mut memory = NativeBuffer::new(self.memory.len())?;
        memory.as_bytes_mut().copy_from_slice(self.memory.as_bytes());
        Ok(Self {
            layout: Arc::clone(&self.layout),
            memory,
        })
    }

    /// Zero every byte
    pub fn clear(&mut self) {
        self.memory.as_bytes_mut().fill(0);
    }
}

impl NativeMemory for StructValue {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self.memory.as_bytes()
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.memory.as_bytes_mut()
    }

    #[inline]
    fn address(&self) -> usize {
        self.memory.address()
    }
}

/// A record passed by reference copies its whole image
impl ByReference for StructValue {
    fn native_size(&self, _runtime: &NativeRuntime) -> usize {
        self.memory.len()
    }

    fn marshal(&self, _runtime: &NativeRuntime, memory: &mut dyn NativeMemory, offset: usize) -> Result<()> {
        memory.write_bytes(offset, self.memory.as_bytes())
    }

    fn unmarshal(&mut self, _runtime: &NativeRuntime, memory: &dyn NativeMemory, offset: usize) -> Result<()> {
        let size = self.memory.len();
        let src = memory.slice(offset, size)?;
        self.memory.as_bytes_mut().copy_from_slice(src);
        Ok(())
    }
}
