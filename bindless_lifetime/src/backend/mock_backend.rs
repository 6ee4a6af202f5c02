//! Mock backend for unit tests (no GPU required)
//!
//! Every native call is recorded as a string in `commands` so tests can
//! assert on ordering. The completion counter is a plain field tests move
//! forward by hand; waiting on a value simulates the GPU reaching it.

use std::cell::{Cell, RefCell};

use crate::backend::{Backend, BufferDesc, DescriptorWrite, ImageDesc, MemoryLocation};
use crate::config::{Config, TableConfig};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBuffer {
    pub id: u64,
    pub size: u64,
    pub location: MemoryLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockImageView {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockImage {
    pub id: u64,
    pub view: MockImageView,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSampler {
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommandBuffer {
    pub id: u64,
}

#[derive(Debug)]
pub struct MockBackend {
    /// Native capacities reported to the device
    pub table: TableConfig,
    pub frames_in_flight: u32,
    pub commands: Vec<String>,
    pub completed: Cell<u64>,
    pub last_signaled: u64,
    pub waits: RefCell<Vec<u64>>,
    pub idle_waits: Cell<u32>,
    pub destroyed_buffers: Vec<u64>,
    pub destroyed_images: Vec<u64>,
    pub buffer_writes: Vec<(u64, u64, Vec<u8>)>,
    pub fail_next_write: bool,
    pub fail_completed_query: bool,
    next_id: u64,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_config(&Config::default())
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend built for `config`, as a native backend would be
    pub fn with_config(config: &Config) -> Self {
        Self {
            table: config.table,
            frames_in_flight: config.frames_in_flight,
            commands: Vec::new(),
            completed: Cell::new(0),
            last_signaled: 0,
            waits: RefCell::new(Vec::new()),
            idle_waits: Cell::new(0),
            destroyed_buffers: Vec::new(),
            destroyed_images: Vec::new(),
            buffer_writes: Vec::new(),
            fail_next_write: false,
            fail_completed_query: false,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn sampler(&mut self) -> MockSampler {
        MockSampler { id: self.next_id() }
    }

    /// Descriptor writes recorded so far, as `(class, slot)` strings
    pub fn descriptor_writes(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|c| c.starts_with("write_descriptor"))
            .map(String::as_str)
            .collect()
    }
}

impl Backend for MockBackend {
    type Buffer = MockBuffer;
    type Image = MockImage;
    type ImageView = MockImageView;
    type Sampler = MockSampler;
    type CommandBuffer = MockCommandBuffer;

    fn table_config(&self) -> TableConfig {
        self.table
    }

    fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    fn image_view(image: &MockImage) -> &MockImageView {
        &image.view
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<MockBuffer> {
        let id = self.next_id();
        self.commands.push(format!("create_buffer {} {}", id, desc.size));
        Ok(MockBuffer {
            id,
            size: desc.size,
            location: desc.location,
        })
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<MockImage> {
        let id = self.next_id();
        let view = MockImageView { id: self.next_id() };
        self.commands
            .push(format!("create_image {} {}x{}", id, desc.width, desc.height));
        Ok(MockImage { id, view })
    }

    fn write_buffer(&self, buffer: &MockBuffer, _offset: u64, _data: &[u8]) -> Result<()> {
        if buffer.location == MemoryLocation::GpuOnly {
            return Err(Error::InvalidResource("buffer is not host-visible".to_string()));
        }
        Ok(())
    }

    fn upload_buffer(&mut self, buffer: &MockBuffer, offset: u64, data: &[u8]) -> Result<()> {
        let buffer_id = buffer.id;
        let payload = data.to_vec();
        self.immediate_submit(|_| {})?;
        self.buffer_writes.push((buffer_id, offset, payload));
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: MockBuffer) {
        self.commands.push(format!("destroy_buffer {}", buffer.id));
        self.destroyed_buffers.push(buffer.id);
    }

    fn destroy_image(&mut self, image: MockImage) {
        self.commands
            .push(format!("destroy_image_view {}", image.view.id));
        self.commands.push(format!("destroy_image {}", image.id));
        self.destroyed_images.push(image.id);
    }

    fn write_descriptor(&mut self, slot: u32, write: DescriptorWrite<'_, Self>) -> Result<()> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(Error::NativeApiFailure(
                "vkUpdateDescriptorSets failed".to_string(),
            ));
        }
        self.commands
            .push(format!("write_descriptor {} {}", write.class(), slot));
        Ok(())
    }

    fn completed_value(&self) -> Result<u64> {
        if self.fail_completed_query {
            return Err(Error::NativeApiFailure("ERROR_DEVICE_LOST".to_string()));
        }
        Ok(self.completed.get())
    }

    fn wait_for_value(&self, value: u64) -> Result<()> {
        // Only values already signaled can be waited on without deadlocking
        if value > self.last_signaled {
            return Err(Error::NativeApiFailure(format!(
                "wait on {} which was never signaled (last {})",
                value, self.last_signaled
            )));
        }
        self.waits.borrow_mut().push(value);
        // Returning from the wait means the GPU got there
        if value > self.completed.get() {
            self.completed.set(value);
        }
        Ok(())
    }

    fn begin_frame_commands(&mut self, frame_slot: u32) -> Result<MockCommandBuffer> {
        self.commands.push(format!("begin_frame_commands {}", frame_slot));
        Ok(MockCommandBuffer {
            id: frame_slot as u64,
        })
    }

    fn submit_frame(
        &mut self,
        frame_slot: u32,
        _command_buffer: &MockCommandBuffer,
        signal_value: u64,
    ) -> Result<()> {
        self.commands
            .push(format!("submit_frame {} signal {}", frame_slot, signal_value));
        self.last_signaled = signal_value;
        Ok(())
    }

    fn immediate_submit<F: FnOnce(&MockCommandBuffer)>(&mut self, record: F) -> Result<()> {
        self.commands.push("immediate_submit begin".to_string());
        record(&MockCommandBuffer { id: u64::MAX });
        self.commands.push("immediate_submit wait_idle".to_string());
        Ok(())
    }

    fn wait_idle(&self) -> Result<()> {
        self.idle_waits.set(self.idle_waits.get() + 1);
        if self.last_signaled > self.completed.get() {
            self.completed.set(self.last_signaled);
        }
        Ok(())
    }
}
