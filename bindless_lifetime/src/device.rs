//! Device - owner of the bindless table and every deletion queue
//!
//! `Device` is the single entry point of the resource-lifetime manager. It is
//! constructed explicitly around a [`Backend`] and passed to whoever needs to
//! allocate; there is no global device.
//!
//! Lifetime rule: every buffer, image and descriptor slot released by the
//! application is stamped with the current submission number and only
//! destroyed once the GPU completion counter has reached that number.
//!
//! # Example
//!
//! ```ignore
//! let mut device = Device::new(backend, Config::default())?;
//!
//! let buffer = device.create_buffer(&BufferDesc { .. })?;
//! let handle = device.allocate_storage_buffer_descriptor(&buffer)?;
//! shader_constants.buffer_index = handle.index();
//!
//! loop {
//!     device.begin_frame()?;          // waits, then reclaims
//!     let cmd = device.frame_commands()?;
//!     // record using bindless indices...
//!     device.submit_frame(&cmd)?;     // signals the timeline
//! }
//! ```

use std::sync::Arc;

use crate::backend::{Backend, BufferDesc, DescriptorWrite, ImageDesc, ImageLayout};
use crate::config::Config;
use crate::deletion::{CompletionCounter, RetireList, SubmissionClock};
use crate::descriptor::{DescriptorHandle, DescriptorSlot, DescriptorTable, ResourceClass};
use crate::error::{Error, Result};
use crate::resource::{Buffer, Image};
use crate::{gpu_debug, gpu_error, gpu_info, gpu_trace};

/// Frame currently being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame-in-flight slot (`submission % frames_in_flight`)
    pub slot: u32,
    /// Timeline value this frame's submission will signal
    pub submission: u64,
}

/// Number of entries finalized by one sweep, per queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReclaimStats {
    pub buffers: usize,
    pub images: usize,
    pub descriptors: usize,
}

impl ReclaimStats {
    pub fn total(&self) -> usize {
        self.buffers + self.images + self.descriptors
    }
}

/// Bindless resource-lifetime manager
pub struct Device<B: Backend> {
    backend: B,
    table: DescriptorTable,
    counter: CompletionCounter,
    clock: SubmissionClock,
    buffers: Arc<RetireList<B::Buffer>>,
    images: Arc<RetireList<B::Image>>,
    descriptors: Arc<RetireList<DescriptorSlot>>,
    /// Timeline value last submitted from each frame slot
    frame_wait_values: Vec<u64>,
    current_frame: Option<FrameInfo>,
}

impl<B: Backend> Device<B> {
    /// Wrap a backend whose bindless set was created with the same `config`
    ///
    /// Fails if the backend's native table or frame count differ from
    /// `config`, since slots past the native array cannot be written.
    pub fn new(backend: B, config: Config) -> Result<Self> {
        config.validate()?;

        let native_table = backend.table_config();
        if native_table != config.table {
            gpu_error!(
                "bindless::Device",
                "Backend table {:?} does not match device table {:?}",
                native_table,
                config.table
            );
            return Err(Error::InitializationFailed(format!(
                "backend table {:?} does not match device table {:?}",
                native_table, config.table
            )));
        }

        let native_frames = backend.frames_in_flight();
        if native_frames != config.frames_in_flight {
            gpu_error!(
                "bindless::Device",
                "Backend has {} frames in flight, device expects {}",
                native_frames,
                config.frames_in_flight
            );
            return Err(Error::InitializationFailed(format!(
                "backend has {} frames in flight, device expects {}",
                native_frames, config.frames_in_flight
            )));
        }

        let clock = SubmissionClock::new();
        gpu_info!(
            "bindless::Device",
            "Bindless table: {} resource slots per class, {} sampler slots, {} frames in flight",
            config.table.max_resource_descriptors,
            config.table.max_sampler_descriptors,
            config.frames_in_flight
        );

        Ok(Self {
            backend,
            table: DescriptorTable::new(&config.table),
            counter: CompletionCounter::new(),
            buffers: Arc::new(RetireList::new(clock.clone(), "buffer")),
            images: Arc::new(RetireList::new(clock.clone(), "image")),
            descriptors: Arc::new(RetireList::new(clock.clone(), "descriptor")),
            clock,
            frame_wait_values: vec![0; config.frames_in_flight as usize],
            current_frame: None,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn table(&self) -> &DescriptorTable {
        &self.table
    }

    /// Submission number new retirements are stamped with
    pub fn current_submission(&self) -> u64 {
        self.clock.current()
    }

    /// Last observed completion counter value
    pub fn completed_submission(&self) -> u64 {
        self.counter.value()
    }

    /// Entries still waiting in the deletion queues
    pub fn pending_destructions(&self) -> ReclaimStats {
        ReclaimStats {
            buffers: self.buffers.pending(),
            images: self.images.pending(),
            descriptors: self.descriptors.pending(),
        }
    }

    // ===== DESCRIPTOR ALLOCATION =====

    fn allocate_descriptor(&mut self, write: DescriptorWrite<'_, B>) -> Result<DescriptorHandle> {
        let class = write.class();
        let slot = self.table.allocate(class)?;

        if let Err(e) = self.backend.write_descriptor(slot, write) {
            gpu_error!(
                "bindless::Device",
                "Descriptor write for {} slot {} failed: {}",
                class,
                slot,
                e
            );
            self.table.free(class, slot)?;
            return Err(e);
        }

        gpu_trace!("bindless::Device", "Allocated {} descriptor {}", class, slot);
        Ok(DescriptorHandle::new(class, slot, Arc::clone(&self.descriptors)))
    }

    pub fn allocate_storage_buffer_descriptor(&mut self, buffer: &B::Buffer) -> Result<DescriptorHandle> {
        self.allocate_descriptor(DescriptorWrite::StorageBuffer(buffer))
    }

    pub fn allocate_combined_image_sampler_descriptor(
        &mut self,
        sampler: &B::Sampler,
        view: &B::ImageView,
        layout: ImageLayout,
    ) -> Result<DescriptorHandle> {
        self.allocate_descriptor(DescriptorWrite::CombinedImageSampler {
            sampler,
            view,
            layout,
        })
    }

    pub fn allocate_storage_image_descriptor(
        &mut self,
        view: &B::ImageView,
        layout: ImageLayout,
    ) -> Result<DescriptorHandle> {
        self.allocate_descriptor(DescriptorWrite::StorageImage { view, layout })
    }

    pub fn allocate_sampled_image_descriptor(
        &mut self,
        view: &B::ImageView,
        layout: ImageLayout,
    ) -> Result<DescriptorHandle> {
        self.allocate_descriptor(DescriptorWrite::SampledImage { view, layout })
    }

    pub fn allocate_sampler_descriptor(&mut self, sampler: &B::Sampler) -> Result<DescriptorHandle> {
        self.allocate_descriptor(DescriptorWrite::Sampler(sampler))
    }

    // ===== RECLAMATION =====

    /// Destroy everything the GPU has provably finished with.
    ///
    /// Reads the completion counter once, then sweeps the buffer, image and
    /// descriptor queues independently. Skipping a call only delays
    /// reclamation.
    pub fn free_unused_resources(&mut self) -> Result<ReclaimStats> {
        let completed = self.counter.observe(self.backend.completed_value()?);

        let backend = &mut self.backend;
        let buffers = self.buffers.reclaim(completed, |b| backend.destroy_buffer(b));
        let images = self.images.reclaim(completed, |i| backend.destroy_image(i));
        let table = &mut self.table;
        let descriptors = self.descriptors.reclaim(completed, |d| table.release(d));

        let stats = ReclaimStats {
            buffers,
            images,
            descriptors,
        };
        if stats.total() > 0 {
            gpu_trace!(
                "bindless::Device",
                "Reclaimed at {}: {} buffers, {} images, {} descriptors",
                completed,
                buffers,
                images,
                descriptors
            );
        }
        Ok(stats)
    }

    // ===== SUBMISSION =====

    /// Record and run one-off GPU work, blocking until the queue is idle
    pub fn immediate_submit<F: FnOnce(&B::CommandBuffer)>(&mut self, record: F) -> Result<()> {
        self.backend.immediate_submit(record)
    }

    /// Start a new frame.
    ///
    /// Advances the submission number, waits until the frame slot's previous
    /// submission has completed (bounding frames in flight), then reclaims.
    pub fn begin_frame(&mut self) -> Result<FrameInfo> {
        if let Some(frame) = self.current_frame {
            return Err(Error::InvalidResource(format!(
                "begin_frame called while frame {} is still being recorded",
                frame.submission
            )));
        }

        let submission = self.clock.advance();
        let slot = (submission % self.frame_wait_values.len() as u64) as u32;
        let wait_value = self.frame_wait_values[slot as usize];

        self.backend.wait_for_value(wait_value)?;
        self.free_unused_resources()?;

        let frame = FrameInfo { slot, submission };
        self.current_frame = Some(frame);
        Ok(frame)
    }

    /// Reset and begin the command buffer of the current frame
    pub fn frame_commands(&mut self) -> Result<B::CommandBuffer> {
        let frame = self.current_frame.ok_or_else(|| {
            Error::InvalidResource("frame_commands called outside begin_frame/submit_frame".to_string())
        })?;
        self.backend.begin_frame_commands(frame.slot)
    }

    /// Submit the current frame, signalling its submission number
    pub fn submit_frame(&mut self, command_buffer: &B::CommandBuffer) -> Result<()> {
        let frame = self.current_frame.take().ok_or_else(|| {
            Error::InvalidResource("submit_frame called without begin_frame".to_string())
        })?;
        self.backend
            .submit_frame(frame.slot, command_buffer, frame.submission)?;
        self.frame_wait_values[frame.slot as usize] = frame.submission;
        Ok(())
    }

    /// Block until the GPU is idle, then reclaim (resize / teardown path)
    pub fn wait_idle(&mut self) -> Result<ReclaimStats> {
        self.backend.wait_idle()?;
        self.free_unused_resources()
    }

    // ===== RESOURCES =====

    pub fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Buffer<B>> {
        let native = self.backend.create_buffer(desc)?;
        gpu_debug!(
            "bindless::Device",
            "Created buffer '{}' ({} bytes)",
            desc.name,
            desc.size
        );
        Ok(Buffer::new(native, desc, Arc::clone(&self.buffers)))
    }

    pub fn create_image(&mut self, desc: &ImageDesc) -> Result<Image<B>> {
        let native = self.backend.create_image(desc)?;
        gpu_debug!(
            "bindless::Device",
            "Created image '{}' ({}x{}, {:?})",
            desc.name,
            desc.width,
            desc.height,
            desc.format
        );
        Ok(Image::new(native, desc, Arc::clone(&self.images)))
    }

    /// Write into a host-visible buffer
    pub fn write_buffer(&self, buffer: &Buffer<B>, offset: u64, data: &[u8]) -> Result<()> {
        check_range(buffer, offset, data)?;
        self.backend.write_buffer(buffer.native(), offset, data)
    }

    /// Copy into a device-local buffer through the immediate submission channel
    pub fn upload_buffer(&mut self, buffer: &Buffer<B>, offset: u64, data: &[u8]) -> Result<()> {
        check_range(buffer, offset, data)?;
        self.backend.upload_buffer(buffer.native(), offset, data)
    }

    /// Convenience: create a storage buffer and its descriptor in one go
    pub fn create_storage_buffer(&mut self, desc: &BufferDesc) -> Result<(Buffer<B>, DescriptorHandle)> {
        let buffer = self.create_buffer(desc)?;
        let handle = self.allocate_storage_buffer_descriptor(&buffer)?;
        Ok((buffer, handle))
    }
}

fn check_range<B: Backend>(buffer: &Buffer<B>, offset: u64, data: &[u8]) -> Result<()> {
    let end = offset.checked_add(data.len() as u64);
    match end {
        Some(end) if end <= buffer.size() => Ok(()),
        _ => Err(Error::InvalidResource(format!(
            "write of {} bytes at offset {} exceeds buffer size {}",
            data.len(),
            offset,
            buffer.size()
        ))),
    }
}

impl<B: Backend> Drop for Device<B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.wait_idle() {
            gpu_error!("bindless::Device", "wait_idle failed during shutdown: {}", e);
        }

        // Nothing can be in flight once the device is idle
        let backend = &mut self.backend;
        let buffers = self.buffers.close(|b| backend.destroy_buffer(b));
        let images = self.images.close(|i| backend.destroy_image(i));
        let table = &mut self.table;
        let descriptors = self.descriptors.close(|d| table.release(d));

        let leaked: Vec<_> = ResourceClass::ALL
            .iter()
            .filter(|&&class| self.table.allocated(class) > 0)
            .map(|&class| format!("{} {}", self.table.allocated(class), class))
            .collect();

        gpu_info!(
            "bindless::Device",
            "Shutdown flushed {} buffers, {} images, {} descriptors",
            buffers,
            images,
            descriptors
        );
        if !leaked.is_empty() {
            gpu_debug!(
                "bindless::Device",
                "Descriptor handles still alive at shutdown: {}",
                leaked.join(", ")
            );
        }
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
