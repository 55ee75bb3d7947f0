//! Frame scheduling and synchronization.
//!
//! This module is the concurrency core of the presenter. A fixed array of
//! frame slots lets the CPU work [`FRAMES_IN_FLIGHT`] frames ahead of the
//! GPU, and an image-in-flight table prevents two outstanding frames from
//! ever writing the same swapchain image.
//!
//! # Synchronization flow
//!
//! ```text
//! 1. Acquire a swapchain image (signals slot.image_available)
//! 2. If another frame's fence still owns that image, wait for it
//! 3. Wait for this slot's own fence, reset it, record it into the table
//! 4. Submit the image's pre-recorded command buffer:
//!    - wait on image_available at color-attachment output
//!    - signal render_finished and the slot fence
//! 5. Present (waits on render_finished)
//! 6. Advance to the next slot
//! ```
//!
//! Every wait is bounded by the configured timeout. A single thread drives
//! all six steps; the only concurrency is the CPU/GPU overlap the slots
//! exist for, so no locking is involved.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use trigon_rhi::RhiError;
use trigon_rhi::RhiResult;
use trigon_rhi::command::CommandRecorder;
use trigon_rhi::device::Device;
use trigon_rhi::swapchain::Swapchain;
use trigon_rhi::sync::{FRAMES_IN_FLIGHT, Fence, Semaphore};

/// Per-slot synchronization primitives, reused every N-th frame.
struct FrameSlot {
    /// Signaled when the acquired swapchain image is ready to be written.
    image_available: Semaphore,
    /// Signaled when the slot's rendering work finishes.
    render_finished: Semaphore,
    /// Signaled when the slot's submission completes; created signaled so
    /// the first use (and a zero-frame shutdown) never blocks.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }
}

/// Cycling frame-slot index.
///
/// Pure bookkeeping, split out so the cycling behavior is testable without
/// a device.
#[derive(Debug)]
pub struct FrameCursor {
    frame: usize,
    slots: usize,
}

impl FrameCursor {
    /// Creates a cursor over `slots` frame slots, starting at slot 0.
    pub fn new(slots: usize) -> Self {
        debug_assert!(slots > 0);
        Self { frame: 0, slots }
    }

    /// Returns the current slot index.
    #[inline]
    pub fn current(&self) -> usize {
        self.frame
    }

    /// Advances to the next slot, wrapping at the slot count.
    #[inline]
    pub fn advance(&mut self) {
        self.frame = (self.frame + 1) % self.slots;
    }
}

/// Tracks which slot fence is responsible for each swapchain image.
///
/// The table is sized to the swapchain image count, which need not match
/// the slot count: with acquisition order left to the driver, the same
/// image can come back while the frame that last wrote it is still
/// outstanding. The recorded fence is what the next writer waits on.
#[derive(Debug)]
pub struct ImageInFlightTable {
    fences: Vec<Option<vk::Fence>>,
}

impl ImageInFlightTable {
    /// Creates a table for `image_count` swapchain images, all unowned.
    pub fn new(image_count: usize) -> Self {
        Self {
            fences: vec![None; image_count],
        }
    }

    /// Returns the fence currently responsible for the image, if any.
    #[inline]
    pub fn get(&self, image_index: usize) -> Option<vk::Fence> {
        self.fences[image_index]
    }

    /// Records `fence` as responsible for the image.
    #[inline]
    pub fn assign(&mut self, image_index: usize, fence: vk::Fence) {
        self.fences[image_index] = Some(fence);
    }

    /// Returns the number of images tracked.
    #[inline]
    pub fn len(&self) -> usize {
        self.fences.len()
    }

    /// Returns true if no images are tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    /// Returns the number of distinct fences currently referenced.
    ///
    /// Never exceeds the slot count: each slot owns one fence and a fence
    /// appears at most once per image it last wrote.
    pub fn distinct_fences(&self) -> usize {
        let mut seen: Vec<vk::Fence> = Vec::new();
        for fence in self.fences.iter().flatten() {
            if !seen.contains(fence) {
                seen.push(*fence);
            }
        }
        seen.len()
    }
}

/// The double-buffered frame scheduler.
///
/// Owns the per-slot synchronization objects and the image-in-flight table,
/// and drives the acquire/wait/submit/present state machine once per call to
/// [`draw_frame`](Self::draw_frame).
pub struct FrameScheduler {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Fixed array of [`FRAMES_IN_FLIGHT`] slots.
    slots: Vec<FrameSlot>,
    /// Cycling slot index.
    cursor: FrameCursor,
    /// Fence responsible for each swapchain image.
    images_in_flight: ImageInFlightTable,
    /// Bound for acquire and fence waits, in nanoseconds.
    timeout_ns: u64,
}

impl FrameScheduler {
    /// Creates the scheduler with [`FRAMES_IN_FLIGHT`] slots.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `image_count` - Swapchain image count, sizing the in-flight table
    /// * `timeout_ns` - Bound for every acquire and fence wait
    ///
    /// # Errors
    ///
    /// Returns an error if any synchronization object creation fails.
    pub fn new(device: Arc<Device>, image_count: usize, timeout_ns: u64) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(FRAMES_IN_FLIGHT);
        for i in 0..FRAMES_IN_FLIGHT {
            slots.push(FrameSlot::new(device.clone())?);
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame scheduler created: {} slots, {} swapchain images",
            FRAMES_IN_FLIGHT, image_count
        );

        Ok(Self {
            device,
            slots,
            cursor: FrameCursor::new(FRAMES_IN_FLIGHT),
            images_in_flight: ImageInFlightTable::new(image_count),
            timeout_ns,
        })
    }

    /// Draws and presents one frame.
    ///
    /// Executes the full acquire/wait/submit/present sequence synchronously
    /// on the calling thread. All waits are bounded by the configured
    /// timeout.
    ///
    /// # Errors
    ///
    /// - [`RhiError::SyncTimeout`] if the acquire or a fence wait exceeds
    ///   its bound
    /// - [`RhiError::SwapchainStale`] if acquire or present reports the
    ///   swapchain no longer matches the surface
    /// - [`RhiError::Vulkan`] for any other failure (all fatal)
    pub fn draw_frame(
        &mut self,
        swapchain: &Swapchain,
        recorder: &CommandRecorder,
    ) -> RhiResult<()> {
        let slot = &self.slots[self.cursor.current()];

        // 1. Acquire the next presentable image.
        let image_index =
            match swapchain.acquire_next_image(slot.image_available.handle(), self.timeout_ns) {
                Ok((index, false)) => index as usize,
                Ok((_, true)) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    debug!("Swapchain stale during acquire");
                    return Err(RhiError::SwapchainStale);
                }
                Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => {
                    return Err(RhiError::SyncTimeout {
                        what: "image acquire",
                        timeout_ns: self.timeout_ns,
                    });
                }
                Err(e) => return Err(e.into()),
            };

        // 2. If an earlier frame still owns this image, wait for it. This is
        // what keeps two in-flight frames off the same image when the slot
        // count and image count differ or acquisition order is
        // non-monotonic.
        if let Some(fence) = self.images_in_flight.get(image_index) {
            let fences = [fence];
            let result = unsafe {
                self.device
                    .handle()
                    .wait_for_fences(&fences, true, self.timeout_ns)
            };
            match result {
                Ok(()) => {}
                Err(vk::Result::TIMEOUT) => {
                    return Err(RhiError::SyncTimeout {
                        what: "image fence",
                        timeout_ns: self.timeout_ns,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        // 3. Claim the slot: its previous submission must have finished
        // before the same command buffer and fence go back out.
        slot.in_flight.wait(self.timeout_ns)?;
        slot.in_flight.reset()?;
        let slot_fence = slot.in_flight.handle();
        self.images_in_flight.assign(image_index, slot_fence);

        // 4. Submit the image's pre-recorded command buffer.
        let wait_semaphores = [slot.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [recorder.buffer(image_index)];
        let signal_semaphores = [slot.render_finished.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                slot_fence,
            )?;
        }

        // 5. Present, waiting for rendering to finish.
        let present_result = swapchain.present(
            self.device.present_queue(),
            image_index as u32,
            slot.render_finished.handle(),
        );

        // 6. Advance to the next slot. The frame was submitted either way,
        // so the cursor moves before a stale present is reported.
        self.cursor.advance();

        match present_result {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain stale during present");
                Err(RhiError::SwapchainStale)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the current frame slot index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.cursor.current()
    }

    /// Returns the number of frame slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn fence(raw: u64) -> vk::Fence {
        vk::Fence::from_raw(raw)
    }

    #[test]
    fn test_cursor_cycles_through_slots() {
        let mut cursor = FrameCursor::new(2);
        assert_eq!(cursor.current(), 0);
        cursor.advance();
        assert_eq!(cursor.current(), 1);
        cursor.advance();
        assert_eq!(cursor.current(), 0);
    }

    #[test]
    fn test_table_starts_unowned() {
        let table = ImageInFlightTable::new(3);
        assert_eq!(table.len(), 3);
        for i in 0..3 {
            assert_eq!(table.get(i), None);
        }
        assert_eq!(table.distinct_fences(), 0);
    }

    #[test]
    fn test_table_records_latest_owner() {
        let mut table = ImageInFlightTable::new(2);
        table.assign(0, fence(1));
        table.assign(0, fence(2));
        assert_eq!(table.get(0), Some(fence(2)));
        assert_eq!(table.get(1), None);
    }

    #[test]
    fn test_distinct_fences_bounded_by_slot_count() {
        // Two slots alternating over three images: the same two fences
        // rotate through the table, never more.
        let mut table = ImageInFlightTable::new(3);
        let slot_fences = [fence(1), fence(2)];

        for (draw, image) in [0usize, 1, 2, 0, 1, 2, 0].into_iter().enumerate() {
            table.assign(image, slot_fences[draw % 2]);
            assert!(table.distinct_fences() <= 2);
        }
    }

    #[test]
    fn test_round_robin_five_draws() {
        // The spec scenario: 2 slots, 3 images, acquires 0,1,2,0,1.
        let mut cursor = FrameCursor::new(2);
        let mut table = ImageInFlightTable::new(3);
        let slot_fences = [fence(1), fence(2)];

        let acquires = [0usize, 1, 2, 0, 1];
        let mut slots_used = Vec::new();
        let mut table0_updated_on = Vec::new();

        for (i, &image) in acquires.iter().enumerate() {
            let draw = i + 1;
            let slot = cursor.current();
            slots_used.push(slot);

            // Cross-wait target: the fence that last wrote this image
            let prior = table.get(image);
            match draw {
                4 => assert_eq!(prior, Some(slot_fences[0])), // image 0, written on draw 1 by slot 0
                5 => assert_eq!(prior, Some(slot_fences[1])), // image 1, written on draw 2 by slot 1
                _ => assert_eq!(prior, None),
            }

            table.assign(image, slot_fences[slot]);
            if image == 0 {
                table0_updated_on.push(draw);
            }
            assert!(table.distinct_fences() <= 2);

            cursor.advance();
        }

        // Slot 0 handles draws 1, 3, 5
        assert_eq!(slots_used, vec![0, 1, 0, 1, 0]);
        // Image 0 is claimed on draws 1 and 4
        assert_eq!(table0_updated_on, vec![1, 4]);
    }

    #[test]
    fn test_scheduler_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameScheduler>();
    }
}
