//! Frame producer implementation

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::PushConfig;
use crate::engine::MediaIntake;
use crate::error::Result;
use crate::media::{ColorGenerator, YuvPlanes};
use crate::stats::ProducerStats;

/// Pushes synthetic pictures into an intake at a fixed cadence
pub struct FrameProducer<I: MediaIntake + ?Sized> {
    planes: YuvPlanes,
    colors: ColorGenerator,
    intake: Arc<I>,
    interval_ms: u64,
    next_timestamp_ms: u64,
    stats: ProducerStats,
}

impl<I: MediaIntake + ?Sized> FrameProducer<I> {
    /// Create a producer for `config`
    ///
    /// Validates the configuration and allocates all pixel planes up front.
    /// Allocation failure is fatal: nothing partially allocated is kept.
    pub fn new(config: &PushConfig, intake: Arc<I>) -> Result<Self> {
        config.validate()?;

        let planes = YuvPlanes::new(config.width, config.height, config.stride_align)?;
        let colors = match config.seed {
            Some(seed) => ColorGenerator::with_seed(config.color_mode, seed),
            None => ColorGenerator::new(config.color_mode),
        };

        Ok(Self {
            planes,
            colors,
            intake,
            interval_ms: config.frame_interval_ms(),
            next_timestamp_ms: 0,
            stats: ProducerStats::new(),
        })
    }

    /// Time between two ticks
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Timestamp the next tick will carry
    pub fn next_timestamp_ms(&self) -> u64 {
        self.next_timestamp_ms
    }

    pub fn planes(&self) -> &YuvPlanes {
        &self.planes
    }

    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    /// Produce and submit one frame
    ///
    /// Returns the timestamp the frame was submitted with.
    pub fn tick(&mut self) -> u64 {
        let timestamp_ms = self.next_timestamp_ms;
        let color = self.colors.next_color();

        self.planes.fill(color);
        let frame = self.planes.frame(timestamp_ms);
        debug_assert!(frame.is_well_formed());
        self.intake.submit_frame(&frame);
        self.stats.record_frame(timestamp_ms);

        tracing::trace!(
            ts = timestamp_ms,
            y = color.y,
            u = color.u,
            v = color.v,
            "Frame produced"
        );

        self.next_timestamp_ms += self.interval_ms;
        timestamp_ms
    }

    /// Tick until `shutdown` resolves
    ///
    /// The shutdown future is polled while waiting between frames, so a
    /// stop request takes effect within one interval.
    pub async fn run_until<F>(mut self, shutdown: F) -> ProducerStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            width = self.planes.width(),
            height = self.planes.height(),
            interval_ms = self.interval_ms,
            mode = ?self.colors.mode(),
            "Frame producer started"
        );

        loop {
            self.tick();

            tokio::select! {
                biased;

                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval()) => {}
            }
        }

        tracing::info!(
            frames = self.stats.frames_submitted,
            last_ts = ?self.stats.last_timestamp_ms,
            "Frame producer stopped"
        );

        self.stats
    }

    /// Run on a new task until `shutdown` resolves
    pub fn spawn<F>(self, shutdown: F) -> JoinHandle<ProducerStats>
    where
        F: Future<Output = ()> + Send + 'static,
        I: 'static,
    {
        tokio::spawn(self.run_until(shutdown))
    }
}
