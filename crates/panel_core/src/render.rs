//! Render Cache
//!
//! Per camera side one image cache and one histogram cache. A graphics
//! primitive is only valid for the shape and dynamic range it was created
//! with; any change recreates it, otherwise data is replaced in place.

use contracts::{
    BarSpec, CameraSide, ContractError, ControlSurface, DisplayKind, DisplaySurface,
    DisplayTarget, FrameRecord, FrameShape, PrimitiveId,
};
use tracing::trace;

/// Number of histogram buckets over `[0, dynamic_range]`
pub const HISTOGRAM_BUCKETS: usize = 100;

/// What an update did to the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAction {
    /// Primitive(s) destroyed and created again
    Recreated,
    /// Data replaced on the existing primitive(s)
    Updated,
    /// Frame had no pixel data, nothing drawn
    Skipped,
}

/// Recreate/update counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub image_recreations: u64,
    pub image_updates: u64,
    pub histogram_recreations: u64,
    pub histogram_updates: u64,
}

impl RenderStats {
    fn count(&mut self, kind: DisplayKind, action: RenderAction) {
        let slot = match (kind, action) {
            (_, RenderAction::Skipped) => return,
            (DisplayKind::Image, RenderAction::Recreated) => &mut self.image_recreations,
            (DisplayKind::Image, RenderAction::Updated) => &mut self.image_updates,
            (DisplayKind::Histogram, RenderAction::Recreated) => &mut self.histogram_recreations,
            (DisplayKind::Histogram, RenderAction::Updated) => &mut self.histogram_updates,
        };
        *slot += 1;
    }
}

/// Image display cache
#[derive(Debug, Default)]
pub struct ImageCache {
    shape: Option<FrameShape>,
    range: Option<u32>,
    handle: Option<PrimitiveId>,
}

impl ImageCache {
    pub fn handle(&self) -> Option<PrimitiveId> {
        self.handle
    }

    pub fn update(
        &mut self,
        frame: &FrameRecord,
        dynamic_range: u32,
        surface: &mut dyn DisplaySurface,
    ) -> Result<RenderAction, ContractError> {
        let Some(shape) = frame.shape().filter(|_| frame.is_complete()) else {
            return Ok(RenderAction::Skipped);
        };
        let intensities = normalize(&frame.samples(), dynamic_range);

        if let (Some(handle), true) = (
            self.handle,
            self.shape == Some(shape) && self.range == Some(dynamic_range),
        ) {
            surface.replace_image(handle, &intensities)?;
            return Ok(RenderAction::Updated);
        }

        // 先作废旧句柄，创建失败时不会留下过期状态
        self.handle = None;
        surface.clear()?;
        let handle = surface.create_image(shape, &intensities)?;
        self.handle = Some(handle);
        self.shape = Some(shape);
        self.range = Some(dynamic_range);
        trace!(handle = %handle, rows = shape.height, cols = shape.width, dynamic_range, "Image primitive created");
        Ok(RenderAction::Recreated)
    }
}

/// Histogram display cache
#[derive(Debug, Default)]
pub struct HistogramCache {
    range: Option<u32>,
    bars: Vec<PrimitiveId>,
}

impl HistogramCache {
    pub fn bars(&self) -> &[PrimitiveId] {
        &self.bars
    }

    pub fn update(
        &mut self,
        frame: &FrameRecord,
        dynamic_range: u32,
        surface: &mut dyn DisplaySurface,
    ) -> Result<RenderAction, ContractError> {
        if !frame.is_complete() {
            return Ok(RenderAction::Skipped);
        }
        let histogram = Histogram::compute(&frame.samples(), dynamic_range);

        if !self.bars.is_empty() && self.range == Some(dynamic_range) {
            for (&bar, &height) in self.bars.iter().zip(&histogram.densities) {
                surface.set_bar_height(bar, height)?;
            }
            return Ok(RenderAction::Updated);
        }

        self.bars.clear();
        surface.clear()?;
        let bar_width = (dynamic_range as f64 + 1.0) / HISTOGRAM_BUCKETS as f64;
        let specs: Vec<BarSpec> = histogram
            .densities
            .iter()
            .enumerate()
            .map(|(i, &height)| BarSpec {
                left: i as f64 * histogram.bucket_width,
                width: bar_width,
                height,
            })
            .collect();
        self.bars = surface.create_bars(&specs)?;
        self.range = Some(dynamic_range);
        Ok(RenderAction::Recreated)
    }
}

/// Bucketed intensity distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bucket_width: f64,
    pub counts: Vec<u64>,
    /// `count / (total * bucket_width)`, integrates to 1
    pub densities: Vec<f64>,
}

impl Histogram {
    /// 100 equal buckets over `[0, dynamic_range]`; samples above the range are ignored
    pub fn compute(samples: &[u16], dynamic_range: u32) -> Self {
        let range = dynamic_range.max(1) as f64;
        let bucket_width = range / HISTOGRAM_BUCKETS as f64;
        let mut counts = vec![0u64; HISTOGRAM_BUCKETS];
        let mut total = 0u64;
        for &sample in samples {
            let value = sample as f64;
            if value > range {
                continue;
            }
            let index = ((value / bucket_width) as usize).min(HISTOGRAM_BUCKETS - 1);
            counts[index] += 1;
            total += 1;
        }
        let densities = counts
            .iter()
            .map(|&count| {
                if total == 0 {
                    0.0
                } else {
                    count as f64 / (total as f64 * bucket_width)
                }
            })
            .collect();
        Self {
            bucket_width,
            counts,
            densities,
        }
    }
}

/// Map samples to `[0, 1]` relative to `dynamic_range`
pub fn normalize(samples: &[u16], dynamic_range: u32) -> Vec<f32> {
    let range = dynamic_range.max(1) as f32;
    samples
        .iter()
        .map(|&v| (v as f32).min(range) / range)
        .collect()
}

/// Image + histogram cache of one side
#[derive(Debug, Default)]
pub struct SideCache {
    pub image: ImageCache,
    pub histogram: HistogramCache,
}

/// Render caches of both sides plus instrumentation
#[derive(Debug, Default)]
pub struct RenderCache {
    primary: SideCache,
    secondary: SideCache,
    stats: RenderStats,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side(&self, side: CameraSide) -> &SideCache {
        match side {
            CameraSide::Primary => &self.primary,
            CameraSide::Secondary => &self.secondary,
        }
    }

    fn side_mut(&mut self, side: CameraSide) -> &mut SideCache {
        match side {
            CameraSide::Primary => &mut self.primary,
            CameraSide::Secondary => &mut self.secondary,
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Draw one frame into the image and histogram surfaces of `side`
    pub fn update(
        &mut self,
        side: CameraSide,
        frame: &FrameRecord,
        surface: &mut dyn ControlSurface,
    ) -> Result<(RenderAction, RenderAction), ContractError> {
        let dynamic_range = frame.dynamic_range();
        let cache = self.side_mut(side);
        let image = cache
            .image
            .update(frame, dynamic_range, surface.display(DisplayTarget::image(side)))?;
        let histogram = cache.histogram.update(
            frame,
            dynamic_range,
            surface.display(DisplayTarget::histogram(side)),
        )?;

        for (kind, action) in [
            (DisplayKind::Image, image),
            (DisplayKind::Histogram, histogram),
        ] {
            self.stats.count(kind, action);
            if action != RenderAction::Skipped {
                observability::record_render(side, kind, action == RenderAction::Recreated);
            }
        }
        Ok((image, histogram))
    }
}
