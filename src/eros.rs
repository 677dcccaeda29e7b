use crate::error::{Error, Result};

/// Default per-update decay base applied across one full kernel width.
pub const DEFAULT_DECAY_BASE: f64 = 0.3;

/// Exponentially-decayed event surface (EROS).
///
/// Maintains a grayscale surface updated one event at a time: each update
/// multiplies the square neighborhood around the event pixel by a decay
/// factor and refreshes the center pixel to full intensity. A pixel fades
/// only when later events land nearby, so the surface keeps the most recent
/// edges bright while static regions persist unchanged. There is no
/// wall-clock decay: an untouched pixel holds its value forever.
///
/// The per-update factor is `decay_base^(1/kernel_size)`, so a pixel crossed
/// by a full kernel width of activity is attenuated by `decay_base`.
pub struct Eros {
    surface: Vec<u8>,
    width: usize,
    height: usize,
    kernel_size: usize,
    odecay: f64,
}

impl Eros {
    /// Create a surface with the default decay base.
    ///
    /// - `kernel_size`: Side of the square decay neighborhood. Must be odd.
    /// - `width` / `height`: Sensor resolution in pixels.
    pub fn new(kernel_size: u32, width: u32, height: u32) -> Result<Self> {
        Self::with_decay_base(kernel_size, width, height, DEFAULT_DECAY_BASE)
    }

    /// Create a surface with an explicit decay base in (0, 1).
    pub fn with_decay_base(
        kernel_size: u32,
        width: u32,
        height: u32,
        decay_base: f64,
    ) -> Result<Self> {
        if kernel_size == 0 || kernel_size % 2 == 0 {
            return Err(Error::invalid_parameter(format!(
                "kernel size must be odd and positive, got {}",
                kernel_size
            )));
        }
        if width == 0 || height == 0 {
            return Err(Error::invalid_parameter(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if width > crate::MAX_SENSOR_DIM || height > crate::MAX_SENSOR_DIM {
            return Err(Error::invalid_parameter(format!(
                "dimensions {}x{} exceed maximum {}",
                width,
                height,
                crate::MAX_SENSOR_DIM
            )));
        }
        if !(0.0..1.0).contains(&decay_base) || decay_base == 0.0 {
            return Err(Error::invalid_parameter(format!(
                "decay base must be in (0, 1), got {}",
                decay_base
            )));
        }
        let w = width as usize;
        let h = height as usize;
        Ok(Self {
            surface: vec![0; w * h],
            width: w,
            height: h,
            kernel_size: kernel_size as usize,
            odecay: decay_base.powf(1.0 / kernel_size as f64),
        })
    }

    /// Record one event at pixel (x, y).
    ///
    /// Decays the surrounding kernel window (clipped at the borders) and sets
    /// the center pixel to 255. Out-of-bounds coordinates are rejected with
    /// `OutOfBounds` and leave the surface unchanged.
    pub fn update(&mut self, x: u16, y: u16) -> Result<()> {
        let cx = x as usize;
        let cy = y as usize;
        if cx >= self.width || cy >= self.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let half = self.kernel_size / 2;
        let x_min = cx.saturating_sub(half);
        let x_max = (cx + half).min(self.width - 1);
        let y_min = cy.saturating_sub(half);
        let y_max = (cy + half).min(self.height - 1);

        for ny in y_min..=y_max {
            let row = ny * self.width;
            for nx in x_min..=x_max {
                let v = self.surface[row + nx] as f64 * self.odecay;
                self.surface[row + nx] = v as u8;
            }
        }
        self.surface[cy * self.width + cx] = 255;
        Ok(())
    }

    /// Snapshot of the current surface, row-major. No side effects.
    pub fn get_frame(&self) -> Vec<u8> {
        self.surface.clone()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Reset the surface to black.
    pub fn reset(&mut self) {
        self.surface.fill(0);
    }
}
