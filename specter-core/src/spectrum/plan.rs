//! Separable 2D FFT built from planned 1D transforms.

use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};

/// A planned 2D transform over a row-major W×H buffer.
///
/// Rows (length W) are transformed first, then columns (length H) through a
/// single gather/scatter column buffer. Neither direction applies any
/// normalization.
pub(crate) struct Plan2d {
    width: usize,
    height: usize,
    rows: Arc<dyn Fft<f64>>,
    columns: Arc<dyn Fft<f64>>,
}

impl Plan2d {
    pub(crate) fn new(
        planner: &mut FftPlanner<f64>,
        width: usize,
        height: usize,
        direction: FftDirection,
    ) -> Self {
        Self {
            width,
            height,
            rows: planner.plan_fft(width.max(1), direction),
            columns: planner.plan_fft(height.max(1), direction),
        }
    }

    pub(crate) fn execute(&self, data: &mut [Complex64]) {
        debug_assert_eq!(data.len(), self.width * self.height);
        if data.is_empty() {
            return;
        }

        let scratch_len = self
            .rows
            .get_inplace_scratch_len()
            .max(self.columns.get_inplace_scratch_len());
        let mut scratch = vec![Complex64::new(0.0, 0.0); scratch_len];

        // Every row at once: the buffer is a whole number of W-length chunks.
        self.rows.process_with_scratch(data, &mut scratch);

        let mut column = vec![Complex64::new(0.0, 0.0); self.height];
        for x in 0..self.width {
            for (y, slot) in column.iter_mut().enumerate() {
                *slot = data[y * self.width + x];
            }
            self.columns.process_with_scratch(&mut column, &mut scratch);
            for (y, value) in column.iter().enumerate() {
                data[y * self.width + x] = *value;
            }
        }
    }
}
