//! Moving-average smoothing for raw inertial samples.
//!
//! Sensor noise is smoothed through a fixed-capacity sliding window per
//! channel before it reaches the stabilization controller. Six windows (3
//! accelerometer + 3 gyro channels) are grouped in an [`ImuFilterBank`].

use heapless::Deque;

use crate::imu::ImuSample;

/// Compile-time upper bound on a window's capacity.
pub const MAX_WINDOW: usize = 32;

/// Error for an invalid smoothing window capacity (zero or above
/// [`MAX_WINDOW`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WindowSizeError;

/// Sliding-window average over the last `capacity` raw samples.
///
/// Until the window has filled, the average is taken over the samples
/// actually present; afterwards the oldest sample is dropped on each
/// update. A capacity-3 window fed `10, 20, 30, 40` therefore returns
/// `10, 15, 20, 30`.
#[derive(Clone, Debug)]
pub struct SmoothingWindow {
    history: Deque<f32, MAX_WINDOW>,
    capacity: usize,
    average: f32,
}

impl SmoothingWindow {
    /// Create a window over the last `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns [`WindowSizeError`] unless `1 <= capacity <= MAX_WINDOW`.
    pub fn new(capacity: usize) -> Result<Self, WindowSizeError> {
        if capacity == 0 || capacity > MAX_WINDOW {
            return Err(WindowSizeError);
        }
        Ok(Self {
            history: Deque::new(),
            capacity,
            average: 0.0,
        })
    }

    /// Push a raw sample and return the new window average.
    ///
    /// Pure numeric transform; no failure modes.
    pub fn update(&mut self, value: f32) -> f32 {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        // Cannot overflow: len < capacity <= MAX_WINDOW after the pop
        let _ = self.history.push_back(value);

        let sum: f32 = self.history.iter().sum();
        self.average = sum / self.history.len() as f32;
        self.average
    }

    /// The cached average from the most recent update.
    #[inline]
    #[must_use]
    pub fn average(&self) -> f32 {
        self.average
    }

    /// Configured window capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Smoothed 6-channel inertial reading.
///
/// Channel order is x, y, z. The stabilization controller currently
/// consumes only `accel[0]` and `accel[1]`; the remaining channels are
/// smoothed and reported but otherwise inert.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SmoothedImu {
    pub accel: [f32; 3],
    pub gyro: [f32; 3],
}

/// One smoothing window per inertial channel.
///
/// Accelerometer and gyro channels take independent window capacities, as
/// the two sensor families have different noise profiles.
#[derive(Clone, Debug)]
pub struct ImuFilterBank {
    accel: [SmoothingWindow; 3],
    gyro: [SmoothingWindow; 3],
}

impl ImuFilterBank {
    /// Create the six windows.
    ///
    /// # Errors
    ///
    /// Returns [`WindowSizeError`] if either capacity is invalid.
    pub fn new(accel_window: usize, gyro_window: usize) -> Result<Self, WindowSizeError> {
        Ok(Self {
            accel: [
                SmoothingWindow::new(accel_window)?,
                SmoothingWindow::new(accel_window)?,
                SmoothingWindow::new(accel_window)?,
            ],
            gyro: [
                SmoothingWindow::new(gyro_window)?,
                SmoothingWindow::new(gyro_window)?,
                SmoothingWindow::new(gyro_window)?,
            ],
        })
    }

    /// Feed one raw sample through all six windows.
    pub fn update(&mut self, sample: &ImuSample) -> SmoothedImu {
        let mut smoothed = SmoothedImu::default();
        for i in 0..3 {
            smoothed.accel[i] = self.accel[i].update(sample.accel[i] as f32);
            smoothed.gyro[i] = self.gyro[i].update(sample.gyro[i] as f32);
        }
        smoothed
    }
}
