use std::collections::VecDeque;

/// Bounded buffer holding the newest samples for the live analyzer.
///
/// The capture callback pushes into it; the frame loop reads the latest
/// analysis window out of it. Overflow drops the oldest samples; the
/// analyzer only ever cares about "now".
#[derive(Debug)]
pub struct SampleTap {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append samples, discarding the oldest once past capacity.
    pub fn push(&mut self, samples: &[f32]) {
        let len = samples.len();

        // More data than capacity: only the tail matters.
        if len >= self.capacity {
            self.samples.clear();
            self.samples.extend(&samples[len - self.capacity..]);
            return;
        }

        let to_remove = (self.samples.len() + len).saturating_sub(self.capacity);
        if to_remove > 0 {
            self.samples.drain(0..to_remove);
        }
        self.samples.extend(samples);
    }

    /// The newest `size` samples, oldest first, zero-padded at the front when
    /// fewer have arrived.
    pub fn window(&self, size: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; size];
        let have = self.samples.len().min(size);
        let skip = self.samples.len() - have;
        for (slot, &sample) in out[size - have..].iter_mut().zip(self.samples.iter().skip(skip)) {
            *slot = sample;
        }
        out
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
