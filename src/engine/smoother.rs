use super::types::{Channel, RawSample, SmoothedSample};

pub const DEFAULT_ALPHA: f64 = 0.25;

/// Exponential moving average over one scalar channel.
#[derive(Clone, Copy, Debug)]
pub struct SignalSmoother {
    alpha: f64,
    value: Option<f64>,
}

impl SignalSmoother {
    pub const fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    pub fn update(&mut self, raw: f64) -> f64 {
        let next = match self.value {
            Some(ema) => self.alpha * raw + (1.0 - self.alpha) * ema,
            None => raw,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

/// One smoother per tracker channel. Frozen while the tracker is not detecting.
#[derive(Clone, Copy, Debug)]
pub struct ChannelSmoother {
    channels: [SignalSmoother; Channel::COUNT],
}

impl ChannelSmoother {
    pub const fn new(alpha: f64) -> Self {
        Self {
            channels: [SignalSmoother::new(alpha); Channel::COUNT],
        }
    }

    pub fn update(&mut self, raw: &RawSample) -> SmoothedSample {
        if !raw.detecting {
            return SmoothedSample::stale();
        }

        let mut smoothed = SmoothedSample::detecting();
        for channel in Channel::ALL {
            let value = raw
                .channel(channel)
                .map(|v| self.channels[channel.index()].update(v));
            smoothed.set(channel, value);
        }
        smoothed
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.channels[channel.index()].value()
    }

    pub fn reset(&mut self) {
        for smoother in &mut self.channels {
            smoother.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_has_no_zero_bias() {
        let mut smoother = SignalSmoother::new(0.25);
        assert_eq!(smoother.update(0.8), 0.8);
        let next = smoother.update(0.0);
        assert!((next - 0.6).abs() < 1e-9);
    }

    #[test]
    fn missing_detection_freezes_every_channel() {
        let mut smoother = ChannelSmoother::new(0.5);
        let seen = RawSample {
            detecting: true,
            open_ratio: 0.4,
            ..RawSample::default()
        };
        let _ = smoother.update(&seen);

        let lost = RawSample {
            detecting: false,
            open_ratio: 0.0,
            ..RawSample::default()
        };
        let stale = smoother.update(&lost);
        assert!(!stale.detecting);
        assert_eq!(stale.get(Channel::OpenRatio), None);
        assert_eq!(smoother.value(Channel::OpenRatio), Some(0.4));

        let back = smoother.update(&RawSample {
            open_ratio: 0.0,
            ..seen
        });
        assert_eq!(back.get(Channel::OpenRatio), Some(0.2));
    }

    #[test]
    fn absent_channel_keeps_its_previous_average() {
        let mut smoother = ChannelSmoother::new(0.5);
        let with_protrusion = RawSample {
            detecting: true,
            protrusion: Some(0.6),
            ..RawSample::default()
        };
        let _ = smoother.update(&with_protrusion);
        let without = smoother.update(&RawSample {
            protrusion: None,
            ..with_protrusion
        });
        assert_eq!(without.get(Channel::Protrusion), None);
        assert_eq!(smoother.value(Channel::Protrusion), Some(0.6));
    }
}
