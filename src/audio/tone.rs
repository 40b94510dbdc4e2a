use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const TONE_FREQ: f32 = 800.0;
const TONE_SECS: f32 = 0.5;
const START_GAIN: f32 = 0.3;
const END_GAIN: f32 = 0.01;

/// Short attention beep: an 800 Hz sine with an exponentially decaying
/// envelope, so it fades out instead of clicking off.
pub struct AlertTone {
    num_sample: usize,
    total_samples: usize,
}

impl AlertTone {
    pub fn new() -> Self {
        Self {
            num_sample: 0,
            total_samples: (SAMPLE_RATE as f32 * TONE_SECS) as usize,
        }
    }

    fn gain_at(&self, t: f32) -> f32 {
        START_GAIN * (END_GAIN / START_GAIN).powf(t / TONE_SECS)
    }
}

impl Iterator for AlertTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }

        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        self.num_sample += 1;

        let sample = (2.0 * PI * TONE_FREQ * t).sin();
        Some(sample * self.gain_at(t))
    }
}

impl Source for AlertTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1 // Mono
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(TONE_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_is_finite_and_decays() {
        let samples: Vec<f32> = AlertTone::new().collect();
        assert_eq!(samples.len(), (SAMPLE_RATE as f32 * TONE_SECS) as usize);

        // Peak amplitude early in the tone must exceed peak amplitude at
        // the tail by a wide margin.
        let head_peak = samples[..4410].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        let tail_peak = samples[samples.len() - 4410..]
            .iter()
            .fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(head_peak > 0.2);
        assert!(tail_peak < 0.05);
    }
}
