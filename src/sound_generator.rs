use std::f32::consts::PI;

/// Feedback tones around recording: a brighter blip when capture starts and
/// a lower one when it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTone {
    RecordStart,
    RecordStop,
}

pub struct ToneGenerator {
    sample_rate: u32,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn generate(&self, tone: FeedbackTone) -> Vec<f32> {
        match tone {
            FeedbackTone::RecordStart => self.tone(750.0, 0.15, 0.3, Envelope::RampUpDown),
            FeedbackTone::RecordStop => self.tone(440.0, 0.15, 0.3, Envelope::RampDown),
        }
    }

    fn tone(&self, frequency: f32, duration: f32, amplitude: f32, envelope: Envelope) -> Vec<f32> {
        let num_samples = (self.sample_rate as f32 * duration) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / self.sample_rate as f32;
            let gain = envelope.gain(t, duration);
            samples.push((2.0 * PI * frequency * t).sin() * amplitude * gain);
        }

        samples
    }
}

/// Gain contour over the tone: the start tone swells in and fades out, the
/// stop tone opens at full level and only fades.
#[derive(Debug, Clone, Copy)]
enum Envelope {
    RampUpDown,
    RampDown,
}

impl Envelope {
    fn gain(self, t: f32, duration: f32) -> f32 {
        match self {
            Envelope::RampUpDown => {
                let attack = 0.05;
                if t < attack {
                    t / attack
                } else {
                    ((duration - t) / (duration - attack)).max(0.0)
                }
            }
            Envelope::RampDown => ((duration - t) / duration).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tones_have_expected_length_and_stay_bounded() {
        let generator = ToneGenerator::new(48000);
        for tone in [FeedbackTone::RecordStart, FeedbackTone::RecordStop] {
            let samples = generator.generate(tone);
            assert_eq!(samples.len(), (48000.0_f32 * 0.15) as usize);
            assert!(samples.iter().all(|s| s.abs() <= 0.3 + f32::EPSILON));
        }
    }

    #[test]
    fn start_tone_swells_in_and_stop_tone_opens_loud() {
        let generator = ToneGenerator::new(16000);
        let start = generator.generate(FeedbackTone::RecordStart);
        let stop = generator.generate(FeedbackTone::RecordStop);

        // Early gain of the start tone is still climbing
        let early: f32 = start[..160].iter().map(|s| s.abs()).fold(0.0, f32::max);
        let mid: f32 = start[640..800].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(early < mid);

        // The stop tone is near full level right away
        let opening: f32 = stop[..160].iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(opening > 0.25);
    }
}
