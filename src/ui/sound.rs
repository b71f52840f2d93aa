/// Sound engine: procedural feedback beeps via rodio.
///
/// Three effects, generated as in-memory WAV buffers at init time:
/// "point" for a correct guess, "skip" for a pass, "tap" for flipping
/// the phrase card. Playback is fire-and-forget via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_point: Arc<Vec<u8>>,
        sfx_skip: Arc<Vec<u8>>,
        sfx_tap: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let sfx_point = Arc::new(make_wav(&gen_point()));
            let sfx_skip = Arc::new(make_wav(&gen_skip()));
            let sfx_tap = Arc::new(make_wav(&gen_tap()));

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_point,
                sfx_skip,
                sfx_tap,
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_point(&self) { self.play(&self.sfx_point); }
        pub fn play_skip(&self) { self.play(&self.sfx_skip); }
        pub fn play_tap(&self) { self.play(&self.sfx_tap); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators — all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    #[derive(Clone, Copy)]
    enum Wave {
        Sine,
        Square,
        Triangle,
    }

    /// One note with a fast attack and fade-out envelope.
    fn gen_note(wave: Wave, freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let phase = (t * freq).fract();
                let raw = match wave {
                    Wave::Sine => (t * freq * 2.0 * std::f32::consts::PI).sin(),
                    Wave::Square => if phase < 0.5 { 1.0 } else { -1.0 },
                    Wave::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
                };
                let progress = i as f32 / n as f32;
                let attack = (i as f32 / (SAMPLE_RATE as f32 * 0.01)).min(1.0);
                let env = attack * (1.0 - progress);
                raw * env * volume
            })
            .collect()
    }

    /// Correct guess: two ascending square-wave notes with a short gap.
    fn gen_point() -> Vec<f32> {
        let mut samples = gen_note(Wave::Square, 700.0, 0.09, 0.25);
        samples.extend(std::iter::repeat(0.0).take((SAMPLE_RATE as f32 * 0.02) as usize));
        samples.extend(gen_note(Wave::Square, 880.0, 0.11, 0.25));
        samples
    }

    /// Skip: a single low sine.
    fn gen_skip() -> Vec<f32> {
        gen_note(Wave::Sine, 360.0, 0.08, 0.3)
    }

    /// Card flip: a short triangle blip.
    fn gen_tap() -> Vec<f32> {
        gen_note(Wave::Triangle, 540.0, 0.06, 0.3)
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let data_size = samples.len() as u32 * 2;
        let byte_rate = SAMPLE_RATE * (CHANNELS as u32) * (BITS as u32) / 8;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&CHANNELS.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&(CHANNELS * BITS / 8).to_le_bytes()); // block align
        buf.extend_from_slice(&BITS.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_point(&self) {}
    pub fn play_skip(&self) {}
    pub fn play_tap(&self) {}
}
