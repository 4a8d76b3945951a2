//! Spatial audio driver using the Web Audio API
//!
//! Every obstacle inside the activation window owns one looping voice:
//! source -> gain -> stereo panner -> destination. Gain rises as the
//! obstacle approaches the hit line; pan is pinned hard left or hard right
//! by the obstacle's lane and never interpolates. All backend calls are
//! best-effort: audio failures degrade to silence, never into the tick.

use std::collections::HashMap;

use crate::consts::*;
use crate::sim::state::Obstacle;

/// Opaque handle to a backend voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u32);

/// Playback backend the driver talks to.
///
/// `release` must be idempotent, and a released voice must ignore later
/// parameter updates rather than fail.
pub trait AudioBackend {
    /// Allocate and start a looping voice, or None if the subsystem is
    /// unavailable (the obstacle simply stays silent)
    fn create_voice(&mut self) -> Option<VoiceId>;
    fn set_gain(&mut self, voice: VoiceId, gain: f32);
    /// -1.0 full left, +1.0 full right
    fn set_pan(&mut self, voice: VoiceId, pan: f32);
    fn release(&mut self, voice: VoiceId);
}

/// Position-derived gain: loudest at the hit line, clamped to the audible
/// band so voices neither clip nor vanish
pub fn position_gain(position: f32) -> f32 {
    let distance = (position - HIT_LINE).abs();
    (1.0 - distance / FADE_DISTANCE).clamp(GAIN_FLOOR, GAIN_HIGH)
}

/// Whether an obstacle at this position should own a voice
pub fn in_activation_window(position: f32) -> bool {
    (ACTIVATION_START..=ACTIVATION_END).contains(&position)
}

/// Obstacle-id -> voice table; the single owner of voice lifecycle
pub struct SpatialAudio<B: AudioBackend> {
    backend: B,
    voices: HashMap<u32, VoiceId>,
}

impl<B: AudioBackend> SpatialAudio<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            voices: HashMap::new(),
        }
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Reconcile voices with the current obstacle set: create voices for
    /// obstacles entering the activation window, retune gain for those
    /// inside it, release voices for obstacles that left it or despawned.
    pub fn sync(&mut self, obstacles: &[Obstacle]) {
        // Release first so a despawned id can never keep a live voice
        let backend = &mut self.backend;
        self.voices.retain(|id, voice| {
            let keep = obstacles
                .iter()
                .any(|o| o.id == *id && in_activation_window(o.position));
            if !keep {
                backend.release(*voice);
            }
            keep
        });

        for obstacle in obstacles {
            if !in_activation_window(obstacle.position) {
                continue;
            }
            let voice = match self.voices.get(&obstacle.id) {
                Some(&voice) => voice,
                None => {
                    let Some(voice) = self.backend.create_voice() else {
                        // Subsystem unavailable; obstacle stays silent
                        continue;
                    };
                    self.backend.set_pan(voice, obstacle.lane.pan());
                    self.voices.insert(obstacle.id, voice);
                    voice
                }
            };
            self.backend.set_gain(voice, position_gain(obstacle.position));
        }
    }

    /// Release every live voice (collision, restart, teardown)
    pub fn release_all(&mut self) {
        for (_, voice) in self.voices.drain() {
            self.backend.release(voice);
        }
    }

    pub fn live_voices(&self) -> usize {
        self.voices.len()
    }
}

/// Backend for targets without an audio subsystem; every obstacle is silent
#[derive(Debug, Default)]
pub struct NullAudioBackend;

impl AudioBackend for NullAudioBackend {
    fn create_voice(&mut self) -> Option<VoiceId> {
        None
    }
    fn set_gain(&mut self, _voice: VoiceId, _gain: f32) {}
    fn set_pan(&mut self, _voice: VoiceId, _pan: f32) {}
    fn release(&mut self, _voice: VoiceId) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioBackend;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::HashMap;

    use web_sys::{
        AudioBuffer, AudioBufferSourceNode, AudioContext, GainNode, OscillatorNode,
        OscillatorType, StereoPannerNode,
    };

    use super::{AudioBackend, VoiceId};

    enum VoiceSource {
        /// Decoded engine-loop asset
        Buffer(AudioBufferSourceNode),
        /// Procedural hum fallback when no asset decoded
        Oscillator(OscillatorNode),
    }

    struct WebVoice {
        source: VoiceSource,
        gain: GainNode,
        panner: StereoPannerNode,
    }

    /// Web Audio implementation. Creation failures leave `ctx` empty and
    /// every call becomes a no-op.
    pub struct WebAudioBackend {
        ctx: Option<AudioContext>,
        clip: Option<AudioBuffer>,
        master_volume: f32,
        voices: HashMap<VoiceId, WebVoice>,
        next_id: u32,
    }

    impl WebAudioBackend {
        pub fn new() -> Self {
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - obstacle audio disabled");
            }
            Self {
                ctx,
                clip: None,
                master_volume: 0.8,
                voices: HashMap::new(),
                next_id: 1,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        pub fn set_master_volume(&mut self, volume: f32) {
            self.master_volume = volume.clamp(0.0, 1.0);
        }

        /// Decode the engine-loop asset. On decode failure the backend keeps
        /// running with the oscillator fallback.
        pub async fn decode_clip(&mut self, bytes: &[u8]) -> Result<(), ()> {
            let Some(ctx) = &self.ctx else { return Err(()) };

            let array = js_sys::Uint8Array::from(bytes);
            let promise = ctx.decode_audio_data(&array.buffer()).map_err(|_| ())?;
            let decoded = wasm_bindgen_futures::JsFuture::from(promise)
                .await
                .map_err(|_| ())?;
            let buffer: AudioBuffer = decoded.into();
            log::info!("Engine clip decoded ({:.2}s)", buffer.duration());
            self.clip = Some(buffer);
            Ok(())
        }

        /// Close the context; all subsequent calls degrade to no-ops
        pub fn close(&mut self) {
            self.voices.clear();
            if let Some(ctx) = self.ctx.take() {
                let _ = ctx.close();
            }
        }

        fn build_voice(&self, ctx: &AudioContext) -> Option<WebVoice> {
            let gain = ctx.create_gain().ok()?;
            let panner = ctx.create_stereo_panner().ok()?;
            gain.gain().set_value(0.0);
            gain.connect_with_audio_node(&panner).ok()?;
            panner.connect_with_audio_node(&ctx.destination()).ok()?;

            let source = if let Some(clip) = &self.clip {
                let node = ctx.create_buffer_source().ok()?;
                node.set_buffer(Some(clip));
                node.set_loop(true);
                node.connect_with_audio_node(&gain).ok()?;
                node.start().ok()?;
                VoiceSource::Buffer(node)
            } else {
                // Low sawtooth reads as an engine hum
                let node = ctx.create_oscillator().ok()?;
                node.set_type(OscillatorType::Sawtooth);
                node.frequency().set_value(110.0);
                node.connect_with_audio_node(&gain).ok()?;
                node.start().ok()?;
                VoiceSource::Oscillator(node)
            };

            Some(WebVoice { source, gain, panner })
        }
    }

    impl Default for WebAudioBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn create_voice(&mut self) -> Option<VoiceId> {
            let ctx = self.ctx.clone()?;

            // Browsers suspend contexts until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            let voice = self.build_voice(&ctx)?;
            let id = VoiceId(self.next_id);
            self.next_id += 1;
            self.voices.insert(id, voice);
            Some(id)
        }

        fn set_gain(&mut self, voice: VoiceId, gain: f32) {
            if let Some(v) = self.voices.get(&voice) {
                v.gain.gain().set_value(gain * self.master_volume);
            }
        }

        fn set_pan(&mut self, voice: VoiceId, pan: f32) {
            if let Some(v) = self.voices.get(&voice) {
                v.panner.pan().set_value(pan.clamp(-1.0, 1.0));
            }
        }

        fn release(&mut self, voice: VoiceId) {
            // Removing the entry makes release idempotent and guarantees a
            // released voice can never be retuned
            let Some(v) = self.voices.remove(&voice) else {
                return;
            };
            match &v.source {
                VoiceSource::Buffer(node) => {
                    let _ = node.stop();
                    let _ = node.disconnect();
                }
                VoiceSource::Oscillator(node) => {
                    let _ = node.stop();
                    let _ = node.disconnect();
                }
            }
            let _ = v.gain.disconnect();
            let _ = v.panner.disconnect();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testkit::RecordingBackend;
    use super::*;
    use crate::sim::state::Lane;

    fn obstacle(id: u32, lane: Lane, position: f32) -> Obstacle {
        Obstacle {
            id,
            lane,
            position,
            speed: 4.0,
            scored: false,
        }
    }

    #[test]
    fn test_gain_mapping_clamps() {
        // At the hit line: peak
        assert_eq!(position_gain(HIT_LINE), GAIN_HIGH);
        // Far away: floor, never inaudible
        assert_eq!(position_gain(0.0), GAIN_FLOOR);
        // Mid-approach lands inside the band
        let g = position_gain(HIT_LINE / 2.0);
        assert!(g > GAIN_FLOOR && g < GAIN_HIGH);
    }

    #[test]
    fn test_voice_created_only_inside_window() {
        let mut audio = SpatialAudio::new(RecordingBackend::default());

        // Off-screen spawn position: no voice yet
        audio.sync(&[obstacle(1, Lane::Left, SPAWN_POSITION)]);
        assert_eq!(audio.live_voices(), 0);

        // Entering the window allocates one voice with lane pan
        audio.sync(&[obstacle(1, Lane::Left, 10.0)]);
        assert_eq!(audio.live_voices(), 1);
        let (_, pan) = *audio.backend_mut().live.values().next().unwrap();
        assert_eq!(pan, -1.0);

        // Leaving the window releases it
        audio.sync(&[obstacle(1, Lane::Left, ACTIVATION_END + 1.0)]);
        assert_eq!(audio.live_voices(), 0);
        assert_eq!(audio.backend_mut().released.len(), 1);
    }

    #[test]
    fn test_gain_follows_position() {
        let mut audio = SpatialAudio::new(RecordingBackend::default());
        audio.sync(&[obstacle(1, Lane::Right, 100.0)]);
        let far = audio.backend_mut().live.values().next().unwrap().0;
        audio.sync(&[obstacle(1, Lane::Right, 600.0)]);
        let near = audio.backend_mut().live.values().next().unwrap().0;
        assert!(near > far);
    }

    #[test]
    fn test_despawned_obstacle_releases_voice_once() {
        let mut audio = SpatialAudio::new(RecordingBackend::default());
        audio.sync(&[obstacle(1, Lane::Left, 100.0), obstacle(2, Lane::Right, 200.0)]);
        assert_eq!(audio.live_voices(), 2);

        // Obstacle 1 gone
        audio.sync(&[obstacle(2, Lane::Right, 210.0)]);
        assert_eq!(audio.live_voices(), 1);
        assert_eq!(audio.backend_mut().released.len(), 1);

        // Repeat syncs never double-release
        audio.sync(&[obstacle(2, Lane::Right, 220.0)]);
        assert_eq!(audio.backend_mut().released.len(), 1);
        assert_eq!(audio.backend_mut().rejected_updates, 0);
    }

    #[test]
    fn test_release_all_drains_table() {
        let mut audio = SpatialAudio::new(RecordingBackend::default());
        audio.sync(&[
            obstacle(1, Lane::Left, 100.0),
            obstacle(2, Lane::Right, 200.0),
            obstacle(3, Lane::Left, 300.0),
        ]);
        audio.release_all();
        assert_eq!(audio.live_voices(), 0);
        assert_eq!(audio.backend_mut().released.len(), 3);

        // Idempotent
        audio.release_all();
        assert_eq!(audio.backend_mut().released.len(), 3);
    }

    #[test]
    fn test_unavailable_backend_degrades_to_silence() {
        let mut audio = SpatialAudio::new(RecordingBackend {
            unavailable: true,
            ..Default::default()
        });
        // Never panics, never allocates
        audio.sync(&[obstacle(1, Lane::Left, 100.0)]);
        assert_eq!(audio.live_voices(), 0);
        audio.release_all();
    }

    #[test]
    fn test_null_backend_is_silent() {
        let mut audio = SpatialAudio::new(NullAudioBackend);
        audio.sync(&[obstacle(1, Lane::Left, 100.0)]);
        assert_eq!(audio.live_voices(), 0);
    }
}
