use std::{
    fs::File,
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::{EngineError, Result};

/// A decoded-on-demand sound effect.
///
/// The encoded bytes are held in memory and shared between clones, so the
/// same `Sound` can be played any number of times concurrently.
#[derive(Clone, Debug)]
pub struct Sound {
    data: Arc<[u8]>,
    volume: f32,
}

impl Sound {
    /// Wrap encoded audio bytes (WAV, OGG, FLAC, MP3), validating that they decode.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let data: Arc<[u8]> = bytes.into();
        Decoder::new(Cursor::new(data.clone())).map_err(|e| EngineError::Audio(e.to_string()))?;
        Ok(Self { data, volume: 1.0 })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Per-sound volume, multiplied with the manager's sound volume on playback.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn decoder(&self) -> Result<Decoder<Cursor<Arc<[u8]>>>> {
        Decoder::new(Cursor::new(self.data.clone())).map_err(|e| EngineError::Audio(e.to_string()))
    }
}

/// In-progress music fade-out, advanced by [`AudioManager::update`].
struct MusicFade {
    remaining: f64,
    total: f64,
}

/// Background music and sound effect playback.
///
/// If no output device can be opened the manager runs disabled: every
/// playback call becomes a logged no-op.
pub struct AudioManager {
    _stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    music_sink: Option<Sink>,
    sound_sinks: Vec<Sink>,
    current_music: Option<PathBuf>,
    music_volume: f32,
    sound_volume: f32,
    fade: Option<MusicFade>,
}

impl AudioManager {
    /// Open the default output device, falling back to a disabled manager.
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, stream_handle)) => Self {
                _stream: Some(stream),
                stream_handle: Some(stream_handle),
                ..Self::disabled()
            },
            Err(e) => {
                log::warn!("Failed to initialize audio: {}. Audio will be unavailable.", e);
                Self::disabled()
            }
        }
    }

    /// A manager with no output device.
    pub fn disabled() -> Self {
        Self {
            _stream: None,
            stream_handle: None,
            music_sink: None,
            sound_sinks: Vec::new(),
            current_music: None,
            music_volume: 1.0,
            sound_volume: 1.0,
            fade: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.stream_handle.is_some()
    }

    /// Play a music file, replacing any current track.
    ///
    /// `loops` of -1 repeats forever; `n >= 0` plays the track `n + 1` times.
    /// Load failures are logged and otherwise ignored.
    pub fn play_music(&mut self, path: impl AsRef<Path>, loops: i32, fade_ms: u64) {
        let path = path.as_ref();
        self.stop_music(0);

        let Some(handle) = self.stream_handle.as_ref() else {
            log::debug!("Audio unavailable, not playing {:?}", path);
            return;
        };

        match start_music(handle, path, loops, fade_ms, self.music_volume) {
            Ok(sink) => {
                log::debug!("Playing music {:?}", path);
                self.music_sink = Some(sink);
                self.current_music = Some(path.to_path_buf());
            }
            Err(e) => log::warn!("Error loading music {:?}: {}", path, e),
        }
    }

    /// Stop the music, optionally fading out over `fade_ms` milliseconds.
    pub fn stop_music(&mut self, fade_ms: u64) {
        self.current_music = None;
        if fade_ms > 0 && self.music_sink.is_some() {
            let total = fade_ms as f64 / 1000.0;
            self.fade = Some(MusicFade {
                remaining: total,
                total,
            });
            return;
        }
        self.fade = None;
        if let Some(sink) = self.music_sink.take() {
            sink.stop();
        }
    }

    pub fn pause_music(&self) {
        if let Some(sink) = &self.music_sink {
            sink.pause();
        }
    }

    pub fn unpause_music(&self) {
        if let Some(sink) = &self.music_sink {
            sink.play();
        }
    }

    pub fn is_music_playing(&self) -> bool {
        self.music_sink
            .as_ref()
            .is_some_and(|sink| !sink.empty() && !sink.is_paused())
    }

    /// Path of the track started by the last `play_music`, until stopped.
    pub fn current_music(&self) -> Option<&Path> {
        self.current_music.as_deref()
    }

    pub fn music_volume(&self) -> f32 {
        self.music_volume
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.music_volume);
        }
    }

    pub fn sound_volume(&self) -> f32 {
        self.sound_volume
    }

    pub fn set_sound_volume(&mut self, volume: f32) {
        self.sound_volume = volume.clamp(0.0, 1.0);
    }

    /// Play a sound effect `loops + 1` times.
    pub fn play_sound(&mut self, sound: &Sound, loops: u32) {
        let Some(handle) = self.stream_handle.as_ref() else {
            return;
        };
        self.sound_sinks.retain(|sink| !sink.empty());

        let result = sound.decoder().and_then(|decoder| {
            let sink = Sink::try_new(handle).map_err(|e| EngineError::Audio(e.to_string()))?;
            let source = decoder.buffered();
            for _ in 0..=loops {
                sink.append(source.clone());
            }
            sink.set_volume(self.sound_volume * sound.volume());
            Ok(sink)
        });

        match result {
            Ok(sink) => self.sound_sinks.push(sink),
            Err(e) => log::warn!("Failed to play sound: {}", e),
        }
    }

    pub fn stop_all_sounds(&mut self) {
        for sink in self.sound_sinks.drain(..) {
            sink.stop();
        }
    }

    /// Advance time-based effects such as music fade-out.
    pub fn update(&mut self, dt: f64) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        fade.remaining -= dt;
        if fade.remaining <= 0.0 {
            self.fade = None;
            if let Some(sink) = self.music_sink.take() {
                sink.stop();
            }
            return;
        }
        let level = (fade.remaining / fade.total) as f32;
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.music_volume * level);
        }
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

fn start_music(
    handle: &OutputStreamHandle,
    path: &Path,
    loops: i32,
    fade_ms: u64,
    volume: f32,
) -> Result<Sink> {
    let file = File::open(path)?;
    let source = Decoder::new(BufReader::new(file)).map_err(|e| EngineError::Audio(e.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|e| EngineError::Audio(e.to_string()))?;
    sink.set_volume(volume);

    let fade = Duration::from_millis(fade_ms);
    if loops < 0 {
        sink.append(source.repeat_infinite().fade_in(fade));
    } else {
        let source = source.buffered();
        sink.append(source.clone().fade_in(fade));
        for _ in 0..loops {
            sink.append(source.clone());
        }
    }
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_manager_ignores_playback() {
        let mut audio = AudioManager::disabled();
        assert!(!audio.is_available());
        audio.play_music("missing.ogg", -1, 0);
        assert!(!audio.is_music_playing());
        assert_eq!(audio.current_music(), None);
        audio.stop_music(500);
        audio.update(1.0);
        audio.stop_all_sounds();
    }

    #[test]
    fn volumes_are_clamped() {
        let mut audio = AudioManager::disabled();
        audio.set_music_volume(1.5);
        audio.set_sound_volume(-0.5);
        assert_eq!(audio.music_volume(), 1.0);
        assert_eq!(audio.sound_volume(), 0.0);
    }

    #[test]
    fn garbage_bytes_are_not_a_sound() {
        assert!(matches!(
            Sound::from_bytes(vec![0u8; 16]),
            Err(EngineError::Audio(_))
        ));
    }
}
