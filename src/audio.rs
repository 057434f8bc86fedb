//! Voice clip playback through the system audio device.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use crate::presentation::VoicePlayer;

/// Plays one clip at a time from files under a clip directory
pub struct RodioVoicePlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clip_dir: PathBuf,
    sink: RefCell<Option<Sink>>,
}

impl RodioVoicePlayer {
    /// Open the default output device. None if there is no audio device.
    pub fn try_new(clip_dir: impl AsRef<Path>) -> Option<Self> {
        let (stream, handle) = match OutputStream::try_default() {
            Ok(output) => output,
            Err(err) => {
                warn!(%err, "no audio output, voice clips disabled");
                return None;
            }
        };
        Some(Self {
            _stream: stream,
            handle,
            clip_dir: clip_dir.as_ref().to_path_buf(),
            sink: RefCell::new(None),
        })
    }
}

impl VoicePlayer for RodioVoicePlayer {
    fn play(&self, clip: &str) {
        self.stop();

        let path = self.clip_dir.join(clip);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), %err, "voice clip not found");
                return;
            }
        };
        let decoder = match Decoder::new(BufReader::new(file)) {
            Ok(decoder) => decoder,
            Err(err) => {
                warn!(path = %path.display(), %err, "voice clip not decodable");
                return;
            }
        };
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!(%err, "could not open audio sink");
                return;
            }
        };
        sink.append(decoder);
        debug!(clip, "voice clip playing");
        *self.sink.borrow_mut() = Some(sink);
    }

    fn stop(&self) {
        if let Some(sink) = self.sink.borrow_mut().take() {
            sink.stop();
        }
    }
}
