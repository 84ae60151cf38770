//! Fixtures for the tessera integration tests: WAV files on disk, control
//! sequences, and a block loop that waits on the worker thread.

pub mod tolerances;

use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tessera::prelude::*;

/// Sample rate written into generated files.
pub const TEST_SAMPLE_RATE: u32 = 48000;

/// Frames per `run` call.
pub const TEST_BLOCK_SIZE: usize = 64;

/// Note-on, channel 1, middle C.
pub const NOTE_ON: &[u8] = &[0x90, 60, 100];

/// Write interleaved 32-bit float frames to `dir/name`.
pub fn write_wav(dir: &Path, name: &str, channels: u16, samples: &[f32]) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec).expect("create wav");
    for &sample in samples {
        writer.write_sample(sample).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
    path
}

/// A rising ramp of `frames` values starting at 0.1.
pub fn ramp(frames: usize) -> Vec<f32> {
    (1..=frames).map(|i| i as f32 / 10.0).collect()
}

/// Route sampler logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .try_init();
}

/// Sampler reading real WAV files, with an optional default sample.
pub fn wav_sampler(map: &UriMap, default_sample: Option<&Path>) -> Sampler {
    init_tracing();
    let mut config = SamplerConfig::default().with_worker_name("tessera-integration");
    if let Some(path) = default_sample {
        config = config.with_default_sample(path);
    }
    Sampler::new(map, config, std::sync::Arc::new(WavDecoder)).expect("create sampler")
}

/// One event for [`control`].
pub enum ControlEvent<'a> {
    Midi(&'a [u8]),
    SetFile(&'a str),
}

/// Forge a control sequence from `(frame, event)` pairs.
pub fn control(uris: &SamplerUris, events: &[(u32, ControlEvent<'_>)]) -> Vec<u8> {
    let mut buf = vec![0u8; 1024];
    let mut forge = Forge::new(uris.atom, &mut buf);
    let frame = forge.sequence_head(Urid::NONE).expect("sequence head");
    for (time, event) in events {
        forge.frame_time(*time, 0).expect("frame time");
        match event {
            ControlEvent::Midi(bytes) => {
                forge.atom_with(uris.midi_event, bytes).expect("midi event");
            }
            ControlEvent::SetFile(path) => {
                uris.write_set_file(&mut forge, path).expect("set message");
            }
        }
    }
    forge.pop(frame).expect("pop sequence");
    let len = forge.offset();
    drop(forge);
    buf.truncate(len);
    buf
}

/// File paths announced in a notify buffer, in order.
pub fn notified_paths(uris: &SamplerUris, notify: &[u8]) -> Vec<String> {
    let Some(sequence) = SequenceRef::from_bytes(&uris.atom, notify) else {
        return Vec::new();
    };
    sequence
        .events()
        .filter_map(|event| {
            let object = event.body.as_object(&uris.atom)?;
            uris.is_set_message(&object)
                .then(|| uris.file_path(&object).map(str::to_owned))
                .flatten()
        })
        .collect()
}

/// Run empty blocks until `done` holds, panicking after five seconds.
/// Returns the notify buffer of the block that satisfied it.
pub fn run_until(sampler: &mut Sampler, mut done: impl FnMut(&Sampler, &[u8]) -> bool) -> Vec<u8> {
    let empty = control(sampler.uris(), &[]);
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut output = [0.0f32; TEST_BLOCK_SIZE];
    loop {
        let mut notify = vec![0u8; 512];
        sampler.run(&empty, &mut output, &mut notify);
        if done(sampler, &notify) {
            return notify;
        }
        assert!(Instant::now() < deadline, "timed out waiting for the worker");
        std::thread::sleep(Duration::from_millis(1));
    }
}
