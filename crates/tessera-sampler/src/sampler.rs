//! The sampler processor.
//!
//! `run` is called once per audio block on the realtime thread. It never
//! blocks and never frees sample memory: loading happens on the worker, and
//! superseded samples are handed back to the worker to be freed.

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::sample::{load_sample, Sample, SampleDecoder};
use crate::uris::SamplerUris;
use crate::worker::{
    drain_samples, record_ring, send_sample, take_sample, RingReader, RingWriter, Signal, Worker,
    WorkerMetrics, WorkerMetricsSnapshot, WorkerThread, SAMPLE_RECORD_SIZE,
};
use std::sync::Arc;
use tessera_atom::{AtomRef, Forge, SequenceRef, Urid, UridMap};

/// Mono one-shot sampler. A MIDI note-on plays the current sample from the
/// start; a `msg:Set` object with a `file` path loads a new one.
pub struct Sampler {
    uris: SamplerUris,
    decoder: Arc<dyn SampleDecoder>,
    to_worker: RingWriter,
    from_worker: RingReader,
    worker: WorkerThread,
    metrics: Arc<WorkerMetrics>,
    sample: Option<Box<Sample>>,
    /// Superseded sample whose free record did not fit in the request ring.
    pending_free: Option<Box<Sample>>,
    frame: usize,
    play: bool,
}

impl Sampler {
    /// Start the worker and load `config.default_sample`, if any.
    ///
    /// Loading here is synchronous; call this off the realtime thread.
    pub fn new<M: UridMap + ?Sized>(
        map: &M,
        config: SamplerConfig,
        decoder: Arc<dyn SampleDecoder>,
    ) -> Result<Self> {
        config.validate()?;

        let uris = SamplerUris::new(map);
        let (to_worker, requests) = record_ring(config.ring_capacity);
        let (results, from_worker) = record_ring(config.ring_capacity);
        let metrics = Arc::new(WorkerMetrics::new());
        let signal = Signal::new(config.max_records() + 1);

        let worker = Worker::new(
            uris,
            Arc::clone(&decoder),
            requests,
            results,
            Arc::clone(&metrics),
        );
        let worker = WorkerThread::spawn(&config.worker_name, worker, signal)?;

        let sample = config.default_sample.as_deref().and_then(|path| {
            let path = path.to_string_lossy();
            match load_sample(decoder.as_ref(), &path) {
                Ok(sample) => Some(Box::new(sample)),
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "Failed to load default sample");
                    None
                }
            }
        });

        Ok(Self {
            uris,
            decoder,
            to_worker,
            from_worker,
            worker,
            metrics,
            sample,
            pending_free: None,
            frame: 0,
            play: false,
        })
    }

    /// Process one block.
    ///
    /// `control` holds an atom sequence of incoming events. `output` is filled
    /// with exactly `output.len()` frames. A sequence of notifications is
    /// forged into `notify`, which is left as an empty sequence if nothing
    /// happened or the buffer is too small.
    pub fn run(&mut self, control: &[u8], output: &mut [f32], notify: &mut [u8]) {
        let start_frame = self.read_control(control);
        self.render(start_frame, output);

        let mut forge = Forge::new(self.uris.atom, notify);
        let sequence = forge.sequence_head(Urid::NONE).ok();
        self.apply_results(&mut forge);
        if let Some(frame) = sequence {
            if forge.pop(frame).is_err() {
                tracing::debug!("Notify buffer overflowed");
            }
        }
    }

    /// Walk the control sequence. Returns the frame playback starts at.
    fn read_control(&mut self, control: &[u8]) -> usize {
        let Some(sequence) = SequenceRef::from_bytes(&self.uris.atom, control) else {
            return 0;
        };

        let mut start_frame = 0;
        for event in sequence.events() {
            let body = event.body;
            if body.is(self.uris.midi_event) {
                if body.body().first().is_some_and(|status| status & 0xF0 == 0x90) {
                    start_frame = event.time.frames as usize;
                    self.frame = 0;
                    self.play = true;
                }
            } else if let Some(object) = body.as_object(&self.uris.atom) {
                if self.uris.is_set_message(&object) {
                    self.forward(body);
                } else {
                    tracing::warn!(otype = object.otype().get(), "Unknown object type");
                }
            } else {
                tracing::warn!(type_ = body.type_().get(), "Unknown event type");
            }
        }
        start_frame
    }

    fn forward(&mut self, request: AtomRef<'_>) {
        match self.to_worker.write_atom(request.header(), request.body()) {
            Ok(_) => {
                tracing::debug!("Queued set message");
                self.worker.signal().post();
                self.metrics.record_request_sent();
            }
            Err(err) => {
                tracing::warn!(error = %err, "Dropping set message");
                self.metrics.record_request_dropped();
            }
        }
    }

    fn render(&mut self, start_frame: usize, output: &mut [f32]) {
        let mut pos = 0;

        if self.play {
            match self.sample.as_deref() {
                Some(sample) => {
                    pos = start_frame.min(output.len());
                    output[..pos].fill(0.0);

                    let data = sample.data().get(self.frame..).unwrap_or(&[]);
                    let n = data.len().min(output.len() - pos);
                    output[pos..pos + n].copy_from_slice(&data[..n]);
                    pos += n;
                    self.frame += n;

                    if self.frame >= sample.frames() {
                        self.play = false;
                    }
                }
                None => self.play = false,
            }
        }

        output[pos..].fill(0.0);
    }

    /// Install samples the worker has loaded.
    ///
    /// Each superseded sample goes back to the worker in a free record. If
    /// that record does not fit, the sample is parked and draining resumes
    /// next block.
    fn apply_results(&mut self, forge: &mut Forge<'_>) {
        if let Some(old) = self.pending_free.take() {
            if let Err(old) = self.release(old) {
                self.pending_free = Some(old);
                return;
            }
        }

        let mut record = [0u8; SAMPLE_RECORD_SIZE];
        while let Some(header) = self.from_worker.peek_header() {
            if header.type_ != self.uris.apply_sample {
                tracing::warn!(type_ = header.type_.get(), "Unknown message from worker");
                if self.from_worker.skip_record().is_none() {
                    break;
                }
                continue;
            }

            match self.from_worker.read_record_into(&mut record) {
                Some(SAMPLE_RECORD_SIZE) => {}
                Some(_) => continue,
                None => break,
            }
            // SAFETY: apply records are only written by the worker through
            // `send_sample`, and this one was just consumed.
            let Some(sample) = (unsafe { take_sample(&record) }) else {
                continue;
            };

            let old = self.sample.replace(sample);
            self.frame = self.frame.min(self.sample.as_ref().map_or(0, |s| s.frames()));
            self.metrics.record_applied();
            self.notify_set(forge);

            if let Some(old) = old {
                if let Err(old) = self.release(old) {
                    self.pending_free = Some(old);
                    break;
                }
            }
        }
    }

    fn release(&mut self, old: Box<Sample>) -> std::result::Result<(), Box<Sample>> {
        send_sample(&mut self.to_worker, self.uris.free_sample, old)?;
        self.worker.signal().post();
        Ok(())
    }

    /// Tell listeners which file is now loaded: an event at frame 0 carrying
    /// `[ a msg:Set ; file <path> ]`.
    fn notify_set(&self, forge: &mut Forge<'_>) {
        let Some(sample) = self.sample.as_deref() else {
            return;
        };
        let written = forge
            .frame_time(0, 0)
            .and_then(|()| self.uris.write_set_file(forge, sample.path()));
        if let Err(err) = written {
            tracing::debug!(error = %err, "No room for notification");
        }
    }

    /// Currently installed sample.
    #[inline]
    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_deref()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.play
    }

    /// Next frame of the current sample to be played.
    #[inline]
    pub fn position(&self) -> usize {
        self.frame
    }

    #[inline]
    pub fn uris(&self) -> &SamplerUris {
        &self.uris
    }

    pub fn metrics(&self) -> WorkerMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn decoder(&self) -> &dyn SampleDecoder {
        self.decoder.as_ref()
    }

    /// Swap in `sample` directly. Only for non-realtime callers.
    pub(crate) fn replace_sample(&mut self, sample: Box<Sample>) -> Option<Box<Sample>> {
        let old = self.sample.replace(sample);
        self.frame = 0;
        self.play = false;
        old
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if let Some(mut requests) = self.worker.stop() {
            drain_samples(&mut requests, &[self.uris.free_sample]);
        }
        drain_samples(&mut self.from_worker, &[self.uris.apply_sample]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_RING_CAPACITY;
    use crate::error::Error;
    use crate::sample::DecodedAudio;
    use approx::assert_relative_eq;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};
    use tessera_atom::{AtomView, UriMap};

    /// Decodes `<n>.wav` to a ramp of `n` frames; anything else fails.
    struct RampDecoder;

    impl SampleDecoder for RampDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAudio> {
            let frames: usize = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse().ok())
                .filter(|_| path.extension().is_some_and(|ext| ext == "wav"))
                .ok_or_else(|| Error::Io(std::io::ErrorKind::NotFound.into()))?;
            Ok(DecodedAudio {
                frames,
                channels: 1,
                sample_rate: 48000,
                samples: (1..=frames).map(|i| i as f32 / 10.0).collect(),
            })
        }
    }

    fn sampler(map: &UriMap, default_sample: Option<&str>) -> Sampler {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut config = SamplerConfig::default().with_worker_name("tessera-worker-test");
        if let Some(path) = default_sample {
            config = config.with_default_sample(path);
        }
        Sampler::new(map, config, Arc::new(RampDecoder)).unwrap()
    }

    fn control(uris: &SamplerUris, events: &[(u32, Event<'_>)]) -> Vec<u8> {
        let mut buf = vec![0u8; 2048];
        let mut forge = Forge::new(uris.atom, &mut buf);
        let frame = forge.sequence_head(Urid::NONE).unwrap();
        for (time, event) in events {
            forge.frame_time(*time, 0).unwrap();
            match event {
                Event::Midi(bytes) => {
                    forge.atom_with(uris.midi_event, bytes).unwrap();
                }
                Event::Set(path) => {
                    uris.write_set_file(&mut forge, path).unwrap();
                }
            }
        }
        forge.pop(frame).unwrap();
        let len = forge.offset();
        drop(forge);
        buf.truncate(len);
        buf
    }

    enum Event<'a> {
        Midi(&'a [u8]),
        Set(&'a str),
    }

    const NOTE_ON: &[u8] = &[0x90, 60, 100];

    /// Its set message fills exactly a quarter of a minimum-size ring.
    const UNLOADABLE: &str = "missing-sample-for-flood.flac";

    /// [`RampDecoder`] that takes a token from `gate` before each decode, so a
    /// test can hold the worker inside a load.
    struct GatedDecoder {
        gate: crossbeam_channel::Receiver<()>,
        entered: AtomicUsize,
    }

    impl GatedDecoder {
        fn new() -> (crossbeam_channel::Sender<()>, Arc<Self>) {
            let (release, gate) = crossbeam_channel::unbounded();
            let decoder = Arc::new(Self {
                gate,
                entered: AtomicUsize::new(0),
            });
            (release, decoder)
        }

        fn wait_entered(&self, count: usize) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.entered.load(Ordering::Acquire) < count {
                assert!(Instant::now() < deadline, "timed out waiting for decode");
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }

    impl SampleDecoder for GatedDecoder {
        fn decode(&self, path: &Path) -> Result<DecodedAudio> {
            self.entered.fetch_add(1, Ordering::AcqRel);
            // A timeout keeps a failing test from hanging the join in drop.
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            RampDecoder.decode(path)
        }
    }

    fn small_ring_sampler(
        map: &UriMap,
        default_sample: Option<&str>,
        decoder: Arc<GatedDecoder>,
    ) -> Sampler {
        let mut config = SamplerConfig::default()
            .with_ring_capacity(MIN_RING_CAPACITY)
            .with_worker_name("tessera-worker-test");
        if let Some(path) = default_sample {
            config = config.with_default_sample(path);
        }
        Sampler::new(map, config, decoder).unwrap()
    }

    /// Paths announced in a notify buffer.
    fn notified_paths(uris: &SamplerUris, notify: &[u8]) -> Vec<String> {
        let sequence = SequenceRef::from_bytes(&uris.atom, notify).unwrap();
        sequence
            .events()
            .map(|event| {
                assert_eq!(event.time.frames, 0);
                let object = event.body.as_object(&uris.atom).unwrap();
                assert!(uris.is_set_message(&object));
                uris.file_path(&object).unwrap().to_owned()
            })
            .collect()
    }

    fn run_until(
        sampler: &mut Sampler,
        mut done: impl FnMut(&Sampler, &[u8]) -> bool,
    ) -> Vec<u8> {
        let empty = control(&sampler.uris, &[]);
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut output = [0.0f32; 16];
        loop {
            let mut notify = vec![0u8; 256];
            sampler.run(&empty, &mut output, &mut notify);
            if done(sampler, &notify) {
                return notify;
            }
            assert!(Instant::now() < deadline, "timed out waiting for worker");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_default_sample_is_loaded() {
        let map = UriMap::new();
        let sampler = sampler(&map, Some("4.wav"));
        assert_eq!(sampler.sample().unwrap().path(), "4.wav");
        assert!(!sampler.is_playing());
    }

    #[test]
    fn test_missing_default_sample() {
        let map = UriMap::new();
        let sampler = sampler(&map, Some("nope.flac"));
        assert!(sampler.sample().is_none());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let map = UriMap::new();
        let config = SamplerConfig::default().with_ring_capacity(8);
        let result = Sampler::new(&map, config, Arc::new(RampDecoder));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_note_on_starts_at_event_frame() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("3.wav"));
        let input = control(sampler.uris(), &[(2, Event::Midi(NOTE_ON))]);
        let mut output = [1.0f32; 8];
        let mut notify = [0u8; 64];

        sampler.run(&input, &mut output, &mut notify);

        let expected = [0.0, 0.0, 0.1, 0.2, 0.3, 0.0, 0.0, 0.0];
        for (got, want) in output.iter().zip(expected) {
            assert_relative_eq!(*got, want);
        }
        assert!(!sampler.is_playing());
        assert!(notified_paths(sampler.uris(), &notify).is_empty());
    }

    #[test]
    fn test_playback_continues_across_blocks() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("6.wav"));
        let start = control(sampler.uris(), &[(0, Event::Midi(NOTE_ON))]);
        let empty = control(sampler.uris(), &[]);
        let mut notify = [0u8; 64];

        let mut first = [0.0f32; 4];
        sampler.run(&start, &mut first, &mut notify);
        assert!(sampler.is_playing());
        assert_eq!(sampler.position(), 4);

        let mut second = [1.0f32; 4];
        sampler.run(&empty, &mut second, &mut notify);
        assert_relative_eq!(second[0], 0.5);
        assert_relative_eq!(second[1], 0.6);
        assert_eq!(&second[2..], &[0.0, 0.0]);
        assert!(!sampler.is_playing());
    }

    #[test]
    fn test_note_off_and_silence() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("3.wav"));
        let input = control(sampler.uris(), &[(0, Event::Midi(&[0x80, 60, 0]))]);
        let mut output = [1.0f32; 4];
        let mut notify = [0u8; 64];

        sampler.run(&input, &mut output, &mut notify);
        assert_eq!(output, [0.0; 4]);
        assert!(!sampler.is_playing());
    }

    #[test]
    fn test_set_message_swaps_sample() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("4.wav"));
        let input = control(sampler.uris(), &[(0, Event::Set("8.wav"))]);
        let mut output = [0.0f32; 16];
        let mut notify = vec![0u8; 256];

        sampler.run(&input, &mut output, &mut notify);
        assert_eq!(sampler.metrics().requests_sent, 1);

        let uris = *sampler.uris();
        let mut announced = notified_paths(&uris, &notify);
        let notify = run_until(&mut sampler, |s, _| s.metrics().samples_applied == 1);
        announced.extend(notified_paths(&uris, &notify));

        assert_eq!(announced, vec!["8.wav".to_owned()]);
        assert_eq!(sampler.sample().unwrap().path(), "8.wav");
        assert_eq!(sampler.sample().unwrap().frames(), 8);

        run_until(&mut sampler, |s, _| s.metrics().samples_freed == 1);
        let metrics = sampler.metrics();
        assert_eq!(metrics.samples_loaded, 1);
        assert_eq!(metrics.samples_freed, 1);
    }

    #[test]
    fn test_missing_file_keeps_current_sample() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("4.wav"));
        let input = control(sampler.uris(), &[(0, Event::Set("missing.flac"))]);
        let mut output = [0.0f32; 16];
        let mut notify = vec![0u8; 256];

        sampler.run(&input, &mut output, &mut notify);
        let uris = *sampler.uris();
        let notify = run_until(&mut sampler, |s, _| s.metrics().load_failures == 1);

        assert!(notified_paths(&uris, &notify).is_empty());
        assert_eq!(sampler.sample().unwrap().path(), "4.wav");
        assert_eq!(sampler.metrics().samples_applied, 0);
    }

    #[test]
    fn test_tiny_notify_buffer_still_applies() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, None);
        let input = control(sampler.uris(), &[(0, Event::Set("2.wav"))]);
        let empty = control(sampler.uris(), &[]);
        let mut output = [0.0f32; 4];
        let mut notify = [0u8; 4];

        sampler.run(&input, &mut output, &mut notify);
        let deadline = Instant::now() + Duration::from_secs(5);
        while sampler.sample().is_none() {
            assert!(Instant::now() < deadline, "timed out waiting for worker");
            std::thread::sleep(Duration::from_millis(1));
            sampler.run(&empty, &mut output, &mut notify);
        }
        assert_eq!(sampler.sample().unwrap().path(), "2.wav");
    }

    #[test]
    fn test_unknown_events_are_skipped() {
        let map = UriMap::new();
        let mut sampler = sampler(&map, Some("2.wav"));
        let mut buf = vec![0u8; 256];
        let mut forge = Forge::new(sampler.uris().atom, &mut buf);
        let frame = forge.sequence_head(Urid::NONE).unwrap();
        forge.frame_time(0, 0).unwrap();
        forge.int(42).unwrap();
        forge.frame_time(1, 0).unwrap();
        let object = forge.blank(Urid::NONE, map.map("urn:other")).unwrap();
        forge.pop(object).unwrap();
        forge.frame_time(1, 0).unwrap();
        forge.atom_with(sampler.uris().midi_event, NOTE_ON).unwrap();
        forge.pop(frame).unwrap();
        let len = forge.offset();
        drop(forge);
        buf.truncate(len);

        let mut output = [0.0f32; 4];
        let mut notify = [0u8; 64];
        sampler.run(&buf, &mut output, &mut notify);

        assert_eq!(sampler.metrics().requests_sent, 0);
        assert_relative_eq!(output[1], 0.1);
        assert_relative_eq!(output[2], 0.2);
        assert!(matches!(
            AtomRef::from_bytes(&notify).unwrap().view(&sampler.uris().atom),
            AtomView::Sequence(seq) if seq.is_empty()
        ));
    }

    #[test]
    fn test_full_request_ring_drops_set_messages() {
        let map = UriMap::new();
        let (release, decoder) = GatedDecoder::new();
        let mut sampler = small_ring_sampler(&map, None, Arc::clone(&decoder));
        let flood: Vec<_> = (0..12).map(|_| (0u32, Event::Set(UNLOADABLE))).collect();
        let input = control(sampler.uris(), &flood);
        let mut output = [1.0f32; 16];
        let mut notify = vec![0u8; 256];

        sampler.run(&input, &mut output, &mut notify);

        // The block completes even though most requests had nowhere to go.
        assert_eq!(output, [0.0; 16]);
        let metrics = sampler.metrics();
        assert_eq!(metrics.requests_sent + metrics.requests_dropped, 12);
        assert!(metrics.requests_dropped > 0);
        assert!(metrics.requests_sent <= 5);

        drop(release);
        let sent = metrics.requests_sent;
        run_until(&mut sampler, |s, _| s.metrics().load_failures == sent);
        assert_eq!(sampler.metrics().samples_applied, 0);
        assert!(sampler.sample().is_none());
    }

    #[test]
    fn test_free_record_is_retried_when_ring_is_full() {
        let map = UriMap::new();
        let (release, decoder) = GatedDecoder::new();
        // One token for the default sample loaded in `new`.
        release.send(()).unwrap();
        let mut sampler = small_ring_sampler(&map, Some("2.wav"), Arc::clone(&decoder));
        let mut output = [0.0f32; 4];
        let mut notify = vec![0u8; 256];

        // Hold the worker inside the load of 3.wav with a request queued behind it.
        let input = control(
            sampler.uris(),
            &[(0, Event::Set("3.wav")), (0, Event::Set(UNLOADABLE))],
        );
        sampler.run(&input, &mut output, &mut notify);
        decoder.wait_entered(2);

        // Let 3.wav finish. The worker replies, takes the next request, and
        // blocks again, so the apply record is waiting.
        release.send(()).unwrap();
        decoder.wait_entered(3);

        // Fill the request ring in the same block that installs 3.wav.
        let flood: Vec<_> = (0..6).map(|_| (0u32, Event::Set(UNLOADABLE))).collect();
        let input = control(sampler.uris(), &flood);
        sampler.run(&input, &mut output, &mut notify);

        assert_eq!(sampler.sample().unwrap().path(), "3.wav");
        assert_eq!(sampler.pending_free.as_ref().unwrap().path(), "2.wav");
        assert!(sampler.metrics().requests_dropped > 0);
        assert_eq!(sampler.metrics().samples_freed, 0);

        drop(release);
        run_until(&mut sampler, |s, _| s.metrics().samples_freed == 1);
        assert!(sampler.pending_free.is_none());

        let sent = sampler.metrics().requests_sent;
        run_until(&mut sampler, |s, _| s.metrics().load_failures == sent - 1);
        let metrics = sampler.metrics();
        assert_eq!(metrics.samples_freed, 1);
        assert_eq!(metrics.samples_applied, 1);
        assert_eq!(metrics.samples_loaded, 1);
    }
}
