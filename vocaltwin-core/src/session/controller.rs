use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::analysis::fallback;
use crate::models::analysis::AnalysisReport;
use crate::models::audio::SampleSpec;
use crate::models::config::SessionConfig;
use crate::models::error::SessionError;
use crate::models::metrics::{Clarity, FrameMetrics};
use crate::models::state::RecordingState;
use crate::processing::resample::{downmix_to_mono, resample_mono};
use crate::session::analyzer::LiveAnalyzer;
use crate::session::capture::CaptureSession;
use crate::session::sink::RecordingSink;
use crate::session::visual::VisualDriver;
use crate::traits::analysis_backend::AnalysisBackend;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureConstraints, CaptureProvider};
use crate::traits::session_delegate::SessionDelegate;

/// Why a capturing session ended. All three converge on one teardown path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    TimeLimit,
    Manual,
    Closed,
}

struct Inner {
    state: RecordingState,
    /// Cancellation handle for the running driver task. Sending on it (or
    /// dropping it) ends the frame loop; no flag polling involved.
    stop_tx: Option<oneshot::Sender<StopReason>>,
}

/// Orchestrates one recording session end to end.
///
/// State machine: `idle → capturing → finalizing → idle`. Start arms the
/// recording sink and live analyzer, opens the microphone lease feeding both,
/// and spawns a driver task running the 1-second countdown and the
/// per-frame metric/visual loop in a single `select!`. Manual stop, the
/// 10-second cap, and user close all cancel that loop first, then close the
/// lease, then flush the sink; the finalized buffer is submitted for
/// analysis and exactly one result (remote or fallback) reaches the delegate.
///
/// Reusable across sessions: idle is both the initial and terminal state.
pub struct SessionController {
    config: SessionConfig,
    capture: Arc<Mutex<CaptureSession>>,
    backend: Arc<dyn AnalysisBackend>,
    delegate: Arc<dyn SessionDelegate>,
    user_avatar_url: Option<String>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionController {
    pub fn new(
        provider: Box<dyn CaptureProvider>,
        backend: Arc<dyn AnalysisBackend>,
        delegate: Arc<dyn SessionDelegate>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::InvalidConfig)?;
        Ok(Self {
            config,
            capture: Arc::new(Mutex::new(CaptureSession::new(provider))),
            backend,
            delegate,
            user_avatar_url: None,
            inner: Arc::new(Mutex::new(Inner {
                state: RecordingState::Idle,
                stop_tx: None,
            })),
        })
    }

    /// Avatar forwarded into fallback reports (the remote service echoes its
    /// own copy).
    pub fn set_user_avatar(&mut self, url: Option<String>) {
        self.user_avatar_url = url;
    }

    pub fn state(&self) -> RecordingState {
        self.inner.lock().state
    }

    /// Begin a recording session. Transitions `idle → capturing`.
    ///
    /// Rejected with `AlreadyCapturing` while a session is active; a second
    /// start never opens a second microphone lease. On microphone failure the
    /// controller stays idle with no partial state behind.
    ///
    /// Must be called within a tokio runtime; the driver task is spawned onto
    /// it.
    pub fn start(&self) -> Result<(), SessionError> {
        {
            let inner = self.inner.lock();
            if !inner.state.is_idle() {
                return Err(SessionError::AlreadyCapturing);
            }
        }

        let session_id = Uuid::new_v4();
        let analyzer = LiveAnalyzer::new(self.config.fft_size);
        let sink = Arc::new(Mutex::new(RecordingSink::new(
            self.config.encoding_preferences.clone(),
        )));

        // Two independent consumers of the one stream: the sink buffers for
        // upload, the tap feeds the analyzer. Neither may close the stream.
        let callback: AudioBufferCallback = {
            let sink = Arc::clone(&sink);
            let tap = analyzer.tap();
            let target_rate = self.config.sample_rate as f64;
            Arc::new(move |samples, sample_rate, channels| {
                let mono = downmix_to_mono(samples, channels as usize);
                let mono = resample_mono(&mono, sample_rate, target_rate);
                sink.lock().append(&mono);
                tap.lock().push(&mono);
            })
        };

        let constraints = CaptureConstraints {
            sample_rate: self.config.sample_rate,
            echo_cancellation: self.config.echo_cancellation,
            noise_suppression: self.config.noise_suppression,
        };

        // The sink must be accepting samples before the lease opens: providers
        // may deliver buffers synchronously from start, and those are part of
        // the recording.
        if let Err(e) = sink.lock().start(SampleSpec {
            sample_rate: self.config.sample_rate,
            channels: 1,
        }) {
            self.delegate.on_error(&e);
            return Err(e);
        }

        if let Err(e) = self.capture.lock().open(&constraints, callback) {
            log::error!("session {}: cannot access microphone: {}", session_id, e);
            // The armed sink is discarded unfinalized; nothing is submitted.
            self.delegate.on_error(&e);
            return Err(e);
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut inner = self.inner.lock();
            inner.state = RecordingState::Capturing { elapsed_secs: 0 };
            inner.stop_tx = Some(stop_tx);
        }
        self.delegate
            .on_state_changed(&RecordingState::Capturing { elapsed_secs: 0 });
        log::info!("session {}: capturing started", session_id);

        tokio::spawn(run_driver(DriverContext {
            session_id,
            config: self.config.clone(),
            capture: Arc::clone(&self.capture),
            sink,
            analyzer,
            backend: Arc::clone(&self.backend),
            delegate: Arc::clone(&self.delegate),
            inner: Arc::clone(&self.inner),
            user_avatar_url: self.user_avatar_url.clone(),
            stop_rx,
        }));
        Ok(())
    }

    /// Explicit user stop. Fails with `NotRecording` when no session is
    /// capturing; the state machine guards the sink's contract.
    pub fn stop(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !inner.state.is_capturing() {
            return Err(SessionError::NotRecording);
        }
        if let Some(tx) = inner.stop_tx.take() {
            let _ = tx.send(StopReason::Manual);
        }
        Ok(())
    }

    /// User close / navigate-away. Short-circuits the countdown but still
    /// runs the same finalize → submit path; a result is delivered even on
    /// early close. Safe to call in any state.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if let Some(tx) = inner.stop_tx.take() {
            let _ = tx.send(StopReason::Closed);
        }
    }
}

struct DriverContext {
    session_id: Uuid,
    config: SessionConfig,
    capture: Arc<Mutex<CaptureSession>>,
    sink: Arc<Mutex<RecordingSink>>,
    analyzer: LiveAnalyzer,
    backend: Arc<dyn AnalysisBackend>,
    delegate: Arc<dyn SessionDelegate>,
    inner: Arc<Mutex<Inner>>,
    user_avatar_url: Option<String>,
    stop_rx: oneshot::Receiver<StopReason>,
}

/// One session's driver: countdown + frame loop, then teardown and handoff.
async fn run_driver(ctx: DriverContext) {
    let DriverContext {
        session_id,
        config,
        capture,
        sink,
        mut analyzer,
        backend,
        delegate,
        inner,
        user_avatar_url,
        mut stop_rx,
    } = ctx;

    let mut frame = interval(Duration::from_millis(config.frame_interval_ms));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut countdown = interval_at(
        Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );

    let mut elapsed = 0u32;
    let mut last_metrics: Option<FrameMetrics> = None;

    let reason = loop {
        tokio::select! {
            res = &mut stop_rx => {
                break res.unwrap_or(StopReason::Closed);
            }
            _ = countdown.tick() => {
                elapsed += 1;
                inner.lock().state = RecordingState::Capturing { elapsed_secs: elapsed };
                delegate.on_tick(elapsed);
                if elapsed >= config.max_duration_secs {
                    break StopReason::TimeLimit;
                }
            }
            _ = frame.tick() => {
                let metrics = analyzer.sample();
                let visual = VisualDriver::render(&metrics);
                delegate.on_frame(&metrics, &visual);
                last_metrics = Some(metrics);
            }
        }
    };
    log::info!(
        "session {}: capturing ended ({:?}) after {}s",
        session_id,
        reason,
        elapsed
    );

    // Teardown order: the frame loop is already cancelled (we just left it),
    // so no callback can observe a closed stream; release the lease before
    // flushing the encoder.
    capture.lock().close();

    inner.lock().state = RecordingState::Finalizing;
    delegate.on_state_changed(&RecordingState::Finalizing);

    // Defaults match the pre-capture readouts when no frame ever ran.
    let (final_clarity, final_stability) = last_metrics
        .map(|m| (m.clarity, m.stability_display))
        .unwrap_or((Clarity::High, 92));

    // Bind first so the sink guard is released before the analysis await.
    let stopped = sink.lock().stop();
    let report: AnalysisReport = match stopped {
        Ok(audio) => {
            let filename = format!(
                "recording_{}{}",
                chrono::Utc::now().timestamp_millis(),
                audio.encoding.extension()
            );
            match backend.analyze(audio, &filename).await {
                Ok(report) => report,
                Err(e) => {
                    log::warn!(
                        "session {}: analysis failed, delivering fallback: {}",
                        session_id,
                        e
                    );
                    delegate.on_error(&e);
                    fallback::synthesize(final_clarity, final_stability, user_avatar_url)
                }
            }
        }
        Err(e) => {
            log::warn!(
                "session {}: no recording buffer, delivering fallback: {}",
                session_id,
                e
            );
            delegate.on_error(&e);
            fallback::synthesize(final_clarity, final_stability, user_avatar_url)
        }
    };

    delegate.on_result(&report);

    {
        let mut guard = inner.lock();
        guard.state = RecordingState::Idle;
        guard.stop_tx = None;
    }
    delegate.on_state_changed(&RecordingState::Idle);
    log::info!("session {}: back to idle", session_id);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use crate::models::analysis::{MatchedSinger, RadarPoint, ReportOrigin};
    use crate::models::audio::{EncodedAudio, MicrophoneInfo};
    use crate::session::visual::VisualFrame;

    use super::*;

    // --- Test doubles -----------------------------------------------------

    struct ScriptedProvider {
        deny: bool,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl CaptureProvider for ScriptedProvider {
        fn is_available(&self) -> bool {
            true
        }

        fn start(
            &mut self,
            _constraints: &CaptureConstraints,
            callback: AudioBufferCallback,
        ) -> Result<(), SessionError> {
            if self.deny {
                return Err(SessionError::PermissionDenied);
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            // Deliver one block up front so the sink has real bytes to flush.
            let samples: Vec<f32> = (0..4410)
                .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin() * 0.4)
                .collect();
            callback(&samples, 44_100.0, 1);
            Ok(())
        }

        fn stop(&mut self) -> Result<(), SessionError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn device_info(&self) -> MicrophoneInfo {
            MicrophoneInfo {
                id: "scripted".into(),
                name: "Scripted Microphone".into(),
                is_default: true,
            }
        }
    }

    struct StubBackend {
        fail: bool,
        filenames: Arc<parking_lot::Mutex<Vec<String>>>,
        payload_sizes: Arc<parking_lot::Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl AnalysisBackend for StubBackend {
        async fn analyze(
            &self,
            audio: EncodedAudio,
            filename: &str,
        ) -> Result<AnalysisReport, SessionError> {
            self.filenames.lock().push(filename.to_string());
            self.payload_sizes.lock().push(audio.len());
            if self.fail {
                return Err(SessionError::AnalysisFailed("server returned 500".into()));
            }
            Ok(AnalysisReport {
                score: 93,
                clarity: "High".into(),
                stability: "92%".into(),
                radar: vec![RadarPoint {
                    subject: "Warmth".into(),
                    user: 88.0,
                    reference: 95.0,
                    full_mark: 150.0,
                }],
                matched_singer: MatchedSinger {
                    name: "Adele".into(),
                    description: "Mezzo-soprano • Soul • Pop".into(),
                    avatar_url: "https://example.com/adele.jpg".into(),
                },
                user_avatar_url: None,
                origin: ReportOrigin::Remote,
            })
        }
    }

    enum Event {
        State(RecordingState),
        Result(AnalysisReport),
        Error(SessionError),
    }

    struct ChannelDelegate {
        events: mpsc::UnboundedSender<Event>,
        frames: Arc<AtomicUsize>,
    }

    impl SessionDelegate for ChannelDelegate {
        fn on_state_changed(&self, state: &RecordingState) {
            let _ = self.events.send(Event::State(*state));
        }

        fn on_frame(&self, _metrics: &FrameMetrics, _visual: &VisualFrame) {
            self.frames.fetch_add(1, Ordering::SeqCst);
        }

        fn on_tick(&self, _elapsed_secs: u32) {}

        fn on_error(&self, error: &SessionError) {
            let _ = self.events.send(Event::Error(error.clone()));
        }

        fn on_result(&self, report: &AnalysisReport) {
            let _ = self.events.send(Event::Result(report.clone()));
        }
    }

    struct Harness {
        controller: SessionController,
        events: mpsc::UnboundedReceiver<Event>,
        frames: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        starts: Arc<AtomicUsize>,
        filenames: Arc<parking_lot::Mutex<Vec<String>>>,
        payload_sizes: Arc<parking_lot::Mutex<Vec<usize>>>,
    }

    fn harness(deny: bool, backend_fails: bool, max_duration_secs: u32) -> Harness {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider {
            deny,
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
        };

        let filenames = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let payload_sizes = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let backend = StubBackend {
            fail: backend_fails,
            filenames: Arc::clone(&filenames),
            payload_sizes: Arc::clone(&payload_sizes),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let frames = Arc::new(AtomicUsize::new(0));
        let delegate = ChannelDelegate {
            events: tx,
            frames: Arc::clone(&frames),
        };

        let config = SessionConfig {
            max_duration_secs,
            frame_interval_ms: 10,
            ..SessionConfig::default()
        };

        let controller = SessionController::new(
            Box::new(provider),
            Arc::new(backend),
            Arc::new(delegate),
            config,
        )
        .unwrap();

        Harness {
            controller,
            events: rx,
            frames,
            stops,
            starts,
            filenames,
            payload_sizes,
        }
    }

    async fn wait_for_result(events: &mut mpsc::UnboundedReceiver<Event>) -> AnalysisReport {
        loop {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for result")
                .expect("delegate channel closed");
            if let Event::Result(report) = event {
                return report;
            }
        }
    }

    async fn wait_for_idle(events: &mut mpsc::UnboundedReceiver<Event>) {
        loop {
            let event = timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for idle")
                .expect("delegate channel closed");
            if let Event::State(RecordingState::Idle) = event {
                return;
            }
        }
    }

    // --- Scenarios --------------------------------------------------------

    #[tokio::test]
    async fn timeout_runs_the_full_finalize_path() {
        let mut h = harness(false, false, 1);
        h.controller.start().unwrap();
        assert!(h.controller.state().is_capturing());

        let report = wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        assert_eq!(report.origin, ReportOrigin::Remote);
        assert!(h.controller.state().is_idle());
        assert_eq!(h.stops.load(Ordering::SeqCst), 1, "lease closed exactly once");
        assert!(h.frames.load(Ordering::SeqCst) > 0, "frame loop ran");

        // Payload round-trip: filename extension matches the WAV sink output.
        let filenames = h.filenames.lock();
        assert_eq!(filenames.len(), 1);
        assert!(filenames[0].starts_with("recording_"));
        assert!(filenames[0].ends_with(".wav"));
        assert!(h.payload_sizes.lock()[0] > 44, "finalized buffer has audio data");
    }

    #[tokio::test]
    async fn manual_stop_takes_the_same_path_as_timeout() {
        let mut h = harness(false, false, 10);
        h.controller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.controller.stop().unwrap();

        let report = wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        assert_eq!(report.origin, ReportOrigin::Remote);
        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert!(h.controller.state().is_idle());
    }

    #[tokio::test]
    async fn close_mid_capture_still_delivers_exactly_one_result() {
        let mut h = harness(false, false, 10);
        h.controller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.controller.close();

        wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        assert_eq!(h.stops.load(Ordering::SeqCst), 1);
        assert_eq!(h.filenames.lock().len(), 1, "sink finalized what it had buffered");

        // No second result arrives afterwards.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut extra_results = 0;
        while let Ok(event) = h.events.try_recv() {
            if matches!(event, Event::Result(_)) {
                extra_results += 1;
            }
        }
        assert_eq!(extra_results, 0);
    }

    #[tokio::test]
    async fn permission_denied_leaves_controller_idle() {
        let mut h = harness(true, false, 10);
        let err = h.controller.start().unwrap_err();

        assert_eq!(err, SessionError::PermissionDenied);
        assert!(h.controller.state().is_idle());
        assert_eq!(h.starts.load(Ordering::SeqCst), 0);
        assert_eq!(h.frames.load(Ordering::SeqCst), 0, "analyzer never started");
        assert!(h.filenames.lock().is_empty(), "nothing was submitted");

        // The only event is the surfaced error; no result ever fires.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let mut saw_error = false;
        while let Ok(event) = h.events.try_recv() {
            match event {
                Event::Error(SessionError::PermissionDenied) => saw_error = true,
                Event::Result(_) => panic!("result callback must not fire"),
                _ => {}
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn second_start_is_rejected_without_a_second_lease() {
        let mut h = harness(false, false, 10);
        h.controller.start().unwrap();

        let err = h.controller.start().unwrap_err();
        assert_eq!(err, SessionError::AlreadyCapturing);
        assert_eq!(h.starts.load(Ordering::SeqCst), 1);

        h.controller.close();
        wait_for_idle(&mut h.events).await;
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_marked_fallback() {
        let mut h = harness(false, true, 1);
        h.controller.start().unwrap();

        let report = wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        assert_eq!(report.origin, ReportOrigin::Fallback);
        assert_eq!(report.radar.len(), 5);
        assert!((85..=99).contains(&report.score));
        assert!(h.controller.state().is_idle());
    }

    #[tokio::test]
    async fn controller_is_reusable_across_sessions() {
        let mut h = harness(false, false, 1);

        h.controller.start().unwrap();
        wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        h.controller.start().unwrap();
        wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        assert_eq!(h.starts.load(Ordering::SeqCst), 2);
        assert_eq!(h.stops.load(Ordering::SeqCst), 2);
        assert_eq!(h.filenames.lock().len(), 2);
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_contract_violation() {
        let h = harness(false, false, 10);
        assert_eq!(h.controller.stop().unwrap_err(), SessionError::NotRecording);
    }

    #[tokio::test]
    async fn audio_delivered_while_the_lease_opens_is_recorded() {
        let mut h = harness(false, false, 10);
        h.controller.start().unwrap();
        h.controller.stop().unwrap();

        wait_for_result(&mut h.events).await;
        wait_for_idle(&mut h.events).await;

        // The scripted provider pushes 4410 samples synchronously from start;
        // every one of them must land in the finalized WAV.
        assert_eq!(h.payload_sizes.lock()[0], 44 + 4410 * 2);
    }

    #[test]
    fn driver_future_moves_across_threads() {
        // tokio::spawn requires the driver future to be Send; no lock guard
        // may be held across an await inside it.
        fn require_send<T: Send>(_: &T) {}

        let config = SessionConfig::default();
        let provider = ScriptedProvider {
            deny: false,
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        };
        let (events, _events_rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = oneshot::channel();

        let ctx = DriverContext {
            session_id: Uuid::new_v4(),
            capture: Arc::new(Mutex::new(CaptureSession::new(Box::new(provider)))),
            sink: Arc::new(Mutex::new(RecordingSink::new(
                config.encoding_preferences.clone(),
            ))),
            analyzer: LiveAnalyzer::new(config.fft_size),
            backend: Arc::new(StubBackend {
                fail: false,
                filenames: Arc::new(parking_lot::Mutex::new(Vec::new())),
                payload_sizes: Arc::new(parking_lot::Mutex::new(Vec::new())),
            }),
            delegate: Arc::new(ChannelDelegate {
                events,
                frames: Arc::new(AtomicUsize::new(0)),
            }),
            inner: Arc::new(Mutex::new(Inner {
                state: RecordingState::Idle,
                stop_tx: None,
            })),
            user_avatar_url: None,
            config,
            stop_rx,
        };

        require_send(&run_driver(ctx));
    }
}
