//! Attempt state machine.
//!
//! The state machine sequences through: Idle → Running → terminal state.
//! Each Running step draws one candidate, types it, waits, captures the
//! screen and compares it with the reference. Stop and pause are checked at
//! the start of every step, before anything is typed.

use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::automation::config::AttemptConfig;
use crate::automation::stats::SessionStats;
use crate::candidate::CandidateGenerator;
use crate::capture::ScreenSampler;
use crate::detection::SuccessDetector;
use crate::error::{Error, Result};
use crate::input::InputInjector;

/// Poll interval while paused or waiting for the operator to focus the target.
const PAUSE_POLL_MS: u64 = 50;

/// Attempt state machine states.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptState {
    /// Configured, reference not loaded yet
    Idle,
    /// Trying candidates
    Running,
    /// The reference screen appeared after typing this candidate
    Success(String),
    /// Candidate space or attempt budget used up
    Exhausted,
    /// Stop requested by the operator (or failsafe)
    Stopped,
    /// Injection, capture or detection failed
    Failed(String),
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptState::Idle | AttemptState::Running)
    }

    /// Short machine-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            AttemptState::Idle => "idle",
            AttemptState::Running => "running",
            AttemptState::Success(_) => "success",
            AttemptState::Exhausted => "exhausted",
            AttemptState::Stopped => "stopped",
            AttemptState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptState::Idle => write!(f, "Idle"),
            AttemptState::Running => write!(f, "Running"),
            AttemptState::Success(candidate) => write!(f, "Success: {}", candidate),
            AttemptState::Exhausted => write!(f, "Exhausted"),
            AttemptState::Stopped => write!(f, "Stopped"),
            AttemptState::Failed(msg) => write!(f, "Failed: {}", msg),
        }
    }
}

/// Stop and pause flags shared between the worker and the UI/CLI.
#[derive(Debug, Clone, Default)]
pub struct ControlSignals {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the session to stop at the next iteration boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }
}

/// Attempt context holding state, configuration and collaborators.
pub struct AttemptContext {
    /// Current state
    pub state: AttemptState,
    /// Validated configuration, fixed for the session
    pub config: AttemptConfig,
    /// Session counters
    pub stats: SessionStats,
    /// Frame that matched the reference, if any
    pub matched_frame: Option<DynamicImage>,
    candidates: CandidateGenerator,
    detector: Option<SuccessDetector>,
    injector: Box<dyn InputInjector>,
    sampler: Box<dyn ScreenSampler>,
    signals: ControlSignals,
}

impl AttemptContext {
    /// Creates a new attempt context.
    ///
    /// Fails with `InvalidConfiguration` without ever entering Running.
    pub fn new(
        config: AttemptConfig,
        injector: Box<dyn InputInjector>,
        sampler: Box<dyn ScreenSampler>,
        signals: ControlSignals,
    ) -> Result<Self> {
        config.validate()?;
        let candidates = CandidateGenerator::new(config.password_length, config.start_from)?;

        Ok(Self {
            state: AttemptState::Idle,
            config,
            stats: SessionStats::default(),
            matched_frame: None,
            candidates,
            detector: None,
            injector,
            sampler,
            signals,
        })
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `true` if the session should continue, `false` once it has
    /// reached a terminal state.
    pub fn step(&mut self) -> bool {
        match &self.state {
            AttemptState::Idle => {
                self.begin();
                !self.state.is_terminal()
            }
            AttemptState::Running => {
                self.run_iteration();
                !self.state.is_terminal()
            }
            _ => false,
        }
    }

    /// Steps until a terminal state is reached.
    #[cfg(test)]
    pub fn run_to_end(&mut self) -> &AttemptState {
        while self.step() {}
        &self.state
    }

    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    /// Idle → Running: resets statistics and loads the reference image.
    fn begin(&mut self) {
        self.stats = SessionStats::default();
        self.candidates.restart();

        if self.config.demo_mode {
            log::info!(
                "Demo mode: no input will be sent, success on {:?}",
                self.config.demo_success_value
            );
        } else {
            match SuccessDetector::from_path(
                &self.config.reference_image_path,
                self.config.similarity_threshold,
            ) {
                Ok(detector) => self.detector = Some(detector),
                Err(e) => {
                    log::error!("Cannot start session: {}", e);
                    self.state = AttemptState::Failed(e.to_string());
                    return;
                }
            }
        }

        if !self.config.demo_mode && !self.wait_for_focus() {
            log::info!("Stop requested before the first candidate");
            self.state = AttemptState::Stopped;
            return;
        }

        log::info!(
            "Starting session: length {}, {} candidates from {:0width$}, up to {} attempts, delay {:.2}s",
            self.candidates.length(),
            self.candidates.total(),
            self.config.start_from,
            self.config.max_attempts,
            self.config.attempt_delay,
            width = self.config.password_length as usize
        );
        self.state = AttemptState::Running;
    }

    fn run_iteration(&mut self) {
        if !self.wait_while_paused() {
            log::info!("Stop requested after {} attempts", self.stats.attempts);
            self.state = AttemptState::Stopped;
            return;
        }

        let Some(candidate) = self.candidates.next() else {
            log::info!(
                "Candidate space exhausted after {} attempts",
                self.stats.attempts
            );
            self.state = AttemptState::Exhausted;
            return;
        };

        self.stats.attempts += 1;
        self.stats.current_candidate = Some(candidate.clone());

        match self.attempt(&candidate) {
            Ok(true) => {
                log::info!(
                    "Success with {} after {} attempts in {:.1}s",
                    candidate,
                    self.stats.attempts,
                    self.stats.elapsed_seconds()
                );
                self.state = AttemptState::Success(candidate);
            }
            Ok(false) => {
                if self.stats.attempts >= self.config.max_attempts {
                    log::info!("Reached max_attempts ({})", self.config.max_attempts);
                    self.state = AttemptState::Exhausted;
                }
            }
            Err(Error::FailsafeTriggered) => {
                log::warn!(
                    "Failsafe triggered at candidate {} (attempt {})",
                    candidate,
                    self.stats.attempts
                );
                self.state = AttemptState::Stopped;
            }
            Err(e) => {
                log::error!(
                    "Attempt {} with candidate {} failed: {}",
                    self.stats.attempts,
                    candidate,
                    e
                );
                self.state = AttemptState::Failed(e.to_string());
            }
        }
    }

    /// Gives the operator time to focus the target input before anything is
    /// typed. Returns `false` if a stop was requested meanwhile.
    fn wait_for_focus(&self) -> bool {
        let lead_in = self.config.focus_lead_in();
        if lead_in.is_zero() {
            return !self.signals.stop_requested();
        }

        log::info!(
            "Typing starts in {:.1}s: focus the target input now",
            lead_in.as_secs_f64()
        );
        let deadline = std::time::Instant::now() + lead_in;
        while !self.signals.stop_requested() {
            let now = std::time::Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(Duration::from_millis(PAUSE_POLL_MS)));
        }
        !self.signals.stop_requested()
    }

    /// Blocks while paused. Returns `false` if a stop was requested.
    fn wait_while_paused(&self) -> bool {
        let mut logged = false;
        while self.signals.is_paused() && !self.signals.stop_requested() {
            if !logged {
                log::info!("Paused at attempt {}", self.stats.attempts);
                logged = true;
            }
            std::thread::sleep(Duration::from_millis(PAUSE_POLL_MS));
        }
        if logged && !self.signals.stop_requested() {
            log::info!("Resumed");
        }
        !self.signals.stop_requested()
    }

    /// Tries one candidate. Returns whether the reference screen appeared.
    fn attempt(&mut self, candidate: &str) -> Result<bool> {
        log::debug!("Attempt {}: {}", self.stats.attempts, candidate);

        if self.config.demo_mode {
            self.sleep_delay();
            return Ok(candidate == self.config.demo_success_value);
        }

        self.injector.inject(candidate, self.config.press_enter)?;
        self.sleep_delay();

        let frame = self.sampler.capture()?;
        let detector = self
            .detector
            .as_ref()
            .ok_or_else(|| Error::ImageDecode("reference image not loaded".into()))?;
        let result = detector.compare(&frame)?;
        self.stats.last_similarity = Some(result.similarity);

        log::debug!(
            "Candidate {}: similarity {:.4} (threshold {:.2})",
            candidate,
            result.similarity,
            detector.threshold()
        );

        if result.is_match {
            self.matched_frame = Some(frame);
        }
        Ok(result.is_match)
    }

    fn sleep_delay(&self) {
        let delay = self.config.delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    /// Returns a progress string for display (e.g., in the CLI status line).
    pub fn progress_string(&self) -> String {
        match &self.state {
            AttemptState::Running => format!(
                "{}/{} - {} ({:.1}/s)",
                self.stats.attempts,
                self.config.max_attempts,
                self.stats.current_candidate.as_deref().unwrap_or("-"),
                self.stats.rate_per_second()
            ),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::automation::config::MAX_DELAY_SECS;
    use image::{Rgb, RgbImage};
    use std::path::Path;
    use std::sync::Mutex;

    /// Records every typed candidate; optionally fails or raises stop on a given call.
    pub struct FakeInjector {
        pub typed: Arc<Mutex<Vec<String>>>,
        pub stop_on: Option<(usize, ControlSignals)>,
        pub fail_on: Option<usize>,
        pub failsafe_on: Option<usize>,
    }

    impl FakeInjector {
        pub fn new(typed: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                typed,
                stop_on: None,
                fail_on: None,
                failsafe_on: None,
            }
        }
    }

    impl InputInjector for FakeInjector {
        fn inject(&mut self, text: &str, _confirm: bool) -> Result<()> {
            let mut typed = self.typed.lock().unwrap();
            let call = typed.len() + 1;
            if self.failsafe_on == Some(call) {
                return Err(Error::FailsafeTriggered);
            }
            if self.fail_on == Some(call) {
                return Err(Error::Injection("simulated failure".into()));
            }
            typed.push(text.to_string());
            if let Some((n, signals)) = &self.stop_on {
                if *n == call {
                    signals.request_stop();
                }
            }
            Ok(())
        }
    }

    /// Shows the "success" frame once the injector has typed `unlock_code`.
    pub struct FakeSampler {
        pub typed: Arc<Mutex<Vec<String>>>,
        pub unlock_code: Option<String>,
        pub fail: bool,
    }

    impl ScreenSampler for FakeSampler {
        fn capture(&mut self) -> Result<DynamicImage> {
            if self.fail {
                return Err(Error::Capture("simulated capture failure".into()));
            }
            let last = self.typed.lock().unwrap().last().cloned();
            if last.is_some() && last == self.unlock_code {
                Ok(success_frame())
            } else {
                Ok(locked_frame())
            }
        }
    }

    pub fn success_frame() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, 200])
        }))
    }

    pub fn locked_frame() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([10, 10, 10])))
    }

    pub fn write_reference(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("success.png");
        success_frame().save(&path).unwrap();
        path
    }

    fn context(
        config: AttemptConfig,
        injector: FakeInjector,
        typed: Arc<Mutex<Vec<String>>>,
        unlock_code: Option<&str>,
        signals: ControlSignals,
    ) -> AttemptContext {
        let sampler = FakeSampler {
            typed,
            unlock_code: unlock_code.map(str::to_string),
            fail: false,
        };
        AttemptContext::new(config, Box::new(injector), Box::new(sampler), signals).unwrap()
    }

    fn base_config(reference: &Path) -> AttemptConfig {
        AttemptConfig {
            reference_image_path: reference.to_path_buf(),
            attempt_delay: 0.0,
            focus_delay: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", AttemptState::Idle), "Idle");
        assert_eq!(
            format!("{}", AttemptState::Success("0042".to_string())),
            "Success: 0042"
        );
        assert_eq!(
            format!("{}", AttemptState::Failed("test".to_string())),
            "Failed: test"
        );
        assert_eq!(AttemptState::Exhausted.label(), "exhausted");
    }

    #[test]
    fn test_success_when_reference_appears() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = context(
            AttemptConfig {
                password_length: 3,
                start_from: 40,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            Some("042"),
            ControlSignals::new(),
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Success("042".to_string()));
        assert_eq!(*typed.lock().unwrap(), vec!["040", "041", "042"]);
        assert_eq!(ctx.stats.attempts, 3);
        assert_eq!(ctx.stats.last_similarity, Some(1.0));
        assert!(ctx.matched_frame.is_some());
    }

    #[test]
    fn test_exhausted_after_exactly_max_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = context(
            AttemptConfig {
                max_attempts: 5,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Exhausted);
        assert_eq!(typed.lock().unwrap().len(), 5);
        assert_eq!(ctx.stats.attempts, 5);
        assert!(!ctx.step());
        assert_eq!(typed.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_exhausted_when_space_runs_out() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = context(
            AttemptConfig {
                password_length: 1,
                start_from: 7,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Exhausted);
        assert_eq!(*typed.lock().unwrap(), vec!["7", "8", "9"]);
    }

    #[test]
    fn test_stop_during_iteration_prevents_next_injection() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let signals = ControlSignals::new();

        let mut injector = FakeInjector::new(typed.clone());
        injector.stop_on = Some((3, signals.clone()));

        let mut ctx = context(
            base_config(&reference),
            injector,
            typed.clone(),
            None,
            signals,
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Stopped);
        assert_eq!(*typed.lock().unwrap(), vec!["0000", "0001", "0002"]);
        assert_eq!(ctx.stats.attempts, 3);
    }

    #[test]
    fn test_stop_before_start_types_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let signals = ControlSignals::new();
        signals.request_stop();

        let mut ctx = context(
            base_config(&reference),
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            signals,
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Stopped);
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_while_paused() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let signals = ControlSignals::new();
        signals.pause();

        let mut ctx = context(
            base_config(&reference),
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            signals.clone(),
        );

        let stopper = {
            let signals = signals.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(120));
                signals.request_stop();
            })
        };

        assert_eq!(ctx.run_to_end(), &AttemptState::Stopped);
        stopper.join().unwrap();
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_resume_continues_to_success() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let signals = ControlSignals::new();
        signals.pause();

        let mut ctx = context(
            AttemptConfig {
                password_length: 2,
                start_from: 10,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            Some("13"),
            signals.clone(),
        );

        // Reference loads while paused; nothing is typed until resume.
        assert!(ctx.step());
        assert_eq!(ctx.state, AttemptState::Running);

        let resumer = {
            let signals = signals.clone();
            let typed = typed.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(120));
                let typed_while_paused = typed.lock().unwrap().len();
                signals.resume();
                typed_while_paused
            })
        };

        assert_eq!(ctx.run_to_end(), &AttemptState::Success("13".to_string()));
        assert_eq!(resumer.join().unwrap(), 0);
        assert!(!signals.is_paused());
        assert_eq!(*typed.lock().unwrap(), vec!["10", "11", "12", "13"]);
        assert_eq!(ctx.stats.attempts, 4);
    }

    #[test]
    fn test_focus_lead_in_delays_first_keystroke() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = context(
            AttemptConfig {
                focus_delay: 0.2,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            Some("0000"),
            ControlSignals::new(),
        );

        let started = std::time::Instant::now();
        assert!(ctx.step());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(typed.lock().unwrap().is_empty());

        assert_eq!(ctx.run_to_end(), &AttemptState::Success("0000".to_string()));
    }

    #[test]
    fn test_stop_during_focus_lead_in() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let signals = ControlSignals::new();

        let mut ctx = context(
            AttemptConfig {
                focus_delay: 30.0,
                ..base_config(&reference)
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            signals.clone(),
        );

        let stopper = {
            let signals = signals.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                signals.request_stop();
            })
        };

        let started = std::time::Instant::now();
        assert_eq!(ctx.run_to_end(), &AttemptState::Stopped);
        stopper.join().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(typed.lock().unwrap().is_empty());
        assert_eq!(ctx.stats.attempts, 0);
    }

    #[test]
    fn test_injection_error_fails_session() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let mut injector = FakeInjector::new(typed.clone());
        injector.fail_on = Some(2);

        let mut ctx = context(
            base_config(&reference),
            injector,
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        match ctx.run_to_end() {
            AttemptState::Failed(msg) => assert!(msg.contains("simulated failure")),
            other => panic!("unexpected state: {other}"),
        }
        assert_eq!(ctx.stats.attempts, 2);
        assert_eq!(ctx.stats.current_candidate.as_deref(), Some("0001"));
    }

    #[test]
    fn test_failsafe_stops_session() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let mut injector = FakeInjector::new(typed.clone());
        injector.failsafe_on = Some(1);

        let mut ctx = context(
            base_config(&reference),
            injector,
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Stopped);
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_capture_error_fails_session() {
        let dir = tempfile::tempdir().unwrap();
        let reference = write_reference(dir.path());
        let typed = Arc::new(Mutex::new(Vec::new()));
        let sampler = FakeSampler {
            typed: typed.clone(),
            unlock_code: None,
            fail: true,
        };

        let mut ctx = AttemptContext::new(
            base_config(&reference),
            Box::new(FakeInjector::new(typed.clone())),
            Box::new(sampler),
            ControlSignals::new(),
        )
        .unwrap();

        assert!(matches!(ctx.run_to_end(), AttemptState::Failed(_)));
        assert_eq!(typed.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_reference_fails_before_typing() {
        let dir = tempfile::tempdir().unwrap();
        let typed = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = context(
            base_config(&dir.path().join("missing.png")),
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        match ctx.run_to_end() {
            AttemptState::Failed(msg) => assert!(msg.contains("missing.png")),
            other => panic!("unexpected state: {other}"),
        }
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_never_runs() {
        let typed = Arc::new(Mutex::new(Vec::new()));
        for config in [
            AttemptConfig {
                password_length: 0,
                ..Default::default()
            },
            AttemptConfig {
                password_length: 11,
                ..Default::default()
            },
            AttemptConfig {
                password_length: 2,
                start_from: 100,
                ..Default::default()
            },
        ] {
            let sampler = FakeSampler {
                typed: typed.clone(),
                unlock_code: None,
                fail: false,
            };
            let result = AttemptContext::new(
                config,
                Box::new(FakeInjector::new(typed.clone())),
                Box::new(sampler),
                ControlSignals::new(),
            );
            assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
        }
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_demo_mode_succeeds_on_1234() {
        let typed = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            AttemptConfig {
                demo_mode: true,
                attempt_delay: 0.0,
                // Demo runs never wait for focus.
                focus_delay: MAX_DELAY_SECS,
                reference_image_path: "does-not-matter.png".into(),
                ..Default::default()
            },
            FakeInjector::new(typed.clone()),
            typed.clone(),
            None,
            ControlSignals::new(),
        );

        assert_eq!(ctx.run_to_end(), &AttemptState::Success("1234".to_string()));
        assert_eq!(ctx.stats.attempts, 1235);
        assert!(typed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_progress_string() {
        let typed = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = context(
            AttemptConfig {
                demo_mode: true,
                attempt_delay: 0.0,
                max_attempts: 2,
                ..Default::default()
            },
            FakeInjector::new(typed.clone()),
            typed,
            None,
            ControlSignals::new(),
        );
        assert_eq!(ctx.progress_string(), "Idle");
        ctx.step();
        ctx.step();
        assert!(ctx.progress_string().starts_with("1/2 - 0000"));
        ctx.run_to_end();
        assert_eq!(ctx.progress_string(), "Exhausted");
    }
}
