use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

const FRAMES: &[&str] = &["|", "/", "-", "\\", " "];

/// All visible spinners draw through one stderr target so concurrent ones get
/// a line each instead of overwriting each other.
fn terminal() -> &'static MultiProgress {
    static TERMINAL: OnceLock<MultiProgress> = OnceLock::new();
    TERMINAL.get_or_init(|| MultiProgress::with_draw_target(ProgressDrawTarget::stderr()))
}

/// Single-line terminal status animation shown while a blocking call runs.
///
/// The spinner repaints from its own thread. It is stopped on [`Spinner::stop`]
/// or when dropped, so holding it as a local guard around a request clears the
/// line on every exit path.
pub struct Spinner {
    message: String,
    delay: Duration,
    dot_delay: Duration,
    show_dots: bool,
    hidden: bool,
    frames: Arc<AtomicUsize>,
    dots: Arc<AtomicUsize>,
    active: Option<Active>,
}

struct Active {
    bar: ProgressBar,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            delay: Duration::from_millis(100),
            dot_delay: Duration::from_secs(1),
            show_dots: true,
            hidden: false,
            frames: Arc::new(AtomicUsize::new(0)),
            dots: Arc::new(AtomicUsize::new(0)),
            active: None,
        }
    }

    /// Create and immediately start a spinner.
    pub fn started(message: impl Into<String>) -> Self {
        let mut spinner = Self::new(message);
        spinner.start();
        spinner
    }

    pub fn with_dots(mut self, enabled: bool) -> Self {
        self.show_dots = enabled;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_dot_delay(mut self, dot_delay: Duration) -> Self {
        self.dot_delay = dot_delay;
        self
    }

    /// Draw nowhere. The animation thread still runs.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of frames painted since the spinner was created.
    pub fn frame_index(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }

    /// Length of the trailing dot trail.
    pub fn dot_count(&self) -> usize {
        self.dots.load(Ordering::Relaxed)
    }

    pub fn start(&mut self) {
        if self.active.is_some() {
            return;
        }

        tracing::trace!("Spinner started: {}", self.message);

        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            terminal().add(ProgressBar::new_spinner())
        };
        bar.set_style(
            ProgressStyle::with_template(" {spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(FRAMES),
        );
        bar.set_message(self.message.clone());

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticker = bar.clone();
        let message = self.message.clone();
        let delay = self.delay;
        let dot_delay = self.dot_delay;
        let show_dots = self.show_dots;
        let frames = Arc::clone(&self.frames);
        let dots = Arc::clone(&self.dots);

        let handle = thread::spawn(move || {
            let mut trail = String::new();
            let mut last_dot = Instant::now();
            loop {
                if show_dots && last_dot.elapsed() >= dot_delay {
                    trail.push('.');
                    last_dot = Instant::now();
                    dots.fetch_add(1, Ordering::Relaxed);
                    ticker.set_message(format!("{}{}", message, trail));
                }
                ticker.tick();
                frames.fetch_add(1, Ordering::Relaxed);

                match stop_rx.recv_timeout(delay) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    // stop signal or the owning spinner went away
                    _ => break,
                }
            }
        });

        self.active = Some(Active {
            bar,
            stop_tx,
            handle,
        });
    }

    /// Stop the animation and clear its line. Returns once the repaint thread
    /// has exited.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        let _ = active.stop_tx.send(());
        if active.handle.join().is_err() {
            tracing::warn!("Spinner thread panicked: {}", self.message);
        }
        active.bar.finish_and_clear();
        if !self.hidden {
            terminal().remove(&active.bar);
        }
        tracing::trace!("Spinner stopped: {}", self.message);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(message: &str) -> Spinner {
        Spinner::new(message)
            .hidden()
            .with_delay(Duration::from_millis(10))
            .with_dot_delay(Duration::from_millis(30))
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut spinner = Spinner::new("idle").hidden();
        spinner.stop();
        spinner.stop();
        assert!(!spinner.is_running());
        assert_eq!(spinner.frame_index(), 0);
        assert_eq!(spinner.dot_count(), 0);
    }

    #[test]
    fn test_start_twice_keeps_single_ticker() {
        let mut spinner = quick("twice");
        spinner.start();
        spinner.start();
        assert!(spinner.is_running());
        spinner.stop();
        assert!(!spinner.is_running());
    }

    #[test]
    fn test_animates_and_grows_dot_trail() {
        let mut spinner = quick("working");
        spinner.start();
        thread::sleep(Duration::from_millis(150));
        spinner.stop();

        assert!(spinner.frame_index() >= 2);
        assert!(spinner.dot_count() >= 1);
        assert_eq!(spinner.message(), "working");
    }

    #[test]
    fn test_no_frames_after_stop() {
        let mut spinner = quick("settle");
        spinner.start();
        thread::sleep(Duration::from_millis(40));
        spinner.stop();

        let frames = spinner.frame_index();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(spinner.frame_index(), frames);
    }

    #[test]
    fn test_dots_can_be_disabled() {
        let mut spinner = quick("quiet").with_dots(false);
        spinner.start();
        thread::sleep(Duration::from_millis(100));
        spinner.stop();
        assert_eq!(spinner.dot_count(), 0);
    }

    #[test]
    fn test_drop_stops_running_spinner() {
        let frames;
        {
            let mut spinner = quick("scoped");
            spinner.start();
            frames = Arc::clone(&spinner.frames);
            thread::sleep(Duration::from_millis(30));
        }
        let after_drop = frames.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(frames.load(Ordering::Relaxed), after_drop);
    }

    #[test]
    fn test_concurrent_visible_spinners() {
        let mut first = Spinner::new("first")
            .with_delay(Duration::from_millis(10))
            .with_dots(false);
        let mut second = Spinner::new("second")
            .with_delay(Duration::from_millis(10))
            .with_dots(false);

        first.start();
        second.start();
        thread::sleep(Duration::from_millis(60));
        second.stop();
        assert!(first.is_running());
        first.stop();

        assert!(first.frame_index() >= 2);
        assert!(second.frame_index() >= 2);
        assert!(!first.is_running() && !second.is_running());
    }

    #[test]
    fn test_restart_after_stop() {
        let mut spinner = quick("again");
        spinner.start();
        spinner.stop();
        spinner.start();
        assert!(spinner.is_running());
    }
}
