use crystalnet::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct BarState {
    pb: ProgressBar,
    phase: Option<&'static str>,
    completed_phases: usize,
}

/// Renders analysis progress events as a spinner or bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    state: Arc<Mutex<BarState>>,
}

impl CliProgressHandler {
    /// A handler drawing to stderr, or drawing nothing when `visible` is false.
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(Self::spinner_style());
        pb.finish_and_clear();

        Self {
            state: Arc::new(Mutex::new(BarState {
                pb,
                phase: None,
                completed_phases: 0,
            })),
        }
    }

    pub fn completed_phases(&self) -> usize {
        self.state.lock().map(|s| s.completed_phases).unwrap_or(0)
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let state = self.state.clone();

        Box::new(move |progress: Progress| {
            let Ok(mut state) = state.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };
            Self::apply(&mut state, progress);
        })
    }

    fn apply(state: &mut BarState, progress: Progress) {
        let pb = &state.pb;
        match progress {
            Progress::PhaseStart { name } => {
                pb.reset();
                pb.set_length(0);
                pb.set_style(Self::spinner_style());
                pb.set_prefix(format!("[{}]", state.completed_phases + 1));
                pb.set_message(name);
                pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                state.phase = Some(name);
            }
            Progress::PhaseFinish => {
                pb.disable_steady_tick();
                let name = state.phase.take().unwrap_or("Phase");
                pb.finish_with_message(format!("{name} ✓"));
                state.completed_phases += 1;
            }
            Progress::TaskStart { total_steps } => {
                pb.disable_steady_tick();
                pb.reset();
                pb.set_length(total_steps);
                pb.set_position(0);
                pb.set_style(Self::bar_style());
            }
            Progress::TaskIncrement => pb.inc(1),
            Progress::TaskFinish => {
                let length = pb.length().unwrap_or(0);
                if pb.position() < length {
                    pb.set_position(length);
                }
            }
            Progress::Message(msg) => {
                if pb.is_finished() {
                    pb.set_message(msg);
                } else {
                    pb.println(format!("  {msg}"));
                }
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.bold.dim} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{prefix:.bold.dim} {msg:<24} [{bar:40.cyan/blue}] {pos}/{len} molecules ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("##-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn message(handler: &CliProgressHandler) -> String {
        handler.state.lock().unwrap().pb.message()
    }

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = CliProgressHandler::new(false);
        let state = handler.state.lock().unwrap();
        assert_eq!(state.pb.length(), Some(0));
        assert!(state.pb.is_finished());
        assert!(state.phase.is_none());
    }

    #[test]
    fn phase_with_task_drives_bar_through_its_states() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Searching Neighbors",
        });
        assert_eq!(message(&handler), "Searching Neighbors");
        assert_eq!(handler.state.lock().unwrap().pb.prefix(), "[1]");

        callback(Progress::TaskStart { total_steps: 4 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        {
            let state = handler.state.lock().unwrap();
            assert_eq!(state.pb.length(), Some(4));
            assert_eq!(state.pb.position(), 2);
        }

        callback(Progress::TaskFinish);
        assert_eq!(handler.state.lock().unwrap().pb.position(), 4);

        callback(Progress::PhaseFinish);
        assert_eq!(message(&handler), "Searching Neighbors ✓");
        assert!(handler.state.lock().unwrap().pb.is_finished());
        assert_eq!(handler.completed_phases(), 1);
    }

    #[test]
    fn consecutive_phases_are_numbered() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();
        for name in ["Loading Input", "Perceiving Connectivity"] {
            callback(Progress::PhaseStart { name });
            callback(Progress::PhaseFinish);
        }
        callback(Progress::PhaseStart {
            name: "Extracting Molecules",
        });
        assert_eq!(handler.state.lock().unwrap().pb.prefix(), "[3]");
        assert_eq!(handler.completed_phases(), 2);
    }

    #[test]
    fn message_after_finish_replaces_bar_message() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();
        callback(Progress::Message("12 covalent bonds".to_string()));
        assert_eq!(message(&handler), "12 covalent bonds");
    }

    #[test]
    fn callback_is_usable_from_other_threads() {
        let handler = CliProgressHandler::new(false);
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart {
                name: "Mapping Dimers",
            });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert_eq!(message(&handler), "Mapping Dimers ✓");
        assert_eq!(handler.completed_phases(), 1);
    }
}
