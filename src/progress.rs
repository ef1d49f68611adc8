use anyhow::Result;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const TICKS_UNICODE: [&str; 8] = ["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"];
const TICKS_ASCII: &str = "|/-\\";
const TEMPLATE: &str = "{spinner:.cyan.bold} {prefix} {msg} {elapsed:.dim}";
const TICK_INTERVAL: Duration = Duration::from_millis(100);
const REDRAW_HZ: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Save,
}

impl Stage {
    const ALL: [Self; 2] = [Self::Load, Self::Save];

    fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|stage| *stage == self)
            .map_or(0, |idx| idx + 1)
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Load => "Loading statistics",
            Self::Save => "Saving outputs",
        }
    }

    fn prefix(self) -> String {
        format!("[{}/{}]", self.position(), Self::ALL.len())
            .bright_yellow()
            .bold()
            .to_string()
    }
}

/// Spinners drawn on stderr while a run loads and saves.
pub struct ProgressState {
    multi: MultiProgress,
    style: ProgressStyle,
}

impl ProgressState {
    pub fn new() -> Self {
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(REDRAW_HZ));
        let base = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let ascii_only = std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb"));
        let style = if ascii_only {
            base.tick_chars(TICKS_ASCII)
        } else {
            base.tick_strings(&TICKS_UNICODE)
        };
        Self { multi, style }
    }

    fn start(&self, stage: Stage, subject: &str) -> StageSpinner {
        let bar = self
            .multi
            .add(ProgressBar::new_spinner().with_style(self.style.clone()));
        bar.set_prefix(stage.prefix());
        let message = format!(
            "{}: {}",
            stage.verb().bright_cyan().bold(),
            subject.bright_white().bold()
        );
        bar.set_message(message.clone());
        bar.enable_steady_tick(TICK_INTERVAL);
        StageSpinner { bar, message }
    }

    pub fn clear(&self) {
        if let Err(err) = self.multi.clear() {
            tracing::debug!(%err, "failed to clear progress output");
        }
    }
}

impl Default for ProgressState {
    fn default() -> Self {
        Self::new()
    }
}

struct StageSpinner {
    bar: ProgressBar,
    message: String,
}

impl StageSpinner {
    fn finish(self, succeeded: bool) {
        let outcome = if succeeded {
            "done".bright_green().bold()
        } else {
            "failed".bright_red().bold()
        };
        self.bar
            .finish_with_message(format!("{} {outcome}", self.message));
    }
}

/// Awaits `fut`, behind a spinner when progress output is enabled.
pub async fn run_with_spinner<T>(
    progress: Option<&ProgressState>,
    stage: Stage,
    subject: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(progress) = progress else {
        return fut.await;
    };
    let spinner = progress.start(stage, subject);
    let result = fut.await;
    spinner.finish(result.is_ok());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_numbered_in_run_order() {
        assert_eq!(Stage::Load.position(), 1);
        assert_eq!(Stage::Save.position(), 2);
    }

    #[tokio::test]
    async fn disabled_progress_passes_results_through() {
        let value = run_with_spinner(None, Stage::Load, "stats.json", async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        let failed: Result<()> =
            run_with_spinner(None, Stage::Save, "out.csv", async { Err(anyhow::anyhow!("disk full")) })
                .await;
        assert!(failed.is_err());
    }
}
