//! Text front end: command parsing and view rendering.

use anyhow::{Context, Result, anyhow, bail};
use auditest_core::{AudioId, ControlId, Key, PlayControl, TaskState, UiState, View};
use std::fmt::Write;
use std::str::FromStr;

pub const HELP: &str = "\
commands:
  train               start the training section
  play <id>           play a training sound
  continue            start the evaluation
  ref <key>           play a reference
  stim <idx>          play a stimulus
  rate <idx> <value>  move a rating slider (MUSHRA)
  stop                stop all audio (pairwise)
  next                save ratings and go to the next trial
  retry               resend results after a failed submission
  status              show the current view
  quit                leave the test";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Train,
    Play(AudioId),
    Continue,
    Reference(Key),
    Stimulus(usize),
    Rate(usize, i64),
    Stop,
    Next,
    Retry,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            bail!("empty command");
        };
        let mut arg = |what: &str| {
            words
                .next()
                .ok_or_else(|| anyhow!("`{name}` needs {what}"))
        };

        let command = match name {
            "train" => Command::Train,
            "play" => Command::Play(AudioId::new(arg("an audio id")?)),
            "continue" => Command::Continue,
            "ref" => Command::Reference(Key::new(arg("a reference key")?)),
            "stim" => Command::Stimulus(
                arg("a stimulus index")?
                    .parse()
                    .context("stimulus index must be a number")?,
            ),
            "rate" => {
                let idx = arg("a slider index")?
                    .parse()
                    .context("slider index must be a number")?;
                let value = arg("a value")?.parse().context("rating must be a number")?;
                Command::Rate(idx, value)
            }
            "stop" => Command::Stop,
            "next" => Command::Next,
            "retry" => Command::Retry,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`, try `help`"),
        };
        Ok(command)
    }
}

/// One control, named by the command that clicks it.
fn control_line(out: &mut String, control: &PlayControl) {
    let name = match &control.id {
        ControlId::Audio(id) => format!("play {id}"),
        ControlId::Reference(key) => format!("ref {key}"),
        ControlId::Stimulus(idx) => format!("stim {idx}"),
    };

    let mut marks = Vec::new();
    if !control.enabled {
        marks.push("locked");
    }
    if control.active {
        marks.push("playing");
    }
    if control.played {
        marks.push("heard");
    }
    if let Some(label) = &control.label {
        marks.push(label.as_str());
    }

    let _ = writeln!(out, "  {:<14} {}", name, marks.join(" "));
}

/// Renders whatever view is showing.
pub fn render(ui: &UiState, state: TaskState) -> String {
    let mut out = String::new();

    match ui.view {
        View::Loading => out.push_str("Loading audio...\n"),
        View::Error => {
            let text = ui.error_text.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Error: {text}");
        }
        View::Introduction => {
            out.push_str("== Introduction ==\nType `train` to begin.\n");
        }
        View::Training => {
            out.push_str("== Training ==\n");
            for control in &ui.training_controls {
                control_line(&mut out, control);
            }
            let gate = if ui.training_continue_enabled {
                "ready"
            } else {
                "listen to every sound first"
            };
            let _ = writeln!(out, "continue: {gate}");
        }
        View::Evaluation => {
            match ui.trial_label {
                Some((current, total)) => {
                    let _ = writeln!(out, "== Trial {current} of {total} ==");
                }
                None => out.push_str("== Evaluation ==\n"),
            }
            if let Some(instructions) = &ui.instructions {
                let _ = writeln!(out, "{instructions}");
            }
            for control in &ui.evaluation_controls {
                control_line(&mut out, control);
            }
            for (idx, slider) in ui.sliders.iter().enumerate() {
                let _ = writeln!(out, "  rating {idx}: {}", slider.readout);
            }
            let _ = writeln!(out, "position: {:.0}%", ui.playback_position);
            let gate = if ui.evaluation_next_enabled { "ready" } else { "locked" };
            let _ = writeln!(out, "next: {gate}");
        }
        View::Submit => out.push_str("Submitting results...\n"),
        View::SubmissionError => {
            let text = ui.error_text.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "Submission failed: {text}\nType `retry` to try again.");
        }
        View::Complete => {
            out.push_str("Thank you, the evaluation is complete.\n");
            if let Some(url) = &ui.redirect {
                let _ = writeln!(out, "Continue at {url}");
            }
        }
    }

    if ui.view.is_overlay() {
        let _ = writeln!(out, "({state:?})");
    }
    out
}
