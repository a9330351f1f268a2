use crate::clock_media::ClockMedia;
use crate::console::{self, Command, HELP};
use anyhow::{Result, bail};
use auditest_audio::MediaEventKind;
use auditest_core::ExperimentConfig;
use auditest_task::{
    EvaluationTask, Mushra, Pairwise, SessionContext, Submitter, TaskEvent, TaskVariant,
    TrialOutcome,
};
use auditest_timing::MonotonicTimer;
use rand::rngs::ThreadRng;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// How often timers and media notifications are serviced while idle.
const TICK: Duration = Duration::from_millis(50);

pub type Media = ClockMedia<MonotonicTimer>;
pub type HostTask<V> = EvaluationTask<V, Media, MonotonicTimer, ThreadRng>;

/// Commands only one rating scheme understands.
pub trait VariantCommands {
    fn rate(&mut self, idx: usize, value: i64) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
}

impl VariantCommands for HostTask<Mushra> {
    fn rate(&mut self, idx: usize, value: i64) -> Result<()> {
        self.set_slider(idx, value)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        bail!("`stop` is only available in pairwise tests")
    }
}

impl VariantCommands for HostTask<Pairwise> {
    fn rate(&mut self, _idx: usize, _value: i64) -> Result<()> {
        bail!("pairwise tests are rated by choosing a stimulus with `stim`")
    }

    fn stop(&mut self) -> Result<()> {
        self.stop_all_audio();
        Ok(())
    }
}

pub struct App<V>
where
    V: TaskVariant<Media, MonotonicTimer, ThreadRng>,
{
    task: HostTask<V>,
    quit_requested: bool,
    should_exit: bool,
}

impl<V> App<V>
where
    V: TaskVariant<Media, MonotonicTimer, ThreadRng>,
    HostTask<V>: VariantCommands,
{
    pub fn new(
        config: ExperimentConfig,
        context: SessionContext,
        media: Media,
        timer: MonotonicTimer,
        submitter: impl Submitter + 'static,
        variant: V,
    ) -> Result<Self> {
        let task = EvaluationTask::new(
            config,
            context,
            media,
            timer,
            rand::rng(),
            Box::new(submitter),
            variant,
        )?;

        Ok(Self {
            task,
            quit_requested: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        println!("=== AUDITEST LISTENING TEST ===");
        println!("Type `help` for commands.\n");

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        self.update();
        self.render();

        while !self.should_exit {
            let mut dirty = false;
            match rx.recv_timeout(TICK) {
                Ok(line) => {
                    self.handle_input(&line);
                    dirty = true;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Input closed");
                    self.should_exit = true;
                }
            }

            dirty |= self.update();
            if let Some(prompt) = self.task.take_prompt() {
                println!("! {prompt}");
            }
            if dirty {
                self.render();
            }
            if self.task.ui().redirect.is_some() {
                self.cleanup_and_exit();
            }
        }

        Ok(())
    }

    /// Services timers and media. Returns whether anything visible changed;
    /// progress ticks alone do not count.
    fn update(&mut self) -> bool {
        self.task.update().iter().any(|event| {
            !matches!(
                event,
                TaskEvent::Media(media) if media.kind == MediaEventKind::TimeUpdate
            )
        })
    }

    fn render(&self) {
        print!("{}", console::render(self.task.ui(), self.task.state()));
    }

    fn handle_input(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                return;
            }
        };

        if command != Command::Quit {
            self.quit_requested = false;
        }
        if let Err(e) = self.dispatch(command) {
            warn!("Command failed: {e:#}");
            println!("{e}");
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Train => self.task.start_training()?,
            Command::Continue => self.task.start_evaluation()?,
            Command::Play(id) => {
                if !self.task.play_audio(&id)? {
                    println!("{id} is locked for now");
                }
            }
            Command::Reference(key) => {
                if !self.task.play_reference(&key)? {
                    println!("Wait for the current sound to finish");
                }
            }
            Command::Stimulus(idx) => {
                if !self.task.play_stimulus(idx)? {
                    println!("Wait for the current sound to finish");
                }
            }
            Command::Rate(idx, value) => self.task.rate(idx, value)?,
            Command::Stop => self.task.stop()?,
            Command::Next => match self.task.next_trial()? {
                TrialOutcome::Blocked => println!("Not yet: keep listening"),
                outcome => info!("Trial outcome: {:?}", outcome),
            },
            Command::Retry => {
                self.task.retry_submission()?;
            }
            Command::Status => {
                if let Some((current, total)) = self.task.trial_progress() {
                    println!("condition {current} of {total}");
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => self.request_quit(),
        }
        Ok(())
    }

    /// Leaving an unfinished test takes a second `quit`.
    fn request_quit(&mut self) {
        match self.task.leave_warning() {
            Some(warning) if !self.quit_requested => {
                println!("{warning} Type `quit` again to leave.");
                self.quit_requested = true;
            }
            _ => self.should_exit = true,
        }
    }

    fn cleanup_and_exit(&mut self) {
        if let Some(url) = &self.task.ui().redirect {
            info!("Session finished, redirect to {}", url);
        }
        println!("\nEvaluation completed. Thank you!");
        self.should_exit = true;
    }
}

impl<V> Drop for App<V>
where
    V: TaskVariant<Media, MonotonicTimer, ThreadRng>,
{
    fn drop(&mut self) {
        info!(
            "Closing session with {} of {} conditions rated",
            self.task.completed().len(),
            self.task.config().condition_count()
        );
    }
}
