//! # Solfege - Singing Trainer GUI
//!
//! Desktop front end for the solfege singing trainer. It shows where the
//! singer's pitch sits on an 8-rung major-scale ladder together with the
//! nearest note name.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme, owns the session
//! - **Capture Thread**: Owned by the microphone source inside the session
//! - **Updates**: A timer subscription polls the session while listening

mod ui;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use iced::{Element, Subscription, Theme};
use solfege_core::audio::MicrophoneSource;
use solfege_core::scale::ScaleDefinition;
use solfege_core::config::clamp_base_octave;
use solfege_core::{PitchSession, PollReading, SessionConfig};
use tracing::{debug, error, info, warn};
use ui::main_display::create_main_view;

/// Optional configuration file, looked up in the working directory.
const CONFIG_PATH: &str = "solfege.json";

pub fn main() -> iced::Result {
    tracing_subscriber::fmt::init();
    info!("starting Solfege");
    let result = iced::application("Solfege", SolfegeApp::update, SolfegeApp::view)
        .subscription(SolfegeApp::subscription)
        .theme(SolfegeApp::theme)
        .run();
    info!("application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    ToggleListening,
    RootSelected(u8),
    OctaveDown,
    OctaveUp,

    // Timer tick, only subscribed while listening
    Tick,
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub listening: bool,
    pub root_key: u8,
    pub base_octave: i32,
    pub last_reading: Option<PollReading>,
    /// Tone frequencies of the low and high registers, rung 0 first.
    pub low_tones: [f32; 8],
    pub high_tones: [f32; 8],
    /// Last capture error, shown until the next successful start.
    pub error: Option<String>,
}

struct SolfegeApp {
    session: PitchSession<MicrophoneSource>,
    poll_interval: Duration,
    display_data: AppDisplayData,
}

impl Default for SolfegeApp {
    fn default() -> Self {
        let config = match load_config(CONFIG_PATH) {
            Ok(Some(config)) => {
                info!("loaded configuration from {}", CONFIG_PATH);
                config
            }
            Ok(None) => {
                debug!("no {} found, using defaults", CONFIG_PATH);
                SessionConfig::default()
            }
            Err(e) => {
                warn!("ignoring {}: {:#}", CONFIG_PATH, e);
                SessionConfig::default()
            }
        };

        let source = MicrophoneSource::new(config.target_sample_rate, config.frame_size);
        let session = PitchSession::new(source, &config);
        let (low, high) = session.scales();
        let display_data = AppDisplayData {
            listening: false,
            root_key: session.root_key(),
            base_octave: session.base_octave(),
            last_reading: None,
            low_tones: tone_frequencies(low),
            high_tones: tone_frequencies(high),
            error: None,
        };

        Self {
            session,
            poll_interval: config.poll_interval(),
            display_data,
        }
    }
}

impl SolfegeApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::ToggleListening => {
                if self.session.is_listening() {
                    self.session.stop();
                    self.display_data.listening = false;
                    self.display_data.last_reading = None;
                } else {
                    match self.session.start() {
                        Ok(()) => {
                            self.display_data.listening = true;
                            self.display_data.error = None;
                        }
                        Err(e) => {
                            error!("could not start listening: {}", e);
                            self.display_data.error = Some(e.to_string());
                        }
                    }
                }
            }
            Message::RootSelected(root_key) => {
                self.change_scale(root_key, self.display_data.base_octave);
            }
            Message::OctaveDown => {
                let octave = step_octave(self.display_data.base_octave, -1);
                self.change_scale(self.display_data.root_key, octave);
            }
            Message::OctaveUp => {
                let octave = step_octave(self.display_data.base_octave, 1);
                self.change_scale(self.display_data.root_key, octave);
            }
            Message::Tick => {
                if let Some(reading) = self.session.poll(Instant::now()) {
                    self.display_data.last_reading = Some(reading);
                }
            }
        }
    }

    fn change_scale(&mut self, root_key: u8, base_octave: i32) {
        self.session.set_scale(root_key, base_octave);
        let (low, high) = self.session.scales();
        self.display_data.low_tones = tone_frequencies(low);
        self.display_data.high_tones = tone_frequencies(high);
        self.display_data.root_key = self.session.root_key();
        self.display_data.base_octave = self.session.base_octave();
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Polls at the configured cadence while listening. Stopping drops the
    /// subscription, so no further ticks arrive.
    fn subscription(&self) -> Subscription<Message> {
        if self.display_data.listening {
            iced::time::every(self.poll_interval).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Moves the base octave by `delta`, staying within the range the session
/// configuration accepts.
fn step_octave(base_octave: i32, delta: i32) -> i32 {
    clamp_base_octave(base_octave + delta)
}

fn tone_frequencies(definition: &ScaleDefinition) -> [f32; 8] {
    definition.tones().map(|t| t.frequency)
}

/// Loads the session configuration from a JSON file.
///
/// # Returns
/// * `Ok(Some(config))` - File found and parsed, values validated
/// * `Ok(None)` - No file at `path`
/// * `Err(e)` - File unreadable or not a valid configuration
fn load_config(path: &str) -> anyhow::Result<Option<SessionConfig>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let config: SessionConfig =
        serde_json::from_str(&data).context("parsing session configuration")?;
    Ok(Some(config.validated()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solfege_core::config::{MAX_BASE_OCTAVE, MIN_BASE_OCTAVE};

    #[test]
    fn octave_steps_stop_at_the_configured_bounds() {
        assert_eq!(step_octave(MAX_BASE_OCTAVE, 1), MAX_BASE_OCTAVE);
        assert_eq!(step_octave(MIN_BASE_OCTAVE, -1), MIN_BASE_OCTAVE);
        assert_eq!(step_octave(3, 1), 4);
        assert_eq!(step_octave(3, -1), 2);
    }

    #[test]
    fn loaded_top_octave_does_not_drop_on_step_up() {
        let config = SessionConfig {
            base_octave: 7,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(step_octave(config.base_octave, 1), config.base_octave);
    }
}
