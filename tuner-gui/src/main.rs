//! # Tuner - Chromatic Tuner GUI
//!
//! This module contains the main GUI application for the tuner.
//! It provides start/stop control, reference pitch adjustment and a
//! real-time note display with a cent meter.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Thread**: Owns the capture stream and the `TunerSession`
//! - **Communication**: Crossbeam channels for readings, commands and shutdown
//! - **Updates**: 60 FPS polling via subscription while the tuner runs

mod ui;

use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use iced::{Element, Subscription, Theme};
use std::thread::{self, JoinHandle};
use tuner_core::config::REFERENCE_FREQUENCY_RANGE;
use tuner_core::{audio, TunerConfig, TunerReading, TunerSession};
use ui::main_display::create_main_view;

/// Settings file, read at startup and written by "Save settings".
const CONFIG_PATH: &str = "tuner_config.json";

/// Step for the reference pitch buttons, in Hz.
const REFERENCE_STEP: f32 = 1.0;

/// Main entry point for the tuner application.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!(target: "main", "Starting tuner...");
    let result = iced::application("Tuner", TunerApp::update, TunerApp::view)
        .subscription(TunerApp::subscription)
        .theme(TunerApp::theme)
        .run();
    log::info!(target: "main", "Application finished with result: {:?}", result);
    result
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    Start,
    Stop,
    ReferenceUp,
    ReferenceDown,
    SaveSettings,
    /// Timer tick for real-time updates
    Tick,
}

/// Commands the GUI sends to a running audio thread.
#[derive(Debug, Clone, Copy)]
enum WorkerCommand {
    SetReference(f32),
}

/// Everything the UI needs to render one frame.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub running: bool,
    pub reading: TunerReading,
    pub reference_frequency: f32,
    /// Last error or notice shown under the controls.
    pub status: Option<String>,
}

/// Main application state.
struct TunerApp {
    config: TunerConfig,
    audio_worker: Option<AudioWorker>,
    display_data: AppDisplayData,
}

/// Audio worker thread management structure.
struct AudioWorker {
    shutdown_tx: Sender<()>,
    command_tx: Sender<WorkerCommand>,
    reading_rx: Receiver<TunerReading>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Default for TunerApp {
    fn default() -> Self {
        let (config, status) = match TunerConfig::load_or_default(CONFIG_PATH) {
            Ok(config) => (config, None),
            Err(e) => {
                log::warn!(target: "main", "Ignoring {}: {:#}", CONFIG_PATH, e);
                (TunerConfig::default(), Some(format!("Settings not loaded: {}", e)))
            }
        };

        Self {
            config,
            audio_worker: None,
            display_data: AppDisplayData {
                running: false,
                reading: TunerReading::silent(),
                reference_frequency: config.reference_frequency,
                status,
            },
        }
    }
}

impl TunerApp {
    /// Spawns the audio thread: capture, detection and smoothing all run there.
    fn start_audio_processing(&mut self) {
        if self.audio_worker.is_some() {
            return;
        }

        let config = self.config;
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<WorkerCommand>();
        let (reading_tx, reading_rx) = crossbeam_channel::unbounded::<TunerReading>();

        let thread_handle = thread::spawn(move || {
            log::info!(target: "audio-thread", "Starting audio thread...");

            let mut session = match TunerSession::new(config) {
                Ok(session) => session,
                Err(e) => {
                    log::error!(target: "audio-thread", "Invalid configuration: {}", e);
                    return;
                }
            };

            // A few frames of slack; older frames are dropped by the capture callback.
            let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<Vec<f32>>(4);
            let (stream, sample_rate) =
                match audio::start_audio_capture(raw_audio_tx, config.buffer_size) {
                    Ok(tuple) => tuple,
                    Err(e) => {
                        log::error!(target: "audio-thread", "Fatal error starting audio: {:#}", e);
                        return;
                    }
                };

            session.start();

            loop {
                crossbeam_channel::select! {
                    recv(raw_audio_rx) -> msg => match msg {
                        Ok(frame) => {
                            let reading = session.process_frame(&frame, sample_rate);
                            if reading_tx.send(reading).is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            log::warn!(target: "audio-thread", "Audio channel closed");
                            break;
                        }
                    },
                    recv(command_rx) -> msg => match msg {
                        Ok(WorkerCommand::SetReference(frequency)) => {
                            if let Err(e) = session.set_reference_frequency(frequency) {
                                log::warn!(target: "audio-thread", "{}", e);
                            }
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => {
                        log::info!(target: "audio-thread", "Received shutdown signal");
                        break;
                    },
                }
            }

            session.stop();
            if let Err(e) = stream.pause() {
                log::warn!(target: "audio-thread", "Error pausing stream: {}", e);
            }
            drop(stream);
            log::info!(target: "audio-thread", "Audio thread finished");
        });

        self.audio_worker = Some(AudioWorker {
            shutdown_tx,
            command_tx,
            reading_rx,
            thread_handle: Some(thread_handle),
        });
        self.display_data.running = true;
        self.display_data.status = None;
    }

    /// Signals the audio thread to stop and waits for it.
    fn stop_audio_processing(&mut self) {
        if let Some(mut worker) = self.audio_worker.take() {
            let _ = worker.shutdown_tx.send(());
            if let Some(handle) = worker.thread_handle.take() {
                if handle.join().is_err() {
                    log::error!(target: "main", "Audio thread panicked");
                }
            }
        }
        self.display_data.running = false;
        self.display_data.reading = TunerReading::silent();
    }

    fn update(&mut self, message: Message) {
        match message {
            Message::Start => self.start_audio_processing(),
            Message::Stop => self.stop_audio_processing(),
            Message::ReferenceUp => self.change_reference(REFERENCE_STEP),
            Message::ReferenceDown => self.change_reference(-REFERENCE_STEP),
            Message::SaveSettings => {
                self.display_data.status = Some(match self.config.save(CONFIG_PATH) {
                    Ok(()) => format!("Settings saved to {}", CONFIG_PATH),
                    Err(e) => {
                        log::error!(target: "main", "Error saving settings: {:#}", e);
                        format!("Could not save settings: {}", e)
                    }
                });
            }
            Message::Tick => self.poll_readings(),
        }
    }

    /// Keeps the newest reading; notices when the audio thread has gone away.
    fn poll_readings(&mut self) {
        let Some(worker) = &self.audio_worker else {
            return;
        };

        let mut disconnected = false;
        loop {
            match worker.reading_rx.try_recv() {
                Ok(reading) => self.display_data.reading = reading,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected {
            self.stop_audio_processing();
            self.display_data.status = Some("Audio input unavailable".to_string());
        }
    }

    fn change_reference(&mut self, delta: f32) {
        let (min, max) = REFERENCE_FREQUENCY_RANGE;
        let frequency = (self.config.reference_frequency + delta).clamp(min, max);
        self.config.reference_frequency = frequency;
        self.display_data.reference_frequency = frequency;
        if let Some(worker) = &self.audio_worker {
            let _ = worker.command_tx.send(WorkerCommand::SetReference(frequency));
        }
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Ticks at ~60 FPS while the tuner runs.
    fn subscription(&self) -> Subscription<Message> {
        if self.display_data.running {
            iced::time::every(std::time::Duration::from_millis(16)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
