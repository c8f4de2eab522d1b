//! Microphone listener
//!
//! Calibrates against ambient noise, waits for the energy gate to open,
//! records until a pause or the phrase limit, then hands the PCM to the
//! remote recognizer.

use super::{CaptureDevice, ListenParams, WyomingClient};
use crate::audio::{self, calculate_energy, duration_secs};
use crate::error::CaptureError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Per-second damping of the dynamic threshold
const DYNAMIC_DAMPING: f32 = 0.15;
/// Threshold target as a multiple of the ambient energy
const DYNAMIC_RATIO: f32 = 1.5;
/// Silence that ends a phrase
const PAUSE_SECS: f32 = 0.8;
/// Phrases with less speech than this are treated as clicks and dropped
const MIN_PHRASE_SECS: f32 = 0.3;
/// Audio kept from before the gate opened
const PRE_ROLL_SECS: f32 = 0.5;
/// Longest the device may stay silent before it is considered stalled
const DEVICE_STALL: Duration = Duration::from_secs(2);

/// Energy threshold that separates speech from background noise
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyGate {
    threshold: f32,
    dynamic: bool,
}

impl EnergyGate {
    pub fn new(threshold: f32, dynamic: bool) -> Self {
        Self { threshold, dynamic }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Replace the threshold with a fixed value
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn is_speech(&self, energy: f32) -> bool {
        energy > self.threshold
    }

    /// Move the threshold toward the ambient level, regardless of `dynamic`
    pub fn calibrate(&mut self, energy: f32, chunk_secs: f32) {
        let damping = DYNAMIC_DAMPING.powf(chunk_secs);
        let target = energy * DYNAMIC_RATIO;
        self.threshold = self.threshold * damping + target * (1.0 - damping);
    }

    /// Track ambient noise while waiting for speech
    pub fn adapt(&mut self, energy: f32, chunk_secs: f32) {
        if self.dynamic {
            self.calibrate(energy, chunk_secs);
        }
    }
}

/// Outcome of feeding one chunk to a [`PhraseDetector`]
#[derive(Debug, PartialEq)]
pub enum Detection {
    Pending,
    Timeout,
    Phrase(Vec<i16>),
}

enum DetectorState {
    Waiting,
    Recording {
        samples: Vec<i16>,
        phrase_secs: f32,
        speech_secs: f32,
        pause_secs: f32,
    },
}

/// Splits a chunk stream into one phrase
pub struct PhraseDetector {
    gate: EnergyGate,
    timeout_secs: f32,
    phrase_limit_secs: f32,
    waited_secs: f32,
    pre_roll: VecDeque<Vec<i16>>,
    state: DetectorState,
}

impl PhraseDetector {
    pub fn new(gate: EnergyGate, params: &ListenParams) -> Self {
        Self {
            gate,
            timeout_secs: params.timeout.as_secs_f32(),
            phrase_limit_secs: params.phrase_limit.as_secs_f32(),
            waited_secs: 0.0,
            pre_roll: VecDeque::new(),
            state: DetectorState::Waiting,
        }
    }

    pub fn gate(&self) -> &EnergyGate {
        &self.gate
    }

    pub fn feed(&mut self, chunk: &[i16]) -> Detection {
        let secs = duration_secs(chunk.len());
        let energy = calculate_energy(chunk);
        let speech = self.gate.is_speech(energy);

        match &mut self.state {
            DetectorState::Waiting => {
                self.waited_secs += secs;
                if speech {
                    debug!("Speech started (energy {:.0} > {:.0})", energy, self.gate.threshold());
                    let mut samples: Vec<i16> = self.pre_roll.drain(..).flatten().collect();
                    samples.extend_from_slice(chunk);
                    self.state = DetectorState::Recording {
                        samples,
                        phrase_secs: secs,
                        speech_secs: secs,
                        pause_secs: 0.0,
                    };
                    return Detection::Pending;
                }

                self.gate.adapt(energy, secs);
                self.pre_roll.push_back(chunk.to_vec());
                while self.pre_roll.len() > 1
                    && duration_secs(self.pre_roll.iter().map(Vec::len).sum()) > PRE_ROLL_SECS
                {
                    self.pre_roll.pop_front();
                }

                if self.waited_secs > self.timeout_secs {
                    Detection::Timeout
                } else {
                    Detection::Pending
                }
            }
            DetectorState::Recording {
                samples,
                phrase_secs,
                speech_secs,
                pause_secs,
            } => {
                // Bursts that turn out to be noise still use up the wait
                self.waited_secs += secs;
                samples.extend_from_slice(chunk);
                *phrase_secs += secs;
                if speech {
                    *speech_secs += secs;
                    *pause_secs = 0.0;
                } else {
                    *pause_secs += secs;
                }

                if *phrase_secs < self.phrase_limit_secs && *pause_secs < PAUSE_SECS {
                    return Detection::Pending;
                }

                let too_short = *speech_secs < MIN_PHRASE_SECS;
                let samples = std::mem::take(samples);
                self.state = DetectorState::Waiting;
                if too_short {
                    debug!("Discarding short noise burst");
                    if self.waited_secs > self.timeout_secs {
                        Detection::Timeout
                    } else {
                        Detection::Pending
                    }
                } else {
                    Detection::Phrase(samples)
                }
            }
        }
    }
}

/// Raised when the listen future is dropped, so the blocking recorder
/// gives up instead of holding the runtime open
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Microphone + Wyoming capture device
pub struct MicListener {
    device_index: Option<usize>,
    client: WyomingClient,
}

impl MicListener {
    pub fn new(device_index: Option<usize>, client: WyomingClient) -> Self {
        Self {
            device_index,
            client,
        }
    }
}

#[async_trait]
impl CaptureDevice for MicListener {
    async fn listen(&mut self, params: &ListenParams) -> Result<String, CaptureError> {
        let device_index = self.device_index;
        let record_params = params.clone();
        let cancelled = Arc::new(AtomicBool::new(false));
        let _cancel = CancelOnDrop(cancelled.clone());

        let samples = tokio::task::spawn_blocking(move || {
            record_phrase(device_index, &record_params, &cancelled)
        })
        .await
        .map_err(|e| CaptureError::Device(format!("capture task failed: {}", e)))??;

        info!("⚙️ Processing {:.1}s of audio...", duration_secs(samples.len()));
        self.client
            .transcribe(&audio::to_pcm_bytes(&samples), &params.language)
            .await
    }
}

/// Blocking: open the microphone and record a single phrase from it
fn record_phrase(
    device_index: Option<usize>,
    params: &ListenParams,
    cancelled: &AtomicBool,
) -> Result<Vec<i16>, CaptureError> {
    let mic = audio::open_microphone(device_index).map_err(|e| CaptureError::Device(e.to_string()))?;
    let next_chunk = || {
        mic.receiver.recv_timeout(DEVICE_STALL).map_err(|e| match e {
            RecvTimeoutError::Timeout => CaptureError::Device("no audio from input device".into()),
            RecvTimeoutError::Disconnected => CaptureError::Device("audio stream closed".into()),
        })
    };
    record_from(next_chunk, params, cancelled)
}

/// Blocking: calibrate, then detect one phrase from a chunk source.
/// Checks `cancelled` before every chunk.
fn record_from<F>(
    mut next_chunk: F,
    params: &ListenParams,
    cancelled: &AtomicBool,
) -> Result<Vec<i16>, CaptureError>
where
    F: FnMut() -> Result<Vec<i16>, CaptureError>,
{
    let mut next = || {
        if cancelled.load(Ordering::SeqCst) {
            debug!("Listen cancelled");
            return Err(CaptureError::Device("listen cancelled".into()));
        }
        next_chunk()
    };

    println!("\nAdjusting for ambient noise... Please wait...");
    let mut gate = EnergyGate::new(params.energy_threshold, params.dynamic_threshold);
    let calibration_secs = params.calibration.as_secs_f32();
    let mut calibrated = 0.0;
    while calibrated < calibration_secs {
        let chunk = next()?;
        let secs = duration_secs(chunk.len());
        gate.calibrate(calculate_energy(&chunk), secs);
        calibrated += secs;
    }
    debug!("Ambient threshold {:.0}, using fixed {:.0}", gate.threshold(), params.energy_threshold);
    gate.set_threshold(params.energy_threshold);

    println!("Listening...");
    let mut detector = PhraseDetector::new(gate, params);
    loop {
        match detector.feed(&next()?) {
            Detection::Pending => continue,
            Detection::Timeout => return Err(CaptureError::Timeout),
            Detection::Phrase(samples) => return Ok(samples),
        }
    }
}
