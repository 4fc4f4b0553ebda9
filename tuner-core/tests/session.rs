use tuner_core::config::{CONFIDENCE_THRESHOLD, THRESHOLD};
use tuner_core::{TunerConfig, TunerReading, TunerSession};

const SAMPLE_RATE: u32 = 44_100;
const FRAME: usize = 4096;

/// Consecutive frames of a continuous sine, like a microphone would deliver.
fn sine_frames(frequency: f32, count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|n| {
            (0..FRAME)
                .map(|i| {
                    let t = (n * FRAME + i) as f64 / SAMPLE_RATE as f64;
                    (0.6 * (2.0 * std::f64::consts::PI * frequency as f64 * t).sin()) as f32
                })
                .collect()
        })
        .collect()
}

fn started_session() -> TunerSession {
    let mut session = TunerSession::new(TunerConfig::default()).unwrap();
    session.start();
    session
}

#[test]
fn sustained_note_reads_as_a4() {
    let mut session = started_session();
    let mut last = TunerReading::silent();
    for frame in sine_frames(440.0, 5) {
        last = session.process_frame(&frame, SAMPLE_RATE);
        assert!(last.has_note());
        assert!(last.confidence.unwrap() < THRESHOLD);
    }
    assert_eq!(last.note_name, Some("A"));
    assert_eq!(last.octave, Some(4));
    let cents = last.cents_deviation.unwrap();
    assert!(cents.abs() < 17.0, "cents {}", cents);
}

#[test]
fn detuned_note_shows_cents_offset() {
    let mut session = started_session();
    // 25 cents sharp of E2.
    let target = 82.4069 * 2f32.powf(25.0 / 1200.0);
    let mut reading = TunerReading::silent();
    for frame in sine_frames(target, 4) {
        reading = session.process_frame(&frame, SAMPLE_RATE);
    }
    assert_eq!(reading.note_name, Some("E"));
    assert_eq!(reading.octave, Some(2));
    let cents = reading.cents_deviation.unwrap();
    assert!(cents > 0.0 && cents < 50.0, "cents {}", cents);
}

#[test]
fn sustained_low_e1_passes_confidence_gate() {
    // E1 needs a lag close to the upper end of the search range.
    let mut session = started_session();
    let mut reading = TunerReading::silent();
    for frame in sine_frames(41.2034, 3) {
        reading = session.process_frame(&frame, SAMPLE_RATE);
        assert!(reading.confidence.unwrap() < CONFIDENCE_THRESHOLD);
        assert!(reading.has_note());
    }
    assert_eq!(reading.note_name, Some("E"));
    assert_eq!(reading.octave, Some(1));
    assert!(reading.cents_deviation.unwrap().abs() < 5.0);
}

#[test]
fn silence_between_notes_resets_display() {
    let mut session = started_session();
    for frame in sine_frames(261.63, 3) {
        assert!(session.process_frame(&frame, SAMPLE_RATE).has_note());
    }

    let reading = session.process_frame(&vec![0.0; FRAME], SAMPLE_RATE);
    assert_eq!(reading, TunerReading::silent());

    // The next note is not averaged with the previous one.
    let frame = &sine_frames(392.0, 1)[0];
    let reading = session.process_frame(frame, SAMPLE_RATE);
    assert_eq!(reading.frequency, reading.raw_frequency);
    assert_eq!(reading.note_name, Some("G"));
}

#[test]
fn noise_never_produces_a_note() {
    let mut session = started_session();
    let mut state: u32 = 0x1234_5678;
    for _ in 0..5 {
        let frame: Vec<f32> = (0..FRAME)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) - 0.5
            })
            .collect();
        let reading = session.process_frame(&frame, SAMPLE_RATE);
        if let Some(confidence) = reading.confidence {
            assert!(confidence >= CONFIDENCE_THRESHOLD);
        }
        assert!(!reading.has_note());
    }
}

#[test]
fn reference_frequency_changes_mapping() {
    let mut session = started_session();
    session.set_reference_frequency(432.0).unwrap();
    let mut reading = TunerReading::silent();
    for frame in sine_frames(432.0, 3) {
        reading = session.process_frame(&frame, SAMPLE_RATE);
    }
    assert_eq!(reading.note_name, Some("A"));
    assert!(reading.cents_deviation.unwrap().abs() < 17.0);
}

#[test]
fn stop_and_restart_clears_history() {
    let mut session = started_session();
    for frame in sine_frames(110.0, 3) {
        session.process_frame(&frame, SAMPLE_RATE);
    }
    session.stop();
    assert!(!session.is_active());
    assert_eq!(
        session.process_frame(&sine_frames(110.0, 1)[0], SAMPLE_RATE),
        TunerReading::silent()
    );

    session.start();
    let reading = session.process_frame(&sine_frames(220.0, 1)[0], SAMPLE_RATE);
    assert_eq!(reading.frequency, reading.raw_frequency);
}
