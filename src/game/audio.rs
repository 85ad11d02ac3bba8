//! Oscillator cue player: success / failure / chain-tick blips.
//!
//! Fire-and-forget — every call swallows Web Audio errors, since a missing or
//! suspended `AudioContext` must never take the game down. One context is
//! created lazily and reused for the whole page lifetime.

use std::cell::RefCell;

use wasm_bindgen::JsValue;
use web_sys::{AudioContext, OscillatorType};

thread_local! {
    static AUDIO: RefCell<Option<AudioContext>> = RefCell::new(None);
}

fn with_context(f: impl FnOnce(&AudioContext)) {
    AUDIO.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = AudioContext::new().ok();
        }
        if let Some(ctx) = slot.as_ref() {
            f(ctx);
        }
    });
}

/// One enveloped tone: starts at gain 0.3 and decays exponentially to near
/// silence over `duration` seconds.
fn play_tone(
    ctx: &AudioContext,
    frequency: f32,
    start: f64,
    duration: f64,
    shape: OscillatorType,
) -> Result<(), JsValue> {
    let gain = ctx.create_gain()?;
    gain.gain().set_value_at_time(0.3, start)?;
    gain.gain().exponential_ramp_to_value_at_time(0.01, start + duration)?;
    gain.connect_with_audio_node(&ctx.destination())?;

    let osc = ctx.create_oscillator()?;
    osc.set_type(shape);
    osc.frequency().set_value(frequency);
    osc.connect_with_audio_node(&gain)?;
    osc.start_with_when(start)?;
    osc.stop_with_when(start + duration)?;
    Ok(())
}

/// Rising two-note chime (C5 then E5) on a correct answer.
pub fn play_success() {
    with_context(|ctx| {
        let now = ctx.current_time();
        let _ = play_tone(ctx, 523.25, now, 0.15, OscillatorType::Sine);
        let _ = play_tone(ctx, 659.25, now + 0.1, 0.15, OscillatorType::Sine);
    });
}

/// Low sawtooth buzz on an explicit wrong click (timeouts stay silent).
pub fn play_failure() {
    with_context(|ctx| {
        let now = ctx.current_time();
        let _ = play_tone(ctx, 220.0, now, 0.3, OscillatorType::Sawtooth);
    });
}

/// Short square blip whose pitch climbs with the chain length.
pub fn play_chain_tick(chain_length: u32) {
    with_context(|ctx| {
        let now = ctx.current_time();
        let freq = 440.0 + chain_length as f32 * 20.0;
        let _ = play_tone(ctx, freq, now, 0.1, OscillatorType::Square);
    });
}
