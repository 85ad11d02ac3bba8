//! Browser glue: DOM presenter, timers and the command interpreter.
//!
//! The pure core in [`session`] never touches `web-sys`; this module feeds it
//! events (option clicks, the 100ms per-task countdown, the 1s session clock,
//! scheduled one-shots) and executes the [`Command`]s it emits. Interval
//! timers are tracked by handle plus their closure, so a restart can cancel
//! them and a re-arm can reclaim the old closure; one-shot timeouts hand
//! their closure to the JS side outright and capture the session epoch at
//! scheduling time, bailing if a newer session owns the page when they fire.

use std::cell::RefCell;

use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Window, window};

pub mod audio;
pub mod session;
pub mod task;

use session::{Command, Game, Screen, TASK_TICK_MS, format_clock};
use task::Task;

struct GlueState {
    game: Game,
    /// Bumped on every session start; stale one-shots compare against it.
    epoch: u64,
    task_timer: Option<i32>,
    session_timer: Option<i32>,
    task_cb: Option<Closure<dyn FnMut()>>,
    session_cb: Option<Closure<dyn FnMut()>>,
    /// An interval cleared from inside its own tick parks its closure here;
    /// dropping it mid-call would tear down a function the JS side is still
    /// executing. The next clear reclaims it.
    retired_task_cb: Option<Closure<dyn FnMut()>>,
    retired_session_cb: Option<Closure<dyn FnMut()>>,
    /// Click listeners for the current round's option buttons; each render
    /// replaces them, dropping the previous round's along with its buttons.
    option_cbs: Vec<Closure<dyn FnMut(web_sys::MouseEvent)>>,
}

thread_local! {
    static STATE: RefCell<Option<GlueState>> = RefCell::new(None);
}

// --- Inline styles -----------------------------------------------------------

const HIDDEN: &str = "display:none;";
const BUTTON_STYLE: &str = "padding:12px 34px; font-size:1.1rem; border:none; border-radius:8px; background:#6366f1; color:#fff; cursor:pointer;";
const OPTION_STYLE: &str = "padding:14px 10px; font-size:1.05rem; border:1px solid #3a3a4e; border-radius:8px; background:#1f1f2e; color:#f0f0f5; cursor:pointer;";
const LINK_STYLE: &str = "min-width:26px; padding:4px 6px; border-radius:13px; background:#6366f1; color:#fff; font-size:0.85rem;";
const LINK_BREAKING_STYLE: &str = "min-width:26px; padding:4px 6px; border-radius:13px; background:#f87171; color:#fff; font-size:0.85rem; opacity:0.25; transition:opacity 0.4s;";
const MEMORY_PROMPT_STYLE: &str = "margin-bottom:25px; font-size:1.2rem; color:#f59e0b;";

// --- Entry points ------------------------------------------------------------

/// Build the layout and park on the start screen; a click on the start (or
/// restart) button begins a session.
pub fn init() -> Result<(), JsValue> {
    let doc = document()?;
    ensure_layout(&doc)?;
    show_screen(&doc, Screen::Start);
    Ok(())
}

/// Start or restart a session. Bumping the epoch first neutralizes every
/// one-shot still in flight from the previous session.
pub fn start_session() -> Result<(), JsValue> {
    let doc = document()?;
    ensure_layout(&doc)?;
    let cmds = STATE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let state = slot.get_or_insert_with(|| GlueState {
            game: Game::new(StdRng::from_entropy()),
            epoch: 0,
            task_timer: None,
            session_timer: None,
            task_cb: None,
            session_cb: None,
            retired_task_cb: None,
            retired_session_cb: None,
            option_cbs: Vec::new(),
        });
        state.epoch += 1;
        state.game.start()
    });
    run_commands(cmds)
}

// --- Event dispatch ----------------------------------------------------------

fn dispatch(f: impl FnOnce(&mut Game) -> Vec<Command>) {
    let cmds = STATE.with(|cell| {
        cell.borrow_mut().as_mut().map(|s| f(&mut s.game)).unwrap_or_default()
    });
    let _ = run_commands(cmds);
}

/// Like [`dispatch`], but only if the session that scheduled the one-shot is
/// still the live one.
fn dispatch_at_epoch(epoch: u64, f: impl FnOnce(&mut Game) -> Vec<Command>) {
    let cmds = STATE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(s) if s.epoch == epoch => f(&mut s.game),
        _ => Vec::new(),
    });
    let _ = run_commands(cmds);
}

fn current_epoch() -> u64 {
    STATE.with(|cell| cell.borrow().as_ref().map(|s| s.epoch).unwrap_or(0))
}

// --- Command interpreter -----------------------------------------------------

fn run_commands(cmds: Vec<Command>) -> Result<(), JsValue> {
    let doc = document()?;
    for cmd in cmds {
        match cmd {
            Command::ShowScreen(screen) => show_screen(&doc, screen),
            Command::Render(task) => render_task(&doc, &task)?,
            Command::MaskDisplay => {
                if let Some(el) = doc.get_element_by_id("mc-display") {
                    el.set_attribute("style", HIDDEN).ok();
                }
                if let Some(el) = doc.get_element_by_id("mc-memory-prompt") {
                    el.set_attribute("style", MEMORY_PROMPT_STYLE).ok();
                }
            }
            Command::DisableOptions => {
                for btn in option_buttons(&doc) {
                    btn.set_attribute("disabled", "true").ok();
                }
            }
            Command::Highlight { value, correct } => {
                let tint = if correct { "#166534" } else { "#7f1d1d" };
                for btn in option_buttons(&doc) {
                    if btn.get_attribute("data-answer").as_deref() == Some(value.as_str()) {
                        btn.set_attribute(
                            "style",
                            &format!("{OPTION_STYLE} background:{tint};"),
                        )
                        .ok();
                    }
                }
            }
            Command::UpdateHud { score, chain_length, seconds_remaining } => {
                set_text(&doc, "mc-score", &score.to_string());
                set_text(&doc, "mc-chain", &chain_length.to_string());
                set_text(&doc, "mc-time", &format_clock(seconds_remaining));
            }
            Command::UpdateCountdown { remaining_secs, fraction } => {
                set_text(&doc, "mc-timer-text", &format!("{remaining_secs:.1}s"));
                if let Some(fill) = doc.get_element_by_id("mc-timer-fill") {
                    let color = if fraction < 0.3 {
                        "#f87171"
                    } else if fraction < 0.5 {
                        "#fbbf24"
                    } else {
                        "#4ade80"
                    };
                    fill.set_attribute(
                        "style",
                        &format!(
                            "width:{:.1}%; height:100%; background:{color};",
                            fraction * 100.0
                        ),
                    )
                    .ok();
                }
            }
            Command::AppendChainLink(n) => append_chain_link(&doc, n)?,
            Command::ClearChain { animated } => clear_chain(&doc, animated)?,
            Command::PlaySuccess => audio::play_success(),
            Command::PlayFailure => audio::play_failure(),
            Command::PlayChainTick(n) => audio::play_chain_tick(n),
            Command::ArmTaskTimer => {
                clear_task_timer()?;
                let (handle, cb) =
                    arm_interval(TASK_TICK_MS, Box::new(|| dispatch(|g| g.countdown_tick())))?;
                STATE.with(|cell| {
                    if let Some(s) = cell.borrow_mut().as_mut() {
                        s.task_timer = Some(handle);
                        s.task_cb = Some(cb);
                    }
                });
            }
            Command::ClearTaskTimer => clear_task_timer()?,
            Command::ArmSessionTimer => {
                clear_session_timer()?;
                let (handle, cb) = arm_interval(1000, Box::new(|| dispatch(|g| g.session_tick())))?;
                STATE.with(|cell| {
                    if let Some(s) = cell.borrow_mut().as_mut() {
                        s.session_timer = Some(handle);
                        s.session_cb = Some(cb);
                    }
                });
            }
            Command::ClearSessionTimer => clear_session_timer()?,
            Command::ScheduleMask { delay_ms, round } => {
                let epoch = current_epoch();
                schedule_timeout(delay_ms, move || {
                    dispatch_at_epoch(epoch, move |g| g.mask_elapsed(round))
                })?;
            }
            Command::ScheduleResume { delay_ms } => {
                let epoch = current_epoch();
                schedule_timeout(delay_ms, move || dispatch_at_epoch(epoch, |g| g.resume()))?;
            }
            Command::ShowFinal { score, longest_chain, seconds_survived } => {
                set_text(&doc, "mc-final-score", &score.to_string());
                set_text(&doc, "mc-final-chain", &longest_chain.to_string());
                set_text(&doc, "mc-time-survived", &format_clock(seconds_survived));
            }
        }
    }
    Ok(())
}

// --- Timers ------------------------------------------------------------------

/// The caller owns the returned closure for as long as the interval is armed.
fn arm_interval(
    interval_ms: u32,
    f: Box<dyn FnMut()>,
) -> Result<(i32, Closure<dyn FnMut()>), JsValue> {
    let w = win()?;
    let cb = Closure::wrap(f);
    let handle = w.set_interval_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        interval_ms as i32,
    )?;
    Ok((handle, cb))
}

/// One-shot: ownership of the closure moves to the JS side, which frees it
/// after the single invocation.
fn schedule_timeout(delay_ms: u32, f: impl FnOnce() + 'static) -> Result<(), JsValue> {
    let w = win()?;
    let cb = Closure::once_into_js(f);
    w.set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), delay_ms as i32)?;
    Ok(())
}

fn clear_task_timer() -> Result<(), JsValue> {
    let cleared =
        STATE.with(|cell| cell.borrow_mut().as_mut().map(|s| (s.task_timer.take(), s.task_cb.take())));
    if let Some((handle, cb)) = cleared {
        if let Some(handle) = handle {
            win()?.clear_interval_with_handle(handle);
        }
        // The timeout path clears this interval from within its own tick, so
        // park the closure instead of dropping it here.
        STATE.with(|cell| {
            if let Some(s) = cell.borrow_mut().as_mut() {
                s.retired_task_cb = cb;
            }
        });
    }
    Ok(())
}

fn clear_session_timer() -> Result<(), JsValue> {
    let cleared = STATE.with(|cell| {
        cell.borrow_mut().as_mut().map(|s| (s.session_timer.take(), s.session_cb.take()))
    });
    if let Some((handle, cb)) = cleared {
        if let Some(handle) = handle {
            win()?.clear_interval_with_handle(handle);
        }
        // Session end runs inside a session tick; same parking rule.
        STATE.with(|cell| {
            if let Some(s) = cell.borrow_mut().as_mut() {
                s.retired_session_cb = cb;
            }
        });
    }
    Ok(())
}

// --- DOM presenter -----------------------------------------------------------

fn ensure_layout(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("mc-root").is_some() {
        return Ok(());
    }
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    let root = doc.create_element("div")?;
    root.set_id("mc-root");
    root.set_attribute("style", "position:fixed; inset:0; display:flex; align-items:center; justify-content:center; background:#14141c; color:#f0f0f5; font-family:'Segoe UI', sans-serif; text-align:center;")?;
    body.append_child(&root)?;

    let start = doc.create_element("div")?;
    start.set_id("mc-start-screen");
    start.set_inner_html(concat!(
        "<h1 style='font-size:2.4rem; margin-bottom:12px;'>Mind Chain</h1>",
        "<p style='margin-bottom:24px; color:#a9a9c0;'>Answer fast, keep the chain alive. 5 minutes on the clock.</p>",
    ));
    let start_btn = doc.create_element("button")?;
    start_btn.set_id("mc-start-btn");
    start_btn.set_text_content(Some("Start"));
    start_btn.set_attribute("style", BUTTON_STYLE)?;
    start.append_child(&start_btn)?;
    root.append_child(&start)?;

    let task_screen = doc.create_element("div")?;
    task_screen.set_id("mc-task-screen");
    task_screen.set_attribute("style", HIDDEN)?;
    task_screen.set_inner_html(concat!(
        "<div style='display:flex; gap:28px; justify-content:center; margin-bottom:14px; font-size:1.05rem;'>",
        "<span>Score: <b id='mc-score'>0</b></span>",
        "<span>Chain: <b id='mc-chain'>0</b></span>",
        "<span>Time: <b id='mc-time'>5:00</b></span>",
        "</div>",
        "<div style='width:420px; max-width:80vw; height:10px; margin:0 auto 6px; background:#2a2a3a; border-radius:5px; overflow:hidden;'>",
        "<div id='mc-timer-fill' style='width:100%; height:100%; background:#4ade80;'></div>",
        "</div>",
        "<div id='mc-timer-text' style='font-size:0.9rem; color:#a9a9c0; margin-bottom:14px;'>8.0s</div>",
        "<div id='mc-chain-links' style='display:flex; gap:6px; justify-content:center; flex-wrap:wrap; min-height:30px; margin-bottom:18px;'></div>",
        "<div id='mc-task-content'></div>",
    ));
    root.append_child(&task_screen)?;

    let over = doc.create_element("div")?;
    over.set_id("mc-gameover-screen");
    over.set_attribute("style", HIDDEN)?;
    over.set_inner_html(concat!(
        "<h1 style='font-size:2rem; margin-bottom:16px;'>Time's up!</h1>",
        "<p style='margin:6px 0;'>Final score: <b id='mc-final-score'>0</b></p>",
        "<p style='margin:6px 0;'>Longest chain: <b id='mc-final-chain'>0</b></p>",
        "<p style='margin:6px 0 22px;'>Time survived: <b id='mc-time-survived'>0:00</b></p>",
    ));
    let restart_btn = doc.create_element("button")?;
    restart_btn.set_id("mc-restart-btn");
    restart_btn.set_text_content(Some("Play again"));
    restart_btn.set_attribute("style", BUTTON_STYLE)?;
    over.append_child(&restart_btn)?;
    root.append_child(&over)?;

    for btn in [&start_btn, &restart_btn] {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            let _ = start_session();
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn show_screen(doc: &Document, screen: Screen) {
    let screens = [
        ("mc-start-screen", screen == Screen::Start),
        ("mc-task-screen", screen == Screen::Task),
        ("mc-gameover-screen", screen == Screen::GameOver),
    ];
    for (id, visible) in screens {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_attribute("style", if visible { "display:block;" } else { HIDDEN })
                .ok();
        }
    }
}

fn render_task(doc: &Document, task: &Task) -> Result<(), JsValue> {
    let content = doc
        .get_element_by_id("mc-task-content")
        .ok_or_else(|| JsValue::from_str("no task container"))?;
    content.set_inner_html("");

    let question = doc.create_element("div")?;
    question.set_attribute("style", "font-size:1.3rem; margin-bottom:16px; color:#f59e0b;")?;
    question.set_text_content(Some(&task.prompt));
    content.append_child(&question)?;

    if let Some(display) = &task.display {
        let display_el = doc.create_element("div")?;
        display_el.set_id("mc-display");
        display_el
            .set_attribute("style", "font-size:1.8rem; margin-bottom:25px; font-weight:600;")?;
        display_el.set_text_content(Some(display));
        content.append_child(&display_el)?;
    }
    if task.hides_display() {
        // Swapped in for the sequence once the reveal window elapses.
        let prompt = doc.create_element("div")?;
        prompt.set_id("mc-memory-prompt");
        prompt.set_attribute("style", HIDDEN)?;
        prompt.set_text_content(Some("What was the sequence?"));
        content.append_child(&prompt)?;
    }

    let options = doc.create_element("div")?;
    options.set_id("mc-options");
    options.set_attribute("style", "display:grid; grid-template-columns:repeat(2, minmax(120px, 1fr)); gap:10px; max-width:420px; margin:0 auto;")?;
    let mut listeners = Vec::with_capacity(task.options.len());
    for option in &task.options {
        let btn = doc.create_element("button")?;
        btn.set_attribute("data-answer", option)?;
        btn.set_attribute("style", OPTION_STYLE)?;
        btn.set_text_content(Some(option));
        let value = option.clone();
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            dispatch(|g| g.option_selected(&value));
        }) as Box<dyn FnMut(_)>);
        btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        listeners.push(closure);
        options.append_child(&btn)?;
    }
    content.append_child(&options)?;
    // The outgoing round's listeners go away with the buttons they served.
    STATE.with(|cell| {
        if let Some(s) = cell.borrow_mut().as_mut() {
            s.option_cbs = listeners;
        }
    });
    Ok(())
}

fn option_buttons(doc: &Document) -> Vec<Element> {
    let mut buttons = Vec::new();
    if let Some(container) = doc.get_element_by_id("mc-options") {
        let children = container.children();
        for i in 0..children.length() {
            if let Some(el) = children.item(i) {
                buttons.push(el);
            }
        }
    }
    buttons
}

fn append_chain_link(doc: &Document, n: u32) -> Result<(), JsValue> {
    let Some(container) = doc.get_element_by_id("mc-chain-links") else {
        return Ok(());
    };
    let link = doc.create_element("div")?;
    link.set_attribute("style", LINK_STYLE)?;
    link.set_text_content(Some(&n.to_string()));
    container.append_child(&link)?;
    container.set_scroll_left(container.scroll_width());
    Ok(())
}

/// Break the chain visual. Animated clears stagger a per-link fade before
/// removing exactly the links present at break time; a fast correct answer in
/// the next round can append a fresh link before the sweep fires, and that
/// one must survive. Restart clears are immediate.
fn clear_chain(doc: &Document, animated: bool) -> Result<(), JsValue> {
    let Some(container) = doc.get_element_by_id("mc-chain-links") else {
        return Ok(());
    };
    if !animated {
        container.set_inner_html("");
        return Ok(());
    }
    let children = container.children();
    let mut links = Vec::with_capacity(children.length() as usize);
    for i in 0..children.length() {
        if let Some(link) = children.item(i) {
            links.push(link);
        }
    }
    for (i, link) in links.iter().enumerate() {
        let link = link.clone();
        schedule_timeout(i as u32 * 50, move || {
            link.set_attribute("style", LINK_BREAKING_STYLE).ok();
        })?;
    }
    let epoch = current_epoch();
    schedule_timeout(links.len() as u32 * 50 + 500, move || {
        // A restart in the meantime owns the row; leave it alone.
        if current_epoch() == epoch {
            for link in &links {
                link.remove();
            }
        }
    })?;
    Ok(())
}

fn set_text(doc: &Document, id: &str, text: &str) {
    if let Some(el) = doc.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

// --- Window helpers ----------------------------------------------------------

fn win() -> Result<Window, JsValue> {
    window().ok_or_else(|| JsValue::from_str("no window"))
}

fn document() -> Result<Document, JsValue> {
    win()?.document().ok_or_else(|| JsValue::from_str("no document"))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                .unwrap();
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    #[wasm_bindgen_test]
    async fn chain_sweep_spares_links_appended_after_the_break() {
        let doc = document().unwrap();
        ensure_layout(&doc).unwrap();
        // Stop any intervals a previous test left running on this page.
        clear_task_timer().unwrap();
        clear_session_timer().unwrap();
        clear_chain(&doc, false).unwrap();
        append_chain_link(&doc, 1).unwrap();
        append_chain_link(&doc, 2).unwrap();
        // Break the chain, then land the next round's first link before the
        // staggered sweep (2 * 50ms + 500ms) has fired.
        clear_chain(&doc, true).unwrap();
        append_chain_link(&doc, 1).unwrap();
        sleep(900).await;
        let container = doc.get_element_by_id("mc-chain-links").unwrap();
        assert_eq!(container.children().length(), 1);
        let survivor = container.children().item(0).unwrap();
        assert_eq!(survivor.text_content().as_deref(), Some("1"));
    }

    #[wasm_bindgen_test]
    async fn restart_rebinds_timers_and_option_listeners() {
        let doc = document().unwrap();
        ensure_layout(&doc).unwrap();
        // Back-to-back sessions re-arm both intervals and re-render the
        // option row, reclaiming the first session's closures.
        start_session().unwrap();
        start_session().unwrap();
        // Let the re-armed countdown tick a few times on the new closures.
        sleep(350).await;
        assert_eq!(doc.get_element_by_id("mc-options").unwrap().children().length(), 4);
        let held = STATE.with(|cell| {
            let slot = cell.borrow();
            let s = slot.as_ref().unwrap();
            (s.task_cb.is_some(), s.session_cb.is_some(), s.option_cbs.len())
        });
        assert_eq!(held, (true, true, 4));
    }
}
