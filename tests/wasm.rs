// Browser-side smoke test: verifies start_game() builds the DOM layout.
// Runs only under `wasm-pack test`; compiles to nothing on the host.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn start_game_builds_layout_once() {
    mind_chain::start_game().expect("start_game");
    mind_chain::start_game().expect("start_game is idempotent");
    let doc = web_sys::window().unwrap().document().unwrap();
    assert!(doc.get_element_by_id("mc-root").is_some());
    assert!(doc.get_element_by_id("mc-start-btn").is_some());
    assert_eq!(doc.get_elements_by_tag_name("h1").length(), 2);
}
