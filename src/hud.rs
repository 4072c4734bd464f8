use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlDivElement};

use crate::debug::FrameStats;
use crate::game::GameState;

const ROOT_CSS: &str = "position:fixed;top:16px;left:16px;color:white;font-family:'Inter',sans-serif;font-size:16px;pointer-events:none;text-shadow:0 0 6px rgba(0,0,0,0.45);z-index:1000;";
const STATUS_CSS: &str = "transition:opacity 0.2s ease;max-width:320px;line-height:1.4;";

/// DOM overlay next to the canvas. Handles are cheap to clone; clones share the
/// same elements, so event listeners can own one.
#[derive(Clone)]
pub struct Hud {
    root: HtmlDivElement,
    score: HtmlDivElement,
    status: HtmlDivElement,
    debug: HtmlDivElement,
}

fn div(document: &Document, text: &str, css: &str) -> Result<HtmlDivElement, wasm_bindgen::JsValue> {
    let el: HtmlDivElement = document
        .create_element("div")?
        .dyn_into()
        .map_err(|_| wasm_bindgen::JsValue::from_str("failed to create hud element"))?;
    el.set_inner_text(text);
    set_style(&el, css);
    Ok(el)
}

impl Hud {
    pub fn new(document: &Document) -> Result<Self, wasm_bindgen::JsValue> {
        let body = document
            .body()
            .ok_or_else(|| wasm_bindgen::JsValue::from_str("document has no body"))?;

        let root = div(document, "", ROOT_CSS)?;
        root.set_class_name("hud-root");
        let score = div(document, "Score: 0", "margin-bottom:4px;font-weight:600;")?;
        let status = div(document, "Tap or press Space to start", STATUS_CSS)?;
        let debug = div(document, "", "margin-top:6px;font-size:12px;opacity:0.8;")?;

        root.append_child(&score)?;
        root.append_child(&status)?;
        root.append_child(&debug)?;
        body.append_child(&root)?;

        Ok(Self {
            root,
            score,
            status,
            debug,
        })
    }

    pub fn set_score(&self, score: u32) {
        self.score.set_inner_text(&format!("Score: {score}"));
    }

    pub fn set_state(&self, state: GameState) {
        let text = match state {
            GameState::Idle => "Tap or press Space to start",
            GameState::Play => "",
            GameState::Paused => "Paused (P to resume)",
            GameState::Dead => "Game over, tap to try again",
        };
        self.status.set_inner_text(text);
        let opacity = if text.is_empty() { 0 } else { 1 };
        set_style(&self.status, &format!("opacity:{opacity};{STATUS_CSS}"));
    }

    /// Frame rate line; adds timing detail while a debug recording is running.
    pub fn set_debug_line(&self, fps: f64, stats: Option<&FrameStats>) {
        let fps = fps.round().clamp(0.0, 999.0);
        let text = match stats {
            Some(stats) => format!(
                "FPS {fps:>3.0} | {:.1} ms avg | upd {:.2} ms | draw {:.2} ms | jank {} ({} total) | REC",
                stats.avg_delta_ms,
                stats.avg_update_ms,
                stats.avg_draw_ms,
                stats.jank_window,
                stats.jank_total
            ),
            None => format!("FPS {fps:>3.0}"),
        };
        self.debug.set_inner_text(&text);
    }

    /// Fallback presentation for fatal engine errors.
    pub fn set_error(&self, text: &str) {
        self.status.set_inner_text(text);
        set_style(
            &self.status,
            "color:#ff8080;font-weight:600;max-width:320px;line-height:1.4;",
        );
        set_style(&self.root, ROOT_CSS);
    }
}

fn set_style(element: &HtmlDivElement, css: &str) {
    element.style().set_css_text(css);
}
