//! Playwright browser automation
//!
//! A long-lived `node` process runs a small bridge script that owns one
//! browser, context and page. Requests and responses are newline-delimited
//! JSON over the child's stdin/stdout:
//!
//! ```text
//! -> {"id":3,"op":"click","selector":"button[type=submit]"}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"error":"...","kind":"timeout"}
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::driver::{BoundingBox, DialogAction, Driver, SelectBy, WaitState};
use crate::error::{E2eError, E2eResult};

/// Upper bound on a single bridge round trip; the bridge enforces the
/// per-action timeouts itself.
const BRIDGE_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

const BRIDGE_CONFIG_ENV: &str = "CEDAR_QA_BRIDGE_CONFIG";

const BRIDGE_JS: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const cfg = JSON.parse(process.env.CEDAR_QA_BRIDGE_CONFIG || '{}');
const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  const browser = await playwright[cfg.browser].launch({ headless: cfg.headless });
  const context = await browser.newContext({
    viewport: { width: cfg.width, height: cfg.height },
    baseURL: cfg.baseUrl || undefined,
  });
  context.setDefaultTimeout(cfg.actionTimeoutMs);
  const page = await context.newPage();

  let nextDialog = null;
  page.on('dialog', async (dialog) => {
    const action = nextDialog;
    nextDialog = null;
    console.error(`dialog: ${dialog.message()}`);
    if (action === 'accept') await dialog.accept().catch(() => {});
    else await dialog.dismiss().catch(() => {});
  });

  const first = (sel) => page.locator(sel).first();
  const done = () => null;

  const ops = {
    goto: (a) => page.goto(a.url).then(done),
    url: () => page.url(),
    wait_for_load: (a) => page.waitForLoadState('load', { timeout: a.timeoutMs }).then(done),
    count: (a) => page.locator(a.selector).count(),
    is_visible: (a) => first(a.selector).isVisible(),
    is_checked: (a) => first(a.selector).isChecked(),
    wait_for: (a) => first(a.selector).waitFor({ state: a.state, timeout: a.timeoutMs }).then(done),
    click: (a) => first(a.selector).click().then(done),
    double_click: (a) => first(a.selector).dblclick().then(done),
    fill: (a) => first(a.selector).fill(a.value).then(done),
    clear: (a) => first(a.selector).clear().then(done),
    type_text: (a) => first(a.selector).pressSequentially(a.text).then(done),
    press: (a) => page.keyboard.press(a.key).then(done),
    select_option: (a) => first(a.selector).selectOption(a.by).then(done),
    check: (a) => first(a.selector).check().then(done),
    uncheck: (a) => first(a.selector).uncheck().then(done),
    scroll_into_view: (a) => first(a.selector).scrollIntoViewIfNeeded().then(done),
    drag_and_drop: (a) => page.dragAndDrop(a.source, a.target).then(done),
    bounding_box: (a) => first(a.selector).boundingBox(),
    mouse_move: (a) => page.mouse.move(a.x, a.y).then(done),
    mouse_down: () => page.mouse.down().then(done),
    mouse_up: () => page.mouse.up().then(done),
    set_input_files: (a) => first(a.selector).setInputFiles(a.path).then(done),
    input_value: (a) => first(a.selector).inputValue(),
    text_content: (a) => first(a.selector).textContent(),
    all_text_contents: (a) => page.locator(a.selector).allTextContents(),
    eval_on_selector: (a) => first(a.selector).evaluate((el, src) => (0, eval)(src)(el), a.script),
    on_next_dialog: (a) => { nextDialog = a.action; return null; },
    screenshot: (a) => page.screenshot({ path: a.path, fullPage: a.fullPage }).then(done),
    close: () => browser.close().then(done),
  };

  send({ ready: true });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      send({ id: null, ok: false, error: `bad request: ${e.message}`, kind: 'protocol' });
      continue;
    }
    const op = ops[req.op];
    if (!op) {
      send({ id: req.id, ok: false, error: `unknown op: ${req.op}`, kind: 'protocol' });
      continue;
    }
    try {
      const value = await op(req);
      send({ id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
      send({ id: req.id, ok: false, error: e.message, kind: e.name === 'TimeoutError' ? 'timeout' : 'error' });
    }
    if (req.op === 'close') break;
  }
  await browser.close().catch(() => {});
  process.exit(0);
})().catch((e) => {
  send({ id: null, ok: false, error: e.message, kind: 'fatal' });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> E2eResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("unsupported browser: {}", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    /// Base URL for relative navigations (empty = none)
    pub base_url: String,
    pub screenshot_dir: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub browser: Browser,
    pub headless: bool,
    /// Default timeout for each browser action
    pub action_timeout: Duration,
    /// How long to wait for the browser to launch
    pub launch_timeout: Duration,
    /// `node_modules` directory that provides the `playwright` package
    pub node_modules: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            viewport_width: 1280,
            viewport_height: 720,
            browser: Browser::Chromium,
            headless: true,
            action_timeout: Duration::from_secs(10),
            launch_timeout: Duration::from_secs(30),
            node_modules: PathBuf::from("node_modules"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    kind: Option<String>,
}

impl BridgeResponse {
    fn into_result(self, op: &str) -> E2eResult<Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.error.unwrap_or_else(|| "unknown bridge error".to_string());
        match self.kind.as_deref() {
            Some("timeout") => Err(E2eError::Timeout(format!("{}: {}", op, message))),
            _ => Err(E2eError::Playwright(format!("{}: {}", op, message))),
        }
    }
}

struct BridgeChannel {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl BridgeChannel {
    async fn read_response(&mut self) -> E2eResult<BridgeResponse> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Playwright("bridge process exited".to_string()))?;
            match serde_json::from_str::<BridgeResponse>(&line) {
                Ok(resp) => return Ok(resp),
                Err(_) => debug!("bridge: {}", line),
            }
        }
    }
}

/// Playwright browser handle backed by a bridge process
pub struct PlaywrightDriver {
    channel: Mutex<BridgeChannel>,
    _child: Child,
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Launch a browser and open a page
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        let node_path = if config.node_modules.is_absolute() {
            config.node_modules.clone()
        } else {
            std::env::current_dir()?.join(&config.node_modules)
        };
        Self::check_playwright_installed(&node_path).await?;

        std::fs::create_dir_all(&config.screenshot_dir)?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_JS)?;

        let bridge_config = json!({
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "width": config.viewport_width,
            "height": config.viewport_height,
            "baseUrl": config.base_url,
            "actionTimeoutMs": config.action_timeout.as_millis() as u64,
        });

        info!(
            "Launching {} (headless: {}) via Playwright bridge",
            config.browser.as_str(),
            config.headless
        );

        let mut child = Command::new("node")
            .arg(&script_path)
            .env("NODE_PATH", &node_path)
            .env(BRIDGE_CONFIG_ENV, bridge_config.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("Failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let mut channel = BridgeChannel {
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
        };

        let ready = tokio::time::timeout(config.launch_timeout, channel.read_response())
            .await
            .map_err(|_| E2eError::Timeout("browser launch".to_string()))??;
        if !ready.ready {
            return Err(ready
                .into_result("launch")
                .err()
                .unwrap_or_else(|| E2eError::Playwright("unexpected bridge greeting".to_string())));
        }

        Ok(Self {
            channel: Mutex::new(channel),
            _child: child,
            _script_dir: script_dir,
        })
    }

    /// Check that node can load the playwright package
    async fn check_playwright_installed(node_path: &Path) -> E2eResult<()> {
        let status = Command::new("node")
            .args(["-e", "require('playwright')"])
            .env("NODE_PATH", node_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn call(&self, op: &str, args: Value) -> E2eResult<Value> {
        let mut channel = self.channel.lock().await;
        channel.next_id += 1;
        let id = channel.next_id;

        let mut request = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        request.insert("id".to_string(), id.into());
        request.insert("op".to_string(), op.into());

        let mut line = serde_json::to_string(&Value::Object(request))?;
        line.push('\n');
        channel.stdin.write_all(line.as_bytes()).await?;
        channel.stdin.flush().await?;

        let exchange = async {
            loop {
                let resp = channel.read_response().await?;
                match resp.id {
                    Some(resp_id) if resp_id == id => return resp.into_result(op),
                    None if resp.kind.as_deref() == Some("fatal") => return resp.into_result(op),
                    other => warn!("Discarding bridge response for request {:?}", other),
                }
            }
        };

        tokio::time::timeout(BRIDGE_RESPONSE_TIMEOUT, exchange)
            .await
            .map_err(|_| E2eError::Timeout(format!("bridge response to {}", op)))?
    }

    async fn call_unit(&self, op: &str, args: Value) -> E2eResult<()> {
        self.call(op, args).await.map(|_| ())
    }
}

fn timeout_ms(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.call_unit("goto", json!({ "url": url })).await
    }

    async fn current_url(&self) -> E2eResult<String> {
        let value = self.call("url", Value::Null).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn wait_for_load(&self, timeout: Duration) -> E2eResult<()> {
        self.call_unit("wait_for_load", json!({ "timeoutMs": timeout_ms(timeout) }))
            .await
    }

    async fn count(&self, selector: &str) -> E2eResult<usize> {
        let value = self.call("count", json!({ "selector": selector })).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    async fn is_visible(&self, selector: &str) -> E2eResult<bool> {
        let value = self.call("is_visible", json!({ "selector": selector })).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_checked(&self, selector: &str) -> E2eResult<bool> {
        let value = self.call("is_checked", json!({ "selector": selector })).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn wait_for(&self, selector: &str, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.call_unit(
            "wait_for",
            json!({ "selector": selector, "state": state.as_str(), "timeoutMs": timeout_ms(timeout) }),
        )
        .await
    }

    async fn click(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("click", json!({ "selector": selector })).await
    }

    async fn double_click(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("double_click", json!({ "selector": selector })).await
    }

    async fn fill(&self, selector: &str, value: &str) -> E2eResult<()> {
        self.call_unit("fill", json!({ "selector": selector, "value": value })).await
    }

    async fn clear(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("clear", json!({ "selector": selector })).await
    }

    async fn type_text(&self, selector: &str, text: &str) -> E2eResult<()> {
        self.call_unit("type_text", json!({ "selector": selector, "text": text })).await
    }

    async fn press(&self, key: &str) -> E2eResult<()> {
        self.call_unit("press", json!({ "key": key })).await
    }

    async fn select_option(&self, selector: &str, by: &SelectBy) -> E2eResult<()> {
        // externally tagged: {"value": ..} / {"index": ..} / {"label": ..}
        self.call_unit("select_option", json!({ "selector": selector, "by": by })).await
    }

    async fn check(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("check", json!({ "selector": selector })).await
    }

    async fn uncheck(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("uncheck", json!({ "selector": selector })).await
    }

    async fn scroll_into_view(&self, selector: &str) -> E2eResult<()> {
        self.call_unit("scroll_into_view", json!({ "selector": selector })).await
    }

    async fn drag_and_drop(&self, source: &str, target: &str) -> E2eResult<()> {
        self.call_unit("drag_and_drop", json!({ "source": source, "target": target }))
            .await
    }

    async fn bounding_box(&self, selector: &str) -> E2eResult<Option<BoundingBox>> {
        let value = self.call("bounding_box", json!({ "selector": selector })).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn mouse_move(&self, x: f64, y: f64) -> E2eResult<()> {
        self.call_unit("mouse_move", json!({ "x": x, "y": y })).await
    }

    async fn mouse_down(&self) -> E2eResult<()> {
        self.call_unit("mouse_down", Value::Null).await
    }

    async fn mouse_up(&self) -> E2eResult<()> {
        self.call_unit("mouse_up", Value::Null).await
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> E2eResult<()> {
        self.call_unit(
            "set_input_files",
            json!({ "selector": selector, "path": path.to_string_lossy() }),
        )
        .await
    }

    async fn input_value(&self, selector: &str) -> E2eResult<String> {
        let value = self.call("input_value", json!({ "selector": selector })).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn text_content(&self, selector: &str) -> E2eResult<Option<String>> {
        let value = self.call("text_content", json!({ "selector": selector })).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn all_text_contents(&self, selector: &str) -> E2eResult<Vec<String>> {
        let value = self.call("all_text_contents", json!({ "selector": selector })).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn eval_on_selector(&self, selector: &str, script: &str) -> E2eResult<Value> {
        self.call("eval_on_selector", json!({ "selector": selector, "script": script }))
            .await
    }

    async fn on_next_dialog(&self, action: DialogAction) -> E2eResult<()> {
        self.call_unit("on_next_dialog", json!({ "action": action.as_str() })).await
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<()> {
        self.call_unit(
            "screenshot",
            json!({ "path": path.to_string_lossy(), "fullPage": full_page }),
        )
        .await
    }

    async fn close(&self) -> E2eResult<()> {
        self.call_unit("close", Value::Null).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_parse() {
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert_eq!("chrome".parse::<Browser>().unwrap(), Browser::Chromium);
        assert!("lynx".parse::<Browser>().is_err());
    }

    #[test]
    fn test_select_by_wire_shape_matches_playwright() {
        assert_eq!(json!(SelectBy::Value("USD".into())), json!({ "value": "USD" }));
        assert_eq!(json!(SelectBy::Index(2)), json!({ "index": 2 }));
    }

    #[test]
    fn test_timeout_response_maps_to_timeout_error() {
        let resp: BridgeResponse = serde_json::from_str(
            r#"{"id":1,"ok":false,"error":"locator.waitFor: Timeout 10ms exceeded","kind":"timeout"}"#,
        )
        .unwrap();
        assert!(matches!(resp.into_result("wait_for"), Err(E2eError::Timeout(_))));
    }

    #[test]
    fn test_ok_response_yields_value() {
        let resp: BridgeResponse =
            serde_json::from_str(r#"{"id":2,"ok":true,"value":3}"#).unwrap();
        assert_eq!(resp.into_result("count").unwrap(), json!(3));
    }

    #[test]
    fn test_eval_on_selector_calls_the_script_with_the_element() {
        // a bare string would be evaluated as an expression and never called
        assert!(BRIDGE_JS.contains(
            "eval_on_selector: (a) => first(a.selector).evaluate((el, src) => (0, eval)(src)(el), a.script),"
        ));
        assert!(!BRIDGE_JS.contains(".evaluate(a.script)"));
    }

    #[test]
    fn test_bridge_script_covers_driver_ops() {
        for op in [
            "goto", "url", "count", "wait_for", "click", "fill", "type_text", "select_option",
            "bounding_box", "mouse_move", "set_input_files", "input_value", "all_text_contents",
            "eval_on_selector", "on_next_dialog", "close",
        ] {
            assert!(BRIDGE_JS.contains(&format!("{}:", op)), "missing op {}", op);
        }
    }
}
