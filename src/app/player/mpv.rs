use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, Stdio};

use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use serde_json::{Value, json};

use super::{MediaPlayer, MediaPosition};

/// Drives an external `mpv` process through its JSON IPC socket.
pub(crate) struct MpvPlayer {
    bin: PathBuf,
    socket_path: PathBuf,
    child: Option<Child>,
    source: Option<String>,
    last: MediaPosition,
}

impl MpvPlayer {
    pub(crate) fn new(bin: PathBuf) -> Self {
        let socket_path =
            std::env::temp_dir().join(format!("vidstream-mpv-{}.sock", std::process::id()));
        Self {
            bin,
            socket_path,
            child: None,
            source: None,
            last: MediaPosition::unknown(),
        }
    }

    fn spawn(&mut self, url: &str) -> Result<()> {
        let _ = fs::remove_file(&self.socket_path);
        let child = ProcessCommand::new(&self.bin)
            .arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .arg("--force-window=yes")
            .arg("--really-quiet")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {}", self.bin.display()))?;
        debug!("started {} (pid {})", self.bin.display(), child.id());
        self.child = Some(child);
        Ok(())
    }

    fn child_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!("player exited with {status}");
                false
            }
            Some(Err(err)) => {
                warn!("failed to poll player process: {err}");
                false
            }
            None => false,
        }
    }

    fn stop_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = fs::remove_file(&self.socket_path);
    }

    fn property(&self, name: &str) -> Option<f64> {
        let reply = ipc::request(&self.socket_path, json!(["get_property", name])).ok()?;
        reply.as_f64()
    }

    fn set_paused(&self, paused: bool) -> Result<()> {
        ipc::request(&self.socket_path, json!(["set_property", "pause", paused])).map(|_| ())
    }
}

impl MediaPlayer for MpvPlayer {
    fn load(&mut self, url: &str) -> Result<()> {
        self.stop_child();
        self.source = Some(url.to_string());
        self.last = MediaPosition::unknown();
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.child_running() {
            return self.set_paused(false);
        }
        let url = self
            .source
            .clone()
            .ok_or_else(|| anyhow!("no media source loaded"))?;
        self.spawn(&url)
    }

    fn pause(&mut self) {
        if !self.child_running() {
            return;
        }
        if let Err(err) = self.set_paused(true) {
            debug!("pause request failed: {err}");
        }
    }

    fn clear(&mut self) {
        self.stop_child();
        self.source = None;
        self.last = MediaPosition::unknown();
    }

    fn position(&mut self) -> MediaPosition {
        if self.child_running() {
            if let Some(current_time) = self.property("time-pos") {
                self.last.current_time = current_time;
            }
            if let Some(duration) = self.property("duration") {
                self.last.duration = duration;
            }
        }
        self.last
    }

    fn is_active(&mut self) -> bool {
        self.child_running()
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        self.stop_child();
    }
}

#[cfg(unix)]
mod ipc {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::Path;
    use std::time::Duration;

    use anyhow::{Context, Result, anyhow};
    use serde_json::{Value, json};

    const REQUEST_ID: u64 = 1;
    const IPC_TIMEOUT: Duration = Duration::from_millis(300);

    /// Sends one command and returns its `data` field. Event lines that mpv
    /// interleaves on the socket are skipped.
    pub(super) fn request(socket: &Path, command: Value) -> Result<Value> {
        let mut stream = UnixStream::connect(socket)
            .with_context(|| format!("failed to connect to {}", socket.display()))?;
        stream.set_read_timeout(Some(IPC_TIMEOUT))?;
        stream.set_write_timeout(Some(IPC_TIMEOUT))?;

        let message = json!({"command": command, "request_id": REQUEST_ID});
        writeln!(stream, "{message}")?;

        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let line = line?;
            if let Some(data) = super::parse_reply(&line, REQUEST_ID)? {
                return Ok(data);
            }
        }
        Err(anyhow!("player closed the IPC socket without replying"))
    }
}

#[cfg(not(unix))]
mod ipc {
    use std::path::Path;

    use anyhow::{Result, anyhow};
    use serde_json::Value;

    pub(super) fn request(_socket: &Path, _command: Value) -> Result<Value> {
        Err(anyhow!("player IPC is only supported on unix"))
    }
}

/// Returns `Some(data)` for the reply matching `request_id`, `None` for
/// unrelated lines.
fn parse_reply(line: &str, request_id: u64) -> Result<Option<Value>> {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return Ok(None);
    };
    if value.get("request_id").and_then(Value::as_u64) != Some(request_id) {
        return Ok(None);
    }
    match value.get("error").and_then(Value::as_str) {
        Some("success") => Ok(Some(value.get("data").cloned().unwrap_or(Value::Null))),
        Some(error) => Err(anyhow!("player rejected command: {error}")),
        None => Err(anyhow!("player reply without status")),
    }
}
