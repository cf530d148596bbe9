use crate::source::RawScan;
use crate::source::ScanSource;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::Instant;

/// Terminator a keyboard-wedge scanner appends after each code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WedgeSuffix {
    Enter,
    Tab,
    Both,
}

impl WedgeSuffix {
    fn terminates(self, c: char) -> bool {
        match self {
            WedgeSuffix::Enter => c == '\n' || c == '\r',
            WedgeSuffix::Tab => c == '\t',
            WedgeSuffix::Both => matches!(c, '\n' | '\r' | '\t'),
        }
    }
}

/// Gap above which buffered keystrokes are stale human typing rather
/// than a scanner burst.
const BURST_GAP: Duration = Duration::from_millis(150);

/// Assembles keystrokes from a keyboard-wedge device into complete
/// codes. Wedge scanners type an entire code in a fast burst and finish
/// with a suffix key; anything slower is discarded as manual input.
#[derive(Debug)]
pub struct WedgeAssembler {
    suffix: WedgeSuffix,
    buffer: String,
    last_key_at: Option<Instant>,
}

impl WedgeAssembler {
    pub fn new(suffix: WedgeSuffix) -> Self {
        Self {
            suffix,
            buffer: String::new(),
            last_key_at: None,
        }
    }

    /// Feeds one keystroke; returns a completed scan when the suffix
    /// arrives on a non-empty burst buffer.
    pub fn push_key(&mut self, c: char, at: Instant) -> Option<RawScan> {
        if let Some(last) = self.last_key_at {
            if at.duration_since(last) > BURST_GAP {
                self.buffer.clear();
            }
        }
        self.last_key_at = Some(at);

        if self.suffix.terminates(c) {
            if self.buffer.is_empty() {
                return None;
            }
            let code = std::mem::take(&mut self.buffer);
            return Some(RawScan { code, at });
        }
        if !c.is_control() {
            self.buffer.push(c);
        }
        None
    }
}

/// [`ScanSource`] over a channel of raw keystrokes from the host's key
/// event hook.
pub struct WedgeScanner {
    keys: Receiver<char>,
    assembler: WedgeAssembler,
}

impl WedgeScanner {
    pub fn new(keys: Receiver<char>, suffix: WedgeSuffix) -> Self {
        Self {
            keys,
            assembler: WedgeAssembler::new(suffix),
        }
    }
}

#[async_trait]
impl ScanSource for WedgeScanner {
    async fn next_scan(&mut self) -> Option<RawScan> {
        while let Some(key) = self.keys.recv().await {
            if let Some(scan) = self.assembler.push_key(key, Instant::now()) {
                return Some(scan);
            }
        }
        None
    }
}
