//! Line-oriented scan reader
//!
//! Reads one decoded payload per line from any async reader (stdin in the
//! daemon). Blank lines are skipped and the lockout window is applied before
//! forwarding.

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::controller::Control;

use super::lockout::Lockout;

/// Forwards scanner output to the controller
pub struct ScanReader<R> {
    reader: R,
    lockout: Lockout,
    control_tx: mpsc::Sender<Control>,
}

impl<R: AsyncBufRead + Unpin> ScanReader<R> {
    pub fn new(reader: R, lockout: Duration, control_tx: mpsc::Sender<Control>) -> Self {
        Self {
            reader,
            lockout: Lockout::new(lockout),
            control_tx,
        }
    }

    /// Read until end of input or until the controller goes away
    pub async fn run(mut self) {
        info!("scan reader started");
        let mut lines = self.reader.lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("scan input closed");
                    break;
                }
                Err(e) => {
                    warn!(?e, "failed to read scan input");
                    break;
                }
            };

            let payload = line.trim();
            if payload.is_empty() {
                continue;
            }
            if !self.lockout.admit(Instant::now()) {
                debug!(payload, "scan inside lockout window dropped");
                continue;
            }

            if self
                .control_tx
                .send(Control::Scan(payload.to_string()))
                .await
                .is_err()
            {
                debug!("controller gone, stopping scan reader");
                break;
            }
        }
    }
}
