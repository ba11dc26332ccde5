use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("no key pressed within {0:?}")]
    TimedOut(Duration),

    #[error("key capture cancelled")]
    Cancelled,
}

type CaptureResult = Result<String, CaptureError>;

/// Caller's side of a capture.
#[derive(Debug)]
pub struct KeyCapture {
    rx: Receiver<CaptureResult>,
    deadline: Instant,
    timeout: Duration,
}

impl KeyCapture {
    /// `None` while still waiting for a key.
    pub fn poll(&self) -> Option<CaptureResult> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&self, now: Instant) -> Option<CaptureResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Disconnected) => Some(Err(CaptureError::Cancelled)),
            Err(TryRecvError::Empty) if now >= self.deadline => {
                Some(Err(CaptureError::TimedOut(self.timeout)))
            }
            Err(TryRecvError::Empty) => None,
        }
    }
}

#[derive(Debug)]
struct Pending {
    tx: Sender<CaptureResult>,
    deadline: Instant,
    timeout: Duration,
}

/// Holds at most one pending capture. The next key-down offered resolves it.
#[derive(Debug, Default)]
pub struct CaptureSlot {
    pending: Option<Pending>,
}

impl CaptureSlot {
    /// Starts a capture. Any capture already pending is cancelled first.
    pub fn begin(&mut self, timeout: Duration) -> KeyCapture {
        self.begin_at(timeout, Instant::now())
    }

    pub fn begin_at(&mut self, timeout: Duration, now: Instant) -> KeyCapture {
        if self.cancel() {
            log::debug!("Superseded a pending key capture");
        }
        let (tx, rx) = mpsc::channel();
        let deadline = now + timeout;
        self.pending = Some(Pending {
            tx,
            deadline,
            timeout,
        });
        KeyCapture {
            rx,
            deadline,
            timeout,
        }
    }

    /// Returns whether a capture was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(p) => {
                let _ = p.tx.send(Err(CaptureError::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Offers a key-down. Returns true when it resolved a capture and must not
    /// be processed further.
    pub fn offer(&mut self, code: &str, now: Instant) -> bool {
        self.expire(now);
        match self.pending.take() {
            Some(p) => {
                log::debug!("Captured key {}", code);
                let _ = p.tx.send(Ok(code.to_string()));
                true
            }
            None => false,
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.pending.as_ref().is_some_and(|p| now >= p.deadline) {
            if let Some(p) = self.pending.take() {
                log::debug!("Key capture timed out");
                let _ = p.tx.send(Err(CaptureError::TimedOut(p.timeout)));
            }
        }
    }
}
