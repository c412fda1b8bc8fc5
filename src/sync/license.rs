//! License-acceptance rendezvous
//!
//! Some servers require the connecting user to accept a license agreement
//! before joining. The protocol surfaces this as a synchronous callback on
//! the session thread, which must then wait on a human-timescale answer
//! from the UI without risking a shutdown deadlock.
//!
//! The gate is reset at the start of each offer. The UI is the only writer
//! of the response, with one exception: [`LicenseGate::cancel`] on the
//! shutdown path forces a reject so the session thread can always exit,
//! even mid-wait.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::constants::LICENSE_TIMEOUT;

const RESPONSE_PENDING: i32 = 0;
const RESPONSE_ACCEPT: i32 = 1;
const RESPONSE_REJECT: i32 = -1;

/// Blocking accept/reject handshake between the session and UI threads.
pub struct LicenseGate {
    /// True while the session thread is waiting for an answer.
    pending: AtomicBool,
    /// 0 = pending, 1 = accept, -1 = reject/timeout/shutdown.
    response: AtomicI32,
    /// License text shown by the UI while pending.
    text: Mutex<String>,
    wait_lock: Mutex<()>,
    wakeup: Condvar,
    timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl LicenseGate {
    pub fn new(shutdown: Arc<AtomicBool>) -> Self {
        Self::with_timeout(shutdown, LICENSE_TIMEOUT)
    }

    /// Gate with a custom deadline. Tests use this to avoid real waits.
    pub fn with_timeout(shutdown: Arc<AtomicBool>, timeout: Duration) -> Self {
        Self {
            pending: AtomicBool::new(false),
            response: AtomicI32::new(RESPONSE_PENDING),
            text: Mutex::new(String::new()),
            wait_lock: Mutex::new(()),
            wakeup: Condvar::new(),
            timeout,
            shutdown,
        }
    }

    /// Offer the license text and block until the UI answers, the timeout
    /// elapses, or shutdown is signaled (session thread only).
    ///
    /// Returns true only on explicit acceptance; timeout and shutdown both
    /// count as rejection.
    pub fn offer(&self, license_text: &str) -> bool {
        *self.text.lock() = license_text.to_string();
        self.response.store(RESPONSE_PENDING, Ordering::Release);
        self.pending.store(true, Ordering::Release);
        self.wakeup.notify_all();

        tracing::info!("license agreement received, waiting for user response");

        let deadline = Instant::now() + self.timeout;
        let mut guard = self.wait_lock.lock();
        while self.response.load(Ordering::Acquire) == RESPONSE_PENDING
            && !self.shutdown.load(Ordering::Acquire)
        {
            if self.wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        drop(guard);

        let mut response = self.response.load(Ordering::Acquire);
        if response == RESPONSE_PENDING {
            // Timed out or shut down without an answer: implicit reject.
            tracing::warn!("license wait ended without a response, rejecting");
            response = RESPONSE_REJECT;
            self.response.store(RESPONSE_REJECT, Ordering::Release);
        }
        self.pending.store(false, Ordering::Release);

        let accepted = response == RESPONSE_ACCEPT;
        tracing::info!(accepted, "license response");
        accepted
    }

    /// True while an offer is waiting for an answer.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// The license text to display, if an offer is pending (UI thread).
    pub fn pending_text(&self) -> Option<String> {
        if self.is_pending() {
            Some(self.text.lock().clone())
        } else {
            None
        }
    }

    /// Deliver the user's verdict (UI thread, exactly once per offer).
    pub fn respond(&self, accept: bool) {
        let _guard = self.wait_lock.lock();
        let response = if accept { RESPONSE_ACCEPT } else { RESPONSE_REJECT };
        self.response.store(response, Ordering::Release);
        self.wakeup.notify_all();
    }

    /// Force-reject and wake any waiter. Called on plugin teardown so a
    /// pending prompt cannot block shutdown.
    pub fn cancel(&self) {
        let _guard = self.wait_lock.lock();
        self.response.store(RESPONSE_REJECT, Ordering::Release);
        self.pending.store(false, Ordering::Release);
        self.wakeup.notify_all();
    }
}
