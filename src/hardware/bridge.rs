//! Bridge between the button console and the frame loop.
//!
//! One dedicated thread reads the serial line protocol and folds presses
//! into a lock-free bitmask; the frame loop consumes presses and writes LED
//! commands without ever blocking. If the console is missing the bridge
//! stays in a degraded state where every consume returns `None`, so the
//! exhibit keeps running on direct input alone.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::link::{PortLink, SerialLink};
use super::protocol::{button_delay_line, led_line, parse_press_line};
use super::{BUTTON_COUNT, ButtonId};

/// Pause before retrying after a transient read failure.
const RETRY_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to open console port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// State shared with the reader thread. The mask and the per-button
/// timestamps are the only cross-thread mutable data, and both are only
/// ever touched through atomics.
struct BridgeShared {
    /// One bit per button; set = at least one unconsumed press.
    mask: AtomicU32,
    /// Monotonic ms of the latest press per button, written before the
    /// mask bit is set.
    press_ms: [AtomicU64; BUTTON_COUNT],
    /// Cleared to ask the reader thread to exit.
    running: AtomicBool,
    /// Set by the reader thread after an unrecoverable port error.
    stopped: AtomicBool,
    /// Epoch for `now_ms`.
    epoch: Instant,
}

impl BridgeShared {
    fn new() -> Self {
        Self {
            mask: AtomicU32::new(0),
            press_ms: [const { AtomicU64::new(0) }; BUTTON_COUNT],
            running: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn record_press(&self, button: ButtonId) {
        self.press_ms[button.index()].store(self.now_ms(), Ordering::Release);
        self.mask.fetch_or(button.bit(), Ordering::AcqRel);
    }
}

pub struct ConsoleBridge {
    shared: Arc<BridgeShared>,
    writer: Option<Box<dyn SerialLink>>,
    reader: Option<JoinHandle<()>>,
}

impl ConsoleBridge {
    /// Open the console port and start the reader thread.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, BridgeError> {
        let (reader, writer) = PortLink::open(port_name, baud_rate).map_err(|source| {
            BridgeError::Open {
                port: port_name.to_string(),
                source,
            }
        })?;
        info!("console connected on {} @ {}", port_name, baud_rate);
        Ok(Self::with_links(Box::new(reader), Box::new(writer)))
    }

    /// Build a bridge over explicit links; used by tests with a loopback.
    pub fn with_links(reader: Box<dyn SerialLink>, writer: Box<dyn SerialLink>) -> Self {
        let shared = Arc::new(BridgeShared::new());
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("console-reader".to_string())
            .spawn(move || reader_loop(reader, thread_shared));
        let reader = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("failed to spawn console reader: {}; hardware input disabled", e);
                shared.stopped.store(true, Ordering::Release);
                None
            }
        };

        Self {
            shared,
            writer: Some(writer),
            reader,
        }
    }

    /// A bridge with no device behind it: consumes return `None`, LED
    /// writes are dropped. Used when the port could not be opened.
    pub fn disconnected() -> Self {
        let shared = Arc::new(BridgeShared::new());
        shared.running.store(false, Ordering::Release);
        shared.stopped.store(true, Ordering::Release);
        Self {
            shared,
            writer: None,
            reader: None,
        }
    }

    /// Whether the reader is still attached to a live port.
    pub fn is_connected(&self) -> bool {
        self.reader.is_some() && !self.shared.stopped.load(Ordering::Acquire)
    }

    /// Monotonic milliseconds since the bridge was created.
    pub fn now_ms(&self) -> u64 {
        self.shared.now_ms()
    }

    /// Consume one pending press, highest-priority button first.
    ///
    /// Each physical press is observed by at most one caller: the bit is
    /// cleared in the same CAS that claims it.
    pub fn try_consume_any_press(&self) -> Option<ButtonId> {
        loop {
            let current = self.shared.mask.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            let button = Self::highest_priority(current)?;
            if self
                .shared
                .mask
                .compare_exchange(
                    current,
                    current & !button.bit(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Some(button);
            }
        }
    }

    /// Consume one pending press stamped at or after `since_ms`; presses
    /// older than the cutoff are consumed and dropped as stale.
    ///
    /// Timestamps survive only per button (a re-press overwrites), so this
    /// is an approximation: good enough to ignore presses buffered before
    /// a prompt became visible.
    pub fn try_consume_press_newer_than(&self, since_ms: u64) -> Option<ButtonId> {
        loop {
            let current = self.shared.mask.load(Ordering::Acquire);
            if current == 0 {
                return None;
            }
            let button = Self::highest_priority(current)?;
            if self
                .shared
                .mask
                .compare_exchange(
                    current,
                    current & !button.bit(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_err()
            {
                continue;
            }
            let stamped = self.shared.press_ms[button.index()].load(Ordering::Acquire);
            if stamped >= since_ms {
                return Some(button);
            }
            debug!("dropping stale press of {:?} ({}ms < {}ms)", button, stamped, since_ms);
        }
    }

    /// Discard all pending presses; returns how many buttons had one.
    pub fn flush_all(&self) -> usize {
        self.shared.mask.swap(0, Ordering::AcqRel).count_ones() as usize
    }

    pub fn has_pending_press(&self) -> bool {
        self.shared.mask.load(Ordering::Acquire) != 0
    }

    /// Monotonic ms of the most recent press ever seen, consumed or not.
    /// Zero means no press has arrived yet.
    pub fn last_press_ms(&self) -> u64 {
        self.shared
            .press_ms
            .iter()
            .map(|t| t.load(Ordering::Acquire))
            .max()
            .unwrap_or(0)
    }

    /// Fire-and-forget LED command; failures are logged, never returned.
    pub fn set_led(&mut self, button: ButtonId, on: bool) {
        self.write_line(&led_line(button, on));
    }

    pub fn set_led_all(&mut self, on: bool) {
        for button in ButtonId::ALL {
            self.set_led(button, on);
        }
    }

    /// Push the firmware debounce interval; sent once after connect.
    pub fn send_button_delay(&mut self, ms: u32) {
        self.write_line(&button_delay_line(ms));
    }

    fn write_line(&mut self, line: &str) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.write_line(line) {
                warn!("console write '{}' failed: {}", line, e);
            }
        }
    }

    /// Stop the reader and release the port. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            // The read timeout bounds how long the join can take.
            if handle.join().is_err() {
                warn!("console reader thread panicked");
            }
        }
        self.writer = None;
    }

    fn highest_priority(mask: u32) -> Option<ButtonId> {
        ButtonId::ALL.into_iter().find(|b| mask & b.bit() != 0)
    }
}

impl Drop for ConsoleBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reader_loop(mut link: Box<dyn SerialLink>, shared: Arc<BridgeShared>) {
    while shared.running.load(Ordering::Acquire) {
        match link.read_line() {
            Ok(Some(line)) => {
                if let Some(button) = parse_press_line(&line) {
                    shared.record_press(button);
                }
            }
            // Timeout: just a liveness check against the stop flag.
            Ok(None) => {}
            Err(e) if is_fatal(e.kind()) => {
                warn!("console port lost ({}); hardware input disabled", e);
                shared.stopped.store(true, Ordering::Release);
                break;
            }
            Err(e) => {
                debug!("console read error, retrying: {}", e);
                std::thread::sleep(RETRY_PAUSE);
            }
        }
    }
}

fn is_fatal(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

/// Test bridge over a loopback link, plus the handle feeding it.
#[cfg(test)]
pub fn loopback_bridge() -> (ConsoleBridge, super::link::LoopbackLink) {
    let link = super::link::LoopbackLink::new();
    let bridge = ConsoleBridge::with_links(Box::new(link.clone()), Box::new(link.clone()));
    (bridge, link)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Poll until the reader thread has folded in a press.
    fn wait_for_press(bridge: &ConsoleBridge) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !bridge.has_pending_press() {
            assert!(Instant::now() < deadline, "press never arrived");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_press_is_consumed_exactly_once() {
        let (bridge, link) = loopback_bridge();
        link.push_line("Button 2 Pressed");
        wait_for_press(&bridge);

        assert_eq!(bridge.try_consume_any_press(), Some(ButtonId::Button2));
        assert_eq!(bridge.try_consume_any_press(), None);
    }

    #[test]
    fn test_repeat_presses_collapse_to_presence() {
        let (bridge, link) = loopback_bridge();
        for _ in 0..5 {
            link.push_line("Button 1 Pressed");
        }
        wait_for_press(&bridge);
        // Give the reader time to drain the remaining lines.
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(bridge.try_consume_any_press(), Some(ButtonId::Button1));
        assert_eq!(bridge.try_consume_any_press(), None);
    }

    #[test]
    fn test_priority_order() {
        let (bridge, link) = loopback_bridge();
        link.push_line("Button 3 Pressed");
        link.push_line("Button 1 Pressed");
        wait_for_press(&bridge);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(bridge.try_consume_any_press(), Some(ButtonId::Button1));
        assert_eq!(bridge.try_consume_any_press(), Some(ButtonId::Button3));
        assert_eq!(bridge.try_consume_any_press(), None);
    }

    #[test]
    fn test_flush_all_empties_mask() {
        let (bridge, link) = loopback_bridge();
        link.push_line("Button 1 Pressed");
        link.push_line("Button 3 Pressed");
        wait_for_press(&bridge);
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(bridge.flush_all(), 2);
        assert_eq!(bridge.try_consume_any_press(), None);
        assert_eq!(bridge.flush_all(), 0);
    }

    #[test]
    fn test_malformed_lines_ignored() {
        let (bridge, link) = loopback_bridge();
        link.push_line("Button 9 Pressed");
        link.push_line("garbage");
        link.push_line("");
        std::thread::sleep(Duration::from_millis(30));

        assert!(!bridge.has_pending_press());
    }

    #[test]
    fn test_stale_press_dropped_by_cutoff() {
        let (bridge, link) = loopback_bridge();
        link.push_line("Button 1 Pressed");
        wait_for_press(&bridge);

        let cutoff = bridge.now_ms() + 10_000;
        assert_eq!(bridge.try_consume_press_newer_than(cutoff), None);
        // The stale press was consumed, not left pending.
        assert!(!bridge.has_pending_press());
    }

    #[test]
    fn test_fresh_press_passes_cutoff() {
        let (bridge, link) = loopback_bridge();
        let since = bridge.now_ms();
        link.push_line("Button 2 Pressed");
        wait_for_press(&bridge);

        assert_eq!(
            bridge.try_consume_press_newer_than(since),
            Some(ButtonId::Button2)
        );
    }

    #[test]
    fn test_led_commands_on_wire() {
        let (mut bridge, link) = loopback_bridge();
        bridge.set_led(ButtonId::Button2, true);
        bridge.set_led_all(false);
        bridge.send_button_delay(150);

        assert_eq!(
            link.sent(),
            vec![
                "LED2 ON".to_string(),
                "LED1 OFF".to_string(),
                "LED2 OFF".to_string(),
                "LED3 OFF".to_string(),
                "150".to_string(),
            ]
        );
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (mut bridge, _link) = loopback_bridge();
        bridge.shutdown();
        bridge.shutdown();
        assert!(!bridge.is_connected());
        assert_eq!(bridge.try_consume_any_press(), None);
    }

    #[test]
    fn test_fatal_read_error_stops_reader() {
        let (bridge, link) = loopback_bridge();
        link.fail_next_read(io::ErrorKind::BrokenPipe);

        let deadline = Instant::now() + Duration::from_secs(2);
        while bridge.is_connected() {
            assert!(Instant::now() < deadline, "reader never stopped");
            std::thread::sleep(Duration::from_millis(2));
        }
        // Presses sent after the loss never arrive.
        link.push_line("Button 1 Pressed");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(bridge.try_consume_any_press(), None);
    }

    #[test]
    fn test_disconnected_bridge_degrades() {
        let mut bridge = ConsoleBridge::disconnected();
        assert!(!bridge.is_connected());
        assert_eq!(bridge.try_consume_any_press(), None);
        assert_eq!(bridge.flush_all(), 0);
        // LED writes are silently dropped rather than erroring.
        bridge.set_led_all(true);
        bridge.shutdown();
    }
}
