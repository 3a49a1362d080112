//! Deferred freeing of stem sets
//!
//! Stem sets are shared with the audio callback through `basedrop::Shared`.
//! Dropping the last reference there does not free anything: the allocation
//! is queued and released by the `audio-gc` thread, away from the callback.
//! One collector serves every engine in the process.

use std::sync::{mpsc, OnceLock};
use std::thread;
use std::time::Duration;

use basedrop::{Collector, Handle};

static COLLECTOR_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Sweep period of the collector thread
const SWEEP_PERIOD: Duration = Duration::from_millis(100);

/// Start the collector thread and wait for its handle
///
/// `Collector` is !Sync and must live on the thread that sweeps it, so the
/// thread builds it and sends back a handle.
fn spawn_collector() -> Handle {
    let (handle_tx, handle_rx) = mpsc::sync_channel(1);

    thread::Builder::new()
        .name("audio-gc".to_string())
        .spawn(move || {
            let mut collector = Collector::new();
            if handle_tx.send(collector.handle()).is_err() {
                return;
            }
            log::debug!("Stem collector running every {:?}", SWEEP_PERIOD);

            loop {
                collector.collect();
                thread::sleep(SWEEP_PERIOD);
            }
        })
        .expect("Failed to spawn audio-gc thread");

    handle_rx.recv().expect("audio-gc thread exited before handing out its handle")
}

/// Handle used to wrap stem sets in `Shared`
///
/// The collector thread is started on first use.
pub fn gc_handle() -> Handle {
    COLLECTOR_HANDLE.get_or_init(spawn_collector).clone()
}
