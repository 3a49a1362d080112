//! Background effects worker
//!
//! Runs `OfflineEffectsProcessor::transform` on its own thread so the control
//! side stays responsive while a song is being stretched. Requests and results
//! travel over std channels; results are polled without blocking.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::error::{EffectsError, EffectsResult};
use super::processor::OfflineEffectsProcessor;
use super::EffectParams;
use crate::stems::StemSet;

/// Request to transform a stem set in the background
pub struct EffectsRequest {
    /// Song generation the request belongs to
    pub generation: u64,
    /// Untransformed stems of that song
    pub original: Arc<StemSet>,
    pub params: EffectParams,
}

/// Result of a background transform
pub struct EffectsWorkerResult {
    pub generation: u64,
    pub params: EffectParams,
    pub result: EffectsResult<Arc<StemSet>>,
}

/// Handle to the background effects thread
///
/// Dropping the handle closes the request channel; the thread exits after
/// finishing the transform it is running.
pub struct EffectsWorker {
    tx: Sender<EffectsRequest>,
    rx: Receiver<EffectsWorkerResult>,
    _handle: JoinHandle<()>,
}

impl EffectsWorker {
    /// Spawn the worker thread
    pub fn spawn(processor: OfflineEffectsProcessor) -> std::io::Result<Self> {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<EffectsRequest>();
        let (result_tx, result_rx) = std::sync::mpsc::channel::<EffectsWorkerResult>();

        let handle = thread::Builder::new()
            .name("effects-worker".to_string())
            .spawn(move || worker_thread(processor, request_rx, result_tx))?;

        log::debug!("Effects worker spawned");

        Ok(Self {
            tx: request_tx,
            rx: result_rx,
            _handle: handle,
        })
    }

    /// Queue a transform (non-blocking)
    pub fn request(&self, request: EffectsRequest) -> EffectsResult<()> {
        self.tx
            .send(request)
            .map_err(|_| EffectsError::WorkerDisconnected)
    }

    /// Try to receive a finished transform (non-blocking)
    ///
    /// `Err(WorkerDisconnected)` means the thread is gone; the handle is
    /// useless from then on.
    pub fn try_recv(&self) -> EffectsResult<Option<EffectsWorkerResult>> {
        match self.rx.try_recv() {
            Ok(result) => Ok(Some(result)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(EffectsError::WorkerDisconnected),
        }
    }

    /// Block until a transform finishes
    pub fn recv(&self) -> EffectsResult<EffectsWorkerResult> {
        self.rx.recv().map_err(|_| EffectsError::WorkerDisconnected)
    }
}

fn worker_thread(
    processor: OfflineEffectsProcessor,
    rx: Receiver<EffectsRequest>,
    tx: Sender<EffectsWorkerResult>,
) {
    log::info!("Effects worker thread started");

    while let Ok(mut request) = rx.recv() {
        // Only the newest queued request matters
        while let Ok(newer) = rx.try_recv() {
            log::debug!(
                "Dropping superseded effects request (generation {})",
                request.generation
            );
            request = newer;
        }

        let result = processor.transform(&request.original, request.params);
        if let Err(e) = &result {
            log::warn!("Effects transform failed: {}", e);
        }

        let reply = EffectsWorkerResult {
            generation: request.generation,
            params: request.params,
            result,
        };
        if tx.send(reply).is_err() {
            break;
        }
    }

    log::info!("Effects worker thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stems::Provenance;
    use crate::types::{StereoBuffer, StereoSample};

    fn original() -> Arc<StemSet> {
        let buffer = StereoBuffer::from_vec(vec![StereoSample::mono(0.1); 64]);
        Arc::new(StemSet::from_buffers([Some(buffer), None, None, None], 44100, Provenance::Original).unwrap())
    }

    #[test]
    fn test_identity_request_round_trips() {
        let worker = EffectsWorker::spawn(OfflineEffectsProcessor::default()).unwrap();
        let original = original();

        worker
            .request(EffectsRequest {
                generation: 7,
                original: original.clone(),
                params: EffectParams::default(),
            })
            .unwrap();

        let reply = worker.recv().unwrap();
        assert_eq!(reply.generation, 7);
        assert!(Arc::ptr_eq(&reply.result.unwrap(), &original));
    }

    /// Panics inside the worker thread
    struct PanickingDsp;

    impl crate::effects::StemDsp for PanickingDsp {
        fn pitch_shift(&self, _: &StereoBuffer, _: u32, _: i32) -> Result<StereoBuffer, crate::effects::DspError> {
            panic!("dsp crashed");
        }

        fn time_stretch(&self, _: &StereoBuffer, _: u32, _: f64) -> Result<StereoBuffer, crate::effects::DspError> {
            panic!("dsp crashed");
        }
    }

    #[test]
    fn test_dead_thread_reports_disconnect() {
        let worker = EffectsWorker::spawn(OfflineEffectsProcessor::new(Arc::new(PanickingDsp))).unwrap();
        assert!(matches!(worker.try_recv(), Ok(None)));
        worker
            .request(EffectsRequest {
                generation: 1,
                original: original(),
                params: EffectParams::new(2.0, 0),
            })
            .unwrap();

        assert_eq!(worker.recv().err(), Some(EffectsError::WorkerDisconnected));
        assert_eq!(worker.try_recv().err(), Some(EffectsError::WorkerDisconnected));
    }

    #[test]
    fn test_errors_are_delivered() {
        let worker = EffectsWorker::spawn(OfflineEffectsProcessor::default()).unwrap();
        worker
            .request(EffectsRequest {
                generation: 1,
                original: original(),
                params: EffectParams::new(-2.0, 0),
            })
            .unwrap();

        let reply = worker.recv().unwrap();
        assert_eq!(reply.result.unwrap_err(), EffectsError::InvalidSpeed(-2.0));
    }
}
