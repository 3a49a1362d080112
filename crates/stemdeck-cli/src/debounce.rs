//! Trailing-edge debouncer
//!
//! Values scheduled in quick succession collapse into the last one, which is
//! released once no new value arrived for the quiet period. Slider-style
//! speed/pitch input uses it so only the final setting gets rendered.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Message<T> {
    Schedule(T),
    Cancel,
}

pub struct Debouncer<T: Send + 'static> {
    tx: Option<Sender<Message<T>>>,
    rx: Receiver<T>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn(name: &str, quiet: Duration) -> std::io::Result<Self> {
        let (tx, worker_rx) = mpsc::channel::<Message<T>>();
        let (worker_tx, rx) = mpsc::channel::<T>();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(worker_rx, worker_tx, quiet))?;

        Ok(Self {
            tx: Some(tx),
            rx,
            handle: Some(handle),
        })
    }

    /// Schedule `value`, replacing anything not yet released
    pub fn schedule(&self, value: T) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Message::Schedule(value));
        }
    }

    /// Drop the scheduled value, if any
    pub fn cancel(&self) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Message::Cancel);
        }
    }

    /// Released value, if the quiet period has passed (non-blocking)
    pub fn try_recv(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // Closing the channel ends the thread
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<T>(rx: Receiver<Message<T>>, tx: Sender<T>, quiet: Duration) {
    let mut pending: Option<T> = None;

    loop {
        let msg = if pending.is_some() {
            match rx.recv_timeout(quiet) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => {
                    if let Some(value) = pending.take() {
                        if tx.send(value).is_err() {
                            return;
                        }
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => return,
            }
        } else {
            match rx.recv() {
                Ok(msg) => msg,
                Err(_) => return,
            }
        };

        match msg {
            Message::Schedule(value) => pending = Some(value),
            Message::Cancel => pending = None,
        }
    }
}
