//! Background execution of a directory batch. The batch runs on its own thread;
//! the caller polls progress, may request cancellation and collects the report
//! from a completion channel.
pub mod logging;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use tracing::{debug, error};

use crate::api::{BatchControl, BatchReport, process_directory_with};
use crate::core::params::CanvasConfig;
use crate::error::{Error, Result};
use crate::io::ListFilter;

pub struct BatchWorker {
    control: BatchControl,
    completion_receiver: Receiver<Result<BatchReport>>,
    handle: Option<JoinHandle<()>>,
}

impl BatchWorker {
    /// Start normalizing `input_dir` on a background thread.
    pub fn spawn(
        input_dir: PathBuf,
        config: CanvasConfig,
        filter: ListFilter,
        continue_on_error: bool,
    ) -> Result<Self> {
        let control = BatchControl::default();
        let thread_control = control.clone();
        let (tx, rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("canvasprep-batch".to_string())
            .spawn(move || {
                debug!("Batch worker started for {:?}", input_dir);
                let result = process_directory_with(
                    &input_dir,
                    &config,
                    &filter,
                    &thread_control,
                    continue_on_error,
                );
                if let Err(e) = &result {
                    error!("Batch failed: {}", e);
                }
                // Receiver may be gone if the caller dropped the worker
                let _ = tx.send(result);
            })?;

        Ok(Self {
            control,
            completion_receiver: rx,
            handle: Some(handle),
        })
    }

    /// Shared counters, e.g. for a second observer.
    pub fn control(&self) -> &BatchControl {
        &self.control
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// (done, total)
    pub fn progress(&self) -> (usize, usize) {
        self.control.progress()
    }

    /// Non-blocking check for completion.
    pub fn try_finish(&mut self) -> Option<Result<BatchReport>> {
        match self.completion_receiver.try_recv() {
            Ok(result) => {
                self.reap();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.reap();
                Some(Err(Error::External(
                    "batch worker exited without a report".to_string(),
                )))
            }
        }
    }

    /// Block until the batch finishes.
    pub fn join(mut self) -> Result<BatchReport> {
        let result = self.completion_receiver.recv().map_err(|_| {
            Error::External("batch worker exited without a report".to_string())
        });
        self.reap();
        result?
    }

    fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Batch worker thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::time::{Duration, Instant};

    #[test]
    fn worker_reports_like_the_direct_call() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(40, 20, Rgb([10, 10, 10]))
            .save(dir.path().join("a.png"))
            .unwrap();

        let mut config = CanvasConfig::with_size(30, 40);
        config.redact_qr = false;
        let mut worker =
            BatchWorker::spawn(dir.path().to_path_buf(), config, ListFilter::default(), true).unwrap();

        let deadline = Instant::now() + Duration::from_secs(30);
        let report = loop {
            if let Some(result) = worker.try_finish() {
                break result.unwrap();
            }
            assert!(Instant::now() < deadline, "worker did not finish");
            std::thread::sleep(Duration::from_millis(10));
        };
        assert_eq!(report.total, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(worker.progress(), (1, 1));
        assert!(dir.path().join("a_30x40.png").exists());
    }

    #[test]
    fn missing_directory_surfaces_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let worker = BatchWorker::spawn(
            dir.path().join("absent"),
            CanvasConfig::default(),
            ListFilter::default(),
            true,
        )
        .unwrap();
        assert!(matches!(worker.join(), Err(Error::InvalidDirectory { .. })));
    }
}
