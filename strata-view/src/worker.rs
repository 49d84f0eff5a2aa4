// A viewport worker owns opened pyramids on its own thread and answers
// "about N rows of this key range" requests over a pair of channels.
//
// Requests coalesce: when the worker picks one up it drains whatever else is
// already queued and serves only the newest, so a caller that pans quickly
// never waits behind stale requests. A computation that has started always
// completes and is always sent, so callers should match responses to their
// latest request id and drop older ones.
//
// A Stop request (even one found while draining) is acknowledged with
// Response::Stopped, after which the worker exits. A dropped client closes
// the request channel, which stops the worker without an acknowledgement.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::pyramid::Pyramid;
use crate::selector::SelectionResult;
use strata_base::{err, Error, ErrorKind, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Fraction of the requested width added on each side of a range.
    pub margin: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions { margin: 0.2 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    View {
        id: u64,
        /// Viewport bounds; `None` asks for the whole key extent.
        range: Option<(f64, f64)>,
        resolution: u64,
    },
    Stop,
}

#[derive(Debug)]
pub enum Response {
    Selected {
        request_id: u64,
        dataset: PathBuf,
        result: SelectionResult,
    },
    Failed {
        request_id: u64,
        dataset: PathBuf,
        error: Error,
    },
    Stopped,
}

impl Response {
    pub fn request_id(&self) -> Option<u64> {
        match self {
            Response::Selected { request_id, .. } | Response::Failed { request_id, .. } => Some(*request_id),
            Response::Stopped => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WorkerState {
    Idle,
    Computing,
    Stopped,
}

pub struct ViewportWorker {
    datasets: Vec<Pyramid>,
    margin: f64,
    state: WorkerState,
}

impl ViewportWorker {
    pub fn new(datasets: Vec<Pyramid>, opts: &ViewOptions) -> Self {
        ViewportWorker {
            datasets,
            margin: opts.margin,
            state: WorkerState::Idle,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn enter(&mut self, state: WorkerState) {
        if self.state != state {
            debug!(target: "strata", from = ?self.state, to = ?state, "viewport worker");
            self.state = state;
        }
    }

    /// Serves `requests` until a stop request arrives or the channel closes.
    pub fn run(mut self, requests: Receiver<Request>, responses: Sender<Response>) {
        loop {
            self.enter(WorkerState::Idle);
            let mut latest = match requests.recv() {
                Ok(req) => req,
                Err(_) => {
                    info!(target: "strata", "request channel closed, viewport worker exiting");
                    self.enter(WorkerState::Stopped);
                    return;
                }
            };
            let mut superseded = 0;
            while latest != Request::Stop {
                match requests.try_recv() {
                    Ok(req) => {
                        latest = req;
                        superseded += 1;
                    }
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }
            if superseded > 0 {
                debug!(target: "strata", superseded, "coalesced requests");
            }
            match latest {
                Request::Stop => {
                    self.enter(WorkerState::Stopped);
                    let _ = responses.send(Response::Stopped);
                    return;
                }
                Request::View {
                    id,
                    range,
                    resolution,
                } => {
                    self.enter(WorkerState::Computing);
                    for out in self.serve(id, range, resolution) {
                        if responses.send(out).is_err() {
                            info!(target: "strata", "response channel closed, viewport worker exiting");
                            self.enter(WorkerState::Stopped);
                            return;
                        }
                    }
                }
            }
        }
    }

    // One response per dataset.
    fn serve(&mut self, id: u64, range: Option<(f64, f64)>, resolution: u64) -> Vec<Response> {
        let range = range.map(|(lo, hi)| {
            let pad = (hi - lo) * self.margin;
            (lo - pad, hi + pad)
        });
        self.datasets
            .iter_mut()
            .map(|pyramid| {
                let dataset = pyramid.dir().to_path_buf();
                let bounds = range.map(|(lo, hi)| {
                    let ty = &pyramid.key().ty;
                    (ty.value_from_f64(lo), ty.value_from_f64(hi))
                });
                let (start, stop) = match &bounds {
                    Some((lo, hi)) => (Some(lo), Some(hi)),
                    None => (None, None),
                };
                match pyramid.select(start, stop, resolution) {
                    Ok(result) => Response::Selected {
                        request_id: id,
                        dataset,
                        result,
                    },
                    Err(error) => {
                        warn!(target: "strata", request_id = id, dataset = %dataset.display(),
                              %error, "viewport request failed");
                        Response::Failed {
                            request_id: id,
                            dataset,
                            error,
                        }
                    }
                }
            })
            .collect()
    }

    /// Runs the worker on a thread of its own, fed by the given channels.
    pub fn spawn_with(self, requests: Receiver<Request>, responses: Sender<Response>) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("viewport-worker".to_string())
            .spawn(move || self.run(requests, responses))?;
        Ok(handle)
    }

    /// Runs the worker on a thread of its own and returns the client end.
    pub fn spawn(self) -> Result<WorkerClient> {
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let handle = self.spawn_with(req_rx, res_tx)?;
        Ok(WorkerClient {
            requests: req_tx,
            responses: res_rx,
            handle: Some(handle),
            next_id: 0,
        })
    }
}

/// The caller's end of a running worker.
pub struct WorkerClient {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
}

fn disconnected() -> Error {
    err(ErrorKind::Disconnected, "viewport worker is gone")
}

impl WorkerClient {
    /// Queues a request and returns its id. Bounds must be given both or
    /// neither; absent bounds ask for the whole key extent.
    pub fn request(&mut self, start: Option<f64>, stop: Option<f64>, resolution: u64) -> Result<u64> {
        let range = match (start, stop) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            (None, None) => None,
            _ => {
                return Err(err(
                    ErrorKind::Contract,
                    "range start and stop must be both present or both absent",
                ))
            }
        };
        self.request_range(range, resolution)
    }

    pub fn request_range(&mut self, range: Option<(f64, f64)>, resolution: u64) -> Result<u64> {
        self.next_id += 1;
        let id = self.next_id;
        self.requests
            .send(Request::View {
                id,
                range,
                resolution,
            })
            .map_err(|_| disconnected())?;
        Ok(id)
    }

    pub fn recv(&self) -> Result<Response> {
        self.responses.recv().map_err(|_| disconnected())
    }

    pub fn try_recv(&self) -> Result<Option<Response>> {
        match self.responses.try_recv() {
            Ok(res) => Ok(Some(res)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(disconnected()),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Response>> {
        match self.responses.recv_timeout(timeout) {
            Ok(res) => Ok(Some(res)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(disconnected()),
        }
    }

    /// Asks the worker to stop, waits for its acknowledgement and joins it.
    /// Returns the responses that were still in flight.
    pub fn stop(mut self) -> Result<Vec<Response>> {
        self.requests.send(Request::Stop).map_err(|_| disconnected())?;
        let mut pending = Vec::new();
        loop {
            match self.recv()? {
                Response::Stopped => break,
                res => pending.push(res),
            }
        }
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| err(ErrorKind::Other, "viewport worker panicked"))?;
        }
        Ok(pending)
    }
}
