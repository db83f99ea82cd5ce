//! Background worker that serialises sync requests.
//!
//! At most one cycle runs at a time. A request made while another one is
//! still pending is coalesced into it, so a burst of triggers costs at most
//! one extra cycle.

use std::sync::Arc;

use {
    async_channel::{Receiver, Sender, TrySendError, bounded},
    tokio::{select, spawn, task::JoinHandle},
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use crate::{
    error::{domain::SyncError, operational::ErrorReporter},
    library::{
        paths::resolve_declared_roots,
        sources::PreferenceStore,
        sync::{SyncContext, SyncEngine, SyncOutcome},
    },
    state::AppState,
};

/// Handle to the background sync worker.
pub struct SyncCoordinator {
    requests: Sender<()>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

impl SyncCoordinator {
    /// Spawns the sync worker on the current Tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine running the cycles.
    /// * `state` - State the resulting snapshots are published to.
    /// * `preferences` - Source of the declared roots, read at each cycle.
    pub fn spawn(
        engine: Arc<SyncEngine>,
        state: AppState,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let (requests, receiver) = bounded(1);
        let cancel = CancellationToken::new();
        let worker = spawn(run_worker(
            engine,
            state,
            preferences,
            receiver,
            cancel.clone(),
        ));

        Self {
            requests,
            cancel,
            worker,
        }
    }

    /// Asks for a sync cycle.
    ///
    /// # Returns
    ///
    /// `true` if a new cycle was queued, `false` if the request was folded
    /// into one that is already pending or the worker has stopped.
    pub fn request_sync(&self) -> bool {
        match self.requests.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => {
                debug!("Sync already pending, coalescing request");
                false
            }
            Err(TrySendError::Closed(())) => {
                warn!("Sync worker has stopped, dropping request");
                false
            }
        }
    }

    /// Cancels any running cycle and waits for the worker to exit.
    ///
    /// A cancelled cycle publishes nothing; the previous snapshot stays.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.requests.close();
        if let Err(e) = self.worker.await {
            error!("Sync worker terminated abnormally: {}", e);
        }
    }
}

async fn run_worker(
    engine: Arc<SyncEngine>,
    state: AppState,
    preferences: Arc<dyn PreferenceStore>,
    receiver: Receiver<()>,
    cancel: CancellationToken,
) {
    loop {
        let request = select! {
            () = cancel.cancelled() => break,
            request = receiver.recv() => request,
        };
        if request.is_err() {
            break;
        }

        run_cycle(&engine, &state, preferences.as_ref(), &cancel).await;
    }
    debug!("Sync worker stopped");
}

async fn run_cycle(
    engine: &SyncEngine,
    state: &AppState,
    preferences: &dyn PreferenceStore,
    cancel: &CancellationToken,
) {
    let declared_roots = resolve_declared_roots(
        &preferences.get_declared_roots(),
        &engine.config().volume_roots,
    );
    let context = SyncContext {
        declared_roots,
        previous: Some(state.get_snapshot()),
    };

    match engine.sync(&context, cancel).await {
        Ok(result) => {
            match result.outcome {
                SyncOutcome::Rebuilt(snapshot) => state.publish_snapshot(snapshot),
                SyncOutcome::Unchanged => state.refresh_status(),
            }
            info!(
                indexed = result.report.indexed,
                extracted = result.report.extracted,
                deleted = result.report.deleted,
                "Sync cycle completed"
            );
            state.report_sync_finished(result.report);
        }
        Err(SyncError::Cancelled) => {
            debug!("Sync cycle cancelled, keeping previous snapshot");
        }
        Err(e) => {
            let access_denied = e.is_access_denied();
            let error = anyhow::Error::from(e);
            if access_denied {
                ErrorReporter::error(&error, "Library storage is not accessible");
                state.mark_no_access();
            } else {
                ErrorReporter::warn(&error, "Sync cycle failed");
            }
            state.report_sync_failed(ErrorReporter::to_user_message(&error));
        }
    }
}
