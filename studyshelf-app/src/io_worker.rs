use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use tracing::{debug, error};

use studyshelf_core::{Catalog, Subject};
use studyshelf_render::{open_document, Document};

/// Request sent from the main loop to the I/O worker.
pub(crate) enum IoRequest {
    /// Load the roadmap, books and videos for `subject` from `data_dir`.
    LoadSubject {
        subject: Subject,
        data_dir: PathBuf,
        /// Switch to the roadmap tab once the load has settled.
        show_roadmap: bool,
    },
    /// Open the book at `path` for the viewer.
    OpenDocument { title: String, path: PathBuf },
}

/// Response sent from the I/O worker back to the main loop.
pub(crate) enum IoResponse {
    CatalogLoaded {
        catalog: Catalog,
        show_roadmap: bool,
    },
    CatalogFailed {
        subject: Subject,
        error: String,
        show_roadmap: bool,
    },
    DocumentOpened {
        title: String,
        document: Arc<dyn Document>,
    },
    DocumentFailed {
        title: String,
        error: String,
    },
}

/// Spawn a dedicated I/O worker thread.
///
/// Returns the send-side for requests and the receive-side for responses.
/// The thread runs until the request sender is dropped.
pub(crate) fn spawn_io_worker(
) -> std::io::Result<(mpsc::Sender<IoRequest>, mpsc::Receiver<IoResponse>)> {
    let (req_tx, req_rx) = mpsc::channel::<IoRequest>();
    let (resp_tx, resp_rx) = mpsc::channel::<IoResponse>();

    std::thread::Builder::new()
        .name("io-worker".into())
        .spawn(move || {
            debug!("IO worker thread started");
            while let Ok(request) = req_rx.recv() {
                let response = match request {
                    IoRequest::LoadSubject {
                        subject,
                        data_dir,
                        show_roadmap,
                    } => match Catalog::load(&data_dir, subject) {
                        Ok(catalog) => IoResponse::CatalogLoaded {
                            catalog,
                            show_roadmap,
                        },
                        Err(e) => {
                            error!("IO worker: failed to load {subject} catalog: {e}");
                            IoResponse::CatalogFailed {
                                subject,
                                error: e.to_string(),
                                show_roadmap,
                            }
                        }
                    },
                    IoRequest::OpenDocument { title, path } => match open_document(&path) {
                        Ok(document) => IoResponse::DocumentOpened { title, document },
                        Err(e) => {
                            error!("IO worker: failed to open {}: {e}", path.display());
                            IoResponse::DocumentFailed {
                                title,
                                error: e.to_string(),
                            }
                        }
                    },
                };
                if resp_tx.send(response).is_err() {
                    break;
                }
            }
            debug!("IO worker thread exiting");
        })?;

    Ok((req_tx, resp_rx))
}
