//! The server aggregate.
//!
//! Owns everything the dispatch pipeline touches: configuration, the open
//! document store, the negotiated capability snapshot, the lifecycle state,
//! the outbound queue, the collaborator seams, and the session flags. One
//! logical thread drives [`Server::process_message`] for each inbound frame
//! and drains the outbound queue between frames.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use lsp_types::{MessageType, ShowMessageParams};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use zls_config::{ChangeReport, Config};

use crate::capabilities::{ClientCapabilitySet, OffsetEncoding};
use crate::dispatch;
use crate::lifecycle::Status;
use crate::outbound::OutboundQueue;
use crate::providers::Collaborators;
use crate::store::DocumentStore;

/// Tracing target for session-level events.
const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Oldest toolchain release the server knows how to talk to.
static MINIMUM_TOOLCHAIN: Lazy<semver::Version> = Lazy::new(|| semver::Version::new(0, 12, 0));

/// How compiler-suggested fixes are delivered around save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofixMode {
    /// Autofix is off, by configuration or missing client support.
    None,
    /// Edits are returned synchronously from `willSaveWaitUntil`.
    WillSaveWaitUntil,
    /// Edits are posted through `workspace/applyEdit` after save.
    OnSave,
}

/// Construction parameters for a session.
#[derive(Debug, Default)]
pub struct ServerOptions {
    /// Initial configuration.
    pub config: Config,
    /// Directory hint for resolving configuration-relative paths.
    pub config_dir: Option<PathBuf>,
    /// When set, incoming frames are appended to this session file.
    pub record_path: Option<PathBuf>,
    /// Replaying a recorded session; configuration pushes are not applied.
    pub replay: bool,
    /// Log inbound and outbound frames.
    pub trace_messages: bool,
    /// Log elapsed milliseconds per handled method. The binary turns this
    /// on; the test harness leaves it off.
    pub log_timings: bool,
    /// Toolchain version probed by the embedder, when known.
    pub toolchain_version: Option<semver::Version>,
}

/// Append-only sink for recorded sessions.
struct RecordingSink {
    path: PathBuf,
    file: File,
}

impl RecordingSink {
    fn open(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    fn append(&mut self, frame: &[u8]) {
        let outcome = self
            .file
            .write_all(frame)
            .and_then(|()| self.file.write_all(b"\n"));
        if let Err(source) = outcome {
            warn!(
                target: SERVER_TARGET,
                path = %self.path.display(),
                %source,
                "failed to record inbound frame"
            );
        }
    }
}

/// Top-level session state.
pub struct Server {
    pub(crate) config: Config,
    pub(crate) capabilities: ClientCapabilitySet,
    pub(crate) offset_encoding: OffsetEncoding,
    pub(crate) status: Status,
    pub(crate) outbound: OutboundQueue,
    pub(crate) collaborators: Collaborators,
    pub(crate) toolchain_version: Option<semver::Version>,
    pub(crate) replay: bool,
    pub(crate) trace_messages: bool,
    pub(crate) log_timings: bool,
    recording: Option<RecordingSink>,
}

impl Server {
    /// Builds a session from its construction parameters.
    #[must_use]
    pub fn new(options: ServerOptions) -> Self {
        Self::with_collaborators(options, Collaborators::default())
    }

    /// Builds a session with explicit collaborator implementations.
    #[must_use]
    pub fn with_collaborators(options: ServerOptions, collaborators: Collaborators) -> Self {
        if let Some(directory) = &options.config_dir {
            debug!(
                target: SERVER_TARGET,
                directory = %directory.display(),
                "configuration directory hint"
            );
        }
        let recording = options.record_path.and_then(|path| {
            RecordingSink::open(path.clone()).map_or_else(
                |source| {
                    warn!(
                        target: SERVER_TARGET,
                        path = %path.display(),
                        %source,
                        "recording disabled"
                    );
                    None
                },
                Some,
            )
        });

        Self {
            config: options.config,
            capabilities: ClientCapabilitySet::default(),
            offset_encoding: OffsetEncoding::default(),
            status: Status::default(),
            outbound: OutboundQueue::new(),
            collaborators,
            toolchain_version: options.toolchain_version,
            replay: options.replay,
            trace_messages: options.trace_messages,
            log_timings: options.log_timings,
            recording,
        }
    }

    /// Runs the full dispatch pipeline for one raw inbound frame.
    ///
    /// # Panics
    ///
    /// Panics when called after the session reached an exiting state; the
    /// process is terminating and further dispatch is a programmer error.
    pub fn process_message(&mut self, raw: &[u8]) {
        assert!(
            !self.status.is_exiting(),
            "message dispatched while exiting"
        );
        if let Some(recording) = &mut self.recording {
            recording.append(raw);
        }
        if self.trace_messages {
            debug!(
                target: SERVER_TARGET,
                frame = %String::from_utf8_lossy(raw),
                "inbound frame"
            );
        }
        dispatch::handle_message(self, raw);
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Negotiated client capability snapshot.
    #[must_use]
    pub fn capabilities(&self) -> &ClientCapabilitySet {
        &self.capabilities
    }

    /// Negotiated position units.
    #[must_use]
    pub fn offset_encoding(&self) -> OffsetEncoding {
        self.offset_encoding
    }

    /// Open-buffer store, behind its collaborator contract.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.collaborators.store.as_ref()
    }

    /// Outbound frames awaiting the transport.
    #[must_use]
    pub fn outbound(&self) -> &OutboundQueue {
        &self.outbound
    }

    /// Mutable access for draining by the transport loop.
    pub fn outbound_mut(&mut self) -> &mut OutboundQueue {
        &mut self.outbound
    }

    /// Whether the session records inbound frames.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Delivery mode for compiler-suggested fixes.
    #[must_use]
    pub fn autofix_mode(&self) -> AutofixMode {
        if !self.config.enable_autofix {
            AutofixMode::None
        } else if !self.capabilities.supports_apply_edit {
            AutofixMode::None
        } else if self.capabilities.supports_will_save_wait_until {
            AutofixMode::WillSaveWaitUntil
        } else {
            AutofixMode::OnSave
        }
    }

    /// Reacts to a finished configuration update.
    pub(crate) fn config_changed(&mut self, report: &ChangeReport) {
        for (option, reason) in &report.rejected {
            warn!(target: SERVER_TARGET, option = %option, reason = %reason, "rejected configuration value");
        }
        if !report.any_changed() {
            return;
        }
        debug!(
            target: SERVER_TARGET,
            options = ?report.changed,
            "configuration changed"
        );
        if report.option_changed("zig_exe_path") {
            self.collaborators.store.invalidate_build_files();
        }
    }

    /// Queues a `window/showMessage` notification.
    pub(crate) fn show_message(&mut self, typ: MessageType, message: impl Into<String>) {
        self.outbound.notify(
            "window/showMessage",
            &ShowMessageParams {
                typ,
                message: message.into(),
            },
        );
    }

    /// Posts the initialize-time user notices: toolchain skew and active
    /// recording.
    pub(crate) fn post_session_notices(&mut self) {
        if let Some(version) = self.toolchain_version.clone() {
            if version < *MINIMUM_TOOLCHAIN {
                self.show_message(
                    MessageType::WARNING,
                    format!(
                        "toolchain {version} is older than the oldest supported release {}",
                        *MINIMUM_TOOLCHAIN
                    ),
                );
            }
        }
        if self.is_recording() {
            self.show_message(MessageType::INFO, "recording session messages for replay");
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Server")
            .field("status", &self.status)
            .field("open_documents", &self.collaborators.store.open_count())
            .field("queued_frames", &self.outbound.len())
            .finish_non_exhaustive()
    }
}
