//! Async front-end for [`SessionController`].
//!
//! One task owns the controller and serializes host commands, inbound frames
//! and the save deadline, so the controller never sees concurrent calls.

use frame_bridge_core::ValueBridge;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use crate::{
    controller::{Inbound, SessionController},
    events::{BridgeStatus, SessionEvent},
};

/// Driver error.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Session task stopped")]
    Stopped,
}

#[derive(Debug)]
enum Command {
    Open,
    Close,
    RequestSave,
    Reset,
    SetTheme(bool),
}

/// Cloneable handle to a running session task.
///
/// The task stops, closing any open session, once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SessionEvent>,
    status: watch::Receiver<BridgeStatus>,
    value: ValueBridge,
}

impl SessionHandle {
    /// Open the modal's session.
    ///
    /// # Errors
    /// Returns error if the session task stopped.
    pub fn open(&self) -> Result<(), DriverError> {
        self.send(Command::Open)
    }

    /// Close without committing.
    ///
    /// # Errors
    /// Returns error if the session task stopped.
    pub fn close(&self) -> Result<(), DriverError> {
        self.send(Command::Close)
    }

    /// Ask the embedded document to save.
    ///
    /// # Errors
    /// Returns error if the session task stopped.
    pub fn request_save(&self) -> Result<(), DriverError> {
        self.send(Command::RequestSave)
    }

    /// Ask the embedded document to clear its form.
    ///
    /// # Errors
    /// Returns error if the session task stopped.
    pub fn reset(&self) -> Result<(), DriverError> {
        self.send(Command::Reset)
    }

    /// Update the host theme.
    ///
    /// # Errors
    /// Returns error if the session task stopped.
    pub fn set_theme(&self, theme_dark: bool) -> Result<(), DriverError> {
        self.send(Command::SetTheme(theme_dark))
    }

    /// Receiver for session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Receiver for UI flags.
    #[must_use]
    pub fn status(&self) -> watch::Receiver<BridgeStatus> {
        self.status.clone()
    }

    /// The form field value.
    #[must_use]
    pub const fn value(&self) -> &ValueBridge {
        &self.value
    }

    fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).map_err(|_| DriverError::Stopped)
    }
}

/// Spawn a task that drives `controller`.
#[must_use]
pub fn spawn_session(
    controller: SessionController,
    inbound: mpsc::UnboundedReceiver<Inbound>,
) -> (SessionHandle, JoinHandle<()>) {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let handle = SessionHandle {
        commands,
        events: controller.event_sender(),
        status: controller.status(),
        value: controller.value().clone(),
    };
    let task = tokio::spawn(run(controller, inbound, command_rx));
    (handle, task)
}

async fn run(
    mut controller: SessionController,
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    loop {
        let deadline = controller.save_deadline();
        let expiry = sleep_until(deadline.map_or_else(Instant::now, Instant::from_std));

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply(&mut controller, command),
                None => break,
            },
            Some(message) = inbound.recv() => controller.handle_inbound(message),
            () = expiry, if deadline.is_some() => {
                controller.expire_save(Instant::now().into_std());
            }
        }
    }

    controller.shutdown();
}

fn apply(controller: &mut SessionController, command: Command) {
    match command {
        Command::Open => {
            controller.open();
        }
        Command::Close => controller.close(),
        Command::RequestSave => controller.request_save(Instant::now().into_std()),
        Command::Reset => controller.reset(),
        Command::SetTheme(theme_dark) => controller.set_theme(theme_dark),
    }
}
