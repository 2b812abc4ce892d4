//! Process interrupt handling

use super::cancel::CancellationToken;

/// Cancel `token` when the process receives an interrupt (SIGINT / Ctrl-C)
///
/// Only one handler can be installed per process.
pub fn install_interrupt_handler(token: CancellationToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        log::warn!("Interrupt signal received. Shutting down.");
        token.cancel();
    })
}
