//! The `zls` binary: stdio transport loop around the dispatch core.

use std::io::{self, BufReader};
use std::process::ExitCode;

use tracing::{error, info};

use zls_server::lifecycle::Status;
use zls_server::transport::{read_frame, write_frame, TransportError};
use zls_server::{Server, ServerOptions};

fn main() -> ExitCode {
    if let Err(failure) = zls_server::telemetry::initialise() {
        eprintln!("failed to initialise telemetry: {failure}");
        return ExitCode::FAILURE;
    }

    let mut server = Server::new(ServerOptions {
        log_timings: true,
        ..ServerOptions::default()
    });
    info!("zls started");

    match serve(&mut server) {
        Ok(Status::ExitingSuccess) => ExitCode::SUCCESS,
        Ok(status) => {
            info!(status = status.as_str(), "terminating without clean shutdown");
            ExitCode::FAILURE
        }
        Err(failure) => {
            error!(%failure, "transport failed");
            ExitCode::FAILURE
        }
    }
}

/// Pulls frames until the client exits or hangs up, draining replies after
/// every message.
fn serve(server: &mut Server) -> Result<Status, TransportError> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    loop {
        let Some(frame) = read_frame(&mut reader)? else {
            info!("client closed the stream");
            break;
        };
        server.process_message(&frame);
        for outbound in server.outbound_mut().drain() {
            write_frame(&mut writer, &outbound)?;
        }
        if server.status().is_exiting() {
            break;
        }
    }
    Ok(server.status())
}
