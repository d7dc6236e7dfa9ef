use std::process::ExitCode;

fn main() -> ExitCode {
    peerpost_cli::run()
}
