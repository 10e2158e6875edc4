use std::process::ExitCode;

fn main() -> ExitCode {
    repotree::app::startup::startup()
}
