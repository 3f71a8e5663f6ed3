use std::process::ExitCode;

fn main() -> ExitCode {
    let Err(error) = canvas_bridged::run_bridge() else {
        return ExitCode::SUCCESS;
    };
    if let Some(usage) = error.config_error().and_then(|config| config.parse_error()) {
        let _ = usage.print();
        return if usage.use_stderr() {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        };
    }
    eprintln!("canvas-bridged: {error}");
    ExitCode::FAILURE
}
