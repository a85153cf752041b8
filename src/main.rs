use docbuild::{StepError, cli};

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {}", e);

        // Print the error chain
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("Caused by: {}", err);
            source = err.source();
        }

        let code = e
            .chain()
            .find_map(|err| err.downcast_ref::<StepError>())
            .map(StepError::exit_code)
            .unwrap_or(1);

        std::process::exit(code);
    }
}
