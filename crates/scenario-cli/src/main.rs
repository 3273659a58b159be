mod cli;

fn main() {
    if let Err(error) = cli::init_logging() {
        eprintln!("{}", error.diagnostic_line());
        std::process::exit(error.exit_code());
    }

    std::process::exit(cli::run_from_env());
}
