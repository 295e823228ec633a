fn main() {
    if let Err(err) = guardpost::cli::run() {
        guardpost::ui::eprintln_error(&err);
        std::process::exit(guardpost::exit::exit_code(&err));
    }
}
