fn main() {
    if let Err(err) = vigil_cli::run() {
        eprintln!("vigil: {}", err);
        std::process::exit(1);
    }
}
