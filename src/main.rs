fn main() {
    if let Err(err) = chatdeck::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
