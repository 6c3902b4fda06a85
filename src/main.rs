fn main() {
    if let Err(err) = streamchat::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
