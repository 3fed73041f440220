fn main() {
    if let Err(e) = saglikasist_lib::run() {
        tracing::error!(error = %e, "SağlıkAsist offline matcher failed");
        eprintln!("saglikasist: {e}");
        std::process::exit(1);
    }
}
