fn main() {
    if let Err(err) = kindred::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
