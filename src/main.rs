fn main() {
    if let Err(err) = areamap::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
