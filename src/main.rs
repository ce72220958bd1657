fn main() {
    if let Err(e) = vitalchart_lib::run() {
        eprintln!("vitalchart: {e}");
        std::process::exit(1);
    }
}
