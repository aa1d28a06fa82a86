fn main() {
    env_logger::init();
    let image_path = std::env::args().nth(1).unwrap_or_default();
    if image_path.is_empty() {
        eprintln!("usage: vm80 <image.com>");
        std::process::exit(2);
    }
    if let Err(err) = vm80::run(&image_path) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}
