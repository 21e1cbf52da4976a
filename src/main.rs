#[tokio::main]
async fn main() {
    if let Err(e) = kebab_compass::run(std::env::args().skip(1)).await {
        eprintln!("kebab-compass: {}", e);
        std::process::exit(1);
    }
}
