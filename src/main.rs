mod config;
mod engine;
mod library;
mod player;
mod runtime;
mod seek;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
